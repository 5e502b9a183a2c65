//! Adapter resolution.
//!
//! An [`AdapterRegistry`] resolves a [`TypeDescriptor`] to an adapter by
//! walking an ordered chain of [`AdapterFactory`]s: the first factory
//! that accepts the type builds the adapter. Custom factories registered
//! through the builder run before the built-ins, so any built-in
//! behavior can be overridden per type; a fallback factory that binds
//! structured types from their declared metadata runs last.
//!
//! Every resolved adapter is wrapped null-safe and memoized, so repeated
//! requests for the same descriptor are lock-free cache hits returning
//! the same adapter. Resolutions in progress are tracked so mutually
//! recursive types resolve to adapters that lazily reach back into the
//! finished build.
//!
//! [`TypeDescriptor`]: crate::info::TypeDescriptor

mod defaults;
mod factory;
mod registry;

pub use defaults::{BuiltinDefaults, DefaultValueProvider};
pub use factory::{AdapterFactory, Resolver};
pub use registry::{AdapterRegistry, AdapterRegistryBuilder, UnknownFieldPolicy};

pub(crate) use defaults::ProviderChain;
