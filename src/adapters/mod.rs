//! The adapters themselves.
//!
//! Internally every adapter is an [`ErasedAdapter`]: decode produces an
//! `Option<Box<dyn AnyValue>>` and encode consumes an
//! `Option<&dyn AnyValue>`, where `None` is the explicit null. Erasure
//! is what lets one registry hold adapters for arbitrarily many types
//! and lets composite adapters delegate to sub-adapters they only know
//! at runtime. The public, typed face is [`Adapter<T>`].
//!
//! Adapters are immutable once built and safe to share across threads
//! without synchronization.

mod bind;
mod dynamic;
mod erased;
mod map;
mod null_safe;
mod scalar;

pub use bind::BindFactory;
pub use dynamic::{DynamicFactory, SeqFactory};
pub use erased::{Adapter, ErasedAdapter};
pub use map::{ConcurrentMapFactory, ObjectFactory, OrderedMapFactory};
pub use null_safe::NullSafeAdapter;
pub use scalar::ScalarFactory;

pub(crate) use erased::require_value;
