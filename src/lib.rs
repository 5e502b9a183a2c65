#![doc = include_str!("../README.md")]

pub mod adapters;
pub mod any_value;
pub mod error;
mod impls;
pub mod info;
pub mod registry;
pub mod token;
pub mod value;

pub use adapters::Adapter;
pub use any_value::AnyValue;
pub use error::{BuildError, DecodeError, EncodeError};
pub use registry::{AdapterRegistry, UnknownFieldPolicy};
pub use value::{Object, OrderedMap, TextMap, Value};
