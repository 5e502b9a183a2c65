//! [`Described`](crate::info::Described) implementations for the
//! standard scalar, dynamic, and container types.

mod containers;
mod dynamic;
mod scalar;
