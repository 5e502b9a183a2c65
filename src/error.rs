//! Error taxonomy for adapter resolution and decode/encode calls.
//!
//! Errors split into two families so callers can tell "this type can never
//! be decoded" from "this particular payload was invalid":
//!
//! - [`BuildError`]: raised while resolving an adapter (factory chain
//!   exhausted, or the binding table for a structured type cannot be
//!   built). Fatal to resolving that type; never retried.
//! - [`DecodeError`] / [`EncodeError`]: raised by a single decode or encode
//!   call. Fatal to that call only; partial results are never returned.
//!
//! Format-level [`ReadError`]s and [`WriteError`]s from the token
//! collaborators pass through unchanged via `#[from]` conversions.

use thiserror::Error;

use crate::token::{ReadError, WriteError};

// -----------------------------------------------------------------------------
// BuildError

/// An error raised while resolving or building an adapter.
#[derive(Debug, Error)]
pub enum BuildError {
    /// No factory in the registry accepted the requested type.
    #[error("no adapter factory accepted type `{path}`")]
    UnsupportedType {
        /// Type path of the rejected request.
        path: &'static str,
    },

    /// A property's declared type disagrees with the constructor parameter
    /// of the same name.
    #[error(
        "property `{property}` of `{path}` has a constructor parameter of type \
         `{param_type}` but a property of type `{property_type}`"
    )]
    PropertyTypeMismatch {
        path: &'static str,
        property: &'static str,
        param_type: &'static str,
        property_type: &'static str,
    },

    /// A required constructor parameter has no property bound to it.
    #[error("no property for required constructor parameter `{param}` of `{path}`")]
    MissingParamProperty {
        path: &'static str,
        param: &'static str,
    },

    /// A transient property maps to a required constructor parameter that
    /// has no default of its own.
    #[error("no default value for transient constructor parameter `{property}` of `{path}`")]
    TransientRequiresDefault {
        path: &'static str,
        property: &'static str,
    },

    /// Two bindings ended up with the same wire name.
    #[error("wire name `{wire_name}` is bound twice on `{path}`")]
    DuplicateWireName {
        path: &'static str,
        wire_name: &'static str,
    },
}

// -----------------------------------------------------------------------------
// DecodeError

/// An error raised by a single decode call.
///
/// Every variant that refers to input carries the reader's structural path
/// at the point of failure.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// A required, non-nullable field was absent and no default value
    /// provider yielded a fallback.
    #[error("missing required property `{field}` at {path}")]
    MissingProperty { field: String, path: String },

    /// A non-nullable field decoded to null and no default value provider
    /// yielded a fallback.
    #[error("unexpected null for property `{field}` at {path}")]
    UnexpectedNull { field: String, path: String },

    /// Two input fields mapped to the same binding slot.
    #[error("multiple values for `{field}` at {path}")]
    DuplicateField { field: String, path: String },

    /// A map key appeared more than once; names both conflicting values.
    #[error("map key `{key}` has multiple values at {path}: {first} and {second}")]
    DuplicateKey {
        key: String,
        first: String,
        second: String,
        path: String,
    },

    /// A map key decoded to null.
    #[error("map key is null at {path}")]
    NullKey { path: String },

    /// A map value decoded to null in a container that cannot hold one.
    #[error("map value is null at {path}")]
    NullValue { path: String },

    /// An input field matched no binding while the registry is configured
    /// to deny unknown fields.
    #[error("unknown field `{field}` at {path}")]
    UnknownField { field: String, path: String },

    /// A constructor argument slot did not hold the state or type the
    /// constructor expected.
    #[error("constructor argument `{field}` does not match its declared type")]
    InvalidSlot { field: &'static str },

    /// A sub-adapter produced a value of an unexpected concrete type.
    #[error("decoded value does not match the adapter type, expected `{expected}`")]
    MismatchedValue { expected: &'static str },

    /// A format-level read error, passed through unchanged.
    #[error(transparent)]
    Read(#[from] ReadError),
}

// -----------------------------------------------------------------------------
// EncodeError

/// An error raised by a single encode call.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// A map entry with a null key cannot be encoded.
    #[error("map key is null at {path}")]
    NullKey { path: String },

    /// The value handed to an adapter was not of its concrete type.
    #[error("value does not match the adapter type, expected `{expected}`")]
    MismatchedValue { expected: &'static str },

    /// A format-level write error, passed through unchanged.
    #[error(transparent)]
    Write(#[from] WriteError),
}
