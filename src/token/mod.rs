//! The token stream contract.
//!
//! Adapters never see a concrete format. They consume a [`TokenReader`]
//! and produce into a [`TokenWriter`]: flat streams of scope brackets,
//! field names, and scalar tokens. Any format that can present itself
//! this way plugs into every adapter unchanged.
//!
//! Two tree-backed implementations ship in-crate: [`ValueReader`] walks a
//! [`Value`](crate::value::Value) tree and [`ValueWriter`] builds one.
//!
//! Both sides expose a structural `path()` (for example `$.users[2].name`)
//! that decode and encode errors embed, and the name/value promotion
//! switches the map adapters use to treat object field names as ordinary
//! values and vice versa.

mod value_reader;
mod value_writer;

pub use value_reader::ValueReader;
pub use value_writer::ValueWriter;

use thiserror::Error;

// -----------------------------------------------------------------------------
// Peek

/// The kind of the next token a reader would deliver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Peek {
    Null,
    Bool,
    Int,
    Float,
    Str,
    /// An object field name. Readers with name promotion active report
    /// the promoted name as [`Peek::Str`] instead.
    Name,
    BeginObject,
    BeginArray,
    EndObject,
    EndArray,
    EndOfDocument,
}

impl Peek {
    /// A short description used in error messages.
    pub fn name(self) -> &'static str {
        match self {
            Peek::Null => "null",
            Peek::Bool => "a boolean",
            Peek::Int => "an integer",
            Peek::Float => "a float",
            Peek::Str => "a string",
            Peek::Name => "a field name",
            Peek::BeginObject => "an object",
            Peek::BeginArray => "an array",
            Peek::EndObject => "end of object",
            Peek::EndArray => "end of array",
            Peek::EndOfDocument => "end of document",
        }
    }
}

// -----------------------------------------------------------------------------
// Errors

/// A format-level error raised by a [`TokenReader`].
#[derive(Debug, Error)]
pub enum ReadError {
    /// The next token was not of the requested kind.
    #[error("expected {expected} but found {found} at {path}")]
    UnexpectedToken {
        expected: &'static str,
        found: &'static str,
        path: String,
    },

    /// The input ended while a value was still expected.
    #[error("unexpected end of input at {path}")]
    UnexpectedEnd { path: String },
}

/// A format-level error raised by a [`TokenWriter`].
#[derive(Debug, Error)]
pub enum WriteError {
    /// The operation is not valid in the writer's current scope.
    #[error("cannot {op} at {path}")]
    InvalidState { op: &'static str, path: String },

    /// A value promoted to a field name was not a scalar.
    #[error("cannot use {kind} as a field name at {path}")]
    InvalidName { kind: &'static str, path: String },
}

// -----------------------------------------------------------------------------
// TokenReader

/// A pull-based reader over a stream of structured tokens.
///
/// Methods consume exactly one token (or one scope bracket); [`peek`]
/// inspects without consuming. Implementations track the structural path
/// of the token about to be read.
///
/// [`peek`]: TokenReader::peek
pub trait TokenReader {
    /// Consumes the opening bracket of an object scope.
    fn begin_object(&mut self) -> Result<(), ReadError>;

    /// Consumes the closing bracket of the current object scope.
    fn end_object(&mut self) -> Result<(), ReadError>;

    /// Consumes the opening bracket of an array scope.
    fn begin_array(&mut self) -> Result<(), ReadError>;

    /// Consumes the closing bracket of the current array scope.
    fn end_array(&mut self) -> Result<(), ReadError>;

    /// Whether the current scope has more entries or elements.
    fn has_next(&mut self) -> Result<bool, ReadError>;

    /// Consumes the next object field name.
    fn next_name(&mut self) -> Result<String, ReadError>;

    fn next_bool(&mut self) -> Result<bool, ReadError>;

    fn next_int(&mut self) -> Result<i64, ReadError>;

    /// Consumes the next number as a float; integer tokens coerce.
    fn next_float(&mut self) -> Result<f64, ReadError>;

    fn next_str(&mut self) -> Result<String, ReadError>;

    /// Consumes the next token, which must be the null marker.
    fn next_null(&mut self) -> Result<(), ReadError>;

    /// The kind of the next token, without consuming it.
    fn peek(&mut self) -> Result<Peek, ReadError>;

    /// Consumes and discards the next value. On an unconsumed field name
    /// the whole entry (name and value) is discarded.
    fn skip_value(&mut self) -> Result<(), ReadError>;

    /// Arranges for the next object field name to be delivered as an
    /// ordinary string value instead of through [`next_name`].
    ///
    /// [`next_name`]: TokenReader::next_name
    fn promote_name_to_value(&mut self) -> Result<(), ReadError>;

    /// The structural path of the next token, for diagnostics.
    fn path(&self) -> String;
}

// -----------------------------------------------------------------------------
// TokenWriter

/// A push-based writer of structured tokens, the mirror of [`TokenReader`].
pub trait TokenWriter {
    fn begin_object(&mut self) -> Result<(), WriteError>;

    fn end_object(&mut self) -> Result<(), WriteError>;

    fn begin_array(&mut self) -> Result<(), WriteError>;

    fn end_array(&mut self) -> Result<(), WriteError>;

    /// Writes the field name for the next value in the current object.
    fn write_name(&mut self, name: &str) -> Result<(), WriteError>;

    fn write_bool(&mut self, value: bool) -> Result<(), WriteError>;

    fn write_int(&mut self, value: i64) -> Result<(), WriteError>;

    fn write_float(&mut self, value: f64) -> Result<(), WriteError>;

    fn write_str(&mut self, value: &str) -> Result<(), WriteError>;

    /// Writes the explicit null marker.
    fn write_null(&mut self) -> Result<(), WriteError>;

    /// Arranges for the next written scalar to become the field name of
    /// the entry instead of a value. Composites and null are rejected
    /// with [`WriteError::InvalidName`].
    fn promote_value_to_name(&mut self) -> Result<(), WriteError>;

    /// The structural path of the next token, for diagnostics.
    fn path(&self) -> String;
}
