use core::any::Any;
use core::fmt;
use core::marker::PhantomData;
use std::sync::Arc;

use crate::any_value::{self, AnyValue};
use crate::error::{DecodeError, EncodeError};
use crate::info::Described;
use crate::token::{TokenReader, TokenWriter};

// -----------------------------------------------------------------------------
// ErasedAdapter

/// A type-erased decode/encode strategy for one concrete type.
///
/// `None` stands for the explicit null on both sides: a decode that
/// consumed the null marker returns `Ok(None)`, and encoding `None`
/// writes the null marker. The [`NullSafeAdapter`] decorator supplies
/// that behavior for every adapter the registry hands out, so inner
/// adapters may assume a non-null token is due.
///
/// [`NullSafeAdapter`]: crate::adapters::NullSafeAdapter
pub trait ErasedAdapter: Send + Sync + fmt::Debug {
    /// Consumes exactly one value from `reader`.
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError>;

    /// Produces exactly one value into `writer`.
    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError>;
}

/// Downcasts the erased value an encode call received, failing with the
/// adapter's expected type name if it is absent or of another type.
pub(crate) fn require_value<'a, T: Any>(
    value: Option<&'a dyn AnyValue>,
    expected: &'static str,
) -> Result<&'a T, EncodeError> {
    value
        .and_then(any_value::downcast_ref::<T>)
        .ok_or(EncodeError::MismatchedValue { expected })
}

// -----------------------------------------------------------------------------
// Adapter

/// The typed handle the registry hands out for a resolved type.
///
/// Cheap to clone; clones share the underlying erased adapter.
pub struct Adapter<T> {
    erased: Arc<dyn ErasedAdapter>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Described> Adapter<T> {
    pub(crate) fn new(erased: Arc<dyn ErasedAdapter>) -> Self {
        Self {
            erased,
            _marker: PhantomData,
        }
    }

    /// Decodes one non-null value.
    ///
    /// An explicit null in the input is an error here; use
    /// [`decode_nullable`](Adapter::decode_nullable) where null is a
    /// legal outcome.
    pub fn decode(&self, reader: &mut dyn TokenReader) -> Result<T, DecodeError> {
        match self.erased.decode_value(reader)? {
            Some(value) => any_value::take::<T>(value).ok_or(DecodeError::MismatchedValue {
                expected: T::type_info().path(),
            }),
            None => Err(DecodeError::UnexpectedNull {
                field: T::type_info().path().to_string(),
                path: reader.path(),
            }),
        }
    }

    /// Decodes one value, mapping the explicit null to `None`.
    pub fn decode_nullable(&self, reader: &mut dyn TokenReader) -> Result<Option<T>, DecodeError> {
        match self.erased.decode_value(reader)? {
            Some(value) => any_value::take::<T>(value)
                .map(Some)
                .ok_or(DecodeError::MismatchedValue {
                    expected: T::type_info().path(),
                }),
            None => Ok(None),
        }
    }

    /// Encodes one value.
    pub fn encode(&self, writer: &mut dyn TokenWriter, value: &T) -> Result<(), EncodeError> {
        self.erased.encode_value(writer, Some(value))
    }

    /// Encodes a value or, for `None`, the explicit null marker.
    pub fn encode_nullable(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&T>,
    ) -> Result<(), EncodeError> {
        self.erased
            .encode_value(writer, value.map(|v| v as &dyn AnyValue))
    }
}

impl<T> Clone for Adapter<T> {
    fn clone(&self) -> Self {
        Self {
            erased: Arc::clone(&self.erased),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Adapter<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.erased, f)
    }
}
