use core::fmt;
use std::sync::Arc;

use crate::adapters::ErasedAdapter;
use crate::any_value::AnyValue;
use crate::error::{DecodeError, EncodeError};
use crate::token::{Peek, TokenReader, TokenWriter};

// -----------------------------------------------------------------------------
// NullSafeAdapter

/// Handles the explicit null around an inner adapter.
///
/// On decode, a peeked null marker is consumed and surfaces as `None`
/// without the inner adapter running; on encode, `None` writes the null
/// marker. Everything else delegates. The registry wraps every adapter
/// it resolves, so inner adapters never see the null token.
pub struct NullSafeAdapter {
    inner: Arc<dyn ErasedAdapter>,
}

impl NullSafeAdapter {
    pub fn new(inner: Arc<dyn ErasedAdapter>) -> Self {
        Self { inner }
    }
}

impl ErasedAdapter for NullSafeAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        if reader.peek()? == Peek::Null {
            reader.next_null()?;
            return Ok(None);
        }
        self.inner.decode_value(reader)
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        match value {
            Some(_) => self.inner.encode_value(writer, value),
            None => Ok(writer.write_null()?),
        }
    }
}

impl fmt::Debug for NullSafeAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}.null_safe()", self.inner)
    }
}
