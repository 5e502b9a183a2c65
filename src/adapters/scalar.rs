use std::sync::Arc;

use crate::adapters::{ErasedAdapter, require_value};
use crate::any_value::AnyValue;
use crate::error::{BuildError, DecodeError, EncodeError};
use crate::info::{ScalarKind, TypeDescriptor, TypeInfo};
use crate::registry::{AdapterFactory, Resolver};
use crate::token::{TokenReader, TokenWriter};

// -----------------------------------------------------------------------------
// Scalar adapters

#[derive(Debug)]
struct BoolAdapter;

impl ErasedAdapter for BoolAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        Ok(Some(Box::new(reader.next_bool()?)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        Ok(writer.write_bool(*require_value::<bool>(value, "bool")?)?)
    }
}

#[derive(Debug)]
struct IntAdapter;

impl ErasedAdapter for IntAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        Ok(Some(Box::new(reader.next_int()?)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        Ok(writer.write_int(*require_value::<i64>(value, "i64")?)?)
    }
}

#[derive(Debug)]
struct FloatAdapter;

impl ErasedAdapter for FloatAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        Ok(Some(Box::new(reader.next_float()?)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        Ok(writer.write_float(*require_value::<f64>(value, "f64")?)?)
    }
}

#[derive(Debug)]
struct TextAdapter;

impl ErasedAdapter for TextAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        Ok(Some(Box::new(reader.next_str()?)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        Ok(writer.write_str(require_value::<String>(value, "String")?)?)
    }
}

// -----------------------------------------------------------------------------
// Factory

/// Builds adapters for the exact standard scalar types. Scalar newtypes
/// fall through to custom factories.
#[derive(Debug)]
pub struct ScalarFactory;

impl AdapterFactory for ScalarFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        _resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.qualifiers().is_empty() {
            return Ok(None);
        }
        let TypeInfo::Scalar(info) = descriptor.info() else {
            return Ok(None);
        };
        let ty = descriptor.info().ty();
        Ok(match info.kind() {
            ScalarKind::Bool if ty.is::<bool>() => Some(Arc::new(BoolAdapter)),
            ScalarKind::Int if ty.is::<i64>() => Some(Arc::new(IntAdapter)),
            ScalarKind::Float if ty.is::<f64>() => Some(Arc::new(FloatAdapter)),
            ScalarKind::Text if ty.is::<String>() => Some(Arc::new(TextAdapter)),
            _ => None,
        })
    }
}
