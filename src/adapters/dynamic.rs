use std::sync::Arc;

use crate::adapters::{ErasedAdapter, require_value};
use crate::any_value::{self, AnyValue};
use crate::error::{BuildError, DecodeError, EncodeError};
use crate::info::{TypeDescriptor, TypeInfo};
use crate::registry::{AdapterFactory, Resolver};
use crate::token::{Peek, TokenReader, TokenWriter};
use crate::value::{Object, Value};

// -----------------------------------------------------------------------------
// DynamicAdapter

/// Decodes whatever the input holds into a [`Value`] tree.
///
/// Nulls inside composites stay in the tree as [`Value::Null`]; a
/// document that is nothing but the null marker never reaches this
/// adapter (the null-safe wrapper surfaces it as the absent value).
#[derive(Debug)]
struct DynamicAdapter;

fn read_value(reader: &mut dyn TokenReader) -> Result<Value, DecodeError> {
    Ok(match reader.peek()? {
        Peek::Null => {
            reader.next_null()?;
            Value::Null
        }
        Peek::Bool => Value::Bool(reader.next_bool()?),
        Peek::Int => Value::Int(reader.next_int()?),
        Peek::Float => Value::Float(reader.next_float()?),
        Peek::Str => Value::Str(reader.next_str()?),
        Peek::BeginArray => {
            reader.begin_array()?;
            let mut items = Vec::new();
            while reader.has_next()? {
                items.push(read_value(reader)?);
            }
            reader.end_array()?;
            Value::Seq(items)
        }
        Peek::BeginObject => {
            reader.begin_object()?;
            let mut map = Object::new();
            while reader.has_next()? {
                let name = reader.next_name()?;
                let value = read_value(reader)?;
                if let Some(first) = map.get(&name) {
                    return Err(DecodeError::DuplicateKey {
                        key: name.clone(),
                        first: format!("{first:?}"),
                        second: format!("{value:?}"),
                        path: reader.path(),
                    });
                }
                map.insert(name, value);
            }
            reader.end_object()?;
            Value::Object(map)
        }
        found @ (Peek::Name | Peek::EndObject | Peek::EndArray | Peek::EndOfDocument) => {
            return Err(crate::token::ReadError::UnexpectedToken {
                expected: "a value",
                found: found.name(),
                path: reader.path(),
            }
            .into());
        }
    })
}

fn write_value(writer: &mut dyn TokenWriter, value: &Value) -> Result<(), EncodeError> {
    match value {
        Value::Null => writer.write_null()?,
        Value::Bool(b) => writer.write_bool(*b)?,
        Value::Int(n) => writer.write_int(*n)?,
        Value::Float(n) => writer.write_float(*n)?,
        Value::Str(s) => writer.write_str(s)?,
        Value::Seq(items) => {
            writer.begin_array()?;
            for item in items {
                write_value(writer, item)?;
            }
            writer.end_array()?;
        }
        Value::Object(map) => {
            writer.begin_object()?;
            for (name, value) in map.iter() {
                writer.write_name(name)?;
                write_value(writer, value)?;
            }
            writer.end_object()?;
        }
    }
    Ok(())
}

impl ErasedAdapter for DynamicAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        Ok(Some(Box::new(read_value(reader)?)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        write_value(writer, require_value::<Value>(value, "Value")?)
    }
}

// -----------------------------------------------------------------------------
// SeqAdapter

/// A dynamic sequence, decoded element by element through the resolved
/// element adapter so element-level qualifier and custom-factory
/// behavior applies.
struct SeqAdapter {
    item: Arc<dyn ErasedAdapter>,
}

impl ErasedAdapter for SeqAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        reader.begin_array()?;
        let mut items: Vec<Value> = Vec::new();
        while reader.has_next()? {
            items.push(match self.item.decode_value(reader)? {
                Some(value) => any_value::take::<Value>(value)
                    .ok_or(DecodeError::MismatchedValue { expected: "Value" })?,
                None => Value::Null,
            });
        }
        reader.end_array()?;
        Ok(Some(Box::new(items)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        let items = require_value::<Vec<Value>>(value, "Vec<Value>")?;
        writer.begin_array()?;
        for item in items {
            if item.is_null() {
                self.item.encode_value(writer, None)?;
            } else {
                self.item.encode_value(writer, Some(item))?;
            }
        }
        writer.end_array()?;
        Ok(())
    }
}

impl core::fmt::Debug for SeqAdapter {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "SeqAdapter({:?})", self.item)
    }
}

// -----------------------------------------------------------------------------
// Factories

/// Builds the adapter for the dynamic [`Value`] type.
#[derive(Debug)]
pub struct DynamicFactory;

impl AdapterFactory for DynamicFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        _resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if descriptor.is_plain::<Value>() && matches!(descriptor.info(), TypeInfo::Dynamic(_)) {
            Ok(Some(Arc::new(DynamicAdapter)))
        } else {
            Ok(None)
        }
    }
}

/// Builds the adapter for dynamic sequences (`Vec<Value>`).
#[derive(Debug)]
pub struct SeqFactory;

impl AdapterFactory for SeqFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.is_plain::<Vec<Value>>() {
            return Ok(None);
        }
        let TypeInfo::List(info) = descriptor.info() else {
            return Ok(None);
        };
        let item = resolver.resolve(&TypeDescriptor::unqualified(info.item()))?;
        Ok(Some(Arc::new(SeqAdapter { item })))
    }
}
