use core::any::Any;
use core::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::adapters::{ErasedAdapter, require_value};
use crate::any_value::{self, AnyValue};
use crate::error::{BuildError, DecodeError, EncodeError};
use crate::info::{TypeDescriptor, TypeInfo};
use crate::registry::{AdapterFactory, Resolver};
use crate::token::{TokenReader, TokenWriter};
use crate::value::{Object, OrderedMap, TextMap, Value};

// -----------------------------------------------------------------------------
// MapBacking

/// A container a [`MapAdapter`] can decode into and encode out of.
///
/// The backing decides the container's null policy: `null_value` is the
/// stored representation of an explicit null value, or `None` for
/// containers that reject null values outright.
trait MapBacking: Any + Send + fmt::Debug + Default {
    type Key: Any + Send + fmt::Debug;
    type Value: Any + Send + fmt::Debug;

    /// Type name used in diagnostics.
    const NAME: &'static str;

    /// Inserts an entry; callers rule out an existing key first via
    /// [`stored_debug`](MapBacking::stored_debug).
    fn insert_entry(&mut self, key: Self::Key, value: Self::Value);

    /// Debug rendering of the value already stored under `key`, if any.
    fn stored_debug(&self, key: &Self::Key) -> Option<String>;

    /// What an explicit null value is stored as, if anything.
    fn null_value() -> Option<Self::Value>;

    fn key_is_null(key: &Self::Key) -> bool;

    fn value_is_null(value: &Self::Value) -> bool;

    fn each_entry(
        &self,
        visit: &mut dyn FnMut(&Self::Key, &Self::Value) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError>;
}

impl MapBacking for OrderedMap<Value, Value> {
    type Key = Value;
    type Value = Value;

    const NAME: &'static str = "OrderedMap<Value, Value>";

    fn insert_entry(&mut self, key: Value, value: Value) {
        self.insert(key, value);
    }

    fn stored_debug(&self, key: &Value) -> Option<String> {
        self.get(key).map(|value| format!("{value:?}"))
    }

    fn null_value() -> Option<Value> {
        None
    }

    fn key_is_null(key: &Value) -> bool {
        key.is_null()
    }

    fn value_is_null(value: &Value) -> bool {
        value.is_null()
    }

    fn each_entry(
        &self,
        visit: &mut dyn FnMut(&Value, &Value) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        for (key, value) in self.iter() {
            visit(key, value)?;
        }
        Ok(())
    }
}

impl MapBacking for DashMap<Value, Value> {
    type Key = Value;
    type Value = Value;

    const NAME: &'static str = "DashMap<Value, Value>";

    fn insert_entry(&mut self, key: Value, value: Value) {
        self.insert(key, value);
    }

    fn stored_debug(&self, key: &Value) -> Option<String> {
        self.get(key).map(|entry| format!("{:?}", entry.value()))
    }

    fn null_value() -> Option<Value> {
        None
    }

    fn key_is_null(key: &Value) -> bool {
        key.is_null()
    }

    fn value_is_null(value: &Value) -> bool {
        value.is_null()
    }

    fn each_entry(
        &self,
        visit: &mut dyn FnMut(&Value, &Value) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        for entry in self.iter() {
            visit(entry.key(), entry.value())?;
        }
        Ok(())
    }
}

impl MapBacking for Object {
    type Key = String;
    type Value = Value;

    const NAME: &'static str = "Object";

    fn insert_entry(&mut self, key: String, value: Value) {
        self.insert(key, value);
    }

    fn stored_debug(&self, key: &String) -> Option<String> {
        self.get(key).map(|value| format!("{value:?}"))
    }

    /// The dynamic object keeps explicit nulls.
    fn null_value() -> Option<Value> {
        Some(Value::Null)
    }

    fn key_is_null(_key: &String) -> bool {
        false
    }

    fn value_is_null(value: &Value) -> bool {
        value.is_null()
    }

    fn each_entry(
        &self,
        visit: &mut dyn FnMut(&String, &Value) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        for (key, value) in self.iter() {
            visit(key, value)?;
        }
        Ok(())
    }
}

impl MapBacking for TextMap {
    type Key = String;
    type Value = String;

    const NAME: &'static str = "TextMap";

    fn insert_entry(&mut self, key: String, value: String) {
        self.insert(key, value);
    }

    fn stored_debug(&self, key: &String) -> Option<String> {
        self.get(key).map(|value| format!("{value:?}"))
    }

    fn null_value() -> Option<String> {
        None
    }

    fn key_is_null(_key: &String) -> bool {
        false
    }

    fn value_is_null(_value: &String) -> bool {
        false
    }

    fn each_entry(
        &self,
        visit: &mut dyn FnMut(&String, &String) -> Result<(), EncodeError>,
    ) -> Result<(), EncodeError> {
        for (key, value) in self.iter() {
            visit(key, value)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// MapAdapter

/// One decode/encode algorithm for every map-shaped container.
///
/// Field names are promoted to values so the key adapter reads them like
/// any other token, and back again on encode. Duplicate keys fail the
/// decode with both conflicting values named; null keys are always
/// rejected, null values per the backing's policy.
struct MapAdapter<C: MapBacking> {
    key: Arc<dyn ErasedAdapter>,
    value: Arc<dyn ErasedAdapter>,
    _marker: core::marker::PhantomData<fn() -> C>,
}

impl<C: MapBacking> MapAdapter<C> {
    fn new(key: Arc<dyn ErasedAdapter>, value: Arc<dyn ErasedAdapter>) -> Self {
        Self {
            key,
            value,
            _marker: core::marker::PhantomData,
        }
    }
}

impl<C: MapBacking> ErasedAdapter for MapAdapter<C> {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        reader.begin_object()?;
        let mut map = C::default();
        while reader.has_next()? {
            reader.promote_name_to_value()?;
            let key = match self.key.decode_value(reader)? {
                Some(key) => any_value::take::<C::Key>(key)
                    .ok_or(DecodeError::MismatchedValue { expected: C::NAME })?,
                None => return Err(DecodeError::NullKey {
                    path: reader.path(),
                }),
            };
            if C::key_is_null(&key) {
                return Err(DecodeError::NullKey {
                    path: reader.path(),
                });
            }
            let value = match self.value.decode_value(reader)? {
                Some(value) => any_value::take::<C::Value>(value)
                    .ok_or(DecodeError::MismatchedValue { expected: C::NAME })?,
                None => C::null_value().ok_or_else(|| DecodeError::NullValue {
                    path: reader.path(),
                })?,
            };
            if let Some(first) = map.stored_debug(&key) {
                return Err(DecodeError::DuplicateKey {
                    key: format!("{key:?}"),
                    first,
                    second: format!("{value:?}"),
                    path: reader.path(),
                });
            }
            map.insert_entry(key, value);
        }
        reader.end_object()?;
        Ok(Some(Box::new(map)))
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        let map = require_value::<C>(value, C::NAME)?;
        writer.begin_object()?;
        map.each_entry(&mut |key, value| {
            if C::key_is_null(key) {
                return Err(EncodeError::NullKey {
                    path: writer.path(),
                });
            }
            writer.promote_value_to_name()?;
            self.key.encode_value(writer, Some(key))?;
            if C::value_is_null(value) {
                self.value.encode_value(writer, None)
            } else {
                self.value.encode_value(writer, Some(value))
            }
        })?;
        writer.end_object()?;
        Ok(())
    }
}

impl<C: MapBacking> fmt::Debug for MapAdapter<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "MapAdapter({}, key={:?}, value={:?})",
            C::NAME,
            self.key,
            self.value
        )
    }
}

// -----------------------------------------------------------------------------
// Factories

/// Builds the adapter for the dynamic [`Object`] container.
#[derive(Debug)]
pub struct ObjectFactory;

impl AdapterFactory for ObjectFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.is_plain::<Object>() {
            return Ok(None);
        }
        let key = resolver.resolve(&TypeDescriptor::of::<String>())?;
        let value = resolver.resolve(&TypeDescriptor::of::<Value>())?;
        Ok(Some(Arc::new(MapAdapter::<Object>::new(key, value))))
    }
}

/// Builds adapters for the insertion-ordered map containers
/// ([`OrderedMap<Value, Value>`] and [`TextMap`]).
#[derive(Debug)]
pub struct OrderedMapFactory;

impl AdapterFactory for OrderedMapFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.qualifiers().is_empty() {
            return Ok(None);
        }
        let TypeInfo::Map(info) = descriptor.info() else {
            return Ok(None);
        };
        let ty = descriptor.info().ty();
        if ty.is::<OrderedMap<Value, Value>>() {
            let key = resolver.resolve(&TypeDescriptor::unqualified(info.key()))?;
            let value = resolver.resolve(&TypeDescriptor::unqualified(info.value()))?;
            return Ok(Some(Arc::new(MapAdapter::<OrderedMap<Value, Value>>::new(
                key, value,
            ))));
        }
        if ty.is::<TextMap>() {
            let key = resolver.resolve(&TypeDescriptor::unqualified(info.key()))?;
            let value = resolver.resolve(&TypeDescriptor::unqualified(info.value()))?;
            return Ok(Some(Arc::new(MapAdapter::<TextMap>::new(key, value))));
        }
        Ok(None)
    }
}

/// Builds the adapter for the concurrency-safe map container.
#[derive(Debug)]
pub struct ConcurrentMapFactory;

impl AdapterFactory for ConcurrentMapFactory {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError> {
        if !descriptor.is_plain::<DashMap<Value, Value>>() {
            return Ok(None);
        }
        let TypeInfo::Map(info) = descriptor.info() else {
            return Ok(None);
        };
        let key = resolver.resolve(&TypeDescriptor::unqualified(info.key()))?;
        let value = resolver.resolve(&TypeDescriptor::unqualified(info.value()))?;
        Ok(Some(Arc::new(MapAdapter::<DashMap<Value, Value>>::new(
            key, value,
        ))))
    }
}
