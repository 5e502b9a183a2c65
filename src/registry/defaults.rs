use std::sync::Arc;

use dashmap::DashMap;

use crate::any_value::AnyValue;
use crate::info::TypeDescriptor;
use crate::value::{Object, OrderedMap, TextMap, Value};

// -----------------------------------------------------------------------------
// DefaultValueProvider

/// A source of fallback values for non-nullable fields the input left
/// absent or explicitly null.
///
/// Providers are consulted in registration order and the first
/// non-`None` answer wins; the built-in zero-value provider sits at the
/// end of the chain. Returning `None` means "not my type" and passes
/// the question along.
pub trait DefaultValueProvider: Send + Sync {
    fn provide(&self, descriptor: &TypeDescriptor) -> Option<Box<dyn AnyValue>>;
}

/// The ordered provider chain a registry carries. Cheap to clone; every
/// bound adapter holds one.
#[derive(Clone)]
pub(crate) struct ProviderChain {
    providers: Arc<[Box<dyn DefaultValueProvider>]>,
}

impl ProviderChain {
    pub(crate) fn new(providers: Vec<Box<dyn DefaultValueProvider>>) -> Self {
        Self {
            providers: providers.into(),
        }
    }

    pub(crate) fn provide(&self, descriptor: &TypeDescriptor) -> Option<Box<dyn AnyValue>> {
        self.providers
            .iter()
            .find_map(|provider| provider.provide(descriptor))
    }
}

// -----------------------------------------------------------------------------
// BuiltinDefaults

/// Zero values for the standard types: `false`, `0`, `0.0`, the empty
/// string, null for the dynamic value, and empty containers.
pub struct BuiltinDefaults;

impl DefaultValueProvider for BuiltinDefaults {
    fn provide(&self, descriptor: &TypeDescriptor) -> Option<Box<dyn AnyValue>> {
        if !descriptor.qualifiers().is_empty() {
            return None;
        }
        let ty = descriptor.info().ty();
        if ty.is::<bool>() {
            return Some(Box::new(false));
        }
        if ty.is::<i64>() {
            return Some(Box::new(0_i64));
        }
        if ty.is::<f64>() {
            return Some(Box::new(0.0_f64));
        }
        if ty.is::<String>() {
            return Some(Box::new(String::new()));
        }
        if ty.is::<Value>() {
            return Some(Box::new(Value::Null));
        }
        if ty.is::<Vec<Value>>() {
            return Some(Box::new(Vec::<Value>::new()));
        }
        if ty.is::<OrderedMap<Value, Value>>() {
            return Some(Box::new(OrderedMap::<Value, Value>::new()));
        }
        if ty.is::<Object>() {
            return Some(Box::new(Object::new()));
        }
        if ty.is::<TextMap>() {
            return Some(Box::new(TextMap::new()));
        }
        if ty.is::<DashMap<Value, Value>>() {
            return Some(Box::new(DashMap::<Value, Value>::new()));
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::any_value::downcast_ref;
    use crate::info::Described;

    #[test]
    fn builtin_covers_scalars() {
        let provided = BuiltinDefaults
            .provide(&TypeDescriptor::of::<i64>())
            .unwrap();
        assert_eq!(downcast_ref::<i64>(&*provided), Some(&0));
    }

    #[test]
    fn qualified_requests_get_nothing() {
        let tagged = TypeDescriptor::qualified(i64::type_info(), &["port"]);
        assert!(BuiltinDefaults.provide(&tagged).is_none());
    }

    #[test]
    fn first_provider_wins() {
        struct FortyTwo;
        impl DefaultValueProvider for FortyTwo {
            fn provide(&self, descriptor: &TypeDescriptor) -> Option<Box<dyn AnyValue>> {
                descriptor
                    .info()
                    .ty()
                    .is::<i64>()
                    .then(|| Box::new(42_i64) as Box<dyn AnyValue>)
            }
        }
        let chain = ProviderChain::new(vec![Box::new(FortyTwo), Box::new(BuiltinDefaults)]);
        let provided = chain.provide(&TypeDescriptor::of::<i64>()).unwrap();
        assert_eq!(downcast_ref::<i64>(&*provided), Some(&42));
    }
}
