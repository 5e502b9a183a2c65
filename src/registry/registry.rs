use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError, RwLock};

use crate::adapters::{
    Adapter, BindFactory, ConcurrentMapFactory, DynamicFactory, ErasedAdapter, ObjectFactory,
    OrderedMapFactory, ScalarFactory, SeqFactory,
};
use crate::error::BuildError;
use crate::info::{CacheKey, Described, TypeDescriptor};
use crate::registry::defaults::{BuiltinDefaults, DefaultValueProvider, ProviderChain};
use crate::registry::factory::{AdapterFactory, Resolver};

// -----------------------------------------------------------------------------
// UnknownFieldPolicy

/// What a bound adapter does with an input field no binding claims.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnknownFieldPolicy {
    /// Silently skip the field's value.
    #[default]
    Skip,
    /// Fail the decode.
    Deny,
}

// -----------------------------------------------------------------------------
// AdapterRegistry

/// The composition root: an immutable set of factories and default-value
/// providers, plus the memoized adapters they have built.
///
/// Construction goes through [`builder`](AdapterRegistry::builder);
/// [`new`](AdapterRegistry::new) is the all-defaults registry. The
/// registry is shared freely across threads; resolution takes a build
/// lock so each adapter is built once, while cache hits stay on the
/// read path.
pub struct AdapterRegistry {
    factories: Box<[Box<dyn AdapterFactory>]>,
    providers: ProviderChain,
    policy: UnknownFieldPolicy,
    cache: RwLock<HashMap<CacheKey, Arc<dyn ErasedAdapter>>>,
    build_lock: Mutex<()>,
}

impl AdapterRegistry {
    /// A registry with the standard factories and built-in defaults.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> AdapterRegistryBuilder {
        AdapterRegistryBuilder::new()
    }

    /// The typed adapter for `T`.
    pub fn adapter<T: Described>(&self) -> Result<Adapter<T>, BuildError> {
        Ok(Adapter::new(self.resolve(&TypeDescriptor::of::<T>())?))
    }

    /// Resolves an adapter for an arbitrary descriptor.
    pub fn resolve(
        &self,
        descriptor: &TypeDescriptor,
    ) -> Result<Arc<dyn ErasedAdapter>, BuildError> {
        let key = descriptor.cache_key();
        if let Some(found) = self.cached(&key) {
            tracing::trace!(ty = descriptor.path(), "adapter cache hit");
            return Ok(found);
        }
        let _build = self
            .build_lock
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        // Another thread may have built it while we waited.
        if let Some(found) = self.cached(&key) {
            return Ok(found);
        }
        let mut inflight = HashMap::new();
        let mut staged = HashMap::new();
        let adapter = Resolver::new(self, &mut inflight, &mut staged).resolve(descriptor)?;
        // Commit only now: a failed resolution drops its staged adapters,
        // and with them every unfilled deferred delegate.
        self.cache_commit(staged);
        Ok(adapter)
    }

    pub(crate) fn cached(&self, key: &CacheKey) -> Option<Arc<dyn ErasedAdapter>> {
        self.cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub(crate) fn cache_commit(&self, staged: HashMap<CacheKey, Arc<dyn ErasedAdapter>>) {
        self.cache
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .extend(staged);
    }

    pub(crate) fn factories(&self) -> &[Box<dyn AdapterFactory>] {
        &self.factories
    }

    pub(crate) fn providers(&self) -> ProviderChain {
        self.providers.clone()
    }

    pub(crate) fn policy(&self) -> UnknownFieldPolicy {
        self.policy
    }
}

impl Default for AdapterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let cached = self
            .cache
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len();
        f.debug_struct("AdapterRegistry")
            .field("factories", &self.factories.len())
            .field("cached", &cached)
            .field("policy", &self.policy)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Builder

/// Assembles an [`AdapterRegistry`].
///
/// Custom factories and providers are consulted in registration order,
/// always before their built-in counterparts.
pub struct AdapterRegistryBuilder {
    factories: Vec<Box<dyn AdapterFactory>>,
    providers: Vec<Box<dyn DefaultValueProvider>>,
    builtin_defaults: bool,
    policy: UnknownFieldPolicy,
}

impl AdapterRegistryBuilder {
    fn new() -> Self {
        Self {
            factories: Vec::new(),
            providers: Vec::new(),
            builtin_defaults: true,
            policy: UnknownFieldPolicy::Skip,
        }
    }

    /// Adds a custom factory, tried before the built-ins.
    pub fn with_factory(mut self, factory: impl AdapterFactory + 'static) -> Self {
        self.factories.push(Box::new(factory));
        self
    }

    /// Adds a default-value provider, consulted before the built-in
    /// zero values.
    pub fn with_provider(mut self, provider: impl DefaultValueProvider + 'static) -> Self {
        self.providers.push(Box::new(provider));
        self
    }

    /// Drops the built-in zero-value provider from the chain.
    pub fn without_builtin_defaults(mut self) -> Self {
        self.builtin_defaults = false;
        self
    }

    /// Makes bound adapters fail on input fields no binding claims.
    pub fn deny_unknown_fields(mut self) -> Self {
        self.policy = UnknownFieldPolicy::Deny;
        self
    }

    pub fn build(self) -> AdapterRegistry {
        let mut factories = self.factories;
        factories.push(Box::new(ObjectFactory));
        factories.push(Box::new(OrderedMapFactory));
        factories.push(Box::new(ConcurrentMapFactory));
        factories.push(Box::new(ScalarFactory));
        factories.push(Box::new(DynamicFactory));
        factories.push(Box::new(SeqFactory));
        // The metadata-driven fallback always comes last.
        factories.push(Box::new(BindFactory));

        let mut providers = self.providers;
        if self.builtin_defaults {
            providers.push(Box::new(BuiltinDefaults));
        }

        AdapterRegistry {
            factories: factories.into_boxed_slice(),
            providers: ProviderChain::new(providers),
            policy: self.policy,
            cache: RwLock::new(HashMap::new()),
            build_lock: Mutex::new(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn resolution_is_idempotent() {
        let registry = AdapterRegistry::new();
        let first = registry.resolve(&TypeDescriptor::of::<Value>()).unwrap();
        let second = registry.resolve(&TypeDescriptor::of::<Value>()).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn qualified_requests_are_distinct() {
        let registry = AdapterRegistry::new();
        assert!(registry.resolve(&TypeDescriptor::of::<Value>()).is_ok());
        let tagged = TypeDescriptor::qualified(Value::type_info(), &["compact"]);
        assert!(matches!(
            registry.resolve(&tagged),
            Err(BuildError::UnsupportedType { .. })
        ));
    }
}
