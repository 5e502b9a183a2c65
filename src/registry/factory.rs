use core::fmt;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};

use crate::adapters::{ErasedAdapter, NullSafeAdapter};
use crate::any_value::AnyValue;
use crate::error::{BuildError, DecodeError, EncodeError};
use crate::info::{CacheKey, TypeDescriptor};
use crate::registry::{AdapterRegistry, ProviderChain, UnknownFieldPolicy};
use crate::token::{TokenReader, TokenWriter};

// -----------------------------------------------------------------------------
// AdapterFactory

/// One link in the registry's resolution chain.
///
/// `create` returns `Ok(None)` to decline a type and pass the request to
/// the next factory, `Ok(Some(adapter))` to claim it, or an error to
/// fail the whole resolution. Sub-adapters for element or property types
/// come from the supplied [`Resolver`], never from the registry
/// directly, so in-progress builds can see each other.
pub trait AdapterFactory: Send + Sync {
    fn create(
        &self,
        descriptor: &TypeDescriptor,
        resolver: &mut Resolver<'_>,
    ) -> Result<Option<Arc<dyn ErasedAdapter>>, BuildError>;
}

// -----------------------------------------------------------------------------
// DeferredAdapter

/// The stand-in handed out while a type's own build is still running.
///
/// When a factory (directly or through sub-adapters) asks for a type
/// that is already being built higher up the same resolution, it gets a
/// deferred adapter instead of recursing forever. The registry fills it
/// before the resolution returns, and a failed resolution discards every
/// adapter it staged, so an unfilled stand-in never reaches a decode or
/// encode.
pub(crate) struct DeferredAdapter {
    path: &'static str,
    cell: OnceLock<Arc<dyn ErasedAdapter>>,
}

impl DeferredAdapter {
    fn new(path: &'static str) -> Self {
        Self {
            path,
            cell: OnceLock::new(),
        }
    }

    fn fill(&self, adapter: Arc<dyn ErasedAdapter>) {
        let _ = self.cell.set(adapter);
    }

    fn delegate(&self) -> &Arc<dyn ErasedAdapter> {
        self.cell
            .get()
            .expect("deferred adapter used before its resolution completed")
    }
}

impl ErasedAdapter for DeferredAdapter {
    fn decode_value(
        &self,
        reader: &mut dyn TokenReader,
    ) -> Result<Option<Box<dyn AnyValue>>, DecodeError> {
        self.delegate().decode_value(reader)
    }

    fn encode_value(
        &self,
        writer: &mut dyn TokenWriter,
        value: Option<&dyn AnyValue>,
    ) -> Result<(), EncodeError> {
        self.delegate().encode_value(writer, value)
    }
}

impl fmt::Debug for DeferredAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DeferredAdapter({})", self.path)
    }
}

// -----------------------------------------------------------------------------
// Resolver

/// The view of the registry a factory resolves sub-adapters through.
///
/// Carries the in-flight builds of the current resolution on top of the
/// registry's finished cache. Finished sub-adapters are staged here, not
/// written to the cache; the registry commits the whole stage only when
/// the top-level resolution succeeds, so a build that fails partway
/// cannot leave sub-adapters behind whose deferred delegates were never
/// filled.
pub struct Resolver<'a> {
    registry: &'a AdapterRegistry,
    inflight: &'a mut HashMap<CacheKey, Arc<DeferredAdapter>>,
    staged: &'a mut HashMap<CacheKey, Arc<dyn ErasedAdapter>>,
}

impl<'a> Resolver<'a> {
    pub(crate) fn new(
        registry: &'a AdapterRegistry,
        inflight: &'a mut HashMap<CacheKey, Arc<DeferredAdapter>>,
        staged: &'a mut HashMap<CacheKey, Arc<dyn ErasedAdapter>>,
    ) -> Self {
        Self {
            registry,
            inflight,
            staged,
        }
    }

    /// Resolves an adapter, building it if this resolution has not
    /// already, and handing back a deferred stand-in for a build that is
    /// still on the stack.
    pub fn resolve(
        &mut self,
        descriptor: &TypeDescriptor,
    ) -> Result<Arc<dyn ErasedAdapter>, BuildError> {
        let key = descriptor.cache_key();
        if let Some(found) = self.registry.cached(&key) {
            tracing::trace!(ty = descriptor.path(), "adapter cache hit");
            return Ok(found);
        }
        if let Some(found) = self.staged.get(&key) {
            tracing::trace!(ty = descriptor.path(), "adapter staged in this resolution");
            return Ok(Arc::clone(found));
        }
        if let Some(pending) = self.inflight.get(&key) {
            tracing::trace!(ty = descriptor.path(), "rejoining in-flight build");
            return Ok(Arc::clone(pending) as Arc<dyn ErasedAdapter>);
        }

        let deferred = Arc::new(DeferredAdapter::new(descriptor.path()));
        self.inflight.insert(key.clone(), Arc::clone(&deferred));

        let registry = self.registry;
        let mut built: Option<Arc<dyn ErasedAdapter>> = None;
        for factory in registry.factories() {
            if let Some(adapter) = factory.create(descriptor, self)? {
                built = Some(adapter);
                break;
            }
        }
        let built = built.ok_or(BuildError::UnsupportedType {
            path: descriptor.path(),
        })?;

        let wrapped: Arc<dyn ErasedAdapter> = Arc::new(NullSafeAdapter::new(built));
        deferred.fill(Arc::clone(&wrapped));
        self.staged.insert(key, Arc::clone(&wrapped));
        tracing::debug!(ty = descriptor.path(), "built adapter");
        Ok(wrapped)
    }

    pub(crate) fn default_providers(&self) -> ProviderChain {
        self.registry.providers()
    }

    pub(crate) fn unknown_field_policy(&self) -> UnknownFieldPolicy {
        self.registry.policy()
    }
}
