use core::any::{Any, TypeId};
use core::hash::{Hash, Hasher};

use crate::info::{Described, TypeInfo};

// -----------------------------------------------------------------------------
// TypeDescriptor

/// What the registry resolves: a type's declared shape plus an ordered
/// set of qualifier tags.
///
/// Qualifiers let one type carry several adapters (for example a custom
/// wire format for a tagged field); the built-in factories only accept
/// unqualified requests, so any qualified request falls through to
/// custom factories.
///
/// Identity is the pair (type id, qualifiers); two descriptors with the
/// same pair resolve to the same cached adapter.
#[derive(Clone, Copy)]
pub struct TypeDescriptor {
    info: &'static TypeInfo,
    qualifiers: &'static [&'static str],
}

impl TypeDescriptor {
    /// The unqualified descriptor of `T`.
    pub fn of<T: Described>() -> Self {
        Self {
            info: T::type_info(),
            qualifiers: &[],
        }
    }

    /// A qualified descriptor over the same shape.
    pub fn qualified(info: &'static TypeInfo, qualifiers: &'static [&'static str]) -> Self {
        Self { info, qualifiers }
    }

    /// An unqualified descriptor over an already-resolved shape, as used
    /// by factories resolving element types.
    pub fn unqualified(info: &'static TypeInfo) -> Self {
        Self {
            info,
            qualifiers: &[],
        }
    }

    #[inline]
    pub fn info(&self) -> &'static TypeInfo {
        self.info
    }

    #[inline]
    pub fn qualifiers(&self) -> &'static [&'static str] {
        self.qualifiers
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        self.info.path()
    }

    /// Whether the described type is exactly `T` with no qualifiers.
    #[inline]
    pub fn is_plain<T: Any>(&self) -> bool {
        self.qualifiers.is_empty() && self.info.id() == TypeId::of::<T>()
    }

    pub(crate) fn cache_key(&self) -> CacheKey {
        CacheKey {
            id: self.info.id(),
            qualifiers: self.qualifiers,
        }
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.cache_key() == other.cache_key()
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.cache_key().hash(state);
    }
}

impl core::fmt::Debug for TypeDescriptor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("TypeDescriptor")
            .field("path", &self.path())
            .field("qualifiers", &self.qualifiers)
            .finish()
    }
}

/// Adapter cache identity.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct CacheKey {
    id: TypeId,
    qualifiers: &'static [&'static str],
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::Value;

    #[test]
    fn identity_includes_qualifiers() {
        let plain = TypeDescriptor::of::<Value>();
        let tagged = TypeDescriptor::qualified(Value::type_info(), &["compact"]);
        assert_ne!(plain, tagged);
        assert_eq!(plain, TypeDescriptor::of::<Value>());
        assert!(plain.is_plain::<Value>());
        assert!(!tagged.is_plain::<Value>());
    }
}
