//! Declared per-type metadata.
//!
//! The binding engine cannot introspect types at runtime, so every
//! bindable type declares its shape up front by implementing
//! [`Described`]: a one-time [`TypeInfo`] naming the type's kind and,
//! for structured types, its constructor parameters and properties.
//! Adapter factories consume this metadata once at build time; the
//! decode/encode hot path never looks at it again.
//!
//! Implementations follow a fixed pattern: a `static` [`TypeInfoCell`]
//! initialized on first use, with related types referenced through
//! delayed `fn() -> &'static TypeInfo` pointers so cyclic shapes are
//! representable.
//!
//! ```
//! use databind::info::{Described, ScalarInfo, ScalarKind, TypeInfo, TypeInfoCell};
//!
//! #[derive(Debug)]
//! struct Celsius(f64);
//!
//! impl Described for Celsius {
//!     fn type_info() -> &'static TypeInfo {
//!         static CELL: TypeInfoCell = TypeInfoCell::new();
//!         CELL.get_or_init(|| {
//!             TypeInfo::Scalar(ScalarInfo::new::<Celsius>("Celsius", ScalarKind::Float))
//!         })
//!     }
//! }
//! ```

mod descriptor;
mod struct_info;

pub use descriptor::TypeDescriptor;
pub(crate) use descriptor::CacheKey;
pub use struct_info::{
    Args, Constructor, Getter, ParamInfo, PropertyInfo, Setter, Slot, StructInfo,
};

use core::any::{Any, TypeId};
use core::fmt;
use std::sync::OnceLock;

// -----------------------------------------------------------------------------
// Type

/// A type's identity: its [`TypeId`] paired with a stable path for
/// diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Type {
    id: TypeId,
    path: &'static str,
}

impl Type {
    pub fn of<T: Any>(path: &'static str) -> Self {
        Self {
            id: TypeId::of::<T>(),
            path,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.id
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        self.path
    }

    /// Whether this identity is exactly `T`.
    #[inline]
    pub fn is<T: Any>(&self) -> bool {
        self.id == TypeId::of::<T>()
    }
}

// -----------------------------------------------------------------------------
// TypeInfo

/// A type's declared shape, matched on by adapter factories.
#[derive(Debug)]
pub enum TypeInfo {
    /// A single wire scalar.
    Scalar(ScalarInfo),
    /// The dynamic value type; decodes whatever the input holds.
    Dynamic(DynamicInfo),
    /// A homogeneous sequence.
    List(ListInfo),
    /// A homogeneous map with declared key and value shapes.
    Map(MapInfo),
    /// The dynamic object type (text names to dynamic values).
    Object(ObjectInfo),
    /// A structured type with constructor parameters and properties.
    Struct(StructInfo),
    /// Known to exist but not bindable; resolution fails with
    /// `UnsupportedType` unless a custom factory claims it.
    Opaque(OpaqueInfo),
}

impl TypeInfo {
    pub fn ty(&self) -> &Type {
        match self {
            TypeInfo::Scalar(info) => &info.ty,
            TypeInfo::Dynamic(info) => &info.ty,
            TypeInfo::List(info) => &info.ty,
            TypeInfo::Map(info) => &info.ty,
            TypeInfo::Object(info) => &info.ty,
            TypeInfo::Struct(info) => info.ty(),
            TypeInfo::Opaque(info) => &info.ty,
        }
    }

    #[inline]
    pub fn id(&self) -> TypeId {
        self.ty().id()
    }

    #[inline]
    pub fn path(&self) -> &'static str {
        self.ty().path()
    }
}

/// The wire representation of a scalar type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarKind {
    Bool,
    Int,
    Float,
    Text,
}

#[derive(Debug)]
pub struct ScalarInfo {
    ty: Type,
    kind: ScalarKind,
}

impl ScalarInfo {
    pub fn new<T: Any>(path: &'static str, kind: ScalarKind) -> Self {
        Self {
            ty: Type::of::<T>(path),
            kind,
        }
    }

    #[inline]
    pub fn kind(&self) -> ScalarKind {
        self.kind
    }
}

#[derive(Debug)]
pub struct DynamicInfo {
    ty: Type,
}

impl DynamicInfo {
    pub fn new<T: Any>(path: &'static str) -> Self {
        Self {
            ty: Type::of::<T>(path),
        }
    }
}

pub struct ListInfo {
    ty: Type,
    item: fn() -> &'static TypeInfo,
}

impl ListInfo {
    pub fn new<T: Any>(path: &'static str, item: fn() -> &'static TypeInfo) -> Self {
        Self {
            ty: Type::of::<T>(path),
            item,
        }
    }

    /// The declared element shape.
    #[inline]
    pub fn item(&self) -> &'static TypeInfo {
        (self.item)()
    }
}

impl fmt::Debug for ListInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ListInfo").field("ty", &self.ty).finish()
    }
}

pub struct MapInfo {
    ty: Type,
    key: fn() -> &'static TypeInfo,
    value: fn() -> &'static TypeInfo,
}

impl MapInfo {
    pub fn new<T: Any>(
        path: &'static str,
        key: fn() -> &'static TypeInfo,
        value: fn() -> &'static TypeInfo,
    ) -> Self {
        Self {
            ty: Type::of::<T>(path),
            key,
            value,
        }
    }

    /// The declared key shape.
    #[inline]
    pub fn key(&self) -> &'static TypeInfo {
        (self.key)()
    }

    /// The declared value shape.
    #[inline]
    pub fn value(&self) -> &'static TypeInfo {
        (self.value)()
    }
}

impl fmt::Debug for MapInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapInfo").field("ty", &self.ty).finish()
    }
}

#[derive(Debug)]
pub struct ObjectInfo {
    ty: Type,
}

impl ObjectInfo {
    pub fn new<T: Any>(path: &'static str) -> Self {
        Self {
            ty: Type::of::<T>(path),
        }
    }
}

#[derive(Debug)]
pub struct OpaqueInfo {
    ty: Type,
}

impl OpaqueInfo {
    pub fn new<T: Any>(path: &'static str) -> Self {
        Self {
            ty: Type::of::<T>(path),
        }
    }
}

// -----------------------------------------------------------------------------
// Described

/// A type with declared binding metadata.
///
/// `type_info` must return the same `&'static TypeInfo` on every call;
/// the [`TypeInfoCell`] pattern in the module docs guarantees this.
pub trait Described: Any + Send + fmt::Debug {
    fn type_info() -> &'static TypeInfo;
}

/// Backing storage for a type's one-time [`TypeInfo`].
pub struct TypeInfoCell(OnceLock<TypeInfo>);

impl TypeInfoCell {
    pub const fn new() -> Self {
        Self(OnceLock::new())
    }

    /// Returns the stored info, building it on first use.
    pub fn get_or_init(&'static self, init: impl FnOnce() -> TypeInfo) -> &'static TypeInfo {
        self.0.get_or_init(init)
    }
}

impl Default for TypeInfoCell {
    fn default() -> Self {
        Self::new()
    }
}
