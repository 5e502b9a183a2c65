use core::any::Any;
use core::fmt;

use crate::any_value::{self, AnyValue};
use crate::error::{DecodeError, EncodeError};
use crate::info::{Type, TypeInfo};

// -----------------------------------------------------------------------------
// Accessor signatures

/// Reads a property off an erased instance. `Ok(None)` means the
/// property is currently null.
pub type Getter = fn(&dyn AnyValue) -> Result<Option<&dyn AnyValue>, EncodeError>;

/// Writes a decoded slot into an erased instance after construction.
pub type Setter = fn(&mut dyn AnyValue, Slot) -> Result<(), DecodeError>;

/// Builds an instance from filled constructor argument slots.
pub type Constructor = fn(Args<'_>) -> Result<Box<dyn AnyValue>, DecodeError>;

// -----------------------------------------------------------------------------
// Slot

/// The state of one binding slot during a decode.
///
/// The three states are distinct on purpose: a field that never appeared
/// ([`Slot::Absent`]) is not the same as a field that appeared with an
/// explicit null ([`Slot::Null`]). The absent marker never escapes a
/// decode; by the time the constructor runs, every slot is either filled,
/// null, or deliberately left absent for a parameter with its own default.
#[derive(Debug)]
pub enum Slot {
    /// No input field wrote this slot.
    Absent,
    /// The input field was present with an explicit null.
    Null,
    /// The decoded value.
    Present(Box<dyn AnyValue>),
}

impl Slot {
    /// Whether any input field wrote this slot.
    #[inline]
    pub fn is_filled(&self) -> bool {
        !matches!(self, Slot::Absent)
    }

    /// The decoded value of a non-nullable slot, for setters.
    pub fn into_required<T: Any>(self, field: &'static str) -> Result<T, DecodeError> {
        match self {
            Slot::Present(value) => {
                any_value::take::<T>(value).ok_or(DecodeError::InvalidSlot { field })
            }
            Slot::Absent | Slot::Null => Err(DecodeError::InvalidSlot { field }),
        }
    }

    /// The decoded value of a nullable slot, for setters; an explicit
    /// null becomes `None`.
    pub fn into_optional<T: Any>(self, field: &'static str) -> Result<Option<T>, DecodeError> {
        match self {
            Slot::Present(value) => any_value::take::<T>(value)
                .map(Some)
                .ok_or(DecodeError::InvalidSlot { field }),
            Slot::Null => Ok(None),
            Slot::Absent => Err(DecodeError::InvalidSlot { field }),
        }
    }
}

/// The constructor's view of its argument slots.
///
/// Constructors pull each argument out by position; the accessors fail
/// with [`DecodeError::InvalidSlot`] if a slot does not hold the state
/// the declared parameter promises, which only happens when a type's
/// declared metadata disagrees with its constructor.
pub struct Args<'a> {
    slots: &'a mut [Slot],
}

impl<'a> Args<'a> {
    pub fn new(slots: &'a mut [Slot]) -> Self {
        Self { slots }
    }

    fn take(&mut self, index: usize) -> Slot {
        match self.slots.get_mut(index) {
            Some(slot) => core::mem::replace(slot, Slot::Absent),
            None => Slot::Absent,
        }
    }

    /// A required, non-nullable argument.
    pub fn required<T: Any>(
        &mut self,
        index: usize,
        field: &'static str,
    ) -> Result<T, DecodeError> {
        match self.take(index) {
            Slot::Present(value) => {
                any_value::take::<T>(value).ok_or(DecodeError::InvalidSlot { field })
            }
            Slot::Absent | Slot::Null => Err(DecodeError::InvalidSlot { field }),
        }
    }

    /// A nullable argument; an explicit null becomes `None`.
    pub fn optional<T: Any>(
        &mut self,
        index: usize,
        field: &'static str,
    ) -> Result<Option<T>, DecodeError> {
        match self.take(index) {
            Slot::Present(value) => any_value::take::<T>(value)
                .map(Some)
                .ok_or(DecodeError::InvalidSlot { field }),
            Slot::Null => Ok(None),
            Slot::Absent => Err(DecodeError::InvalidSlot { field }),
        }
    }

    /// An argument with a declared default, used when the slot was left
    /// absent.
    pub fn defaulted<T: Any>(
        &mut self,
        index: usize,
        field: &'static str,
        default: impl FnOnce() -> T,
    ) -> Result<T, DecodeError> {
        match self.take(index) {
            Slot::Present(value) => {
                any_value::take::<T>(value).ok_or(DecodeError::InvalidSlot { field })
            }
            Slot::Absent => Ok(default()),
            Slot::Null => Err(DecodeError::InvalidSlot { field }),
        }
    }

    /// A nullable argument with a declared default: an explicit null
    /// becomes `None`, an absent field becomes the default.
    pub fn optional_defaulted<T: Any>(
        &mut self,
        index: usize,
        field: &'static str,
        default: impl FnOnce() -> Option<T>,
    ) -> Result<Option<T>, DecodeError> {
        match self.take(index) {
            Slot::Present(value) => any_value::take::<T>(value)
                .map(Some)
                .ok_or(DecodeError::InvalidSlot { field }),
            Slot::Null => Ok(None),
            Slot::Absent => Ok(default()),
        }
    }
}

// -----------------------------------------------------------------------------
// ParamInfo

/// A declared constructor parameter.
#[derive(Clone, Copy)]
pub struct ParamInfo {
    name: &'static str,
    info: fn() -> &'static TypeInfo,
    nullable: bool,
    has_default: bool,
}

impl ParamInfo {
    /// A parameter that must be supplied by input (or a default value
    /// provider).
    pub fn required<T: crate::info::Described>(name: &'static str) -> Self {
        Self {
            name,
            info: T::type_info,
            nullable: false,
            has_default: false,
        }
    }

    /// A parameter that accepts an explicit null; `T` is the inner type
    /// of the option.
    pub fn nullable<T: crate::info::Described>(name: &'static str) -> Self {
        Self {
            name,
            info: T::type_info,
            nullable: true,
            has_default: false,
        }
    }

    /// A parameter whose constructor supplies its own fallback when the
    /// input omits the field.
    pub fn defaulted<T: crate::info::Described>(name: &'static str) -> Self {
        Self {
            name,
            info: T::type_info,
            nullable: false,
            has_default: true,
        }
    }

    /// Marks the parameter as carrying a constructor-supplied fallback.
    /// Combined with [`nullable`](ParamInfo::nullable) this declares a
    /// parameter that is both nullable and defaulted; the constructor
    /// reads it through [`Args::optional_defaulted`].
    pub fn with_default(mut self) -> Self {
        self.has_default = true;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn info(&self) -> &'static TypeInfo {
        (self.info)()
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn has_default(&self) -> bool {
        self.has_default
    }
}

impl fmt::Debug for ParamInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParamInfo")
            .field("name", &self.name)
            .field("nullable", &self.nullable)
            .field("has_default", &self.has_default)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// PropertyInfo

/// A declared member property.
///
/// A property sharing a name with a constructor parameter feeds that
/// parameter; one that does not must carry a setter to participate in
/// decoding, and is applied after construction.
#[derive(Clone, Copy)]
pub struct PropertyInfo {
    name: &'static str,
    wire_name: Option<&'static str>,
    info: fn() -> &'static TypeInfo,
    nullable: bool,
    transient: bool,
    get: Option<Getter>,
    set: Option<Setter>,
}

impl PropertyInfo {
    pub fn new<T: crate::info::Described>(name: &'static str, get: Getter) -> Self {
        Self {
            name,
            wire_name: None,
            info: T::type_info,
            nullable: false,
            transient: false,
            get: Some(get),
            set: None,
        }
    }

    /// A property excluded from both decoding and encoding. Its
    /// constructor parameter, if any, must carry its own default.
    pub fn transient<T: crate::info::Described>(name: &'static str) -> Self {
        Self {
            name,
            wire_name: None,
            info: T::type_info,
            nullable: false,
            transient: true,
            get: None,
            set: None,
        }
    }

    /// Overrides the field name used on the wire.
    pub fn with_wire_name(mut self, wire_name: &'static str) -> Self {
        self.wire_name = Some(wire_name);
        self
    }

    /// Makes the property writable after construction.
    pub fn with_setter(mut self, set: Setter) -> Self {
        self.set = Some(set);
        self
    }

    /// Marks the property nullable; `T` in [`new`](PropertyInfo::new) is
    /// then the inner type of the option.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name used on the wire: the override if declared, else the
    /// property name.
    #[inline]
    pub fn wire_name(&self) -> &'static str {
        self.wire_name.unwrap_or(self.name)
    }

    #[inline]
    pub fn info(&self) -> &'static TypeInfo {
        (self.info)()
    }

    #[inline]
    pub fn is_nullable(&self) -> bool {
        self.nullable
    }

    #[inline]
    pub fn is_transient(&self) -> bool {
        self.transient
    }

    #[inline]
    pub fn getter(&self) -> Option<Getter> {
        self.get
    }

    #[inline]
    pub fn setter(&self) -> Option<Setter> {
        self.set
    }
}

impl fmt::Debug for PropertyInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyInfo")
            .field("name", &self.name)
            .field("wire_name", &self.wire_name)
            .field("nullable", &self.nullable)
            .field("transient", &self.transient)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// StructInfo

/// The declared shape of a structured type: constructor parameters in
/// positional order, member properties, and the constructor itself.
pub struct StructInfo {
    ty: Type,
    params: Box<[ParamInfo]>,
    properties: Box<[PropertyInfo]>,
    construct: Constructor,
}

impl StructInfo {
    pub fn new<T: Any>(
        path: &'static str,
        params: impl Into<Box<[ParamInfo]>>,
        properties: impl Into<Box<[PropertyInfo]>>,
        construct: Constructor,
    ) -> Self {
        Self {
            ty: Type::of::<T>(path),
            params: params.into(),
            properties: properties.into(),
            construct,
        }
    }

    #[inline]
    pub fn ty(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn params(&self) -> &[ParamInfo] {
        &self.params
    }

    #[inline]
    pub fn properties(&self) -> &[PropertyInfo] {
        &self.properties
    }

    #[inline]
    pub fn constructor(&self) -> Constructor {
        self.construct
    }
}

impl fmt::Debug for StructInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructInfo")
            .field("ty", &self.ty)
            .field("params", &self.params)
            .field("properties", &self.properties)
            .finish()
    }
}
