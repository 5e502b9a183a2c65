use core::any::Any;
use core::fmt;

// -----------------------------------------------------------------------------
// AnyValue

/// A type-erased decoded value.
///
/// This is the currency that flows between erased adapters: every value a
/// sub-adapter produces or consumes is a `Box<dyn AnyValue>` (or a borrowed
/// `&dyn AnyValue` on the encode path). The trait is automatically
/// implemented for every `Any + Send + Debug` type, so concrete values never
/// need to opt in.
///
/// The `Debug` requirement exists so decode errors can name conflicting
/// values (for example the two values of a duplicate map key).
pub trait AnyValue: Any + Send {
    /// Upcast to [`Any`] for downcasting by reference.
    fn as_any(&self) -> &dyn Any;

    /// Upcast to [`Any`] for downcasting by mutable reference.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Upcast to [`Any`] for downcasting by value.
    fn into_any(self: Box<Self>) -> Box<dyn Any>;

    /// Formats the underlying value with its `Debug` implementation.
    fn debug_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl<T: Any + Send + fmt::Debug> AnyValue for T {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }

    #[inline]
    fn debug_value(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

impl fmt::Debug for dyn AnyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.debug_value(f)
    }
}

// -----------------------------------------------------------------------------
// Downcast helpers

/// Takes the concrete value out of an erased box.
///
/// Returns `None` if the boxed value is not a `T`.
#[inline]
pub fn take<T: Any>(value: Box<dyn AnyValue>) -> Option<T> {
    value.into_any().downcast::<T>().ok().map(|boxed| *boxed)
}

/// Borrows the concrete value behind an erased reference.
#[inline]
pub fn downcast_ref<T: Any>(value: &dyn AnyValue) -> Option<&T> {
    value.as_any().downcast_ref::<T>()
}

/// Mutably borrows the concrete value behind an erased reference.
#[inline]
pub fn downcast_mut<T: Any>(value: &mut dyn AnyValue) -> Option<&mut T> {
    value.as_any_mut().downcast_mut::<T>()
}
