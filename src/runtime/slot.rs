//! Value slot for suspended computations
//!
//! A [`ValueSlot`] holds the most recent value a computation has yielded or
//! returned, together with an explicit has-value flag. At most one value is
//! live at a time: storing a new value drops a previous unconsumed one, and
//! taking the value transfers ownership out and clears the flag.

use std::any::Any;

/// Typed storage for the most recent value produced by a computation.
///
/// The `T = ()` instantiation carries no payload; its flag only records that
/// a yield or return has happened since the last read, so the same
/// suspension machinery serves computations that merely signal completion.
#[derive(Debug)]
pub struct ValueSlot<T> {
    value: Option<T>,
}

impl<T> ValueSlot<T> {
    /// Create an empty slot.
    #[inline]
    pub fn new() -> Self {
        Self { value: None }
    }

    /// Store a value, dropping any previous unconsumed one.
    #[inline]
    pub fn set(&mut self, value: T) {
        self.value = Some(value);
    }

    /// Whether a value is currently live.
    #[inline]
    pub fn has_value(&self) -> bool {
        self.value.is_some()
    }

    /// Take the stored value, clearing the slot.
    ///
    /// # Panics
    ///
    /// Panics if the slot is empty. A slot is never read twice without an
    /// intervening write; violating that is a bug in the caller, not a
    /// recoverable condition.
    #[inline]
    pub fn take(&mut self) -> T {
        self.value.take().expect("value slot read while empty")
    }

    /// Take the stored value if one is live.
    #[inline]
    pub fn try_take(&mut self) -> Option<T> {
        self.value.take()
    }

    /// Drop any live value without reading it.
    #[inline]
    pub fn clear(&mut self) {
        self.value = None;
    }
}

impl<T> Default for ValueSlot<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Object-safe view of a [`ValueSlot`] with the payload type erased, so
/// records with different value types can live in one arena.
pub(crate) trait ErasedSlot {
    /// Whether a value is currently live.
    fn has_value(&self) -> bool;

    /// Move the live value out as an [`Any`] box, or `None` if empty.
    fn take_boxed(&mut self) -> Option<Box<dyn Any>>;

    /// Downcast access for typed readers.
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: 'static> ErasedSlot for ValueSlot<T> {
    fn has_value(&self) -> bool {
        ValueSlot::has_value(self)
    }

    fn take_boxed(&mut self) -> Option<Box<dyn Any>> {
        self.try_take().map(|value| Box::new(value) as Box<dyn Any>)
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
