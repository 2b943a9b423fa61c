#![forbid(unsafe_code)]

//! The [`ValueCell`] contract shared by every observable value holder.

use std::rc::Rc;

use super::listeners::Subscription;
use crate::error::BindingError;
use crate::value::Value;

/// Payload delivered to change listeners.
#[derive(Debug, Clone, PartialEq)]
pub struct ValueChange {
    pub old: Value,
    pub new: Value,
}

/// An observable holder for a single value.
///
/// Every successful `set_value` that the cell's change detector judges a
/// change produces exactly one notification carrying `(old, new)`.
/// Reads and writes may fail for cells backed by a property path.
pub trait ValueCell {
    fn get_value(&self) -> Result<Value, BindingError>;

    fn set_value(&self, value: Value) -> Result<(), BindingError>;

    /// Register a change listener. Dropping the returned guard removes it.
    fn subscribe(&self, listener: Box<dyn Fn(&ValueChange)>) -> Subscription;

    /// Number of live change listeners.
    fn listener_count(&self) -> usize;
}

/// Convenience methods for any [`ValueCell`], including trait objects.
pub trait ValueCellExt: ValueCell {
    /// Subscribe with a closure.
    fn on_change(&self, listener: impl Fn(&ValueChange) + 'static) -> Subscription {
        self.subscribe(Box::new(listener))
    }

    /// Convert and write in one call.
    fn set(&self, value: impl Into<Value>) -> Result<(), BindingError> {
        self.set_value(value.into())
    }
}

impl<C: ValueCell + ?Sized> ValueCellExt for C {}

/// Shared, type-erased cell handle.
pub type SharedCell = Rc<dyn ValueCell>;

/// Whether two handles refer to the same cell instance.
#[must_use]
pub fn same_cell(a: &SharedCell, b: &SharedCell) -> bool {
    std::ptr::addr_eq(Rc::as_ptr(a), Rc::as_ptr(b))
}
