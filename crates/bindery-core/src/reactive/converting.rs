#![forbid(unsafe_code)]

//! Type-converting view over another cell.
//!
//! [`ConvertingValueCell`] presents a source cell through a pair of
//! conversions: `forward` on every read and change notification, `backward`
//! on every write. A typical use is exposing an integer property as text to
//! an edit control.

use std::rc::{Rc, Weak};

use super::cell::{SharedCell, ValueCell, ValueChange};
use super::listeners::{ListenerList, Subscription};
use crate::error::BindingError;
use crate::value::Value;

type Forward = Box<dyn Fn(&Value) -> Value>;
type Backward = Box<dyn Fn(Value) -> Result<Value, BindingError>>;

/// A cell that converts values flowing to and from a source cell.
pub struct ConvertingValueCell {
    source: SharedCell,
    forward: Forward,
    backward: Backward,
    listeners: ListenerList<ValueChange>,
    _source_sub: Subscription,
}

impl ConvertingValueCell {
    /// Wrap `source`. Source change events are re-published converted;
    /// events whose converted values are equal are swallowed.
    pub fn new(
        source: SharedCell,
        forward: impl Fn(&Value) -> Value + 'static,
        backward: impl Fn(Value) -> Result<Value, BindingError> + 'static,
    ) -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let source_sub = source.subscribe(Box::new(move |change: &ValueChange| {
                if let Some(cell) = weak.upgrade() {
                    cell.forward_change(change);
                }
            }));
            Self {
                source,
                forward: Box::new(forward),
                backward: Box::new(backward),
                listeners: ListenerList::new(),
                _source_sub: source_sub,
            }
        })
    }

    /// The wrapped source cell.
    #[must_use]
    pub fn source(&self) -> &SharedCell {
        &self.source
    }

    fn forward_change(&self, change: &ValueChange) {
        let old = (self.forward)(&change.old);
        let new = (self.forward)(&change.new);
        if old != new {
            self.listeners.notify(&ValueChange { old, new });
        }
    }
}

impl ValueCell for ConvertingValueCell {
    fn get_value(&self) -> Result<Value, BindingError> {
        self.source.get_value().map(|v| (self.forward)(&v))
    }

    fn set_value(&self, value: Value) -> Result<(), BindingError> {
        let converted = (self.backward)(value)?;
        self.source.set_value(converted)
    }

    fn subscribe(&self, listener: Box<dyn Fn(&ValueChange)>) -> Subscription {
        self.listeners.subscribe_boxed(listener)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reactive::{ValueCellExt, ValueHolder};
    use std::cell::RefCell;

    fn int_as_text(source: SharedCell) -> Rc<ConvertingValueCell> {
        ConvertingValueCell::new(
            source,
            |v| match v.as_int() {
                Some(n) => Value::from(n.to_string()),
                None => Value::Null,
            },
            |v| match v.as_str() {
                Some(s) => s.trim().parse::<i64>().map(Value::from).map_err(|e| {
                    BindingError::InvalidProperty {
                        path: String::new(),
                        reason: e.to_string(),
                    }
                }),
                None if v.is_null() => Ok(Value::Null),
                None => Err(BindingError::InvalidProperty {
                    path: String::new(),
                    reason: format!("expected text, got {}", v.kind()),
                }),
            },
        )
    }

    #[test]
    fn reads_and_writes_are_converted() {
        let holder = Rc::new(ValueHolder::new(5));
        let text = int_as_text(holder.clone());
        assert_eq!(text.get_value().unwrap(), Value::from("5"));

        text.set(" 12 ").unwrap();
        assert_eq!(holder.get(), Value::from(12));
    }

    #[test]
    fn failed_conversion_leaves_source_untouched() {
        let holder = Rc::new(ValueHolder::new(5));
        let text = int_as_text(holder.clone());
        assert!(text.set("twelve").is_err());
        assert_eq!(holder.get(), Value::from(5));
        assert_eq!(holder.version(), 0);
    }

    #[test]
    fn source_changes_are_republished_converted() {
        let holder = Rc::new(ValueHolder::new(1));
        let text = int_as_text(holder.clone());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let seen_clone = Rc::clone(&seen);
        let _sub = text.on_change(move |c| seen_clone.borrow_mut().push(c.new.clone()));

        holder.set(2);
        assert_eq!(*seen.borrow(), vec![Value::from("2")]);
        assert_eq!(text.listener_count(), 1);
    }
}
