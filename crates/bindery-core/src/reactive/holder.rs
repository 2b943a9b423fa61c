#![forbid(unsafe_code)]

//! Plain in-memory value cell.
//!
//! # Design
//!
//! [`ValueHolder`] stores a [`Value`] behind a `RefCell` together with a
//! version counter. When a write changes the value (as judged by the
//! injected [`ChangeDetector`]) the version is bumped once and every live
//! listener is notified with `(old, new)`.
//!
//! | Operation     | Complexity                 |
//! |---------------|----------------------------|
//! | `get()`       | O(1) plus a value clone    |
//! | `set()`       | O(S) where S = subscribers |
//! | `subscribe()` | O(1) amortized             |
//!
//! Writes release the interior borrow before notifying, so a listener may
//! write the same holder again. Nested writes notify in call order and the
//! holder ends with the last value written.

use std::cell::RefCell;
use std::rc::Rc;

use super::cell::{ValueCell, ValueChange};
use super::detector::{ChangeDetector, default_detector};
use super::listeners::{ListenerList, Subscription};
use crate::error::BindingError;
use crate::value::Value;

struct HolderState {
    value: Value,
    version: u64,
}

/// An observable, version-tracked value.
pub struct ValueHolder {
    state: RefCell<HolderState>,
    listeners: ListenerList<ValueChange>,
    detector: Rc<dyn ChangeDetector>,
}

impl std::fmt::Debug for ValueHolder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("ValueHolder")
            .field("value", &state.value)
            .field("version", &state.version)
            .field("listener_count", &self.listeners.len())
            .finish()
    }
}

impl ValueHolder {
    /// Holder using value equality.
    #[must_use]
    pub fn new(value: impl Into<Value>) -> Self {
        Self::with_detector(value, default_detector())
    }

    /// Holder using the given change detector.
    #[must_use]
    pub fn with_detector(value: impl Into<Value>, detector: Rc<dyn ChangeDetector>) -> Self {
        Self {
            state: RefCell::new(HolderState {
                value: value.into(),
                version: 0,
            }),
            listeners: ListenerList::new(),
            detector,
        }
    }

    /// Clone of the current value.
    #[must_use]
    pub fn get(&self) -> Value {
        self.state.borrow().value.clone()
    }

    /// Borrow the current value without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&Value) -> R) -> R {
        f(&self.state.borrow().value)
    }

    /// Store `value`, notifying listeners when it counts as a change.
    pub fn set(&self, value: impl Into<Value>) {
        let value = value.into();
        let old = {
            let mut state = self.state.borrow_mut();
            if !self.detector.has_changed(&state.value, &value) {
                return;
            }
            state.version += 1;
            std::mem::replace(&mut state.value, value.clone())
        };
        self.listeners.notify(&ValueChange { old, new: value });
    }

    /// Number of detected changes since construction.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.state.borrow().version
    }
}

impl ValueCell for ValueHolder {
    fn get_value(&self) -> Result<Value, BindingError> {
        Ok(self.get())
    }

    fn set_value(&self, value: Value) -> Result<(), BindingError> {
        self.set(value);
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&ValueChange)>) -> Subscription {
        self.listeners.subscribe_boxed(listener)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
