#![forbid(unsafe_code)]

//! Deferred-commit wrapper around another cell.
//!
//! # State Machine
//!
//! ```text
//!               set_value(v)
//!  UNBUFFERED ───────────────▶ BUFFERING ──┐ set_value(v != wrapped)
//!      ▲                         │  ▲      │
//!      │ commit / revert /       │  └──────┘
//!      └ set_value(wrapped) ─────┘
//! ```
//!
//! While buffering, writes stay in the buffer and changes to the wrapped
//! cell are recorded without being surfaced. A buffering-state event fires
//! on every transition between the two states and never otherwise. When a
//! transition also changes the visible value, the buffering-state event is
//! delivered first.
//!
//! A failed commit leaves the cell buffering so the caller can retry or
//! revert.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, trace, warn};

use super::trigger::{CommitTrigger, TriggerEvent};
use crate::error::BindingError;
use crate::reactive::{
    ChangeDetector, ListenerList, SharedCell, Subscription, ValueCell, ValueChange,
    default_detector,
};
use crate::value::Value;

struct BufferState {
    buffered: Value,
    buffering: bool,
    wrapped_value: Value,
}

/// A cell that holds writes back from its wrapped cell until committed.
pub struct BufferedValueCell {
    wrapped: SharedCell,
    detector: Rc<dyn ChangeDetector>,
    state: RefCell<BufferState>,
    listeners: ListenerList<ValueChange>,
    buffering_listeners: ListenerList<bool>,
    trigger: RefCell<Option<(CommitTrigger, Subscription)>>,
    _wrapped_sub: Subscription,
    weak_self: Weak<Self>,
}

impl std::fmt::Debug for BufferedValueCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("BufferedValueCell")
            .field("buffering", &state.buffering)
            .field("buffered", &state.buffered)
            .field("wrapped_value", &state.wrapped_value)
            .field("has_trigger", &self.trigger.borrow().is_some())
            .finish()
    }
}

impl BufferedValueCell {
    /// Buffer writes to `wrapped`, committing and reverting on `trigger`.
    #[must_use]
    pub fn new(wrapped: SharedCell, trigger: Option<CommitTrigger>) -> Rc<Self> {
        Self::with_detector(wrapped, trigger, default_detector())
    }

    /// Like [`new`](Self::new) with an explicit change detector.
    #[must_use]
    pub fn with_detector(
        wrapped: SharedCell,
        trigger: Option<CommitTrigger>,
        detector: Rc<dyn ChangeDetector>,
    ) -> Rc<Self> {
        let cell = Rc::new_cyclic(|weak: &Weak<Self>| {
            let upstream = weak.clone();
            let wrapped_sub = wrapped.subscribe(Box::new(move |change: &ValueChange| {
                if let Some(cell) = upstream.upgrade() {
                    cell.on_wrapped_changed(change);
                }
            }));
            let wrapped_value = wrapped.get_value().unwrap_or_default();
            Self {
                wrapped,
                detector,
                state: RefCell::new(BufferState {
                    buffered: Value::Null,
                    buffering: false,
                    wrapped_value,
                }),
                listeners: ListenerList::new(),
                buffering_listeners: ListenerList::new(),
                trigger: RefCell::new(None),
                _wrapped_sub: wrapped_sub,
                weak_self: weak.clone(),
            }
        });
        cell.set_commit_trigger(trigger);
        cell
    }

    /// The cell writes are committed to.
    #[must_use]
    pub fn wrapped(&self) -> &SharedCell {
        &self.wrapped
    }

    #[must_use]
    pub fn is_buffering(&self) -> bool {
        self.state.borrow().buffering
    }

    #[must_use]
    pub fn commit_trigger(&self) -> Option<CommitTrigger> {
        self.trigger.borrow().as_ref().map(|(t, _)| t.clone())
    }

    /// Move to another trigger, or detach with `None`. The old trigger no
    /// longer reaches this cell.
    pub fn set_commit_trigger(&self, trigger: Option<CommitTrigger>) {
        let next = trigger.map(|trigger| {
            let weak = self.weak_self.clone();
            let sub = trigger.subscribe(move |event| match weak.upgrade() {
                Some(cell) => cell.handle(event),
                None => Ok(()),
            });
            (trigger, sub)
        });
        let previous = self.trigger.replace(next);
        drop(previous);
    }

    /// Observe buffering-state transitions (`true` on entering buffering).
    pub fn subscribe_buffering(&self, listener: impl Fn(bool) + 'static) -> Subscription {
        self.buffering_listeners
            .subscribe(move |buffering: &bool| listener(*buffering))
    }

    /// Write the buffered value through. No-op when not buffering.
    ///
    /// # Errors
    ///
    /// Returns the wrapped cell's write failure; the cell stays buffering.
    pub fn commit(&self) -> Result<(), BindingError> {
        let pending = {
            let state = self.state.borrow();
            if !state.buffering {
                return Ok(());
            }
            state.buffered.clone()
        };

        if let Err(err) = self.wrapped.set_value(pending.clone()) {
            warn!(error = %err, "commit rejected; still buffering");
            return Err(err);
        }

        let committed = self.read_wrapped();
        let settled = {
            let mut state = self.state.borrow_mut();
            state.wrapped_value = committed.clone();
            // A listener of the wrapped cell may have rewritten the buffer
            // during the write-through; that newer value wins.
            let untouched =
                state.buffering && !self.detector.has_changed(&state.buffered, &pending);
            if untouched {
                state.buffering = false;
                state.buffered = Value::Null;
            }
            untouched
        };
        if !settled {
            debug!("buffer rewritten during commit");
            return Ok(());
        }
        debug!(value = ?committed, "buffer committed");
        self.buffering_listeners.notify(&false);
        if self.detector.has_changed(&pending, &committed) {
            self.listeners.notify(&ValueChange {
                old: pending,
                new: committed,
            });
        }
        Ok(())
    }

    /// Discard the buffered value. No-op when not buffering.
    pub fn revert(&self) {
        let discarded = {
            let mut state = self.state.borrow_mut();
            if !state.buffering {
                return;
            }
            state.buffering = false;
            std::mem::take(&mut state.buffered)
        };

        let truth = self.read_wrapped();
        self.state.borrow_mut().wrapped_value = truth.clone();
        debug!(discarded = ?discarded, "buffer reverted");
        self.buffering_listeners.notify(&false);
        if self.detector.has_changed(&discarded, &truth) {
            self.listeners.notify(&ValueChange {
                old: discarded,
                new: truth,
            });
        }
    }

    fn handle(&self, event: TriggerEvent) -> Result<(), BindingError> {
        match event {
            TriggerEvent::Commit => self.commit(),
            TriggerEvent::Revert => {
                self.revert();
                Ok(())
            }
        }
    }

    /// Fresh wrapped value, or the last one seen if the read fails.
    fn read_wrapped(&self) -> Value {
        match self.wrapped.get_value() {
            Ok(value) => value,
            Err(_) => self.state.borrow().wrapped_value.clone(),
        }
    }

    fn on_wrapped_changed(&self, change: &ValueChange) {
        let surface = {
            let mut state = self.state.borrow_mut();
            state.wrapped_value = change.new.clone();
            !state.buffering
        };
        if surface {
            self.listeners.notify(change);
        } else {
            trace!(value = ?change.new, "wrapped change shielded by buffer");
        }
    }
}

impl ValueCell for BufferedValueCell {
    fn get_value(&self) -> Result<Value, BindingError> {
        {
            let state = self.state.borrow();
            if state.buffering {
                return Ok(state.buffered.clone());
            }
        }
        self.wrapped.get_value()
    }

    fn set_value(&self, value: Value) -> Result<(), BindingError> {
        let wrapped_now = self.read_wrapped();
        let (old_visible, was_buffering, now_buffering) = {
            let mut state = self.state.borrow_mut();
            let was_buffering = state.buffering;
            let old_visible = if was_buffering {
                state.buffered.clone()
            } else {
                wrapped_now.clone()
            };
            if was_buffering && !self.detector.has_changed(&wrapped_now, &value) {
                state.buffering = false;
                state.buffered = Value::Null;
            } else {
                state.buffering = true;
                state.buffered = value.clone();
            }
            (old_visible, was_buffering, state.buffering)
        };

        let new_visible = if now_buffering { value } else { wrapped_now };
        if was_buffering != now_buffering {
            trace!(buffering = now_buffering, "buffering state changed");
            self.buffering_listeners.notify(&now_buffering);
        }
        if self.detector.has_changed(&old_visible, &new_visible) {
            self.listeners.notify(&ValueChange {
                old: old_visible,
                new: new_visible,
            });
        }
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&ValueChange)>) -> Subscription {
        self.listeners.subscribe_boxed(listener)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
