#![forbid(unsafe_code)]

//! Commit/revert broadcast signal.
//!
//! A [`CommitTrigger`] is shared by every buffer of a form. Calling
//! [`commit`](CommitTrigger::commit) or [`revert`](CommitTrigger::revert)
//! delivers the event to each current subscriber exactly once.
//!
//! # Invariants
//!
//! 1. The subscriber set is snapshotted before the broadcast, so handlers
//!    subscribing or unsubscribing mid-broadcast affect the next one only.
//! 2. A failing handler does not stop the broadcast; failures are collected
//!    into [`CommitError`] after every subscriber has been called.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::{debug, warn};

use crate::error::{BindingError, CommitError};
use crate::reactive::Subscription;

/// Event delivered by a [`CommitTrigger`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerEvent {
    Commit,
    Revert,
}

type Handler = dyn Fn(TriggerEvent) -> Result<(), BindingError>;

#[derive(Default)]
struct TriggerInner {
    handlers: RefCell<Vec<Weak<Handler>>>,
}

/// Shared commit/revert signal. Clones refer to the same trigger.
#[derive(Clone, Default)]
pub struct CommitTrigger {
    inner: Rc<TriggerInner>,
}

impl std::fmt::Debug for CommitTrigger {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CommitTrigger")
            .field("subscribers", &self.subscriber_count())
            .finish()
    }
}

impl CommitTrigger {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for commit and revert events while the returned
    /// [`Subscription`] lives.
    pub fn subscribe(
        &self,
        handler: impl Fn(TriggerEvent) -> Result<(), BindingError> + 'static,
    ) -> Subscription {
        let strong: Rc<Handler> = Rc::new(handler);
        self.inner.handlers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription::from_guard(Box::new(strong))
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .handlers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    /// Whether both handles refer to the same trigger.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    fn live_handlers(&self) -> Vec<Rc<Handler>> {
        let mut handlers = self.inner.handlers.borrow_mut();
        handlers.retain(|w| w.strong_count() > 0);
        handlers.iter().filter_map(Weak::upgrade).collect()
    }

    /// Ask every subscriber to commit.
    ///
    /// # Errors
    ///
    /// Returns every failure reported by a subscriber once all of them have
    /// been called.
    pub fn commit(&self) -> Result<(), CommitError> {
        let handlers = self.live_handlers();
        debug!(subscribers = handlers.len(), "commit broadcast");
        let failures: Vec<BindingError> = handlers
            .iter()
            .filter_map(|handler| handler(TriggerEvent::Commit).err())
            .collect();
        if failures.is_empty() {
            Ok(())
        } else {
            warn!(
                subscribers = handlers.len(),
                failed = failures.len(),
                "commit broadcast had failures"
            );
            Err(CommitError::new(failures))
        }
    }

    /// Ask every subscriber to discard pending edits.
    pub fn revert(&self) {
        let handlers = self.live_handlers();
        debug!(subscribers = handlers.len(), "revert broadcast");
        for handler in &handlers {
            if let Err(err) = handler(TriggerEvent::Revert) {
                warn!(error = %err, "revert handler failed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::{Cell, RefCell};
    use tracing_test::traced_test;

    #[test]
    fn broadcast_reaches_each_subscriber_once() {
        let trigger = CommitTrigger::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let subs: Vec<Subscription> = (0..3)
            .map(|i| {
                let log = Rc::clone(&log);
                trigger.subscribe(move |event| {
                    log.borrow_mut().push((i, event));
                    Ok(())
                })
            })
            .collect();

        trigger.commit().unwrap();
        trigger.revert();
        assert_eq!(log.borrow().len(), 6);
        assert_eq!(
            log.borrow().iter().filter(|(_, e)| *e == TriggerEvent::Commit).count(),
            3
        );
        drop(subs);
        assert_eq!(trigger.subscriber_count(), 0);
    }

    #[test]
    fn failures_are_collected_after_full_fan_out() {
        let trigger = CommitTrigger::new();
        let reached = Rc::new(Cell::new(0u32));
        let _failing = trigger.subscribe(|_| {
            Err(BindingError::NotWritable {
                path: "locked".into(),
            })
        });
        let reached_clone = Rc::clone(&reached);
        let _ok = trigger.subscribe(move |_| {
            reached_clone.set(reached_clone.get() + 1);
            Ok(())
        });

        let err = trigger.commit().unwrap_err();
        assert_eq!(err.failures().len(), 1);
        assert_eq!(reached.get(), 1);
    }

    #[test]
    fn unsubscribe_during_broadcast_affects_next_round() {
        let trigger = CommitTrigger::new();
        let calls = Rc::new(Cell::new(0u32));
        let slot: Rc<RefCell<Option<Subscription>>> = Rc::new(RefCell::new(None));

        let calls_clone = Rc::clone(&calls);
        let slot_clone = Rc::clone(&slot);
        let sub = trigger.subscribe(move |_| {
            calls_clone.set(calls_clone.get() + 1);
            slot_clone.borrow_mut().take();
            Ok(())
        });
        *slot.borrow_mut() = Some(sub);

        trigger.commit().unwrap();
        trigger.commit().unwrap();
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn clones_share_subscribers() {
        let trigger = CommitTrigger::new();
        let clone = trigger.clone();
        let _sub = trigger.subscribe(|_| Ok(()));
        assert!(trigger.ptr_eq(&clone));
        assert_eq!(clone.subscriber_count(), 1);
        assert!(!trigger.ptr_eq(&CommitTrigger::new()));
    }

    #[test]
    #[traced_test]
    fn failed_commit_is_logged() {
        let trigger = CommitTrigger::new();
        let _sub = trigger.subscribe(|_| {
            Err(BindingError::NotWritable {
                path: "locked".into(),
            })
        });
        assert!(trigger.commit().is_err());
        assert!(logs_contain("commit broadcast had failures"));
    }
}
