#![forbid(unsafe_code)]

//! Listener lists with RAII subscriptions.
//!
//! # Design
//!
//! A [`ListenerList<E>`] stores subscriber callbacks as `Weak` references.
//! The strong `Rc` lives inside the [`Subscription`] handed back to the
//! subscriber, so dropping the guard is all it takes to unsubscribe.
//!
//! # Re-entrancy
//!
//! [`notify`](ListenerList::notify) snapshots the live callbacks and releases
//! its borrow before calling any of them. A callback may therefore subscribe,
//! unsubscribe, or trigger another notification on the same list.
//!
//! # Failure Modes
//!
//! - **Subscriber leak**: a `Subscription` stored indefinitely keeps its
//!   callback alive. Dead weak references are pruned lazily on notify.
//! - **Dropped immediately**: `let _ = list.subscribe(..)` drops the guard at
//!   once and the callback never fires. Bind it to a named variable.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

type CallbackRc<E> = Rc<dyn Fn(&E)>;
type CallbackWeak<E> = Weak<dyn Fn(&E)>;

/// Ordered list of weakly held callbacks.
pub struct ListenerList<E> {
    subscribers: RefCell<Vec<CallbackWeak<E>>>,
}

impl<E> Default for ListenerList<E> {
    fn default() -> Self {
        Self {
            subscribers: RefCell::new(Vec::new()),
        }
    }
}

impl<E> ListenerList<E> {
    /// Number of live subscribers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.subscribers
            .borrow()
            .iter()
            .filter(|w| w.strong_count() > 0)
            .count()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E> std::fmt::Debug for ListenerList<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ListenerList")
            .field("live", &self.len())
            .finish()
    }
}

impl<E: 'static> ListenerList<E> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `callback`. It stays registered while the returned
    /// [`Subscription`] is alive.
    pub fn subscribe(&self, callback: impl Fn(&E) + 'static) -> Subscription {
        self.subscribe_rc(Rc::new(callback))
    }

    /// Register an already boxed callback (for `dyn`-compatible traits).
    pub fn subscribe_boxed(&self, callback: Box<dyn Fn(&E)>) -> Subscription {
        self.subscribe_rc(Rc::from(callback))
    }

    fn subscribe_rc(&self, strong: CallbackRc<E>) -> Subscription {
        self.subscribers.borrow_mut().push(Rc::downgrade(&strong));
        Subscription::from_guard(Box::new(strong))
    }

    /// Call every live subscriber in registration order and prune dead ones.
    pub fn notify(&self, event: &E) {
        let callbacks: Vec<CallbackRc<E>> = {
            let mut subscribers = self.subscribers.borrow_mut();
            subscribers.retain(|w| w.strong_count() > 0);
            subscribers.iter().filter_map(Weak::upgrade).collect()
        };
        for cb in &callbacks {
            cb(event);
        }
    }
}

/// RAII guard for a registered callback.
///
/// Dropping the `Subscription` drops the only strong reference to the
/// callback, so the weak entry in the list fails to upgrade from then on.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    _guard: Box<dyn Any>,
}

impl Subscription {
    pub(crate) fn from_guard(guard: Box<dyn Any>) -> Self {
        Self { _guard: guard }
    }

    /// Explicitly unsubscribe. Equivalent to dropping the guard.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}
