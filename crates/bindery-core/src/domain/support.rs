#![forbid(unsafe_code)]

//! Reusable listener registry for publishing domain objects.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;

use super::{ChangePublisher, ListenerId, PropertyChange, PropertyListener};
use crate::value::Value;

/// Per-property listener registry.
///
/// Embed one in a hand-written [`DomainObject`](super::DomainObject) and
/// return it from `publisher()`. Call [`fire`](Self::fire) after every
/// stored change, outside of any interior borrow.
#[derive(Default)]
pub struct ChangeSupport {
    listeners: RefCell<BTreeMap<String, Vec<(ListenerId, PropertyListener)>>>,
    next_id: Cell<u64>,
}

impl ChangeSupport {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Notify every listener of `property`, in registration order.
    ///
    /// Listeners are snapshotted first, so a listener may add or remove
    /// registrations while being called.
    pub fn fire(&self, property: &str, old: Value, new: Value) {
        let snapshot: Vec<PropertyListener> = match self.listeners.borrow().get(property) {
            Some(entries) => entries.iter().map(|(_, l)| l.clone()).collect(),
            None => return,
        };
        let change = PropertyChange {
            property: property.to_string(),
            old,
            new,
        };
        for listener in snapshot {
            listener(&change);
        }
    }

    /// Total number of registrations across all properties.
    #[must_use]
    pub fn total_listener_count(&self) -> usize {
        self.listeners.borrow().values().map(Vec::len).sum()
    }
}

impl ChangePublisher for ChangeSupport {
    fn add_listener(&self, property: &str, listener: PropertyListener) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners
            .borrow_mut()
            .entry(property.to_string())
            .or_default()
            .push((id, listener));
        id
    }

    fn remove_listener(&self, property: &str, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let Some(entries) = listeners.get_mut(property) else {
            return false;
        };
        let before = entries.len();
        entries.retain(|(entry_id, _)| *entry_id != id);
        let removed = entries.len() != before;
        if entries.is_empty() {
            listeners.remove(property);
        }
        removed
    }

    fn listener_count(&self, property: &str) -> usize {
        self.listeners.borrow().get(property).map_or(0, Vec::len)
    }
}

impl std::fmt::Debug for ChangeSupport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChangeSupport")
            .field("listener_count", &self.total_listener_count())
            .finish()
    }
}
