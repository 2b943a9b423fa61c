#![forbid(unsafe_code)]

//! Validation results model.
//!
//! A [`ValidationResultsModel`] holds the messages an external validator
//! produced, in insertion order, and notifies subscribers whenever the set
//! changes. Models nest: a parent reports its own messages followed by every
//! child's, and a change in any child is re-announced by the parent.
//!
//! # Invariants
//!
//! 1. Each mutating call that changes the message set notifies exactly once.
//! 2. Calls that change nothing (removing an absent message, clearing an
//!    empty model) do not notify.
//! 3. The child graph is acyclic; [`add_child`](ValidationResultsModel::add_child)
//!    refuses a model that already reaches its parent.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bindery_core::reactive::{ListenerList, Subscription};
use tracing::trace;

use crate::message::{Severity, ValidationMessage};

/// Payload delivered to model subscribers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultsChanged {
    /// Messages in the model (children included) after the change.
    pub message_count: usize,
}

/// Observable, nestable collection of validation messages.
pub struct ValidationResultsModel {
    entries: RefCell<Vec<ValidationMessage>>,
    children: RefCell<Vec<(Rc<ValidationResultsModel>, Subscription)>>,
    listeners: ListenerList<ResultsChanged>,
    weak_self: Weak<Self>,
}

impl std::fmt::Debug for ValidationResultsModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationResultsModel")
            .field("messages", &self.entries.borrow().len())
            .field("children", &self.children.borrow().len())
            .finish()
    }
}

impl ValidationResultsModel {
    #[must_use]
    pub fn new() -> Rc<Self> {
        Rc::new_cyclic(|weak: &Weak<Self>| Self {
            entries: RefCell::new(Vec::new()),
            children: RefCell::new(Vec::new()),
            listeners: ListenerList::new(),
            weak_self: weak.clone(),
        })
    }

    /// Observe changes to this model or any descendant.
    pub fn subscribe(&self, listener: impl Fn(&ResultsChanged) + 'static) -> Subscription {
        self.listeners.subscribe(listener)
    }

    pub fn add_message(&self, message: ValidationMessage) {
        trace!(property = %message.property, severity = %message.severity, "message added");
        self.entries.borrow_mut().push(message);
        self.notify();
    }

    /// Add several messages with a single notification.
    pub fn add_messages(&self, messages: impl IntoIterator<Item = ValidationMessage>) {
        let added = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.extend(messages);
            entries.len() - before
        };
        if added > 0 {
            self.notify();
        }
    }

    /// Remove the first own message equal to `message`.
    pub fn remove_message(&self, message: &ValidationMessage) -> bool {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            match entries.iter().position(|m| m == message) {
                Some(index) => {
                    entries.remove(index);
                    true
                }
                None => false,
            }
        };
        if removed {
            self.notify();
        }
        removed
    }

    /// Remove every own message for `property`; returns how many went.
    pub fn clear_property(&self, property: &str) -> usize {
        let removed = {
            let mut entries = self.entries.borrow_mut();
            let before = entries.len();
            entries.retain(|m| m.property != property);
            before - entries.len()
        };
        if removed > 0 {
            self.notify();
        }
        removed
    }

    /// Swap the own messages for `property` with `messages` in one change.
    pub fn replace_messages_for(
        &self,
        property: &str,
        messages: impl IntoIterator<Item = ValidationMessage>,
    ) {
        let changed = {
            let mut entries = self.entries.borrow_mut();
            let old: Vec<ValidationMessage> = entries
                .iter()
                .filter(|m| m.property == property)
                .cloned()
                .collect();
            let new: Vec<ValidationMessage> = messages
                .into_iter()
                .map(|mut m| {
                    m.property = property.to_string();
                    m
                })
                .collect();
            if old == new {
                false
            } else {
                entries.retain(|m| m.property != property);
                entries.extend(new);
                true
            }
        };
        if changed {
            self.notify();
        }
    }

    /// Remove every own message. Children are untouched.
    pub fn clear(&self) {
        let had_any = {
            let mut entries = self.entries.borrow_mut();
            let had_any = !entries.is_empty();
            entries.clear();
            had_any
        };
        if had_any {
            self.notify();
        }
    }

    /// Own messages followed by each child's, depth first.
    #[must_use]
    pub fn messages(&self) -> Vec<ValidationMessage> {
        let mut all = self.entries.borrow().clone();
        for (child, _) in self.children.borrow().iter() {
            all.extend(child.messages());
        }
        all
    }

    #[must_use]
    pub fn messages_for(&self, property: &str) -> Vec<ValidationMessage> {
        self.messages()
            .into_iter()
            .filter(|m| m.property == property)
            .collect()
    }

    #[must_use]
    pub fn message_count(&self) -> usize {
        let own = self.entries.borrow().len();
        own + self
            .children
            .borrow()
            .iter()
            .map(|(child, _)| child.message_count())
            .sum::<usize>()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.message_count() == 0
    }

    /// Number of messages with exactly `severity`.
    #[must_use]
    pub fn count(&self, severity: Severity) -> usize {
        self.messages()
            .iter()
            .filter(|m| m.severity == severity)
            .count()
    }

    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.count(Severity::Error) > 0
    }

    #[must_use]
    pub fn max_severity(&self) -> Option<Severity> {
        self.messages().iter().map(|m| m.severity).max()
    }

    /// Attach `child`. Returns `false` (and changes nothing) when the child
    /// is already attached, is this model, or would close a cycle.
    pub fn add_child(&self, child: &Rc<Self>) -> bool {
        if child.reaches(self) || self.has_child(child) {
            return false;
        }
        let parent = self.weak_self.clone();
        let sub = child.subscribe(move |_| {
            if let Some(parent) = parent.upgrade() {
                parent.notify();
            }
        });
        let had_messages = !child.is_empty();
        self.children.borrow_mut().push((Rc::clone(child), sub));
        if had_messages {
            self.notify();
        }
        true
    }

    /// Detach `child`. Returns whether it was attached.
    pub fn remove_child(&self, child: &Rc<Self>) -> bool {
        let removed = {
            let mut children = self.children.borrow_mut();
            children
                .iter()
                .position(|(c, _)| Rc::ptr_eq(c, child))
                .map(|index| children.remove(index))
        };
        match removed {
            Some((child, sub)) => {
                drop(sub);
                if !child.is_empty() {
                    self.notify();
                }
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn child_count(&self) -> usize {
        self.children.borrow().len()
    }

    fn has_child(&self, child: &Rc<Self>) -> bool {
        self.children
            .borrow()
            .iter()
            .any(|(c, _)| Rc::ptr_eq(c, child))
    }

    fn reaches(&self, target: &Self) -> bool {
        std::ptr::eq(self, target)
            || self
                .children
                .borrow()
                .iter()
                .any(|(c, _)| c.reaches(target))
    }

    fn notify(&self) {
        let event = ResultsChanged {
            message_count: self.message_count(),
        };
        self.listeners.notify(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn msg(property: &str, severity: Severity, ts: u64) -> ValidationMessage {
        ValidationMessage::at(property, severity, format!("{property}@{ts}"), ts)
    }

    fn counter(model: &ValidationResultsModel) -> (Rc<Cell<u32>>, Subscription) {
        let count = Rc::new(Cell::new(0));
        let count_clone = Rc::clone(&count);
        let sub = model.subscribe(move |_| count_clone.set(count_clone.get() + 1));
        (count, sub)
    }

    #[test]
    fn add_remove_and_queries() {
        let model = ValidationResultsModel::new();
        let (fired, _sub) = counter(&model);
        let error = msg("age", Severity::Error, 1);
        model.add_message(error.clone());
        model.add_message(msg("name", Severity::Warning, 2));

        assert_eq!(model.message_count(), 2);
        assert!(model.has_errors());
        assert_eq!(model.max_severity(), Some(Severity::Error));
        assert_eq!(model.messages_for("age"), vec![error.clone()]);
        assert_eq!(model.count(Severity::Warning), 1);

        assert!(model.remove_message(&error));
        assert!(!model.remove_message(&error));
        assert!(!model.has_errors());
        assert_eq!(fired.get(), 3);
    }

    #[test]
    fn clear_property_and_clear() {
        let model = ValidationResultsModel::new();
        model.add_messages([
            msg("a", Severity::Info, 1),
            msg("a", Severity::Error, 2),
            msg("b", Severity::Warning, 3),
        ]);
        let (fired, _sub) = counter(&model);

        assert_eq!(model.clear_property("a"), 2);
        assert_eq!(model.clear_property("a"), 0);
        model.clear();
        model.clear();
        assert!(model.is_empty());
        assert_eq!(model.max_severity(), None);
        assert_eq!(fired.get(), 2);
    }

    #[test]
    fn replace_messages_for_is_one_change() {
        let model = ValidationResultsModel::new();
        model.add_message(msg("a", Severity::Error, 1));
        model.add_message(msg("b", Severity::Info, 2));
        let (fired, _sub) = counter(&model);

        model.replace_messages_for("a", [msg("other", Severity::Warning, 3)]);
        assert_eq!(fired.get(), 1);
        let a = model.messages_for("a");
        assert_eq!(a.len(), 1);
        assert_eq!(a[0].severity, Severity::Warning);

        model.replace_messages_for("a", a.clone());
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn children_aggregate_and_forward_changes() {
        let parent = ValidationResultsModel::new();
        let child = ValidationResultsModel::new();
        parent.add_message(msg("p", Severity::Info, 1));
        let (fired, _sub) = counter(&parent);

        assert!(parent.add_child(&child));
        assert_eq!(fired.get(), 0);
        child.add_message(msg("c", Severity::Error, 2));
        assert_eq!(fired.get(), 1);
        assert!(parent.has_errors());
        assert_eq!(parent.message_count(), 2);
        assert_eq!(parent.messages()[1].property, "c");

        assert!(parent.remove_child(&child));
        assert_eq!(fired.get(), 2);
        child.add_message(msg("c", Severity::Error, 3));
        assert_eq!(fired.get(), 2);
        assert!(!parent.has_errors());
    }

    #[test]
    fn cycles_and_duplicates_are_refused() {
        let a = ValidationResultsModel::new();
        let b = ValidationResultsModel::new();
        assert!(!a.add_child(&a));
        assert!(a.add_child(&b));
        assert!(!a.add_child(&b));
        assert!(!b.add_child(&a));
        assert_eq!(a.child_count(), 1);
        assert_eq!(b.child_count(), 0);
    }

    #[test]
    fn dropped_parent_releases_child_subscription() {
        let child = ValidationResultsModel::new();
        {
            let parent = ValidationResultsModel::new();
            parent.add_child(&child);
            assert_eq!(child.listeners.len(), 1);
        }
        assert_eq!(child.listeners.len(), 0);
    }
}
