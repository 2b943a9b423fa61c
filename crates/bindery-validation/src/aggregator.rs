#![forbid(unsafe_code)]

//! Active-message aggregation.
//!
//! The active message is the one a form shows in its message area: the
//! highest severity present, ties broken by the most recent timestamp and
//! then by the later position in the model.
//!
//! | Messages present                    | Active              |
//! |-------------------------------------|---------------------|
//! | none                                | `None`              |
//! | `Error@1`, `Warning@2`              | `Error@1`           |
//! | `Warning@1`, `Warning@3`            | `Warning@3`         |
//! | `Info@5`, `Info@5` (same timestamp) | the later-added one |
//!
//! The aggregator republishes only when the active message actually
//! changes (field-wise), so sinks are not spammed with repeats.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use bindery_core::reactive::{ListenerList, Subscription};
use tracing::debug;

use crate::message::ValidationMessage;
use crate::results::ValidationResultsModel;

/// Receives the active message (`None` once no message is left).
pub trait MessageSink {
    fn set_message(&self, message: Option<&ValidationMessage>);
}

impl<F: Fn(Option<&ValidationMessage>)> MessageSink for F {
    fn set_message(&self, message: Option<&ValidationMessage>) {
        self(message);
    }
}

/// The most relevant message in `messages`, if any.
#[must_use]
pub fn select_active(messages: &[ValidationMessage]) -> Option<&ValidationMessage> {
    messages
        .iter()
        .enumerate()
        .max_by(|(ia, a), (ib, b)| {
            a.severity
                .cmp(&b.severity)
                .then(a.timestamp.cmp(&b.timestamp))
                .then(ia.cmp(ib))
        })
        .map(|(_, message)| message)
}

/// Derives the active message of a results model and republishes it.
pub struct ValidationResultsAggregator {
    model: Rc<ValidationResultsModel>,
    active: RefCell<Option<ValidationMessage>>,
    sink: RefCell<Option<Rc<dyn MessageSink>>>,
    listeners: ListenerList<Option<ValidationMessage>>,
    _model_sub: Subscription,
}

impl std::fmt::Debug for ValidationResultsAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ValidationResultsAggregator")
            .field("active", &*self.active.borrow())
            .field("has_sink", &self.sink.borrow().is_some())
            .finish()
    }
}

impl ValidationResultsAggregator {
    /// Observe `model`. The active message is computed immediately.
    #[must_use]
    pub fn new(model: Rc<ValidationResultsModel>) -> Rc<Self> {
        let active = select_active(&model.messages()).cloned();
        Rc::new_cyclic(|weak: &Weak<Self>| {
            let weak = weak.clone();
            let model_sub = model.subscribe(move |_| {
                if let Some(aggregator) = weak.upgrade() {
                    aggregator.on_messages_changed();
                }
            });
            Self {
                model,
                active: RefCell::new(active),
                sink: RefCell::new(None),
                listeners: ListenerList::new(),
                _model_sub: model_sub,
            }
        })
    }

    /// Observe `model` and publish to `sink`, starting with the current
    /// active message.
    #[must_use]
    pub fn with_sink(model: Rc<ValidationResultsModel>, sink: Rc<dyn MessageSink>) -> Rc<Self> {
        let aggregator = Self::new(model);
        aggregator.set_sink(Some(sink));
        aggregator
    }

    /// Replace the sink. A new sink immediately receives the current active
    /// message.
    pub fn set_sink(&self, sink: Option<Rc<dyn MessageSink>>) {
        self.sink.replace(sink.clone());
        if let Some(sink) = sink {
            let active = self.active_message();
            sink.set_message(active.as_ref());
        }
    }

    #[must_use]
    pub fn model(&self) -> &Rc<ValidationResultsModel> {
        &self.model
    }

    #[must_use]
    pub fn active_message(&self) -> Option<ValidationMessage> {
        self.active.borrow().clone()
    }

    /// Observe changes of the active message.
    pub fn subscribe_active(
        &self,
        listener: impl Fn(Option<&ValidationMessage>) + 'static,
    ) -> Subscription {
        self.listeners
            .subscribe(move |active: &Option<ValidationMessage>| listener(active.as_ref()))
    }

    /// Recompute the active message and republish it if it changed.
    ///
    /// Called automatically when the model changes.
    pub fn on_messages_changed(&self) {
        let next = select_active(&self.model.messages()).cloned();
        {
            let mut active = self.active.borrow_mut();
            if *active == next {
                return;
            }
            active.clone_from(&next);
        }
        match &next {
            Some(message) => debug!(
                property = %message.property,
                severity = %message.severity,
                "active message changed"
            ),
            None => debug!("active message cleared"),
        }

        let sink = self.sink.borrow().clone();
        if let Some(sink) = sink {
            sink.set_message(next.as_ref());
        }
        self.listeners.notify(&next);
    }
}
