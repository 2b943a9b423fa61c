#![forbid(unsafe_code)]

//! Validation feedback for bindery forms.
//!
//! # Role in bindery
//! Validators are external: they inspect the domain object (or the buffered
//! values bound to it) and deposit [`ValidationMessage`]s into a
//! [`ValidationResultsModel`]. A [`ValidationResultsAggregator`] watches the
//! model and publishes the single most relevant message to a
//! [`MessageSink`], typically a form's message area.
//!
//! # Example
//! ```
//! use std::cell::RefCell;
//! use std::rc::Rc;
//! use bindery_validation::{
//!     MessageSink, Severity, ValidationMessage, ValidationResultsAggregator,
//!     ValidationResultsModel,
//! };
//!
//! let model = ValidationResultsModel::new();
//! let shown = Rc::new(RefCell::new(None));
//! let shown_clone = Rc::clone(&shown);
//! let sink: Rc<dyn MessageSink> = Rc::new(move |m: Option<&ValidationMessage>| {
//!     *shown_clone.borrow_mut() = m.map(|m| m.text.clone());
//! });
//! let _aggregator = ValidationResultsAggregator::with_sink(model.clone(), sink);
//!
//! model.add_message(ValidationMessage::at("age", Severity::Error, "too young", 1));
//! assert_eq!(shown.borrow().as_deref(), Some("too young"));
//! model.clear();
//! assert_eq!(*shown.borrow(), None);
//! ```

pub mod aggregator;
pub mod message;
pub mod results;

pub use aggregator::{MessageSink, ValidationResultsAggregator, select_active};
pub use message::{Severity, ValidationMessage};
pub use results::{ResultsChanged, ValidationResultsModel};
