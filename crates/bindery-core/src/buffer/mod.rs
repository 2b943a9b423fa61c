#![forbid(unsafe_code)]

//! Deferred commit: buffered cells and the trigger that flushes them.
//!
//! ```
//! use std::rc::Rc;
//! use bindery_core::buffer::{BufferedValueCell, CommitTrigger};
//! use bindery_core::reactive::{ValueCellExt, ValueHolder};
//! use bindery_core::value::Value;
//!
//! let model = Rc::new(ValueHolder::new("draft"));
//! let trigger = CommitTrigger::new();
//! let buffer = BufferedValueCell::new(model.clone(), Some(trigger.clone()));
//!
//! buffer.set("final").unwrap();
//! assert_eq!(model.get(), Value::from("draft"));
//!
//! trigger.commit().unwrap();
//! assert_eq!(model.get(), Value::from("final"));
//! assert!(!buffer.is_buffering());
//! ```

pub mod buffered;
pub mod trigger;

pub use buffered::BufferedValueCell;
pub use trigger::{CommitTrigger, TriggerEvent};
