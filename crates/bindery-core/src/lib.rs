#![forbid(unsafe_code)]

//! Core: observable values, property-path binding, and buffered commit.
//!
//! # Role in bindery
//! `bindery-core` is the engine a form layer binds its controls to. It turns
//! a domain object graph into observable cells addressed by property paths
//! and layers deferred commit on top. Validation feedback lives in
//! `bindery-validation`.
//!
//! # Primary responsibilities
//! - **Values**: [`value::Value`], a tagged dynamic value with shared
//!   copy-on-write containers.
//! - **Domain objects**: the [`domain::DomainObject`] accessor-map
//!   capability, optional change publication, and the ready-made
//!   [`domain::Bean`].
//! - **Cells**: the [`reactive::ValueCell`] contract, in-memory holders,
//!   converting views, and pluggable change detection.
//! - **Access**: [`access::PropertyAccessStrategy`] resolving paths such as
//!   `address.city` or `items[1]` into shared, cached cells.
//! - **Buffering**: [`buffer::BufferedValueCell`] and the
//!   [`buffer::CommitTrigger`] that flushes or discards buffers together.
//!
//! # Threading
//! Everything is single-threaded (`Rc`, `RefCell`). Notifications are
//! delivered synchronously and listeners may call back into the engine.
//!
//! # Logging
//! The crate emits `tracing` events (`debug` for lifecycle, `trace` for
//! per-write detail). With the `tracing-json` feature, [`logging`] can
//! install a JSON subscriber.

pub mod access;
pub mod buffer;
pub mod domain;
pub mod error;
pub mod reactive;
pub mod value;

#[cfg(feature = "tracing-json")]
pub mod logging;

pub use access::{AccessConfig, NullHandling, PropertyAccessStrategy, PropertyPath};
pub use buffer::{BufferedValueCell, CommitTrigger};
pub use domain::{Bean, DomainObject};
pub use error::{BindingError, CommitError, PropertyAccessError};
pub use reactive::{ValueCell, ValueCellExt, ValueHolder};
pub use value::{Value, ValueKind};
