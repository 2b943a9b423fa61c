#![forbid(unsafe_code)]

//! Observable value cells.
//!
//! - [`ValueCell`]: the get/set/subscribe contract every cell implements.
//! - [`ValueHolder`]: plain in-memory cell with version tracking.
//! - [`ChangeDetector`]: equality policy injected into cells.
//! - [`ConvertingValueCell`]: a converting view over another cell.
//! - [`ListenerList`] / [`Subscription`]: weakly held callbacks with RAII
//!   unsubscription.
//!
//! # Architecture
//!
//! Cells use `Rc<RefCell<..>>`-style interior state for single-threaded
//! shared ownership. Subscribers are stored as `Weak` callbacks and pruned
//! lazily during notification.
//!
//! # Invariants
//!
//! 1. A write judged a change by the cell's detector notifies exactly once.
//! 2. Subscribers are notified in registration order.
//! 3. No interior borrow is held while listeners run; listeners may re-enter.
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.

pub mod cell;
pub mod converting;
pub mod detector;
pub mod holder;
pub mod listeners;

pub use cell::{SharedCell, ValueCell, ValueCellExt, ValueChange, same_cell};
pub use converting::ConvertingValueCell;
pub use detector::{
    ChangeDetector, EqualityChangeDetector, IdentityChangeDetector, default_detector,
};
pub use holder::ValueHolder;
pub use listeners::{ListenerList, Subscription};
