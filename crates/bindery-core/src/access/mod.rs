#![forbid(unsafe_code)]

//! Property-path access over domain objects.
//!
//! - [`PropertyPath`]: parsed, canonical path (`a.b[0].c`, `m[key]`).
//! - [`PropertyAccessStrategy`]: resolves paths into cached
//!   [`PropertyCell`]s and hands out child strategies.
//! - [`AccessConfig`]: null handling and list growth.
//!
//! # Invariants
//!
//! 1. Two requests for the same canonical path return the same cell
//!    (`Rc::ptr_eq`), whichever strategy in the tree they go through.
//! 2. A cell keeps at most one listener registered on a domain object.
//! 3. Replacing an intermediate object re-resolves every downstream cell;
//!    a cell whose value did not change does not notify.
//! 4. Errors carry the full requested path.

pub mod cell;
pub mod config;
pub mod metadata;
pub mod path;
pub mod strategy;

pub use cell::{MAX_LIST_PADDING, PropertyCell, ROOT_SEGMENT};
pub use config::{AccessConfig, NullHandling};
pub use metadata::PropertyMetadata;
pub use path::{PathSegment, PropertyPath};
pub use strategy::PropertyAccessStrategy;
