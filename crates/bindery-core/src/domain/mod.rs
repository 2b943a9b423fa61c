#![forbid(unsafe_code)]

//! Domain-object capability.
//!
//! The engine never inspects a domain object's shape at runtime. Instead an
//! object exposes an explicit accessor map through [`DomainObject`]:
//! descriptors, getters and setters keyed by property name. Objects that can
//! announce their own property changes additionally expose a
//! [`ChangePublisher`]; access strategies subscribe to it directly instead of
//! relying only on their own writes.
//!
//! Objects are shared between cells, so setters take `&self` and
//! implementations use interior mutability.

mod bean;
mod support;

pub use bean::{Access, Bean, BeanBuilder};
pub use support::ChangeSupport;

use std::rc::Rc;

use crate::error::PropertyAccessError;
use crate::value::{Value, ValueKind};

/// Static facts about one property of a domain object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyDescriptor {
    pub readable: bool,
    pub writable: bool,
    pub kind: ValueKind,
}

impl PropertyDescriptor {
    #[must_use]
    pub const fn read_write(kind: ValueKind) -> Self {
        Self {
            readable: true,
            writable: true,
            kind,
        }
    }
}

/// A named-property accessor map over some domain object.
pub trait DomainObject {
    /// Name used in diagnostics (`Person`, `Address`, ...).
    fn type_name(&self) -> &str;

    /// Names of all declared properties.
    fn property_names(&self) -> Vec<String>;

    /// Descriptor for `property`, or `None` when it does not exist.
    fn describe(&self, property: &str) -> Option<PropertyDescriptor>;

    /// Read `property`.
    fn get(&self, property: &str) -> Result<Value, PropertyAccessError>;

    /// Write `property`. The object may normalize the value before storing
    /// it, so a subsequent `get` can differ from what was written.
    fn set(&self, property: &str, value: Value) -> Result<(), PropertyAccessError>;

    /// Change publication capability, if the object has one.
    fn publisher(&self) -> Option<&dyn ChangePublisher> {
        None
    }
}

/// A property change announced by a publishing domain object.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyChange {
    pub property: String,
    pub old: Value,
    pub new: Value,
}

/// Callback registered with a [`ChangePublisher`].
pub type PropertyListener = Rc<dyn Fn(&PropertyChange)>;

/// Handle returned by [`ChangePublisher::add_listener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

/// Explicit subscribe/unsubscribe change publication.
///
/// Listeners are held strongly until removed; the subscriber owns the
/// [`ListenerId`] and is responsible for removing it.
pub trait ChangePublisher {
    fn add_listener(&self, property: &str, listener: PropertyListener) -> ListenerId;

    /// Returns `false` when `id` was not registered for `property`.
    fn remove_listener(&self, property: &str, id: ListenerId) -> bool;

    fn listener_count(&self, property: &str) -> usize;
}
