#![forbid(unsafe_code)]

//! Accessor-map domain object.
//!
//! [`Bean`] is the ready-made [`DomainObject`]: a named set of properties,
//! each with an access mode, a declared [`ValueKind`] and an optional
//! normalizer applied on write. Built with [`BeanBuilder`].
//!
//! ```
//! use bindery_core::domain::{Bean, DomainObject};
//! use bindery_core::value::{Value, ValueKind};
//!
//! let person = Bean::builder("Person")
//!     .property("name", "Ada")
//!     .read_only("id", 7)
//!     .typed("age", ValueKind::Int, 36)
//!     .publishing()
//!     .build();
//!
//! person.set("name", Value::from("Grace")).unwrap();
//! assert_eq!(person.get("name").unwrap(), Value::from("Grace"));
//! assert!(person.set("id", Value::from(8)).is_err());
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use super::{ChangePublisher, ChangeSupport, DomainObject, PropertyDescriptor};
use crate::error::PropertyAccessError;
use crate::value::{Value, ValueKind};

type Normalizer = Rc<dyn Fn(Value) -> Value>;

/// Access mode of a bean property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Access {
    #[default]
    ReadWrite,
    ReadOnly,
    WriteOnly,
}

impl Access {
    #[must_use]
    pub const fn readable(self) -> bool {
        matches!(self, Self::ReadWrite | Self::ReadOnly)
    }

    #[must_use]
    pub const fn writable(self) -> bool {
        matches!(self, Self::ReadWrite | Self::WriteOnly)
    }
}

struct Slot {
    value: Value,
    access: Access,
    kind: ValueKind,
    normalizer: Option<Normalizer>,
}

/// A domain object backed by an explicit property map.
pub struct Bean {
    type_name: String,
    slots: RefCell<BTreeMap<String, Slot>>,
    changes: Option<ChangeSupport>,
}

impl Bean {
    /// Start declaring a bean of the given type name.
    #[must_use]
    pub fn builder(type_name: impl Into<String>) -> BeanBuilder {
        BeanBuilder {
            type_name: type_name.into(),
            slots: BTreeMap::new(),
            publishing: false,
        }
    }

    /// Current stored value, ignoring the access mode.
    ///
    /// Intended for the object's owner (and tests); bindings go through
    /// [`DomainObject::get`].
    #[must_use]
    pub fn peek(&self, property: &str) -> Option<Value> {
        self.slots.borrow().get(property).map(|s| s.value.clone())
    }

    /// Owner-side write that bypasses the access mode but still type-checks,
    /// normalizes and publishes. Use it to update read-only properties from
    /// domain logic.
    pub fn put(&self, property: &str, value: impl Into<Value>) -> Result<(), PropertyAccessError> {
        self.store(property, value.into(), false)
    }

    /// Whether this bean publishes property changes.
    #[must_use]
    pub fn is_publishing(&self) -> bool {
        self.changes.is_some()
    }

    fn store(
        &self,
        property: &str,
        value: Value,
        enforce_access: bool,
    ) -> Result<(), PropertyAccessError> {
        let normalizer = {
            let slots = self.slots.borrow();
            let slot = slots.get(property).ok_or_else(|| self.no_such(property))?;
            if enforce_access && !slot.access.writable() {
                return Err(PropertyAccessError::NotWritable {
                    property: property.to_string(),
                });
            }
            if !slot.kind.accepts(&value) {
                return Err(PropertyAccessError::TypeMismatch {
                    property: property.to_string(),
                    expected: slot.kind,
                    found: value.kind(),
                });
            }
            slot.normalizer.clone()
        };

        // Normalizers may read the bean, so no borrow is held here.
        let value = match normalizer {
            Some(normalize) => normalize(value),
            None => value,
        };
        let (old, new) = {
            let mut slots = self.slots.borrow_mut();
            let slot = slots
                .get_mut(property)
                .ok_or_else(|| self.no_such(property))?;
            let old = std::mem::replace(&mut slot.value, value.clone());
            (old, value)
        };

        if let Some(changes) = &self.changes {
            if old != new {
                changes.fire(property, old, new);
            }
        }
        Ok(())
    }

    fn no_such(&self, property: &str) -> PropertyAccessError {
        PropertyAccessError::NoSuchProperty {
            type_name: self.type_name.clone(),
            property: property.to_string(),
        }
    }
}

impl DomainObject for Bean {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn property_names(&self) -> Vec<String> {
        self.slots.borrow().keys().cloned().collect()
    }

    fn describe(&self, property: &str) -> Option<PropertyDescriptor> {
        self.slots.borrow().get(property).map(|s| PropertyDescriptor {
            readable: s.access.readable(),
            writable: s.access.writable(),
            kind: s.kind,
        })
    }

    fn get(&self, property: &str) -> Result<Value, PropertyAccessError> {
        let slots = self.slots.borrow();
        let slot = slots.get(property).ok_or_else(|| self.no_such(property))?;
        if !slot.access.readable() {
            return Err(PropertyAccessError::NotReadable {
                property: property.to_string(),
            });
        }
        Ok(slot.value.clone())
    }

    fn set(&self, property: &str, value: Value) -> Result<(), PropertyAccessError> {
        self.store(property, value, true)
    }

    fn publisher(&self) -> Option<&dyn ChangePublisher> {
        self.changes.as_ref().map(|c| c as &dyn ChangePublisher)
    }
}

impl std::fmt::Debug for Bean {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let slots = self.slots.borrow();
        let mut dbg = f.debug_struct(&self.type_name);
        for (name, slot) in slots.iter() {
            dbg.field(name, &slot.value);
        }
        dbg.finish()
    }
}

/// Builder for [`Bean`].
#[must_use]
pub struct BeanBuilder {
    type_name: String,
    slots: BTreeMap<String, Slot>,
    publishing: bool,
}

impl BeanBuilder {
    /// Declare a property with full control over access and kind.
    pub fn declare(
        mut self,
        name: impl Into<String>,
        access: Access,
        kind: ValueKind,
        initial: impl Into<Value>,
    ) -> Self {
        self.slots.insert(
            name.into(),
            Slot {
                value: initial.into(),
                access,
                kind,
                normalizer: None,
            },
        );
        self
    }

    /// Read-write property accepting any value.
    pub fn property(self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.declare(name, Access::ReadWrite, ValueKind::Any, initial)
    }

    /// Read-write property with a declared kind.
    pub fn typed(self, name: impl Into<String>, kind: ValueKind, initial: impl Into<Value>) -> Self {
        self.declare(name, Access::ReadWrite, kind, initial)
    }

    /// Property without a writer.
    pub fn read_only(self, name: impl Into<String>, initial: impl Into<Value>) -> Self {
        self.declare(name, Access::ReadOnly, ValueKind::Any, initial)
    }

    /// Property without a reader.
    pub fn write_only(self, name: impl Into<String>) -> Self {
        self.declare(name, Access::WriteOnly, ValueKind::Any, Value::Null)
    }

    /// Read-write property whose setter transforms every written value.
    pub fn normalized(
        mut self,
        name: impl Into<String>,
        initial: impl Into<Value>,
        normalize: impl Fn(Value) -> Value + 'static,
    ) -> Self {
        let normalize: Normalizer = Rc::new(normalize);
        let initial = normalize(initial.into());
        self.slots.insert(
            name.into(),
            Slot {
                value: initial,
                access: Access::ReadWrite,
                kind: ValueKind::Any,
                normalizer: Some(normalize),
            },
        );
        self
    }

    /// Make the bean publish property changes.
    pub fn publishing(mut self) -> Self {
        self.publishing = true;
        self
    }

    #[must_use]
    pub fn build(self) -> Rc<Bean> {
        Rc::new(Bean {
            type_name: self.type_name,
            slots: RefCell::new(self.slots),
            changes: self.publishing.then(ChangeSupport::new),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::PropertyChange;
    use std::cell::Cell;
    use std::rc::Weak;

    #[test]
    fn read_write_round() {
        let bean = Bean::builder("Person").property("name", "Ada").build();
        assert_eq!(bean.get("name").unwrap(), Value::from("Ada"));
        bean.set("name", Value::from("Grace")).unwrap();
        assert_eq!(bean.peek("name"), Some(Value::from("Grace")));
    }

    #[test]
    fn unknown_property_is_reported_with_type() {
        let bean = Bean::builder("Person").build();
        let err = bean.get("nope").unwrap_err();
        assert_eq!(
            err,
            PropertyAccessError::NoSuchProperty {
                type_name: "Person".into(),
                property: "nope".into()
            }
        );
        assert!(bean.describe("nope").is_none());
    }

    #[test]
    fn access_modes_are_enforced() {
        let bean = Bean::builder("Account")
            .read_only("id", 1)
            .write_only("password")
            .build();
        assert!(matches!(
            bean.set("id", Value::from(2)),
            Err(PropertyAccessError::NotWritable { .. })
        ));
        assert!(matches!(
            bean.get("password"),
            Err(PropertyAccessError::NotReadable { .. })
        ));
        bean.set("password", Value::from("s3cret")).unwrap();
        assert_eq!(bean.peek("password"), Some(Value::from("s3cret")));

        // Owner-side writes bypass the access mode.
        bean.put("id", 2).unwrap();
        assert_eq!(bean.get("id").unwrap(), Value::from(2));
    }

    #[test]
    fn declared_kind_is_checked() {
        let bean = Bean::builder("Person")
            .typed("age", ValueKind::Int, 30)
            .build();
        assert!(matches!(
            bean.set("age", Value::from("thirty")),
            Err(PropertyAccessError::TypeMismatch {
                expected: ValueKind::Int,
                found: ValueKind::Text,
                ..
            })
        ));
        bean.set("age", Value::Null).unwrap();
        assert_eq!(bean.peek("age"), Some(Value::Null));
    }

    #[test]
    fn normalizer_applies_to_initial_and_written_values() {
        let bean = Bean::builder("Person")
            .normalized("code", " ab ", |v| match v.as_str() {
                Some(s) => Value::from(s.trim().to_uppercase()),
                None => v,
            })
            .build();
        assert_eq!(bean.peek("code"), Some(Value::from("AB")));
        bean.set("code", Value::from("  xy")).unwrap();
        assert_eq!(bean.get("code").unwrap(), Value::from("XY"));
    }

    #[test]
    fn normalizer_may_read_its_own_bean() {
        let this: Rc<RefCell<Weak<Bean>>> = Rc::new(RefCell::new(Weak::new()));
        let this_clone = Rc::clone(&this);
        let bean = Bean::builder("Range")
            .property("min", 10)
            .normalized("value", 0, move |v| {
                let min = this_clone
                    .borrow()
                    .upgrade()
                    .and_then(|bean| bean.peek("min"))
                    .and_then(|m| m.as_int());
                match (v.as_int(), min) {
                    (Some(n), Some(min)) if n < min => Value::from(min),
                    _ => v,
                }
            })
            .build();
        *this.borrow_mut() = Rc::downgrade(&bean);

        bean.set("value", Value::from(3)).unwrap();
        assert_eq!(bean.peek("value"), Some(Value::from(10)));
        bean.set("value", Value::from(42)).unwrap();
        assert_eq!(bean.peek("value"), Some(Value::from(42)));
    }

    #[test]
    fn publishing_bean_fires_only_on_change() {
        let bean = Bean::builder("Person")
            .property("name", "a")
            .publishing()
            .build();
        let fired = Rc::new(Cell::new(0u32));
        let fired_clone = Rc::clone(&fired);
        let publisher = bean.publisher().expect("publishing bean");
        publisher.add_listener(
            "name",
            Rc::new(move |c: &PropertyChange| {
                assert_eq!(c.old, Value::from("a"));
                fired_clone.set(fired_clone.get() + 1);
            }),
        );

        bean.set("name", Value::from("b")).unwrap();
        bean.set("name", Value::from("b")).unwrap();
        assert_eq!(fired.get(), 1);
    }

    #[test]
    fn listener_can_read_bean_during_notification() {
        let bean = Bean::builder("Person")
            .property("name", "a")
            .publishing()
            .build();
        let weak = Rc::downgrade(&bean);
        let observed = Rc::new(RefCell::new(Value::Null));
        let observed_clone = Rc::clone(&observed);
        bean.publisher().unwrap().add_listener(
            "name",
            Rc::new(move |_: &PropertyChange| {
                if let Some(b) = weak.upgrade() {
                    *observed_clone.borrow_mut() = b.get("name").unwrap();
                }
            }),
        );
        bean.set("name", Value::from("z")).unwrap();
        assert_eq!(*observed.borrow(), Value::from("z"));
    }

    #[test]
    fn plain_bean_has_no_publisher() {
        let bean = Bean::builder("Plain").property("x", 1).build();
        assert!(bean.publisher().is_none());
        assert!(!bean.is_publishing());
        assert_eq!(bean.property_names(), vec!["x".to_string()]);
    }
}
