#![forbid(unsafe_code)]

//! Path-bound value cells.
//!
//! # Design
//!
//! Every [`PropertyCell`] is bound to one segment and listens to the cell
//! for its parent path (or to the root domain-object holder). A chain such
//! as `address.city` is therefore two cells: `address` watching the holder
//! and `city` watching `address`. Replacing any link re-resolves everything
//! downstream.
//!
//! When the container a property cell reads from is a publishing
//! [`DomainObject`](crate::domain::DomainObject), the cell registers exactly
//! one property listener on it. Moving to a different container moves the
//! listener; dropping or detaching the cell removes it.
//!
//! Each cell keeps a snapshot of its last resolved value. Change events are
//! emitted only when the strategy's [`ChangeDetector`] judges the fresh
//! value different from the snapshot, so a write observed both through the
//! object's publisher and through the write path still notifies once.
//!
//! [`ChangeDetector`]: crate::reactive::ChangeDetector

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::rc::{Rc, Weak};

use tracing::trace;

use super::config::NullHandling;
use super::metadata::{PropertyMetadata, StrategyShared};
use super::path::{PathSegment, PropertyPath};
use crate::domain::{ListenerId, PropertyChange};
use crate::error::BindingError;
use crate::reactive::{ListenerList, SharedCell, Subscription, ValueCell, ValueChange};
use crate::value::{ObjectRef, Value, ValueKind};

/// Label used for the domain object itself in null-path errors.
pub const ROOT_SEGMENT: &str = "<root>";

/// Most `Null` slots a single indexed write may pad a list with.
pub const MAX_LIST_PADDING: usize = 4096;

pub(crate) enum Parent {
    Holder(SharedCell),
    Cell(Rc<PropertyCell>),
}

struct PublisherLink {
    object: ObjectRef,
    property: String,
    id: ListenerId,
}

/// A cell reading and writing one property path of a domain object.
pub struct PropertyCell {
    path: PropertyPath,
    display: String,
    segment: PathSegment,
    parent: Parent,
    shared: Rc<StrategyShared>,
    snapshot: RefCell<Value>,
    listeners: ListenerList<ValueChange>,
    parent_sub: RefCell<Option<Subscription>>,
    publisher_link: RefCell<Option<PublisherLink>>,
    detached: Cell<bool>,
    weak_self: Weak<PropertyCell>,
}

impl std::fmt::Debug for PropertyCell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyCell")
            .field("path", &self.display)
            .field("value", &*self.snapshot.borrow())
            .field("listener_count", &self.listeners.len())
            .field("detached", &self.detached.get())
            .finish()
    }
}

impl PropertyCell {
    /// Create a cell for `path` (whose last segment is resolved against
    /// `parent`) and subscribe it to the parent.
    pub(crate) fn attach(
        path: PropertyPath,
        segment: PathSegment,
        parent: Parent,
        shared: Rc<StrategyShared>,
    ) -> Rc<Self> {
        let cell = Rc::new_cyclic(|weak: &Weak<Self>| {
            let upstream = weak.clone();
            let on_parent = move |_: &ValueChange| {
                if let Some(cell) = upstream.upgrade() {
                    cell.on_parent_changed();
                }
            };
            let sub = match &parent {
                Parent::Holder(holder) => holder.subscribe(Box::new(on_parent)),
                Parent::Cell(cell) => cell.listeners.subscribe(on_parent),
            };
            Self {
                display: path.to_string(),
                path,
                segment,
                parent,
                shared,
                snapshot: RefCell::new(Value::Null),
                listeners: ListenerList::new(),
                parent_sub: RefCell::new(Some(sub)),
                publisher_link: RefCell::new(None),
                detached: Cell::new(false),
                weak_self: weak.clone(),
            }
        });
        cell.rebind_publisher();
        let initial = cell.read_quiet();
        *cell.snapshot.borrow_mut() = initial;
        cell
    }

    /// The full path this cell is bound to.
    #[must_use]
    pub fn path(&self) -> &PropertyPath {
        &self.path
    }

    /// Whether the owning strategy has been disposed.
    #[must_use]
    pub fn is_detached(&self) -> bool {
        self.detached.get()
    }

    /// Whether this cell currently listens to a domain object's publisher.
    #[must_use]
    pub fn is_observing_object(&self) -> bool {
        self.publisher_link.borrow().is_some()
    }

    /// Readability, writability and kind of the bound property.
    ///
    /// Property segments ask the current container object; while the
    /// container is null the last metadata seen for this path is returned.
    /// Index and key segments inherit access from their container path.
    pub fn metadata(&self) -> Result<PropertyMetadata, BindingError> {
        match &self.segment {
            PathSegment::Property(name) => match self.container(&self.display) {
                Ok(Value::Object(object)) => match object.describe(name) {
                    Some(descriptor) => {
                        let metadata = PropertyMetadata::from(descriptor);
                        self.shared.record(&self.path, metadata);
                        Ok(metadata)
                    }
                    None => Err(BindingError::invalid_path(
                        &self.display,
                        format!("`{}` has no property `{name}`", object.type_name()),
                    )),
                },
                Ok(Value::Null) => self
                    .shared
                    .cached(&self.path)
                    .ok_or_else(|| self.null_error(&self.display)),
                Ok(other) => Err(self.unresolvable(&self.display, &other)),
                Err(err) => self.shared.cached(&self.path).ok_or(err),
            },
            PathSegment::Index(_) | PathSegment::Key(_) => {
                let (readable, writable) = match &self.parent {
                    Parent::Holder(_) => (true, true),
                    Parent::Cell(parent) => {
                        let up = parent.metadata()?;
                        (up.readable, up.readable && up.writable)
                    }
                };
                let kind = match self.resolve(&self.display) {
                    Ok(value) if !value.is_null() => value.kind(),
                    _ => ValueKind::Any,
                };
                Ok(PropertyMetadata {
                    readable,
                    writable,
                    kind,
                })
            }
        }
    }

    /// Reject property names the current container object does not declare.
    pub(crate) fn check_exists(&self, requested: &str) -> Result<(), BindingError> {
        let PathSegment::Property(name) = &self.segment else {
            return Ok(());
        };
        match self.container_quiet() {
            Some(Value::Object(object)) if object.describe(name).is_none() => {
                Err(BindingError::invalid_path(
                    requested,
                    format!("`{}` has no property `{name}`", object.type_name()),
                ))
            }
            _ => Ok(()),
        }
    }

    /// Stop reacting to the parent and to domain objects.
    pub(crate) fn detach(&self) {
        self.detached.set(true);
        self.unlink_publisher();
        let sub = self.parent_sub.borrow_mut().take();
        drop(sub);
    }

    pub(crate) fn starts_with(&self, prefix: &PropertyPath) -> bool {
        self.path.len() > prefix.len() && self.path.segments()[..prefix.len()] == *prefix.segments()
    }

    fn on_parent_changed(&self) {
        if self.detached.get() {
            return;
        }
        self.rebind_publisher();
        self.refresh();
    }

    /// Re-resolve and notify if the detector sees a change.
    pub(crate) fn refresh(&self) {
        let new = self.read_quiet();
        let old = {
            let mut snapshot = self.snapshot.borrow_mut();
            if !self.shared.detector.has_changed(&snapshot, &new) {
                return;
            }
            std::mem::replace(&mut *snapshot, new.clone())
        };
        trace!(path = %self.display, "property cell changed");
        self.listeners.notify(&ValueChange { old, new });
    }

    fn read_quiet(&self) -> Value {
        self.resolve(&self.display).unwrap_or_default()
    }

    fn container(&self, requested: &str) -> Result<Value, BindingError> {
        match &self.parent {
            Parent::Holder(holder) => holder.get_value(),
            Parent::Cell(parent) => parent.resolve(requested),
        }
    }

    fn container_quiet(&self) -> Option<Value> {
        match &self.parent {
            Parent::Holder(holder) => holder.get_value().ok(),
            Parent::Cell(parent) => parent.resolve(&parent.display).ok(),
        }
    }

    fn null_segment(&self) -> String {
        match &self.parent {
            Parent::Holder(_) => ROOT_SEGMENT.to_string(),
            Parent::Cell(parent) => parent.display.clone(),
        }
    }

    fn null_error(&self, requested: &str) -> BindingError {
        BindingError::NullValueInNestedPath {
            path: requested.to_string(),
            null_segment: self.null_segment(),
        }
    }

    fn unresolvable(&self, requested: &str, container: &Value) -> BindingError {
        let step = match &self.segment {
            PathSegment::Property(name) => format!("property `{name}`"),
            PathSegment::Index(index) => format!("index [{index}]"),
            PathSegment::Key(key) => format!("key [{key}]"),
        };
        BindingError::invalid_property(
            requested,
            format!(
                "cannot resolve {step} on a {} value at `{}`",
                container.kind(),
                self.null_segment()
            ),
        )
    }

    /// Resolve this cell's value; errors name `requested` as the path.
    fn resolve(&self, requested: &str) -> Result<Value, BindingError> {
        let container = self.container(requested)?;
        match (&self.segment, &container) {
            (_, Value::Null) => match self.shared.config.null_handling {
                NullHandling::Lenient => Ok(Value::Null),
                NullHandling::Strict => Err(self.null_error(requested)),
            },
            (PathSegment::Property(name), Value::Object(object)) => {
                if let Some(descriptor) = object.describe(name) {
                    self.shared.record(&self.path, descriptor.into());
                }
                object
                    .get(name)
                    .map_err(|err| BindingError::from_access(requested, err))
            }
            (PathSegment::Index(index), Value::List(_) | Value::Array(_)) => {
                let items = container.as_slice().unwrap_or_default();
                items.get(*index).cloned().ok_or_else(|| {
                    BindingError::invalid_property(
                        requested,
                        format!(
                            "index {index} out of bounds for {} of length {}",
                            container.kind(),
                            items.len()
                        ),
                    )
                })
            }
            (PathSegment::Index(index), Value::Map(map)) => {
                Ok(map.get(&index.to_string()).cloned().unwrap_or_default())
            }
            (PathSegment::Key(key), Value::Map(map)) => {
                Ok(map.get(key).cloned().unwrap_or_default())
            }
            _ => Err(self.unresolvable(requested, &container)),
        }
    }

    /// Write `value` into the container; errors name `requested` as the path.
    fn write(&self, value: Value, requested: &str) -> Result<(), BindingError> {
        let container = self.container(requested)?;
        match (&self.segment, container) {
            (PathSegment::Property(name), Value::Object(object)) => object
                .set(name, value)
                .map_err(|err| BindingError::from_access(requested, err)),
            (PathSegment::Index(index), Value::List(items)) => {
                let mut items = Rc::unwrap_or_clone(items);
                if *index < items.len() {
                    items[*index] = value;
                } else if self.shared.config.grow_lists {
                    pad_to(&mut items, *index, requested)?;
                    items.push(value);
                } else {
                    return Err(BindingError::invalid_path(
                        requested,
                        format!(
                            "index {index} is past the end of a list of length {}",
                            items.len()
                        ),
                    ));
                }
                self.write_container(Value::List(Rc::new(items)), requested)
            }
            (PathSegment::Index(index), Value::Array(items)) => {
                if *index >= items.len() {
                    return Err(BindingError::invalid_path(
                        requested,
                        format!(
                            "index {index} is outside a fixed-size array of length {}",
                            items.len()
                        ),
                    ));
                }
                let mut items = items.to_vec();
                items[*index] = value;
                self.write_container(Value::Array(items.into()), requested)
            }
            (PathSegment::Index(index), Value::Map(map)) => {
                let mut map = Rc::unwrap_or_clone(map);
                map.insert(index.to_string(), value);
                self.write_container(Value::Map(Rc::new(map)), requested)
            }
            (PathSegment::Key(key), Value::Map(map)) => {
                let mut map = Rc::unwrap_or_clone(map);
                map.insert(key.clone(), value);
                self.write_container(Value::Map(Rc::new(map)), requested)
            }
            (PathSegment::Index(index), Value::Null) if self.creates_lists() => {
                let mut items = Vec::new();
                pad_to(&mut items, *index, requested)?;
                items.push(value);
                self.write_container(Value::list(items), requested)
            }
            (PathSegment::Key(key), Value::Null) if self.creates_maps() => {
                let mut map = BTreeMap::new();
                map.insert(key.clone(), value);
                self.write_container(Value::Map(Rc::new(map)), requested)
            }
            (_, Value::Null) => Err(self.null_error(requested)),
            (_, other) => Err(self.unresolvable(requested, &other)),
        }
    }

    fn write_container(&self, container: Value, requested: &str) -> Result<(), BindingError> {
        match &self.parent {
            Parent::Holder(holder) => holder.set_value(container),
            Parent::Cell(parent) => {
                parent.write(container, requested)?;
                parent.refresh();
                Ok(())
            }
        }
    }

    fn parent_declared_kind(&self) -> Option<ValueKind> {
        match &self.parent {
            Parent::Holder(_) => None,
            Parent::Cell(parent) => parent.metadata().ok().map(|m| m.kind),
        }
    }

    fn creates_lists(&self) -> bool {
        self.shared.config.grow_lists && self.parent_declared_kind() == Some(ValueKind::List)
    }

    fn creates_maps(&self) -> bool {
        self.shared.config.grow_lists && self.parent_declared_kind() == Some(ValueKind::Map)
    }

    /// Point the publisher listener at the current container object.
    fn rebind_publisher(&self) {
        let PathSegment::Property(name) = &self.segment else {
            return;
        };
        let target = match self.container_quiet() {
            Some(Value::Object(object)) if object.publisher().is_some() => Some(object),
            _ => None,
        };
        {
            let link = self.publisher_link.borrow();
            match (&*link, &target) {
                (Some(current), Some(next)) if current.object.ptr_eq(next) => return,
                (None, None) => return,
                _ => {}
            }
        }
        self.unlink_publisher();

        let Some(object) = target else {
            return;
        };
        let id = {
            let Some(publisher) = object.publisher() else {
                return;
            };
            let weak = self.weak_self.clone();
            publisher.add_listener(
                name,
                Rc::new(move |_: &PropertyChange| {
                    if let Some(cell) = weak.upgrade() {
                        cell.refresh();
                    }
                }),
            )
        };
        trace!(path = %self.display, object = ?object, "observing domain object");
        *self.publisher_link.borrow_mut() = Some(PublisherLink {
            object,
            property: name.clone(),
            id,
        });
    }

    fn unlink_publisher(&self) {
        let link = self.publisher_link.borrow_mut().take();
        if let Some(link) = link {
            remove_link(&link);
        }
    }
}

fn remove_link(link: &PublisherLink) {
    if let Some(publisher) = link.object.publisher() {
        publisher.remove_listener(&link.property, link.id);
    }
}

impl Drop for PropertyCell {
    fn drop(&mut self) {
        if let Some(link) = self.publisher_link.get_mut().take() {
            remove_link(&link);
        }
    }
}

/// Grow `items` with `Null` up to `index` so the next push lands there.
fn pad_to(items: &mut Vec<Value>, index: usize, requested: &str) -> Result<(), BindingError> {
    let padding = index - items.len();
    if padding > MAX_LIST_PADDING {
        return Err(BindingError::invalid_path(
            requested,
            format!(
                "index {index} would pad a list of length {} by more than {MAX_LIST_PADDING}",
                items.len()
            ),
        ));
    }
    items.try_reserve(padding + 1).map_err(|err| {
        BindingError::invalid_path(requested, format!("cannot grow list to index {index}: {err}"))
    })?;
    items.resize(index, Value::Null);
    Ok(())
}

impl ValueCell for PropertyCell {
    fn get_value(&self) -> Result<Value, BindingError> {
        self.resolve(&self.display)
    }

    fn set_value(&self, value: Value) -> Result<(), BindingError> {
        trace!(path = %self.display, value = ?value, "property cell write");
        self.write(value, &self.display)?;
        self.refresh();
        Ok(())
    }

    fn subscribe(&self, listener: Box<dyn Fn(&ValueChange)>) -> Subscription {
        self.listeners.subscribe_boxed(listener)
    }

    fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}
