#![forbid(unsafe_code)]

//! Dynamic property values.
//!
//! Domain objects expose their properties through explicit accessor maps
//! rather than reflection, so every property value is a [`Value`]. Containers
//! (`List`, `Array`, `Map`) and text are shared behind `Rc` and treated as
//! copy-on-write: writing through `items[1]` builds a new list and stores it
//! back through the `items` property.
//!
//! # Equality
//!
//! | Comparison            | Scalars | Text / containers | Objects  |
//! |-----------------------|---------|-------------------|----------|
//! | `PartialEq`           | value   | value             | identity |
//! | [`Value::same_instance`] | value | pointer          | identity |
//!
//! Floats compare `NaN` equal to `NaN` so a cell holding `NaN` does not fire
//! a change on every write.

use std::collections::BTreeMap;
use std::fmt;
use std::rc::Rc;

use crate::domain::DomainObject;

/// Type descriptor for a property or value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Accepts every value.
    Any,
    Null,
    Bool,
    Int,
    Float,
    Text,
    /// Growable list.
    List,
    /// Fixed-size array.
    Array,
    Map,
    Object,
}

impl ValueKind {
    /// Whether a property declared with this kind may hold `value`.
    ///
    /// `Null` is accepted by every kind; `Float` also accepts `Int`.
    #[must_use]
    pub fn accepts(self, value: &Value) -> bool {
        let found = value.kind();
        match (self, found) {
            (Self::Any, _) | (_, Self::Null) => true,
            (Self::Float, Self::Int) => true,
            (expected, found) => expected == found,
        }
    }

    /// Lowercase name used in diagnostics.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Null => "null",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Text => "text",
            Self::List => "list",
            Self::Array => "array",
            Self::Map => "map",
            Self::Object => "object",
        }
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shared handle to a domain object.
///
/// Cloning shares the same object. Equality is handle identity.
#[derive(Clone)]
pub struct ObjectRef(Rc<dyn DomainObject>);

impl ObjectRef {
    /// Wrap a shared domain object.
    #[must_use]
    pub fn new(object: Rc<dyn DomainObject>) -> Self {
        Self(object)
    }

    /// Whether both handles point at the same object.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl std::ops::Deref for ObjectRef {
    type Target = dyn DomainObject;

    fn deref(&self) -> &Self::Target {
        self.0.as_ref()
    }
}

impl PartialEq for ObjectRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other)
    }
}

impl fmt::Debug for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.0.type_name(), Rc::as_ptr(&self.0).cast::<()>())
    }
}

/// A dynamically typed property value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(Rc<str>),
    /// Growable list; writes past the end may pad with `Null`.
    List(Rc<Vec<Value>>),
    /// Fixed-size array; writes past the end are rejected.
    Array(Rc<[Value]>),
    Map(Rc<BTreeMap<String, Value>>),
    Object(ObjectRef),
}

impl Value {
    /// Build a growable list value.
    pub fn list<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::List(Rc::new(items.into_iter().map(Into::into).collect()))
    }

    /// Build a fixed-size array value.
    pub fn array<I, V>(items: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        Self::Array(items.into_iter().map(Into::into).collect())
    }

    /// Build a map value.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        Self::Map(Rc::new(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        ))
    }

    /// Wrap a shared domain object.
    pub fn object<T: DomainObject + 'static>(object: Rc<T>) -> Self {
        Self::Object(ObjectRef::new(object))
    }

    /// The kind of this value (`Null` for [`Value::Null`]).
    #[must_use]
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Bool(_) => ValueKind::Bool,
            Self::Int(_) => ValueKind::Int,
            Self::Float(_) => ValueKind::Float,
            Self::Text(_) => ValueKind::Text,
            Self::List(_) => ValueKind::List,
            Self::Array(_) => ValueKind::Array,
            Self::Map(_) => ValueKind::Map,
            Self::Object(_) => ValueKind::Object,
        }
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(x) => Some(*x),
            #[allow(clippy::cast_precision_loss)]
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(&**s),
            _ => None,
        }
    }

    /// Items of a list or array.
    #[must_use]
    pub fn as_slice(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items.as_slice()),
            Self::Array(items) => Some(&items[..]),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_map(&self) -> Option<&BTreeMap<String, Value>> {
        match self {
            Self::Map(map) => Some(&**map),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_object(&self) -> Option<&ObjectRef> {
        match self {
            Self::Object(obj) => Some(obj),
            _ => None,
        }
    }

    /// Strict identity: shared text, containers and objects compare by
    /// pointer; scalars compare by value.
    #[must_use]
    pub fn same_instance(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a.to_bits() == b.to_bits(),
            (Self::Text(a), Self::Text(b)) => Rc::ptr_eq(a, b),
            (Self::List(a), Self::List(b)) => Rc::ptr_eq(a, b),
            (Self::Array(a), Self::Array(b)) => Rc::ptr_eq(a, b),
            (Self::Map(a), Self::Map(b)) => Rc::ptr_eq(a, b),
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b || (a.is_nan() && b.is_nan()),
            (Self::Text(a), Self::Text(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("Null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x:?}"),
            Self::Text(s) => write!(f, "{:?}", &**s),
            Self::List(items) => f.debug_list().entries(items.iter()).finish(),
            Self::Array(items) => {
                f.write_str("array")?;
                f.debug_list().entries(items.iter()).finish()
            }
            Self::Map(map) => f.debug_map().entries(map.iter()).finish(),
            Self::Object(obj) => write!(f, "{obj:?}"),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<i32> for Value {
    fn from(value: i32) -> Self {
        Self::Int(i64::from(value))
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Float(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Text(Rc::from(value))
    }
}

impl From<Vec<Value>> for Value {
    fn from(value: Vec<Value>) -> Self {
        Self::List(Rc::new(value))
    }
}

impl From<ObjectRef> for Value {
    fn from(value: ObjectRef) -> Self {
        Self::Object(value)
    }
}

impl<T: DomainObject + 'static> From<Rc<T>> for Value {
    fn from(value: Rc<T>) -> Self {
        Self::object(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
