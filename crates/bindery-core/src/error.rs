#![forbid(unsafe_code)]

//! Error taxonomy for path resolution and property access.
//!
//! Two layers exist:
//!
//! - [`PropertyAccessError`] is what a [`DomainObject`] accessor reports. It
//!   knows the single property it was asked about and nothing else.
//! - [`BindingError`] is what the engine reports to callers. It always
//!   carries the **full** path that was requested, even when the failure
//!   happened several segments deep.
//!
//! Read and write failures are distinct variants so a caller can disable an
//! edit control for an unwritable property but hide a field that is not
//! readable.
//!
//! [`DomainObject`]: crate::domain::DomainObject

use std::fmt;

use crate::value::ValueKind;

/// Failure reported by a single domain-object accessor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyAccessError {
    /// The object has no property with this name.
    NoSuchProperty { type_name: String, property: String },
    /// The property exists but has no reader.
    NotReadable { property: String },
    /// The property exists but has no writer.
    NotWritable { property: String },
    /// The written value does not match the declared kind.
    TypeMismatch {
        property: String,
        expected: ValueKind,
        found: ValueKind,
    },
    /// The object refused the write for a domain-specific reason.
    Rejected { property: String, reason: String },
}

impl fmt::Display for PropertyAccessError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoSuchProperty {
                type_name,
                property,
            } => write!(f, "`{type_name}` has no property `{property}`"),
            Self::NotReadable { property } => write!(f, "property `{property}` is not readable"),
            Self::NotWritable { property } => write!(f, "property `{property}` is not writable"),
            Self::TypeMismatch {
                property,
                expected,
                found,
            } => write!(
                f,
                "property `{property}` expects {expected}, got {found}"
            ),
            Self::Rejected { property, reason } => {
                write!(f, "write to `{property}` rejected: {reason}")
            }
        }
    }
}

impl std::error::Error for PropertyAccessError {}

/// Path-aware failure raised by cells and access strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BindingError {
    /// Malformed path syntax, a property that does not exist, or an index
    /// that a fixed-size container cannot satisfy.
    InvalidPath { path: String, reason: String },
    /// The property at `path` has no reader.
    NotReadable { path: String },
    /// The property at `path` has no writer.
    NotWritable { path: String },
    /// An intermediate segment of `path` evaluated to null. `null_segment`
    /// names the prefix that was null (`"<root>"` for the domain object).
    NullValueInNestedPath { path: String, null_segment: String },
    /// An intermediate step failed for a compound reason, such as indexing
    /// into a scalar or writing a value of the wrong kind.
    InvalidProperty { path: String, reason: String },
}

impl BindingError {
    /// The full path the failing operation was asked to resolve.
    #[must_use]
    pub fn path(&self) -> &str {
        match self {
            Self::InvalidPath { path, .. }
            | Self::NotReadable { path }
            | Self::NotWritable { path }
            | Self::NullValueInNestedPath { path, .. }
            | Self::InvalidProperty { path, .. } => path,
        }
    }

    /// Whether this error was caused by a null intermediate value.
    #[must_use]
    pub fn is_null_in_path(&self) -> bool {
        matches!(self, Self::NullValueInNestedPath { .. })
    }

    pub(crate) fn invalid_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidPath {
            path: path.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_property(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidProperty {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Attach the requested path to an accessor failure.
    pub(crate) fn from_access(path: &str, err: PropertyAccessError) -> Self {
        match err {
            PropertyAccessError::NoSuchProperty { .. } => {
                Self::invalid_path(path, err.to_string())
            }
            PropertyAccessError::NotReadable { .. } => Self::NotReadable { path: path.into() },
            PropertyAccessError::NotWritable { .. } => Self::NotWritable { path: path.into() },
            PropertyAccessError::TypeMismatch { .. } | PropertyAccessError::Rejected { .. } => {
                Self::invalid_property(path, err.to_string())
            }
        }
    }
}

impl fmt::Display for BindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidPath { path, reason } => write!(f, "invalid path `{path}`: {reason}"),
            Self::NotReadable { path } => write!(f, "property path `{path}` is not readable"),
            Self::NotWritable { path } => write!(f, "property path `{path}` is not writable"),
            Self::NullValueInNestedPath { path, null_segment } => write!(
                f,
                "null value in nested path `{path}`: `{null_segment}` is null"
            ),
            Self::InvalidProperty { path, reason } => {
                write!(f, "invalid property at `{path}`: {reason}")
            }
        }
    }
}

impl std::error::Error for BindingError {}

/// A commit broadcast reached every subscriber but some of them failed.
///
/// Buffers whose write was rejected stay buffering; the rest committed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommitError {
    failures: Vec<BindingError>,
}

impl CommitError {
    pub(crate) fn new(failures: Vec<BindingError>) -> Self {
        Self { failures }
    }

    /// Every write failure, in broadcast order.
    #[must_use]
    pub fn failures(&self) -> &[BindingError] {
        &self.failures
    }

    #[must_use]
    pub fn into_failures(self) -> Vec<BindingError> {
        self.failures
    }
}

impl fmt::Display for CommitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.failures.as_slice() {
            [] => f.write_str("commit failed"),
            [only] => write!(f, "commit failed: {only}"),
            [first, rest @ ..] => write!(
                f,
                "commit failed for {} buffers: {first} (and {} more)",
                rest.len() + 1,
                rest.len()
            ),
        }
    }
}

impl std::error::Error for CommitError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.failures
            .first()
            .map(|e| e as &(dyn std::error::Error + 'static))
    }
}
