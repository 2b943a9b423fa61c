#![forbid(unsafe_code)]

//! Validation messages and their severity order.

use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Severity of a validation message. Ordered `Info < Warning < Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Info,
    Warning,
    Error,
}

impl Severity {
    /// All severities, least severe first.
    pub const ALL: [Self; 3] = [Self::Info, Self::Warning, Self::Error];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Info => "info",
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One validation result, attached to a property path (or to no property
/// when `property` is empty).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidationMessage {
    pub property: String,
    pub severity: Severity,
    pub text: String,
    /// Milliseconds since the Unix epoch, or any caller-chosen monotonic
    /// clock. Only the order matters.
    pub timestamp: u64,
}

impl ValidationMessage {
    /// Message stamped with the current wall-clock time.
    #[must_use]
    pub fn new(property: impl Into<String>, severity: Severity, text: impl Into<String>) -> Self {
        Self::at(property, severity, text, now_millis())
    }

    /// Message with an explicit timestamp.
    #[must_use]
    pub fn at(
        property: impl Into<String>,
        severity: Severity,
        text: impl Into<String>,
        timestamp: u64,
    ) -> Self {
        Self {
            property: property.into(),
            severity,
            text: text.into(),
            timestamp,
        }
    }

    #[must_use]
    pub fn error(property: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(property, Severity::Error, text)
    }

    #[must_use]
    pub fn warning(property: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(property, Severity::Warning, text)
    }

    #[must_use]
    pub fn info(property: impl Into<String>, text: impl Into<String>) -> Self {
        Self::new(property, Severity::Info, text)
    }

    /// Whether the message is not attached to a specific property.
    #[must_use]
    pub fn is_global(&self) -> bool {
        self.property.is_empty()
    }
}

impl fmt::Display for ValidationMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_global() {
            write!(f, "{}: {}", self.severity, self.text)
        } else {
            write!(f, "{} [{}]: {}", self.severity, self.property, self.text)
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| u64::try_from(d.as_millis()).unwrap_or(u64::MAX))
}
