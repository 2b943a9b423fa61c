#![forbid(unsafe_code)]

//! Pluggable change detection.
//!
//! A [`ChangeDetector`] decides whether a write actually changed a cell. It
//! is injected into every cell that needs one; nothing looks it up from
//! ambient state.

use std::rc::Rc;

use crate::value::Value;

/// Equality policy used to decide whether `new` differs from `old`.
pub trait ChangeDetector {
    fn has_changed(&self, old: &Value, new: &Value) -> bool;
}

/// Value equality. `Null` compares equal only to `Null`.
#[derive(Debug, Default, Clone, Copy)]
pub struct EqualityChangeDetector;

impl ChangeDetector for EqualityChangeDetector {
    fn has_changed(&self, old: &Value, new: &Value) -> bool {
        old != new
    }
}

/// Strict identity: an equal but distinct text or container counts as a
/// change.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityChangeDetector;

impl ChangeDetector for IdentityChangeDetector {
    fn has_changed(&self, old: &Value, new: &Value) -> bool {
        !old.same_instance(new)
    }
}

/// Shared handle to the default (equality) detector.
#[must_use]
pub fn default_detector() -> Rc<dyn ChangeDetector> {
    Rc::new(EqualityChangeDetector)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_null_safe() {
        let d = EqualityChangeDetector;
        assert!(!d.has_changed(&Value::Null, &Value::Null));
        assert!(d.has_changed(&Value::Null, &Value::from("")));
        assert!(d.has_changed(&Value::from(""), &Value::Null));
        assert!(!d.has_changed(&Value::from("a"), &Value::from("a")));
    }

    #[test]
    fn identity_sees_distinct_equal_text() {
        let d = IdentityChangeDetector;
        let a = Value::from("a");
        assert!(d.has_changed(&a, &Value::from("a")));
        assert!(!d.has_changed(&a, &a.clone()));
        assert!(!d.has_changed(&Value::from(5), &Value::from(5)));
    }
}
