#![forbid(unsafe_code)]

//! Access-strategy configuration.
//!
//! | Field           | Default  | Env var                 |
//! |-----------------|----------|-------------------------|
//! | `null_handling` | `Strict` | `BINDERY_NULL_HANDLING` |
//! | `grow_lists`    | `false`  | `BINDERY_GROW_LISTS`    |
//!
//! Unparseable environment values are ignored (the default is kept) and
//! logged at `warn`.

use tracing::warn;

/// How reads treat a null intermediate value (or a null domain object).
///
/// Writes through a null intermediate always fail, whatever the mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullHandling {
    /// Reads fail with [`BindingError::NullValueInNestedPath`].
    ///
    /// [`BindingError::NullValueInNestedPath`]: crate::error::BindingError::NullValueInNestedPath
    #[default]
    Strict,
    /// Reads yield `Null`.
    Lenient,
}

impl NullHandling {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Strict => "strict",
            Self::Lenient => "lenient",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "strict" => Some(Self::Strict),
            "lenient" => Some(Self::Lenient),
            _ => None,
        }
    }
}

/// Configuration for a [`PropertyAccessStrategy`](super::PropertyAccessStrategy).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AccessConfig {
    /// Read behavior for null intermediates.
    pub null_handling: NullHandling,
    /// Writing past the end of a growable list pads it with `Null`, and
    /// writing an index into a null list-typed property creates the list.
    pub grow_lists: bool,
}

impl AccessConfig {
    /// Strict null handling, no list growth.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Lenient null handling, no list growth.
    #[must_use]
    pub fn lenient() -> Self {
        Self::default().with_null_handling(NullHandling::Lenient)
    }

    #[must_use]
    pub fn with_null_handling(mut self, null_handling: NullHandling) -> Self {
        self.null_handling = null_handling;
        self
    }

    #[must_use]
    pub fn with_grow_lists(mut self, grow_lists: bool) -> Self {
        self.grow_lists = grow_lists;
        self
    }

    /// Read configuration from the process environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_env_with(|key| std::env::var(key).ok())
    }

    /// Read configuration through an arbitrary lookup (testable).
    pub fn from_env_with<F>(get_env: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(raw) = get_env("BINDERY_NULL_HANDLING") {
            match NullHandling::parse(&raw) {
                Some(mode) => config.null_handling = mode,
                None => warn!(value = %raw, "ignoring unknown BINDERY_NULL_HANDLING"),
            }
        }

        if let Some(raw) = get_env("BINDERY_GROW_LISTS") {
            match env_flag(&raw) {
                Some(flag) => config.grow_lists = flag,
                None => warn!(value = %raw, "ignoring unparseable BINDERY_GROW_LISTS"),
            }
        }

        config
    }
}

fn env_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_are_strict_without_growth() {
        let config = AccessConfig::default();
        assert_eq!(config.null_handling, NullHandling::Strict);
        assert!(!config.grow_lists);
        assert_eq!(AccessConfig::from_env_with(lookup(&[])), config);
    }

    #[test]
    fn env_overrides() {
        let config = AccessConfig::from_env_with(lookup(&[
            ("BINDERY_NULL_HANDLING", " Lenient "),
            ("BINDERY_GROW_LISTS", "yes"),
        ]));
        assert_eq!(config.null_handling, NullHandling::Lenient);
        assert!(config.grow_lists);
    }

    #[test]
    fn bad_env_values_keep_defaults() {
        let config = AccessConfig::from_env_with(lookup(&[
            ("BINDERY_NULL_HANDLING", "sometimes"),
            ("BINDERY_GROW_LISTS", "maybe"),
        ]));
        assert_eq!(config, AccessConfig::default());
    }

    #[test]
    fn builder_methods() {
        let config = AccessConfig::lenient().with_grow_lists(true);
        assert_eq!(config.null_handling, NullHandling::Lenient);
        assert!(config.grow_lists);
        assert_eq!(NullHandling::Lenient.as_str(), "lenient");
    }
}
