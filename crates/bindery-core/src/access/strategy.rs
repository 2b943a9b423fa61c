#![forbid(unsafe_code)]

//! Property access strategy: path-addressed cells over one domain object.
//!
//! A [`PropertyAccessStrategy`] owns (or is given) a holder cell containing
//! the domain object, and hands out one cached [`PropertyCell`] per canonical
//! path. Child strategies created with
//! [`get_access_strategy_for_path`](PropertyAccessStrategy::get_access_strategy_for_path)
//! share the root's cache, so `root.get_value_cell("a.b")` and
//! `root.get_access_strategy_for_path("a")?.get_value_cell("b")` return the
//! same cell.
//!
//! # Example
//!
//! ```
//! use bindery_core::access::PropertyAccessStrategy;
//! use bindery_core::domain::Bean;
//! use bindery_core::reactive::{ValueCell, ValueCellExt};
//! use bindery_core::value::Value;
//!
//! let address = Bean::builder("Address").property("city", "Oslo").build();
//! let person = Bean::builder("Person").property("address", address).build();
//!
//! let strategy = PropertyAccessStrategy::new(person);
//! let city = strategy.get_value_cell("address.city").unwrap();
//! assert_eq!(city.get_value().unwrap(), Value::from("Oslo"));
//!
//! city.set("Bergen").unwrap();
//! assert_eq!(city.get_value().unwrap(), Value::from("Bergen"));
//! ```

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::debug;

use super::cell::{Parent, PropertyCell};
use super::config::AccessConfig;
use super::metadata::{PropertyMetadata, StrategyShared};
use super::path::PropertyPath;
use crate::error::BindingError;
use crate::reactive::{ChangeDetector, SharedCell, ValueHolder, default_detector};
use crate::value::{Value, ValueKind};

struct StrategyRoot {
    holder: SharedCell,
    shared: Rc<StrategyShared>,
    cells: RefCell<HashMap<PropertyPath, Rc<PropertyCell>>>,
}

impl StrategyRoot {
    /// Cached cell for `full`, creating it and any missing prefixes.
    fn cell_for(&self, full: &PropertyPath) -> Result<Rc<PropertyCell>, BindingError> {
        if let Some(cell) = self.cells.borrow().get(full) {
            return Ok(Rc::clone(cell));
        }

        let requested = full.to_string();
        let mut parent = Parent::Holder(Rc::clone(&self.holder));
        let mut last = None;
        for (depth, segment) in full.segments().iter().enumerate() {
            let path = full.prefix(depth + 1);
            let existing = self.cells.borrow().get(&path).cloned();
            let cell = match existing {
                Some(cell) => cell,
                None => {
                    let cell = PropertyCell::attach(
                        path.clone(),
                        segment.clone(),
                        parent,
                        Rc::clone(&self.shared),
                    );
                    cell.check_exists(&requested)?;
                    debug!(path = %path, "value cell created");
                    self.cells.borrow_mut().insert(path, Rc::clone(&cell));
                    cell
                }
            };
            parent = Parent::Cell(Rc::clone(&cell));
            last = Some(cell);
        }
        last.ok_or_else(|| BindingError::invalid_path(requested, "path is empty"))
    }
}

/// Resolves property paths of one domain object into shared value cells.
///
/// Cloning is cheap and yields a handle onto the same cache.
#[derive(Clone)]
pub struct PropertyAccessStrategy {
    root: Rc<StrategyRoot>,
    prefix: PropertyPath,
    holder: SharedCell,
}

impl std::fmt::Debug for PropertyAccessStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PropertyAccessStrategy")
            .field("prefix", &self.prefix.to_string())
            .field("config", &self.root.shared.config)
            .field("cell_count", &self.root.cells.borrow().len())
            .finish()
    }
}

impl PropertyAccessStrategy {
    /// Strategy over `domain_object` with default configuration and value
    /// equality.
    #[must_use]
    pub fn new(domain_object: impl Into<Value>) -> Self {
        Self::with_config(domain_object, AccessConfig::default(), default_detector())
    }

    /// Strategy over `domain_object`, held in a fresh [`ValueHolder`].
    #[must_use]
    pub fn with_config(
        domain_object: impl Into<Value>,
        config: AccessConfig,
        detector: Rc<dyn ChangeDetector>,
    ) -> Self {
        let holder: SharedCell = Rc::new(ValueHolder::with_detector(
            domain_object,
            Rc::clone(&detector),
        ));
        Self::for_holder(holder, config, detector)
    }

    /// Strategy over whatever domain object `holder` contains, following it
    /// when it is replaced.
    #[must_use]
    pub fn for_holder(
        holder: SharedCell,
        config: AccessConfig,
        detector: Rc<dyn ChangeDetector>,
    ) -> Self {
        debug!(
            null_handling = config.null_handling.as_str(),
            grow_lists = config.grow_lists,
            "access strategy created"
        );
        let root = Rc::new(StrategyRoot {
            holder: Rc::clone(&holder),
            shared: Rc::new(StrategyShared::new(config, detector)),
            cells: RefCell::new(HashMap::new()),
        });
        Self {
            root,
            prefix: PropertyPath::default(),
            holder,
        }
    }

    #[must_use]
    pub fn config(&self) -> AccessConfig {
        self.root.shared.config
    }

    /// Change detector shared by every cell of this strategy.
    #[must_use]
    pub fn detector(&self) -> Rc<dyn ChangeDetector> {
        Rc::clone(&self.root.shared.detector)
    }

    /// Path this strategy is rooted at; empty for a root strategy.
    #[must_use]
    pub fn prefix(&self) -> &PropertyPath {
        &self.prefix
    }

    #[must_use]
    pub fn is_root(&self) -> bool {
        self.prefix.is_empty()
    }

    /// The cell holding this strategy's domain object.
    ///
    /// For a child strategy this is the parent's cell for the child path.
    #[must_use]
    pub fn domain_object_holder(&self) -> SharedCell {
        Rc::clone(&self.holder)
    }

    /// Current domain object.
    pub fn domain_object(&self) -> Result<Value, BindingError> {
        self.holder.get_value()
    }

    /// Replace the domain object. Every cell re-resolves and notifies its
    /// subscribers if its value changed.
    pub fn set_domain_object(&self, domain_object: impl Into<Value>) -> Result<(), BindingError> {
        debug!(prefix = %self.prefix, "domain object replaced");
        self.holder.set_value(domain_object.into())
    }

    /// The cached cell for `path`, relative to this strategy.
    ///
    /// Fails with [`BindingError::InvalidPath`] for malformed paths and for
    /// properties the current object chain does not declare.
    pub fn get_value_cell(&self, path: &str) -> Result<Rc<PropertyCell>, BindingError> {
        let relative = PropertyPath::parse(path)?;
        self.root.cell_for(&self.prefix.join(&relative))
    }

    /// A strategy rooted at `path`. Its holder is this strategy's cell for
    /// `path`, and it shares this strategy's cell cache.
    pub fn get_access_strategy_for_path(&self, path: &str) -> Result<Self, BindingError> {
        let relative = PropertyPath::parse(path)?;
        let full = self.prefix.join(&relative);
        let cell = self.root.cell_for(&full)?;
        debug!(path = %full, "child access strategy");
        Ok(Self {
            root: Rc::clone(&self.root),
            prefix: full,
            holder: cell,
        })
    }

    /// Metadata for `path`, relative to this strategy.
    pub fn metadata(&self, path: &str) -> Result<PropertyMetadata, BindingError> {
        self.get_value_cell(path)?.metadata()
    }

    /// Whether `path` currently resolves to a readable property. Paths that
    /// cannot be resolved are not readable.
    #[must_use]
    pub fn is_readable(&self, path: &str) -> bool {
        self.metadata(path).is_ok_and(|m| m.readable)
    }

    /// Whether `path` currently resolves to a writable property.
    #[must_use]
    pub fn is_writable(&self, path: &str) -> bool {
        self.metadata(path).is_ok_and(|m| m.writable)
    }

    /// Declared kind of `path`.
    pub fn property_type(&self, path: &str) -> Result<ValueKind, BindingError> {
        self.metadata(path).map(|m| m.kind)
    }

    /// Property names of the current domain object; empty unless it is an
    /// object.
    #[must_use]
    pub fn property_names(&self) -> Vec<String> {
        match self.holder.get_value() {
            Ok(Value::Object(object)) => object.property_names(),
            _ => Vec::new(),
        }
    }

    /// Number of cached cells across the whole strategy tree.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.root.cells.borrow().len()
    }

    /// Detach cached cells from their parents and domain objects and drop
    /// them from the cache.
    ///
    /// A root strategy disposes every cell. A child strategy disposes only
    /// the cells below its own path; the cell it is rooted at belongs to
    /// its parent.
    pub fn dispose(&self) {
        let removed: Vec<Rc<PropertyCell>> = {
            let mut cells = self.root.cells.borrow_mut();
            if self.is_root() {
                cells.drain().map(|(_, cell)| cell).collect()
            } else {
                let doomed: Vec<PropertyPath> = cells
                    .iter()
                    .filter(|(_, cell)| cell.starts_with(&self.prefix))
                    .map(|(path, _)| path.clone())
                    .collect();
                doomed
                    .iter()
                    .filter_map(|path| cells.remove(path))
                    .collect()
            }
        };
        for cell in &removed {
            cell.detach();
        }
        debug!(prefix = %self.prefix, disposed = removed.len(), "access strategy disposed");
    }
}
