#![forbid(unsafe_code)]

//! Per-path readability, writability and type metadata.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use super::config::AccessConfig;
use super::path::PropertyPath;
use crate::domain::PropertyDescriptor;
use crate::reactive::ChangeDetector;
use crate::value::ValueKind;

/// What is known about one resolved path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PropertyMetadata {
    pub readable: bool,
    pub writable: bool,
    pub kind: ValueKind,
}

impl From<PropertyDescriptor> for PropertyMetadata {
    fn from(d: PropertyDescriptor) -> Self {
        Self {
            readable: d.readable,
            writable: d.writable,
            kind: d.kind,
        }
    }
}

/// State shared by a root strategy, its children, and every cell they make.
pub(crate) struct StrategyShared {
    pub(crate) config: AccessConfig,
    pub(crate) detector: Rc<dyn ChangeDetector>,
    metadata: RefCell<HashMap<PropertyPath, PropertyMetadata>>,
}

impl StrategyShared {
    pub(crate) fn new(config: AccessConfig, detector: Rc<dyn ChangeDetector>) -> Self {
        Self {
            config,
            detector,
            metadata: RefCell::new(HashMap::new()),
        }
    }

    /// Remember the latest metadata seen for `path`.
    pub(crate) fn record(&self, path: &PropertyPath, metadata: PropertyMetadata) {
        let mut cache = self.metadata.borrow_mut();
        if cache.get(path) != Some(&metadata) {
            cache.insert(path.clone(), metadata);
        }
    }

    /// Last metadata seen for `path`, if it ever resolved.
    pub(crate) fn cached(&self, path: &PropertyPath) -> Option<PropertyMetadata> {
        self.metadata.borrow().get(path).copied()
    }
}
