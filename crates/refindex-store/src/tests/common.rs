//! Common test helpers
use std::sync::{Arc, Mutex};

use refindex_common::{CellRangeReference, CellReference, ExpressionReference, LabelMapping, LabelName};

pub fn cell(text: &str) -> CellReference {
    CellReference::parse(text).unwrap()
}

pub fn range(text: &str) -> CellRangeReference {
    CellRangeReference::parse(text).unwrap()
}

pub fn label(text: &str) -> LabelName {
    LabelName::new(text).unwrap()
}

/// `name` mapped to whatever `target` parses as: cell, range or label.
pub fn mapping(name: &str, target: &str) -> LabelMapping {
    LabelMapping::new(label(name), ExpressionReference::parse(target).unwrap()).unwrap()
}

/// Append-only log that watcher closures write into.
#[derive(Clone, Default)]
pub struct EventLog(Arc<Mutex<Vec<String>>>);

impl EventLog {
    pub fn push(&self, entry: impl Into<String>) {
        self.0.lock().unwrap().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }

    pub fn take(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.lock().unwrap())
    }
}
