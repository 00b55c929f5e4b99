//! In-memory reference indices for a spreadsheet: which ranges hold which
//! values, which targets read which cells, and what each label names.
//!
//! All three stores share the [`Store`] record contract and notify
//! registered watchers synchronously after every effective change.

pub mod config;
pub mod error;
pub mod label_registry;
pub mod range_index;
pub mod reference_graph;
pub mod shared;
pub mod store;
pub mod watchers;

pub use config::{CaseSensitivity, IndexConfig};
pub use error::{IndexError, IndexResult};
pub use label_registry::LabelRegistry;
pub use range_index::{RangeIndex, RangeValue};
pub use reference_graph::{ReferenceGraph, ReferenceTarget, TargetAndReference};
pub use shared::Shared;
pub use store::Store;
pub use watchers::WatcherHandle;

pub use refindex_common as common;

#[cfg(test)]
mod tests;
