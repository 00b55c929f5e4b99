//! Meta crate that re-exports the refindex building blocks. Depend on this
//! crate and pick layers with feature flags, or use the underlying crates
//! directly for finer control.

#[cfg(feature = "common")]
pub use refindex_common as common;

#[cfg(feature = "store")]
pub use refindex_store as store;

#[cfg(feature = "common")]
pub use refindex_common::{
    CellRangeReference, CellReference, ExpressionReference, LabelMapping, LabelName,
    ReferenceError,
};

#[cfg(feature = "store")]
pub use refindex_store::{
    CaseSensitivity, IndexConfig, IndexError, IndexResult, LabelRegistry, RangeIndex, RangeValue,
    ReferenceGraph, ReferenceTarget, Shared, Store, TargetAndReference, WatcherHandle,
};

#[cfg(feature = "store")]
pub mod doc_examples;
