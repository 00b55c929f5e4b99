//! Errors raised while constructing or parsing reference identifiers.
//!
//! Every identifier type in this crate validates on construction, so a value
//! that exists is always well formed. The variants below describe *why* a
//! candidate was rejected; stores wrap them as invalid-argument failures.

use std::{error::Error, fmt};

/// Why a cell, range or label identifier could not be built.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ReferenceError {
    /// Row index beyond the supported grid.
    RowOverflow(u64),
    /// Column index beyond the supported grid.
    ColOverflow(u64),
    /// A 1-based index of zero.
    ZeroIndex,
    /// Range corners were not top-left / bottom-right.
    RangeOrder,
    /// Text that is not an A1 cell reference.
    InvalidCell(String),
    /// Text that is not an `A1:B2` range.
    InvalidRange(String),
    /// Text that is not an acceptable label name.
    InvalidLabel { name: String, reason: &'static str },
    /// A label mapped onto itself.
    SelfReference(String),
}

impl fmt::Display for ReferenceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReferenceError::RowOverflow(row) => {
                write!(f, "row {row} exceeds {MAX}", MAX = crate::cell::MAX_ROW)
            }
            ReferenceError::ColOverflow(col) => {
                write!(f, "col {col} exceeds {MAX}", MAX = crate::cell::MAX_COLUMN)
            }
            ReferenceError::ZeroIndex => {
                write!(f, "row and column indices must be 1-based (>= 1)")
            }
            ReferenceError::RangeOrder => {
                write!(
                    f,
                    "range must be ordered so the begin is above/left of the end"
                )
            }
            ReferenceError::InvalidCell(text) => write!(f, "invalid cell reference {text:?}"),
            ReferenceError::InvalidRange(text) => write!(f, "invalid cell range {text:?}"),
            ReferenceError::InvalidLabel { name, reason } => {
                write!(f, "invalid label {name:?}: {reason}")
            }
            ReferenceError::SelfReference(name) => {
                write!(f, "label {name} cannot refer to itself")
            }
        }
    }
}

impl Error for ReferenceError {}

impl From<ReferenceError> for String {
    fn from(error: ReferenceError) -> Self {
        format!("{error}")
    }
}
