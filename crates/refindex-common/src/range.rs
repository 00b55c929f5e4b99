use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::CellReference;
use crate::error::ReferenceError;

/// Inclusive rectangular selection from `begin` (top-left) to `end`
/// (bottom-right).
///
/// Ranges order by `begin` and then `end`, so a sorted set of ranges walks
/// them in the same sequence a `begin`-keyed index does.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellRangeReference {
    begin: CellReference,
    end: CellReference,
}

impl CellRangeReference {
    /// Build a range, rejecting corners that are not top-left / bottom-right.
    pub fn new(begin: CellReference, end: CellReference) -> Result<Self, ReferenceError> {
        if begin.row() > end.row() || begin.col() > end.col() {
            return Err(ReferenceError::RangeOrder);
        }
        Ok(Self { begin, end })
    }

    /// Build the smallest range spanning two arbitrary corners.
    pub fn from_corners(a: CellReference, b: CellReference) -> Self {
        let begin = CellReference::new(a.row().min(b.row()), a.col().min(b.col()));
        let end = CellReference::new(a.row().max(b.row()), a.col().max(b.col()));
        Self { begin, end }
    }

    /// A range covering exactly one cell.
    pub fn single(cell: CellReference) -> Self {
        Self {
            begin: cell,
            end: cell,
        }
    }

    /// Parse `A1:B2`; a bare `A1` yields a single-cell range.
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let invalid = |_| ReferenceError::InvalidRange(text.to_owned());
        match text.split_once(':') {
            Some((begin, end)) => {
                let begin = CellReference::parse(begin.trim()).map_err(invalid)?;
                let end = CellReference::parse(end.trim()).map_err(invalid)?;
                Self::new(begin, end)
            }
            None => CellReference::parse(text.trim())
                .map(Self::single)
                .map_err(invalid),
        }
    }

    #[inline]
    pub fn begin(&self) -> CellReference {
        self.begin
    }

    #[inline]
    pub fn end(&self) -> CellReference {
        self.end
    }

    /// Width of the range in cells (inclusive bounds).
    pub fn width(&self) -> u32 {
        self.end.col() - self.begin.col() + 1
    }

    /// Height of the range in cells (inclusive bounds).
    pub fn height(&self) -> u32 {
        self.end.row() - self.begin.row() + 1
    }

    pub fn is_single_cell(&self) -> bool {
        self.begin == self.end
    }

    /// `begin <= cell <= end` under the row-major cell order.
    ///
    /// This is an ordering test, not a rectangle test: with row-major order a
    /// cell to the right of `end` on a row strictly between the corners'
    /// rows still counts, and a cell left of `begin` on `begin`'s row does
    /// not. Range stores rely on exactly this comparator.
    #[inline]
    pub fn spans(&self, cell: CellReference) -> bool {
        self.begin <= cell && cell <= self.end
    }

    /// Row and column both inside the rectangle.
    pub fn contains_within_bounds(&self, cell: CellReference) -> bool {
        (self.begin.row()..=self.end.row()).contains(&cell.row())
            && (self.begin.col()..=self.end.col()).contains(&cell.col())
    }
}

impl fmt::Display for CellRangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.begin, self.end)
    }
}

impl fmt::Debug for CellRangeReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellRangeReference({self})")
    }
}

impl FromStr for CellRangeReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<CellReference> for CellRangeReference {
    fn from(cell: CellReference) -> Self {
        Self::single(cell)
    }
}

impl TryFrom<String> for CellRangeReference {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CellRangeReference> for String {
    fn from(range: CellRangeReference) -> Self {
        range.to_string()
    }
}
