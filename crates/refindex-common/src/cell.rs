//! Packed cell coordinates.
//!
//! `CellReference` encodes a zero-based (row, column) position in 64 bits with
//! the same limits as Excel: 1,048,576 rows × 16,384 columns. The row occupies
//! the higher bits, so the derived ordering on the packed word is the store's
//! single total order: row-major, row first and column second.

use core::fmt;
use core::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

const ROW_BITS: u32 = 20;
const COL_BITS: u32 = 14;
const ROW_MAX: u32 = (1 << ROW_BITS) - 1;
const COL_MAX: u32 = (1 << COL_BITS) - 1;

const ROW_SHIFT: u32 = 24;
const COL_SHIFT: u32 = 10;

const ROW_MASK: u64 = (ROW_MAX as u64) << ROW_SHIFT;
const COL_MASK: u64 = (COL_MAX as u64) << COL_SHIFT;
const RESERVED_MASK: u64 = !(ROW_MASK | COL_MASK);

/// Highest zero-based row index.
pub const MAX_ROW: u32 = ROW_MAX;
/// Highest zero-based column index.
pub const MAX_COLUMN: u32 = COL_MAX;

/// A single cell position.
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct CellReference(u64);

impl CellReference {
    /// Top-left cell of the grid.
    pub const ORIGIN: Self = Self(0);

    /// Construct a reference, panicking if values exceed the supported limits.
    pub const fn new(row: u32, col: u32) -> Self {
        assert!(row <= ROW_MAX, "row exceeds 20 bits");
        assert!(col <= COL_MAX, "col exceeds 14 bits");
        Self(((row as u64) << ROW_SHIFT) | ((col as u64) << COL_SHIFT))
    }

    /// Fallible constructor that reports overflow rather than panicking.
    pub fn try_new(row: u32, col: u32) -> Result<Self, ReferenceError> {
        if row > ROW_MAX {
            return Err(ReferenceError::RowOverflow(row as u64));
        }
        if col > COL_MAX {
            return Err(ReferenceError::ColOverflow(col as u64));
        }
        Ok(Self::new(row, col))
    }

    /// Construct from Excel 1-based coordinates.
    pub fn from_excel(row: u32, col: u32) -> Result<Self, ReferenceError> {
        let row0 = row.checked_sub(1).ok_or(ReferenceError::ZeroIndex)?;
        let col0 = col.checked_sub(1).ok_or(ReferenceError::ZeroIndex)?;
        Self::try_new(row0, col0)
    }

    /// Reconstruct from a raw packed value, ensuring reserved bits stay zero.
    pub fn from_raw(raw: u64) -> Result<Self, ReferenceError> {
        if raw & RESERVED_MASK != 0 {
            return Err(ReferenceError::InvalidCell(format!("{raw:#x}")));
        }
        Ok(Self(raw))
    }

    /// Parse `A1`, `$B$7` or `c12`. Anchors are accepted and dropped.
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let invalid = || ReferenceError::InvalidCell(text.to_owned());
        let rest = text.strip_prefix('$').unwrap_or(text);
        let split = rest
            .find(|c: char| !c.is_ascii_alphabetic())
            .ok_or_else(invalid)?;
        let (letters, digits) = rest.split_at(split);
        let digits = digits.strip_prefix('$').unwrap_or(digits);
        if letters.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }
        let col = letters_to_column_index(&letters.to_ascii_uppercase()).ok_or_else(invalid)?;
        let row: u64 = digits.parse().map_err(|_| invalid())?;
        if row == 0 {
            return Err(ReferenceError::ZeroIndex);
        }
        if row - 1 > ROW_MAX as u64 {
            return Err(ReferenceError::RowOverflow(row - 1));
        }
        Self::try_new((row - 1) as u32, col)
    }

    #[inline(always)]
    pub fn row(self) -> u32 {
        ((self.0 & ROW_MASK) >> ROW_SHIFT) as u32
    }

    #[inline(always)]
    pub fn col(self) -> u32 {
        ((self.0 & COL_MASK) >> COL_SHIFT) as u32
    }

    #[inline(always)]
    pub fn as_u64(self) -> u64 {
        self.0
    }

    /// Offset by signed deltas, returning `None` if the result leaves the grid.
    pub fn offset(self, drow: i64, dcol: i64) -> Option<Self> {
        let row = u32::try_from(self.row() as i64 + drow).ok()?;
        let col = u32::try_from(self.col() as i64 + dcol).ok()?;
        Self::try_new(row, col).ok()
    }

    pub fn col_to_letters(col: u32) -> String {
        column_to_letters(col)
    }

    pub fn letters_to_col(s: &str) -> Option<u32> {
        letters_to_column_index(s)
    }
}

impl fmt::Display for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", column_to_letters(self.col()), self.row() + 1)
    }
}

impl fmt::Debug for CellReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CellReference({self})")
    }
}

impl FromStr for CellReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl From<CellReference> for (u32, u32) {
    fn from(cell: CellReference) -> Self {
        (cell.row(), cell.col())
    }
}

impl TryFrom<(u32, u32)> for CellReference {
    type Error = ReferenceError;

    fn try_from(value: (u32, u32)) -> Result<Self, Self::Error> {
        Self::try_new(value.0, value.1)
    }
}

impl TryFrom<String> for CellReference {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<CellReference> for String {
    fn from(cell: CellReference) -> Self {
        cell.to_string()
    }
}

fn column_to_letters(mut col: u32) -> String {
    let mut buf = Vec::new();
    loop {
        let rem = (col % 26) as u8;
        buf.push(char::from(b'A' + rem));
        col /= 26;
        if col == 0 {
            break;
        }
        col -= 1;
    }
    buf.iter().rev().collect()
}

fn letters_to_column_index(s: &str) -> Option<u32> {
    if s.is_empty() {
        return None;
    }
    let mut col: u32 = 0;
    for (idx, ch) in s.bytes().enumerate() {
        if !ch.is_ascii_uppercase() {
            return None;
        }
        let val = (ch - b'A') as u32;
        col = col.checked_mul(26)?;
        col = col.checked_add(val)?;
        if idx != s.len() - 1 {
            col = col.checked_add(1)?;
        }
    }
    (col <= COL_MAX).then_some(col)
}
