use core::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::cell::CellReference;
use crate::error::ReferenceError;
use crate::label::LabelName;
use crate::range::CellRangeReference;

/// Anything a label may point at.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub enum ExpressionReference {
    Cell(CellReference),
    Range(CellRangeReference),
    Label(LabelName),
}

impl ExpressionReference {
    /// Parse `A1`, `A1:B2` or a label name, in that order of preference.
    pub fn parse(text: &str) -> Result<Self, ReferenceError> {
        let text = text.trim();
        if text.contains(':') {
            return CellRangeReference::parse(text).map(Self::Range);
        }
        if let Ok(cell) = CellReference::parse(text) {
            return Ok(Self::Cell(cell));
        }
        LabelName::new(text).map(Self::Label)
    }

    pub fn as_cell(&self) -> Option<CellReference> {
        match self {
            Self::Cell(cell) => Some(*cell),
            _ => None,
        }
    }

    pub fn as_range(&self) -> Option<CellRangeReference> {
        match self {
            Self::Range(range) => Some(*range),
            _ => None,
        }
    }

    pub fn as_label(&self) -> Option<&LabelName> {
        match self {
            Self::Label(label) => Some(label),
            _ => None,
        }
    }

    /// Cell and range references need no further lookup.
    pub fn is_concrete(&self) -> bool {
        !matches!(self, Self::Label(_))
    }

    /// The single cell a concrete reference stands for: the cell itself, or
    /// the `begin` corner of a range.
    pub fn to_cell(&self) -> Option<CellReference> {
        match self {
            Self::Cell(cell) => Some(*cell),
            Self::Range(range) => Some(range.begin()),
            Self::Label(_) => None,
        }
    }
}

impl fmt::Display for ExpressionReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cell(cell) => fmt::Display::fmt(cell, f),
            Self::Range(range) => fmt::Display::fmt(range, f),
            Self::Label(label) => fmt::Display::fmt(label, f),
        }
    }
}

impl From<CellReference> for ExpressionReference {
    fn from(value: CellReference) -> Self {
        Self::Cell(value)
    }
}

impl From<CellRangeReference> for ExpressionReference {
    fn from(value: CellRangeReference) -> Self {
        Self::Range(value)
    }
}

impl From<LabelName> for ExpressionReference {
    fn from(value: LabelName) -> Self {
        Self::Label(value)
    }
}

/// A label together with what it names.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LabelMapping {
    label: LabelName,
    reference: ExpressionReference,
}

impl LabelMapping {
    /// Rejects a label that names itself.
    pub fn new(
        label: LabelName,
        reference: impl Into<ExpressionReference>,
    ) -> Result<Self, ReferenceError> {
        let reference = reference.into();
        if reference.as_label() == Some(&label) {
            return Err(ReferenceError::SelfReference(label.to_string()));
        }
        Ok(Self { label, reference })
    }

    pub fn label(&self) -> &LabelName {
        &self.label
    }

    pub fn reference(&self) -> &ExpressionReference {
        &self.reference
    }

    pub fn into_parts(self) -> (LabelName, ExpressionReference) {
        (self.label, self.reference)
    }
}

impl fmt::Display for LabelMapping {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}", self.label, self.reference)
    }
}
