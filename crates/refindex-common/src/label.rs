//! Label (defined name) identifiers.

use core::fmt;
use core::str::FromStr;
use std::borrow::Borrow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::error::ReferenceError;

const MAX_LABEL_LEN: usize = 255;

/// A validated label name such as `Total` or `tax_rate.2024`.
///
/// Equality and ordering are exact and case-preserving. Case-insensitive
/// lookups are a property of the store holding the label, see
/// [`LabelName::folded`].
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(try_from = "String", into = "String")
)]
#[derive(Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
pub struct LabelName(String);

impl LabelName {
    /// Validate `name` against the defined-name rules:
    /// starts with a letter, `_` or `\`; continues with letters, digits, `.`
    /// or `_`; at most 255 characters; never shaped like a cell reference.
    pub fn new(name: impl Into<String>) -> Result<Self, ReferenceError> {
        let name = name.into();
        let reject = |reason| ReferenceError::InvalidLabel {
            name: name.clone(),
            reason,
        };

        if name.is_empty() {
            return Err(reject("empty"));
        }
        if name.chars().count() > MAX_LABEL_LEN {
            return Err(reject("longer than 255 characters"));
        }
        if looks_like_cell_reference(&name) {
            return Err(reject("looks like a cell reference"));
        }

        let mut chars = name.chars();
        if let Some(first) = chars.next()
            && !first.is_alphabetic()
            && first != '_'
            && first != '\\'
        {
            return Err(reject("must start with a letter, '_' or '\\'"));
        }
        if chars.any(|c| !c.is_alphanumeric() && c != '.' && c != '_') {
            return Err(reject("may only contain letters, digits, '.' and '_'"));
        }

        Ok(Self(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Lower-cased form used as a case-insensitive lookup key.
    pub fn folded(&self) -> String {
        self.0.to_lowercase()
    }

    /// Case-insensitive equality.
    pub fn eq_ignore_case(&self, other: &LabelName) -> bool {
        self.folded() == other.folded()
    }

    pub fn len(&self) -> usize {
        self.0.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// `A1`, `$B$2`, `XFD1048576`: one to three letters followed by digits.
fn looks_like_cell_reference(s: &str) -> bool {
    let s = s.trim_start_matches('$');
    let letter_end = s.find(|c: char| !c.is_ascii_alphabetic());

    match letter_end {
        Some(pos) => {
            let (col_part, rest) = s.split_at(pos);
            if col_part.is_empty() || col_part.len() > 3 {
                return false;
            }
            let row_part = rest.trim_start_matches('$');
            !row_part.is_empty() && row_part.chars().all(|c| c.is_ascii_digit())
        }
        None => false,
    }
}

impl fmt::Display for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Debug for LabelName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LabelName({})", self.0)
    }
}

impl FromStr for LabelName {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for LabelName {
    type Error = ReferenceError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for LabelName {
    type Error = ReferenceError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<LabelName> for String {
    fn from(label: LabelName) -> Self {
        label.0
    }
}

impl AsRef<str> for LabelName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Borrow<str> for LabelName {
    fn borrow(&self) -> &str {
        &self.0
    }
}
