/// How label names are compared when looked up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum CaseSensitivity {
    /// `Total` and `TOTAL` are different labels.
    Sensitive,
    /// `Total` and `TOTAL` name the same entry.
    #[default]
    Insensitive,
}

impl CaseSensitivity {
    /// Lookup key for `name` under this policy.
    pub fn key(self, name: &str) -> String {
        match self {
            CaseSensitivity::Sensitive => name.to_owned(),
            CaseSensitivity::Insensitive => name.to_lowercase(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexConfig {
    pub label_case: CaseSensitivity,
    /// Upper bound on label-to-label lookups during one resolution.
    /// `None` walks chains without a bound, so a cyclic mapping never ends.
    pub max_label_chain: Option<usize>,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            label_case: CaseSensitivity::Insensitive,
            max_label_chain: None,
        }
    }
}

impl IndexConfig {
    pub fn case_sensitive() -> Self {
        Self {
            label_case: CaseSensitivity::Sensitive,
            ..Default::default()
        }
    }

    pub fn with_max_label_chain(mut self, limit: usize) -> Self {
        self.max_label_chain = Some(limit);
        self
    }
}
