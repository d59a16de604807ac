//! Name filter used to search the category tree
//!
//! A filter keeps the raw text the operator typed (cache ids embed it
//! verbatim) and derives two matchers from it: a case-insensitive
//! "contains" test for in-process sources, and an escaped SQL `LIKE`
//! pattern for SQL-backed sources.

use serde::{Deserialize, Serialize};

/// Free-text category name filter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct NameFilter {
    raw: String,
    folded: String,
}

impl NameFilter {
    /// Create a filter from raw input. `None` and `""` both mean "match everything".
    pub fn new(raw: Option<&str>) -> Self {
        let raw = raw.unwrap_or_default().to_string();
        let folded = raw.to_lowercase();
        Self { raw, folded }
    }

    /// The filter that matches every name.
    pub fn any() -> Self {
        Self::default()
    }

    /// The text exactly as supplied.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Case-insensitive substring match at any position.
    pub fn matches(&self, name: &str) -> bool {
        if self.is_empty() {
            return true;
        }
        name.to_lowercase().contains(&self.folded)
    }

    /// `LIKE` pattern matching the filter at any position, with `\`, `%` and
    /// `_` escaped by a backslash. Returns `None` for the empty filter, which
    /// must not constrain the query at all.
    pub fn like_pattern(&self) -> Option<String> {
        if self.is_empty() {
            return None;
        }
        let mut pattern = String::with_capacity(self.raw.len() + 2);
        pattern.push('%');
        for ch in self.raw.chars() {
            if matches!(ch, '\\' | '%' | '_') {
                pattern.push('\\');
            }
            pattern.push(ch);
        }
        pattern.push('%');
        Some(pattern)
    }
}

impl From<&str> for NameFilter {
    fn from(raw: &str) -> Self {
        Self::new(Some(raw))
    }
}

impl From<String> for NameFilter {
    fn from(raw: String) -> Self {
        Self::new(Some(&raw))
    }
}

impl From<NameFilter> for String {
    fn from(filter: NameFilter) -> Self {
        filter.raw
    }
}

impl From<Option<&str>> for NameFilter {
    fn from(raw: Option<&str>) -> Self {
        Self::new(raw)
    }
}
