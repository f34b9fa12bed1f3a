//! Filter value objects and their canonical tokens.
//!
//! A [`Filter`] names an annotation, a value, and a matching mode. Two
//! filters are the same filter iff their canonical tokens are equal:
//! equality, hashing, and every cache keyed by a filter set go through
//! [`Filter::canonical_token`], never through object identity.

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a filter value is matched against a file's annotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FilterMode {
    /// The annotation value must equal the filter value exactly.
    Equals,
    /// The annotation value must contain the filter value (fuzzy match).
    Contains,
    /// The annotation must carry some non-null value; the filter value is ignored.
    AnyValue,
    /// The annotation must carry no value; the filter value is ignored.
    NoValue,
}

/// A single named filter against the remote catalog.
///
/// Filters are immutable value objects. Values are JSON scalars (strings,
/// numbers, booleans) matching whatever the annotation stores.
///
/// # Example
///
/// ```
/// use horizon_catalog_core::Filter;
///
/// let a = Filter::equals("Cell Line", "AICS-0".into());
/// let b = Filter::equals("Cell Line", "AICS-0".into());
/// assert_eq!(a, b);
/// assert_ne!(a.canonical_token(), Filter::contains("Cell Line", "AICS-0".into()).canonical_token());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Filter {
    name: String,
    value: Value,
    mode: FilterMode,
}

impl Filter {
    /// Creates an exact-equality filter.
    pub fn equals(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            mode: FilterMode::Equals,
        }
    }

    /// Creates a fuzzy (contains) filter.
    pub fn contains(name: impl Into<String>, value: Value) -> Self {
        Self {
            name: name.into(),
            value,
            mode: FilterMode::Contains,
        }
    }

    /// Creates a filter matching files that carry any non-null value for
    /// the annotation.
    pub fn any_value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
            mode: FilterMode::AnyValue,
        }
    }

    /// Creates a filter matching files that carry no value for the
    /// annotation.
    pub fn no_value(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: Value::Null,
            mode: FilterMode::NoValue,
        }
    }

    /// The annotation name this filter applies to.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The filter value. Null for [`FilterMode::AnyValue`] and
    /// [`FilterMode::NoValue`].
    pub fn value(&self) -> &Value {
        &self.value
    }

    /// The matching mode.
    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    /// Renders the stable token used for equality, hashing, and cache keys.
    ///
    /// The four modes render distinguishably: JSON values always quote
    /// strings, so the bare `*` and `!` markers cannot collide with an
    /// equality filter on those characters.
    pub fn canonical_token(&self) -> String {
        match self.mode {
            FilterMode::Equals => format!("{}={}", self.name, self.value),
            FilterMode::Contains => format!("{}~{}", self.name, self.value),
            FilterMode::AnyValue => format!("{}=*", self.name),
            FilterMode::NoValue => format!("{}=!", self.name),
        }
    }
}

impl PartialEq for Filter {
    fn eq(&self, other: &Self) -> bool {
        self.canonical_token() == other.canonical_token()
    }
}

impl Eq for Filter {}

impl Hash for Filter {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical_token().hash(state);
    }
}

impl fmt::Display for Filter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical_token())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_equality_is_by_canonical_fields() {
        let a = Filter::equals("Gene", json!("LMNB1"));
        let b = Filter::equals("Gene", json!("LMNB1"));
        assert_eq!(a, b);
        assert_ne!(a, Filter::equals("Gene", json!("TOMM20")));
        assert_ne!(a, Filter::equals("Protein", json!("LMNB1")));
    }

    #[test]
    fn test_modes_render_distinguishable_tokens() {
        let tokens = [
            Filter::equals("Gene", json!("*")).canonical_token(),
            Filter::contains("Gene", json!("*")).canonical_token(),
            Filter::any_value("Gene").canonical_token(),
            Filter::no_value("Gene").canonical_token(),
        ];
        for (i, a) in tokens.iter().enumerate() {
            for b in tokens.iter().skip(i + 1) {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn test_token_is_stable_across_value_types() {
        assert_eq!(
            Filter::equals("Plate", json!(3500001)).canonical_token(),
            "Plate=3500001"
        );
        assert_eq!(
            Filter::equals("Is Split Scene", json!(false)).canonical_token(),
            "Is Split Scene=false"
        );
        assert_eq!(
            Filter::equals("Gene", json!("LMNB1")).canonical_token(),
            "Gene=\"LMNB1\""
        );
    }

    #[test]
    fn test_hash_matches_equality() {
        use std::collections::HashSet;

        let mut set = HashSet::new();
        set.insert(Filter::equals("Gene", json!("LMNB1")));
        assert!(set.contains(&Filter::equals("Gene", json!("LMNB1"))));
        assert!(!set.contains(&Filter::contains("Gene", json!("LMNB1"))));
    }
}
