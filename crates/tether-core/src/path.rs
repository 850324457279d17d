#![forbid(unsafe_code)]

//! Dotted property paths (`name`, `address.city`).

use std::fmt;
use std::str::FromStr;

use crate::error::{BindError, Result};

/// A parsed, non-empty property path.
///
/// Segments are trimmed; an empty path or an empty segment (`a..b`, `.a`)
/// is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropertyPath {
    raw: String,
    segments: Vec<String>,
}

impl PropertyPath {
    /// Parse `raw` into its segments.
    ///
    /// # Errors
    ///
    /// [`BindError::InvalidPath`] for empty paths or empty segments.
    pub fn parse(raw: &str) -> Result<Self> {
        let segments: Vec<String> = raw.split('.').map(|s| s.trim().to_owned()).collect();
        if segments.iter().any(String::is_empty) {
            return Err(BindError::InvalidPath {
                path: raw.to_owned(),
            });
        }
        Ok(Self {
            raw: segments.join("."),
            segments,
        })
    }

    #[must_use]
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The last segment: the property that is actually read or written.
    #[must_use]
    pub fn leaf(&self) -> &str {
        // parse() guarantees at least one segment.
        self.segments.last().map_or("", String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.len()
    }

    /// Always false; kept for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether the path walks through intermediate objects.
    #[must_use]
    pub fn is_chained(&self) -> bool {
        self.segments.len() > 1
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.raw
    }
}

impl FromStr for PropertyPath {
    type Err = BindError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for PropertyPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn simple_name() {
        let p = PropertyPath::parse("name").unwrap();
        assert_eq!(p.segments(), ["name"]);
        assert_eq!(p.leaf(), "name");
        assert!(!p.is_chained());
    }

    #[test]
    fn dotted_chain() {
        let p: PropertyPath = "address . city".parse().unwrap();
        assert_eq!(p.segments(), ["address", "city"]);
        assert_eq!(p.as_str(), "address.city");
        assert_eq!(p.leaf(), "city");
        assert!(p.is_chained());
    }

    #[test]
    fn rejects_empty_segments() {
        for raw in ["", ".", "a.", ".a", "a..b", "  "] {
            assert!(
                matches!(PropertyPath::parse(raw), Err(BindError::InvalidPath { .. })),
                "{raw:?} should be rejected"
            );
        }
    }

    proptest! {
        #[test]
        fn joined_segments_parse_back(segments in proptest::collection::vec("[a-zA-Z_][a-zA-Z0-9_]{0,6}", 1..5)) {
            let raw = segments.join(".");
            let path = PropertyPath::parse(&raw).unwrap();
            prop_assert_eq!(path.segments(), segments.as_slice());
            prop_assert_eq!(path.as_str(), raw.as_str());
            prop_assert_eq!(path.is_chained(), segments.len() > 1);
        }
    }
}
