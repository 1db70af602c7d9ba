//! URL slugs for movies, categories and genres

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::{Error, Result};

/// Maximum slug length in characters
pub const MAX_SLUG_LEN: usize = 160;

/// A validated URL segment: ASCII letters, digits, `-` and `_`
///
/// Deserializes through [`Slug::parse`], so request bodies carrying a bad slug
/// are rejected at extraction time.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Slug(String);

impl Slug {
    /// Validate and wrap a slug
    ///
    /// # Examples
    /// ```
    /// use cinema_common::Slug;
    ///
    /// assert!(Slug::parse("inception").is_ok());
    /// assert!(Slug::parse("the-dark_knight-2008").is_ok());
    /// assert!(Slug::parse("no spaces").is_err());
    /// assert!(Slug::parse("").is_err());
    /// ```
    pub fn parse(value: impl Into<String>) -> Result<Self> {
        let value = value.into();
        if value.is_empty() {
            return Err(Error::InvalidInput("slug must not be empty".to_string()));
        }
        if value.len() > MAX_SLUG_LEN {
            return Err(Error::InvalidInput(format!(
                "slug longer than {} characters",
                MAX_SLUG_LEN
            )));
        }
        if let Some(bad) = value
            .chars()
            .find(|c| !(c.is_ascii_alphanumeric() || *c == '-' || *c == '_'))
        {
            return Err(Error::InvalidInput(format!(
                "slug contains invalid character {:?}",
                bad
            )));
        }
        Ok(Self(value))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Slug {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Slug::parse(value)
    }
}

impl From<Slug> for String {
    fn from(slug: Slug) -> Self {
        slug.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_length_limit() {
        assert!(Slug::parse("a".repeat(MAX_SLUG_LEN)).is_ok());
        assert!(Slug::parse("a".repeat(MAX_SLUG_LEN + 1)).is_err());
    }

    #[test]
    fn test_rejects_url_reserved_characters() {
        for bad in ["a/b", "a?b", "a#b", "кино", "a.b"] {
            assert!(Slug::parse(bad).is_err(), "{} should be rejected", bad);
        }
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: std::result::Result<Slug, _> = serde_json::from_str("\"drama\"");
        assert_eq!(ok.unwrap().as_str(), "drama");

        let bad: std::result::Result<Slug, _> = serde_json::from_str("\"bad slug\"");
        assert!(bad.is_err());
    }
}
