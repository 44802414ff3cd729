//! URL slugs for products and categories.

use core::fmt;

use serde::{Deserialize, Serialize};

/// A lowercase, hyphen-separated URL segment.
///
/// ```
/// use cartwright_core::Slug;
///
/// let slug = Slug::from_name("Cast Iron Skillet (12\")");
/// assert_eq!(slug.as_str(), "cast-iron-skillet-12");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Derive a slug from a display name.
    ///
    /// ASCII alphanumerics are kept (lowercased), every other run of
    /// characters collapses into a single `-`, and leading or trailing
    /// hyphens are dropped. A name with no alphanumerics yields an empty slug.
    #[must_use]
    pub fn from_name(name: &str) -> Self {
        let mut slug = String::with_capacity(name.len());
        let mut pending_dash = false;

        for c in name.chars() {
            if c.is_ascii_alphanumeric() {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                pending_dash = false;
                slug.push(c.to_ascii_lowercase());
            } else {
                pending_dash = true;
            }
        }

        Self(slug)
    }

    /// Normalize a caller-supplied slug with the same rules as [`Slug::from_name`].
    #[must_use]
    pub fn normalize(raw: &str) -> Self {
        Self::from_name(raw)
    }

    /// Returns the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the slug has no characters.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consumes the slug and returns its inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_collapses_separators() {
        assert_eq!(Slug::from_name("  Kitchen & Dining  ").as_str(), "kitchen-dining");
        assert_eq!(Slug::from_name("Mugs--Cups").as_str(), "mugs-cups");
    }

    #[test]
    fn test_from_name_drops_non_ascii() {
        assert_eq!(Slug::from_name("Crème Brûlée Set").as_str(), "cr-me-br-l-e-set");
    }

    #[test]
    fn test_empty_name() {
        assert!(Slug::from_name("!!!").is_empty());
    }

    #[test]
    fn test_normalize_is_idempotent() {
        let once = Slug::normalize("Summer Sale 2025");
        assert_eq!(Slug::normalize(once.as_str()), once);
    }
}
