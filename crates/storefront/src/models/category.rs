//! Product categories.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::{CategoryId, MediaId, ProductId, Slug};

use super::{non_blank, nullable};
use crate::validation::ValidationErrors;

/// SEO fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CategoryMetadata {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
}

/// Writable category fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryData {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub parent: Option<CategoryId>,
    pub image: Option<MediaId>,
    pub featured: bool,
    pub metadata: CategoryMetadata,
}

/// A stored category as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: CategoryId,
    #[serde(flatten)]
    pub data: CategoryData,
    /// Products assigned to this category. Derived from each product's
    /// `categories`; not writable here.
    pub products: Vec<ProductId>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or update body for categories. `products` is ignored if sent.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub parent: Option<Option<CategoryId>>,
    #[serde(default, deserialize_with = "nullable")]
    pub image: Option<Option<MediaId>>,
    pub featured: Option<bool>,
    pub metadata: Option<CategoryMetadata>,
}

/// Working copy of a category while a write is in flight.
#[derive(Debug, Clone, Default)]
pub struct CategoryDraft {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent: Option<CategoryId>,
    pub image: Option<MediaId>,
    pub featured: bool,
    pub metadata: CategoryMetadata,
}

impl From<CategoryData> for CategoryDraft {
    fn from(data: CategoryData) -> Self {
        Self {
            name: Some(data.name),
            slug: Some(data.slug.into_inner()),
            description: data.description,
            parent: data.parent,
            image: data.image,
            featured: data.featured,
            metadata: data.metadata,
        }
    }
}

impl CategoryDraft {
    /// Overlay the fields present in `patch`.
    pub fn apply(&mut self, patch: CategoryPatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(slug) = patch.slug {
            self.slug = Some(slug);
        }
        if let Some(description) = patch.description {
            self.description = non_blank(description);
        }
        if let Some(parent) = patch.parent {
            self.parent = parent;
        }
        if let Some(image) = patch.image {
            self.image = image;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = metadata;
        }
    }

    /// Check field rules. `own_id` is `None` when creating.
    ///
    /// # Errors
    ///
    /// Returns every failed rule.
    pub fn validate(self, own_id: Option<CategoryId>) -> Result<CategoryData, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = errors.require_text("name", self.name);
        let slug = self
            .slug
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(Slug::normalize)
            .or_else(|| name.as_deref().map(Slug::from_name));
        if slug.as_ref().is_some_and(Slug::is_empty) {
            errors.push("slug", "Slug must contain at least one letter or digit.");
        }

        if let Some(parent) = self.parent
            && !parent_filter(own_id).allows(parent)
        {
            errors.push("parent", "A category cannot be its own parent.");
        }

        match (name, slug) {
            (Some(name), Some(slug)) if errors.is_empty() => Ok(CategoryData {
                name,
                slug,
                description: self.description,
                parent: self.parent,
                image: self.image,
                featured: self.featured,
                metadata: self.metadata,
            }),
            _ => Err(errors),
        }
    }
}

/// Constraint on which categories may be chosen as a parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParentFilter {
    /// No category is known yet, so anything goes.
    Any,
    /// Anything except this category.
    NotEqual(CategoryId),
}

impl ParentFilter {
    #[must_use]
    pub fn allows(self, candidate: CategoryId) -> bool {
        match self {
            Self::Any => true,
            Self::NotEqual(own) => candidate != own,
        }
    }
}

/// The selectable-parent constraint for the category `id`.
#[must_use]
pub const fn parent_filter(id: Option<CategoryId>) -> ParentFilter {
    match id {
        Some(id) => ParentFilter::NotEqual(id),
        None => ParentFilter::Any,
    }
}
