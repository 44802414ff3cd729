//! Catalog products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::{CategoryId, Cents, MediaId, ProductId, ProductStatus, Slug};

use super::customer::dedup;
use super::{non_blank, nullable};
use crate::validation::ValidationErrors;

/// Minimum SKU length.
pub const MIN_SKU_LENGTH: usize = 3;

/// An image attached to a product, in display order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductImage {
    pub image: MediaId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alt_text: Option<String>,
    #[serde(default)]
    pub is_primary: bool,
}

/// SEO fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductMetadata {
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub keywords: Option<String>,
}

/// Writable product fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductData {
    pub name: String,
    pub slug: Slug,
    pub description: Option<String>,
    pub price: Cents,
    pub compare_at_price: Option<Cents>,
    pub images: Vec<ProductImage>,
    pub inventory: i32,
    pub sku: String,
    pub categories: Vec<CategoryId>,
    pub status: ProductStatus,
    pub featured: bool,
    pub metadata: ProductMetadata,
}

/// A stored product as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    #[serde(flatten)]
    pub data: ProductData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Create or update body for products.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPatch {
    pub name: Option<String>,
    pub slug: Option<String>,
    #[serde(default, deserialize_with = "nullable")]
    pub description: Option<Option<String>>,
    pub price: Option<Cents>,
    #[serde(default, deserialize_with = "nullable")]
    pub compare_at_price: Option<Option<Cents>>,
    pub images: Option<Vec<ProductImage>>,
    pub inventory: Option<i32>,
    pub sku: Option<String>,
    pub categories: Option<Vec<CategoryId>>,
    pub status: Option<ProductStatus>,
    pub featured: Option<bool>,
    pub metadata: Option<ProductMetadata>,
}

/// Working copy of a product while a write is in flight.
#[derive(Debug, Clone, Default)]
pub struct ProductDraft {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<String>,
    pub price: Option<Cents>,
    pub compare_at_price: Option<Cents>,
    pub images: Vec<ProductImage>,
    pub inventory: Option<i32>,
    pub sku: Option<String>,
    pub categories: Vec<CategoryId>,
    pub status: ProductStatus,
    pub featured: bool,
    pub metadata: ProductMetadata,
}

impl From<ProductData> for ProductDraft {
    fn from(data: ProductData) -> Self {
        Self {
            name: Some(data.name),
            slug: Some(data.slug.into_inner()),
            description: data.description,
            price: Some(data.price),
            compare_at_price: data.compare_at_price,
            images: data.images,
            inventory: Some(data.inventory),
            sku: Some(data.sku),
            categories: data.categories,
            status: data.status,
            featured: data.featured,
            metadata: data.metadata,
        }
    }
}

impl ProductDraft {
    /// Overlay the fields present in `patch`.
    pub fn apply(&mut self, patch: ProductPatch) {
        if let Some(name) = patch.name {
            self.name = Some(name);
        }
        if let Some(slug) = patch.slug {
            self.slug = Some(slug);
        }
        if let Some(description) = patch.description {
            self.description = non_blank(description);
        }
        if let Some(price) = patch.price {
            self.price = Some(price);
        }
        if let Some(compare_at_price) = patch.compare_at_price {
            self.compare_at_price = compare_at_price;
        }
        if let Some(images) = patch.images {
            self.images = images;
        }
        if let Some(inventory) = patch.inventory {
            self.inventory = Some(inventory);
        }
        if let Some(sku) = patch.sku {
            self.sku = Some(sku);
        }
        if let Some(categories) = patch.categories {
            self.categories = dedup(categories);
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(featured) = patch.featured {
            self.featured = featured;
        }
        if let Some(metadata) = patch.metadata {
            self.metadata = metadata;
        }
    }

    /// Check every field rule and produce the record to store.
    ///
    /// # Errors
    ///
    /// Returns every failed rule.
    pub fn validate(self) -> Result<ProductData, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let name = errors.require_text("name", self.name);

        // An explicit slug wins; otherwise derive one from the name
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

        let price = errors.require("price", self.price);
        if let Some(price) = price
            && price.ensure_non_negative().is_err()
        {
            errors.push("price", "Price cannot be negative.");
        }
        if let Some(compare_at) = self.compare_at_price
            && compare_at.ensure_non_negative().is_err()
        {
            errors.push("compareAtPrice", "Compare-at price cannot be negative.");
        }

        let inventory = errors.require("inventory", self.inventory);
        if inventory.is_some_and(|n| n < 0) {
            errors.push("inventory", "Inventory cannot be negative.");
        }

        let sku = errors.require_text("sku", self.sku);
        if sku
            .as_deref()
            .is_some_and(|s| s.chars().count() < MIN_SKU_LENGTH)
        {
            errors.push(
                "sku",
                format!("SKU must be at least {MIN_SKU_LENGTH} characters."),
            );
        }

        if self.images.iter().filter(|i| i.is_primary).count() > 1 {
            errors.push("images", "Only one image can be primary.");
        }

        match (name, slug, price, inventory, sku) {
            (Some(name), Some(slug), Some(price), Some(inventory), Some(sku)) if errors.is_empty() => {
                Ok(ProductData {
                    name,
                    slug,
                    description: self.description,
                    price,
                    compare_at_price: self.compare_at_price,
                    images: self.images,
                    inventory,
                    sku,
                    categories: self.categories,
                    status: self.status,
                    featured: self.featured,
                    metadata: self.metadata,
                })
            }
            _ => Err(errors),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn mug() -> ProductPatch {
        serde_json::from_value(serde_json::json!({
            "name": "Enamel Camp Mug",
            "price": 1899,
            "inventory": 40,
            "sku": "MUG-001"
        }))
        .unwrap()
    }

    #[test]
    fn test_create_defaults() {
        let mut draft = ProductDraft::default();
        draft.apply(mug());
        let data = draft.validate().unwrap();

        assert_eq!(data.slug.as_str(), "enamel-camp-mug");
        assert_eq!(data.status, ProductStatus::Draft);
        assert!(!data.featured);
        assert!(data.images.is_empty());
    }

    #[test]
    fn test_missing_required_fields() {
        let errors = ProductDraft::default().validate().unwrap_err();
        assert_eq!(errors.fields(), vec!["name", "price", "inventory", "sku"]);
    }

    #[test]
    fn test_value_rules() {
        let mut draft = ProductDraft::default();
        draft.apply(mug());
        draft.apply(
            serde_json::from_value(serde_json::json!({
                "price": -1,
                "compareAtPrice": -5,
                "inventory": -2,
                "sku": "AB"
            }))
            .unwrap(),
        );
        let errors = draft.validate().unwrap_err();
        assert_eq!(
            errors.fields(),
            vec!["price", "compareAtPrice", "inventory", "sku"]
        );
    }

    #[test]
    fn test_rename_keeps_slug() {
        let mut draft = ProductDraft::default();
        draft.apply(mug());
        let stored = draft.validate().unwrap();

        let mut draft = ProductDraft::from(stored);
        draft.apply(ProductPatch {
            name: Some("Steel Camp Mug".to_owned()),
            ..ProductPatch::default()
        });
        let updated = draft.validate().unwrap();
        assert_eq!(updated.name, "Steel Camp Mug");
        assert_eq!(updated.slug.as_str(), "enamel-camp-mug");
    }

    #[test]
    fn test_explicit_slug_is_normalized() {
        let mut draft = ProductDraft::default();
        draft.apply(mug());
        draft.apply(ProductPatch {
            slug: Some("Best Mug EVER".to_owned()),
            ..ProductPatch::default()
        });
        assert_eq!(draft.validate().unwrap().slug.as_str(), "best-mug-ever");
    }

    #[test]
    fn test_null_clears_compare_at_price() {
        let mut draft = ProductDraft::default();
        draft.apply(mug());
        draft.compare_at_price = Some(Cents::new(2499));
        draft.apply(serde_json::from_str(r#"{"compareAtPrice":null}"#).unwrap());
        assert_eq!(draft.compare_at_price, None);
    }
}
