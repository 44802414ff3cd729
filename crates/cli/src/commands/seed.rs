//! Seed the catalog from a YAML file.
//!
//! Records go through the same catalog service as the API, so slugs,
//! validation and the inventory default apply. Seeding is re-runnable:
//! categories that already exist (by name) and products whose SKU is
//! already taken are skipped.
//!
//! # File format
//!
//! ```yaml
//! categories:
//!   - name: Kitchen
//!     featured: true
//!   - name: Mugs
//!     parent: Kitchen        # must appear earlier in the list
//! products:
//!   - name: Enamel Mug
//!     price: 1800            # cents
//!     sku: MUG-001
//!     inventory: 12
//!     status: published
//!     categories: [Mugs]
//! ```

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use cartwright_core::{CategoryId, Cents, Principal, ProductStatus};
use cartwright_storefront::db::{PgStore, ProductFilter, Store};
use cartwright_storefront::models::{CategoryPatch, ProductPatch};
use cartwright_storefront::services::CollectionError;
use cartwright_storefront::services::catalog::CatalogService;

use super::{ConnectError, connect};

/// The CLI writes the catalog as a back-office principal.
const SEEDER: Principal = Principal::admin(0);

#[derive(Debug, Error)]
pub enum SeedError {
    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid seed file: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("{record}: unknown category {name:?}")]
    UnknownCategory { record: String, name: String },

    #[error("{record}: {source}")]
    Collection {
        record: String,
        source: CollectionError,
    },

    #[error(transparent)]
    Connect(#[from] ConnectError),
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct CatalogSeed {
    pub categories: Vec<CategorySeed>,
    pub products: Vec<ProductSeed>,
}

#[derive(Debug, Deserialize)]
pub struct CategorySeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    /// Name of a category listed earlier or already stored.
    #[serde(default)]
    pub parent: Option<String>,
    #[serde(default)]
    pub featured: bool,
}

#[derive(Debug, Deserialize)]
pub struct ProductSeed {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub sku: String,
    #[serde(default)]
    pub inventory: Option<i32>,
    #[serde(default)]
    pub status: ProductStatus,
    #[serde(default)]
    pub featured: bool,
    /// Category names.
    #[serde(default)]
    pub categories: Vec<String>,
}

/// What a seeding run did.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    pub products_created: usize,
    pub skipped: usize,
}

/// `cw-cli seed catalog <file>`
pub async fn catalog(file_path: &str) -> Result<(), SeedError> {
    let path = Path::new(file_path);
    if !path.exists() {
        return Err(SeedError::FileNotFound(file_path.to_owned()));
    }

    info!(path = %file_path, "Loading catalog seed");
    let content = tokio::fs::read_to_string(path).await?;
    let seed: CatalogSeed = serde_yaml::from_str(&content)?;
    info!(
        categories = seed.categories.len(),
        products = seed.products.len(),
        "Parsed seed file"
    );

    let store = PgStore::new(connect().await?);
    let report = apply(&store, seed).await?;

    info!(
        categories_created = report.categories_created,
        products_created = report.products_created,
        skipped = report.skipped,
        "Catalog seeding complete"
    );
    Ok(())
}

/// Write `seed` into `store`.
pub async fn apply(store: &dyn Store, seed: CatalogSeed) -> Result<SeedReport, SeedError> {
    let catalog = CatalogService::new(store);
    let mut report = SeedReport::default();

    let mut by_name: HashMap<String, CategoryId> = catalog
        .categories()
        .await
        .map_err(|source| SeedError::Collection {
            record: "categories".to_owned(),
            source,
        })?
        .into_iter()
        .map(|c| (c.data.name, c.id))
        .collect();

    for category in seed.categories {
        if by_name.contains_key(&category.name) {
            report.skipped += 1;
            continue;
        }
        let parent = category
            .parent
            .map(|name| lookup(&by_name, &category.name, name))
            .transpose()?;

        let created = catalog
            .create_category(
                Some(&SEEDER),
                CategoryPatch {
                    name: Some(category.name.clone()),
                    description: Some(category.description),
                    parent: Some(parent),
                    featured: Some(category.featured),
                    ..CategoryPatch::default()
                },
            )
            .await
            .map_err(|source| SeedError::Collection {
                record: format!("category {:?}", category.name),
                source,
            })?;
        by_name.insert(category.name, created.id);
        report.categories_created += 1;
    }

    let existing_skus: Vec<String> = catalog
        .products(ProductFilter::default())
        .await
        .map_err(|source| SeedError::Collection {
            record: "products".to_owned(),
            source,
        })?
        .into_iter()
        .map(|p| p.data.sku)
        .collect();

    for product in seed.products {
        if existing_skus.contains(&product.sku) {
            report.skipped += 1;
            continue;
        }
        let categories = product
            .categories
            .into_iter()
            .map(|name| lookup(&by_name, &product.name, name))
            .collect::<Result<Vec<_>, _>>()?;

        catalog
            .create_product(
                Some(&SEEDER),
                ProductPatch {
                    name: Some(product.name.clone()),
                    description: Some(product.description),
                    price: Some(Cents::new(product.price)),
                    inventory: product.inventory,
                    sku: Some(product.sku),
                    categories: Some(categories),
                    status: Some(product.status),
                    featured: Some(product.featured),
                    ..ProductPatch::default()
                },
            )
            .await
            .map_err(|source| SeedError::Collection {
                record: format!("product {:?}", product.name),
                source,
            })?;
        report.products_created += 1;
    }

    Ok(report)
}

fn lookup(
    by_name: &HashMap<String, CategoryId>,
    record: &str,
    name: String,
) -> Result<CategoryId, SeedError> {
    by_name
        .get(&name)
        .copied()
        .ok_or_else(|| SeedError::UnknownCategory {
            record: record.to_owned(),
            name,
        })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cartwright_storefront::db::{MemoryStore, ProductStore};

    use super::*;

    const SEED: &str = r"
categories:
  - name: Kitchen
    featured: true
  - name: Mugs
    parent: Kitchen
products:
  - name: Enamel Mug
    price: 1800
    sku: MUG-001
    status: published
    categories: [Mugs]
  - name: Steel Kettle
    price: 4500
    sku: KET-001
    inventory: 3
";

    #[tokio::test]
    async fn test_seed_creates_catalog() {
        let store = MemoryStore::new();
        let report = apply(&store, serde_yaml::from_str(SEED).unwrap())
            .await
            .unwrap();
        assert_eq!(
            report,
            SeedReport {
                categories_created: 2,
                products_created: 2,
                skipped: 0,
            }
        );

        let products = store.list_products(ProductFilter::default()).await.unwrap();
        let mug = products.iter().find(|p| p.data.sku == "MUG-001").unwrap();
        assert_eq!(mug.data.inventory, 0);
        assert_eq!(mug.data.status, ProductStatus::Published);
        assert_eq!(mug.data.categories.len(), 1);
    }

    #[tokio::test]
    async fn test_seed_is_rerunnable() {
        let store = MemoryStore::new();
        apply(&store, serde_yaml::from_str(SEED).unwrap())
            .await
            .unwrap();
        let report = apply(&store, serde_yaml::from_str(SEED).unwrap())
            .await
            .unwrap();
        assert_eq!(report.skipped, 4);
        assert_eq!(report.products_created, 0);
    }

    #[tokio::test]
    async fn test_unknown_category_is_reported() {
        let store = MemoryStore::new();
        let seed: CatalogSeed = serde_yaml::from_str(
            "products:\n  - {name: Mug, price: 100, sku: MUG-9, categories: [Nope]}\n",
        )
        .unwrap();
        let err = apply(&store, seed).await.unwrap_err();
        assert_eq!(err.to_string(), "Mug: unknown category \"Nope\"");
    }
}
