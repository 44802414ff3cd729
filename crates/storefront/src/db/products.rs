//! `PostgreSQL` product repository.
//!
//! Images and category assignments live in ordered join tables and are
//! rewritten wholesale on every insert or update.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{Postgres, Transaction};

use cartwright_core::{CategoryId, Cents, ProductId, ProductStatus, Slug};

use super::{PgStore, ProductFilter, ProductStore, RepositoryError, map_delete_error, map_write_error};
use crate::models::{Product, ProductData, ProductImage, ProductMetadata};

const PRODUCT_SELECT: &str = r"
    SELECT p.id, p.name, p.slug, p.description, p.price, p.compare_at_price,
           p.inventory, p.sku, p.status, p.featured,
           p.meta_title, p.meta_description, p.keywords,
           p.created_at, p.updated_at,
           COALESCE(
               (SELECT jsonb_agg(
                           jsonb_build_object(
                               'image', i.media_id,
                               'altText', i.alt_text,
                               'isPrimary', i.is_primary
                           ) ORDER BY i.position)
                FROM storefront.product_image i WHERE i.product_id = p.id),
               '[]'::jsonb
           ) AS images,
           COALESCE(
               (SELECT array_agg(pc.category_id ORDER BY pc.position)
                FROM storefront.product_category pc WHERE pc.product_id = p.id),
               '{}'
           ) AS categories
    FROM storefront.product p
";

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    price: Cents,
    compare_at_price: Option<Cents>,
    inventory: i32,
    sku: String,
    status: ProductStatus,
    featured: bool,
    meta_title: Option<String>,
    meta_description: Option<String>,
    keywords: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    images: Json<Vec<ProductImage>>,
    categories: Vec<i32>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            data: ProductData {
                name: row.name,
                slug: Slug::normalize(&row.slug),
                description: row.description,
                price: row.price,
                compare_at_price: row.compare_at_price,
                images: row.images.0,
                inventory: row.inventory,
                sku: row.sku,
                categories: row.categories.into_iter().map(CategoryId::new).collect(),
                status: row.status,
                featured: row.featured,
                metadata: ProductMetadata {
                    meta_title: row.meta_title,
                    meta_description: row.meta_description,
                    keywords: row.keywords,
                },
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn position(index: usize) -> i32 {
    i32::try_from(index).unwrap_or(i32::MAX)
}

async fn replace_relations(
    tx: &mut Transaction<'_, Postgres>,
    id: ProductId,
    data: &ProductData,
) -> Result<(), RepositoryError> {
    sqlx::query("DELETE FROM storefront.product_image WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;
    sqlx::query("DELETE FROM storefront.product_category WHERE product_id = $1")
        .bind(id)
        .execute(&mut **tx)
        .await?;

    for (i, image) in data.images.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO storefront.product_image
                (product_id, position, media_id, alt_text, is_primary)
            VALUES ($1, $2, $3, $4, $5)
            ",
        )
        .bind(id)
        .bind(position(i))
        .bind(image.image)
        .bind(&image.alt_text)
        .bind(image.is_primary)
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "duplicate product image"))?;
    }

    for (i, category) in data.categories.iter().enumerate() {
        sqlx::query(
            r"
            INSERT INTO storefront.product_category (product_id, category_id, position)
            VALUES ($1, $2, $3)
            ",
        )
        .bind(id)
        .bind(category)
        .bind(position(i))
        .execute(&mut **tx)
        .await
        .map_err(|e| map_write_error(e, "duplicate category assignment"))?;
    }

    Ok(())
}

impl PgStore {
    async fn fetch_product(&self, id: ProductId) -> Result<Product, RepositoryError> {
        self.find_product(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl ProductStore for PgStore {
    async fn find_product(&self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{PRODUCT_SELECT} WHERE p.id = $1"))
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(row.map(Product::from))
    }

    async fn list_products(&self, filter: ProductFilter) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(&format!(
            r"
            {PRODUCT_SELECT}
            WHERE ($1::storefront.product_status IS NULL OR p.status = $1)
              AND ($2::INTEGER IS NULL OR EXISTS (
                    SELECT 1 FROM storefront.product_category pc
                    WHERE pc.product_id = p.id AND pc.category_id = $2))
              AND ($3::BOOLEAN IS NULL OR p.featured = $3)
            ORDER BY p.created_at DESC, p.id DESC
            "
        ))
        .bind(filter.status)
        .bind(filter.category)
        .bind(filter.featured)
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn insert_product(&self, data: &ProductData) -> Result<Product, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let id: ProductId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.product
                (name, slug, description, price, compare_at_price, inventory, sku,
                 status, featured, meta_title, meta_description, keywords)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12)
            RETURNING id
            ",
        )
        .bind(&data.name)
        .bind(data.slug.as_str())
        .bind(&data.description)
        .bind(data.price)
        .bind(data.compare_at_price)
        .bind(data.inventory)
        .bind(&data.sku)
        .bind(data.status)
        .bind(data.featured)
        .bind(&data.metadata.meta_title)
        .bind(&data.metadata.meta_description)
        .bind(&data.metadata.keywords)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product name or SKU already exists"))?;

        replace_relations(&mut tx, id, data).await?;
        tx.commit().await?;

        self.fetch_product(id).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        data: &ProductData,
    ) -> Result<Product, RepositoryError> {
        let mut tx = self.pool().begin().await?;

        let result = sqlx::query(
            r"
            UPDATE storefront.product
            SET name = $2, slug = $3, description = $4, price = $5, compare_at_price = $6,
                inventory = $7, sku = $8, status = $9, featured = $10,
                meta_title = $11, meta_description = $12, keywords = $13,
                updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.slug.as_str())
        .bind(&data.description)
        .bind(data.price)
        .bind(data.compare_at_price)
        .bind(data.inventory)
        .bind(&data.sku)
        .bind(data.status)
        .bind(data.featured)
        .bind(&data.metadata.meta_title)
        .bind(&data.metadata.meta_description)
        .bind(&data.metadata.keywords)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_write_error(e, "product name or SKU already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        replace_relations(&mut tx, id, data).await?;
        tx.commit().await?;

        self.fetch_product(id).await
    }

    async fn set_inventory(&self, id: ProductId, inventory: i32) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            "UPDATE storefront.product SET inventory = $2, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(inventory)
        .execute(self.pool())
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn delete_product(&self, id: ProductId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.product WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_delete_error(e, "product"))?;

        Ok(result.rows_affected() > 0)
    }
}
