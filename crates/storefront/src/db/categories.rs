//! `PostgreSQL` category repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cartwright_core::{CategoryId, MediaId, ProductId, Slug};

use super::{CategoryStore, PgStore, RepositoryError, map_delete_error, map_write_error};
use crate::models::{Category, CategoryData, CategoryMetadata};

const CATEGORY_SELECT: &str = r"
    SELECT c.id, c.name, c.slug, c.description, c.parent_id, c.image_id, c.featured,
           c.meta_title, c.meta_description, c.created_at, c.updated_at,
           COALESCE(
               (SELECT array_agg(pc.product_id ORDER BY pc.product_id)
                FROM storefront.product_category pc WHERE pc.category_id = c.id),
               '{}'
           ) AS products
    FROM storefront.category c
";

#[derive(Debug, sqlx::FromRow)]
struct CategoryRow {
    id: i32,
    name: String,
    slug: String,
    description: Option<String>,
    parent_id: Option<i32>,
    image_id: Option<i32>,
    featured: bool,
    meta_title: Option<String>,
    meta_description: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    products: Vec<i32>,
}

impl From<CategoryRow> for Category {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: CategoryId::new(row.id),
            data: CategoryData {
                name: row.name,
                slug: Slug::normalize(&row.slug),
                description: row.description,
                parent: row.parent_id.map(CategoryId::new),
                image: row.image_id.map(MediaId::new),
                featured: row.featured,
                metadata: CategoryMetadata {
                    meta_title: row.meta_title,
                    meta_description: row.meta_description,
                },
            },
            products: row.products.into_iter().map(ProductId::new).collect(),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PgStore {
    async fn fetch_category(&self, id: CategoryId) -> Result<Category, RepositoryError> {
        self.find_category(id).await?.ok_or(RepositoryError::NotFound)
    }
}

#[async_trait]
impl CategoryStore for PgStore {
    async fn find_category(&self, id: CategoryId) -> Result<Option<Category>, RepositoryError> {
        let row =
            sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} WHERE c.id = $1"))
                .bind(id)
                .fetch_optional(self.pool())
                .await?;

        Ok(row.map(Category::from))
    }

    async fn list_categories(&self) -> Result<Vec<Category>, RepositoryError> {
        let rows = sqlx::query_as::<_, CategoryRow>(&format!("{CATEGORY_SELECT} ORDER BY c.name"))
            .fetch_all(self.pool())
            .await?;

        Ok(rows.into_iter().map(Category::from).collect())
    }

    async fn insert_category(&self, data: &CategoryData) -> Result<Category, RepositoryError> {
        let id: CategoryId = sqlx::query_scalar(
            r"
            INSERT INTO storefront.category
                (name, slug, description, parent_id, image_id, featured,
                 meta_title, meta_description)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            ",
        )
        .bind(&data.name)
        .bind(data.slug.as_str())
        .bind(&data.description)
        .bind(data.parent)
        .bind(data.image)
        .bind(data.featured)
        .bind(&data.metadata.meta_title)
        .bind(&data.metadata.meta_description)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "category name already exists"))?;

        self.fetch_category(id).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        data: &CategoryData,
    ) -> Result<Category, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE storefront.category
            SET name = $2, slug = $3, description = $4, parent_id = $5, image_id = $6,
                featured = $7, meta_title = $8, meta_description = $9, updated_at = NOW()
            WHERE id = $1
            ",
        )
        .bind(id)
        .bind(&data.name)
        .bind(data.slug.as_str())
        .bind(&data.description)
        .bind(data.parent)
        .bind(data.image)
        .bind(data.featured)
        .bind(&data.metadata.meta_title)
        .bind(&data.metadata.meta_description)
        .execute(self.pool())
        .await
        .map_err(|e| map_write_error(e, "category name already exists"))?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        self.fetch_category(id).await
    }

    async fn delete_category(&self, id: CategoryId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.category WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await
            .map_err(|e| map_delete_error(e, "category"))?;

        Ok(result.rows_affected() > 0)
    }
}
