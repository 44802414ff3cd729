//! `PostgreSQL` media repository.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use cartwright_core::MediaId;

use super::{MediaStore, PgStore, RepositoryError, map_write_error};
use crate::models::{Media, MediaData};

#[derive(Debug, sqlx::FromRow)]
struct MediaRow {
    id: i32,
    filename: String,
    mime_type: String,
    filesize: i64,
    url: String,
    alt_text: Option<String>,
    caption: Option<String>,
    width: Option<i32>,
    height: Option<i32>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<MediaRow> for Media {
    fn from(row: MediaRow) -> Self {
        Self {
            id: MediaId::new(row.id),
            data: MediaData {
                filename: row.filename,
                mime_type: row.mime_type,
                filesize: row.filesize,
                url: row.url,
                alt_text: row.alt_text,
                caption: row.caption,
                width: row.width,
                height: row.height,
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

const MEDIA_COLUMNS: &str = "id, filename, mime_type, filesize, url, alt_text, caption, \
                             width, height, created_at, updated_at";

#[async_trait]
impl MediaStore for PgStore {
    async fn find_media(&self, id: MediaId) -> Result<Option<Media>, RepositoryError> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM storefront.media WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(self.pool())
        .await?;

        Ok(row.map(Media::from))
    }

    async fn list_media(&self) -> Result<Vec<Media>, RepositoryError> {
        let rows = sqlx::query_as::<_, MediaRow>(&format!(
            "SELECT {MEDIA_COLUMNS} FROM storefront.media ORDER BY created_at DESC, id DESC"
        ))
        .fetch_all(self.pool())
        .await?;

        Ok(rows.into_iter().map(Media::from).collect())
    }

    async fn insert_media(&self, data: &MediaData) -> Result<Media, RepositoryError> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            r"
            INSERT INTO storefront.media
                (filename, mime_type, filesize, url, alt_text, caption, width, height)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {MEDIA_COLUMNS}
            "
        ))
        .bind(&data.filename)
        .bind(&data.mime_type)
        .bind(data.filesize)
        .bind(&data.url)
        .bind(&data.alt_text)
        .bind(&data.caption)
        .bind(data.width)
        .bind(data.height)
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_write_error(e, "filename already exists"))?;

        Ok(Media::from(row))
    }

    async fn update_media(&self, id: MediaId, data: &MediaData) -> Result<Media, RepositoryError> {
        let row = sqlx::query_as::<_, MediaRow>(&format!(
            r"
            UPDATE storefront.media
            SET alt_text = $2, caption = $3, updated_at = NOW()
            WHERE id = $1
            RETURNING {MEDIA_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&data.alt_text)
        .bind(&data.caption)
        .fetch_optional(self.pool())
        .await?;

        row.map(Media::from).ok_or(RepositoryError::NotFound)
    }

    async fn delete_media(&self, id: MediaId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM storefront.media WHERE id = $1")
            .bind(id)
            .execute(self.pool())
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
