//! Media library: uploaded files on disk plus their metadata rows.

use std::path::{Path, PathBuf};

use uuid::Uuid;

use cartwright_core::{AccessPolicy, MediaId, Operation, Principal};

use super::{CollectionError, authorize};
use crate::db::Store;
use crate::models::media::{is_allowed_mime, sniff_dimensions};
use crate::models::{Media, MediaData, MediaPatch, non_blank};
use crate::validation::ValidationErrors;

const POLICY: AccessPolicy = AccessPolicy::CATALOG;

/// URL prefix uploaded files are served under.
pub const MEDIA_URL_PREFIX: &str = "/media";

/// A file received from a multipart upload.
#[derive(Debug, Default)]
pub struct Upload {
    /// Client-supplied file name.
    pub filename: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
}

/// Media service.
pub struct MediaService<'a> {
    store: &'a dyn Store,
    media_dir: &'a Path,
}

impl<'a> MediaService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn Store, media_dir: &'a Path) -> Self {
        Self { store, media_dir }
    }

    /// Store an upload on disk and record it.
    ///
    /// # Errors
    ///
    /// `Forbidden`, `Validation` for an empty file or a type outside
    /// [`crate::models::media::ALLOWED_MIME_TYPES`], or `Storage` if the file
    /// cannot be written.
    pub async fn upload(
        &self,
        user: Option<&Principal>,
        upload: Upload,
    ) -> Result<Media, CollectionError> {
        authorize(&POLICY, Operation::Create, user, None)?;

        let mut errors = ValidationErrors::new();
        if upload.bytes.is_empty() {
            errors.push("file", "No file was uploaded.");
        }
        if !is_allowed_mime(&upload.content_type) {
            errors.push(
                "mimeType",
                format!("Files of type {} are not allowed.", upload.content_type),
            );
        }
        errors.finish(|| ())?;

        let filename = stored_name(&upload.filename);
        let (width, height) = sniff_dimensions(&upload.content_type, &upload.bytes).unzip();
        let data = MediaData {
            url: format!("{MEDIA_URL_PREFIX}/{filename}"),
            filename,
            mime_type: upload.content_type,
            filesize: i64::try_from(upload.bytes.len()).unwrap_or(i64::MAX),
            alt_text: non_blank(upload.alt_text),
            caption: non_blank(upload.caption),
            width,
            height,
        };

        tokio::fs::create_dir_all(self.media_dir).await?;
        let path = self.path(&data.filename);
        tokio::fs::write(&path, &upload.bytes).await?;

        match self.store.insert_media(&data).await {
            Ok(media) => {
                tracing::info!(media_id = %media.id, filename = %media.data.filename, bytes = media.data.filesize, "Media uploaded");
                Ok(media)
            }
            Err(e) => {
                remove_file(&path).await;
                Err(e.into())
            }
        }
    }

    /// # Errors
    ///
    /// `NotFound` if the record does not exist.
    pub async fn get(&self, id: MediaId) -> Result<Media, CollectionError> {
        self.store
            .find_media(id)
            .await?
            .ok_or(CollectionError::NotFound)
    }

    /// # Errors
    ///
    /// Returns an error if the store fails.
    pub async fn list(&self) -> Result<Vec<Media>, CollectionError> {
        Ok(self.store.list_media().await?)
    }

    /// Edit the alt text and caption. The file itself cannot change.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    pub async fn update(
        &self,
        user: Option<&Principal>,
        id: MediaId,
        patch: MediaPatch,
    ) -> Result<Media, CollectionError> {
        authorize(&POLICY, Operation::Update, user, None)?;
        let mut data = self.get(id).await?.data;
        patch.apply(&mut data);
        Ok(self.store.update_media(id, &data).await?)
    }

    /// Delete the record, then the file.
    ///
    /// # Errors
    ///
    /// `Forbidden` or `NotFound`.
    pub async fn delete(&self, user: Option<&Principal>, id: MediaId) -> Result<MediaId, CollectionError> {
        authorize(&POLICY, Operation::Delete, user, None)?;
        let media = self.get(id).await?;
        if !self.store.delete_media(id).await? {
            return Err(CollectionError::NotFound);
        }
        remove_file(&self.path(&media.data.filename)).await;
        tracing::info!(media_id = %id, "Media deleted");
        Ok(id)
    }

    fn path(&self, filename: &str) -> PathBuf {
        self.media_dir.join(filename)
    }
}

/// Unique on-disk name: a UUID prefix plus the sanitized client name.
fn stored_name(original: &str) -> String {
    let base = Path::new(original)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("upload");
    let clean: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect();
    let clean = clean.trim_matches(|c| c == '-' || c == '.');
    let clean = if clean.is_empty() { "upload" } else { clean };
    format!("{}-{clean}", Uuid::new_v4().simple())
}

/// Best-effort file removal; a leftover file only wastes disk.
async fn remove_file(path: &Path) {
    if let Err(e) = tokio::fs::remove_file(path).await {
        tracing::warn!(path = %path.display(), error = %e, "Failed to remove media file");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::db::MemoryStore;

    const ADMIN: Principal = Principal::admin(1);

    fn media_dir(test: &str) -> PathBuf {
        std::env::temp_dir().join(format!("cartwright-media-{test}-{}", Uuid::new_v4().simple()))
    }

    fn gif() -> Upload {
        let mut bytes = b"GIF89a".to_vec();
        bytes.extend_from_slice(&4u16.to_le_bytes());
        bytes.extend_from_slice(&2u16.to_le_bytes());
        bytes.extend_from_slice(&[0; 8]);
        Upload {
            filename: "../Front Door.gif".to_owned(),
            content_type: "image/gif".to_owned(),
            bytes,
            alt_text: Some(" Front door ".to_owned()),
            caption: None,
        }
    }

    #[test]
    fn test_stored_name_is_sanitized() {
        let name = stored_name("../../etc/Pass Wd.PNG");
        assert!(name.ends_with("-pass-wd.png"));
        assert!(!name.contains('/'));
        assert!(stored_name("???").ends_with("-upload"));
    }

    #[tokio::test]
    async fn test_upload_writes_file_and_record() {
        let store = MemoryStore::new();
        let dir = media_dir("upload");
        let library = MediaService::new(&store, &dir);

        let media = library.upload(Some(&ADMIN), gif()).await.unwrap();
        assert!(media.data.filename.ends_with("-front-door.gif"));
        assert_eq!(media.data.url, format!("/media/{}", media.data.filename));
        assert_eq!((media.data.width, media.data.height), (Some(4), Some(2)));
        assert_eq!(media.data.alt_text.as_deref(), Some("Front door"));
        assert_eq!(media.data.filesize, 18);
        assert!(dir.join(&media.data.filename).exists());

        library.delete(Some(&ADMIN), media.id).await.unwrap();
        assert!(!dir.join(&media.data.filename).exists());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[tokio::test]
    async fn test_upload_rejects_disallowed_types() {
        let store = MemoryStore::new();
        let dir = media_dir("reject");
        let library = MediaService::new(&store, &dir);

        let upload = Upload {
            content_type: "application/pdf".to_owned(),
            ..gif()
        };
        let Err(CollectionError::Validation(errors)) = library.upload(Some(&ADMIN), upload).await
        else {
            panic!("expected validation error");
        };
        assert_eq!(errors.fields(), vec!["mimeType"]);
        assert!(library.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_upload_needs_login() {
        let store = MemoryStore::new();
        let dir = media_dir("anon");
        let library = MediaService::new(&store, &dir);
        assert!(matches!(
            library.upload(None, gif()).await,
            Err(CollectionError::Forbidden)
        ));
    }

    #[tokio::test]
    async fn test_update_alt_text() {
        let store = MemoryStore::new();
        let dir = media_dir("update");
        let library = MediaService::new(&store, &dir);
        let media = library.upload(Some(&ADMIN), gif()).await.unwrap();

        let updated = library
            .update(
                Some(&ADMIN),
                media.id,
                MediaPatch {
                    alt_text: Some(None),
                    caption: Some(Some("Blue".to_owned())),
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.data.alt_text, None);
        assert_eq!(updated.data.caption.as_deref(), Some("Blue"));
        assert_eq!(updated.data.filename, media.data.filename);
        std::fs::remove_dir_all(&dir).ok();
    }
}
