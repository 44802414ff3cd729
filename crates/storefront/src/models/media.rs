//! Uploaded media files.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use cartwright_core::MediaId;

use super::{non_blank, nullable};

/// MIME types accepted for upload.
pub const ALLOWED_MIME_TYPES: [&str; 5] = [
    "image/png",
    "image/jpeg",
    "image/gif",
    "image/svg+xml",
    "image/webp",
];

/// True if `mime` may be uploaded.
#[must_use]
pub fn is_allowed_mime(mime: &str) -> bool {
    ALLOWED_MIME_TYPES.contains(&mime)
}

/// Stored file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaData {
    /// Name on disk, unique within the media directory.
    pub filename: String,
    pub mime_type: String,
    /// Size in bytes.
    pub filesize: i64,
    /// Public URL path.
    pub url: String,
    pub alt_text: Option<String>,
    pub caption: Option<String>,
    pub width: Option<i32>,
    pub height: Option<i32>,
}

/// A stored media record as returned by the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Media {
    pub id: MediaId,
    #[serde(flatten)]
    pub data: MediaData,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Update body for media. The file itself is immutable.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaPatch {
    #[serde(default, deserialize_with = "nullable")]
    pub alt_text: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable")]
    pub caption: Option<Option<String>>,
}

impl MediaPatch {
    pub fn apply(self, data: &mut MediaData) {
        if let Some(alt_text) = self.alt_text {
            data.alt_text = non_blank(alt_text);
        }
        if let Some(caption) = self.caption {
            data.caption = non_blank(caption);
        }
    }
}

/// Read pixel dimensions from a PNG or GIF header.
///
/// Other formats (and truncated files) yield `None`.
#[must_use]
pub fn sniff_dimensions(mime: &str, bytes: &[u8]) -> Option<(i32, i32)> {
    match mime {
        "image/png" => {
            // 8-byte signature, then the IHDR chunk: length, type, width, height
            if bytes.get(..8)? != b"\x89PNG\r\n\x1a\n" || bytes.get(12..16)? != b"IHDR" {
                return None;
            }
            let width = u32::from_be_bytes(bytes.get(16..20)?.try_into().ok()?);
            let height = u32::from_be_bytes(bytes.get(20..24)?.try_into().ok()?);
            Some((i32::try_from(width).ok()?, i32::try_from(height).ok()?))
        }
        "image/gif" => {
            let signature = bytes.get(..6)?;
            if signature != b"GIF87a" && signature != b"GIF89a" {
                return None;
            }
            let width = u16::from_le_bytes(bytes.get(6..8)?.try_into().ok()?);
            let height = u16::from_le_bytes(bytes.get(8..10)?.try_into().ok()?);
            Some((i32::from(width), i32::from(height)))
        }
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allowed_mime() {
        assert!(is_allowed_mime("image/webp"));
        assert!(is_allowed_mime("image/svg+xml"));
        assert!(!is_allowed_mime("application/pdf"));
        assert!(!is_allowed_mime("image/tiff"));
    }

    #[test]
    fn test_png_dimensions() {
        let mut header = b"\x89PNG\r\n\x1a\n\x00\x00\x00\x0dIHDR".to_vec();
        header.extend_from_slice(&640u32.to_be_bytes());
        header.extend_from_slice(&480u32.to_be_bytes());
        assert_eq!(sniff_dimensions("image/png", &header), Some((640, 480)));
        assert_eq!(sniff_dimensions("image/png", &header[..18]), None);
    }

    #[test]
    fn test_gif_dimensions() {
        let mut header = b"GIF89a".to_vec();
        header.extend_from_slice(&32u16.to_le_bytes());
        header.extend_from_slice(&16u16.to_le_bytes());
        assert_eq!(sniff_dimensions("image/gif", &header), Some((32, 16)));
        assert_eq!(sniff_dimensions("image/jpeg", &header), None);
    }
}
