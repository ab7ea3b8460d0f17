//! Image storage for product uploads.
//!
//! Files land on the local filesystem under the configured uploads
//! directory and are served back at `/public/uploads/<file>`. Stored names
//! are derived from a sanitized original name plus a millisecond timestamp
//! so repeated uploads never collide.

use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};

/// Maximum number of gallery images a product may carry.
pub const MAX_GALLERY_IMAGES: usize = 10;

/// URL prefix under which stored images are served.
const PUBLIC_PREFIX: &str = "/public/uploads";

/// Map an image content type to the file extension we store it under.
/// Unknown types are rejected before anything touches disk.
fn extension_for(content_type: &str) -> Option<&'static str> {
    match content_type {
        "image/png" => Some("png"),
        "image/jpeg" | "image/jpg" => Some("jpeg"),
        _ => None,
    }
}

/// Strip the extension and replace anything URL-hostile in an uploaded
/// file name.
fn sanitize_stem(original: &str) -> String {
    let stem = Path::new(original)
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("image");

    let cleaned: String = stem
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '-'
            }
        })
        .collect();

    if cleaned.chars().all(|c| c == '-') {
        "image".to_string()
    } else {
        cleaned
    }
}

/// Writes uploaded images to disk and hands back their public URLs.
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
}

impl ImageStore {
    /// Create a store rooted at `dir`, creating the directory if needed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Internal` if the directory cannot be created.
    pub fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)
            .map_err(|e| AppError::Internal(format!("cannot create uploads dir: {e}")))?;

        Ok(Self { dir })
    }

    /// Directory the store writes into, for wiring up static file serving.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Persist one uploaded image and return its public URL path.
    ///
    /// # Errors
    ///
    /// Returns `AppError::BadRequest` if the content type is not an
    /// accepted image type, `AppError::Internal` if the write fails.
    pub async fn store(
        &self,
        original_name: &str,
        content_type: &str,
        bytes: &[u8],
    ) -> Result<String> {
        let ext = extension_for(content_type).ok_or_else(|| {
            AppError::BadRequest(format!("Unsupported image type: {content_type}"))
        })?;

        let file_name = format!(
            "{}-{}.{ext}",
            sanitize_stem(original_name),
            chrono::Utc::now().timestamp_millis()
        );

        tokio::fs::write(self.dir.join(&file_name), bytes)
            .await
            .map_err(|e| AppError::Internal(format!("cannot write upload: {e}")))?;

        Ok(format!("{PUBLIC_PREFIX}/{file_name}"))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_for_accepted_types() {
        assert_eq!(extension_for("image/png"), Some("png"));
        assert_eq!(extension_for("image/jpeg"), Some("jpeg"));
        assert_eq!(extension_for("image/jpg"), Some("jpeg"));
        assert_eq!(extension_for("application/pdf"), None);
        assert_eq!(extension_for("text/html"), None);
    }

    #[test]
    fn test_sanitize_stem() {
        assert_eq!(sanitize_stem("red shoes.png"), "red-shoes");
        assert_eq!(sanitize_stem("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_stem("café photo.jpeg"), "caf--photo");
        assert_eq!(sanitize_stem(" "), "image");
        assert_eq!(sanitize_stem(""), "image");
    }

    #[tokio::test]
    async fn test_store_writes_file_and_returns_public_url() {
        let dir = std::env::temp_dir().join(format!(
            "shophouse-uploads-test-{}",
            chrono::Utc::now().timestamp_nanos_opt().unwrap()
        ));
        let store = ImageStore::new(&dir).unwrap();

        let url = store
            .store("blue hat.png", "image/png", b"not a real png")
            .await
            .unwrap();

        assert!(url.starts_with("/public/uploads/blue-hat-"));
        assert!(url.ends_with(".png"));

        let file_name = url.rsplit('/').next().unwrap();
        let on_disk = tokio::fs::read(dir.join(file_name)).await.unwrap();
        assert_eq!(on_disk, b"not a real png");

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }

    #[tokio::test]
    async fn test_store_rejects_unknown_content_type() {
        let dir = std::env::temp_dir().join("shophouse-uploads-test-reject");
        let store = ImageStore::new(&dir).unwrap();

        let result = store.store("script.sh", "text/x-shellscript", b"#!/bin/sh").await;
        assert!(matches!(result, Err(AppError::BadRequest(_))));
    }
}
