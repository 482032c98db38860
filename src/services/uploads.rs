//! Image storage on the local filesystem plus the public URL rules for stored
//! media paths.

use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::ServiceError;

/// URL prefix under which `upload_dir` is served
pub const UPLOADS_ROUTE: &str = "/Uploads";

/// Accepted image extensions
const SUPPORTED_FORMATS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// Turns stored media paths into the URLs clients receive, and back
#[derive(Debug, Clone, Default)]
pub struct MediaUrls {
    base_url: String,
}

impl MediaUrls {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            base_url: base_url.trim().trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute `http(s)` values pass through, empty stays empty, anything
    /// else is prefixed with the base URL.
    pub fn public_url(&self, stored: &str) -> String {
        let stored = stored.trim();
        if stored.is_empty() || is_absolute_url(stored) {
            return stored.to_string();
        }
        if stored.starts_with('/') {
            format!("{}{}", self.base_url, stored)
        } else {
            format!("{}/{}", self.base_url, stored)
        }
    }

    pub fn public_url_opt(&self, stored: Option<&str>) -> Option<String> {
        stored.map(|s| self.public_url(s))
    }

    /// Normalizes a client-supplied media reference before it is stored. A
    /// URL under our own base is reduced to its path so it survives a change
    /// of host.
    pub fn to_stored(&self, value: &str) -> String {
        let value = value.trim();
        if !self.base_url.is_empty() {
            if let Some(path) = value.strip_prefix(self.base_url.as_str()) {
                if path.starts_with('/') {
                    return path.to_string();
                }
            }
        }
        value.to_string()
    }
}

fn is_absolute_url(value: &str) -> bool {
    let lower = value.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

/// A file accepted by [`UploadService::store_image`]
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct UploadResponse {
    pub message: String,
    /// Path to store on records, e.g. `/Uploads/3f2a….png`
    pub path: String,
    /// Absolute URL of the stored file
    pub url: String,
}

#[derive(Debug, Clone)]
pub struct UploadService {
    dir: PathBuf,
    max_bytes: usize,
    media: MediaUrls,
}

impl UploadService {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize, media: MediaUrls) -> Self {
        Self {
            dir: dir.into(),
            max_bytes,
            media,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Validates and writes one image under a generated name
    #[instrument(skip(self, data), fields(size = data.len()))]
    pub async fn store_image(
        &self,
        original_name: Option<&str>,
        content_type: Option<&str>,
        data: &[u8],
    ) -> Result<UploadResponse, ServiceError> {
        if data.is_empty() {
            return Err(ServiceError::ValidationError("Uploaded file is empty".into()));
        }
        if data.len() > self.max_bytes {
            return Err(ServiceError::ValidationError(format!(
                "File too large. Maximum size is {}MB",
                self.max_bytes / 1024 / 1024
            )));
        }

        let ext = original_name
            .and_then(|name| Path::new(name).extension())
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .ok_or_else(|| {
                ServiceError::ValidationError("File name must have an image extension".into())
            })?;
        if !SUPPORTED_FORMATS.contains(&ext.as_str()) {
            return Err(ServiceError::ValidationError(format!(
                "Unsupported file format '{}'. Supported: {}",
                ext,
                SUPPORTED_FORMATS.join(", ")
            )));
        }

        let is_image = content_type
            .map(|ct| ct.trim().to_ascii_lowercase().starts_with("image/"))
            .unwrap_or(false);
        if !is_image {
            return Err(ServiceError::ValidationError(
                "Only image uploads are allowed".into(),
            ));
        }

        tokio::fs::create_dir_all(&self.dir).await?;
        let filename = format!("{}.{}", Uuid::new_v4().simple(), ext);
        tokio::fs::write(self.dir.join(&filename), data).await?;

        let path = format!("{}/{}", UPLOADS_ROUTE, filename);
        info!(path = %path, "stored upload");

        Ok(UploadResponse {
            message: "File uploaded successfully".to_string(),
            url: self.media.public_url(&path),
            path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn public_url_rules() {
        let media = MediaUrls::new("https://api.cityhomeservice.in/");
        assert_eq!(
            media.public_url("/Uploads/a.png"),
            "https://api.cityhomeservice.in/Uploads/a.png"
        );
        assert_eq!(
            media.public_url("Uploads/a.png"),
            "https://api.cityhomeservice.in/Uploads/a.png"
        );
        assert_eq!(
            media.public_url("http://cdn.example.com/x.jpg"),
            "http://cdn.example.com/x.jpg"
        );
        assert_eq!(media.public_url(""), "");
    }

    #[test]
    fn own_urls_are_stored_as_paths() {
        let media = MediaUrls::new("http://localhost:8080");
        assert_eq!(
            media.to_stored("http://localhost:8080/Uploads/a.png"),
            "/Uploads/a.png"
        );
        assert_eq!(
            media.to_stored("https://cdn.example.com/b.png"),
            "https://cdn.example.com/b.png"
        );
    }

    #[tokio::test]
    async fn rejects_wrong_extension_and_content_type() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path(), 1024, MediaUrls::new("http://h"));

        let err = service
            .store_image(Some("notes.txt"), Some("text/plain"), b"hello")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));

        let err = service
            .store_image(Some("photo.png"), Some("application/octet-stream"), b"png")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn rejects_oversized_files() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path(), 4, MediaUrls::default());
        let err = service
            .store_image(Some("a.png"), Some("image/png"), b"12345")
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::ValidationError(_)));
    }

    #[tokio::test]
    async fn stores_file_under_generated_name() {
        let dir = tempfile::tempdir().unwrap();
        let service = UploadService::new(dir.path(), 1024, MediaUrls::new("http://h"));
        let stored = service
            .store_image(Some("Living Room.JPG"), Some("image/jpeg"), b"\xff\xd8\xff")
            .await
            .unwrap();

        assert!(stored.path.starts_with("/Uploads/"));
        assert!(stored.path.ends_with(".jpg"));
        assert_eq!(stored.url, format!("http://h{}", stored.path));

        let name = stored.path.trim_start_matches("/Uploads/");
        let on_disk = std::fs::read(dir.path().join(name)).unwrap();
        assert_eq!(on_disk, b"\xff\xd8\xff");
    }
}
