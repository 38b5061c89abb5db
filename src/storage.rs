//! Rendition publishing: where processed files end up and what URL they get.
//!
//! The [`Publisher`] trait is the seam between processing and distribution.
//! Two implementations:
//!
//! - [`LocalPublisher`]: renditions stay where they were written under the
//!   photo library; URLs are site-relative (`/photos/{album dir}/{size}/{file}`)
//!   and served through a `static/photos` symlink in the site repo.
//! - [`CloudPublisher`]: renditions are uploaded to an S3-compatible endpoint
//!   under `albums/{album id}/{size}/{file}` and served from a CDN base URL.
//!
//! `url` is deterministic and does no I/O, so callers can reconstruct a
//! photo's public URLs without touching the network (metadata-only refresh
//! relies on this). `publish` performs the actual placement and returns the
//! same URL on success.

use crate::config::CloudConfig;
use log::warn;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PublishError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("upload request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("upload of {key} rejected with status {status}")]
    Rejected {
        key: String,
        status: reqwest::StatusCode,
    },
}

/// Identifies one rendition of one photo, independent of where it lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionRef<'a> {
    /// Slug identifier, used in cloud object keys.
    pub album_id: &'a str,
    /// Directory name verbatim, used in local URLs.
    pub album_dir: &'a str,
    /// Rendition tier name ("original", "medium", "thumbnail").
    pub size: &'a str,
    pub filename: &'a str,
}

/// Destination for processed renditions.
pub trait Publisher {
    /// The public URL this rendition will have once published. No I/O.
    fn url(&self, rendition: &RenditionRef) -> String;

    /// Place the rendition at its destination and return its public URL.
    fn publish(&self, local_path: &Path, rendition: &RenditionRef)
    -> Result<String, PublishError>;
}

/// Site-relative URL for a rendition served from the photo library. Used by
/// [`LocalPublisher`] and as the fallback URL when a cloud upload fails.
pub fn local_url(rendition: &RenditionRef) -> String {
    format!(
        "/photos/{}/{}/{}",
        rendition.album_dir, rendition.size, rendition.filename
    )
}

/// Publisher for local serving: files are already in place under the photo
/// library, so publishing is a no-op that yields the site-relative URL.
pub struct LocalPublisher;

impl Publisher for LocalPublisher {
    fn url(&self, rendition: &RenditionRef) -> String {
        local_url(rendition)
    }

    fn publish(
        &self,
        _local_path: &Path,
        rendition: &RenditionRef,
    ) -> Result<String, PublishError> {
        Ok(local_url(rendition))
    }
}

/// Make `static/photos` in the site repo point at the photo library so Hugo
/// serves local renditions. The target is canonicalized first, so a
/// relative `photos_dir` still resolves when Hugo runs from another
/// directory. Idempotent: an existing correct link is left alone; anything
/// else at that path (stale link, file, directory) is removed and replaced.
#[cfg(unix)]
pub fn ensure_photos_link(site_repo: &Path, photos_dir: &Path) -> Result<PathBuf, PublishError> {
    let target = photos_dir.canonicalize()?;
    let static_dir = site_repo.join("static");
    std::fs::create_dir_all(&static_dir)?;
    let link = static_dir.join("photos");

    match std::fs::symlink_metadata(&link) {
        Ok(meta) if meta.file_type().is_symlink() => {
            if std::fs::read_link(&link).is_ok_and(|existing| existing == target) {
                return Ok(link);
            }
            std::fs::remove_file(&link)?;
        }
        Ok(meta) if meta.is_dir() => {
            warn!("replacing directory {} with a symlink", link.display());
            std::fs::remove_dir_all(&link)?;
        }
        Ok(_) => std::fs::remove_file(&link)?,
        Err(_) => {}
    }

    std::os::unix::fs::symlink(&target, &link)?;
    Ok(link)
}

#[cfg(not(unix))]
pub fn ensure_photos_link(site_repo: &Path, _photos_dir: &Path) -> Result<PathBuf, PublishError> {
    let link = site_repo.join("static").join("photos");
    warn!("symlinking the photo library is only supported on unix; skipping");
    Ok(link)
}

/// Publisher that uploads renditions to an S3-compatible object store and
/// serves them through a CDN.
pub struct CloudPublisher {
    config: CloudConfig,
    client: reqwest::blocking::Client,
}

impl CloudPublisher {
    pub fn new(config: CloudConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { config, client }
    }

    fn object_key(rendition: &RenditionRef) -> String {
        format!(
            "albums/{}/{}/{}",
            rendition.album_id, rendition.size, rendition.filename
        )
    }

    fn content_type(filename: &str) -> &'static str {
        // Renditions are always JPEG-encoded, but files keep their source
        // extension, so go by the name the CDN will serve.
        if filename.to_lowercase().ends_with(".png") {
            "image/png"
        } else {
            "image/jpeg"
        }
    }
}

impl Publisher for CloudPublisher {
    fn url(&self, rendition: &RenditionRef) -> String {
        format!(
            "{}/{}",
            self.config.cdn_base_url.trim_end_matches('/'),
            Self::object_key(rendition)
        )
    }

    fn publish(
        &self,
        local_path: &Path,
        rendition: &RenditionRef,
    ) -> Result<String, PublishError> {
        let key = Self::object_key(rendition);
        let body = std::fs::read(local_path)?;
        let endpoint = self.config.endpoint.trim_end_matches('/');
        let target = format!("{}/{}/{}", endpoint, self.config.bucket, key);

        let response = self
            .client
            .put(&target)
            .basic_auth(&self.config.access_key, Some(&self.config.secret_key))
            .header(reqwest::header::CONTENT_TYPE, Self::content_type(rendition.filename))
            .body(body)
            .send()?;

        if !response.status().is_success() {
            return Err(PublishError::Rejected {
                key,
                status: response.status(),
            });
        }
        Ok(self.url(rendition))
    }
}
