//! Shared record types serialized into the album manifest.
//!
//! These shapes are the crate's external contract: the YAML manifest written
//! to `data/albums.yaml` must read back into the same records field-for-field,
//! and the static-site generator consumes them downstream. Optional fields are
//! omitted from output entirely — a missing EXIF value is absent, never a
//! zero or an empty string.

use serde::{Deserialize, Serialize};

/// The three rendition tiers every photo is processed into, in processing
/// order. Serialized key order follows field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenditionUrls {
    pub original: String,
    pub medium: String,
    pub thumbnail: String,
}

/// Names of the rendition tiers, in processing order.
pub const SIZE_NAMES: [&str; 3] = ["original", "medium", "thumbnail"];

/// Camera/capture metadata extracted from a source photo.
///
/// Sparse by design: every field is individually optional and absent fields
/// are never serialized. `camera` is "Make Model" when both tags are present,
/// the model alone otherwise. `date_taken` is an ISO-8601 string normalized
/// from the tool's `YYYY:MM:DD HH:MM:SS` format.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExifBlock {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aperture: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_taken: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

impl ExifBlock {
    /// True when no field was extracted at all.
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One processed photo inside an album record. Immutable once emitted.
///
/// `width`/`height` duplicate the EXIF dimensions at the top level for the
/// convenience of the site templates; they are unset when extraction yielded
/// nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhotoRecord {
    /// Filename with the extension stripped.
    pub id: String,
    pub filename: String,
    pub urls: RenditionUrls,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exif: Option<ExifBlock>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
}

/// One album: a slug-identified directory of photos plus optional metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlbumRecord {
    /// URL-safe slug derived from the directory name (see [`crate::naming::slugify`]).
    pub id: String,
    /// From `album.yaml`/`album.txt`, or the directory name verbatim.
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Album metadata date, or the run's current date when unset.
    pub date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_photo: Option<String>,
    pub photos: Vec<PhotoRecord>,
}

/// The persisted aggregate: every album known to the site, in directory
/// enumeration order (lexicographic by directory name).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub albums: Vec<AlbumRecord>,
}
