//! Album-level scanning and processing.
//!
//! An album is one directory of source photos, optionally carrying a
//! metadata file (`album.yaml`, or a plain-text `album.txt` fallback).
//! This module answers three questions per album:
//!
//! - which files are source photos (`source_photos`)
//! - does the album need full reprocessing (`needs_processing`)
//! - what record does it produce (`process_album`)
//!
//! Change detection is rendition-presence based, not timestamp based: an
//! album needs full processing unless all three rendition subdirectories
//! exist and `original/` holds exactly the source filenames, nothing more
//! or less. Rendition files are recognized by any casing of their extension,
//! but the filename comparison itself is exact; source discovery matches
//! extensions exactly against a fixed list.
//!
//! Photo failures never fail the album: each failed photo is reported in
//! the outcome and the rest proceed.

use crate::naming::slugify;
use crate::photo::{PhotoError, PhotoProcessor};
use crate::types::{AlbumRecord, SIZE_NAMES};
use log::{info, warn};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Extensions recognized as source photos, matched exactly (no case
/// folding): `photo.Jpg` is not a source photo, `photo.JPG` is.
pub const SOURCE_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "JPG", "JPEG", "png", "PNG"];

#[derive(Error, Debug)]
pub enum AlbumError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("album directory name {0:?} is not valid UTF-8")]
    BadDirName(PathBuf),
}

/// How an album was handled this run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Renditions regenerated and republished.
    Full,
    /// Renditions left alone; URLs and metadata rebuilt.
    MetadataOnly,
}

/// One photo that could not be processed, with the album left intact.
#[derive(Debug)]
pub struct PhotoFailure {
    pub filename: String,
    pub error: PhotoError,
}

/// Result of processing one album.
#[derive(Debug)]
pub struct AlbumOutcome {
    /// `None` when the directory held no source photos.
    pub record: Option<AlbumRecord>,
    pub mode: ProcessingMode,
    pub failures: Vec<PhotoFailure>,
}

/// Source photo filenames in the album directory, sorted by name.
pub fn source_photos(album_dir: &Path) -> Result<Vec<String>, AlbumError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(album_dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if let Some((_, ext)) = name.rsplit_once('.')
            && SOURCE_EXTENSIONS.contains(&ext)
        {
            names.push(name);
        }
    }
    names.sort();
    Ok(names)
}

/// True when the album's renditions are not a complete 1:1 match for its
/// source photos.
///
/// No reprocessing is needed only when all three rendition subdirectories
/// exist and the recognized files in `original/` match the sources exactly,
/// both in count and in filename set. The name comparison is exact:
/// `original/img_001.jpg` does not satisfy a source named `IMG_001.JPG`,
/// since a metadata-only refresh would then emit URLs for files that do
/// not exist on a case-sensitive filesystem.
pub fn needs_processing(album_dir: &Path) -> Result<bool, AlbumError> {
    let sources = source_photos(album_dir)?;
    if sources.is_empty() {
        return Ok(false);
    }

    for size in SIZE_NAMES {
        if !album_dir.join(size).is_dir() {
            return Ok(true);
        }
    }

    let renditions = rendition_files(&album_dir.join("original"))?;
    if renditions.len() != sources.len() {
        return Ok(true);
    }
    Ok(sources.iter().any(|name| !renditions.contains(name)))
}

/// Files recognized as renditions: any casing of the jpg/jpeg/png
/// extensions (unlike source discovery, which matches a fixed list of
/// casings exactly).
fn rendition_files(dir: &Path) -> Result<HashSet<String>, AlbumError> {
    let mut names = HashSet::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let Ok(name) = entry.file_name().into_string() else {
            continue;
        };
        if let Some((_, ext)) = name.rsplit_once('.')
            && ["jpg", "jpeg", "png"]
                .iter()
                .any(|e| ext.eq_ignore_ascii_case(e))
        {
            names.insert(name);
        }
    }
    Ok(names)
}

/// Album metadata file shape. Unknown keys are tolerated so the site can
/// carry extra fields this tool does not interpret.
#[derive(Debug, Default, Deserialize)]
struct MetaFile {
    title: Option<String>,
    description: Option<String>,
    date: Option<String>,
    location: Option<String>,
    tags: Option<Vec<String>>,
    cover_photo: Option<String>,
}

/// Resolved album metadata with defaults applied.
#[derive(Debug, Clone, PartialEq)]
pub struct AlbumMeta {
    pub title: String,
    pub description: Option<String>,
    pub date: String,
    pub location: Option<String>,
    pub tags: Option<Vec<String>>,
    pub cover_photo: Option<String>,
}

/// Load album metadata: `album.yaml` first, `album.txt` (first line title,
/// remainder description) as fallback, directory name and today's date as
/// last resort. A malformed `album.yaml` is warned about and skipped, not
/// fatal.
pub fn load_meta(album_dir: &Path, dir_name: &str) -> AlbumMeta {
    let mut meta = MetaFile::default();

    let yaml_path = album_dir.join("album.yaml");
    if yaml_path.is_file() {
        match std::fs::read_to_string(&yaml_path) {
            Ok(raw) => match serde_yaml::from_str::<MetaFile>(&raw) {
                Ok(parsed) => meta = parsed,
                Err(e) => warn!("ignoring malformed {}: {e}", yaml_path.display()),
            },
            Err(e) => warn!("cannot read {}: {e}", yaml_path.display()),
        }
    } else {
        let txt_path = album_dir.join("album.txt");
        if let Ok(raw) = std::fs::read_to_string(&txt_path) {
            // Line 1 is the title, line 2 the description; anything further
            // is ignored.
            let mut lines = raw.lines();
            meta.title = lines
                .next()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
            meta.description = lines
                .next()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string);
        }
    }

    AlbumMeta {
        title: meta.title.unwrap_or_else(|| dir_name.to_string()),
        description: meta.description,
        date: meta
            .date
            .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d").to_string()),
        location: meta.location,
        tags: meta.tags,
        cover_photo: meta.cover_photo,
    }
}

/// Process one album directory into an [`AlbumOutcome`].
///
/// `metadata_only` requests the cheap path, but an album whose renditions
/// are incomplete is upgraded to full processing regardless — a metadata
/// refresh must never produce URLs pointing at files that do not exist.
pub fn process_album(
    album_dir: &Path,
    processor: &PhotoProcessor,
    metadata_only: bool,
) -> Result<AlbumOutcome, AlbumError> {
    let dir_name = album_dir
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| AlbumError::BadDirName(album_dir.to_path_buf()))?
        .to_string();
    let album_id = slugify(&dir_name);

    let sources = source_photos(album_dir)?;
    let mode = if metadata_only && !needs_processing(album_dir)? {
        ProcessingMode::MetadataOnly
    } else {
        ProcessingMode::Full
    };

    if sources.is_empty() {
        return Ok(AlbumOutcome {
            record: None,
            mode,
            failures: Vec::new(),
        });
    }

    let mut photos = Vec::with_capacity(sources.len());
    let mut failures = Vec::new();
    for filename in &sources {
        let result = match mode {
            ProcessingMode::Full => {
                info!("processing {dir_name}/{filename}");
                processor.process(album_dir, &album_id, filename)
            }
            ProcessingMode::MetadataOnly => processor.refresh(album_dir, &album_id, filename),
        };
        match result {
            Ok(record) => photos.push(record),
            Err(error) => {
                warn!("skipping {dir_name}/{filename}: {error}");
                failures.push(PhotoFailure {
                    filename: filename.clone(),
                    error,
                });
            }
        }
    }

    if photos.is_empty() {
        // Every photo failed; an album with zero usable photos contributes
        // nothing to the manifest.
        return Ok(AlbumOutcome {
            record: None,
            mode,
            failures,
        });
    }

    let meta = load_meta(album_dir, &dir_name);
    let record = AlbumRecord {
        id: album_id,
        title: meta.title,
        description: meta.description,
        date: meta.date,
        location: meta.location,
        tags: meta.tags,
        cover_photo: meta.cover_photo,
        photos,
    };

    Ok(AlbumOutcome {
        record: Some(record),
        mode,
        failures,
    })
}
