//! The run pipeline: enumerate albums, process them, reconcile the manifest,
//! and emit site artifacts.
//!
//! One [`Reconciler::run`] call is one batch run. It walks the album
//! directories under `photos_dir` in name order, processes each (full or
//! metadata-only, per change detection and the `force` flag), and writes the
//! result to `data/albums.yaml` in the site repo. The manifest is rebuilt
//! from disk every run: records accumulate into an id-keyed,
//! insertion-ordered map while the sorted directories are walked, so output
//! order follows directory order and albums whose directories were deleted
//! drop out. Only with `--album` does the prior manifest feed the output:
//! filtered-out directories pass their prior entries through verbatim. A run
//! that finds nothing to do leaves the manifest file alone entirely.
//!
//! After a successful merge the pipeline rewrites the Hugo content stub for
//! every album in the manifest (`content/album/{id}.md`) and, in
//! local-publishing mode, points `static/photos` at the photo library.

use crate::album::{self, AlbumError, PhotoFailure, ProcessingMode};
use crate::config::Config;
use crate::naming::slugify;
use crate::photo::PhotoProcessor;
use crate::storage::{ensure_photos_link, CloudPublisher, LocalPublisher, PublishError, Publisher};
use crate::types::{AlbumRecord, Manifest};
use log::{info, warn};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("manifest serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error(transparent)]
    Album(#[from] AlbumError),
    #[error(transparent)]
    Publish(#[from] PublishError),
    #[error("photo library not found at {0}")]
    MissingSourceRoot(PathBuf),
}

/// What one run did, for the closing summary.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Albums that went through full rendition processing.
    pub processed: usize,
    /// Albums refreshed metadata-only.
    pub refreshed: usize,
    /// Album count in the written manifest.
    pub total_albums: usize,
    /// Photos that failed and were skipped, across all albums.
    pub photo_failures: Vec<(String, PhotoFailure)>,
    pub manifest_written: bool,
}

pub struct Reconciler<'a> {
    config: &'a Config,
    publisher: Box<dyn Publisher>,
}

impl<'a> Reconciler<'a> {
    pub fn new(config: &'a Config) -> Self {
        let publisher: Box<dyn Publisher> = match &config.cloud {
            Some(cloud) => Box::new(CloudPublisher::new(cloud.clone())),
            None => Box::new(LocalPublisher),
        };
        Self { config, publisher }
    }

    #[cfg(test)]
    fn with_publisher(config: &'a Config, publisher: Box<dyn Publisher>) -> Self {
        Self { config, publisher }
    }

    /// Album directories under the photo library, sorted by name.
    fn album_dirs(&self) -> Result<Vec<PathBuf>, PipelineError> {
        let root = &self.config.photos_dir;
        if !root.is_dir() {
            return Err(PipelineError::MissingSourceRoot(root.clone()));
        }

        let mut dirs = Vec::new();
        for entry in std::fs::read_dir(root)? {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            dirs.push(entry.path());
        }
        dirs.sort();
        Ok(dirs)
    }

    /// Execute one batch run.
    pub fn run(&self, filter: Option<&str>, force: bool) -> Result<RunReport, PipelineError> {
        let processor = PhotoProcessor::new(
            self.publisher.as_ref(),
            &self.config.widths,
            self.config.jpeg_quality,
        );
        let prior_by_id: HashMap<String, AlbumRecord> = self
            .load_prior_manifest()
            .albums
            .into_iter()
            .map(|a| (a.id.clone(), a))
            .collect();

        let mut report = RunReport::default();
        let mut albums: Vec<AlbumRecord> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for dir in self.album_dirs()? {
            let dir_name = dir
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();

            if let Some(wanted) = filter
                && dir_name != wanted
            {
                // Identity passthrough: the prior entry verbatim, or nothing
                // if the album was never published.
                if let Some(entry) = prior_by_id.get(&slugify(&dir_name)) {
                    upsert(&mut albums, &mut index, entry.clone());
                }
                continue;
            }

            let outcome = album::process_album(&dir, &processor, !force)?;
            for failure in outcome.failures {
                report.photo_failures.push((dir_name.clone(), failure));
            }
            let Some(record) = outcome.record else {
                continue;
            };

            match outcome.mode {
                ProcessingMode::Full => {
                    info!("processed {dir_name} ({} photos)", record.photos.len());
                    report.processed += 1;
                }
                ProcessingMode::MetadataOnly => {
                    info!("refreshed {dir_name} ({} photos)", record.photos.len());
                    report.refreshed += 1;
                }
            }
            upsert(&mut albums, &mut index, record);
        }

        if albums.is_empty() {
            info!("no albums to process; manifest left untouched");
            return Ok(report);
        }

        let manifest = Manifest { albums };
        report.total_albums = manifest.albums.len();
        self.write_manifest(&manifest)?;
        report.manifest_written = true;

        self.write_content_stubs(&manifest)?;
        if self.config.cloud.is_none() {
            ensure_photos_link(&self.config.site_repo, &self.config.photos_dir)?;
        }

        Ok(report)
    }

    fn manifest_path(&self) -> PathBuf {
        self.config.site_repo.join("data").join("albums.yaml")
    }

    /// Prior manifest, or an empty one. Unreadable or malformed files are
    /// warned about and treated as empty rather than aborting the run.
    fn load_prior_manifest(&self) -> Manifest {
        let path = self.manifest_path();
        if !path.is_file() {
            return Manifest::default();
        }
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) => {
                warn!("cannot read {}: {e}; starting from empty", path.display());
                return Manifest::default();
            }
        };
        match serde_yaml::from_str(&raw) {
            Ok(manifest) => manifest,
            Err(e) => {
                warn!("malformed {}: {e}; starting from empty", path.display());
                Manifest::default()
            }
        }
    }

    fn write_manifest(&self, manifest: &Manifest) -> Result<(), PipelineError> {
        let path = self.manifest_path();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(manifest)?;
        std::fs::write(&path, yaml)?;
        Ok(())
    }

    /// Rewrite `content/album/{id}.md` for every album in the manifest.
    fn write_content_stubs(&self, manifest: &Manifest) -> Result<(), PipelineError> {
        let content_dir = self.config.site_repo.join("content").join("album");
        std::fs::create_dir_all(&content_dir)?;
        for record in &manifest.albums {
            let path = content_dir.join(format!("{}.md", record.id));
            std::fs::write(&path, content_stub(&record.title))?;
        }
        Ok(())
    }
}

/// Insert a record keeping first-insertion order; a later record with the
/// same id replaces the earlier one in place (slug collisions resolve
/// last-write-wins).
fn upsert(albums: &mut Vec<AlbumRecord>, index: &mut HashMap<String, usize>, record: AlbumRecord) {
    match index.get(&record.id) {
        Some(&i) => albums[i] = record,
        None => {
            index.insert(record.id.clone(), albums.len());
            albums.push(record);
        }
    }
}

/// Hugo front-matter stub for one album page.
fn content_stub(title: &str) -> String {
    format!("---\ntitle: \"{title}\"\ntype: album\n---\n")
}
