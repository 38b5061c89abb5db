//! Per-photo processing: renditions, publishing, metadata.
//!
//! [`PhotoProcessor`] turns one source file into a [`PhotoRecord`]. Full
//! processing renders all three tiers into `{album}/{size}/` subdirectories,
//! publishes each, and extracts EXIF from the source. A metadata-only refresh
//! skips rendering and publishing entirely — the renditions already exist from
//! a prior run — and just reconstructs URLs and re-reads EXIF.
//!
//! Failure policy differs by stage: a rendition that cannot be produced fails
//! the photo (the caller isolates that to the photo, not the album), while a
//! publish that fails only degrades that tier's URL to the local-serving path
//! with a warning. A photo with a broken upload is still in the manifest.

use crate::config::RenditionWidths;
use crate::exif;
use crate::imaging::{self, ImagingError};
use crate::storage::{local_url, Publisher, RenditionRef};
use crate::types::{PhotoRecord, RenditionUrls};
use log::warn;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PhotoError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Imaging(#[from] ImagingError),
    #[error("source filename {0:?} is not valid UTF-8")]
    BadFilename(String),
}

pub struct PhotoProcessor<'a> {
    publisher: &'a dyn Publisher,
    widths: &'a RenditionWidths,
    jpeg_quality: u8,
}

impl<'a> PhotoProcessor<'a> {
    pub fn new(
        publisher: &'a dyn Publisher,
        widths: &'a RenditionWidths,
        jpeg_quality: u8,
    ) -> Self {
        Self {
            publisher,
            widths,
            jpeg_quality,
        }
    }

    /// Render, publish, and describe one source photo.
    ///
    /// `album_dir` is the album directory containing `filename`; `album_id`
    /// is its slug. Rendition files keep the source filename, including its
    /// extension, so published links stay stable across runs.
    pub fn process(
        &self,
        album_dir: &Path,
        album_id: &str,
        filename: &str,
    ) -> Result<PhotoRecord, PhotoError> {
        let source = album_dir.join(filename);
        let album_dir_name = dir_name(album_dir)?;

        let mut urls = Vec::with_capacity(3);
        for (size, width) in self.widths.iter() {
            let size_dir = album_dir.join(size);
            std::fs::create_dir_all(&size_dir)?;
            let output = size_dir.join(filename);
            imaging::render(&source, &output, width, self.jpeg_quality)?;

            let rendition = RenditionRef {
                album_id,
                album_dir: &album_dir_name,
                size,
                filename,
            };
            let url = match self.publisher.publish(&output, &rendition) {
                Ok(url) => url,
                Err(e) => {
                    warn!("publish failed for {}/{}/{}: {e}", album_id, size, filename);
                    local_url(&rendition)
                }
            };
            urls.push(url);
        }

        Ok(self.record(filename, &source, collect_urls(urls)))
    }

    /// Rebuild a photo's record without touching renditions: URLs come from
    /// the publisher's deterministic mapping and EXIF is re-read from the
    /// source. Used when only album metadata changed.
    pub fn refresh(
        &self,
        album_dir: &Path,
        album_id: &str,
        filename: &str,
    ) -> Result<PhotoRecord, PhotoError> {
        let source = album_dir.join(filename);
        let album_dir_name = dir_name(album_dir)?;

        let urls: Vec<String> = self
            .widths
            .iter()
            .map(|(size, _)| {
                self.publisher.url(&RenditionRef {
                    album_id,
                    album_dir: &album_dir_name,
                    size,
                    filename,
                })
            })
            .collect();

        Ok(self.record(filename, &source, collect_urls(urls)))
    }

    fn record(&self, filename: &str, source: &Path, urls: RenditionUrls) -> PhotoRecord {
        let block = exif::extract(source);
        let width = block.width;
        let height = block.height;
        PhotoRecord {
            id: stem(filename),
            filename: filename.to_string(),
            urls,
            exif: if block.is_empty() { None } else { Some(block) },
            width,
            height,
        }
    }
}

fn dir_name(album_dir: &Path) -> Result<String, PhotoError> {
    album_dir
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string)
        .ok_or_else(|| PhotoError::BadFilename(album_dir.display().to_string()))
}

/// Filename with its extension stripped; the photo's stable identifier.
fn stem(filename: &str) -> String {
    match filename.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => filename.to_string(),
    }
}

fn collect_urls(mut urls: Vec<String>) -> RenditionUrls {
    // widths.iter() yields original, medium, thumbnail in that order.
    let thumbnail = urls.pop().unwrap_or_default();
    let medium = urls.pop().unwrap_or_default();
    let original = urls.pop().unwrap_or_default();
    RenditionUrls {
        original,
        medium,
        thumbnail,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::tests::MockPublisher;
    use image::codecs::jpeg::JpegEncoder;
    use image::{ImageEncoder, RgbImage};
    use std::io::BufWriter;
    use tempfile::TempDir;

    fn write_test_jpeg(path: &Path, width: u32, height: u32) {
        let img = RgbImage::from_pixel(width, height, image::Rgb([90, 120, 150]));
        let file = std::fs::File::create(path).unwrap();
        JpegEncoder::new_with_quality(BufWriter::new(file), 90)
            .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
            .unwrap();
    }

    fn album_with_photo(name: &str) -> (TempDir, std::path::PathBuf) {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("Paris Trip 2024");
        std::fs::create_dir_all(&album).unwrap();
        write_test_jpeg(&album.join(name), 800, 600);
        (tmp, album)
    }

    #[test]
    fn process_writes_all_three_renditions() {
        let (_tmp, album) = album_with_photo("dawn.jpg");
        let publisher = MockPublisher::new();
        let widths = RenditionWidths::default();
        let processor = PhotoProcessor::new(&publisher, &widths, 85);

        let record = processor
            .process(&album, "paris-trip-2024", "dawn.jpg")
            .unwrap();

        for size in ["original", "medium", "thumbnail"] {
            assert!(album.join(size).join("dawn.jpg").is_file(), "{size}");
        }
        assert_eq!(record.id, "dawn");
        assert_eq!(record.filename, "dawn.jpg");
        assert_eq!(
            publisher.published_keys(),
            vec![
                "albums/paris-trip-2024/original/dawn.jpg".to_string(),
                "albums/paris-trip-2024/medium/dawn.jpg".to_string(),
                "albums/paris-trip-2024/thumbnail/dawn.jpg".to_string(),
            ]
        );
    }

    #[test]
    fn process_uses_publisher_urls() {
        let (_tmp, album) = album_with_photo("dawn.jpg");
        let publisher = MockPublisher::new();
        let widths = RenditionWidths::default();
        let processor = PhotoProcessor::new(&publisher, &widths, 85);

        let record = processor
            .process(&album, "paris-trip-2024", "dawn.jpg")
            .unwrap();
        assert_eq!(
            record.urls.medium,
            "https://cdn.test/albums/paris-trip-2024/medium/dawn.jpg"
        );
    }

    #[test]
    fn publish_failure_falls_back_to_local_urls() {
        let (_tmp, album) = album_with_photo("dawn.jpg");
        let publisher = MockPublisher::failing();
        let widths = RenditionWidths::default();
        let processor = PhotoProcessor::new(&publisher, &widths, 85);

        let record = processor
            .process(&album, "paris-trip-2024", "dawn.jpg")
            .unwrap();

        // Renditions were still written and the record survives with
        // local-serving URLs.
        assert!(album.join("thumbnail").join("dawn.jpg").is_file());
        assert_eq!(
            record.urls.original,
            "/photos/Paris Trip 2024/original/dawn.jpg"
        );
        assert_eq!(
            record.urls.thumbnail,
            "/photos/Paris Trip 2024/thumbnail/dawn.jpg"
        );
    }

    #[test]
    fn undecodable_source_fails_the_photo() {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("Broken");
        std::fs::create_dir_all(&album).unwrap();
        std::fs::write(album.join("bad.jpg"), b"not an image").unwrap();

        let publisher = MockPublisher::new();
        let widths = RenditionWidths::default();
        let processor = PhotoProcessor::new(&publisher, &widths, 85);

        let result = processor.process(&album, "broken", "bad.jpg");
        assert!(matches!(result, Err(PhotoError::Imaging(_))));
    }

    #[test]
    fn refresh_builds_urls_without_writing_files() {
        let (_tmp, album) = album_with_photo("dawn.jpg");
        let publisher = MockPublisher::new();
        let widths = RenditionWidths::default();
        let processor = PhotoProcessor::new(&publisher, &widths, 85);

        let record = processor
            .refresh(&album, "paris-trip-2024", "dawn.jpg")
            .unwrap();

        assert!(!album.join("original").exists());
        assert!(publisher.published_keys().is_empty());
        assert_eq!(
            record.urls.thumbnail,
            "https://cdn.test/albums/paris-trip-2024/thumbnail/dawn.jpg"
        );
        assert_eq!(record.id, "dawn");
    }

    #[test]
    fn extension_preserved_in_rendition_and_record() {
        let tmp = TempDir::new().unwrap();
        let album = tmp.path().join("Mixed");
        std::fs::create_dir_all(&album).unwrap();
        let img = image::RgbaImage::from_pixel(120, 80, image::Rgba([10, 20, 30, 255]));
        img.save(album.join("graph.png")).unwrap();

        let publisher = MockPublisher::new();
        let widths = RenditionWidths::default();
        let processor = PhotoProcessor::new(&publisher, &widths, 85);

        let record = processor.process(&album, "mixed", "graph.png").unwrap();
        assert!(album.join("medium").join("graph.png").is_file());
        assert_eq!(record.filename, "graph.png");
        assert_eq!(record.id, "graph");
    }

    #[test]
    fn stem_strips_only_the_last_extension() {
        assert_eq!(stem("dawn.jpg"), "dawn");
        assert_eq!(stem("archive.tar.jpg"), "archive.tar");
        assert_eq!(stem("noext"), "noext");
        assert_eq!(stem(".hidden"), ".hidden");
    }
}
