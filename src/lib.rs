//! photopress — batch photo-album publishing for a Hugo site.
//!
//! One run walks a library of album directories, renders three JPEG tiers
//! per photo (original / medium / thumbnail), extracts camera metadata,
//! publishes renditions locally or to S3-compatible storage, and reconciles
//! everything into the site's `data/albums.yaml` manifest plus a content
//! stub per album. Albums whose renditions are already complete get a cheap
//! metadata-only refresh; only new or forced albums pay for image work.
//!
//! Module map:
//!
//! - [`config`] — layered run configuration (TOML file + environment)
//! - [`types`] — manifest record shapes (`AlbumRecord`, `PhotoRecord`, ...)
//! - [`naming`] — directory name to URL-safe album slug
//! - [`exif`] — best-effort metadata extraction via exiftool
//! - [`imaging`] — rendition generation (decode, flatten, downscale, encode)
//! - [`storage`] — the [`storage::Publisher`] seam: local paths or cloud upload
//! - [`photo`] — one source file to one [`types::PhotoRecord`]
//! - [`album`] — scanning, change detection, per-album processing
//! - [`manifest`] — the run pipeline and manifest merge
//! - [`output`] — CLI banner and run summary formatting

pub mod album;
pub mod config;
pub mod exif;
pub mod imaging;
pub mod manifest;
pub mod naming;
pub mod output;
pub mod photo;
pub mod storage;
pub mod types;
