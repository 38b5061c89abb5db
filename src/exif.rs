//! Camera metadata extraction via `exiftool`.
//!
//! The external tool is a black box at a process boundary: we ask for a fixed
//! tag set as JSON and normalize whatever comes back into an [`ExifBlock`].
//! Extraction is strictly best-effort — a missing binary, a non-zero exit, or
//! unparseable output all degrade to an empty block. A photo without metadata
//! is still a photo; nothing in the pipeline fails because exiftool is absent.
//!
//! Always run against the original, unmodified source file. Renditions are
//! re-encoded and lose tags.

use crate::types::ExifBlock;
use chrono::NaiveDateTime;
use log::debug;
use serde_json::Value;
use std::path::Path;
use std::process::Command;

/// Tags requested from exiftool, one `-Tag` argument each.
const REQUESTED_TAGS: [&str; 11] = [
    "Make",
    "Model",
    "LensModel",
    "ISO",
    "ShutterSpeed",
    "Aperture",
    "FNumber",
    "FocalLength",
    "DateTimeOriginal",
    "ImageWidth",
    "ImageHeight",
];

/// The date-time format exiftool emits for `DateTimeOriginal`.
const EXIF_DATETIME_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// Extract capture metadata from a photo. Never fails; returns an empty
/// block when the tool is unavailable or its output is unusable.
pub fn extract(photo_path: &Path) -> ExifBlock {
    let mut cmd = Command::new("exiftool");
    cmd.arg("-json");
    for tag in REQUESTED_TAGS {
        cmd.arg(format!("-{tag}"));
    }
    cmd.arg(photo_path);

    let output = match cmd.output() {
        Ok(out) => out,
        Err(e) => {
            debug!("exiftool unavailable for {}: {e}", photo_path.display());
            return ExifBlock::default();
        }
    };
    if !output.status.success() {
        debug!(
            "exiftool exited with {} for {}",
            output.status,
            photo_path.display()
        );
        return ExifBlock::default();
    }

    let parsed: Vec<Value> = match serde_json::from_slice(&output.stdout) {
        Ok(v) => v,
        Err(e) => {
            debug!("unparseable exiftool output for {}: {e}", photo_path.display());
            return ExifBlock::default();
        }
    };
    match parsed.into_iter().next() {
        Some(tags) => block_from_tags(&tags),
        None => ExifBlock::default(),
    }
}

/// Normalize one exiftool JSON object into the fixed-shape block.
///
/// Derivation rules:
/// - `camera`: "Make Model" when both exist, else the model alone
/// - `aperture`: stringified `FNumber`, falling back to `Aperture`
/// - `date_taken`: `DateTimeOriginal` reparsed and re-emitted as ISO-8601
///   with a `Z` suffix; unparseable values are dropped
pub fn block_from_tags(tags: &Value) -> ExifBlock {
    let camera = match (tag_str(tags, "Make"), tag_str(tags, "Model")) {
        (Some(make), Some(model)) => Some(format!("{make} {model}")),
        (None, Some(model)) => Some(model),
        _ => None,
    };
    let date_taken = tag_str(tags, "DateTimeOriginal")
        .and_then(|raw| NaiveDateTime::parse_from_str(&raw, EXIF_DATETIME_FORMAT).ok())
        .map(|dt| format!("{}Z", dt.format("%Y-%m-%dT%H:%M:%S")));

    ExifBlock {
        camera,
        lens: tag_str(tags, "LensModel"),
        focal_length: tag_str(tags, "FocalLength"),
        aperture: tag_str(tags, "FNumber").or_else(|| tag_str(tags, "Aperture")),
        shutter_speed: tag_str(tags, "ShutterSpeed"),
        iso: tag_u32(tags, "ISO"),
        date_taken,
        width: tag_u32(tags, "ImageWidth"),
        height: tag_u32(tags, "ImageHeight"),
    }
}

/// Read a tag as a string. Numeric tags (exiftool emits `"FNumber": 2.8`)
/// are stringified, matching the published manifest shape.
fn tag_str(tags: &Value, key: &str) -> Option<String> {
    match tags.get(key)? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn tag_u32(tags: &Value, key: &str) -> Option<u32> {
    let value = tags.get(key)?;
    value
        .as_u64()
        .map(|n| n as u32)
        .or_else(|| value.as_str().and_then(|s| s.parse().ok()))
}
