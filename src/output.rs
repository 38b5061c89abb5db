//! CLI output formatting.
//!
//! Each piece of output has a `format_*` function (pure, returns lines) and a
//! `print_*` wrapper that writes to stdout. Format functions never do I/O.
//!
//! ```text
//! photopress
//!     Library:    /home/me/Pictures/albums
//!     Site repo:  /home/me/site
//!     Publishing: local (static/photos symlink)
//!     Renditions: original 4000px, medium 1600px, thumbnail 400px @ q85
//!
//! Processed 2 albums, refreshed 3, 5 in manifest
//!     skipped Tokyo/bad.jpg: failed to decode ...
//! ```

use crate::config::Config;
use crate::manifest::RunReport;

/// Startup banner: where photos come from, where artifacts go, how
/// renditions are published.
pub fn format_banner(config: &Config) -> Vec<String> {
    let publishing = match &config.cloud {
        Some(cloud) => format!("cloud ({})", cloud.cdn_base_url),
        None => "local (static/photos symlink)".to_string(),
    };
    vec![
        "photopress".to_string(),
        format!("    Library:    {}", config.photos_dir.display()),
        format!("    Site repo:  {}", config.site_repo.display()),
        format!("    Publishing: {publishing}"),
        format!(
            "    Renditions: original {}px, medium {}px, thumbnail {}px @ q{}",
            config.widths.original, config.widths.medium, config.widths.thumbnail,
            config.jpeg_quality
        ),
    ]
}

/// One-line description of what the run will attempt.
pub fn format_run_mode(album_filter: Option<&str>, force: bool) -> String {
    match (album_filter, force) {
        (Some(name), true) => format!("    Mode:       re-render \"{name}\""),
        (Some(name), false) => format!("    Mode:       album \"{name}\" only"),
        (None, true) => "    Mode:       full re-render".to_string(),
        (None, false) => "    Mode:       incremental".to_string(),
    }
}

/// Closing summary for a completed run, including skipped photos.
pub fn format_run_summary(report: &RunReport) -> Vec<String> {
    let mut lines = Vec::new();
    if !report.manifest_written {
        lines.push("No albums found, manifest left untouched".to_string());
        return lines;
    }
    lines.push(format!(
        "Processed {} album{}, refreshed {}, {} in manifest",
        report.processed,
        if report.processed == 1 { "" } else { "s" },
        report.refreshed,
        report.total_albums,
    ));
    for (album, failure) in &report.photo_failures {
        lines.push(format!(
            "    skipped {album}/{}: {}",
            failure.filename, failure.error
        ));
    }
    lines
}

pub fn print_banner(config: &Config, album_filter: Option<&str>, force: bool) {
    for line in format_banner(config) {
        println!("{line}");
    }
    println!("{}", format_run_mode(album_filter, force));
    println!();
}

pub fn print_run_summary(report: &RunReport) {
    for line in format_run_summary(report) {
        println!("{line}");
    }
}
