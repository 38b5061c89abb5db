use clap::Parser;
use photopress::config::Config;
use photopress::manifest::Reconciler;
use photopress::output;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "photopress")]
#[command(about = "Batch photo-album publishing for a Hugo site")]
#[command(long_about = "\
Batch photo-album publishing for a Hugo site

Your photo library is the data source: each subdirectory of the library is
one album. A run renders three JPEG tiers per photo, extracts camera
metadata, publishes renditions (locally or to S3-compatible storage), and
merges every album into the site's data/albums.yaml manifest plus a content
stub per album.

Library structure:

  albums/
  ├── Paris Trip 2024/             # Album (directory name → slug paris-trip-2024)
  │   ├── album.yaml               # Optional metadata (title, date, tags, ...)
  │   ├── dawn.jpg                 # Source photo
  │   └── original/ medium/ thumbnail/   # Renditions, created by this tool
  └── Tokyo/
      ├── album.txt                # Plain-text fallback: title, then description
      └── shibuya.jpg

Albums whose renditions are already complete get a cheap metadata-only
refresh; use --force to re-render everything. Configuration comes from
photopress.toml plus environment overrides (PHOTOS_DIR, SITE_REPO,
USE_CLOUD_STORAGE, S3_*, CDN_BASE_URL, ...).")]
#[command(version)]
struct Cli {
    /// Process only the album with this directory name
    #[arg(long)]
    album: Option<String>,

    /// Re-render all renditions even when they already exist
    #[arg(long)]
    force: bool,

    /// Print the resolved configuration and exit without touching anything
    #[arg(long)]
    dry_run: bool,

    /// Configuration file
    #[arg(long, default_value = "photopress.toml")]
    config: PathBuf,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    output::print_banner(&config, cli.album.as_deref(), cli.force);

    if cli.dry_run {
        println!("Dry run: no changes made");
        return Ok(());
    }

    let reconciler = Reconciler::new(&config);
    let report = reconciler.run(cli.album.as_deref(), cli.force)?;
    output::print_run_summary(&report);
    Ok(())
}
