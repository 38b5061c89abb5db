//! Run configuration.
//!
//! Configuration is resolved once at startup into an immutable [`Config`]
//! that is passed explicitly to every component — there is no global state.
//! Two layers feed it, later layers winning:
//!
//! 1. An optional `photopress.toml` file (all keys optional, unknown keys
//!    rejected to catch typos early).
//! 2. Environment variables (`PHOTOS_DIR`, `SITE_REPO`, `USE_CLOUD_STORAGE`,
//!    `ORIGINAL_MAX_WIDTH`, `MEDIUM_WIDTH`, `THUMBNAIL_WIDTH`,
//!    `JPEG_QUALITY`, and the `S3_*`/`CDN_BASE_URL` group).
//!
//! Cloud storage settings are only consulted when `use_cloud_storage` is on;
//! enabling it without endpoint, credentials, bucket, and CDN base URL is a
//! validation error rather than a broken URL at publish time.

use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid value for {name}: {value}")]
    InvalidEnvValue { name: &'static str, value: String },
    #[error("config validation error: {0}")]
    Validation(String),
}

/// Pixel widths for the three rendition tiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RenditionWidths {
    /// Cap for the "original" rendition (sources wider than this are scaled down).
    pub original: u32,
    pub medium: u32,
    pub thumbnail: u32,
}

impl Default for RenditionWidths {
    fn default() -> Self {
        Self {
            original: 4000,
            medium: 1600,
            thumbnail: 400,
        }
    }
}

impl RenditionWidths {
    /// Tier names with their target widths, in processing order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, u32)> {
        [
            ("original", self.original),
            ("medium", self.medium),
            ("thumbnail", self.thumbnail),
        ]
        .into_iter()
    }
}

/// S3-compatible storage settings, present only when cloud publishing is on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CloudConfig {
    pub endpoint: String,
    pub access_key: String,
    pub secret_key: String,
    pub bucket: String,
    /// Base URL the published keys are served from.
    pub cdn_base_url: String,
}

/// Effective run configuration, immutable after [`Config::load`].
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Root directory containing one subdirectory per album.
    pub photos_dir: PathBuf,
    /// Root of the static-site repository (manifest and content stubs land here).
    pub site_repo: PathBuf,
    pub widths: RenditionWidths,
    pub jpeg_quality: u8,
    /// `Some` when renditions are published to object storage, `None` for
    /// local-path URLs plus the `static/photos` symlink.
    pub cloud: Option<CloudConfig>,
}

/// Raw file-layer config: everything optional, sparse on purpose.
#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct FileConfig {
    photos_dir: Option<String>,
    site_repo: Option<String>,
    use_cloud_storage: Option<bool>,
    original_max_width: Option<u32>,
    medium_width: Option<u32>,
    thumbnail_width: Option<u32>,
    jpeg_quality: Option<u8>,
    s3_endpoint: Option<String>,
    s3_access_key: Option<String>,
    s3_secret_key: Option<String>,
    s3_bucket: Option<String>,
    cdn_base_url: Option<String>,
}

impl Config {
    /// Resolve configuration from an optional TOML file plus the environment.
    ///
    /// A missing file is fine (defaults apply); a malformed one is an error.
    pub fn load(config_path: &Path) -> Result<Self, ConfigError> {
        let file = if config_path.exists() {
            let content = fs::read_to_string(config_path)?;
            toml::from_str(&content)?
        } else {
            FileConfig::default()
        };
        Self::resolve(file, |name| env::var(name).ok())
    }

    /// Merge the file layer with an environment lookup (injectable for tests).
    fn resolve(
        file: FileConfig,
        env: impl Fn(&'static str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let photos_dir = env("PHOTOS_DIR")
            .or(file.photos_dir)
            .unwrap_or_else(|| "~/Pictures/albums".to_string());
        let site_repo = env("SITE_REPO")
            .or(file.site_repo)
            .unwrap_or_else(|| ".".to_string());

        let use_cloud = match env("USE_CLOUD_STORAGE") {
            Some(v) => v.to_lowercase() == "true",
            None => file.use_cloud_storage.unwrap_or(false),
        };

        let widths = RenditionWidths {
            original: env_u32(&env, "ORIGINAL_MAX_WIDTH")?
                .or(file.original_max_width)
                .unwrap_or(4000),
            medium: env_u32(&env, "MEDIUM_WIDTH")?
                .or(file.medium_width)
                .unwrap_or(1600),
            thumbnail: env_u32(&env, "THUMBNAIL_WIDTH")?
                .or(file.thumbnail_width)
                .unwrap_or(400),
        };

        let jpeg_quality = match env("JPEG_QUALITY") {
            Some(v) => v.parse::<u8>().map_err(|_| ConfigError::InvalidEnvValue {
                name: "JPEG_QUALITY",
                value: v,
            })?,
            None => file.jpeg_quality.unwrap_or(85),
        };

        let cloud = if use_cloud {
            let endpoint = env("S3_ENDPOINT").or(file.s3_endpoint);
            let access_key = env("S3_ACCESS_KEY").or(file.s3_access_key);
            let secret_key = env("S3_SECRET_KEY").or(file.s3_secret_key);
            let bucket = env("S3_BUCKET")
                .or(file.s3_bucket)
                .unwrap_or_else(|| "photos".to_string());
            let cdn_base_url = env("CDN_BASE_URL").or(file.cdn_base_url);
            match (endpoint, access_key, secret_key, cdn_base_url) {
                (Some(endpoint), Some(access_key), Some(secret_key), Some(cdn_base_url)) => {
                    Some(CloudConfig {
                        endpoint,
                        access_key,
                        secret_key,
                        bucket,
                        cdn_base_url,
                    })
                }
                _ => {
                    return Err(ConfigError::Validation(
                        "cloud storage enabled but S3_ENDPOINT, S3_ACCESS_KEY, \
                         S3_SECRET_KEY, or CDN_BASE_URL is missing"
                            .into(),
                    ));
                }
            }
        } else {
            None
        };

        let config = Self {
            photos_dir: expand_home(&photos_dir),
            site_repo: expand_home(&site_repo),
            widths,
            jpeg_quality,
            cloud,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jpeg_quality == 0 || self.jpeg_quality > 100 {
            return Err(ConfigError::Validation("jpeg_quality must be 1-100".into()));
        }
        for (name, width) in self.widths.iter() {
            if width == 0 {
                return Err(ConfigError::Validation(format!(
                    "{name} width must be non-zero"
                )));
            }
        }
        Ok(())
    }
}

fn env_u32(
    env: &impl Fn(&'static str) -> Option<String>,
    name: &'static str,
) -> Result<Option<u32>, ConfigError> {
    match env(name) {
        Some(v) => v
            .parse::<u32>()
            .map(Some)
            .map_err(|_| ConfigError::InvalidEnvValue { name, value: v }),
        None => Ok(None),
    }
}

/// Expand a leading `~/` against `$HOME`. Paths without the prefix pass through.
fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = env::var_os("HOME") {
            return PathBuf::from(home).join(rest);
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn no_env(_: &'static str) -> Option<String> {
        None
    }

    fn env_from(map: HashMap<&'static str, &'static str>) -> impl Fn(&'static str) -> Option<String> {
        move |name| map.get(name).map(|v| v.to_string())
    }

    #[test]
    fn defaults_without_file_or_env() {
        let config = Config::resolve(FileConfig::default(), no_env).unwrap();
        assert_eq!(config.widths, RenditionWidths::default());
        assert_eq!(config.jpeg_quality, 85);
        assert!(config.cloud.is_none());
        assert_eq!(config.site_repo, PathBuf::from("."));
    }

    #[test]
    fn load_missing_file_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = Config::load(&tmp.path().join("absent.toml")).unwrap();
        assert_eq!(config.jpeg_quality, 85);
    }

    #[test]
    fn file_values_applied() {
        let file: FileConfig = toml::from_str(
            r#"
photos_dir = "/data/albums"
medium_width = 1200
jpeg_quality = 92
"#,
        )
        .unwrap();
        let config = Config::resolve(file, no_env).unwrap();
        assert_eq!(config.photos_dir, PathBuf::from("/data/albums"));
        assert_eq!(config.widths.medium, 1200);
        assert_eq!(config.widths.original, 4000);
        assert_eq!(config.jpeg_quality, 92);
    }

    #[test]
    fn env_overrides_file() {
        let file: FileConfig = toml::from_str(r#"medium_width = 1200"#).unwrap();
        let env = env_from(HashMap::from([("MEDIUM_WIDTH", "800")]));
        let config = Config::resolve(file, env).unwrap();
        assert_eq!(config.widths.medium, 800);
    }

    #[test]
    fn unknown_file_key_rejected() {
        let result: Result<FileConfig, _> = toml::from_str(r#"jpg_quality = 80"#);
        assert!(result.is_err());
    }

    #[test]
    fn cloud_enabled_requires_full_settings() {
        let env = env_from(HashMap::from([("USE_CLOUD_STORAGE", "true")]));
        let result = Config::resolve(FileConfig::default(), env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn cloud_settings_resolved_from_env() {
        let env = env_from(HashMap::from([
            ("USE_CLOUD_STORAGE", "true"),
            ("S3_ENDPOINT", "https://s3.example.com"),
            ("S3_ACCESS_KEY", "key"),
            ("S3_SECRET_KEY", "secret"),
            ("CDN_BASE_URL", "https://cdn.example.com"),
        ]));
        let config = Config::resolve(FileConfig::default(), env).unwrap();
        let cloud = config.cloud.unwrap();
        assert_eq!(cloud.bucket, "photos");
        assert_eq!(cloud.cdn_base_url, "https://cdn.example.com");
    }

    #[test]
    fn cloud_flag_parsing_is_lenient() {
        let env = env_from(HashMap::from([("USE_CLOUD_STORAGE", "False")]));
        let config = Config::resolve(FileConfig::default(), env).unwrap();
        assert!(config.cloud.is_none());
    }

    #[test]
    fn invalid_env_number_is_error() {
        let env = env_from(HashMap::from([("JPEG_QUALITY", "lots")]));
        let result = Config::resolve(FileConfig::default(), env);
        assert!(matches!(result, Err(ConfigError::InvalidEnvValue { .. })));
    }

    #[test]
    fn zero_width_rejected() {
        let file: FileConfig = toml::from_str(r#"thumbnail_width = 0"#).unwrap();
        let result = Config::resolve(file, no_env);
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn quality_bounds_enforced() {
        let file: FileConfig = toml::from_str(r#"jpeg_quality = 0"#).unwrap();
        assert!(Config::resolve(file, no_env).is_err());
    }

    #[test]
    fn tilde_expanded_against_home() {
        let expanded = expand_home("~/Pictures/albums");
        if let Some(home) = env::var_os("HOME") {
            assert_eq!(expanded, PathBuf::from(home).join("Pictures/albums"));
        }
        assert_eq!(expand_home("/abs/path"), PathBuf::from("/abs/path"));
    }

    #[test]
    fn widths_iterate_in_processing_order() {
        let names: Vec<&str> = RenditionWidths::default().iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["original", "medium", "thumbnail"]);
    }
}
