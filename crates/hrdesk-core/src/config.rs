//! Client configuration.
//!
//! Settings are layered: built-in defaults, then an optional TOML file, then
//! `HRDESK__*` environment variables (`HRDESK__API__BASE_URL`,
//! `HRDESK__CACHE__TTL_HOURS`, ...). The merged result is validated before
//! use and every problem is reported at once.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::files::MAX_FILE_BYTES;

/// Errors raised while loading or validating configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A source could not be read or merged.
    #[error("Failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// The configuration could not be written.
    #[error("Failed to write {path}: {source}")]
    WriteError {
        /// Target path.
        path: String,
        /// Underlying error.
        source: std::io::Error,
    },

    /// The configuration could not be serialized.
    #[error("Failed to serialize configuration: {0}")]
    SerializeError(#[from] toml::ser::Error),

    /// No platform directory could be determined.
    #[error("Cannot determine the {0} directory for this platform")]
    NoPlatformDir(&'static str),

    /// A single field failed validation.
    #[error("{field}: {message}")]
    ValidationError {
        /// Dotted field path.
        field: String,
        /// What is wrong.
        message: String,
    },

    /// Several fields failed validation.
    #[error("{} configuration problems: {}", .0.len(), join_errors(.0))]
    MultipleValidationErrors(Vec<ConfigError>),
}

fn join_errors(errors: &[ConfigError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Result type for configuration operations.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Backend API settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// Base URL of the REST API, e.g. `https://hr.example.com/api/`.
    pub base_url: String,

    /// Per-request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000/api/".to_string(),
            timeout_secs: 15,
        }
    }
}

/// Download cache settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Cache directory. Defaults to the platform cache directory.
    pub dir: Option<PathBuf>,

    /// How long a downloaded file stays fresh, in hours.
    pub ttl_hours: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            dir: None,
            ttl_hours: 24,
        }
    }
}

/// Attachment limits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UploadConfig {
    /// Largest file accepted for upload, in bytes.
    pub max_file_bytes: u64,
}

impl Default for UploadConfig {
    fn default() -> Self {
        Self {
            max_file_bytes: MAX_FILE_BYTES,
        }
    }
}

/// Calendar settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SystemConfig {
    /// IANA timezone that leave dates are counted in.
    pub timezone: String,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            timezone: "Asia/Kolkata".to_string(),
        }
    }
}

/// Complete client configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend API.
    pub api: ApiConfig,
    /// Download cache.
    pub cache: CacheConfig,
    /// Upload limits.
    pub uploads: UploadConfig,
    /// Calendar settings.
    pub system: SystemConfig,
}

impl Config {
    /// Load configuration from defaults, an optional file and the environment.
    ///
    /// When `path` is `None`, the platform config file is used if it exists.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if a source cannot be parsed or the merged
    /// configuration is invalid.
    pub fn load(path: Option<&Path>) -> ConfigResult<Self> {
        let file = match path {
            Some(p) => Some(p.to_path_buf()),
            None => default_config_path().ok(),
        };

        let mut builder =
            config::Config::builder().add_source(config::Config::try_from(&Self::default())?);
        if let Some(file) = &file {
            debug!(path = %file.display(), "Reading configuration file");
            builder = builder.add_source(config::File::from(file.as_path()).required(false));
        }
        let merged: Self = builder
            .add_source(
                config::Environment::with_prefix("HRDESK")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize()?;

        merged.validate()?;
        Ok(merged)
    }

    /// Write the configuration as TOML.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if serialization or the write fails.
    pub fn save(&self, path: &Path) -> ConfigResult<()> {
        let content = toml::to_string_pretty(self)?;
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::WriteError {
                path: parent.display().to_string(),
                source,
            })?;
        }
        std::fs::write(path, content).map_err(|source| ConfigError::WriteError {
            path: path.display().to_string(),
            source,
        })
    }

    /// Check every field, collecting all problems.
    ///
    /// # Errors
    ///
    /// Returns a single [`ConfigError::ValidationError`] or
    /// [`ConfigError::MultipleValidationErrors`].
    pub fn validate(&self) -> ConfigResult<()> {
        let mut errors = Vec::new();
        let mut fail = |field: &str, message: String| {
            errors.push(ConfigError::ValidationError {
                field: field.to_string(),
                message,
            });
        };

        match url::Url::parse(&self.api.base_url) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => fail(
                "api.base_url",
                format!("unsupported scheme '{}', expected http or https", url.scheme()),
            ),
            Err(e) => fail("api.base_url", format!("'{}' is not a valid URL: {e}", self.api.base_url)),
        }
        if self.api.timeout_secs == 0 {
            fail("api.timeout_secs", "must be greater than zero".to_string());
        }
        if self.cache.ttl_hours == 0 {
            fail("cache.ttl_hours", "must be greater than zero".to_string());
        }
        if self.uploads.max_file_bytes == 0 {
            fail("uploads.max_file_bytes", "must be greater than zero".to_string());
        } else if self.uploads.max_file_bytes > MAX_FILE_BYTES {
            fail(
                "uploads.max_file_bytes",
                format!("must not exceed {MAX_FILE_BYTES} bytes"),
            );
        }
        if self.system.timezone.parse::<Tz>().is_err() {
            fail(
                "system.timezone",
                format!("'{}' is not an IANA timezone", self.system.timezone),
            );
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(ConfigError::MultipleValidationErrors(errors)),
        }
    }

    /// The configured timezone, falling back to UTC if it does not parse.
    #[must_use]
    pub fn timezone(&self) -> Tz {
        self.system.timezone.parse().unwrap_or(chrono_tz::UTC)
    }

    /// Request timeout.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        Duration::from_secs(self.api.timeout_secs)
    }

    /// Download freshness window.
    #[must_use]
    pub const fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_hours * 3600)
    }

    /// Directory for cached downloads.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NoPlatformDir`] if none is configured and the
    /// platform has no cache directory.
    pub fn cache_dir(&self) -> ConfigResult<PathBuf> {
        if let Some(dir) = &self.cache.dir {
            return Ok(dir.clone());
        }
        project_dirs()
            .map(|dirs| dirs.cache_dir().join("files"))
            .ok_or(ConfigError::NoPlatformDir("cache"))
    }
}

fn project_dirs() -> Option<directories::ProjectDirs> {
    directories::ProjectDirs::from("", "", "hrdesk")
}

/// The platform configuration file, e.g. `~/.config/hrdesk/config.toml`.
///
/// # Errors
///
/// Returns [`ConfigError::NoPlatformDir`] if the platform has no config directory.
pub fn default_config_path() -> ConfigResult<PathBuf> {
    project_dirs()
        .map(|dirs| dirs.config_dir().join("config.toml"))
        .ok_or(ConfigError::NoPlatformDir("config"))
}

/// The platform data directory, used for log files.
#[must_use]
pub fn default_data_dir() -> PathBuf {
    project_dirs().map_or_else(
        || PathBuf::from("./.hrdesk"),
        |dirs| dirs.data_dir().to_path_buf(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.timezone(), chrono_tz::Asia::Kolkata);
        assert_eq!(config.cache_ttl(), Duration::from_secs(24 * 3600));
        assert_eq!(config.uploads.max_file_bytes, 5 * 1024 * 1024);
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
            [api]
            base_url = "https://hr.example.com/api/"
            timeout_secs = 30

            [cache]
            ttl_hours = 12
            "#,
        )
        .unwrap();

        let config = Config::load(Some(&path)).unwrap();
        assert_eq!(config.api.base_url, "https://hr.example.com/api/");
        assert_eq!(config.api.timeout_secs, 30);
        assert_eq!(config.cache.ttl_hours, 12);
        assert_eq!(config.system.timezone, "Asia/Kolkata");
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::load(Some(&dir.path().join("absent.toml"))).unwrap();
        assert_eq!(config.api, ApiConfig::default());
    }

    #[test]
    fn test_validation_collects_all_problems() {
        let mut config = Config::default();
        config.api.base_url = "ftp://hr.example.com".into();
        config.api.timeout_secs = 0;
        config.system.timezone = "Mars/Olympus".into();

        match config.validate() {
            Err(ConfigError::MultipleValidationErrors(errors)) => {
                assert_eq!(errors.len(), 3);
                let text = errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n");
                assert!(text.contains("api.base_url"));
                assert!(text.contains("system.timezone"));
            }
            other => panic!("expected multiple errors, got {other:?}"),
        }
    }

    #[test]
    fn test_single_problem_is_reported_directly() {
        let mut config = Config::default();
        config.cache.ttl_hours = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "cache.ttl_hours"
        ));
    }

    #[test]
    fn test_upload_limit_is_capped() {
        let mut config = Config::default();
        config.uploads.max_file_bytes = MAX_FILE_BYTES + 1;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ValidationError { ref field, .. }) if field == "uploads.max_file_bytes"
        ));

        config.uploads.max_file_bytes = MAX_FILE_BYTES;
        assert!(config.validate().is_ok());
        config.uploads.max_file_bytes = 1024;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_save_round_trips_through_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");
        let mut config = Config::default();
        config.cache.dir = Some(dir.path().join("cache"));
        config.save(&path).unwrap();

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.cache_dir().unwrap(), dir.path().join("cache"));
    }
}
