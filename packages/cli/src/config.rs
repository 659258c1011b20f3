//! Pipeline configuration.
//!
//! Loaded from a TOML file and optionally overridden from the command
//! line. Paths are used as written (relative paths resolve against the
//! working directory).
//!
//! ```toml
//! reference_file = "data/time_series_19-covid-Confirmed.csv"
//! snapshots_dir = "data/csse_covid_19_daily_reports"
//! population_file = "data/world_population.csv"
//! output_dir = "output"
//! gap_policy = "last_seen"
//!
//! [publish]
//! sink = "s3"
//! bucket = "thecodinginterface-covid"
//! ```

use std::path::{Path, PathBuf};
use std::time::Duration;

use covid_tracker_location::index::default_base_url;
use covid_tracker_publish::retry::{DEFAULT_MAX_ATTEMPTS, RetryPolicy};
use covid_tracker_series_models::GapPolicy;
use covid_tracker_snapshot::discover::DEFAULT_DATE_FORMAT;
use serde::Deserialize;
use strum_macros::{AsRefStr, Display, EnumString};

/// Errors that can occur while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("Failed to read config {}: {source}", .path.display())]
    Read {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML for [`PipelineConfig`].
    #[error("Failed to parse config {}: {source}", .path.display())]
    Parse {
        /// Path of the configuration file.
        path: PathBuf,
        /// Underlying TOML error.
        source: toml::de::Error,
    },

    /// The configuration is well-formed but unusable.
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Where finished artifacts are published.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Display, EnumString, AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SinkKind {
    /// Write artifacts locally only.
    #[default]
    None,
    /// Copy artifacts into `publish.local_dir`.
    Local,
    /// Upload artifacts to `publish.bucket`.
    S3,
}

/// Top-level pipeline configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PipelineConfig {
    /// Wide confirmed-cases CSV that lists every location.
    pub reference_file: PathBuf,
    /// Directory of daily snapshot CSVs.
    pub snapshots_dir: PathBuf,
    /// Optional `country_region,population` CSV.
    #[serde(default)]
    pub population_file: Option<PathBuf>,
    /// Directory artifacts are written to.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    /// `chrono` format of snapshot file stems.
    #[serde(default = "default_date_format")]
    pub snapshot_date_format: String,
    /// Delta policy across missing dates.
    #[serde(default)]
    pub gap_policy: GapPolicy,
    /// Publishing settings.
    #[serde(default)]
    pub publish: PublishConfig,
}

/// `[publish]` table.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublishConfig {
    /// Where artifacts go.
    #[serde(default)]
    pub sink: SinkKind,
    /// S3 bucket (required for `sink = "s3"`).
    #[serde(default)]
    pub bucket: Option<String>,
    /// Public base URL embedded in the location index. Derived from the
    /// bucket (or the local directory) when absent.
    #[serde(default)]
    pub base_url: Option<String>,
    /// AWS region override.
    #[serde(default)]
    pub region: Option<String>,
    /// Target directory for `sink = "local"`.
    #[serde(default = "default_local_dir")]
    pub local_dir: PathBuf,
    /// Attempts per artifact, including the first.
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_retry_base_delay_ms")]
    pub retry_base_delay_ms: u64,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            sink: SinkKind::default(),
            bucket: None,
            base_url: None,
            region: None,
            local_dir: default_local_dir(),
            max_attempts: default_max_attempts(),
            retry_base_delay_ms: default_retry_base_delay_ms(),
        }
    }
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("output")
}

fn default_date_format() -> String {
    DEFAULT_DATE_FORMAT.to_string()
}

fn default_local_dir() -> PathBuf {
    PathBuf::from("public")
}

const fn default_max_attempts() -> u32 {
    DEFAULT_MAX_ATTEMPTS
}

const fn default_retry_base_delay_ms() -> u64 {
    1000
}

/// Command-line overrides applied on top of the file.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    /// Replaces `reference_file`.
    pub reference_file: Option<PathBuf>,
    /// Replaces `snapshots_dir`.
    pub snapshots_dir: Option<PathBuf>,
    /// Replaces `population_file`.
    pub population_file: Option<PathBuf>,
    /// Replaces `output_dir`.
    pub output_dir: Option<PathBuf>,
    /// Replaces `gap_policy`.
    pub gap_policy: Option<GapPolicy>,
    /// Replaces `publish.sink`.
    pub sink: Option<SinkKind>,
    /// Replaces `publish.bucket`.
    pub bucket: Option<String>,
}

impl PipelineConfig {
    /// Reads and validates the configuration at `path`, then applies
    /// `overrides`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed, or
    /// the resulting configuration is invalid.
    pub fn load(path: &Path, overrides: Overrides) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.apply(overrides);
        config.validate()?;
        Ok(config)
    }

    /// Parses a TOML document without validating it.
    ///
    /// # Errors
    ///
    /// Returns the TOML error if the document does not match the schema.
    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::de::from_str(text)
    }

    /// Applies command-line overrides.
    pub fn apply(&mut self, overrides: Overrides) {
        if let Some(v) = overrides.reference_file {
            self.reference_file = v;
        }
        if let Some(v) = overrides.snapshots_dir {
            self.snapshots_dir = v;
        }
        if let Some(v) = overrides.population_file {
            self.population_file = Some(v);
        }
        if let Some(v) = overrides.output_dir {
            self.output_dir = v;
        }
        if let Some(v) = overrides.gap_policy {
            self.gap_policy = v;
        }
        if let Some(v) = overrides.sink {
            self.publish.sink = v;
        }
        if let Some(v) = overrides.bucket {
            self.publish.bucket = Some(v);
        }
    }

    /// Checks cross-field constraints.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the S3 sink has no bucket,
    /// `max_attempts` is zero, or no base URL can be derived.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.publish.sink == SinkKind::S3 && self.publish.bucket.is_none() {
            return Err(ConfigError::Invalid(
                "publish.bucket is required when publish.sink = \"s3\"".to_string(),
            ));
        }
        if self.publish.max_attempts == 0 {
            return Err(ConfigError::Invalid(
                "publish.max_attempts must be at least 1".to_string(),
            ));
        }
        self.publish.base_url().map(|_| ())
    }
}

impl PublishConfig {
    /// The base URL artifact URLs are built from.
    ///
    /// Explicit `base_url` wins, then the bucket's public endpoint, then
    /// (for the local sink) a `file://` URL of `local_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when none of those is available.
    pub fn base_url(&self) -> Result<String, ConfigError> {
        if let Some(base_url) = &self.base_url {
            return Ok(base_url.trim_end_matches('/').to_string());
        }
        if let Some(bucket) = &self.bucket {
            return Ok(default_base_url(bucket));
        }
        if self.sink == SinkKind::Local {
            let dir = std::path::absolute(&self.local_dir).unwrap_or_else(|_| self.local_dir.clone());
            return Ok(format!("file://{}", dir.display()));
        }
        Err(ConfigError::Invalid(
            "publish.base_url or publish.bucket is required to build the location index"
                .to_string(),
        ))
    }

    /// Retry policy for the sink.
    #[must_use]
    pub const fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            base_delay: Duration::from_millis(self.retry_base_delay_ms),
        }
    }
}
