#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Artifact writing and publishing.
//!
//! [`artifacts`] serializes per-location series, the location index and
//! the latest-date summaries under the output directory. Finished files
//! are handed to an [`ArtifactSink`]: [`s3::S3Sink`] uploads to a public
//! bucket, [`local::LocalSink`] copies into a directory. [`retry`] wraps
//! any sink with exponential backoff for transient failures.
//!
//! ## Smart sync
//!
//! The S3 sink compares the remote object's size and MD5 `ETag` with the
//! local file and skips the upload when they match, so re-running the
//! pipeline on unchanged data transfers nothing.

pub mod artifacts;
pub mod local;
pub mod retry;
pub mod s3;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

/// Errors that can occur while writing or publishing artifacts.
#[derive(Debug, thiserror::Error)]
pub enum PublishError {
    /// I/O error reading or writing a local file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization or parsing failed.
    #[error("JSON error in {}: {source}", .file.display())]
    Json {
        /// Artifact being written or read.
        file: PathBuf,
        /// Underlying JSON error.
        source: serde_json::Error,
    },

    /// CSV serialization failed.
    #[error("CSV error in {}: {source}", .file.display())]
    Csv {
        /// Artifact being written.
        file: PathBuf,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// The artifact to publish does not exist locally.
    #[error("Artifact {} does not exist", .path.display())]
    MissingArtifact {
        /// Expected local path.
        path: PathBuf,
    },

    /// S3 `PutObject` failed.
    #[error("Failed to upload s3://{bucket}/{key}: {source}")]
    Upload {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Whether retrying may succeed.
        transient: bool,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// S3 `HeadObject` failed for a reason other than a missing object.
    #[error("Failed to head s3://{bucket}/{key}: {source}")]
    Head {
        /// Bucket name.
        bucket: String,
        /// Object key.
        key: String,
        /// Whether retrying may succeed.
        transient: bool,
        /// Underlying SDK error.
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Every attempt failed with a transient error.
    #[error("Giving up on {name} after {attempts} attempts: {source}")]
    Exhausted {
        /// Artifact name.
        name: String,
        /// Attempts made.
        attempts: u32,
        /// Error from the final attempt.
        source: Box<Self>,
    },
}

impl PublishError {
    /// Whether the failed operation may succeed if retried.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        match self {
            Self::Upload { transient, .. } | Self::Head { transient, .. } => *transient,
            Self::Io(_)
            | Self::Json { .. }
            | Self::Csv { .. }
            | Self::MissingArtifact { .. }
            | Self::Exhausted { .. } => false,
        }
    }
}

/// Outcome of publishing one artifact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Published {
    /// Public URL of the artifact.
    pub url: String,
    /// `true` when the sink already held identical content and nothing
    /// was transferred.
    pub unchanged: bool,
}

/// Destination for finished artifacts.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    /// Short human-readable description for logs (e.g. `s3://bucket`).
    fn describe(&self) -> String;

    /// Publishes the file at `local_path` under `name` and returns its
    /// public URL.
    ///
    /// # Errors
    ///
    /// Returns a [`PublishError`]; [`PublishError::is_transient`] tells
    /// the caller whether a retry may succeed.
    async fn publish(&self, local_path: &Path, name: &str) -> Result<Published, PublishError>;
}
