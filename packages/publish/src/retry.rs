//! Retry with exponential backoff and batch publishing.
//!
//! Transient failures (see [`PublishError::is_transient`]) are retried
//! with delays of `base_delay × 2^(attempt - 1)`; permanent failures are
//! returned immediately. [`publish_all`] publishes a batch sequentially,
//! each artifact at most once, and collects every outcome into a
//! [`PublishReport`] instead of stopping at the first failure.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use covid_tracker_snapshot::progress::ProgressCallback;

use crate::{ArtifactSink, PublishError, Published};

/// Default maximum attempts per artifact (initial + retries).
pub const DEFAULT_MAX_ATTEMPTS: u32 = 4;

/// Default delay before the first retry.
pub const DEFAULT_BASE_DELAY: Duration = Duration::from_secs(1);

/// How often and how patiently to retry a transient failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Maximum attempts per artifact, including the first. At least 1.
    pub max_attempts: u32,
    /// Delay before the first retry; doubles each attempt.
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            base_delay: DEFAULT_BASE_DELAY,
        }
    }
}

impl RetryPolicy {
    /// Delay to wait after failed attempt number `attempt` (1-based).
    #[must_use]
    pub fn delay_after(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2u32.saturating_pow(attempt.saturating_sub(1)))
    }
}

/// Publishes one artifact, retrying transient failures per `policy`.
///
/// # Errors
///
/// Returns the error of a permanent failure as-is, or
/// [`PublishError::Exhausted`] wrapping the last transient error once
/// `policy.max_attempts` have failed.
pub async fn publish_with_retry(
    sink: &dyn ArtifactSink,
    local_path: &Path,
    name: &str,
    policy: RetryPolicy,
) -> Result<Published, PublishError> {
    let max_attempts = policy.max_attempts.max(1);
    let mut attempt = 0;

    loop {
        attempt += 1;
        match sink.publish(local_path, name).await {
            Ok(published) => return Ok(published),
            Err(e) if e.is_transient() && attempt < max_attempts => {
                let delay = policy.delay_after(attempt);
                log::warn!(
                    "  {name}: attempt {attempt}/{max_attempts} failed ({e}), \
                     retrying in {delay:.1?}..."
                );
                tokio::time::sleep(delay).await;
            }
            Err(e) if e.is_transient() => {
                return Err(PublishError::Exhausted {
                    name: name.to_string(),
                    attempts: attempt,
                    source: Box::new(e),
                });
            }
            Err(e) => return Err(e),
        }
    }
}

/// Outcome of publishing a batch of artifacts.
#[derive(Debug, Default)]
pub struct PublishReport {
    /// `(name, url)` of every artifact that was transferred.
    pub published: Vec<(String, String)>,
    /// Names of artifacts the sink already held unchanged.
    pub unchanged: Vec<String>,
    /// `(name, error)` of every artifact that could not be published.
    pub failed: Vec<(String, PublishError)>,
}

impl PublishReport {
    /// Records one artifact's outcome.
    pub fn record(&mut self, name: &str, result: Result<Published, PublishError>) {
        match result {
            Ok(Published {
                unchanged: true, ..
            }) => self.unchanged.push(name.to_string()),
            Ok(Published { url, .. }) => self.published.push((name.to_string(), url)),
            Err(e) => self.failed.push((name.to_string(), e)),
        }
    }

    /// `true` when no artifact failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }

    /// Total number of artifacts attempted.
    #[must_use]
    pub fn total(&self) -> usize {
        self.published.len() + self.unchanged.len() + self.failed.len()
    }
}

impl fmt::Display for PublishReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} published, {} skipped (unchanged), {} failed",
            self.published.len(),
            self.unchanged.len(),
            self.failed.len()
        )
    }
}

/// Publishes `artifacts` (`(local_path, name)` pairs) in the given order.
///
/// Every artifact is attempted exactly once (with retries); failures are
/// logged and collected rather than aborting the batch.
pub async fn publish_all(
    sink: &dyn ArtifactSink,
    artifacts: &[(PathBuf, String)],
    policy: RetryPolicy,
    progress: &Arc<dyn ProgressCallback>,
) -> PublishReport {
    log::info!(
        "Publishing {} artifacts to {}",
        artifacts.len(),
        sink.describe()
    );
    progress.set_total(artifacts.len() as u64);

    let mut report = PublishReport::default();
    for (path, name) in artifacts {
        progress.set_message(name.clone());
        let result = publish_with_retry(sink, path, name, policy).await;
        if let Err(e) = &result {
            log::error!("Failed to publish {name}: {e}");
        }
        report.record(name, result);
        progress.inc(1);
    }

    progress.finish(format!("Published to {}", sink.describe()));
    log::info!("Publish complete: {report}");
    report
}
