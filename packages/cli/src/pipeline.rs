//! End-to-end pipeline: snapshots in, per-location artifacts out.
//!
//! Stages run in order and any failure before publishing aborts the run
//! with nothing published:
//!
//! 1. load the location table from the reference file
//! 2. discover, normalize and aggregate every daily snapshot
//! 3. build per-location series with daily deltas
//! 4. summarize the latest date per location and per country
//! 5. write artifacts under the output directory
//! 6. publish them (per-location series in identity order, then the index)

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use covid_tracker_location::index::{artifact_name, build_index};
use covid_tracker_location::reference::load_locations;
use covid_tracker_publish::artifacts::{
    INDEX_JSON, write_location_index, write_location_series, write_summaries,
};
use covid_tracker_publish::local::LocalSink;
use covid_tracker_publish::retry::{PublishReport, publish_all};
use covid_tracker_publish::s3::S3Sink;
use covid_tracker_publish::ArtifactSink;
use covid_tracker_series::builder::build_series;
use covid_tracker_series::population::{PopulationTable, load_population};
use covid_tracker_series::summary::{country_summaries, location_summaries};
use covid_tracker_snapshot::aggregate::load_all;
use covid_tracker_snapshot::discover::discover_snapshots;
use covid_tracker_snapshot::progress::ProgressCallback;
use covid_tracker_snapshot::registry::all_schemas;
use indicatif::MultiProgress;

use crate::config::{ConfigError, PipelineConfig, SinkKind};
use crate::progress::IndicatifProgress;

/// Errors raised by the orchestrator itself (stage errors pass through).
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// The snapshot directory held no snapshots.
    #[error("No snapshots found in {}", .dir.display())]
    NoSnapshots {
        /// Directory that was scanned.
        dir: PathBuf,
    },

    /// Some artifacts could not be published.
    #[error("{failed} of {total} artifacts failed to publish")]
    PublishFailed {
        /// Number of failed artifacts.
        failed: usize,
        /// Number of artifacts attempted.
        total: usize,
    },
}

/// What a run produced.
#[derive(Debug)]
pub struct RunSummary {
    /// Snapshot files processed.
    pub snapshots: usize,
    /// Daily records after aggregation.
    pub daily_records: usize,
    /// Locations in the index.
    pub locations: usize,
    /// Per-location series written.
    pub series: usize,
    /// Countries summarized.
    pub countries: usize,
    /// Publishing outcome, `None` for `sink = "none"`.
    pub publish: Option<PublishReport>,
}

/// Runs the whole pipeline with `config`.
///
/// Progress bars are added to `multi`.
///
/// # Errors
///
/// Returns the first stage error (unreadable reference file, unrecognized
/// snapshot schema, invalid count, ...) or
/// [`PipelineError::PublishFailed`] after every artifact has been
/// attempted if any failed to publish.
#[allow(clippy::too_many_lines)]
pub async fn run(
    config: &PipelineConfig,
    multi: &MultiProgress,
) -> Result<RunSummary, Box<dyn std::error::Error>> {
    let pipeline_start = Instant::now();
    let base_url = config.publish.base_url()?;

    // --- 1. Locations ---
    let locations = load_locations(&config.reference_file)?;

    // --- 2. Snapshots ---
    let schemas = all_schemas()?;
    let snapshots = discover_snapshots(&config.snapshots_dir, &config.snapshot_date_format)?;
    if snapshots.is_empty() {
        return Err(PipelineError::NoSnapshots {
            dir: config.snapshots_dir.clone(),
        }
        .into());
    }
    let bar = IndicatifProgress::stage_bar(multi, "Loading snapshots");
    let records = load_all(&snapshots, &schemas, &bar)?;

    // --- 3. Series ---
    let series = build_series(&records, config.gap_policy);
    let unlisted = series
        .iter()
        .filter(|s| {
            locations
                .binary_search_by(|l| l.location_id.cmp(&s.location_id))
                .is_err()
        })
        .count();
    if unlisted > 0 {
        log::warn!("{unlisted} locations have case data but no reference entry");
    }

    // --- 4. Summaries ---
    let population = match &config.population_file {
        Some(path) => load_population(path)?,
        None => PopulationTable::default(),
    };
    if population.is_empty() {
        log::info!("No population data, country populations will be null");
    }
    let location_totals = location_summaries(&series);
    let countries = country_summaries(&locations, &location_totals, &population);

    // --- 5. Artifacts ---
    let write_start = Instant::now();
    let bar = IndicatifProgress::stage_bar(multi, "Writing series");
    bar.set_total(series.len() as u64);

    let mut artifacts: Vec<(PathBuf, String)> = Vec::with_capacity(series.len() + 1);
    for s in &series {
        let path = write_location_series(&config.output_dir, s)?;
        artifacts.push((path, artifact_name(&s.location_id)));
        bar.inc(1);
    }
    bar.finish(format!("Wrote {} series", series.len()));
    artifacts.sort_by(|a, b| a.1.cmp(&b.1));

    let index = build_index(&locations, &base_url);
    let index_path = write_location_index(&config.output_dir, &index)?;
    write_summaries(&config.output_dir, &location_totals, &countries)?;
    log::info!(
        "Wrote {} series, {} index entries and {} country summaries to {} in {:.1?}",
        series.len(),
        index.len(),
        countries.len(),
        config.output_dir.display(),
        write_start.elapsed(),
    );

    // --- 6. Publish ---
    let publish = match build_sink(config).await? {
        Some(sink) => {
            artifacts.push((index_path, INDEX_JSON.to_string()));
            let bar = IndicatifProgress::stage_bar(multi, "Publishing");
            let report = publish_all(
                sink.as_ref(),
                &artifacts,
                config.publish.retry_policy(),
                &bar,
            )
            .await;
            if !report.is_success() {
                return Err(PipelineError::PublishFailed {
                    failed: report.failed.len(),
                    total: report.total(),
                }
                .into());
            }
            Some(report)
        }
        None => {
            log::info!("Publishing disabled (sink = \"none\")");
            None
        }
    };

    log::info!("Pipeline complete in {:.1?}", pipeline_start.elapsed());

    Ok(RunSummary {
        snapshots: snapshots.len(),
        daily_records: records.len(),
        locations: locations.len(),
        series: series.len(),
        countries: countries.len(),
        publish,
    })
}

/// Builds the configured sink, or `None` when publishing is disabled.
async fn build_sink(config: &PipelineConfig) -> Result<Option<Box<dyn ArtifactSink>>, ConfigError> {
    let publish = &config.publish;
    let sink: Box<dyn ArtifactSink> = match publish.sink {
        SinkKind::None => return Ok(None),
        SinkKind::Local => Box::new(LocalSink::new(publish.local_dir.clone())),
        SinkKind::S3 => {
            let bucket = publish.bucket.as_deref().ok_or_else(|| {
                ConfigError::Invalid("publish.bucket is required for the s3 sink".to_string())
            })?;
            Box::new(S3Sink::from_env(bucket, publish.region.as_deref(), &publish.base_url()?).await)
        }
    };
    Ok(Some(sink))
}
