//! High-level pipeline API: raw export records to model inputs.
//!
//! [`build_bundle`] is the pure, synchronous core. [`run`] wraps it with
//! ingest (live fetch or snapshot replay), the interactive inputs and the
//! artifact writes.
//!
//! # Example
//!
//! ```rust,ignore
//! use adpanel::{run, Config, InputSource, TerminalPrompt};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = Config::from_env()?;
//!     let mut prompt = TerminalPrompt::new();
//!     let outcome = run(&config, &InputSource::Fetch, &mut prompt).await?;
//!
//!     println!("{} weekly rows", outcome.bundle.table.len());
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::PathBuf;

use super::calendar::{add_dimension, regularize_daily, rollup_weekly, Granularity};
use super::classify::classify;
use super::kpi::{resolve_kpi, EventSelector, FixedSelector};
use super::merge::outer_join;
use super::metadata::derive_metadata;
use super::organic::{resolve_organic, ORGANIC_COLUMN};
use super::pivot::{channels_of, pivot_channels};
use crate::artifacts::{ArtifactPaths, ArtifactWriter};
use crate::config::{Config, PanelOptions};
use crate::error::{ConfigError, DataQualityError, PipelineResult};
use crate::ingest::WindsorClient;
use crate::logs::{log_error, log_info, log_info_indent, log_success, log_warning};
use crate::models::{OutputBundle, RawRecord};
use crate::parser::{delimiter_label, load_snapshot};
use crate::prompt::{ask_api_key, ask_kpi, PromptedSelector, Prompter};

/// Name of the date column in the final table.
pub const TIME_COLUMN: &str = "date";

/// Name of the constant geography dimension.
pub const GEO_COLUMN: &str = "geo";

/// Where the raw records come from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    /// Live request to the export endpoint.
    Fetch,
    /// A previously written raw snapshot CSV.
    Replay(PathBuf),
}

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunOutcome {
    pub bundle: OutputBundle,
    /// Files written; empty when artifacts are disabled.
    pub artifacts: ArtifactPaths,
}

/// Build the model inputs from raw records.
///
/// Steps: validate, classify, KPI, organic, pivot, merge, daily calendar,
/// geo + weekly rollup, metadata.
///
/// # Errors
/// - [`DataQualityError::EmptyDataset`] when `records` is empty
/// - [`DataQualityError::NegativeValue`] for a negative activity metric
/// - any KPI resolution failure (no conversion events, zero revenue, selector error)
pub fn build_bundle(
    records: Vec<RawRecord>,
    options: &PanelOptions,
    selector: &mut dyn EventSelector,
) -> PipelineResult<OutputBundle> {
    if records.is_empty() {
        return Err(DataQualityError::EmptyDataset.into());
    }

    // Step 1: Validate
    log_info(format!("🔎 Checking {} raw records...", records.len()));
    for record in &records {
        record.validate()?;
    }

    // Step 2: Classify
    log_info("📂 Classifying records by source...");
    let parts = classify(records, &options.source_tags);
    log_info_indent(
        format!(
            "{} paid, {} analytics, {} search console",
            parts.paid.len(),
            parts.analytics.len(),
            parts.search_console.len()
        ),
        1,
    );

    // Step 3: KPI
    log_info(format!("🎯 Resolving KPI: {}", options.kpi));
    let kpi = resolve_kpi(options.kpi, &parts.analytics, selector).map_err(|e| {
        log_error(format!("KPI '{}' could not be resolved: {}", options.kpi, e));
        e
    })?;
    log_success(format!("KPI '{}' covers {} days", kpi.name, kpi.values.len()));

    // Step 4: Organic control
    log_info("🌱 Resolving organic signal...");
    let (organic, source) = resolve_organic(&parts.search_console, &parts.analytics);
    log_info_indent(format!("from {} over {} days", source.label(), organic.values.len()), 1);

    // Step 5: Pivot paid media
    log_info("📊 Pivoting paid media by channel...");
    let channels = pivot_channels(&parts.paid);
    let channel_names = channels_of(&channels);
    if channel_names.is_empty() {
        log_warning("No paid-media records; the table will have no media columns");
    } else {
        log_success(format!("{} channels: {}", channel_names.len(), channel_names.join(", ")));
    }

    // Step 6: Merge
    log_info("🔗 Merging media, KPI and organic on date...");
    let merged = outer_join(channels, &kpi, &organic);

    // Step 7: Daily calendar
    log_info("📅 Regularizing to a daily calendar...");
    let mut table = regularize_daily(merged, &options.fill);
    log_success(format!("{} daily rows", table.len()));

    // Step 8: Geo + weekly rollup
    add_dimension(&mut table, GEO_COLUMN, &options.geo);
    if options.granularity == Granularity::Weekly {
        log_info("🗓️  Rolling up to weeks ending Saturday...");
        table = rollup_weekly(&table);
        log_success(format!("{} weekly rows", table.len()));
    }

    // Step 9: Metadata
    log_info("🏷️  Deriving media metadata...");
    let controls = vec![ORGANIC_COLUMN.to_string()];
    let meta = derive_metadata(&table, &options.media_metrics, &controls);
    if meta.media_columns.is_empty() {
        log_warning("No media columns matched the configured metrics");
    } else {
        log_success(format!(
            "{} media columns, {} spend columns",
            meta.media_columns.len(),
            meta.media_spend_columns.len()
        ));
        log_info_indent(format!("media channels: {}", meta.channels().join(", ")), 1);
    }

    Ok(OutputBundle {
        start_date: table.first_date(),
        end_date: table.last_date(),
        table,
        time_column: TIME_COLUMN.to_string(),
        geo_column: GEO_COLUMN.to_string(),
        kpi_name: kpi.name,
        controls,
        media_columns: meta.media_columns,
        media_spend_columns: meta.media_spend_columns,
        media_to_channel: meta.media_to_channel,
        media_spend_to_channel: meta.media_spend_to_channel,
    })
}

/// Fetch raw records from the export endpoint.
///
/// Asks for the API key when it is not configured and prompting is allowed.
pub async fn fetch_records(config: &Config, prompter: &mut dyn Prompter) -> PipelineResult<Vec<RawRecord>> {
    let mut ingest = config.ingest.clone();
    if ingest.api_key.is_none() {
        if !config.interactive {
            return Err(ConfigError::MissingApiKey.into());
        }
        ingest.api_key = Some(ask_api_key(prompter)?);
    }

    let client = WindsorClient::new(&ingest)?;
    log_info(format!("🌐 Fetching export from {} ({})...", client.api_url(), ingest.date_preset));
    let records = client.fetch_records().await?;
    log_success(format!("Fetched {} records", records.len()));
    Ok(records)
}

/// Load raw records for `input`.
pub async fn load_records(
    config: &Config,
    input: &InputSource,
    prompter: &mut dyn Prompter,
) -> PipelineResult<Vec<RawRecord>> {
    match input {
        InputSource::Fetch => fetch_records(config, prompter).await,
        InputSource::Replay(path) => {
            log_info(format!("📖 Reading snapshot {}...", path.display()));
            let snapshot = load_snapshot(path)?;
            log_success(format!("Detected encoding: {}", snapshot.encoding));
            log_success(format!("Detected separator: '{}'", delimiter_label(snapshot.delimiter)));
            log_success(format!("Read {} records", snapshot.records.len()));
            Ok(snapshot.records)
        }
    }
}

/// Run the whole pipeline: ingest, build, persist.
///
/// Inputs missing from `config` (API key, KPI, conversion events) are asked
/// through `prompter` when `config.interactive` is set.
pub async fn run(
    config: &Config,
    input: &InputSource,
    prompter: &mut dyn Prompter,
) -> PipelineResult<RunOutcome> {
    let records = load_records(config, input, prompter).await?;

    let writer = if config.write_artifacts {
        Some(ArtifactWriter::new(&config.output_dir)?)
    } else {
        None
    };
    let mut artifacts = ArtifactPaths::default();

    // A replayed snapshot is already on disk.
    if let (Some(writer), InputSource::Fetch) = (&writer, input) {
        artifacts.raw = Some(writer.write_raw(&records)?);
    }

    let kpi = match config.kpi {
        Some(kpi) => kpi,
        None if config.interactive => ask_kpi(prompter)?,
        None => {
            return Err(ConfigError::InvalidValue {
                key: "ADPANEL_KPI".to_string(),
                message: "no KPI configured and prompting is disabled".to_string(),
            }
            .into())
        }
    };
    let options = config.panel_options(kpi);

    let bundle = {
        let mut selector: Box<dyn EventSelector + '_> = match &config.events {
            Some(events) => Box::new(FixedSelector::new(events.clone())),
            None if config.interactive => Box::new(PromptedSelector::new(prompter)),
            None => Box::new(FixedSelector::new(Vec::new())),
        };
        build_bundle(records, &options, selector.as_mut())?
    };

    if let Some(writer) = &writer {
        let table_name = ArtifactWriter::table_file_name(options.granularity);
        artifacts.table = Some(writer.write_table(&bundle.table, table_name)?);
        artifacts.bundle = Some(writer.write_bundle_json(&bundle, table_name)?);
        log_success(format!("Artifacts written to {}", config.output_dir.display()));
    }

    Ok(RunOutcome { bundle, artifacts })
}
