//! # adpanel - advertising exports to marketing-mix model inputs
//!
//! adpanel pulls daily paid-media, analytics and search-console records from
//! a connector export and turns them into one gap-free, weekly panel plus the
//! column metadata a marketing-mix model needs.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │ Export API  │────▶│   Ingest    │────▶│  Transform  │────▶│  Artifacts  │
//! │ or snapshot │     │ (RawRecord) │     │ (Panel+KPI) │     │ (CSV+JSON)  │
//! └─────────────┘     └─────────────┘     └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use adpanel::{build_bundle, FixedSelector, KpiKind, PanelOptions};
//!
//! let records = adpanel::read_snapshot("output/raw_export.csv")?;
//! let mut selector = FixedSelector::new(vec!["purchase".into()]);
//! let bundle = build_bundle(records, &PanelOptions::new(KpiKind::Conversions), &mut selector)?;
//! println!("{} weekly rows", bundle.table.len());
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types per concern
//! - [`models`] - Raw records, panels and the output bundle
//! - [`config`] - Environment-driven run configuration
//! - [`logs`] - Step logging on top of `tracing`
//! - [`ingest`] - Export API client
//! - [`parser`] - Raw snapshot CSV reading
//! - [`transform`] - Classification, KPI, pivot, calendar and pipeline
//! - [`prompt`] - Interactive inputs
//! - [`artifacts`] - Output files

// Core modules
pub mod config;
pub mod error;
pub mod logs;
pub mod models;

// Input
pub mod ingest;
pub mod parser;

// Transformation
pub mod transform;

// Human input
pub mod prompt;

// Output
pub mod artifacts;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    ArtifactError,
    ConfigError,
    CsvError,
    DataQualityError,
    IngestError,
    PipelineError,
    PipelineResult,
    PromptError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{
    Column,
    ColumnData,
    KpiKind,
    Metric,
    OutputBundle,
    Panel,
    RawRecord,
    Series,
};

// =============================================================================
// Re-exports - Config
// =============================================================================

pub use config::{Config, IngestConfig, PanelOptions};

// =============================================================================
// Re-exports - Ingest and snapshots
// =============================================================================

pub use ingest::{records_from_payload, WindsorClient};
pub use parser::{load_snapshot, parse_snapshot_bytes, read_snapshot, Snapshot};

// =============================================================================
// Re-exports - Transform stages
// =============================================================================

pub use transform::{
    classify,
    derive_metadata,
    outer_join,
    pivot_channels,
    regularize_daily,
    resolve_kpi,
    resolve_organic,
    rollup_weekly,
    EventSelector,
    FillPolicy,
    FixedSelector,
    Granularity,
    MediaMetadata,
    SourcePartitions,
    SourceTags,
};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use transform::pipeline::{build_bundle, run, InputSource, RunOutcome};

// =============================================================================
// Re-exports - Prompt and artifacts
// =============================================================================

pub use artifacts::{ArtifactPaths, ArtifactWriter};
pub use prompt::{PromptedSelector, Prompter, ScriptedPrompt, TerminalPrompt};
