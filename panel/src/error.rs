//! Error types for the adpanel pipeline.
//!
//! One enum per concern, mirroring how a run can fail:
//!
//! - [`IngestError`] - transport and schema failures while fetching records
//! - [`DataQualityError`] - data that parsed fine but cannot feed a model
//! - [`PromptError`] - failures at the human-input boundary
//! - [`CsvError`] - raw snapshot parsing errors
//! - [`ArtifactError`] - failures while persisting output files
//! - [`ConfigError`] - invalid or missing configuration
//! - [`PipelineError`] - top-level orchestration errors
//!
//! Conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.

use chrono::NaiveDate;
use thiserror::Error;

// =============================================================================
// Ingest Errors
// =============================================================================

/// Errors while retrieving or decoding raw export records.
#[derive(Debug, Error)]
pub enum IngestError {
    /// HTTP request failed or the endpoint answered with a non-success status.
    #[error("Transport error: {0}")]
    Transport(String),

    /// An expected field is absent from the payload.
    #[error("Missing field: {0}")]
    MissingField(String),

    /// A field is present but its value cannot be interpreted.
    #[error("Invalid value for field '{field}': {message}")]
    InvalidField { field: String, message: String },

    /// Response body is not valid JSON.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<reqwest::Error> for IngestError {
    fn from(err: reqwest::Error) -> Self {
        IngestError::Transport(err.to_string())
    }
}

// =============================================================================
// Data Quality Errors
// =============================================================================

/// The data is well-formed but unusable as model input.
#[derive(Debug, Error)]
pub enum DataQualityError {
    /// The export returned no records at all.
    #[error("Ingested dataset is empty")]
    EmptyDataset,

    /// Revenue KPI selected but every revenue value sums to zero.
    #[error("Total revenue is zero; check that the export includes a revenue field")]
    ZeroRevenue,

    /// Conversions KPI selected but no record is flagged as a conversion event.
    #[error("No conversion events found in analytics data")]
    NoConversionEvents,

    /// A flow metric that must be non-negative is negative.
    #[error("Negative {field} on {date} for source '{source_tag}'")]
    NegativeValue {
        field: String,
        date: NaiveDate,
        source_tag: String,
    },
}

// =============================================================================
// Prompt Errors
// =============================================================================

/// Failures at the human-input boundary.
#[derive(Debug, Error)]
pub enum PromptError {
    /// Reading from or writing to the terminal failed.
    #[error("Prompt IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A scripted prompter ran out of answers.
    #[error("No more answers available for prompt: {0}")]
    Exhausted(String),

    /// A preset event selection contains unknown names.
    #[error("Invalid event names: {}", .0.join(", "))]
    InvalidSelection(Vec<String>),

    /// A preset event selection is empty.
    #[error("No event names selected")]
    EmptySelection,
}

// =============================================================================
// Snapshot CSV Errors
// =============================================================================

/// Errors while reading a raw export snapshot.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    IoError(#[from] std::io::Error),

    /// Invalid CSV format.
    #[error("Invalid CSV format: {0}")]
    ParseError(String),

    /// Empty file.
    #[error("CSV file is empty")]
    EmptyFile,

    /// A required column is absent from the header.
    #[error("Missing column: {0}")]
    MissingColumn(String),
}

impl From<csv::Error> for CsvError {
    fn from(err: csv::Error) -> Self {
        CsvError::ParseError(err.to_string())
    }
}

// =============================================================================
// Artifact Errors
// =============================================================================

/// Errors while writing output files.
#[derive(Debug, Error)]
pub enum ArtifactError {
    /// IO error.
    #[error("Artifact IO error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writer error.
    #[error("Artifact CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON error.
    #[error("Artifact JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

// =============================================================================
// Config Errors
// =============================================================================

/// Errors while assembling configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No API key in flags or environment and prompting is disabled.
    #[error("Missing API key: set WINDSOR_API_KEY or pass --api-key")]
    MissingApiKey,

    /// A setting has an unusable value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline errors.
///
/// This is the error type returned by [`crate::transform::pipeline::build_bundle`]
/// and [`crate::transform::pipeline::run`].
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Ingest error.
    #[error("Ingest error: {0}")]
    Ingest(#[from] IngestError),

    /// Data quality error.
    #[error("Data quality error: {0}")]
    DataQuality(#[from] DataQualityError),

    /// Prompt error.
    #[error("Input error: {0}")]
    Prompt(#[from] PromptError),

    /// Snapshot parsing error.
    #[error("CSV error: {0}")]
    Csv(#[from] CsvError),

    /// Artifact error.
    #[error("Artifact error: {0}")]
    Artifact(#[from] ArtifactError),

    /// Configuration error.
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for ingest operations.
pub type IngestResult<T> = Result<T, IngestError>;

/// Result type for snapshot parsing.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for artifact writing.
pub type ArtifactResult<T> = Result<T, ArtifactError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;
