//! Export API client.
//!
//! Retrieves the flat record export from the connector endpoint:
//!
//! ```text
//! GET {api_url}?api_key=...&date_preset=...&fields=date,source,...
//! ```
//!
//! The response is a JSON object whose `data` array holds one object per
//! (date, source, ...) row. No retry: a failed request fails the run.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use adpanel::{Config, WindsorClient};
//!
//! let config = Config::from_env()?;
//! let client = WindsorClient::new(&config.ingest)?;
//! let records = client.fetch_records().await?;
//! ```

use serde_json::Value;
use std::time::Duration;

use crate::config::IngestConfig;
use crate::error::{ConfigError, IngestError, IngestResult, PipelineResult};
use crate::models::RawRecord;

/// How much of an error body is kept in the transport error.
const BODY_EXCERPT_CHARS: usize = 200;

/// Client for the export endpoint.
#[derive(Clone)]
pub struct WindsorClient {
    http: reqwest::Client,
    api_key: String,
    api_url: String,
    date_preset: String,
    fields: Vec<String>,
}

impl WindsorClient {
    /// Create a client from ingest settings.
    ///
    /// Fails with [`ConfigError::MissingApiKey`] when no key is configured.
    pub fn new(config: &IngestConfig) -> PipelineResult<Self> {
        let api_key = config
            .api_key
            .clone()
            .ok_or(ConfigError::MissingApiKey)?;

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(IngestError::from)?;

        Ok(Self {
            http,
            api_key,
            api_url: config.api_url.clone(),
            date_preset: config.date_preset.clone(),
            fields: config.fields.clone(),
        })
    }

    /// Point the client at another endpoint.
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    /// Fetch and decode every record of the export.
    pub async fn fetch_records(&self) -> IngestResult<Vec<RawRecord>> {
        let fields = self.fields.join(",");
        tracing::debug!(url = %self.api_url, preset = %self.date_preset, "requesting export");

        let response = self
            .http
            .get(&self.api_url)
            .query(&[
                ("api_key", self.api_key.as_str()),
                ("date_preset", self.date_preset.as_str()),
                ("fields", fields.as_str()),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            let excerpt: String = body.chars().take(BODY_EXCERPT_CHARS).collect();
            return Err(IngestError::Transport(format!("HTTP {}: {}", status, excerpt)));
        }

        let payload: Value = serde_json::from_str(&body)?;
        records_from_payload(&payload)
    }
}

/// Decode the `data` array of an export payload.
pub fn records_from_payload(payload: &Value) -> IngestResult<Vec<RawRecord>> {
    let data = payload
        .get("data")
        .ok_or_else(|| IngestError::MissingField("data".to_string()))?;

    let rows = data.as_array().ok_or_else(|| IngestError::InvalidField {
        field: "data".to_string(),
        message: "expected an array".to_string(),
    })?;

    rows.iter().map(RawRecord::from_json).collect()
}
