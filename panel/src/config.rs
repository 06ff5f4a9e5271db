//! Run configuration.
//!
//! Values come from the environment (after `.env` is loaded by the binary)
//! and are then overridden by command-line flags. The resulting [`Config`]
//! is passed explicitly into the ingest client and the pipeline; nothing
//! reads the environment after this point.

use std::fmt;
use std::path::PathBuf;

use crate::error::ConfigError;
use crate::models::{KpiKind, Metric};
use crate::transform::calendar::{FillPolicy, Granularity};
use crate::transform::classify::SourceTags;

pub const DEFAULT_API_URL: &str = "https://connectors.windsor.ai/all";
pub const DEFAULT_DATE_PRESET: &str = "last_1y";
pub const DEFAULT_GEO: &str = "national";
pub const DEFAULT_OUTPUT_DIR: &str = "output";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Channel metrics that count as media signals unless configured otherwise.
pub const DEFAULT_MEDIA_METRICS: [Metric; 2] = [Metric::Impressions, Metric::Clicks];

/// Fields requested from the export endpoint.
pub const DEFAULT_FIELDS: &[&str] = &[
    "date",
    "source",
    "impressions",
    "clicks",
    "spend",
    "event_name",
    "event_count",
    "is_conversion_event",
    "medium",
    "sessions",
    "revenue_amount",
];

/// Settings for the export endpoint.
#[derive(Clone)]
pub struct IngestConfig {
    pub api_key: Option<String>,
    pub api_url: String,
    pub date_preset: String,
    pub fields: Vec<String>,
    pub timeout_secs: u64,
}

impl fmt::Debug for IngestConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IngestConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "[redacted]"))
            .field("api_url", &self.api_url)
            .field("date_preset", &self.date_preset)
            .field("fields", &self.fields)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// Settings that shape the panel itself.
#[derive(Debug, Clone)]
pub struct PanelOptions {
    pub kpi: KpiKind,
    pub source_tags: SourceTags,
    pub geo: String,
    pub fill: FillPolicy,
    /// Metrics whose channel columns count as media signals.
    pub media_metrics: Vec<Metric>,
    pub granularity: Granularity,
}

impl PanelOptions {
    pub fn new(kpi: KpiKind) -> Self {
        Self {
            kpi,
            source_tags: SourceTags::default(),
            geo: DEFAULT_GEO.to_string(),
            fill: FillPolicy::default(),
            media_metrics: DEFAULT_MEDIA_METRICS.to_vec(),
            granularity: Granularity::Weekly,
        }
    }
}

/// Complete run configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub ingest: IngestConfig,
    /// KPI chosen up front; prompted for when `None`.
    pub kpi: Option<KpiKind>,
    /// Preset conversion events; prompted for when `None`.
    pub events: Option<Vec<String>>,
    pub source_tags: SourceTags,
    pub geo: String,
    pub fill: FillPolicy,
    pub media_metrics: Vec<Metric>,
    pub granularity: Granularity,
    pub output_dir: PathBuf,
    pub write_artifacts: bool,
    /// Whether missing inputs may be asked for interactively.
    pub interactive: bool,
    pub log_level: String,
}

impl Config {
    /// Load configuration from environment variables already in the process.
    pub fn from_env() -> Result<Self, ConfigError> {
        build_config(|key| std::env::var(key))
    }

    /// Panel options for a resolved KPI.
    pub fn panel_options(&self, kpi: KpiKind) -> PanelOptions {
        PanelOptions {
            kpi,
            source_tags: self.source_tags.clone(),
            geo: self.geo.clone(),
            fill: self.fill.clone(),
            media_metrics: self.media_metrics.clone(),
            granularity: self.granularity,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            ingest: IngestConfig {
                api_key: None,
                api_url: DEFAULT_API_URL.to_string(),
                date_preset: DEFAULT_DATE_PRESET.to_string(),
                fields: DEFAULT_FIELDS.iter().map(|f| f.to_string()).collect(),
                timeout_secs: DEFAULT_TIMEOUT_SECS,
            },
            kpi: None,
            events: None,
            source_tags: SourceTags::default(),
            geo: DEFAULT_GEO.to_string(),
            fill: FillPolicy::default(),
            media_metrics: DEFAULT_MEDIA_METRICS.to_vec(),
            granularity: Granularity::Weekly,
            output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
            write_artifacts: true,
            interactive: true,
            log_level: "info".to_string(),
        }
    }
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
pub fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Parse a comma-separated metric list such as `impressions,clicks`.
pub fn parse_media_metrics(raw: &str) -> Result<Vec<Metric>, ConfigError> {
    let metrics = split_list(raw)
        .iter()
        .map(|s| s.parse::<Metric>())
        .collect::<Result<Vec<_>, _>>()
        .map_err(|message| ConfigError::InvalidValue {
            key: "media metrics".to_string(),
            message,
        })?;

    if metrics.is_empty() || metrics.contains(&Metric::Spend) {
        return Err(ConfigError::InvalidValue {
            key: "media metrics".to_string(),
            message: "expected one or more of impressions, clicks".to_string(),
        });
    }
    Ok(metrics)
}

/// Build configuration using the provided env-var lookup function.
fn build_config<F>(lookup: F) -> Result<Config, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    let defaults = Config::default();

    let or_default = |var: &str, default: &str| -> String {
        lookup(var)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| default.to_string())
    };

    let timeout_raw = or_default("ADPANEL_TIMEOUT_SECS", &DEFAULT_TIMEOUT_SECS.to_string());
    let timeout_secs = timeout_raw
        .trim()
        .parse::<u64>()
        .map_err(|e| ConfigError::InvalidValue {
            key: "ADPANEL_TIMEOUT_SECS".to_string(),
            message: e.to_string(),
        })?;

    let kpi = match lookup("ADPANEL_KPI").ok().filter(|v| !v.trim().is_empty()) {
        Some(raw) => Some(raw.parse::<KpiKind>().map_err(|message| ConfigError::InvalidValue {
            key: "ADPANEL_KPI".to_string(),
            message,
        })?),
        None => None,
    };

    let media_metrics = match lookup("ADPANEL_MEDIA_METRICS").ok().filter(|v| !v.trim().is_empty()) {
        Some(raw) => parse_media_metrics(&raw).map_err(|e| match e {
            ConfigError::InvalidValue { message, .. } => ConfigError::InvalidValue {
                key: "ADPANEL_MEDIA_METRICS".to_string(),
                message,
            },
            other => other,
        })?,
        None => defaults.media_metrics.clone(),
    };

    let source_tags = SourceTags {
        analytics: or_default("ADPANEL_ANALYTICS_SOURCE", &defaults.source_tags.analytics),
        search_console: or_default(
            "ADPANEL_SEARCH_CONSOLE_SOURCE",
            &defaults.source_tags.search_console,
        ),
    };

    Ok(Config {
        ingest: IngestConfig {
            api_key: lookup("WINDSOR_API_KEY").ok().filter(|k| !k.trim().is_empty()),
            api_url: or_default("WINDSOR_API_URL", DEFAULT_API_URL),
            date_preset: or_default("WINDSOR_DATE_PRESET", DEFAULT_DATE_PRESET),
            fields: defaults.ingest.fields,
            timeout_secs,
        },
        kpi,
        media_metrics,
        source_tags,
        geo: or_default("ADPANEL_GEO", DEFAULT_GEO),
        output_dir: PathBuf::from(or_default("ADPANEL_OUTPUT_DIR", DEFAULT_OUTPUT_DIR)),
        log_level: or_default("ADPANEL_LOG_LEVEL", "info"),
        ..defaults
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::env::VarError;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| map.get(key).map(|v| (*v).to_string()).ok_or(VarError::NotPresent)
    }

    #[test]
    fn test_defaults_without_env() {
        let map = HashMap::new();
        let config = build_config(lookup_from_map(&map)).unwrap();

        assert_eq!(config.ingest.api_key, None);
        assert_eq!(config.ingest.api_url, DEFAULT_API_URL);
        assert_eq!(config.ingest.date_preset, "last_1y");
        assert_eq!(config.ingest.timeout_secs, 60);
        assert_eq!(config.geo, "national");
        assert_eq!(config.source_tags.analytics, "googleanalytics4");
        assert_eq!(config.source_tags.search_console, "searchconsole");
        assert_eq!(config.kpi, None);
        assert_eq!(config.media_metrics, vec![Metric::Impressions, Metric::Clicks]);
        assert!(config.write_artifacts);
    }

    #[test]
    fn test_env_overrides() {
        let mut map = HashMap::new();
        map.insert("WINDSOR_API_KEY", "secret");
        map.insert("ADPANEL_KPI", "revenue");
        map.insert("ADPANEL_GEO", "US");
        map.insert("ADPANEL_TIMEOUT_SECS", "15");
        map.insert("ADPANEL_ANALYTICS_SOURCE", "ga4");
        map.insert("ADPANEL_MEDIA_METRICS", "impressions");
        let config = build_config(lookup_from_map(&map)).unwrap();

        assert_eq!(config.ingest.api_key.as_deref(), Some("secret"));
        assert_eq!(config.kpi, Some(KpiKind::Revenue));
        assert_eq!(config.geo, "US");
        assert_eq!(config.ingest.timeout_secs, 15);
        assert_eq!(config.source_tags.analytics, "ga4");
        assert_eq!(config.media_metrics, vec![Metric::Impressions]);
    }

    #[test]
    fn test_invalid_timeout_fails() {
        let mut map = HashMap::new();
        map.insert("ADPANEL_TIMEOUT_SECS", "soon");
        let result = build_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidValue { ref key, .. }) if key == "ADPANEL_TIMEOUT_SECS")
        );
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let mut config = Config::default();
        config.ingest.api_key = Some("super-secret".to_string());
        let debug = format!("{:?}", config);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[redacted]"));
    }

    #[test]
    fn test_parse_media_metrics() {
        assert_eq!(
            parse_media_metrics("impressions, clicks").unwrap(),
            vec![Metric::Impressions, Metric::Clicks]
        );
        assert!(parse_media_metrics("spend").is_err());
        assert!(parse_media_metrics(" , ").is_err());
        assert!(parse_media_metrics("reach").is_err());
    }
}
