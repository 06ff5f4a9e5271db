//! Artifact writer - persist the run's inputs and outputs to disk.
//!
//! Files in the output directory:
//! - `raw_export.csv` - every raw record, replayable with `adpanel replay`
//! - `weekly_panel.csv` / `daily_panel.csv` - the final table
//! - `model_inputs.json` - bundle metadata, pointing at the table file

use serde::Serialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;

use crate::config::DEFAULT_FIELDS;
use crate::error::ArtifactResult;
use crate::models::{ColumnData, OutputBundle, Panel, RawRecord};
use crate::transform::calendar::Granularity;

pub const RAW_EXPORT_FILE: &str = "raw_export.csv";
pub const WEEKLY_TABLE_FILE: &str = "weekly_panel.csv";
pub const DAILY_TABLE_FILE: &str = "daily_panel.csv";
pub const MODEL_INPUTS_FILE: &str = "model_inputs.json";

/// Paths of the files written during a run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactPaths {
    pub raw: Option<PathBuf>,
    pub table: Option<PathBuf>,
    pub bundle: Option<PathBuf>,
}

/// `model_inputs.json` layout: the bundle without its table.
#[derive(Debug, Serialize)]
struct ModelInputs<'a> {
    table_file: &'a str,
    rows: usize,
    columns: Vec<&'a str>,
    time_column: &'a str,
    geo_column: &'a str,
    kpi_name: &'a str,
    controls: &'a [String],
    media_columns: &'a [String],
    media_spend_columns: &'a [String],
    media_to_channel: &'a BTreeMap<String, String>,
    media_spend_to_channel: &'a BTreeMap<String, String>,
    start_date: Option<NaiveDate>,
    end_date: Option<NaiveDate>,
    generated_at: String,
}

/// Writes artifacts into one output directory.
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    dir: PathBuf,
}

impl ArtifactWriter {
    /// Create a writer, creating `dir` if needed.
    pub fn new(dir: impl AsRef<Path>) -> ArtifactResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Table file name for a cadence.
    pub fn table_file_name(granularity: Granularity) -> &'static str {
        match granularity {
            Granularity::Weekly => WEEKLY_TABLE_FILE,
            Granularity::Daily => DAILY_TABLE_FILE,
        }
    }

    /// Write every raw record. Absent values are empty cells.
    pub fn write_raw(&self, records: &[RawRecord]) -> ArtifactResult<PathBuf> {
        let path = self.dir.join(RAW_EXPORT_FILE);
        let mut writer = csv::Writer::from_path(&path)?;

        writer.write_record(DEFAULT_FIELDS)?;
        for record in records {
            writer.write_record(raw_row(record))?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// Write a panel as `date,<columns...>`. Missing flows are empty cells.
    pub fn write_table(&self, panel: &Panel, file_name: &str) -> ArtifactResult<PathBuf> {
        let path = self.dir.join(file_name);
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["date"];
        header.extend(panel.column_names());
        writer.write_record(&header)?;

        for (row, date) in panel.dates().iter().enumerate() {
            let mut cells = Vec::with_capacity(panel.columns().len() + 1);
            cells.push(date.format("%Y-%m-%d").to_string());
            for column in panel.columns() {
                let cell = match &column.data {
                    ColumnData::Flow(values) => values[row].map(|v| v.to_string()).unwrap_or_default(),
                    ColumnData::Dimension(values) => values[row].clone(),
                };
                cells.push(cell);
            }
            writer.write_record(&cells)?;
        }
        writer.flush()?;

        Ok(path)
    }

    /// Write the bundle metadata as pretty JSON.
    pub fn write_bundle_json(&self, bundle: &OutputBundle, table_file: &str) -> ArtifactResult<PathBuf> {
        let inputs = ModelInputs {
            table_file,
            rows: bundle.table.len(),
            columns: bundle.table.column_names(),
            time_column: &bundle.time_column,
            geo_column: &bundle.geo_column,
            kpi_name: &bundle.kpi_name,
            controls: &bundle.controls,
            media_columns: &bundle.media_columns,
            media_spend_columns: &bundle.media_spend_columns,
            media_to_channel: &bundle.media_to_channel,
            media_spend_to_channel: &bundle.media_spend_to_channel,
            start_date: bundle.start_date,
            end_date: bundle.end_date,
            generated_at: chrono::Utc::now().to_rfc3339(),
        };

        let path = self.dir.join(MODEL_INPUTS_FILE);
        let content = serde_json::to_string_pretty(&inputs)?;
        fs::write(&path, content)?;

        Ok(path)
    }
}

/// One raw record in `DEFAULT_FIELDS` order.
fn raw_row(record: &RawRecord) -> Vec<String> {
    let opt_f64 = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();

    vec![
        record.date.format("%Y-%m-%d").to_string(),
        record.source_tag.clone(),
        record.impressions.to_string(),
        record.clicks.to_string(),
        record.spend.to_string(),
        record.event_name.clone().unwrap_or_default(),
        opt_f64(record.event_count),
        record.is_conversion_event.map(|b| b.to_string()).unwrap_or_default(),
        record.medium.clone().unwrap_or_default(),
        opt_f64(record.sessions),
        opt_f64(record.revenue_amount),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::read_snapshot;
    use crate::transform::test_support::{day, event, paid, sessions};
    use tempfile::tempdir;

    #[test]
    fn test_creates_output_dir() {
        let tmp = tempdir().unwrap();
        let dir = tmp.path().join("nested").join("out");
        let writer = ArtifactWriter::new(&dir).unwrap();
        assert!(writer.dir().is_dir());
    }

    #[test]
    fn test_raw_snapshot_replays() {
        let tmp = tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path()).unwrap();
        let records = vec![
            paid(day(2025, 1, 5), "google", 1000.0, 20.0, 15.5),
            event(day(2025, 1, 5), "purchase", 3.0, true),
            sessions(day(2025, 1, 6), "organic", 42.0),
        ];

        let path = writer.write_raw(&records).unwrap();
        assert_eq!(path.file_name().unwrap(), RAW_EXPORT_FILE);

        let replayed = read_snapshot(&path).unwrap();
        assert_eq!(replayed, records);
    }

    #[test]
    fn test_raw_snapshot_keeps_accented_event_names() {
        let tmp = tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path()).unwrap();
        let names = ["achat_réussi", "Anmeldung_Straße", "café"];
        let records: Vec<RawRecord> = names
            .iter()
            .map(|name| event(day(2025, 1, 5), name, 1.0, true))
            .collect();

        let path = writer.write_raw(&records).unwrap();
        let replayed = read_snapshot(&path).unwrap();

        let replayed_names: Vec<Option<&str>> =
            replayed.iter().map(|r| r.event_name.as_deref()).collect();
        assert_eq!(replayed_names, names.map(Some).to_vec());
    }

    #[test]
    fn test_table_layout() {
        let tmp = tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path()).unwrap();

        let mut panel = Panel::new(vec![day(2025, 1, 4), day(2025, 1, 11)]);
        panel.push_flow("google_spend", vec![Some(12.5), Some(0.0)]);
        panel.push_flow("revenue", vec![None, Some(3.0)]);
        panel.push_dimension("geo", vec!["national".into(), "national".into()]);

        let path = writer.write_table(&panel, WEEKLY_TABLE_FILE).unwrap();
        let content = fs::read_to_string(path).unwrap();
        let lines: Vec<&str> = content.lines().collect();

        assert_eq!(lines[0], "date,google_spend,revenue,geo");
        assert_eq!(lines[1], "2025-01-04,12.5,,national");
        assert_eq!(lines[2], "2025-01-11,0,3,national");
    }

    #[test]
    fn test_bundle_json_has_metadata_not_table() {
        let tmp = tempdir().unwrap();
        let writer = ArtifactWriter::new(tmp.path()).unwrap();

        let mut table = Panel::new(vec![day(2025, 1, 11)]);
        table.push_flow("google_impressions", vec![Some(10.0)]);
        let bundle = OutputBundle {
            table,
            time_column: "date".into(),
            geo_column: "geo".into(),
            kpi_name: "conversions".into(),
            controls: vec!["organic".into()],
            media_columns: vec!["google_impressions".into()],
            media_spend_columns: vec![],
            media_to_channel: [("google_impressions".to_string(), "Google".to_string())].into(),
            media_spend_to_channel: BTreeMap::new(),
            start_date: Some(day(2025, 1, 11)),
            end_date: Some(day(2025, 1, 11)),
        };

        let path = writer.write_bundle_json(&bundle, WEEKLY_TABLE_FILE).unwrap();
        let json: serde_json::Value = serde_json::from_str(&fs::read_to_string(path).unwrap()).unwrap();

        assert_eq!(json["table_file"], "weekly_panel.csv");
        assert_eq!(json["kpi_name"], "conversions");
        assert_eq!(json["media_to_channel"]["google_impressions"], "Google");
        assert_eq!(json["start_date"], "2025-01-11");
        assert_eq!(json["rows"], 1);
        assert!(json.get("table").is_none());
    }
}
