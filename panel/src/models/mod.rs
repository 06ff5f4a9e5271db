//! Domain models for the adpanel pipeline.
//!
//! - [`RawRecord`] - one row of the advertising/analytics export
//! - [`Metric`] - the paid-media metrics that get pivoted per channel
//! - [`KpiKind`] - the outcome variable the model is fit against
//! - [`Series`] - a single named per-date series (KPI, organic)
//! - [`Panel`] - the per-date table every stage produces
//! - [`OutputBundle`] - the table plus the metadata the model consumes

use chrono::NaiveDate;
use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use crate::error::{DataQualityError, IngestError};

// =============================================================================
// Raw Record
// =============================================================================

/// One raw export row.
///
/// Paid-media rows carry impressions/clicks/spend; analytics rows carry
/// events, sessions and revenue; search-console rows carry clicks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RawRecord {
    pub date: NaiveDate,
    pub source_tag: String,
    pub impressions: f64,
    pub clicks: f64,
    pub spend: f64,
    pub event_name: Option<String>,
    pub event_count: Option<f64>,
    pub is_conversion_event: Option<bool>,
    pub medium: Option<String>,
    pub sessions: Option<f64>,
    pub revenue_amount: Option<f64>,
}

/// Accepted keys per field, first match wins.
const SOURCE_KEYS: &[&str] = &["source", "source_tag"];
const REVENUE_KEYS: &[&str] = &["revenue_amount", "revenue", "totalrevenue"];
const CONVERSION_FLAG_KEYS: &[&str] = &["is_conversion_event", "conversion_event"];

impl RawRecord {
    /// Build a record from a JSON object as returned by the export API.
    ///
    /// Numbers may arrive as JSON numbers or numeric strings; `null`, missing
    /// keys and empty strings are treated as absent.
    pub fn from_json(value: &Value) -> Result<Self, IngestError> {
        let obj = value.as_object().ok_or_else(|| IngestError::InvalidField {
            field: "record".to_string(),
            message: "expected a JSON object".to_string(),
        })?;

        let date_text = lookup_str(obj, &["date"])?
            .ok_or_else(|| IngestError::MissingField("date".to_string()))?;
        let date = parse_date(&date_text)?;

        let source_tag = lookup_str(obj, SOURCE_KEYS)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .ok_or_else(|| IngestError::MissingField("source".to_string()))?;

        Ok(Self {
            date,
            source_tag,
            impressions: lookup_f64(obj, &["impressions"])?.unwrap_or(0.0),
            clicks: lookup_f64(obj, &["clicks"])?.unwrap_or(0.0),
            spend: lookup_f64(obj, &["spend"])?.unwrap_or(0.0),
            event_name: lookup_str(obj, &["event_name"])?
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            event_count: lookup_f64(obj, &["event_count"])?,
            is_conversion_event: lookup_bool(obj, CONVERSION_FLAG_KEYS)?,
            medium: lookup_str(obj, &["medium"])?
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            sessions: lookup_f64(obj, &["sessions"])?,
            revenue_amount: lookup_f64(obj, REVENUE_KEYS)?,
        })
    }

    /// Reject negative flow metrics. Revenue may legitimately be negative.
    pub fn validate(&self) -> Result<(), DataQualityError> {
        let checks = [
            ("impressions", Some(self.impressions)),
            ("clicks", Some(self.clicks)),
            ("spend", Some(self.spend)),
            ("event_count", self.event_count),
            ("sessions", self.sessions),
        ];

        for (field, value) in checks {
            if value.is_some_and(|v| v < 0.0) {
                return Err(DataQualityError::NegativeValue {
                    field: field.to_string(),
                    date: self.date,
                    source_tag: self.source_tag.clone(),
                });
            }
        }
        Ok(())
    }
}

fn lookup<'a>(obj: &'a Map<String, Value>, keys: &[&str]) -> Option<(&'a str, &'a Value)> {
    keys.iter().find_map(|k| {
        obj.get_key_value(*k)
            .filter(|(_, v)| !v.is_null())
            .map(|(k, v)| (k.as_str(), v))
    })
}

fn lookup_str(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<String>, IngestError> {
    match lookup(obj, keys) {
        None => Ok(None),
        Some((_, Value::String(s))) => Ok(Some(s.clone())),
        Some((_, Value::Number(n))) => Ok(Some(n.to_string())),
        Some((key, other)) => Err(IngestError::InvalidField {
            field: key.to_string(),
            message: format!("expected a string, got {}", other),
        }),
    }
}

fn lookup_f64(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<f64>, IngestError> {
    match lookup(obj, keys) {
        None => Ok(None),
        Some((key, Value::Number(n))) => n.as_f64().map(Some).ok_or_else(|| {
            IngestError::InvalidField {
                field: key.to_string(),
                message: format!("number out of range: {}", n),
            }
        }),
        Some((key, Value::String(s))) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Ok(None);
            }
            trimmed.parse::<f64>().map(Some).map_err(|_| IngestError::InvalidField {
                field: key.to_string(),
                message: format!("not a number: '{}'", s),
            })
        }
        Some((key, other)) => Err(IngestError::InvalidField {
            field: key.to_string(),
            message: format!("expected a number, got {}", other),
        }),
    }
}

fn lookup_bool(obj: &Map<String, Value>, keys: &[&str]) -> Result<Option<bool>, IngestError> {
    match lookup(obj, keys) {
        None => Ok(None),
        Some((_, Value::Bool(b))) => Ok(Some(*b)),
        Some((_, Value::Number(n))) => Ok(Some(n.as_f64().is_some_and(|v| v != 0.0))),
        Some((key, Value::String(s))) => match s.trim().to_lowercase().as_str() {
            "" => Ok(None),
            "true" | "1" | "yes" => Ok(Some(true)),
            "false" | "0" | "no" => Ok(Some(false)),
            _ => Err(IngestError::InvalidField {
                field: key.to_string(),
                message: format!("not a boolean: '{}'", s),
            }),
        },
        Some((key, other)) => Err(IngestError::InvalidField {
            field: key.to_string(),
            message: format!("expected a boolean, got {}", other),
        }),
    }
}

/// Parse `YYYY-MM-DD`, ignoring any trailing time part.
pub fn parse_date(text: &str) -> Result<NaiveDate, IngestError> {
    let trimmed = text.trim();
    let day_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(day_part, "%Y-%m-%d").map_err(|e| IngestError::InvalidField {
        field: "date".to_string(),
        message: format!("'{}': {}", text, e),
    })
}

// =============================================================================
// Metrics and KPI
// =============================================================================

/// A paid-media metric pivoted into one column per channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    Impressions,
    Spend,
    Clicks,
}

impl Metric {
    /// Pivot order: metric-major, impressions first.
    pub const ALL: [Metric; 3] = [Metric::Impressions, Metric::Spend, Metric::Clicks];

    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Impressions => "impressions",
            Metric::Spend => "spend",
            Metric::Clicks => "clicks",
        }
    }

    /// `{channel}_{metric}`
    pub fn column_name(&self, channel: &str) -> String {
        format!("{}_{}", channel, self.as_str())
    }

    /// Inverse of [`Metric::column_name`]: strip the trailing `_{metric}`.
    pub fn channel_of<'a>(&self, column: &'a str) -> Option<&'a str> {
        column
            .strip_suffix(self.as_str())
            .and_then(|rest| rest.strip_suffix('_'))
            .filter(|channel| !channel.is_empty())
    }

    pub fn value_of(&self, record: &RawRecord) -> f64 {
        match self {
            Metric::Impressions => record.impressions,
            Metric::Spend => record.spend,
            Metric::Clicks => record.clicks,
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Metric {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "impressions" => Ok(Metric::Impressions),
            "spend" => Ok(Metric::Spend),
            "clicks" => Ok(Metric::Clicks),
            other => Err(format!("unknown metric '{}' (expected impressions, spend or clicks)", other)),
        }
    }
}

/// The outcome variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum KpiKind {
    Conversions,
    Revenue,
}

impl KpiKind {
    /// Name of the KPI column in every panel.
    pub fn column_name(&self) -> &'static str {
        match self {
            KpiKind::Conversions => "conversions",
            KpiKind::Revenue => "revenue",
        }
    }
}

impl fmt::Display for KpiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column_name())
    }
}

impl FromStr for KpiKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "conversions" | "conversion" | "c" => Ok(KpiKind::Conversions),
            "revenue" | "r" => Ok(KpiKind::Revenue),
            other => Err(format!("unknown KPI '{}' (expected revenue or conversions)", other)),
        }
    }
}

// =============================================================================
// Series and Panel
// =============================================================================

/// A single named per-date series.
#[derive(Debug, Clone, PartialEq)]
pub struct Series {
    pub name: String,
    pub values: BTreeMap<NaiveDate, f64>,
}

impl Series {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            values: BTreeMap::new(),
        }
    }

    /// Add `value` to the running total for `date`.
    pub fn add(&mut self, date: NaiveDate, value: f64) {
        *self.values.entry(date).or_insert(0.0) += value;
    }

    pub fn total(&self) -> f64 {
        self.values.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Column storage: summable flows or a carried-through dimension.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColumnData {
    /// `None` marks a missing value.
    Flow(Vec<Option<f64>>),
    Dimension(Vec<String>),
}

impl ColumnData {
    pub fn len(&self) -> usize {
        match self {
            ColumnData::Flow(v) => v.len(),
            ColumnData::Dimension(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Column {
    pub name: String,
    pub data: ColumnData,
}

/// A per-date table: one row per entry of `dates`, columns in display order.
///
/// Every column holds exactly `dates.len()` values.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Panel {
    dates: Vec<NaiveDate>,
    columns: Vec<Column>,
}

impl Panel {
    /// Create a panel over `dates`, which must be strictly increasing.
    pub fn new(dates: Vec<NaiveDate>) -> Self {
        debug_assert!(dates.windows(2).all(|w| w[0] < w[1]), "panel dates must be strictly increasing");
        Self {
            dates,
            columns: Vec::new(),
        }
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.dates
    }

    pub fn columns(&self) -> &[Column] {
        &self.columns
    }

    pub fn columns_mut(&mut self) -> &mut [Column] {
        &mut self.columns
    }

    pub fn len(&self) -> usize {
        self.dates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dates.is_empty()
    }

    pub fn column_names(&self) -> Vec<&str> {
        self.columns.iter().map(|c| c.name.as_str()).collect()
    }

    pub fn column(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Values of a flow column, `None` if absent or a dimension.
    pub fn flow(&self, name: &str) -> Option<&[Option<f64>]> {
        match self.column(name).map(|c| &c.data) {
            Some(ColumnData::Flow(values)) => Some(values),
            _ => None,
        }
    }

    pub fn push_flow(&mut self, name: impl Into<String>, values: Vec<Option<f64>>) {
        self.push_column(name, ColumnData::Flow(values));
    }

    pub fn push_dimension(&mut self, name: impl Into<String>, values: Vec<String>) {
        self.push_column(name, ColumnData::Dimension(values));
    }

    fn push_column(&mut self, name: impl Into<String>, data: ColumnData) {
        let name = name.into();
        debug_assert_eq!(
            data.len(),
            self.dates.len(),
            "column '{}' length does not match panel rows",
            name
        );
        debug_assert!(self.column(&name).is_none(), "duplicate column '{}'", name);
        self.columns.push(Column { name, data });
    }

    /// Rebuild the panel over `dates`, carrying values across by date.
    ///
    /// Dates not present before get missing flows and empty dimension values;
    /// dates not listed are dropped.
    pub fn reindex(&self, dates: Vec<NaiveDate>) -> Panel {
        let source_row: HashMap<NaiveDate, usize> = self
            .dates
            .iter()
            .enumerate()
            .map(|(idx, date)| (*date, idx))
            .collect();
        let rows: Vec<Option<usize>> = dates.iter().map(|d| source_row.get(d).copied()).collect();

        let columns = self
            .columns
            .iter()
            .map(|column| {
                let data = match &column.data {
                    ColumnData::Flow(values) => {
                        ColumnData::Flow(rows.iter().map(|r| r.and_then(|i| values[i])).collect())
                    }
                    ColumnData::Dimension(values) => ColumnData::Dimension(
                        rows.iter()
                            .map(|r| r.map(|i| values[i].clone()).unwrap_or_default())
                            .collect(),
                    ),
                };
                Column { name: column.name.clone(), data }
            })
            .collect();

        let mut panel = Panel::new(dates);
        panel.columns = columns;
        panel
    }

    pub fn first_date(&self) -> Option<NaiveDate> {
        self.dates.first().copied()
    }

    pub fn last_date(&self) -> Option<NaiveDate> {
        self.dates.last().copied()
    }
}

// =============================================================================
// Output Bundle
// =============================================================================

/// Everything the modeling collaborator needs.
#[derive(Debug, Clone, Serialize)]
pub struct OutputBundle {
    pub table: Panel,
    pub time_column: String,
    pub geo_column: String,
    pub kpi_name: String,
    pub controls: Vec<String>,
    pub media_columns: Vec<String>,
    pub media_spend_columns: Vec<String>,
    pub media_to_channel: BTreeMap<String, String>,
    pub media_spend_to_channel: BTreeMap<String, String>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_record_from_api_json() {
        let record = RawRecord::from_json(&json!({
            "date": "2025-04-24",
            "source": "facebook",
            "impressions": 1200,
            "clicks": "35",
            "spend": 18.5,
            "event_name": null
        }))
        .unwrap();

        assert_eq!(record.date, NaiveDate::from_ymd_opt(2025, 4, 24).unwrap());
        assert_eq!(record.source_tag, "facebook");
        assert_eq!(record.impressions, 1200.0);
        assert_eq!(record.clicks, 35.0);
        assert_eq!(record.spend, 18.5);
        assert_eq!(record.event_name, None);
    }

    #[test]
    fn test_record_absent_metrics_default_to_zero() {
        let record = RawRecord::from_json(&json!({
            "date": "2025-04-24T00:00:00",
            "source": "googleanalytics4",
            "medium": "organic",
            "sessions": "41",
            "is_conversion_event": "false",
            "totalrevenue": ""
        }))
        .unwrap();

        assert_eq!(record.impressions, 0.0);
        assert_eq!(record.sessions, Some(41.0));
        assert_eq!(record.is_conversion_event, Some(false));
        assert_eq!(record.revenue_amount, None);
        assert_eq!(record.medium.as_deref(), Some("organic"));
    }

    #[test]
    fn test_record_missing_source_is_schema_error() {
        let err = RawRecord::from_json(&json!({ "date": "2025-04-24" })).unwrap_err();
        assert!(matches!(err, IngestError::MissingField(ref f) if f == "source"));
    }

    #[test]
    fn test_record_bad_number_is_invalid_field() {
        let err = RawRecord::from_json(&json!({
            "date": "2025-04-24",
            "source": "bing",
            "spend": "n/a"
        }))
        .unwrap_err();
        assert!(matches!(err, IngestError::InvalidField { ref field, .. } if field == "spend"));
    }

    #[test]
    fn test_validate_rejects_negative_spend() {
        let mut record = RawRecord::from_json(&json!({
            "date": "2025-04-24",
            "source": "reddit"
        }))
        .unwrap();
        record.spend = -1.0;
        assert!(matches!(
            record.validate(),
            Err(DataQualityError::NegativeValue { .. })
        ));

        record.spend = 0.0;
        record.revenue_amount = Some(-20.0);
        assert!(record.validate().is_ok());
    }

    #[test]
    fn test_metric_column_naming_is_invertible() {
        for metric in Metric::ALL {
            let column = metric.column_name("google_ads");
            assert_eq!(column, format!("google_ads_{}", metric));
            assert_eq!(metric.channel_of(&column), Some("google_ads"));
        }
        assert_eq!(Metric::Spend.channel_of("organic"), None);
        assert_eq!(Metric::Spend.channel_of("_spend"), None);
    }

    #[test]
    fn test_kpi_from_str() {
        assert_eq!("Revenue".parse::<KpiKind>().unwrap(), KpiKind::Revenue);
        assert_eq!(" conversions ".parse::<KpiKind>().unwrap(), KpiKind::Conversions);
        assert!("profit".parse::<KpiKind>().is_err());
    }

    #[test]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "length does not match")]
    fn test_panel_rejects_short_column() {
        let mut panel = Panel::new(vec![NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()]);
        panel.push_flow("google_spend", vec![]);
    }
}
