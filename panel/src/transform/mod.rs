//! Transformation module.
//!
//! Turns raw export records into the model-ready panel:
//! - Classify: split records by source
//! - KPI / Organic: build the outcome and control series
//! - Pivot: paid-media rows to one column per channel metric
//! - Merge: outer join on date
//! - Calendar: daily gap-fill and weekly rollup
//! - Metadata: media/spend columns and channel labels
//! - Pipeline: the whole chain, plus ingest and artifacts around it

pub mod calendar;
pub mod classify;
pub mod kpi;
pub mod merge;
pub mod metadata;
pub mod organic;
pub mod pipeline;
pub mod pivot;

pub use calendar::{regularize_daily, rollup_weekly, FillPolicy, Granularity};
pub use classify::{classify, SourcePartitions, SourceTags};
pub use kpi::{resolve_kpi, EventSelector, FixedSelector};
pub use merge::outer_join;
pub use metadata::{derive_metadata, MediaMetadata};
pub use organic::{resolve_organic, ORGANIC_COLUMN};
pub use pipeline::*;
pub use pivot::pivot_channels;

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::NaiveDate;

    use crate::models::RawRecord;

    pub fn day(year: i32, month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, day).unwrap()
    }

    pub fn blank(date: NaiveDate, source: &str) -> RawRecord {
        RawRecord {
            date,
            source_tag: source.to_string(),
            impressions: 0.0,
            clicks: 0.0,
            spend: 0.0,
            event_name: None,
            event_count: None,
            is_conversion_event: None,
            medium: None,
            sessions: None,
            revenue_amount: None,
        }
    }

    pub fn paid(date: NaiveDate, source: &str, impressions: f64, clicks: f64, spend: f64) -> RawRecord {
        RawRecord {
            impressions,
            clicks,
            spend,
            ..blank(date, source)
        }
    }

    pub fn event(date: NaiveDate, name: &str, count: f64, is_conversion: bool) -> RawRecord {
        RawRecord {
            event_name: Some(name.to_string()),
            event_count: Some(count),
            is_conversion_event: Some(is_conversion),
            ..blank(date, "googleanalytics4")
        }
    }

    pub fn sessions(date: NaiveDate, medium: &str, sessions: f64) -> RawRecord {
        RawRecord {
            medium: Some(medium.to_string()),
            sessions: Some(sessions),
            ..blank(date, "googleanalytics4")
        }
    }

    pub fn revenue(date: NaiveDate, amount: f64) -> RawRecord {
        RawRecord {
            revenue_amount: Some(amount),
            ..blank(date, "googleanalytics4")
        }
    }

    pub fn search_clicks(date: NaiveDate, clicks: f64) -> RawRecord {
        RawRecord {
            clicks,
            ..blank(date, "searchconsole")
        }
    }
}
