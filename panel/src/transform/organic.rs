//! Organic traffic control series.
//!
//! Search console clicks are preferred. Only when the search-console
//! partition is completely empty do analytics sessions with an organic medium
//! stand in. A sparse search-console feed still wins.

use crate::logs::log_warning;
use crate::models::{RawRecord, Series};

/// Name of the organic control column.
pub const ORGANIC_COLUMN: &str = "organic";

/// Where the organic series came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrganicSource {
    SearchConsole,
    AnalyticsSessions,
}

impl OrganicSource {
    pub fn label(&self) -> &'static str {
        match self {
            OrganicSource::SearchConsole => "search console clicks",
            OrganicSource::AnalyticsSessions => "analytics organic sessions",
        }
    }
}

/// Build the `organic` series.
pub fn resolve_organic(
    search_console: &[RawRecord],
    analytics: &[RawRecord],
) -> (Series, OrganicSource) {
    let mut series = Series::new(ORGANIC_COLUMN);

    if !search_console.is_empty() {
        for record in search_console {
            series.add(record.date, record.clicks);
        }
        return (series, OrganicSource::SearchConsole);
    }

    for record in analytics.iter().filter(|r| is_organic_medium(r)) {
        series.add(record.date, record.sessions.unwrap_or(0.0));
    }

    if series.is_empty() {
        log_warning("No search console rows and no organic sessions; organic column will be empty");
    }
    (series, OrganicSource::AnalyticsSessions)
}

fn is_organic_medium(record: &RawRecord) -> bool {
    record
        .medium
        .as_deref()
        .is_some_and(|m| m.trim().eq_ignore_ascii_case("organic"))
}
