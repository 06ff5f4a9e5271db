//! Outer join of the channel panel with the KPI and organic series.
//!
//! Outer, not inner: a date reported by any one input survives even when the
//! others are silent on it. Those gaps are left missing here.

use chrono::NaiveDate;
use std::collections::BTreeSet;

use crate::models::{Panel, Series};

/// Join `channels`, `kpi` and `organic` on date.
///
/// Column order: channel columns as given, then the KPI column, then organic.
pub fn outer_join(channels: Panel, kpi: &Series, organic: &Series) -> Panel {
    let dates: BTreeSet<NaiveDate> = channels
        .dates()
        .iter()
        .copied()
        .chain(kpi.values.keys().copied())
        .chain(organic.values.keys().copied())
        .collect();

    let mut merged = channels.reindex(dates.into_iter().collect());

    for series in [kpi, organic] {
        let values = merged
            .dates()
            .iter()
            .map(|d| series.values.get(d).copied())
            .collect();
        merged.push_flow(series.name.clone(), values);
    }

    merged
}
