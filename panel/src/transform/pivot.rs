//! Aggregate paid-media rows and pivot them into one column per channel metric.
//!
//! ```text
//! date        source    impressions spend clicks       date        facebook_impressions google_impressions ... google_clicks
//! 2025-01-05  google    100         5     3       →    2025-01-05  40                   150                ... 5
//! 2025-01-05  google    50          2     2            2025-01-06  -                    80                 ... 1
//! 2025-01-05  facebook  40          3     1
//! 2025-01-06  google    80          4     1
//! ```
//!
//! Several campaigns or accounts per source collapse into a single row per
//! (date, source). A (date, source) pair with no activity stays missing; the
//! calendar step decides what missing means.

use chrono::NaiveDate;
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{Metric, Panel, RawRecord};

/// Per-(date, source) totals, in [`Metric::ALL`] order.
type Totals = [f64; 3];

/// Sum metrics per (date, source).
pub fn aggregate(paid: &[RawRecord]) -> BTreeMap<(NaiveDate, String), Totals> {
    let mut groups: BTreeMap<(NaiveDate, String), Totals> = BTreeMap::new();

    for record in paid {
        let totals = groups
            .entry((record.date, record.source_tag.clone()))
            .or_insert([0.0; 3]);
        for (slot, metric) in totals.iter_mut().zip(Metric::ALL) {
            *slot += metric.value_of(record);
        }
    }

    groups
}

/// Aggregate and pivot paid records into the channel panel.
///
/// Columns are metric-major (every `_impressions`, then `_spend`, then
/// `_clicks`), channels sorted within each metric.
pub fn pivot_channels(paid: &[RawRecord]) -> Panel {
    let groups = aggregate(paid);

    let dates: BTreeSet<NaiveDate> = groups.keys().map(|(date, _)| *date).collect();
    let channels: BTreeSet<&str> = groups.keys().map(|(_, source)| source.as_str()).collect();
    let dates: Vec<NaiveDate> = dates.into_iter().collect();

    let mut panel = Panel::new(dates);

    for (idx, metric) in Metric::ALL.iter().enumerate() {
        for channel in &channels {
            let values = panel
                .dates()
                .iter()
                .map(|date| {
                    groups
                        .get(&(*date, channel.to_string()))
                        .map(|totals| totals[idx])
                })
                .collect();
            panel.push_flow(metric.column_name(channel), values);
        }
    }

    panel
}

/// Channel names present in a panel, recovered from `_spend` column names.
pub fn channels_of(panel: &Panel) -> Vec<String> {
    panel
        .column_names()
        .into_iter()
        .filter_map(|name| Metric::Spend.channel_of(name))
        .map(str::to_string)
        .collect()
}
