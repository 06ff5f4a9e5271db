//! Calendar regularization: daily gap-fill, then Saturday-ending weekly buckets.
//!
//! The model expects evenly spaced observations, so the merged table is
//! reindexed to every calendar day between its first and last date. Flow
//! columns covered by the [`FillPolicy`] read missing as zero activity.

use chrono::{Datelike, Days, NaiveDate, Weekday};

use crate::models::{ColumnData, Panel};

/// Column suffixes whose missing values are filled with zero.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FillPolicy {
    pub suffixes: Vec<String>,
}

impl FillPolicy {
    /// Only the four activity suffixes; KPI revenue and organic stay missing.
    pub fn legacy() -> Self {
        Self::from_suffixes(&["clicks", "impressions", "conversions", "spend"])
    }

    pub fn from_suffixes(suffixes: &[&str]) -> Self {
        Self {
            suffixes: suffixes.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn covers(&self, column: &str) -> bool {
        self.suffixes.iter().any(|s| column.ends_with(s.as_str()))
    }
}

impl Default for FillPolicy {
    /// Every flow the pipeline produces, revenue and organic included.
    fn default() -> Self {
        Self::from_suffixes(&["clicks", "impressions", "conversions", "spend", "revenue", "organic"])
    }
}

/// Output cadence of the final table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Granularity {
    Daily,
    Weekly,
}

/// Every date from `first` to `last`, inclusive.
pub fn date_range(first: NaiveDate, last: NaiveDate) -> Vec<NaiveDate> {
    let mut dates = Vec::new();
    let mut current = Some(first);
    while let Some(date) = current.filter(|d| *d <= last) {
        dates.push(date);
        current = date.succ_opt();
    }
    dates
}

/// Reindex to one row per calendar day and apply the fill policy.
pub fn regularize_daily(merged: Panel, policy: &FillPolicy) -> Panel {
    let mut daily = match (merged.first_date(), merged.last_date()) {
        (Some(first), Some(last)) => merged.reindex(date_range(first, last)),
        _ => merged,
    };
    fill_zero(&mut daily, policy);
    daily
}

/// Replace missing values with zero in every flow column the policy covers.
///
/// Idempotent: a second pass finds nothing missing in covered columns.
pub fn fill_zero(panel: &mut Panel, policy: &FillPolicy) {
    for column in panel.columns_mut() {
        if !policy.covers(&column.name) {
            continue;
        }
        if let ColumnData::Flow(values) = &mut column.data {
            for value in values.iter_mut().filter(|v| v.is_none()) {
                *value = Some(0.0);
            }
        }
    }
}

/// Append a constant dimension column.
pub fn add_dimension(panel: &mut Panel, name: &str, value: &str) {
    let values = vec![value.to_string(); panel.len()];
    panel.push_dimension(name, values);
}

/// The Saturday on or after `date`.
pub fn week_ending(date: NaiveDate) -> NaiveDate {
    let from_monday = date.weekday().num_days_from_monday();
    let saturday = Weekday::Sat.num_days_from_monday();
    let offset = (saturday + 7 - from_monday) % 7;
    date + Days::new(u64::from(offset))
}

/// Re-bucket a daily panel into weeks ending on Saturday.
///
/// Flow columns are summed with missing counted as zero; dimension columns
/// keep their first value in each bucket. Rows are labeled by the Saturday.
pub fn rollup_weekly(daily: &Panel) -> Panel {
    let labels: Vec<NaiveDate> = daily.dates().iter().map(|d| week_ending(*d)).collect();

    let mut weeks: Vec<NaiveDate> = labels.clone();
    weeks.dedup();

    // Row -> bucket index; labels are non-decreasing because dates are.
    let mut bucket_of = Vec::with_capacity(labels.len());
    let mut bucket = 0usize;
    for (row, label) in labels.iter().enumerate() {
        if row > 0 && *label != labels[row - 1] {
            bucket += 1;
        }
        bucket_of.push(bucket);
    }

    let mut weekly = Panel::new(weeks);

    for column in daily.columns() {
        match &column.data {
            ColumnData::Flow(values) => {
                let mut sums = vec![0.0; weekly.len()];
                for (value, bucket) in values.iter().zip(&bucket_of) {
                    sums[*bucket] += value.unwrap_or(0.0);
                }
                weekly.push_flow(column.name.clone(), sums.into_iter().map(Some).collect());
            }
            ColumnData::Dimension(values) => {
                let mut firsts: Vec<Option<String>> = vec![None; weekly.len()];
                for (value, bucket) in values.iter().zip(&bucket_of) {
                    firsts[*bucket].get_or_insert_with(|| value.clone());
                }
                weekly.push_dimension(
                    column.name.clone(),
                    firsts.into_iter().map(Option::unwrap_or_default).collect(),
                );
            }
        }
    }

    weekly
}
