//! KPI resolution: build the outcome series from the analytics partition.
//!
//! Conversions need a choice of which events count. That choice is delegated
//! to an [`EventSelector`], so the resolver itself stays a pure transform and
//! the caller decides whether a human, a config value or a test answers.

use std::collections::BTreeSet;

use crate::error::{DataQualityError, PipelineError, PromptError};
use crate::models::{KpiKind, RawRecord, Series};

/// Capability: pick a subset of the discovered event names.
///
/// Implementations must only return names contained in `available`.
pub trait EventSelector {
    fn select(&mut self, available: &[String]) -> Result<Vec<String>, PromptError>;
}

/// A preset selection, validated once. Unknown names fail instead of re-asking.
#[derive(Debug, Clone)]
pub struct FixedSelector {
    events: Vec<String>,
}

impl FixedSelector {
    pub fn new(events: Vec<String>) -> Self {
        Self { events }
    }
}

impl EventSelector for FixedSelector {
    fn select(&mut self, available: &[String]) -> Result<Vec<String>, PromptError> {
        if self.events.is_empty() {
            return Err(PromptError::EmptySelection);
        }
        let invalid = invalid_names(&self.events, available);
        if !invalid.is_empty() {
            return Err(PromptError::InvalidSelection(invalid));
        }
        Ok(self.events.clone())
    }
}

/// Names in `selected` that are not in `available`, in input order, deduplicated.
pub fn invalid_names(selected: &[String], available: &[String]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    selected
        .iter()
        .filter(|name| !available.contains(*name))
        .filter(|name| seen.insert(name.as_str()))
        .cloned()
        .collect()
}

/// Distinct names of events flagged as conversions, sorted.
pub fn conversion_event_names(analytics: &[RawRecord]) -> Vec<String> {
    analytics
        .iter()
        .filter(|r| r.is_conversion_event == Some(true))
        .filter_map(|r| r.event_name.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Build the KPI series for `kind` from analytics records.
///
/// # Errors
/// - [`DataQualityError::NoConversionEvents`] if conversions are requested but none exist
/// - [`DataQualityError::ZeroRevenue`] if revenue is requested and sums to exactly zero
/// - [`PromptError`] if the selector fails
pub fn resolve_kpi(
    kind: KpiKind,
    analytics: &[RawRecord],
    selector: &mut dyn EventSelector,
) -> Result<Series, PipelineError> {
    match kind {
        KpiKind::Conversions => {
            let available = conversion_event_names(analytics);
            if available.is_empty() {
                return Err(DataQualityError::NoConversionEvents.into());
            }
            let selected: BTreeSet<String> = selector.select(&available)?.into_iter().collect();
            Ok(conversions_series(analytics, &selected))
        }
        KpiKind::Revenue => {
            let series = revenue_series(analytics);
            if series.total() == 0.0 {
                return Err(DataQualityError::ZeroRevenue.into());
            }
            Ok(series)
        }
    }
}

/// Sum event counts of the selected conversion events by date.
pub fn conversions_series(analytics: &[RawRecord], selected: &BTreeSet<String>) -> Series {
    let mut series = Series::new(KpiKind::Conversions.column_name());

    for record in analytics {
        if record.is_conversion_event != Some(true) {
            continue;
        }
        let Some(name) = record.event_name.as_ref() else {
            continue;
        };
        if selected.contains(name) {
            series.add(record.date, record.event_count.unwrap_or(0.0));
        }
    }

    series
}

/// Sum revenue by date.
pub fn revenue_series(analytics: &[RawRecord]) -> Series {
    let mut series = Series::new(KpiKind::Revenue.column_name());
    for record in analytics {
        if let Some(amount) = record.revenue_amount {
            series.add(record.date, amount);
        }
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::{day, event, revenue};

    fn feed() -> Vec<RawRecord> {
        vec![
            event(day(2025, 1, 5), "purchase", 3.0, true),
            event(day(2025, 1, 5), "sign_up", 2.0, true),
            event(day(2025, 1, 6), "purchase", 4.0, true),
            event(day(2025, 1, 6), "page_view", 900.0, false),
            event(day(2025, 1, 7), "lead", 1.0, true),
        ]
    }

    #[test]
    fn test_conversion_event_names_sorted_and_filtered() {
        assert_eq!(conversion_event_names(&feed()), vec!["lead", "purchase", "sign_up"]);
    }

    #[test]
    fn test_conversions_sum_selected_events_by_date() {
        let mut selector = FixedSelector::new(vec!["purchase".into(), "sign_up".into()]);
        let series = resolve_kpi(KpiKind::Conversions, &feed(), &mut selector).unwrap();

        assert_eq!(series.name, "conversions");
        assert_eq!(series.values.len(), 2);
        assert_eq!(series.values[&day(2025, 1, 5)], 5.0);
        assert_eq!(series.values[&day(2025, 1, 6)], 4.0);
        assert!(!series.values.contains_key(&day(2025, 1, 7)));
    }

    #[test]
    fn test_non_conversion_events_never_counted() {
        let selected: BTreeSet<String> = ["page_view".to_string()].into_iter().collect();
        assert!(conversions_series(&feed(), &selected).is_empty());
    }

    #[test]
    fn test_fixed_selector_rejects_unknown_names() {
        let mut selector = FixedSelector::new(vec!["purchase".into(), "refund".into()]);
        let err = resolve_kpi(KpiKind::Conversions, &feed(), &mut selector).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Prompt(PromptError::InvalidSelection(ref names)) if names == &["refund".to_string()]
        ));
    }

    #[test]
    fn test_no_conversion_events_is_data_quality_error() {
        let analytics = vec![event(day(2025, 1, 5), "page_view", 10.0, false)];
        let mut selector = FixedSelector::new(vec!["page_view".into()]);
        let err = resolve_kpi(KpiKind::Conversions, &analytics, &mut selector).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::DataQuality(DataQualityError::NoConversionEvents)
        ));
    }

    #[test]
    fn test_revenue_sums_by_date() {
        let analytics = vec![
            revenue(day(2025, 1, 5), 100.0),
            revenue(day(2025, 1, 5), 25.5),
            revenue(day(2025, 1, 6), -5.5),
        ];
        let mut selector = FixedSelector::new(vec![]);
        let series = resolve_kpi(KpiKind::Revenue, &analytics, &mut selector).unwrap();

        assert_eq!(series.name, "revenue");
        assert_eq!(series.values[&day(2025, 1, 5)], 125.5);
        assert_eq!(series.values[&day(2025, 1, 6)], -5.5);
    }

    #[test]
    fn test_zero_revenue_fails() {
        let analytics = vec![revenue(day(2025, 1, 5), 0.0), revenue(day(2025, 1, 6), 0.0)];
        let mut selector = FixedSelector::new(vec![]);
        let err = resolve_kpi(KpiKind::Revenue, &analytics, &mut selector).unwrap_err();
        assert!(matches!(err, PipelineError::DataQuality(DataQualityError::ZeroRevenue)));
    }

    #[test]
    fn test_invalid_names_deduplicated_in_order() {
        let available = vec!["purchase".to_string()];
        let selected = vec!["b".to_string(), "purchase".to_string(), "a".to_string(), "b".to_string()];
        assert_eq!(invalid_names(&selected, &available), vec!["b", "a"]);
    }
}
