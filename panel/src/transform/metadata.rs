//! Media metadata derived from final column names.
//!
//! Relies on the `{channel}_{metric}` naming from the pivot step: the channel
//! is whatever precedes the metric suffix.

use std::collections::BTreeMap;

use crate::models::{Metric, Panel};

/// Media and spend columns with their channel labels.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MediaMetadata {
    pub media_columns: Vec<String>,
    pub media_spend_columns: Vec<String>,
    pub media_to_channel: BTreeMap<String, String>,
    pub media_spend_to_channel: BTreeMap<String, String>,
}

impl MediaMetadata {
    /// Distinct channel labels in media column order.
    pub fn channels(&self) -> Vec<&str> {
        let mut labels: Vec<&str> = Vec::new();
        for column in &self.media_columns {
            if let Some(label) = self.media_to_channel.get(column) {
                if !labels.contains(&label.as_str()) {
                    labels.push(label.as_str());
                }
            }
        }
        labels
    }
}

/// Classify columns into media signals and media spend.
///
/// `media_metrics` selects which suffixes count as media signals;
/// `controls` are never classified. No match yields empty lists.
pub fn derive_metadata(panel: &Panel, media_metrics: &[Metric], controls: &[String]) -> MediaMetadata {
    let mut meta = MediaMetadata::default();

    for name in panel.column_names() {
        if controls.iter().any(|c| c == name) {
            continue;
        }

        if let Some(channel) = media_metrics.iter().find_map(|m| m.channel_of(name)) {
            meta.media_columns.push(name.to_string());
            meta.media_to_channel.insert(name.to_string(), channel_label(channel));
        } else if let Some(channel) = Metric::Spend.channel_of(name) {
            meta.media_spend_columns.push(name.to_string());
            meta.media_spend_to_channel.insert(name.to_string(), channel_label(channel));
        }
    }

    meta
}

/// Capitalize the first letter of every `_`, `-` or space separated segment.
///
/// `google` → `Google`, `bing_ads` → `Bing_Ads`, `meta-ads` → `Meta-Ads`.
pub fn channel_label(channel: &str) -> String {
    let mut label = String::with_capacity(channel.len());
    let mut at_segment_start = true;

    for c in channel.chars() {
        if matches!(c, '_' | '-' | ' ') {
            at_segment_start = true;
            label.push(c);
        } else if at_segment_start {
            label.extend(c.to_uppercase());
            at_segment_start = false;
        } else {
            label.push(c);
        }
    }

    label
}
