//! Split raw records by where they came from.
//!
//! Two source tags are reserved: one for the web-analytics property and one
//! for search console. Everything else is a paid-media channel.

use crate::models::RawRecord;

/// The reserved source tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceTags {
    pub analytics: String,
    pub search_console: String,
}

impl Default for SourceTags {
    fn default() -> Self {
        Self {
            analytics: "googleanalytics4".to_string(),
            search_console: "searchconsole".to_string(),
        }
    }
}

/// Which partition a record belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Paid,
    Analytics,
    SearchConsole,
}

impl SourceTags {
    pub fn kind_of(&self, source_tag: &str) -> SourceKind {
        let tag = source_tag.trim();
        if tag == self.analytics {
            SourceKind::Analytics
        } else if tag == self.search_console {
            SourceKind::SearchConsole
        } else {
            SourceKind::Paid
        }
    }
}

/// Records split into the three disjoint groups.
#[derive(Debug, Clone, Default)]
pub struct SourcePartitions {
    pub paid: Vec<RawRecord>,
    pub analytics: Vec<RawRecord>,
    pub search_console: Vec<RawRecord>,
}

impl SourcePartitions {
    pub fn len(&self) -> usize {
        self.paid.len() + self.analytics.len() + self.search_console.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Partition records by source tag. Total: every record lands in exactly one group.
pub fn classify(records: Vec<RawRecord>, tags: &SourceTags) -> SourcePartitions {
    let mut partitions = SourcePartitions::default();

    for record in records {
        match tags.kind_of(&record.source_tag) {
            SourceKind::Paid => partitions.paid.push(record),
            SourceKind::Analytics => partitions.analytics.push(record),
            SourceKind::SearchConsole => partitions.search_console.push(record),
        }
    }

    partitions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transform::test_support::{blank, day};

    fn record(source: &str) -> RawRecord {
        blank(day(2025, 1, 6), source)
    }

    #[test]
    fn test_every_record_lands_in_one_partition() {
        let records = vec![
            record("google"),
            record("googleanalytics4"),
            record("facebook"),
            record("searchconsole"),
            record("bing"),
        ];

        let parts = classify(records, &SourceTags::default());

        assert_eq!(parts.len(), 5);
        assert_eq!(parts.paid.len(), 3);
        assert_eq!(parts.analytics.len(), 1);
        assert_eq!(parts.search_console.len(), 1);
    }

    #[test]
    fn test_unknown_tags_are_paid() {
        let tags = SourceTags::default();
        assert_eq!(tags.kind_of("tiktok"), SourceKind::Paid);
        assert_eq!(tags.kind_of(" searchconsole "), SourceKind::SearchConsole);
        // Matching is exact: a near miss is still a paid channel.
        assert_eq!(tags.kind_of("GoogleAnalytics4"), SourceKind::Paid);
    }

    #[test]
    fn test_custom_tags() {
        let tags = SourceTags {
            analytics: "ga".to_string(),
            search_console: "gsc".to_string(),
        };
        let parts = classify(vec![record("ga"), record("gsc"), record("googleanalytics4")], &tags);
        assert_eq!(parts.analytics.len(), 1);
        assert_eq!(parts.search_console.len(), 1);
        assert_eq!(parts.paid.len(), 1);
    }
}
