//! Grouping and ranking of entity records for list pages and dashboards.
//!
//! List pages bucket entities by first letter, dashboards take the top N by total, and
//! both sort by one field with another as tie-breaker. [`group_and_rank`] covers all of
//! these, driven by a [`RankConfig`].

use std::cmp::Ordering;
use std::collections::BTreeMap;

use bantay_data::EntityRecord;
use serde::{Deserialize, Serialize};

/// Label of the bucket holding names that do not start with a letter.
pub const OTHER_BUCKET: &str = "#";
/// Label of the single bucket produced when bucketing is off.
pub const ALL_BUCKET: &str = "*";

/// A field of [`EntityRecord`] that records can be ordered by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum RecordField {
    Name,
    ContractCount,
    TotalAmount,
}

impl RecordField {
    /// Attribute name used for this field in search indices.
    pub fn attribute(self) -> &'static str {
        match self {
            RecordField::Name => "name",
            RecordField::ContractCount => "contract_count",
            RecordField::TotalAmount => "total_amount",
        }
    }

    pub fn from_attribute(attribute: &str) -> Option<RecordField> {
        match attribute {
            "name" => Some(RecordField::Name),
            "contract_count" => Some(RecordField::ContractCount),
            "total_amount" => Some(RecordField::TotalAmount),
            _ => None,
        }
    }

    /// Ascending order on this field; names compare case-insensitively.
    pub fn ascending(self, a: &EntityRecord, b: &EntityRecord) -> Ordering {
        match self {
            RecordField::Name => a
                .name
                .to_lowercase()
                .cmp(&b.name.to_lowercase())
                .then_with(|| a.name.cmp(&b.name)),
            RecordField::ContractCount => a.contract_count.cmp(&b.contract_count),
            RecordField::TotalAmount => a.total_amount.total_cmp(&b.total_amount),
        }
    }

    /// Ranking order: names A to Z, numbers largest first.
    pub fn ranked(self, a: &EntityRecord, b: &EntityRecord) -> Ordering {
        match self {
            RecordField::Name => self.ascending(a, b),
            RecordField::ContractCount | RecordField::TotalAmount => self.ascending(b, a),
        }
    }
}

/// How records are split into buckets before ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum BucketKey {
    /// One bucket per initial letter, plus [`OTHER_BUCKET`].
    FirstLetter,
    /// Everything in one bucket.
    #[serde(rename = "none")]
    #[value(name = "none")]
    Unbucketed,
}

/// Parameters for [`group_and_rank`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RankConfig {
    pub bucket_key: BucketKey,
    pub rank_key: RecordField,
    pub tie_break_key: RecordField,
    /// Keep at most this many records per bucket.
    pub limit: Option<usize>,
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            bucket_key: BucketKey::FirstLetter,
            rank_key: RecordField::TotalAmount,
            tie_break_key: RecordField::Name,
            limit: None,
        }
    }
}

/// One group of ranked records.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bucket {
    pub label: String,
    pub records: Vec<EntityRecord>,
    /// Records in the bucket before the limit was applied.
    pub total_records: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
enum BucketLabel {
    Letter(String),
    Other,
    All,
}

impl BucketLabel {
    fn into_string(self) -> String {
        match self {
            BucketLabel::Letter(letter) => letter,
            BucketLabel::Other => OTHER_BUCKET.to_string(),
            BucketLabel::All => ALL_BUCKET.to_string(),
        }
    }
}

fn first_letter_label(name: &str) -> BucketLabel {
    match name.trim_start().chars().next() {
        Some(ch) if ch.is_alphabetic() => BucketLabel::Letter(ch.to_uppercase().collect()),
        _ => BucketLabel::Other,
    }
}

/// The first-letter bucket a name falls into.
pub fn letter_bucket(name: &str) -> String {
    first_letter_label(name).into_string()
}

fn compare(config: &RankConfig, a: &EntityRecord, b: &EntityRecord) -> Ordering {
    config
        .rank_key
        .ranked(a, b)
        .then_with(|| config.tie_break_key.ranked(a, b))
        .then_with(|| RecordField::Name.ranked(a, b))
}

/// Split `records` into buckets and rank each one.
///
/// Buckets come out alphabetically with [`OTHER_BUCKET`] last.
pub fn group_and_rank(records: &[EntityRecord], config: &RankConfig) -> Vec<Bucket> {
    let mut groups: BTreeMap<BucketLabel, Vec<EntityRecord>> = BTreeMap::new();
    for record in records {
        let label = match config.bucket_key {
            BucketKey::FirstLetter => first_letter_label(&record.name),
            BucketKey::Unbucketed => BucketLabel::All,
        };
        groups.entry(label).or_default().push(record.clone());
    }

    groups
        .into_iter()
        .map(|(label, mut records)| {
            records.sort_by(|a, b| compare(config, a, b));
            let total_records = records.len();
            if let Some(limit) = config.limit {
                records.truncate(limit);
            }
            Bucket {
                label: label.into_string(),
                records,
                total_records,
            }
        })
        .collect()
}

/// The `n` highest-ranked records by `key`, with names breaking ties.
pub fn top_n(records: &[EntityRecord], key: RecordField, n: usize) -> Vec<EntityRecord> {
    let config = RankConfig {
        bucket_key: BucketKey::Unbucketed,
        rank_key: key,
        tie_break_key: RecordField::Name,
        limit: Some(n),
    };
    group_and_rank(records, &config)
        .into_iter()
        .next()
        .map(|bucket| bucket.records)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, count: u64, total: f64) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            contract_count: count,
            total_amount: total,
            first_award_date: None,
            last_award_date: None,
        }
    }

    fn names(bucket: &Bucket) -> Vec<&str> {
        bucket.records.iter().map(|r| r.name.as_str()).collect()
    }

    #[test]
    fn buckets_by_initial_with_other_last() {
        let records = vec![
            record("beta", 1, 10.0),
            record("3M Philippines", 2, 5.0),
            record("Alpha", 1, 1.0),
            record("  apex", 1, 2.0),
        ];
        let buckets = group_and_rank(&records, &RankConfig::default());

        let labels: Vec<_> = buckets.iter().map(|b| b.label.as_str()).collect();
        assert_eq!(labels, vec!["A", "B", "#"]);
        assert_eq!(names(&buckets[0]), vec!["  apex", "Alpha"]);
    }

    #[test]
    fn ties_fall_back_to_tie_break_then_name() {
        let records = vec![
            record("Zeta", 3, 100.0),
            record("Eta", 5, 100.0),
            record("Beta", 5, 100.0),
            record("Mu", 1, 500.0),
        ];
        let config = RankConfig {
            bucket_key: BucketKey::Unbucketed,
            rank_key: RecordField::TotalAmount,
            tie_break_key: RecordField::ContractCount,
            limit: None,
        };
        let buckets = group_and_rank(&records, &config);

        assert_eq!(buckets.len(), 1);
        assert_eq!(buckets[0].label, ALL_BUCKET);
        assert_eq!(names(&buckets[0]), vec!["Mu", "Beta", "Eta", "Zeta"]);
    }

    #[test]
    fn limit_truncates_each_bucket() {
        let records = vec![
            record("Aa", 1, 1.0),
            record("Ab", 1, 3.0),
            record("Ac", 1, 2.0),
            record("Ba", 1, 9.0),
        ];
        let config = RankConfig {
            limit: Some(2),
            ..RankConfig::default()
        };
        let buckets = group_and_rank(&records, &config);

        assert_eq!(names(&buckets[0]), vec!["Ab", "Ac"]);
        assert_eq!(buckets[0].total_records, 3);
        assert_eq!(names(&buckets[1]), vec!["Ba"]);
    }

    #[test]
    fn name_ranking_is_case_insensitive() {
        let records = vec![record("banana", 1, 1.0), record("Apple", 1, 1.0), record("cherry", 1, 1.0)];
        let config = RankConfig {
            bucket_key: BucketKey::Unbucketed,
            rank_key: RecordField::Name,
            ..RankConfig::default()
        };
        assert_eq!(names(&group_and_rank(&records, &config)[0]), vec!["Apple", "banana", "cherry"]);
    }

    #[test]
    fn top_n_takes_largest_totals() {
        let records = vec![record("a", 1, 1.0), record("b", 1, 3.0), record("c", 1, 2.0)];
        let top: Vec<_> = top_n(&records, RecordField::TotalAmount, 2)
            .into_iter()
            .map(|r| r.name)
            .collect();
        assert_eq!(top, vec!["b", "c"]);
        assert!(top_n(&[], RecordField::TotalAmount, 5).is_empty());
    }

    #[test]
    fn letter_bucket_uppercases_unicode() {
        assert_eq!(letter_bucket("ñino"), "Ñ");
        assert_eq!(letter_bucket("(Blank)"), OTHER_BUCKET);
        assert_eq!(letter_bucket(""), OTHER_BUCKET);
    }

    #[test]
    fn config_reads_from_toml() {
        let config: RankConfig = toml::from_str(
            r#"
bucket_key = "none"
rank_key = "contract_count"
limit = 5
"#,
        )
        .unwrap();
        assert_eq!(config.bucket_key, BucketKey::Unbucketed);
        assert_eq!(config.rank_key, RecordField::ContractCount);
        assert_eq!(config.tie_break_key, RecordField::Name);
        assert_eq!(config.limit, Some(5));
    }
}
