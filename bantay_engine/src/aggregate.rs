//! Per-entity aggregates built from contract rows.
//!
//! These are the snapshots served to list pages and loaded into the per-kind indices:
//! one record per distinct name (ignoring case) with its contract count, total amount and
//! award date range.

use std::collections::HashMap;

use anyhow::{Context, Result};
use bantay_data::{AggregateFile, AggregateMetadata, ContractRow, EntityKind, EntityRecord};
use log::{debug, info, warn};
use time::format_description::BorrowedFormatItem;
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime};

use crate::rank::RecordField;

/// Rows sharing a name up to case, merged into one record.
struct Group<'a> {
    record: EntityRecord,
    first: Option<Date>,
    last: Option<Date>,
    /// Each spelling seen, with its row count, in order of first appearance.
    spellings: Vec<(&'a str, usize)>,
}

impl<'a> Group<'a> {
    fn new() -> Self {
        Self {
            record: EntityRecord::empty(""),
            first: None,
            last: None,
            spellings: Vec::new(),
        }
    }

    fn add_spelling(&mut self, name: &'a str) {
        match self.spellings.iter_mut().find(|(seen, _)| *seen == name) {
            Some((_, count)) => *count += 1,
            None => self.spellings.push((name, 1)),
        }
    }

    fn widen(&mut self, date: Date) {
        if self.first.is_none_or(|first| date < first) {
            self.first = Some(date);
        }
        if self.last.is_none_or(|last| date > last) {
            self.last = Some(date);
        }
    }

    /// The record under its most common spelling; ties go to the one seen first.
    fn finish(self) -> EntityRecord {
        let mut best: Option<(&str, usize)> = None;
        for &(name, count) in &self.spellings {
            if best.is_none_or(|(_, best_count)| count > best_count) {
                best = Some((name, count));
            }
        }
        EntityRecord {
            name: best.map_or_else(String::new, |(name, _)| name.to_string()),
            first_award_date: self.first.map(iso_date),
            last_award_date: self.last.map(iso_date),
            ..self.record
        }
    }
}

/// Group `rows` by the kind's attribute and total them.
///
/// Rows with a blank value are skipped. Names are trimmed and grouped case-insensitively,
/// since routes and lookups cannot tell case apart; each group is named by its most common
/// spelling. Award dates that do not parse are left out of the date range. The result is
/// ordered by total amount, largest first, then by name.
pub fn aggregate_by(rows: &[ContractRow], kind: EntityKind) -> Vec<EntityRecord> {
    let mut groups: HashMap<String, Group> = HashMap::new();
    let mut skipped = 0usize;
    let mut bad_dates = 0usize;

    for row in rows {
        let name = kind.value_of(row).trim();
        if name.is_empty() {
            skipped += 1;
            continue;
        }
        let group = groups.entry(name.to_lowercase()).or_insert_with(Group::new);
        group.add_spelling(name);
        group.record.contract_count += 1;
        group.record.total_amount += row.contract_amount;
        if let Some(raw) = row.award_date.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
            match parse_award_date(raw) {
                Some(date) => group.widen(date),
                None => {
                    debug!("ignoring unreadable award date '{raw}' for '{name}'");
                    bad_dates += 1;
                },
            }
        }
    }
    if skipped > 0 {
        info!("{skipped} contracts have no {} and were left out", kind.filter_attribute());
    }
    if bad_dates > 0 {
        warn!("{bad_dates} award dates could not be read and were left out of date ranges");
    }

    let mut records: Vec<_> = groups.into_values().map(Group::finish).collect();
    records.sort_by(|a, b| {
        RecordField::TotalAmount
            .ranked(a, b)
            .then_with(|| RecordField::Name.ranked(a, b))
    });
    records
}

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");
const US_DATE: &[BorrowedFormatItem<'static>] = format_description!("[month padding:none]/[day padding:none]/[year]");

/// Read an export award date: ISO `2023-01-05` or `01/05/2023` (month first), optionally
/// followed by a time of day, which is ignored.
pub fn parse_award_date(raw: &str) -> Option<Date> {
    let day = raw.trim().split([' ', 'T']).next()?;
    Date::parse(day, ISO_DATE).or_else(|_| Date::parse(day, US_DATE)).ok()
}

fn iso_date(date: Date) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), u8::from(date.month()), date.day())
}

fn kind_title(kind: EntityKind) -> String {
    let segment = kind.segment();
    let mut chars = segment.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Current time in RFC 3339, as stamped into snapshot metadata.
pub fn generated_at() -> Result<String> {
    OffsetDateTime::now_utc()
        .format(&Rfc3339)
        .context("formatting snapshot timestamp")
}

/// Aggregate `rows` for `kind` and wrap them with snapshot metadata.
pub fn build_aggregate_file(rows: &[ContractRow], kind: EntityKind, source: &str) -> Result<AggregateFile> {
    let data = aggregate_by(rows, kind);
    let title = if source.is_empty() {
        kind_title(kind)
    } else {
        format!("{source} {}", kind_title(kind))
    };
    let metadata = AggregateMetadata {
        title,
        source: source.to_string(),
        generated_at: generated_at()?,
        total_items: data.len(),
        total_contracts: rows.len() as u64,
        total_amount: rows.iter().map(|row| row.contract_amount).sum(),
    };
    info!("{} {} aggregated from {} contracts", data.len(), kind, rows.len());
    Ok(AggregateFile { metadata, data })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(awardee: &str, category: &str, date: Option<&str>, amount: f64) -> ContractRow {
        ContractRow {
            awardee_name: awardee.to_string(),
            organization_name: "DPWH".to_string(),
            business_category: category.to_string(),
            award_date: date.map(str::to_string),
            contract_amount: amount,
            ..ContractRow::default()
        }
    }

    fn sample() -> Vec<ContractRow> {
        vec![
            row("Acme", "Construction", Some("2023-03-01"), 100.0),
            row("Acme ", "Construction", Some("2022-12-31"), 50.0),
            row("Beta Corp", "Supplies", None, 500.0),
            row("", "Supplies", Some("2023-01-01"), 7.0),
            row("Acme", "", Some("2024-06-30"), 25.0),
        ]
    }

    #[test]
    fn totals_counts_and_date_ranges() {
        let records = aggregate_by(&sample(), EntityKind::Awardees);
        assert_eq!(records.len(), 2);

        assert_eq!(records[0].name, "Beta Corp");
        assert_eq!(records[0].first_award_date, None);

        let acme = &records[1];
        assert_eq!(acme.name, "Acme");
        assert_eq!(acme.contract_count, 3);
        assert!((acme.total_amount - 175.0).abs() < f64::EPSILON);
        assert_eq!(acme.first_award_date.as_deref(), Some("2022-12-31"));
        assert_eq!(acme.last_award_date.as_deref(), Some("2024-06-30"));
    }

    #[test]
    fn case_variants_merge_under_the_common_spelling() {
        let rows = vec![
            row("ACME CORP", "", Some("2023-05-01"), 5.0),
            row("Acme Corp", "", Some("2022-01-10"), 100.0),
            row("acme corp ", "", None, 1.0),
            row("Acme Corp", "", Some("2024-02-29"), 10.0),
        ];
        let records = aggregate_by(&rows, EntityKind::Awardees);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].name, "Acme Corp");
        assert_eq!(records[0].contract_count, 4);
        assert!((records[0].total_amount - 116.0).abs() < f64::EPSILON);
        assert_eq!(records[0].first_award_date.as_deref(), Some("2022-01-10"));
        assert_eq!(records[0].last_award_date.as_deref(), Some("2024-02-29"));

        // a tie keeps the spelling seen first
        let tied = aggregate_by(&rows[..2], EntityKind::Awardees);
        assert_eq!(tied[0].name, "ACME CORP");
    }

    #[test]
    fn date_ranges_compare_calendar_dates() {
        let rows = vec![
            row("Acme", "", Some("12/31/2022"), 1.0),
            row("Acme", "", Some("2023-01-05 00:00:00"), 1.0),
            row("Acme", "", Some("1/5/2022"), 1.0),
            row("Acme", "", Some("sometime in May"), 1.0),
        ];
        let records = aggregate_by(&rows, EntityKind::Awardees);
        assert_eq!(records[0].first_award_date.as_deref(), Some("2022-01-05"));
        assert_eq!(records[0].last_award_date.as_deref(), Some("2023-01-05"));
        assert_eq!(records[0].contract_count, 4);
    }

    #[test]
    fn unreadable_dates_leave_the_range_empty() {
        assert_eq!(parse_award_date("31/12/2022"), None);
        assert_eq!(parse_award_date(""), None);
        let records = aggregate_by(&[row("Acme", "", Some("n/a"), 1.0)], EntityKind::Awardees);
        assert_eq!(records[0].first_award_date, None);
    }

    #[test]
    fn groups_by_the_requested_kind() {
        let records = aggregate_by(&sample(), EntityKind::Categories);
        let names: Vec<_> = records.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["Supplies", "Construction"]);
        assert_eq!(records[0].contract_count, 2);

        let orgs = aggregate_by(&sample(), EntityKind::Organizations);
        assert_eq!(orgs.len(), 1);
        assert_eq!(orgs[0].contract_count, 5);
    }

    #[test]
    fn snapshot_metadata_covers_every_row() {
        let file = build_aggregate_file(&sample(), EntityKind::Awardees, "PhilGEPS").unwrap();
        assert_eq!(file.metadata.title, "PhilGEPS Awardees");
        assert_eq!(file.metadata.total_items, 2);
        assert_eq!(file.metadata.total_contracts, 5);
        assert!((file.metadata.total_amount - 682.0).abs() < f64::EPSILON);
        assert!(bantay_data::validate_aggregate(&file).is_empty());
    }
}
