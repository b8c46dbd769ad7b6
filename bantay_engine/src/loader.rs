//! Loading contract exports and reading/writing aggregate snapshots.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use bantay_data::{AggregateFile, ContractRow};
use log::info;
use thiserror::Error;

use crate::csv::parse_rows;

const REQUIRED_COLUMNS: [&str; 3] = ["awardee_name", "organization_name", "contract_amount"];

/// Problems mapping CSV text to contract rows.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum LoadError {
    #[error("contract export is empty")]
    Empty,
    #[error("contract export has no '{0}' column")]
    MissingColumn(&'static str),
    #[error("line {line}: contract amount '{value}' is not a number")]
    InvalidAmount { line: usize, value: String },
}

/// Column positions found in the header row.
struct Columns(HashMap<String, usize>);

impl Columns {
    fn get<'a>(&self, row: &'a [String], column: &str) -> &'a str {
        self.0
            .get(column)
            .and_then(|&i| row.get(i))
            .map_or("", |cell| cell.trim())
    }
}

/// Map headered CSV text to contract rows, matching columns by header name.
///
/// # Errors
/// Fails on an empty export, a missing required column, or an unparsable amount.
pub fn contracts_from_csv(text: &str) -> Result<Vec<ContractRow>, LoadError> {
    let mut rows = parse_rows(text).into_iter();
    let header = rows.next().ok_or(LoadError::Empty)?;
    let columns = Columns(
        header
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim().trim_start_matches('\u{feff}').to_string(), i))
            .collect(),
    );
    for required in REQUIRED_COLUMNS {
        if !columns.0.contains_key(required) {
            return Err(LoadError::MissingColumn(required));
        }
    }

    let mut contracts = Vec::new();
    // data starts on the second line
    for (line, row) in rows.enumerate().map(|(i, row)| (i + 2, row)) {
        let raw_amount = columns.get(&row, "contract_amount");
        let contract_amount = parse_amount(raw_amount).ok_or_else(|| LoadError::InvalidAmount {
            line,
            value: raw_amount.to_string(),
        })?;
        let award_date = Some(columns.get(&row, "award_date"))
            .filter(|date| !date.is_empty())
            .map(str::to_string);

        contracts.push(ContractRow {
            reference_id: columns.get(&row, "reference_id").to_string(),
            contract_title: columns.get(&row, "contract_title").to_string(),
            awardee_name: columns.get(&row, "awardee_name").to_string(),
            organization_name: columns.get(&row, "organization_name").to_string(),
            area_of_delivery: columns.get(&row, "area_of_delivery").to_string(),
            business_category: columns.get(&row, "business_category").to_string(),
            award_date,
            contract_amount,
        });
    }
    Ok(contracts)
}

/// Amounts may carry thousands separators; an empty cell counts as zero.
fn parse_amount(raw: &str) -> Option<f64> {
    if raw.is_empty() {
        return Some(0.0);
    }
    raw.replace(',', "").parse::<f64>().ok().filter(|amount| amount.is_finite())
}

/// Load contract rows from a CSV export.
pub fn read_contracts(path: &Path) -> Result<Vec<ContractRow>> {
    let text = fs::read_to_string(path).with_context(|| format!("reading contracts from '{}'", path.display()))?;
    let contracts = contracts_from_csv(&text).with_context(|| format!("parsing contracts from '{}'", path.display()))?;
    info!("{} contracts loaded from '{}'", contracts.len(), path.display());
    Ok(contracts)
}

/// Load an aggregate snapshot from JSON.
pub fn load_aggregate_file(path: &Path) -> Result<AggregateFile> {
    let text = fs::read_to_string(path).with_context(|| format!("reading aggregate from '{}'", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing aggregate JSON from '{}'", path.display()))
}

/// Write an aggregate snapshot as pretty JSON, creating parent directories.
pub fn write_aggregate_file(path: &Path, file: &AggregateFile) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| format!("creating directory '{}'", parent.display()))?;
    }
    let json = serde_json::to_string_pretty(file).context("serializing aggregate")?;
    fs::write(path, json).with_context(|| format!("writing aggregate to '{}'", path.display()))?;
    info!("{} records written to '{}'", file.data.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const EXPORT: &str = "\u{feff}reference_id,awardee_name,organization_name,area_of_delivery,business_category,award_date,contract_amount
R-1,\"R&D Solutions, Inc.\",DPWH,Cebu,Construction,2023-01-05,\"1,250.50\"
R-2,Acme,DepEd,,Supplies,,
";

    #[test]
    fn maps_columns_by_header_name() {
        let rows = contracts_from_csv(EXPORT).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].awardee_name, "R&D Solutions, Inc.");
        assert_eq!(rows[0].reference_id, "R-1");
        assert_eq!(rows[0].award_date.as_deref(), Some("2023-01-05"));
        assert!((rows[0].contract_amount - 1250.5).abs() < f64::EPSILON);
        assert_eq!(rows[1].award_date, None);
        assert_eq!(rows[1].contract_amount, 0.0);
        assert_eq!(rows[1].contract_title, "");
    }

    #[test]
    fn reports_missing_columns_and_bad_amounts() {
        assert_eq!(contracts_from_csv(""), Err(LoadError::Empty));
        assert_eq!(
            contracts_from_csv("awardee_name,contract_amount\nAcme,1\n"),
            Err(LoadError::MissingColumn("organization_name"))
        );
        assert_eq!(
            contracts_from_csv("awardee_name,organization_name,contract_amount\nAcme,DPWH,1\nAcme,DPWH,lots\n"),
            Err(LoadError::InvalidAmount {
                line: 3,
                value: "lots".into()
            })
        );
    }
}
