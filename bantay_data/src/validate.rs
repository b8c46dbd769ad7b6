use std::collections::HashSet;
use std::fmt;

use crate::*;

/// Problem found in an aggregate snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    DuplicateName { name: String },
    BlankName { index: usize },
    InvalidAmount { name: String, context: String },
    InvertedDateRange { name: String, first: IsoDate, last: IsoDate },
    MetadataMismatch { context: String },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::DuplicateName { name } => {
                write!(f, "duplicate entity name '{name}'")
            },
            ValidationError::BlankName { index } => {
                write!(f, "blank entity name at position {index}")
            },
            ValidationError::InvalidAmount { name, context } => {
                write!(f, "invalid amount for '{name}' ({context})")
            },
            ValidationError::InvertedDateRange { name, first, last } => {
                write!(f, "'{name}' has first award date {first} after last award date {last}")
            },
            ValidationError::MetadataMismatch { context } => {
                write!(f, "metadata mismatch ({context})")
            },
        }
    }
}

impl std::error::Error for ValidationError {}

/// Check an aggregate snapshot for internal consistency and return every problem found.
///
/// Names are compared case-insensitively because lookups against the search service are.
///
/// ```
/// use bantay_data::{AggregateFile, AggregateMetadata, EntityRecord, validate_aggregate};
///
/// let file = AggregateFile {
///     metadata: AggregateMetadata {
///         title: "Awardees".into(),
///         source: "PhilGEPS".into(),
///         generated_at: "2024-01-01T00:00:00Z".into(),
///         total_items: 1,
///         total_contracts: 2,
///         total_amount: 1500.0,
///     },
///     data: vec![EntityRecord {
///         name: "Acme Builders".into(),
///         contract_count: 2,
///         total_amount: 1500.0,
///         first_award_date: Some("2023-02-01".into()),
///         last_award_date: Some("2023-11-30".into()),
///     }],
/// };
/// assert!(validate_aggregate(&file).is_empty());
/// ```
pub fn validate_aggregate(file: &AggregateFile) -> Vec<ValidationError> {
    let mut errors = Vec::new();
    let mut seen = HashSet::new();

    for (index, record) in file.data.iter().enumerate() {
        if record.name.trim().is_empty() {
            errors.push(ValidationError::BlankName { index });
            continue;
        }
        if !seen.insert(record.name.to_lowercase()) {
            errors.push(ValidationError::DuplicateName {
                name: record.name.clone(),
            });
        }
        check_amount(&record.name, record.total_amount, "total amount", &mut errors);
        if let (Some(first), Some(last)) = (&record.first_award_date, &record.last_award_date)
            && first > last
        {
            errors.push(ValidationError::InvertedDateRange {
                name: record.name.clone(),
                first: first.clone(),
                last: last.clone(),
            });
        }
    }

    if file.metadata.total_items != file.data.len() {
        errors.push(ValidationError::MetadataMismatch {
            context: format!(
                "total_items is {} but data holds {} records",
                file.metadata.total_items,
                file.data.len()
            ),
        });
    }
    check_amount("metadata", file.metadata.total_amount, "metadata total amount", &mut errors);

    errors
}

fn check_amount(name: &str, amount: f64, context: &str, errors: &mut Vec<ValidationError>) {
    if !amount.is_finite() {
        errors.push(ValidationError::InvalidAmount {
            name: name.to_string(),
            context: format!("{context} is not a finite number"),
        });
    } else if amount < 0.0 {
        errors.push(ValidationError::InvalidAmount {
            name: name.to_string(),
            context: format!("{context} is negative ({amount})"),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, total: f64) -> EntityRecord {
        EntityRecord {
            name: name.to_string(),
            contract_count: 1,
            total_amount: total,
            first_award_date: None,
            last_award_date: None,
        }
    }

    fn snapshot(data: Vec<EntityRecord>) -> AggregateFile {
        AggregateFile {
            metadata: AggregateMetadata {
                title: "Test".into(),
                source: String::new(),
                generated_at: "2024-01-01T00:00:00Z".into(),
                total_items: data.len(),
                total_contracts: data.len() as u64,
                total_amount: data.iter().map(|r| r.total_amount).sum(),
            },
            data,
        }
    }

    #[test]
    fn case_insensitive_duplicates_are_reported() {
        let file = snapshot(vec![record("Acme Corp", 10.0), record("ACME CORP", 5.0)]);

        let errors = validate_aggregate(&file);
        assert!(
            errors
                .iter()
                .any(|err| matches!(err, ValidationError::DuplicateName { name } if name == "ACME CORP"))
        );
    }

    #[test]
    fn negative_and_nan_amounts_are_reported() {
        let mut file = snapshot(vec![record("Owing", -1.0), record("Broken", f64::NAN)]);
        file.metadata.total_amount = 0.0;

        let errors = validate_aggregate(&file);
        let invalid: Vec<_> = errors
            .iter()
            .filter(|err| matches!(err, ValidationError::InvalidAmount { .. }))
            .collect();
        assert_eq!(invalid.len(), 2);
    }

    #[test]
    fn inverted_dates_and_blank_names_are_reported() {
        let mut late = record("Late Start", 1.0);
        late.first_award_date = Some("2024-05-01".into());
        late.last_award_date = Some("2023-05-01".into());
        let file = snapshot(vec![late, record("  ", 1.0)]);

        let errors = validate_aggregate(&file);
        assert!(errors.iter().any(|err| matches!(err, ValidationError::InvertedDateRange { .. })));
        assert!(errors.contains(&ValidationError::BlankName { index: 1 }));
    }

    #[test]
    fn item_count_mismatch_is_reported() {
        let mut file = snapshot(vec![record("Solo", 1.0)]);
        file.metadata.total_items = 3;

        let errors = validate_aggregate(&file);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("total_items is 3"));
    }
}
