//! Request and response shapes of the hosted search service.
//!
//! Only the parts of the MeiliSearch search contract the pages use are modelled: query
//! text, an attribute filter, sort, and paging. Responses carry the ranked hits and an
//! approximate total. [`IndexSettings`] is the settings body that makes those queries legal
//! on each index.

use bantay_data::EntityKind;
use serde::{Deserialize, Serialize, Serializer};

use crate::rank::RecordField;
use crate::route::EntityRoute;

/// Default page size the service applies when a query sets no limit.
pub const DEFAULT_LIMIT: usize = 20;

/// Contract attribute that detail pages sort by.
pub const CONTRACT_AMOUNT: &str = "contract_amount";
pub const AWARD_DATE: &str = "award_date";

/// Characters that split words in indexed names.
const SEPARATOR_TOKENS: [&str; 4] = [" ", "-", "|", "/"];
/// Punctuation kept inside words, so names like "R&D Solutions, Inc." match as written.
const NON_SEPARATOR_TOKENS: [&str; 6] = [".", "&", ",", "'", "(", ")"];

/// Attribute filter expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Filter {
    /// `attribute = "value"`; the service compares strings case-insensitively.
    Equals { attribute: String, value: String },
    /// Every inner filter must hold.
    And(Vec<Filter>),
}

impl Filter {
    pub fn equals(attribute: impl Into<String>, value: impl Into<String>) -> Self {
        Filter::Equals {
            attribute: attribute.into(),
            value: value.into(),
        }
    }

    #[must_use]
    pub fn and(self, other: Filter) -> Self {
        match self {
            Filter::And(mut filters) => {
                filters.push(other);
                Filter::And(filters)
            },
            single => Filter::And(vec![single, other]),
        }
    }

    /// Render in the service's filter syntax.
    ///
    /// Values are quoted with `"` and `\` escaped, so a name cannot end the string early
    /// and smuggle in another condition.
    pub fn render(&self) -> String {
        match self {
            Filter::Equals { attribute, value } => {
                format!("{attribute} = \"{}\"", escape_filter_value(value))
            },
            Filter::And(filters) => filters
                .iter()
                .map(|filter| match filter {
                    Filter::And(_) => format!("({})", filter.render()),
                    Filter::Equals { .. } => filter.render(),
                })
                .collect::<Vec<_>>()
                .join(" AND "),
        }
    }
}

fn escape_filter_value(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        if ch == '"' || ch == '\\' {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped
}

impl Serialize for Filter {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

/// One sort criterion, rendered as `attribute:asc` or `attribute:desc`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortSpec {
    pub attribute: String,
    pub descending: bool,
}

impl SortSpec {
    pub fn asc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            descending: false,
        }
    }

    pub fn desc(attribute: impl Into<String>) -> Self {
        Self {
            attribute: attribute.into(),
            descending: true,
        }
    }

    pub fn render(&self) -> String {
        let direction = if self.descending { "desc" } else { "asc" };
        format!("{}:{direction}", self.attribute)
    }
}

impl Serialize for SortSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.render())
    }
}

/// Body of a search request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SearchQuery {
    #[serde(skip_serializing_if = "String::is_empty")]
    pub q: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub sort: Vec<SortSpec>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

impl SearchQuery {
    pub fn text(q: impl Into<String>) -> Self {
        Self {
            q: q.into(),
            ..Self::default()
        }
    }

    /// Exact lookup of one entity record by name in a per-kind index.
    pub fn entity_by_name(name: &str) -> Self {
        Self::default()
            .filtered(Filter::equals(RecordField::Name.attribute(), name))
            .limit(1)
    }

    /// Contracts belonging to the entity behind `route`, largest first.
    pub fn contracts_of(route: &EntityRoute) -> Self {
        Self::default()
            .filtered(Filter::equals(route.kind.filter_attribute(), route.name.as_str()))
            .sorted_by(SortSpec::desc(CONTRACT_AMOUNT))
    }

    #[must_use]
    pub fn filtered(mut self, filter: Filter) -> Self {
        self.filter = Some(match self.filter.take() {
            Some(existing) => existing.and(filter),
            None => filter,
        });
        self
    }

    #[must_use]
    pub fn sorted_by(mut self, sort: SortSpec) -> Self {
        self.sort.push(sort);
        self
    }

    #[must_use]
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    #[must_use]
    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    /// Serialize as the JSON request body.
    ///
    /// # Errors
    /// Propagates serializer failures.
    pub fn to_body(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

/// Settings body applied to an index before documents are searched.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IndexSettings {
    pub searchable_attributes: Vec<String>,
    pub filterable_attributes: Vec<String>,
    pub sortable_attributes: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub separator_tokens: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub non_separator_tokens: Vec<String>,
}

fn owned(items: &[&str]) -> Vec<String> {
    items.iter().map(|item| (*item).to_string()).collect()
}

impl IndexSettings {
    /// Settings for the contracts index: every entity attribute is filterable so
    /// [`SearchQuery::contracts_of`] works for any route.
    pub fn contracts() -> Self {
        let mut filterable: Vec<String> = EntityKind::ALL
            .iter()
            .map(|kind| kind.filter_attribute().to_string())
            .collect();
        filterable.push(AWARD_DATE.to_string());
        Self {
            searchable_attributes: owned(&["*"]),
            filterable_attributes: filterable,
            sortable_attributes: owned(&[CONTRACT_AMOUNT]),
            separator_tokens: owned(&SEPARATOR_TOKENS),
            non_separator_tokens: owned(&NON_SEPARATOR_TOKENS),
        }
    }

    /// Settings for a per-kind aggregate index, as used by [`SearchQuery::entity_by_name`].
    pub fn entities() -> Self {
        Self {
            searchable_attributes: owned(&[RecordField::Name.attribute()]),
            filterable_attributes: owned(&[RecordField::Name.attribute()]),
            sortable_attributes: owned(&[
                RecordField::Name.attribute(),
                RecordField::ContractCount.attribute(),
                RecordField::TotalAmount.attribute(),
            ]),
            separator_tokens: owned(&SEPARATOR_TOKENS),
            non_separator_tokens: owned(&NON_SEPARATOR_TOKENS),
        }
    }

    /// Whether queries may filter on `attribute`.
    pub fn can_filter(&self, attribute: &str) -> bool {
        self.filterable_attributes.iter().any(|a| a == attribute)
    }

    /// Whether queries may sort on `attribute`.
    pub fn can_sort(&self, attribute: &str) -> bool {
        self.sortable_attributes.iter().any(|a| a == attribute)
    }
}

/// Ranked hits returned by the service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchHits<T> {
    pub hits: Vec<T>,
    /// Approximate number of matches before paging.
    pub estimated_total_hits: usize,
    #[serde(default)]
    pub limit: Option<usize>,
    #[serde(default)]
    pub offset: Option<usize>,
}
