use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Calendar date stored as an ISO `YYYY-MM-DD` string.
///
/// ISO dates order correctly as plain strings, so no date type is needed to compute ranges.
pub type IsoDate = String;

/// The kinds of entity that get their own detail page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// Contractors that were awarded a contract.
    Awardees,
    /// Procuring government organizations.
    Organizations,
    /// Areas of delivery.
    Locations,
    /// Business categories.
    Categories,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [
        EntityKind::Awardees,
        EntityKind::Organizations,
        EntityKind::Locations,
        EntityKind::Categories,
    ];

    /// First path segment of this kind's detail routes.
    pub fn segment(self) -> &'static str {
        match self {
            EntityKind::Awardees => "awardees",
            EntityKind::Organizations => "organizations",
            EntityKind::Locations => "locations",
            EntityKind::Categories => "categories",
        }
    }

    /// Filterable attribute holding this kind's name in the contracts index.
    pub fn filter_attribute(self) -> &'static str {
        match self {
            EntityKind::Awardees => "awardee_name",
            EntityKind::Organizations => "organization_name",
            EntityKind::Locations => "area_of_delivery",
            EntityKind::Categories => "business_category",
        }
    }

    /// Name of the per-kind aggregate index when no configuration overrides it.
    pub fn default_index(self) -> &'static str {
        match self {
            EntityKind::Awardees => "philgeps_awardees",
            EntityKind::Organizations => "philgeps_organizations",
            EntityKind::Locations => "philgeps_area_of_deliveries",
            EntityKind::Categories => "philgeps_business_categories",
        }
    }

    /// Look up a kind by its route segment.
    pub fn from_segment(segment: &str) -> Option<EntityKind> {
        EntityKind::ALL.into_iter().find(|kind| kind.segment() == segment)
    }

    /// The value of this kind's attribute on a contract row.
    pub fn value_of(self, row: &ContractRow) -> &str {
        match self {
            EntityKind::Awardees => &row.awardee_name,
            EntityKind::Organizations => &row.organization_name,
            EntityKind::Locations => &row.area_of_delivery,
            EntityKind::Categories => &row.business_category,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// Returned when a string names no known entity kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownKind(pub String);

impl fmt::Display for UnknownKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown entity kind '{}'", self.0)
    }
}

impl std::error::Error for UnknownKind {}

impl FromStr for EntityKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        EntityKind::from_segment(s).ok_or_else(|| UnknownKind(s.to_string()))
    }
}

/// A single awarded contract as exported by the procurement service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ContractRow {
    #[serde(default)]
    pub reference_id: String,
    #[serde(default)]
    pub contract_title: String,
    pub awardee_name: String,
    pub organization_name: String,
    #[serde(default)]
    pub area_of_delivery: String,
    #[serde(default)]
    pub business_category: String,
    #[serde(default)]
    pub award_date: Option<IsoDate>,
    pub contract_amount: f64,
}

/// Read-only aggregate projection for one named entity.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub name: String,
    pub contract_count: u64,
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_award_date: Option<IsoDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_award_date: Option<IsoDate>,
}

impl EntityRecord {
    /// A record with no contracts yet.
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contract_count: 0,
            total_amount: 0.0,
            first_award_date: None,
            last_award_date: None,
        }
    }
}

/// Header block of an aggregate snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateMetadata {
    pub title: String,
    #[serde(default)]
    pub source: String,
    pub generated_at: String,
    pub total_items: usize,
    #[serde(default)]
    pub total_contracts: u64,
    #[serde(default)]
    pub total_amount: f64,
}

/// Precomputed aggregate snapshot served as a static JSON file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateFile {
    pub metadata: AggregateMetadata,
    #[serde(default)]
    pub data: Vec<EntityRecord>,
}
