//! Entity Search Module
//!
//! Detail pages receive a route, decode it to a name, and look that name up in the
//! per-kind aggregate index. Callers should only need to send:
//! - a search backend
//! - the index names in use
//! - the route
//!
//! and get back either the matching `EntityRecord` or the reason there is none
//! (`SearchError`).
//!
//! `MemoryIndex` answers queries from aggregate snapshots held in memory, with the same
//! matching rules as the hosted service for the subset of the contract used here.

use std::collections::HashMap;

use bantay_data::{AggregateFile, EntityRecord};
use log::debug;
use thiserror::Error;

use crate::config::IndexNames;
use crate::query::{DEFAULT_LIMIT, Filter, SearchHits, SearchQuery, SortSpec};
use crate::rank::RecordField;
use crate::route::EntityRoute;

/// Possible errors / situations causing a failed entity search.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum SearchError {
    #[error("no entity in index '{index}' matches name '{name}'")]
    NoMatchingName { index: String, name: String },
    #[error("index '{0}' does not exist")]
    UnknownIndex(String),
    #[error("attribute '{0}' cannot be used to filter or sort")]
    UnsupportedAttribute(String),
}

/// Anything that can answer entity searches.
pub trait SearchBackend {
    /// Run `query` against the entity records in `index`.
    ///
    /// # Errors
    /// Fails when the index is missing or the query uses an attribute the index cannot handle.
    fn search_records(&self, index: &str, query: &SearchQuery) -> Result<SearchHits<EntityRecord>, SearchError>;
}

/// Entity indices held in memory, keyed by index name.
#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    indices: HashMap<String, Vec<EntityRecord>>,
}

impl MemoryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace an index.
    pub fn insert_index(&mut self, index: impl Into<String>, records: Vec<EntityRecord>) {
        self.indices.insert(index.into(), records);
    }

    /// An index built from a single aggregate snapshot.
    pub fn from_aggregate(index: impl Into<String>, file: AggregateFile) -> Self {
        let mut memory = Self::new();
        memory.insert_index(index, file.data);
        memory
    }

    pub fn len(&self, index: &str) -> Option<usize> {
        self.indices.get(index).map(Vec::len)
    }
}

fn matches_filter(filter: &Filter, record: &EntityRecord) -> Result<bool, SearchError> {
    match filter {
        Filter::Equals { attribute, value } => match RecordField::from_attribute(attribute) {
            Some(RecordField::Name) => Ok(record.name.to_lowercase() == value.to_lowercase()),
            Some(RecordField::ContractCount) => Ok(value.trim().parse::<u64>().ok() == Some(record.contract_count)),
            Some(RecordField::TotalAmount) => Ok(value.trim().parse::<f64>().ok() == Some(record.total_amount)),
            None => Err(SearchError::UnsupportedAttribute(attribute.clone())),
        },
        Filter::And(filters) => {
            for inner in filters {
                if !matches_filter(inner, record)? {
                    return Ok(false);
                }
            }
            Ok(true)
        },
    }
}

fn sort_fields(sort: &[SortSpec]) -> Result<Vec<(RecordField, bool)>, SearchError> {
    sort.iter()
        .map(|spec| {
            RecordField::from_attribute(&spec.attribute)
                .map(|field| (field, spec.descending))
                .ok_or_else(|| SearchError::UnsupportedAttribute(spec.attribute.clone()))
        })
        .collect()
}

impl SearchBackend for MemoryIndex {
    fn search_records(&self, index: &str, query: &SearchQuery) -> Result<SearchHits<EntityRecord>, SearchError> {
        let records = self
            .indices
            .get(index)
            .ok_or_else(|| SearchError::UnknownIndex(index.to_string()))?;
        let needle = query.q.to_lowercase();
        let sort = sort_fields(&query.sort)?;

        let mut matched = Vec::new();
        for record in records {
            if !needle.is_empty() && !record.name.to_lowercase().contains(&needle) {
                continue;
            }
            if let Some(filter) = &query.filter
                && !matches_filter(filter, record)?
            {
                continue;
            }
            matched.push(record);
        }

        if !sort.is_empty() {
            matched.sort_by(|a, b| {
                sort.iter()
                    .map(|(field, descending)| {
                        let order = field.ascending(a, b);
                        if *descending { order.reverse() } else { order }
                    })
                    .find(|order| order.is_ne())
                    .unwrap_or(std::cmp::Ordering::Equal)
            });
        }

        let estimated_total_hits = matched.len();
        let offset = query.offset.unwrap_or(0);
        let limit = query.limit.unwrap_or(DEFAULT_LIMIT);
        let hits = matched.into_iter().skip(offset).take(limit).cloned().collect();
        debug!("index '{index}': {estimated_total_hits} matches for {query:?}");

        Ok(SearchHits {
            hits,
            estimated_total_hits,
            limit: Some(limit),
            offset: Some(offset),
        })
    }
}

/// Look up the entity a detail route points at.
///
/// # Errors
/// `SearchError::NoMatchingName` when the index has no entity with the decoded name, plus
/// any error from the backend.
pub fn resolve_entity<B: SearchBackend + ?Sized>(
    backend: &B,
    indices: &IndexNames,
    route: &EntityRoute,
) -> Result<EntityRecord, SearchError> {
    let index = indices.index_for(route.kind);
    let hits = backend.search_records(index, &SearchQuery::entity_by_name(&route.name))?;
    hits.hits.into_iter().next().ok_or_else(|| SearchError::NoMatchingName {
        index: index.to_string(),
        name: route.name.clone(),
    })
}
