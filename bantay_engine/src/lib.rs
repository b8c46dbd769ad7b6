#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const BANTAY_VERSION: &str = env!("CARGO_PKG_VERSION");

// Link codec and routes
pub mod legacy_slug;
pub mod route;
pub mod slug;

// Search and ranking
pub mod entity_search;
pub mod query;
pub mod rank;

// Snapshot pipeline
pub mod aggregate;
pub mod csv;
pub mod loader;
pub mod split;

// Runtime setup
pub mod config;
pub mod data_paths;

// Re-exports for convenience
pub use config::{BantayConfig, load_config};
pub use entity_search::{MemoryIndex, SearchBackend, SearchError, resolve_entity};
pub use rank::{RankConfig, group_and_rank};
pub use route::{EntityRoute, RouteError};
