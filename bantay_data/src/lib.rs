//! Shared data model for public procurement transparency data.

pub mod defs;
pub mod validate;

pub use defs::*;
pub use validate::{ValidationError, validate_aggregate};
