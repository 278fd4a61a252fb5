//! gf-core: stable foundation for groundflow.
//!
//! Contains:
//! - ids (string-backed identifiers for projects and models)

pub mod ids;

pub use ids::*;
