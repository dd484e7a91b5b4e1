//! Risk policy documents.
//!
//! A risk policy carries every number the engine treats as audit policy:
//! band cut points, choice scores, criterion weights and the profile bands.
//! Policies are structured data validated against JSON Schema before they
//! are deserialized, then checked semantically when a
//! [`Registry`](crate::registry::Registry) is built from them.

mod parser;
mod schema;

pub use parser::{CriterionPolicy, PolicyError, ProfilePolicy, RiskPolicy};
pub use schema::{validate_policy_schema, SchemaError};
