//! JSON Schema validation for risk policies.
//!
//! Policies are validated against `schema/policy.schema.json` before they
//! are deserialized, so structural mistakes surface with a path into the
//! document rather than as an opaque deserialization error.

use std::sync::OnceLock;
use thiserror::Error;

/// Embedded policy schema (loaded at compile time).
const POLICY_SCHEMA_JSON: &str = include_str!("../../../../schema/policy.schema.json");

/// Compiled JSON Schema validator (initialized once, reused).
static COMPILED_SCHEMA: OnceLock<Result<jsonschema::Validator, String>> = OnceLock::new();

/// Errors from schema validation.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to load policy schema: {0}")]
    LoadError(String),

    #[error("Policy violates schema: {}", .0.join("; "))]
    Invalid(Vec<String>),
}

/// Get or initialize the compiled schema validator.
fn get_validator() -> Result<&'static jsonschema::Validator, SchemaError> {
    let result = COMPILED_SCHEMA.get_or_init(|| {
        let schema_value: serde_json::Value = serde_json::from_str(POLICY_SCHEMA_JSON)
            .map_err(|e| format!("Invalid schema JSON: {}", e))?;

        jsonschema::options()
            .build(&schema_value)
            .map_err(|e| format!("Failed to compile schema: {}", e))
    });

    result
        .as_ref()
        .map_err(|e| SchemaError::LoadError(e.clone()))
}

/// Validate a policy JSON value against the schema.
///
/// Every violation is reported, each suffixed with its instance path.
pub fn validate_policy_schema(policy_json: &serde_json::Value) -> Result<(), SchemaError> {
    let validator = get_validator()?;

    let errors: Vec<String> = validator
        .iter_errors(policy_json)
        .map(|e| format!("{} at {}", e, e.instance_path))
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(SchemaError::Invalid(errors))
    }
}
