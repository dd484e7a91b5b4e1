//! Risk policy parsing from YAML/JSON.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::bands::{Band, BandTableError, Choice, ScoreRange};
use crate::types::{CriterionId, FormulaKind, Polarity, ZeroPolicy};

use super::schema::{validate_policy_schema, SchemaError};

/// Configuration failures.
///
/// Any of these means the policy itself is malformed, so no assessment can
/// be scored against it.
#[derive(Error, Debug)]
pub enum PolicyError {
    #[error("Failed to read policy file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Failed to parse YAML: {0}")]
    YamlError(#[from] serde_yaml::Error),

    #[error("Failed to parse JSON: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("Policy has no entry for criterion {0}")]
    MissingCriterion(CriterionId),

    #[error("Criterion {criterion} ({kind}) {reason}")]
    TableShape {
        criterion: CriterionId,
        kind: FormulaKind,
        reason: &'static str,
    },

    #[error("Invalid weight {weight} for criterion {criterion}")]
    InvalidWeight { criterion: CriterionId, weight: f64 },

    #[error("Invalid score range {min}..={max}")]
    InvalidScoreRange { min: u8, max: u8 },

    #[error("Malformed table for {scope}: {source}")]
    BandTable {
        scope: String,
        #[source]
        source: BandTableError,
    },
}

/// Per-criterion policy entry.
///
/// Numeric criteria use `polarity` + `bands`; lookup criteria use `choices`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionPolicy {
    /// Contribution to the total risk value (defaults to 1.0)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub weight: Option<f64>,

    /// Overrides the criterion's built-in 0/0 convention
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub zero_policy: Option<ZeroPolicy>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polarity: Option<Polarity>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bands: Option<Vec<Band>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub choices: Option<Vec<Choice>>,
}

/// Bands mapping the total risk value to a risk profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfilePolicy {
    pub bands: Vec<Band>,
}

/// A versioned risk policy document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskPolicy {
    /// Version of this policy
    pub policy_version: String,

    /// Version of the policy schema (date-based)
    pub schema_version: String,

    /// Human-readable name
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    pub score_range: ScoreRange,

    pub criteria: BTreeMap<CriterionId, CriterionPolicy>,

    pub profile: ProfilePolicy,
}

impl RiskPolicy {
    /// Parse a policy from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_yaml::from_str(yaml)?;
        Self::from_value(value)
    }

    /// Parse a policy from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, PolicyError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Parse a policy from a YAML file.
    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path)?;
        Self::from_yaml(&contents)
    }

    /// Parse a policy from a JSON file.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Parse a policy file, picking the format from its extension.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, PolicyError> {
        let path = path.as_ref();
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_file(path),
            _ => Self::from_yaml_file(path),
        }
    }

    fn from_value(value: serde_json::Value) -> Result<Self, PolicyError> {
        validate_policy_schema(&value)?;
        let policy: RiskPolicy = serde_json::from_value(value)?;
        policy.validate_score_range()?;
        Ok(policy)
    }

    fn validate_score_range(&self) -> Result<(), PolicyError> {
        if self.score_range.min > self.score_range.max {
            return Err(PolicyError::InvalidScoreRange {
                min: self.score_range.min,
                max: self.score_range.max,
            });
        }
        Ok(())
    }

    /// Entry for a criterion, if the policy declares one.
    pub fn criterion(&self, id: CriterionId) -> Option<&CriterionPolicy> {
        self.criteria.get(&id)
    }
}
