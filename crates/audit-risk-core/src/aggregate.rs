//! Aggregator: combines per-criterion scores into the total risk value.
//!
//! The aggregator applies one strict rule: a total exists only when every
//! criterion is scored. There is no partial, interpolated or zero-filled
//! total. When scores are missing the outcome names them instead.
//!
//! `total = Σ score_i × weight_i`, rounded to two decimals, then classified
//! by the registry's profile bands.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::criteria::round_metric;
use crate::registry::Registry;
use crate::types::{CriterionId, CriterionStates};

/// A complete aggregate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskTotal {
    pub value: f64,
    pub profile: String,
}

/// Result of asking for the total.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum AggregateOutcome {
    Complete(RiskTotal),
    Incomplete { missing: Vec<CriterionId> },
}

impl AggregateOutcome {
    pub fn is_complete(&self) -> bool {
        matches!(self, AggregateOutcome::Complete(_))
    }

    pub fn total(&self) -> Option<&RiskTotal> {
        match self {
            AggregateOutcome::Complete(total) => Some(total),
            AggregateOutcome::Incomplete { .. } => None,
        }
    }

    /// Criteria still missing inputs; empty when complete.
    pub fn missing(&self) -> &[CriterionId] {
        match self {
            AggregateOutcome::Complete(_) => &[],
            AggregateOutcome::Incomplete { missing } => missing,
        }
    }

    /// Split into the record's `(total_risk_value, risk_profile)` pair.
    pub fn into_fields(self) -> (Option<f64>, Option<String>) {
        match self {
            AggregateOutcome::Complete(total) => (Some(total.value), Some(total.profile)),
            AggregateOutcome::Incomplete { .. } => (None, None),
        }
    }
}

/// The Aggregator combines criterion scores using registry weights.
pub struct Aggregator<'r> {
    registry: &'r Registry,
}

impl<'r> Aggregator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Aggregate the scores in `criteria`.
    pub fn aggregate(&self, criteria: &CriterionStates) -> AggregateOutcome {
        let missing: Vec<CriterionId> = criteria
            .iter()
            .filter(|(_, state)| !state.is_scored())
            .map(|(id, _)| id)
            .collect();

        if !missing.is_empty() {
            debug!(missing = ?missing, "Aggregate incomplete");
            return AggregateOutcome::Incomplete { missing };
        }

        let sum: f64 = criteria
            .iter()
            .filter_map(|(id, state)| {
                state
                    .score()
                    .map(|score| f64::from(score) * self.registry.entry(id).weight)
            })
            .sum();

        let value = round_metric(sum);
        let profile = self.registry.profile_table().classify(value).label;

        debug!(total = value, profile = %profile, "Aggregate computed");

        AggregateOutcome::Complete(RiskTotal { value, profile })
    }
}
