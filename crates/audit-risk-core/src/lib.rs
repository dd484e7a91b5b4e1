//! # audit-risk-core
//!
//! Deterministic risk-assessment engine for audits of overseas trade
//! representative offices.
//!
//! Each office is scored against eight criteria. Raw figures entered by an
//! auditor are turned into a metric, classified into a category band, and
//! the band scores are summed into a total risk value and a risk profile.
//!
//! ## Key Guarantees
//!
//! 1. **Deterministic**: Same raw inputs and policy always produce the same record
//! 2. **Isolated**: A criterion reads only its own raw inputs
//! 3. **Strict totals**: No total exists until all eight criteria are scored
//! 4. **Validated policy**: Band tables are checked once, when the registry is built
//!
//! ## Example
//!
//! ```rust,ignore
//! use audit_risk_core::{evaluate, RawAssessment, Registry};
//!
//! let registry = Registry::from_policy_file("policy/sample-policy.yaml")?;
//! let raw: RawAssessment = serde_yaml::from_str(&input)?;
//! let record = evaluate(&registry, &raw)?;
//!
//! match record.total_risk_value {
//!     Some(total) => println!("{}: {} ({})", record.subject_id, total, record.risk_profile.unwrap()),
//!     None => println!("missing: {:?}", record.missing_criteria()),
//! }
//! ```

pub mod aggregate;
pub mod bands;
pub mod criteria;
pub mod policy;
pub mod recalc;
pub mod registry;
pub mod types;
pub mod validation;

// Re-export main types at crate root
pub use aggregate::{AggregateOutcome, Aggregator, RiskTotal};
pub use bands::{Band, BandTable, BandTableError, Choice, ChoiceTable, ScoreRange};
pub use criteria::{derive_criterion, round_metric};
pub use policy::{CriterionPolicy, PolicyError, ProfilePolicy, RiskPolicy};
pub use recalc::{RecalcPhase, Recalculation, Recalculator};
pub use registry::{CriterionSpec, CriterionTable, Registry, RegistryEntry, CRITERIA};
pub use types::{
    AssessmentRecord, AuditMetadata, Classification, CriterionId, CriterionState,
    CriterionStates, Derived, FormulaKind, Polarity, RawAssessment, RawInput, ZeroPolicy,
};
pub use validation::ValidationError;

use thiserror::Error;
use tracing::info;

/// Errors that can occur during evaluation
#[derive(Error, Debug)]
pub enum EvaluationError {
    #[error("Policy error: {0}")]
    Policy(#[from] PolicyError),

    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// A stored derived value does not match its raw inputs.
    #[error("Record is inconsistent with its raw inputs: {0}")]
    Inconsistent(String),
}

/// Evaluate a full raw-input snapshot into an assessment record.
///
/// Criteria absent from `raw.inputs` stay unscored, which leaves the total
/// absent. The first rejected raw input aborts the evaluation.
pub fn evaluate(
    registry: &Registry,
    raw: &RawAssessment,
) -> Result<AssessmentRecord, EvaluationError> {
    let mut record = AssessmentRecord::new(
        raw.subject_id.as_str(),
        raw.period.as_str(),
        raw.created_by.as_str(),
        raw.created_at,
    )?;
    record.notes = raw.notes.clone();

    for entry in registry.entries() {
        let input = raw
            .inputs
            .get(&entry.id())
            .cloned()
            .unwrap_or_else(|| RawInput::empty(entry.kind()));
        let state = derive_criterion(entry, &input)?;
        record.criteria = record.criteria.with(entry.id(), state);
    }

    (record.total_risk_value, record.risk_profile) =
        Aggregator::new(registry).aggregate(&record.criteria).into_fields();

    info!(
        subject = %record.subject_id,
        period = %record.period,
        total = ?record.total_risk_value,
        profile = ?record.risk_profile,
        "Assessment evaluated"
    );

    Ok(record)
}
