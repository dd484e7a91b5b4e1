//! Recalculation controller.
//!
//! Reacts to raw-input replacement on an [`AssessmentRecord`]:
//!
//! ```text
//! Idle → DeriveCriterion(C) → UpdateState(C) → [Aggregate if score(C) moved] → Idle
//! ```
//!
//! Only the touched criterion is re-derived. The aggregate is recomputed
//! whenever that criterion's score changes value or flips between absent and
//! present. Records are never mutated; every call returns a new snapshot.

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::debug;

use crate::aggregate::{AggregateOutcome, Aggregator};
use crate::criteria::derive_criterion;
use crate::registry::Registry;
use crate::types::{AssessmentRecord, CriterionId, CriterionStates, RawInput};
use crate::validation::ValidationError;
use crate::EvaluationError;

/// Steps the controller passed through for one mutation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "phase", content = "criterion", rename_all = "snake_case")]
pub enum RecalcPhase {
    DeriveCriterion(CriterionId),
    UpdateState(CriterionId),
    Aggregate,
    Idle,
}

/// A new record snapshot plus what it took to produce it.
#[derive(Debug, Clone, PartialEq)]
pub struct Recalculation {
    pub record: AssessmentRecord,
    pub phases: Vec<RecalcPhase>,
    /// Whether any criterion's score changed
    pub score_changed: bool,
}

impl Recalculation {
    pub fn aggregated(&self) -> bool {
        self.phases.contains(&RecalcPhase::Aggregate)
    }
}

/// Drives per-criterion derivation and aggregation for one registry.
pub struct Recalculator<'r> {
    registry: &'r Registry,
}

impl<'r> Recalculator<'r> {
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// Replace one criterion's raw input and re-derive what depends on it.
    pub fn apply(
        &self,
        record: &AssessmentRecord,
        criterion: CriterionId,
        raw: &RawInput,
    ) -> Result<Recalculation, ValidationError> {
        let mut phases = vec![RecalcPhase::DeriveCriterion(criterion)];
        let state = derive_criterion(self.registry.entry(criterion), raw)?;

        let previous = record.criteria.get(criterion).score();
        let score_changed = previous != state.score();

        phases.push(RecalcPhase::UpdateState(criterion));
        let mut next = record.clone();
        next.criteria = record.criteria.with(criterion, state);

        if score_changed {
            phases.push(RecalcPhase::Aggregate);
            (next.total_risk_value, next.risk_profile) =
                self.aggregate(&next.criteria).into_fields();
        }
        phases.push(RecalcPhase::Idle);

        debug!(
            criterion = %criterion,
            previous = ?previous,
            score = ?next.criteria.get(criterion).score(),
            aggregated = score_changed,
            "Criterion recalculated"
        );

        Ok(Recalculation {
            record: next,
            phases,
            score_changed,
        })
    }

    /// Set a criterion's raw inputs back to absent.
    pub fn clear(
        &self,
        record: &AssessmentRecord,
        criterion: CriterionId,
    ) -> Result<Recalculation, ValidationError> {
        self.apply(record, criterion, &RawInput::empty(criterion.kind()))
    }

    /// Re-derive every criterion from the raw inputs stored in `record`,
    /// then aggregate. Idempotent for unchanged raw inputs.
    pub fn recalculate(&self, record: &AssessmentRecord) -> Result<Recalculation, ValidationError> {
        let mut phases = Vec::with_capacity(CriterionId::ALL.len() * 2 + 2);
        let mut criteria = CriterionStates::empty();
        let mut score_changed = false;

        for (id, current) in record.criteria.iter() {
            phases.push(RecalcPhase::DeriveCriterion(id));
            let state = derive_criterion(self.registry.entry(id), &current.raw())?;
            score_changed |= state.score() != current.score();
            phases.push(RecalcPhase::UpdateState(id));
            criteria = criteria.with(id, state);
        }

        phases.push(RecalcPhase::Aggregate);
        let mut next = record.clone();
        (next.total_risk_value, next.risk_profile) = self.aggregate(&criteria).into_fields();
        next.criteria = criteria;
        phases.push(RecalcPhase::Idle);

        Ok(Recalculation {
            record: next,
            phases,
            score_changed,
        })
    }

    /// Aggregate on explicit request, naming any criteria still missing
    /// inputs instead of producing a partial total.
    ///
    /// Derived values stored in `record` are not trusted; every criterion is
    /// re-derived from its raw inputs first.
    pub fn force_total(
        &self,
        record: &AssessmentRecord,
    ) -> Result<AggregateOutcome, ValidationError> {
        let fresh = self.recalculate(record)?.record;
        Ok(self.aggregate(&fresh.criteria))
    }

    /// Verify `record` is exactly what its raw inputs derive to, then stamp
    /// it for handing to the record store.
    pub fn prepare_save(
        &self,
        record: &AssessmentRecord,
        editor: &str,
        at: DateTime<Utc>,
    ) -> Result<AssessmentRecord, EvaluationError> {
        let fresh = self.recalculate(record)?.record;

        if let Some((id, _)) = fresh
            .criteria
            .iter()
            .find(|(id, state)| *state != record.criteria.get(*id))
        {
            return Err(EvaluationError::Inconsistent(id.to_string()));
        }
        if fresh.total_risk_value != record.total_risk_value {
            return Err(EvaluationError::Inconsistent("total_risk_value".to_string()));
        }
        if fresh.risk_profile != record.risk_profile {
            return Err(EvaluationError::Inconsistent("risk_profile".to_string()));
        }

        let mut saved = fresh;
        saved.audit.updated_by = Some(editor.to_string());
        saved.audit.updated_at = Some(at);
        Ok(saved)
    }

    fn aggregate(&self, criteria: &CriterionStates) -> AggregateOutcome {
        Aggregator::new(self.registry).aggregate(criteria)
    }
}
