//! Trend criteria: percentage change from the prior period.

use crate::bands::BandTable;
use crate::types::{CriterionState, ZeroPolicy};

use super::{classify_metric, percentage};

/// `((current - prior) / prior) * 100`, rounded to two decimals.
///
/// A zero prior value has no meaningful base; only 0 → 0 is defined, and
/// only when the zero policy allows it.
pub fn trend_metric(
    prior: Option<f64>,
    current: Option<f64>,
    zero_policy: ZeroPolicy,
) -> Option<f64> {
    let (prior, current) = (prior?, current?);
    percentage(current - prior, prior, current == 0.0, zero_policy)
}

pub fn derive(
    prior: Option<f64>,
    current: Option<f64>,
    zero_policy: ZeroPolicy,
    table: &BandTable,
) -> CriterionState {
    CriterionState::Trend {
        prior,
        current,
        derived: classify_metric(trend_metric(prior, current, zero_policy), table),
    }
}
