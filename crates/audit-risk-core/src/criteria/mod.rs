//! Metric calculators.
//!
//! One pure derivation per formula kind:
//! - [`ratio`]: `(numerator / denominator) * 100`
//! - [`trend`]: `((current - prior) / prior) * 100`
//! - [`lookup`]: enumerated choice, no metric
//!
//! ## Null and zero handling
//!
//! An absent raw field yields an absent metric. A zero denominator (or zero
//! prior value) yields an absent metric unless the other value is zero too,
//! in which case the criterion's [`ZeroPolicy`] decides. Metrics are rounded
//! to two decimals before classification so band boundaries behave the same
//! regardless of floating-point noise.

pub mod lookup;
pub mod ratio;
pub mod trend;

use tracing::debug;

use crate::bands::BandTable;
use crate::registry::{CriterionTable, RegistryEntry};
use crate::types::{CriterionState, Derived, RawInput, ZeroPolicy};
use crate::validation::{validate_raw_input, ValidationError};

/// Round to two decimals, folding `-0.0` into `0.0`.
pub fn round_metric(value: f64) -> f64 {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded == 0.0 {
        0.0
    } else {
        rounded
    }
}

/// `part / whole * 100`, rounded, under the zero-division rules.
///
/// `both_zero` tells whether the 0/0 case applies.
pub(crate) fn percentage(
    part: f64,
    whole: f64,
    both_zero: bool,
    zero_policy: ZeroPolicy,
) -> Option<f64> {
    if whole == 0.0 {
        return match (both_zero, zero_policy) {
            (true, ZeroPolicy::Zero) => Some(0.0),
            _ => None,
        };
    }

    let metric = round_metric(part / whole * 100.0);
    metric.is_finite().then_some(metric)
}

/// Classify a metric into a full derivation, or nothing if it is absent.
pub(crate) fn classify_metric(metric: Option<f64>, table: &BandTable) -> Option<Derived> {
    metric.map(|metric| {
        let classification = table.classify(metric);
        Derived {
            metric,
            label: classification.label,
            score: classification.score,
        }
    })
}

/// Validate a raw input and derive the criterion's state from it.
///
/// Reads nothing but `raw` and the criterion's own registry entry.
pub fn derive_criterion(
    entry: &RegistryEntry,
    raw: &RawInput,
) -> Result<CriterionState, ValidationError> {
    validate_raw_input(entry, raw)?;

    let state = match (raw, &entry.table) {
        (
            RawInput::Ratio {
                numerator,
                denominator,
            },
            CriterionTable::Bands(table),
        ) => ratio::derive(*numerator, *denominator, entry.zero_policy, table),
        (RawInput::Trend { prior, current }, CriterionTable::Bands(table)) => {
            trend::derive(*prior, *current, entry.zero_policy, table)
        }
        (RawInput::Lookup { choice }, CriterionTable::Choices(table)) => {
            lookup::derive(choice.as_deref(), table)
        }
        // Registry construction pairs every kind with its table shape.
        _ => CriterionState::empty(entry.kind()),
    };

    debug!(
        criterion = %entry.id(),
        metric = ?state.metric(),
        label = ?state.label(),
        score = ?state.score(),
        "Criterion derived"
    );

    Ok(state)
}
