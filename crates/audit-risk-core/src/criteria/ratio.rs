//! Ratio criteria: a part expressed as a percentage of a whole.

use crate::bands::BandTable;
use crate::types::{CriterionState, ZeroPolicy};

use super::{classify_metric, percentage};

/// `(numerator / denominator) * 100`, rounded to two decimals.
pub fn ratio_metric(
    numerator: Option<f64>,
    denominator: Option<f64>,
    zero_policy: ZeroPolicy,
) -> Option<f64> {
    let (numerator, denominator) = (numerator?, denominator?);
    percentage(numerator, denominator, numerator == 0.0, zero_policy)
}

pub fn derive(
    numerator: Option<f64>,
    denominator: Option<f64>,
    zero_policy: ZeroPolicy,
    table: &BandTable,
) -> CriterionState {
    CriterionState::Ratio {
        numerator,
        denominator,
        derived: classify_metric(ratio_metric(numerator, denominator, zero_policy), table),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bands::{Band, ScoreRange};
    use crate::types::Polarity;

    fn execution_bands() -> BandTable {
        let band = |lower, upper, label: &str, score| Band {
            lower,
            upper,
            label: label.to_string(),
            score,
        };
        BandTable::new(
            Polarity::LowerIsRiskier,
            vec![
                band(None, Some(70.0), "poor", 5),
                band(Some(70.0), Some(90.0), "fair", 3),
                band(Some(90.0), None, "good", 1),
            ],
            ScoreRange { min: 1, max: 5 },
        )
        .unwrap()
    }

    #[test]
    fn test_large_amounts() {
        let metric = ratio_metric(Some(15_000_000_000.0), Some(20_000_000_000.0), ZeroPolicy::Absent);
        assert_eq!(metric, Some(75.0));
    }

    #[test]
    fn test_missing_field_propagates() {
        assert_eq!(ratio_metric(None, Some(10.0), ZeroPolicy::Zero), None);
        assert_eq!(ratio_metric(Some(10.0), None, ZeroPolicy::Zero), None);
    }

    #[test]
    fn test_zero_over_zero_follows_policy() {
        assert_eq!(ratio_metric(Some(0.0), Some(0.0), ZeroPolicy::Zero), Some(0.0));
        assert_eq!(ratio_metric(Some(0.0), Some(0.0), ZeroPolicy::Absent), None);
    }

    #[test]
    fn test_nonzero_over_zero_is_absent() {
        assert_eq!(ratio_metric(Some(4.0), Some(0.0), ZeroPolicy::Zero), None);
    }

    #[test]
    fn test_derive_keeps_raw_and_classifies() {
        let state = derive(Some(15e9), Some(20e9), ZeroPolicy::Absent, &execution_bands());
        match state {
            CriterionState::Ratio {
                numerator,
                derived: Some(derived),
                ..
            } => {
                assert_eq!(numerator, Some(15e9));
                assert_eq!(derived.metric, 75.0);
                assert_eq!(derived.label, "fair");
                assert_eq!(derived.score, 3);
            }
            other => panic!("unexpected state {:?}", other),
        }
    }

    #[test]
    fn test_derive_absent_metric_leaves_nothing_derived() {
        let state = derive(Some(1.0), None, ZeroPolicy::Zero, &execution_bands());
        assert_eq!(state.metric(), None);
        assert_eq!(state.label(), None);
        assert_eq!(state.score(), None);
    }
}
