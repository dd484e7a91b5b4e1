//! Direct-lookup criteria: an enumerated choice classified as-is.

use crate::bands::ChoiceTable;
use crate::types::CriterionState;

/// Classify a choice. The choice must already have passed boundary
/// validation; an absent choice stays unclassified.
pub fn derive(choice: Option<&str>, table: &ChoiceTable) -> CriterionState {
    CriterionState::Lookup {
        choice: choice.map(str::to_string),
        classification: choice.and_then(|c| table.classify(c)),
    }
}
