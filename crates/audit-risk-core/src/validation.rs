//! Boundary validation of raw inputs.
//!
//! Everything here runs before a calculator sees a value. Absent fields are
//! always acceptable (that is ordinary in-progress data entry); present
//! fields must be well-typed and in range.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;
use tracing::warn;

use crate::registry::{CriterionTable, RegistryEntry};
use crate::types::{CriterionId, FormulaKind, RawInput};

lazy_static! {
    /// Evaluation periods are calendar years.
    pub static ref PERIOD_PATTERN: Regex = Regex::new(r"^\d{4}$").unwrap();

    /// Subject identifiers: anything non-blank without surrounding whitespace.
    pub static ref SUBJECT_PATTERN: Regex = Regex::new(r"^\S(.*\S)?$").unwrap();
}

/// A raw input rejected at the boundary.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("{criterion}: expected {expected} input, got {found}")]
    KindMismatch {
        criterion: CriterionId,
        expected: FormulaKind,
        found: FormulaKind,
    },

    #[error("{field}: value {value} is not a finite number")]
    NotFinite { field: String, value: f64 },

    #[error("{field}: value {value} must not be negative")]
    Negative { field: String, value: f64 },

    #[error("{field}: '{choice}' is not one of the declared choices")]
    UnknownChoice { field: String, choice: String },

    #[error("period: '{0}' is not a four-digit year")]
    InvalidPeriod(String),

    #[error("subject_id: '{0}' is blank or padded with whitespace")]
    InvalidSubject(String),
}

impl ValidationError {
    /// Path of the offending field, e.g. `budget_execution.denominator`.
    pub fn field(&self) -> String {
        match self {
            ValidationError::KindMismatch { criterion, .. } => criterion.to_string(),
            ValidationError::NotFinite { field, .. }
            | ValidationError::Negative { field, .. }
            | ValidationError::UnknownChoice { field, .. } => field.clone(),
            ValidationError::InvalidPeriod(_) => "period".to_string(),
            ValidationError::InvalidSubject(_) => "subject_id".to_string(),
        }
    }
}

/// Check an evaluation period string.
pub fn validate_period(period: &str) -> Result<(), ValidationError> {
    if PERIOD_PATTERN.is_match(period) {
        Ok(())
    } else {
        Err(ValidationError::InvalidPeriod(period.to_string()))
    }
}

/// Check a subject identifier.
pub fn validate_subject(subject_id: &str) -> Result<(), ValidationError> {
    if SUBJECT_PATTERN.is_match(subject_id) {
        Ok(())
    } else {
        Err(ValidationError::InvalidSubject(subject_id.to_string()))
    }
}

/// Check a raw input against its registry entry.
pub fn validate_raw_input(entry: &RegistryEntry, raw: &RawInput) -> Result<(), ValidationError> {
    let result = check_raw_input(entry, raw);
    if let Err(err) = &result {
        warn!(criterion = %entry.id(), field = %err.field(), error = %err, "Raw input rejected");
    }
    result
}

fn check_raw_input(entry: &RegistryEntry, raw: &RawInput) -> Result<(), ValidationError> {
    let criterion = entry.id();
    if raw.kind() != entry.kind() {
        return Err(ValidationError::KindMismatch {
            criterion,
            expected: entry.kind(),
            found: raw.kind(),
        });
    }

    let amounts = match raw {
        RawInput::Ratio {
            numerator,
            denominator,
        } => [*numerator, *denominator],
        RawInput::Trend { prior, current } => [*prior, *current],
        RawInput::Lookup { choice: None } => return Ok(()),
        RawInput::Lookup {
            choice: Some(choice),
        } => {
            return match &entry.table {
                CriterionTable::Choices(table) if table.contains(choice) => Ok(()),
                _ => Err(ValidationError::UnknownChoice {
                    field: field_path(entry, 0),
                    choice: choice.clone(),
                }),
            };
        }
    };

    amounts
        .into_iter()
        .enumerate()
        .try_for_each(|(position, value)| check_amount(field_path(entry, position), value))
}

/// `criterion.field` for the raw field at `position` in the registry's form order.
fn field_path(entry: &RegistryEntry, position: usize) -> String {
    match entry.spec.fields.get(position) {
        Some(name) => format!("{}.{}", entry.id(), name),
        None => entry.id().to_string(),
    }
}

fn check_amount(field: String, value: Option<f64>) -> Result<(), ValidationError> {
    let Some(value) = value else {
        return Ok(());
    };

    if !value.is_finite() {
        return Err(ValidationError::NotFinite { field, value });
    }
    if value < 0.0 {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(())
}
