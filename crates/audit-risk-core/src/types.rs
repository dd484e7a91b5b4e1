//! Core data types for risk assessments.
//!
//! Raw inputs flow in as [`RawInput`] values, get derived into
//! [`CriterionState`] slots, and are held together with the aggregate in an
//! [`AssessmentRecord`]. Records are immutable snapshots: every engine
//! operation takes a record by reference and hands back a new one.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::{validate_period, validate_subject, ValidationError};

/// The eight independent risk criteria.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionId {
    BudgetExecution,
    MissedTargets,
    RecommendationFollowUp,
    StaffVacancy,
    ExportValueTrend,
    TradeInquiryTrend,
    AuditOutcome,
    TradeAgreementStatus,
}

impl CriterionId {
    /// All criteria in registry order.
    pub const ALL: [CriterionId; 8] = [
        CriterionId::BudgetExecution,
        CriterionId::MissedTargets,
        CriterionId::RecommendationFollowUp,
        CriterionId::StaffVacancy,
        CriterionId::ExportValueTrend,
        CriterionId::TradeInquiryTrend,
        CriterionId::AuditOutcome,
        CriterionId::TradeAgreementStatus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CriterionId::BudgetExecution => "budget_execution",
            CriterionId::MissedTargets => "missed_targets",
            CriterionId::RecommendationFollowUp => "recommendation_follow_up",
            CriterionId::StaffVacancy => "staff_vacancy",
            CriterionId::ExportValueTrend => "export_value_trend",
            CriterionId::TradeInquiryTrend => "trade_inquiry_trend",
            CriterionId::AuditOutcome => "audit_outcome",
            CriterionId::TradeAgreementStatus => "trade_agreement_status",
        }
    }

    /// Position of this criterion in [`CriterionId::ALL`].
    pub fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for CriterionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a criterion turns raw inputs into a classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormulaKind {
    /// `(numerator / denominator) * 100`
    Ratio,
    /// `((current - prior) / prior) * 100`
    TrendDelta,
    /// Enumerated choice classified directly, no metric.
    DirectLookup,
}

impl FormulaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormulaKind::Ratio => "ratio",
            FormulaKind::TrendDelta => "trend_delta",
            FormulaKind::DirectLookup => "direct_lookup",
        }
    }
}

impl fmt::Display for FormulaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction in which a metric becomes riskier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Polarity {
    HigherIsRiskier,
    LowerIsRiskier,
}

/// What a ratio/trend calculator yields when both values are exactly zero.
///
/// A zero denominator with a non-zero counterpart is always absent; this
/// policy only decides the 0/0 case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ZeroPolicy {
    /// 0/0 yields a metric of 0.
    Zero,
    /// 0/0 yields no metric.
    Absent,
}

/// Raw input for one criterion, as supplied by the editing form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RawInput {
    Ratio {
        #[serde(default)]
        numerator: Option<f64>,
        #[serde(default)]
        denominator: Option<f64>,
    },
    Trend {
        #[serde(default)]
        prior: Option<f64>,
        #[serde(default)]
        current: Option<f64>,
    },
    Lookup {
        #[serde(default)]
        choice: Option<String>,
    },
}

impl RawInput {
    /// An input with every field absent.
    pub fn empty(kind: FormulaKind) -> Self {
        match kind {
            FormulaKind::Ratio => RawInput::Ratio {
                numerator: None,
                denominator: None,
            },
            FormulaKind::TrendDelta => RawInput::Trend {
                prior: None,
                current: None,
            },
            FormulaKind::DirectLookup => RawInput::Lookup { choice: None },
        }
    }

    pub fn ratio(numerator: f64, denominator: f64) -> Self {
        RawInput::Ratio {
            numerator: Some(numerator),
            denominator: Some(denominator),
        }
    }

    pub fn trend(prior: f64, current: f64) -> Self {
        RawInput::Trend {
            prior: Some(prior),
            current: Some(current),
        }
    }

    pub fn lookup(choice: impl Into<String>) -> Self {
        RawInput::Lookup {
            choice: Some(choice.into()),
        }
    }

    pub fn kind(&self) -> FormulaKind {
        match self {
            RawInput::Ratio { .. } => FormulaKind::Ratio,
            RawInput::Trend { .. } => FormulaKind::TrendDelta,
            RawInput::Lookup { .. } => FormulaKind::DirectLookup,
        }
    }
}

/// Category label and score assigned by a band or choice table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub label: String,
    pub score: u8,
}

/// A derived metric together with its classification.
///
/// Metric, label and score only ever exist together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Derived {
    pub metric: f64,
    pub label: String,
    pub score: u8,
}

/// Per-criterion state: raw inputs plus whatever could be derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CriterionState {
    Ratio {
        numerator: Option<f64>,
        denominator: Option<f64>,
        derived: Option<Derived>,
    },
    Trend {
        prior: Option<f64>,
        current: Option<f64>,
        derived: Option<Derived>,
    },
    Lookup {
        choice: Option<String>,
        classification: Option<Classification>,
    },
}

impl CriterionState {
    /// A state with no raw inputs and nothing derived.
    pub fn empty(kind: FormulaKind) -> Self {
        match kind {
            FormulaKind::Ratio => CriterionState::Ratio {
                numerator: None,
                denominator: None,
                derived: None,
            },
            FormulaKind::TrendDelta => CriterionState::Trend {
                prior: None,
                current: None,
                derived: None,
            },
            FormulaKind::DirectLookup => CriterionState::Lookup {
                choice: None,
                classification: None,
            },
        }
    }

    pub fn kind(&self) -> FormulaKind {
        match self {
            CriterionState::Ratio { .. } => FormulaKind::Ratio,
            CriterionState::Trend { .. } => FormulaKind::TrendDelta,
            CriterionState::Lookup { .. } => FormulaKind::DirectLookup,
        }
    }

    /// The raw inputs this state was derived from.
    pub fn raw(&self) -> RawInput {
        match self {
            CriterionState::Ratio {
                numerator,
                denominator,
                ..
            } => RawInput::Ratio {
                numerator: *numerator,
                denominator: *denominator,
            },
            CriterionState::Trend { prior, current, .. } => RawInput::Trend {
                prior: *prior,
                current: *current,
            },
            CriterionState::Lookup { choice, .. } => RawInput::Lookup {
                choice: choice.clone(),
            },
        }
    }

    pub fn metric(&self) -> Option<f64> {
        match self {
            CriterionState::Ratio { derived, .. } | CriterionState::Trend { derived, .. } => {
                derived.as_ref().map(|d| d.metric)
            }
            CriterionState::Lookup { .. } => None,
        }
    }

    pub fn label(&self) -> Option<&str> {
        match self {
            CriterionState::Ratio { derived, .. } | CriterionState::Trend { derived, .. } => {
                derived.as_ref().map(|d| d.label.as_str())
            }
            CriterionState::Lookup { classification, .. } => {
                classification.as_ref().map(|c| c.label.as_str())
            }
        }
    }

    pub fn score(&self) -> Option<u8> {
        match self {
            CriterionState::Ratio { derived, .. } | CriterionState::Trend { derived, .. } => {
                derived.as_ref().map(|d| d.score)
            }
            CriterionState::Lookup { classification, .. } => {
                classification.as_ref().map(|c| c.score)
            }
        }
    }

    pub fn is_scored(&self) -> bool {
        self.score().is_some()
    }
}

/// One state slot per criterion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CriterionStates {
    pub budget_execution: CriterionState,
    pub missed_targets: CriterionState,
    pub recommendation_follow_up: CriterionState,
    pub staff_vacancy: CriterionState,
    pub export_value_trend: CriterionState,
    pub trade_inquiry_trend: CriterionState,
    pub audit_outcome: CriterionState,
    pub trade_agreement_status: CriterionState,
}

impl CriterionStates {
    /// Every slot empty, shaped by its criterion's formula kind.
    pub fn empty() -> Self {
        let slot = |id: CriterionId| CriterionState::empty(id.kind());
        Self {
            budget_execution: slot(CriterionId::BudgetExecution),
            missed_targets: slot(CriterionId::MissedTargets),
            recommendation_follow_up: slot(CriterionId::RecommendationFollowUp),
            staff_vacancy: slot(CriterionId::StaffVacancy),
            export_value_trend: slot(CriterionId::ExportValueTrend),
            trade_inquiry_trend: slot(CriterionId::TradeInquiryTrend),
            audit_outcome: slot(CriterionId::AuditOutcome),
            trade_agreement_status: slot(CriterionId::TradeAgreementStatus),
        }
    }

    pub fn get(&self, id: CriterionId) -> &CriterionState {
        match id {
            CriterionId::BudgetExecution => &self.budget_execution,
            CriterionId::MissedTargets => &self.missed_targets,
            CriterionId::RecommendationFollowUp => &self.recommendation_follow_up,
            CriterionId::StaffVacancy => &self.staff_vacancy,
            CriterionId::ExportValueTrend => &self.export_value_trend,
            CriterionId::TradeInquiryTrend => &self.trade_inquiry_trend,
            CriterionId::AuditOutcome => &self.audit_outcome,
            CriterionId::TradeAgreementStatus => &self.trade_agreement_status,
        }
    }

    /// Return a copy with one slot replaced.
    pub fn with(&self, id: CriterionId, state: CriterionState) -> Self {
        let mut next = self.clone();
        let slot = match id {
            CriterionId::BudgetExecution => &mut next.budget_execution,
            CriterionId::MissedTargets => &mut next.missed_targets,
            CriterionId::RecommendationFollowUp => &mut next.recommendation_follow_up,
            CriterionId::StaffVacancy => &mut next.staff_vacancy,
            CriterionId::ExportValueTrend => &mut next.export_value_trend,
            CriterionId::TradeInquiryTrend => &mut next.trade_inquiry_trend,
            CriterionId::AuditOutcome => &mut next.audit_outcome,
            CriterionId::TradeAgreementStatus => &mut next.trade_agreement_status,
        };
        *slot = state;
        next
    }

    /// Iterate slots in registry order.
    pub fn iter(&self) -> impl Iterator<Item = (CriterionId, &CriterionState)> + '_ {
        CriterionId::ALL.into_iter().map(move |id| (id, self.get(id)))
    }
}

impl Default for CriterionStates {
    fn default() -> Self {
        Self::empty()
    }
}

/// Who touched a record and when.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditMetadata {
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_by: Option<String>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// One assessment per (audit subject, evaluation period).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    pub subject_id: String,
    pub period: String,
    pub criteria: CriterionStates,
    pub total_risk_value: Option<f64>,
    pub risk_profile: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
    pub audit: AuditMetadata,
}

impl AssessmentRecord {
    /// A fresh record with every criterion empty and no total.
    pub fn new(
        subject_id: impl Into<String>,
        period: impl Into<String>,
        created_by: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let subject_id = subject_id.into();
        let period = period.into();
        validate_subject(&subject_id)?;
        validate_period(&period)?;

        Ok(Self {
            subject_id,
            period,
            criteria: CriterionStates::empty(),
            total_risk_value: None,
            risk_profile: None,
            notes: None,
            audit: AuditMetadata {
                created_by: created_by.into(),
                created_at,
                updated_by: None,
                updated_at: None,
            },
        })
    }

    /// Criteria whose score is still absent, in registry order.
    pub fn missing_criteria(&self) -> Vec<CriterionId> {
        self.criteria
            .iter()
            .filter(|(_, state)| !state.is_scored())
            .map(|(id, _)| id)
            .collect()
    }
}

/// A raw-input snapshot for a whole assessment.
///
/// Criteria missing from `inputs` are treated as having every field absent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawAssessment {
    pub subject_id: String,
    pub period: String,
    #[serde(default)]
    pub notes: Option<String>,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub inputs: BTreeMap<CriterionId, RawInput>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_criterion_order_matches_index() {
        for (i, id) in CriterionId::ALL.iter().enumerate() {
            assert_eq!(id.index(), i);
        }
    }

    #[test]
    fn test_empty_states_follow_kind() {
        let states = CriterionStates::empty();
        assert_eq!(states.budget_execution.kind(), FormulaKind::Ratio);
        assert_eq!(states.export_value_trend.kind(), FormulaKind::TrendDelta);
        assert_eq!(states.audit_outcome.kind(), FormulaKind::DirectLookup);
        assert!(states.iter().all(|(_, s)| !s.is_scored()));
    }

    #[test]
    fn test_with_replaces_only_one_slot() {
        let states = CriterionStates::empty();
        let scored = CriterionState::Lookup {
            choice: Some("no_findings".to_string()),
            classification: Some(Classification {
                label: "clean".to_string(),
                score: 1,
            }),
        };

        let next = states.with(CriterionId::AuditOutcome, scored.clone());

        assert_eq!(next.audit_outcome, scored);
        assert_eq!(next.budget_execution, states.budget_execution);
        assert!(!states.audit_outcome.is_scored());
    }

    #[test]
    fn test_state_exposes_raw_input() {
        let state = CriterionState::Trend {
            prior: Some(85.5),
            current: Some(90.2),
            derived: None,
        };
        assert_eq!(state.raw(), RawInput::trend(85.5, 90.2));
    }

    #[test]
    fn test_new_record_is_blank() {
        let record = AssessmentRecord::new("itpc-osaka", "2025", "auditor", Utc::now()).unwrap();
        assert_eq!(record.missing_criteria(), CriterionId::ALL.to_vec());
        assert_eq!(record.total_risk_value, None);
        assert!(record.audit.updated_by.is_none());
    }

    #[test]
    fn test_new_record_accepts_non_blank_subjects() {
        for subject in ["ITPC-Osaka", "550E8400-E29B-41D4-A716-446655440000", "42"] {
            let record = AssessmentRecord::new(subject, "2025", "auditor", Utc::now()).unwrap();
            assert_eq!(record.subject_id, subject);
        }
        assert_eq!(
            AssessmentRecord::new(" ", "2025", "auditor", Utc::now()).unwrap_err(),
            ValidationError::InvalidSubject(" ".to_string())
        );
    }

    #[test]
    fn test_new_record_checks_period() {
        let err = AssessmentRecord::new("itpc-osaka", "FY25", "auditor", Utc::now()).unwrap_err();
        assert_eq!(err, ValidationError::InvalidPeriod("FY25".to_string()));
    }

    #[test]
    fn test_state_serializes_with_kind_tag() {
        let json = serde_json::to_value(CriterionState::empty(FormulaKind::Ratio)).unwrap();
        assert_eq!(json["kind"], "ratio");
        assert!(json["derived"].is_null());
    }
}
