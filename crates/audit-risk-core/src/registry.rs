//! Criterion registry.
//!
//! Static metadata (formula kind, raw fields, built-in zero policy) is
//! compiled in. Everything that is audit policy (bands, choices, weights,
//! profile bands) comes from a [`RiskPolicy`] and is checked here, once,
//! before any record is scored.

use tracing::info;

use crate::bands::{BandTable, ChoiceTable, ScoreRange};
use crate::policy::{CriterionPolicy, PolicyError, RiskPolicy};
use crate::types::{CriterionId, FormulaKind, Polarity, ZeroPolicy};

/// Compiled-in description of one criterion.
#[derive(Debug)]
pub struct CriterionSpec {
    pub id: CriterionId,
    pub kind: FormulaKind,
    /// Raw-input field names, in form order
    pub fields: &'static [&'static str],
    /// 0/0 convention unless the policy overrides it (numeric kinds only)
    pub zero_policy: Option<ZeroPolicy>,
    pub description: &'static str,
}

const RATIO_FIELDS: &[&str] = &["numerator", "denominator"];
const TREND_FIELDS: &[&str] = &["prior", "current"];
const LOOKUP_FIELDS: &[&str] = &["choice"];

/// Registry-ordered criterion metadata.
pub static CRITERIA: [CriterionSpec; 8] = [
    CriterionSpec {
        id: CriterionId::BudgetExecution,
        kind: FormulaKind::Ratio,
        fields: RATIO_FIELDS,
        zero_policy: Some(ZeroPolicy::Absent),
        description: "Realized budget as a share of the allocated budget",
    },
    CriterionSpec {
        id: CriterionId::MissedTargets,
        kind: FormulaKind::Ratio,
        fields: RATIO_FIELDS,
        zero_policy: Some(ZeroPolicy::Zero),
        description: "Missed performance targets as a share of all targets",
    },
    CriterionSpec {
        id: CriterionId::RecommendationFollowUp,
        kind: FormulaKind::Ratio,
        fields: RATIO_FIELDS,
        zero_policy: Some(ZeroPolicy::Absent),
        description: "Closed audit recommendations as a share of those issued",
    },
    CriterionSpec {
        id: CriterionId::StaffVacancy,
        kind: FormulaKind::Ratio,
        fields: RATIO_FIELDS,
        zero_policy: Some(ZeroPolicy::Zero),
        description: "Vacant positions as a share of authorized positions",
    },
    CriterionSpec {
        id: CriterionId::ExportValueTrend,
        kind: FormulaKind::TrendDelta,
        fields: TREND_FIELDS,
        zero_policy: Some(ZeroPolicy::Zero),
        description: "Change in facilitated export value against the prior period",
    },
    CriterionSpec {
        id: CriterionId::TradeInquiryTrend,
        kind: FormulaKind::TrendDelta,
        fields: TREND_FIELDS,
        zero_policy: Some(ZeroPolicy::Absent),
        description: "Change in handled buyer inquiries against the prior period",
    },
    CriterionSpec {
        id: CriterionId::AuditOutcome,
        kind: FormulaKind::DirectLookup,
        fields: LOOKUP_FIELDS,
        zero_policy: None,
        description: "Outcome status of the most recent audit",
    },
    CriterionSpec {
        id: CriterionId::TradeAgreementStatus,
        kind: FormulaKind::DirectLookup,
        fields: LOOKUP_FIELDS,
        zero_policy: None,
        description: "Status of the trade agreement with the host country",
    },
];

impl CriterionId {
    pub fn spec(&self) -> &'static CriterionSpec {
        &CRITERIA[self.index()]
    }

    pub fn kind(&self) -> FormulaKind {
        self.spec().kind
    }
}

/// Classification table attached to a criterion.
#[derive(Debug, Clone, PartialEq)]
pub enum CriterionTable {
    Bands(BandTable),
    Choices(ChoiceTable),
}

/// A criterion's metadata joined with its validated policy.
#[derive(Debug, Clone)]
pub struct RegistryEntry {
    pub spec: &'static CriterionSpec,
    pub weight: f64,
    pub zero_policy: ZeroPolicy,
    pub table: CriterionTable,
}

impl RegistryEntry {
    pub fn id(&self) -> CriterionId {
        self.spec.id
    }

    pub fn kind(&self) -> FormulaKind {
        self.spec.kind
    }
}

/// Immutable, fully validated criterion registry.
#[derive(Debug, Clone)]
pub struct Registry {
    policy_version: String,
    policy_name: String,
    score_range: ScoreRange,
    entries: Vec<RegistryEntry>,
    profile: BandTable,
}

impl Registry {
    /// Build a registry, rejecting any policy that is not well-formed.
    pub fn from_policy(policy: &RiskPolicy) -> Result<Self, PolicyError> {
        let range = policy.score_range;
        if range.min > range.max {
            return Err(PolicyError::InvalidScoreRange {
                min: range.min,
                max: range.max,
            });
        }

        let entries = CRITERIA
            .iter()
            .map(|spec| {
                let entry = policy
                    .criterion(spec.id)
                    .ok_or(PolicyError::MissingCriterion(spec.id))?;
                build_entry(spec, entry, range)
            })
            .collect::<Result<Vec<_>, _>>()?;

        let profile = BandTable::new(
            Polarity::HigherIsRiskier,
            policy.profile.bands.clone(),
            ScoreRange { min: 0, max: u8::MAX },
        )
        .map_err(|source| PolicyError::BandTable {
            scope: "profile".to_string(),
            source,
        })?;

        info!(
            policy = %policy.name,
            version = %policy.policy_version,
            "Risk registry built"
        );

        Ok(Self {
            policy_version: policy.policy_version.clone(),
            policy_name: policy.name.clone(),
            score_range: range,
            entries,
            profile,
        })
    }

    /// Load and validate a policy file in one step.
    pub fn from_policy_file(path: impl AsRef<std::path::Path>) -> Result<Self, PolicyError> {
        Self::from_policy(&RiskPolicy::from_file(path)?)
    }

    pub fn entry(&self, id: CriterionId) -> &RegistryEntry {
        &self.entries[id.index()]
    }

    /// Entries in registry order.
    pub fn entries(&self) -> &[RegistryEntry] {
        &self.entries
    }

    pub fn profile_table(&self) -> &BandTable {
        &self.profile
    }

    pub fn score_range(&self) -> ScoreRange {
        self.score_range
    }

    pub fn policy_version(&self) -> &str {
        &self.policy_version
    }

    pub fn policy_name(&self) -> &str {
        &self.policy_name
    }
}

fn build_entry(
    spec: &'static CriterionSpec,
    policy: &CriterionPolicy,
    range: ScoreRange,
) -> Result<RegistryEntry, PolicyError> {
    let weight = policy.weight.unwrap_or(1.0);
    if !weight.is_finite() || weight < 0.0 {
        return Err(PolicyError::InvalidWeight {
            criterion: spec.id,
            weight,
        });
    }

    let shape_error = |reason| PolicyError::TableShape {
        criterion: spec.id,
        kind: spec.kind,
        reason,
    };
    let table_error = |source| PolicyError::BandTable {
        scope: spec.id.to_string(),
        source,
    };

    let table = match spec.kind {
        FormulaKind::Ratio | FormulaKind::TrendDelta => {
            if policy.choices.is_some() {
                return Err(shape_error("must not declare choices"));
            }
            let polarity = policy.polarity.ok_or_else(|| shape_error("needs a polarity"))?;
            let bands = policy.bands.clone().ok_or_else(|| shape_error("needs bands"))?;
            CriterionTable::Bands(BandTable::new(polarity, bands, range).map_err(table_error)?)
        }
        FormulaKind::DirectLookup => {
            if policy.bands.is_some() || policy.polarity.is_some() {
                return Err(shape_error("must not declare bands or polarity"));
            }
            if policy.zero_policy.is_some() {
                return Err(shape_error("has no zero policy"));
            }
            let choices = policy.choices.clone().ok_or_else(|| shape_error("needs choices"))?;
            CriterionTable::Choices(ChoiceTable::new(choices, range).map_err(table_error)?)
        }
    };

    let zero_policy = policy
        .zero_policy
        .or(spec.zero_policy)
        .unwrap_or(ZeroPolicy::Absent);

    Ok(RegistryEntry {
        spec,
        weight,
        zero_policy,
        table,
    })
}
