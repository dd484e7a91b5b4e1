//! End-to-end scoring scenarios against the sample policy.

use std::collections::BTreeMap;

use audit_risk_core::{
    evaluate, AggregateOutcome, AssessmentRecord, CriterionId, EvaluationError, RawAssessment,
    RawInput, Recalculator, Registry, RiskPolicy, ValidationError,
};
use chrono::{TimeZone, Utc};

const SAMPLE_POLICY: &str = include_str!("../../../policy/sample-policy.yaml");
const SAMPLE_ASSESSMENT: &str = include_str!("../../../demos/sample-assessment.yaml");

fn registry() -> Registry {
    Registry::from_policy(&RiskPolicy::from_yaml(SAMPLE_POLICY).unwrap()).unwrap()
}

fn assessment(inputs: BTreeMap<CriterionId, RawInput>) -> RawAssessment {
    RawAssessment {
        subject_id: "itpc-santiago".to_string(),
        period: "2025".to_string(),
        notes: None,
        created_by: "auditor".to_string(),
        created_at: Utc.with_ymd_and_hms(2026, 1, 20, 10, 0, 0).unwrap(),
        inputs,
    }
}

fn single(id: CriterionId, raw: RawInput) -> BTreeMap<CriterionId, RawInput> {
    BTreeMap::from([(id, raw)])
}

fn complete_inputs() -> BTreeMap<CriterionId, RawInput> {
    BTreeMap::from([
        (CriterionId::BudgetExecution, RawInput::ratio(90.0, 100.0)),
        (CriterionId::MissedTargets, RawInput::ratio(1.0, 10.0)),
        (CriterionId::RecommendationFollowUp, RawInput::ratio(5.0, 10.0)),
        (CriterionId::StaffVacancy, RawInput::ratio(0.0, 12.0)),
        (CriterionId::ExportValueTrend, RawInput::trend(100.0, 97.0)),
        (CriterionId::TradeInquiryTrend, RawInput::trend(100.0, 130.0)),
        (CriterionId::AuditOutcome, RawInput::lookup("moderate_findings")),
        (CriterionId::TradeAgreementStatus, RawInput::lookup("partial_in_force")),
    ])
}

#[test]
fn export_trend_growth() {
    let record = evaluate(
        &registry(),
        &assessment(single(
            CriterionId::ExportValueTrend,
            RawInput::trend(85.50, 90.20),
        )),
    )
    .unwrap();

    let state = &record.criteria.export_value_trend;
    assert_eq!(state.metric(), Some(5.5));
    assert_eq!(state.label(), Some("growth"));
    assert_eq!(state.score(), Some(2));
}

#[test]
fn budget_with_nothing_allocated_is_absent() {
    let record = evaluate(
        &registry(),
        &assessment(single(CriterionId::BudgetExecution, RawInput::ratio(0.0, 0.0))),
    )
    .unwrap();

    let state = &record.criteria.budget_execution;
    assert_eq!(state.metric(), None);
    assert_eq!(state.label(), None);
    assert_eq!(state.score(), None);
    assert_eq!(record.total_risk_value, None);
}

#[test]
fn budget_execution_fair() {
    let record = evaluate(
        &registry(),
        &assessment(single(
            CriterionId::BudgetExecution,
            RawInput::ratio(15_000_000_000.0, 20_000_000_000.0),
        )),
    )
    .unwrap();

    let state = &record.criteria.budget_execution;
    assert_eq!(state.metric(), Some(75.0));
    assert_eq!(state.label(), Some("fair"));
    assert_eq!(state.score(), Some(3));
}

#[test]
fn unknown_audit_outcome_is_rejected() {
    let result = evaluate(
        &registry(),
        &assessment(single(
            CriterionId::AuditOutcome,
            RawInput::lookup("adverse_opinion"),
        )),
    );

    match result {
        Err(EvaluationError::Validation(err)) => {
            assert!(matches!(err, ValidationError::UnknownChoice { .. }));
            assert_eq!(err.field(), "audit_outcome.choice");
        }
        other => panic!("expected validation error, got {:?}", other),
    }
}

#[test]
fn total_appears_only_with_last_criterion() {
    let registry = registry();
    let raw: RawAssessment = serde_yaml::from_str(SAMPLE_ASSESSMENT).unwrap();
    let record = evaluate(&registry, &raw).unwrap();

    assert_eq!(record.total_risk_value, None);
    assert_eq!(record.risk_profile, None);
    assert_eq!(
        record.missing_criteria(),
        vec![CriterionId::TradeAgreementStatus]
    );

    let recalculator = Recalculator::new(&registry);
    match recalculator.force_total(&record).unwrap() {
        AggregateOutcome::Incomplete { missing } => {
            assert_eq!(missing, vec![CriterionId::TradeAgreementStatus])
        }
        other => panic!("expected incomplete outcome, got {:?}", other),
    }

    let result = recalculator
        .apply(
            &record,
            CriterionId::TradeAgreementStatus,
            &RawInput::lookup("signed_not_ratified"),
        )
        .unwrap();

    // 3 + 3 + 2 + 2 + 2 + 4 + 2 + 3
    assert_eq!(result.record.total_risk_value, Some(21.0));
    assert_eq!(result.record.risk_profile.as_deref(), Some("medium"));
    assert!(result.aggregated());
}

#[test]
fn clearing_any_criterion_withdraws_total() {
    let registry = registry();
    let recalculator = Recalculator::new(&registry);
    let record = evaluate(&registry, &assessment(complete_inputs())).unwrap();
    assert_eq!(record.total_risk_value, Some(19.0));
    assert_eq!(record.risk_profile.as_deref(), Some("medium"));

    for id in CriterionId::ALL {
        let cleared = recalculator.clear(&record, id).unwrap();
        assert!(cleared.aggregated(), "{} clear skipped aggregation", id);
        assert_eq!(cleared.record.total_risk_value, None, "{} left a total", id);
        assert_eq!(cleared.record.risk_profile, None, "{} left a profile", id);
        assert_eq!(cleared.record.missing_criteria(), vec![id]);

        let restored = recalculator
            .apply(&cleared.record, id, &record.criteria.get(id).raw())
            .unwrap();
        assert_eq!(restored.record, record, "{} not restored", id);
    }
}

#[test]
fn sample_assessment_scores() {
    let raw: RawAssessment = serde_yaml::from_str(SAMPLE_ASSESSMENT).unwrap();
    let record = evaluate(&registry(), &raw).unwrap();
    let c = &record.criteria;

    assert_eq!(c.missed_targets.metric(), Some(25.0));
    assert_eq!(c.missed_targets.label(), Some("moderate"));
    assert_eq!(c.recommendation_follow_up.metric(), Some(87.5));
    assert_eq!(c.staff_vacancy.metric(), Some(7.14));
    assert_eq!(c.trade_inquiry_trend.metric(), Some(-17.5));
    assert_eq!(c.trade_inquiry_trend.label(), Some("decline"));
    assert_eq!(c.audit_outcome.label(), Some("minor"));
    assert_eq!(record.notes.as_deref(), Some("Walkthrough input for the CLI."));
}

#[test]
fn boundary_values_belong_to_upper_band() {
    let registry = registry();
    let inputs = BTreeMap::from([
        (CriterionId::StaffVacancy, RawInput::ratio(5.0, 100.0)),
        (CriterionId::BudgetExecution, RawInput::ratio(95.0, 100.0)),
        (CriterionId::ExportValueTrend, RawInput::trend(100.0, 90.0)),
    ]);
    let record = evaluate(&registry, &assessment(inputs)).unwrap();

    assert_eq!(record.criteria.staff_vacancy.label(), Some("minor_gaps"));
    assert_eq!(record.criteria.budget_execution.label(), Some("excellent"));
    assert_eq!(record.criteria.export_value_trend.label(), Some("decline"));
}

#[test]
fn zero_policies_differ_per_criterion() {
    let registry = registry();
    let inputs = BTreeMap::from([
        (CriterionId::ExportValueTrend, RawInput::trend(0.0, 0.0)),
        (CriterionId::TradeInquiryTrend, RawInput::trend(0.0, 0.0)),
        (CriterionId::MissedTargets, RawInput::ratio(0.0, 0.0)),
        (CriterionId::StaffVacancy, RawInput::ratio(2.0, 0.0)),
    ]);
    let record = evaluate(&registry, &assessment(inputs)).unwrap();

    assert_eq!(record.criteria.export_value_trend.metric(), Some(0.0));
    assert_eq!(record.criteria.export_value_trend.label(), Some("stable"));
    assert_eq!(record.criteria.trade_inquiry_trend.metric(), None);
    assert_eq!(record.criteria.missed_targets.label(), Some("minimal"));
    assert_eq!(record.criteria.staff_vacancy.metric(), None);
}

#[test]
fn registry_loads_from_file() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../policy/sample-policy.yaml");
    let loaded = Registry::from_policy_file(path).unwrap();
    assert_eq!(loaded.policy_name(), registry().policy_name());
    assert_eq!(loaded.policy_version(), "0.1-draft");
}

#[test]
fn saved_record_round_trips_through_json() {
    let registry = registry();
    let raw: RawAssessment = serde_yaml::from_str(SAMPLE_ASSESSMENT).unwrap();
    let record = evaluate(&registry, &raw).unwrap();
    let at = Utc.with_ymd_and_hms(2026, 1, 6, 9, 0, 0).unwrap();

    let saved = Recalculator::new(&registry)
        .prepare_save(&record, "reviewer", at)
        .unwrap();
    let json = serde_json::to_string(&saved).unwrap();
    let reloaded: AssessmentRecord = serde_json::from_str(&json).unwrap();

    assert_eq!(saved, reloaded);
    assert_eq!(saved.audit.created_by, "bulk-generator");
}
