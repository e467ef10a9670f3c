//! End-to-End Pipeline Tests
//!
//! Runs the reference applicant profiles from intake to offer and checks
//! the decision, pricing, status and audit trail of each run.

use domain_underwriting::{
    Actor, Advisory, AdvisoryError, AdvisoryProvider, AdvisorySource, AuditAction, CaseIntake,
    CaseStatus, DecisionType, RiskCase, RiskClass, UnderwritingError, UnderwritingPipeline,
};
use rust_decimal_macros::dec;
use test_utils::{
    assert_amount, assert_audit_ordered, assert_every_adjustment_explained, standard_rules,
    IntakeFixtures, RiskCaseBuilder,
};

// ============================================================================
// TEST FIXTURES
// ============================================================================

fn pipeline() -> UnderwritingPipeline {
    UnderwritingPipeline::new(standard_rules())
}

/// Advisor standing in for a language-model service
struct ScriptedAdvisor {
    confidence: rust_decimal::Decimal,
}

impl AdvisoryProvider for ScriptedAdvisor {
    fn advise(&self, _case: &RiskCase) -> Result<Advisory, AdvisoryError> {
        Ok(Advisory {
            recommendation: "Accept at standard terms".to_string(),
            evidence_cited: vec!["BMI 22.1".to_string()],
            confidence: self.confidence,
            conflicts_detected: Vec::new(),
            suggested_actions: Vec::new(),
            medical_summary: "Unremarkable".to_string(),
            risk_narrative: "low_risk".to_string(),
            source: AdvisorySource::Llm,
        })
    }

    fn name(&self) -> &str {
        "ScriptedAdvisor"
    }
}

// ============================================================================
// SCENARIOS
// ============================================================================

mod scenarios {
    use super::*;

    #[test]
    fn test_healthy_applicant_is_approved_at_preferred() {
        let mut case = RiskCaseBuilder::from_intake(IntakeFixtures::healthy_applicant()).build();
        let outcome = pipeline().process(&mut case).unwrap();
        let offer = &outcome.offer;

        assert_eq!(offer.decision, DecisionType::Approve);
        assert_eq!(offer.risk_class, RiskClass::Preferred);
        assert_eq!(offer.total_loading_percent, 0);
        assert_eq!(offer.base_rate_per_thousand, dec!(2.50));
        assert!(!offer.fallback_rate_applied);
        assert_amount(&offer.base_premium_annual, dec!(37500));
        assert_amount(&offer.loaded_premium_annual, dec!(37500));
        assert!(offer.is_priced());

        assert_eq!(case.status(), CaseStatus::Approved);
        let basis = case.pricing_basis().unwrap();
        assert_eq!(basis.loaded_premium_annual, offer.loaded_premium_annual);
        assert_eq!(basis.risk_class, RiskClass::Preferred);
    }

    #[test]
    fn test_multi_condition_applicant_is_referred() {
        let mut case =
            RiskCaseBuilder::from_intake(IntakeFixtures::multi_condition_applicant()).build();
        let outcome = pipeline().process(&mut case).unwrap();
        let offer = &outcome.offer;

        let loadings: Vec<(&str, u32)> = offer
            .loadings
            .iter()
            .map(|l| (l.condition.as_str(), l.loading_percent))
            .collect();
        assert_eq!(
            loadings,
            vec![
                ("BMI_Obese", 50),
                ("Diabetes", 75),
                ("Hypertension", 50),
                ("Smoking", 100)
            ]
        );
        assert_eq!(offer.total_loading_percent, 275);
        assert_eq!(offer.risk_class, RiskClass::Substandard4);
        assert_eq!(offer.decision, DecisionType::Refer);
        assert!(offer.base_premium_annual.is_zero());
        assert!(offer.loaded_premium_annual.is_zero());
        assert!(offer.refer_reasons[0].contains("275%"));
        assert_every_adjustment_explained(&outcome.rating);

        assert_eq!(case.status(), CaseStatus::Referred);
        assert!(case.pricing_basis().is_none());
    }

    #[test]
    fn test_declined_applicant_ends_declined() {
        let mut case = RiskCaseBuilder::new().with_age(70).build();
        let outcome = pipeline().process(&mut case).unwrap();
        assert_eq!(outcome.offer.decision, DecisionType::Decline);
        assert_eq!(case.status(), CaseStatus::Declined);
        assert!(!outcome.offer.is_priced());
    }

    #[test]
    fn test_loaded_approval_prices_with_loading() {
        let mut case = RiskCaseBuilder::new()
            .with_age(45)
            .with_sum_assured(dec!(10000000))
            .with_current_smoking(dec!(5))
            .build();
        let outcome = pipeline().process(&mut case).unwrap();
        let offer = &outcome.offer;

        assert_eq!(offer.decision, DecisionType::ApproveWithLoading);
        assert_eq!(offer.base_rate_per_thousand, dec!(3.30));
        assert_amount(&offer.base_premium_annual, dec!(33000));
        assert_amount(&offer.loaded_premium_annual, dec!(57750));
        assert_eq!(case.status(), CaseStatus::Approved);
    }

    #[test]
    fn test_json_intake_runs_end_to_end() {
        let intake = CaseIntake::from_json_str(&IntakeFixtures::healthy_applicant_json()).unwrap();
        let mut case = intake.into_risk_case("DOC-JSON-1").unwrap();
        let outcome = pipeline().process(&mut case).unwrap();
        assert_eq!(outcome.offer.decision, DecisionType::Approve);
        assert_eq!(outcome.requirements.total_count(), 13);
    }
}

// ============================================================================
// AUDIT TRAIL
// ============================================================================

mod audit_trail {
    use super::*;

    #[test]
    fn test_audit_trail_records_every_stage_in_order() {
        let mut case = RiskCaseBuilder::from_intake(IntakeFixtures::healthy_applicant()).build();
        let outcome = pipeline().process(&mut case).unwrap();
        let trail = case.audit_trail();

        assert_audit_ordered(trail);
        assert_eq!(trail.entries()[0].action, AuditAction::RiskCaseCreated);

        let stages: Vec<&AuditAction> = trail
            .entries()
            .iter()
            .map(|e| &e.action)
            .filter(|a| {
                matches!(
                    a,
                    AuditAction::PipelineStarted
                        | AuditAction::RequirementsDetermined
                        | AuditAction::RatingCompleted
                        | AuditAction::AdvisoryFallback
                        | AuditAction::OfferConstructed
                        | AuditAction::PipelineCompleted
                )
            })
            .collect();
        assert_eq!(
            stages,
            vec![
                &AuditAction::PipelineStarted,
                &AuditAction::RequirementsDetermined,
                &AuditAction::RatingCompleted,
                &AuditAction::AdvisoryFallback,
                &AuditAction::OfferConstructed,
                &AuditAction::PipelineCompleted,
            ]
        );
        assert_eq!(
            trail.with_action(&AuditAction::RequirementAdded).count(),
            outcome.requirements.total_count()
        );

        let completed = trail.last().unwrap();
        assert_eq!(completed.new_value.as_deref(), Some("APPROVE"));
        assert_eq!(completed.reason, outcome.offer.reasoning);
    }

    #[test]
    fn test_status_changes_are_audited() {
        let mut case = RiskCaseBuilder::from_intake(IntakeFixtures::healthy_applicant()).build();
        pipeline().process(&mut case).unwrap();
        let changes: Vec<(Option<&str>, Option<&str>)> = case
            .audit_trail()
            .with_action(&AuditAction::StatusChanged)
            .map(|e| (e.old_value.as_deref(), e.new_value.as_deref()))
            .collect();
        assert_eq!(
            changes,
            vec![
                (Some("DRAFT"), Some("UNDER_REVIEW")),
                (Some("UNDER_REVIEW"), Some("APPROVED")),
            ]
        );
    }

    #[test]
    fn test_processed_case_cannot_be_processed_again() {
        let mut case = RiskCaseBuilder::from_intake(IntakeFixtures::healthy_applicant()).build();
        let pipeline = pipeline();
        pipeline.process(&mut case).unwrap();
        let before = case.audit_trail().len();

        let result = pipeline.process(&mut case);
        assert!(matches!(
            result,
            Err(UnderwritingError::InvalidStatusTransition { .. })
        ));
        assert_eq!(case.audit_trail().len(), before);
    }
}

// ============================================================================
// ADVISORY
// ============================================================================

mod advisory {
    use super::*;

    #[test]
    fn test_provider_advice_is_recorded_and_non_binding() {
        let pipeline = pipeline().with_advisor(Box::new(ScriptedAdvisor {
            confidence: dec!(0.9),
        }));
        let mut case =
            RiskCaseBuilder::from_intake(IntakeFixtures::multi_condition_applicant()).build();
        let outcome = pipeline.process(&mut case).unwrap();

        assert_eq!(outcome.offer.decision, DecisionType::Refer);
        assert!(outcome
            .offer
            .advisory_text
            .as_deref()
            .unwrap()
            .starts_with("Accept at standard terms"));

        let entry = case
            .audit_trail()
            .with_action(&AuditAction::AdvisoryReceived)
            .next()
            .unwrap();
        assert_eq!(entry.actor, Actor::Llm);
        assert_eq!(entry.component, "ScriptedAdvisor");
    }

    #[test]
    fn test_malformed_advice_falls_back() {
        let pipeline = pipeline().with_advisor(Box::new(ScriptedAdvisor {
            confidence: dec!(1.5),
        }));
        let mut case = RiskCaseBuilder::from_intake(IntakeFixtures::healthy_applicant()).build();
        let outcome = pipeline.process(&mut case).unwrap();

        assert_eq!(outcome.advisory.unwrap().source, AdvisorySource::Fallback);
        assert_eq!(
            case.audit_trail()
                .with_action(&AuditAction::AdvisoryReceived)
                .count(),
            0
        );
        assert_eq!(
            case.audit_trail()
                .with_action(&AuditAction::AdvisoryFallback)
                .count(),
            1
        );
    }
}
