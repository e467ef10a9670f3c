//! Requirement Determination Tests
//!
//! Exercises the sum-assured grid, age modifiers, disclosure triggers,
//! financial documents and requirement satisfaction through cases built by
//! the intake adapter.

use domain_underwriting::evidence::AlcoholStatus;
use domain_underwriting::{
    AuditAction, RequirementCategory, RequirementEngine, RequirementId, RequirementSet,
    RequirementStatus, RiskCase, UnderwritingError,
};
use rust_decimal_macros::dec;
use test_utils::{assert_requirements_unique, standard_rules, IntakeFixtures, RiskCaseBuilder};

fn determine(case: &mut RiskCase) -> RequirementSet {
    RequirementEngine::new(standard_rules()).determine(case)
}

// ============= REFERENCE PROFILES =============
mod reference_profiles {
    use super::*;

    #[test]
    fn test_healthy_applicant_at_fifteen_million() {
        let mut case = RiskCaseBuilder::from_intake(IntakeFixtures::healthy_applicant()).build();
        let set = determine(&mut case);

        assert_eq!(
            set.types(RequirementCategory::Medical),
            vec!["Full_Medical", "ECG", "Lipid_Profile", "LFT", "KFT", "HIV", "HbA1c"]
        );
        assert_eq!(set.medical[0].triggered_by, "SA_SLAB_10000001_25000000");
        assert_eq!(set.types(RequirementCategory::Financial), vec!["Income_Declaration"]);
        assert_eq!(set.financial[0].triggered_by, "INCOME_RATIO_0_10");
        assert_eq!(set.kyc.len(), 3);
        assert_eq!(set.third_party.len(), 2);
        assert_eq!(set.total_count(), 13);
        assert_requirements_unique(&set);
    }

    #[test]
    fn test_multi_condition_applicant_unions_disclosure_tests() {
        let mut case =
            RiskCaseBuilder::from_intake(IntakeFixtures::multi_condition_applicant()).build();
        let set = determine(&mut case);
        let medical = set.types(RequirementCategory::Medical);

        for test in ["FBS", "PPBS", "Urine_ACR", "Fundoscopy", "Cotinine_Test", "2D_Echo"] {
            assert!(medical.contains(&test), "missing {test}");
        }
        assert_eq!(medical.len(), 13);
        assert_requirements_unique(&set);

        assert_eq!(
            set.types(RequirementCategory::Financial),
            vec!["Income_Declaration", "ITR_1year"]
        );
        assert_eq!(set.financial[0].description, "Required for SA/Income ratio 12.5x");
    }

    #[test]
    fn test_disclosure_triggered_requirements_name_their_trigger() {
        let mut case =
            RiskCaseBuilder::from_intake(IntakeFixtures::multi_condition_applicant()).build();
        let set = determine(&mut case);
        let cotinine = set
            .category(RequirementCategory::Medical)
            .iter()
            .find(|r| r.requirement_type == "Cotinine_Test")
            .unwrap();
        assert_eq!(cotinine.triggered_by, "DISCLOSURE_SMOKING");
        assert_eq!(cotinine.description, "Triggered by smoking disclosure");
    }
}

// ============= SUM ASSURED GRID =============
mod sum_assured_grid {
    use super::*;

    fn medical_for(sum_assured: rust_decimal::Decimal) -> Vec<String> {
        let mut case = RiskCaseBuilder::new()
            .with_age(30)
            .with_sum_assured(sum_assured)
            .build();
        determine(&mut case)
            .types(RequirementCategory::Medical)
            .into_iter()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_slab_boundaries() {
        assert_eq!(medical_for(dec!(2500000)), vec!["Basic_Proposal"]);
        assert_eq!(medical_for(dec!(2500001)), vec!["Basic_Proposal", "PPBS", "HIV"]);
        assert_eq!(medical_for(dec!(10000000)).len(), 5);
        assert_eq!(medical_for(dec!(10000001)).len(), 7);
    }

    #[test]
    fn test_fractional_sum_assured_is_floored() {
        assert_eq!(medical_for(dec!(2500000.75)), vec!["Basic_Proposal"]);
    }

    #[test]
    fn test_open_ended_slab_adds_specialist_opinion() {
        let mut case = RiskCaseBuilder::new()
            .with_age(30)
            .with_sum_assured(dec!(150000000))
            .build();
        let set = determine(&mut case);
        assert!(set.contains(RequirementCategory::Medical, "Specialist_Opinion"));
        assert_eq!(set.medical[0].triggered_by, "SA_SLAB_100000001_inf");
    }
}

// ============= AGE AND DISCLOSURE =============
mod age_and_disclosure {
    use super::*;

    #[test]
    fn test_age_band_adds_tests() {
        let mut case = RiskCaseBuilder::new().with_age(58).build();
        let set = determine(&mut case);
        for test in ["ECG", "TMT", "Lipid_Profile", "HbA1c", "PSA_if_male"] {
            assert!(set.contains(RequirementCategory::Medical, test), "missing {test}");
        }
        let ecg = set
            .category(RequirementCategory::Medical)
            .iter()
            .find(|r| r.requirement_type == "ECG")
            .unwrap();
        assert_eq!(ecg.triggered_by, "AGE_BAND_56_60");
        assert_eq!(ecg.description, "Required for age 58");
    }

    #[test]
    fn test_heavy_alcohol_triggers_liver_screen() {
        let mut case = RiskCaseBuilder::new()
            .with_age(30)
            .with_alcohol(AlcoholStatus::Heavy)
            .build();
        let set = determine(&mut case);
        for test in ["GGT", "MCV", "Liver_Screen"] {
            assert!(set.contains(RequirementCategory::Medical, test), "missing {test}");
        }
    }

    #[test]
    fn test_missing_age_skips_age_modifiers() {
        let mut case = RiskCaseBuilder::new().build();
        let set = determine(&mut case);
        assert_eq!(set.types(RequirementCategory::Medical), vec!["Basic_Proposal"]);
    }
}

// ============= FINANCIAL =============
mod financial {
    use super::*;

    #[test]
    fn test_missing_income_uses_default_documents() {
        let mut case = RiskCaseBuilder::new().with_age(30).build();
        let set = determine(&mut case);
        assert_eq!(
            set.types(RequirementCategory::Financial),
            vec!["Income_Declaration", "PAN_Verification"]
        );
        assert!(set.financial.iter().all(|r| r.triggered_by == "DEFAULT"));
        assert!(set.contains(RequirementCategory::Kyc, "PAN_Verification"));
    }

    #[test]
    fn test_zero_income_uses_default_documents() {
        let mut case = RiskCaseBuilder::new().with_age(30).with_income(dec!(0)).build();
        let set = determine(&mut case);
        assert_eq!(set.financial[0].triggered_by, "DEFAULT");
    }

    #[test]
    fn test_ratio_band_boundaries() {
        let cases = [
            (dec!(100000), "INCOME_RATIO_10_15"),
            (dec!(66667), "INCOME_RATIO_10_15"),
            (dec!(50000), "INCOME_RATIO_20_25"),
            (dec!(40000), "INCOME_RATIO_25_inf"),
        ];
        for (income, expected) in cases {
            let mut case = RiskCaseBuilder::new().with_age(30).with_income(income).build();
            let set = determine(&mut case);
            assert_eq!(set.financial[0].triggered_by, expected, "income {income}");
        }
    }

    #[test]
    fn test_very_high_ratio_requires_special_approval() {
        let mut case = RiskCaseBuilder::new()
            .with_age(30)
            .with_sum_assured(dec!(30000000))
            .with_income(dec!(1000000))
            .build();
        let set = determine(&mut case);
        assert_eq!(
            set.types(RequirementCategory::Financial),
            vec!["ITR_3years", "Networth_Statement", "Special_Approval"]
        );
    }
}

// ============= LIFECYCLE =============
mod lifecycle {
    use super::*;

    #[test]
    fn test_requirements_are_stored_on_the_case() {
        let mut case = RiskCaseBuilder::new().with_age(30).build();
        let set = determine(&mut case);
        assert_eq!(case.requirements().len(), set.total_count());
        assert_eq!(case.pending_requirements().count(), set.total_count());
        assert_eq!(
            case.audit_trail()
                .with_action(&AuditAction::RequirementAdded)
                .count(),
            set.total_count()
        );
        let summary = case.audit_trail().last().unwrap();
        assert_eq!(summary.action, AuditAction::RequirementsDetermined);
        assert_eq!(summary.reason, "SA=₹ 1000000.00, Age=30");
    }

    #[test]
    fn test_second_determination_continues_numbering() {
        let mut case = RiskCaseBuilder::new().with_age(30).build();
        let first = determine(&mut case);
        let second = determine(&mut case);
        assert_eq!(first.total_count(), 8);
        assert_eq!(second.medical[0].id.as_str(), "REQ-0009");
    }

    #[test]
    fn test_satisfy_requirement() {
        let mut case = RiskCaseBuilder::new().with_age(30).build();
        determine(&mut case);
        let id = RequirementId::sequence(1);

        case.satisfy_requirement(&id, "LAB-REPORT-7").unwrap();

        let requirement = &case.requirements()[0];
        assert_eq!(requirement.status, RequirementStatus::Received);
        assert_eq!(requirement.document_ref.as_deref(), Some("LAB-REPORT-7"));
        assert!(requirement.received_at.is_some());
        assert_eq!(case.pending_requirements().count(), 7);

        let entry = case.audit_trail().last().unwrap();
        assert_eq!(entry.action, AuditAction::RequirementSatisfied);
        assert_eq!(entry.old_value.as_deref(), Some("PENDING"));
        assert_eq!(entry.new_value.as_deref(), Some("RECEIVED"));
        assert_eq!(entry.evidence_refs, vec!["LAB-REPORT-7".to_string()]);
    }

    #[test]
    fn test_satisfying_twice_fails() {
        let mut case = RiskCaseBuilder::new().with_age(30).build();
        determine(&mut case);
        let id = RequirementId::sequence(2);
        case.satisfy_requirement(&id, "DOC-1").unwrap();

        let result = case.satisfy_requirement(&id, "DOC-2");
        assert!(matches!(result, Err(UnderwritingError::RequirementNotPending { .. })));
    }

    #[test]
    fn test_unknown_requirement_fails() {
        let mut case = RiskCaseBuilder::new().with_age(30).build();
        determine(&mut case);
        let result = case.satisfy_requirement(&RequirementId::sequence(99), "DOC-1");
        assert!(matches!(result, Err(UnderwritingError::RequirementNotFound(_))));
    }
}
