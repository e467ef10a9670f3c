//! Requirement Determination Engine
//!
//! Answers "what evidence is needed to underwrite this case?" from the
//! sum-assured slab, the applicant's age band, disclosures and the
//! sum-assured / income ratio. KYC and bureau checks are always required.

use std::sync::Arc;

use crate::audit::{Actor, AuditAction, AuditRecord};
use crate::evidence::{AlcoholStatus, SmokingStatus};
use crate::requirement::{Requirement, RequirementCategory, RequirementId, RequirementSet};
use crate::risk_case::RiskCase;
use crate::rules::RuleBook;

const COMPONENT: &str = "RequirementEngine";

/// Disclosures that trigger additional medical tests, in evaluation order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disclosure {
    Diabetes,
    Smoking,
    HeavyAlcohol,
    Hypertension,
}

impl Disclosure {
    pub fn name(&self) -> &'static str {
        match self {
            Disclosure::Diabetes => "diabetes",
            Disclosure::Smoking => "smoking",
            Disclosure::HeavyAlcohol => "heavy_alcohol",
            Disclosure::Hypertension => "hypertension",
        }
    }

    /// Disclosures present on a case
    pub fn scan(case: &RiskCase) -> Vec<Disclosure> {
        let mut found = Vec::new();
        if case.medical().diabetes.is_disclosed() {
            found.push(Disclosure::Diabetes);
        }
        if case.lifestyle().smoking.status == SmokingStatus::Current {
            found.push(Disclosure::Smoking);
        }
        if case.lifestyle().alcohol.status == AlcoholStatus::Heavy {
            found.push(Disclosure::HeavyAlcohol);
        }
        if case.medical().history.mentions("hypertension") {
            found.push(Disclosure::Hypertension);
        }
        found
    }
}

/// Accumulates requirements with per-case sequential ids and set-union
/// semantics keyed by `(category, type)`
struct Collector {
    base: usize,
    set: RequirementSet,
}

impl Collector {
    fn new(base: usize) -> Self {
        Self {
            base,
            set: RequirementSet::default(),
        }
    }

    fn add(
        &mut self,
        category: RequirementCategory,
        requirement_type: &str,
        description: &str,
        triggered_by: &str,
    ) -> bool {
        if self.set.contains(category, requirement_type) {
            return false;
        }
        let id = RequirementId::sequence(self.base + self.set.total_count() + 1);
        self.set.push(Requirement::new(
            id,
            category,
            requirement_type,
            description,
            triggered_by,
        ));
        true
    }
}

/// Determines the evidence required for a case
#[derive(Debug, Clone)]
pub struct RequirementEngine {
    rules: Arc<RuleBook>,
}

impl RequirementEngine {
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self { rules }
    }

    /// Determines requirements and appends them to the case
    ///
    /// Each requirement is added through [`RiskCase::add_requirement`],
    /// followed by one `REQUIREMENTS_DETERMINED` summary entry. A case
    /// without a proposal yields an empty set and is left untouched.
    #[tracing::instrument(skip_all, fields(case_id = %case.id()))]
    pub fn determine(&self, case: &mut RiskCase) -> RequirementSet {
        let Some(proposal) = case.proposal() else {
            tracing::warn!("no proposal on case, requirements not determined");
            return RequirementSet::default();
        };
        let sum_assured = proposal.sum_assured;
        let age = case.age();
        let rules = self.rules.requirements();
        let mut collector = Collector::new(case.requirements().len());

        // 1. Sum-assured slab
        match sum_assured.whole_units() {
            Some(units) => match rules.sum_assured_grid.find(units) {
                Some(slab) => {
                    let triggered_by = format!("SA_SLAB_{}", slab.label());
                    tracing::debug!(slab = %slab.label(), "sum assured slab selected");
                    for test in &slab.value {
                        collector.add(
                            RequirementCategory::Medical,
                            test,
                            "Required for SA slab",
                            &triggered_by,
                        );
                    }
                }
                None => tracing::warn!(units, "sum assured outside every slab"),
            },
            None => tracing::warn!(sum_assured = %sum_assured, "negative sum assured, slab skipped"),
        }

        // 2. Age modifiers
        match age {
            Some(age) => {
                if let Some(band) = rules.age_modifiers.find(u64::from(age)) {
                    let triggered_by = format!("AGE_BAND_{}", band.label());
                    let description = format!("Required for age {age}");
                    for test in &band.value {
                        collector.add(
                            RequirementCategory::Medical,
                            test,
                            &description,
                            &triggered_by,
                        );
                    }
                } else {
                    tracing::debug!(age, "age outside every modifier band");
                }
            }
            None => tracing::debug!("no applicant age, age modifiers skipped"),
        }

        // 3. Disclosure triggers
        for disclosure in Disclosure::scan(case) {
            let tests = match disclosure {
                Disclosure::Diabetes => &rules.disclosure_tests.diabetes,
                Disclosure::Smoking => &rules.disclosure_tests.smoking,
                Disclosure::HeavyAlcohol => &rules.disclosure_tests.heavy_alcohol,
                Disclosure::Hypertension => &rules.disclosure_tests.hypertension,
            };
            let description = format!("Triggered by {} disclosure", disclosure.name());
            let triggered_by = format!("DISCLOSURE_{}", disclosure.name().to_uppercase());
            for test in tests {
                collector.add(
                    RequirementCategory::Medical,
                    test,
                    &description,
                    &triggered_by,
                );
            }
        }

        // 4. Financial documents
        let ratio = case
            .financial()
            .income
            .positive_declared()
            .and_then(|income| sum_assured.ratio_to(&income).ok());
        match ratio.and_then(|r| rules.income_ratio.find(r).map(|band| (r, band))) {
            Some((ratio, band)) => {
                let description = format!("Required for SA/Income ratio {ratio:.1}x");
                let triggered_by = format!("INCOME_RATIO_{}", band.label());
                for doc in &band.value {
                    collector.add(
                        RequirementCategory::Financial,
                        doc,
                        &description,
                        &triggered_by,
                    );
                }
            }
            None => {
                tracing::debug!("no usable declared income, default financial documents");
                for doc in &rules.default_financial {
                    collector.add(
                        RequirementCategory::Financial,
                        doc,
                        "Standard requirement",
                        "DEFAULT",
                    );
                }
            }
        }

        // 5. KYC and bureau checks
        for doc in &rules.kyc {
            collector.add(RequirementCategory::Kyc, doc, "Mandatory KYC", "MANDATORY_KYC");
        }
        for check in &rules.third_party {
            collector.add(
                RequirementCategory::ThirdParty,
                check,
                "Bureau check",
                "MANDATORY_BUREAU",
            );
        }

        let set = collector.set;
        for requirement in set.iter() {
            case.add_requirement(requirement.clone(), COMPONENT);
        }
        case.log_audit(
            AuditRecord::new(AuditAction::RequirementsDetermined, Actor::System, COMPONENT)
                .new_value(set.total_count().to_string())
                .reason(format!(
                    "SA={}, Age={}",
                    sum_assured,
                    age.map(|a| a.to_string()).unwrap_or_else(|| "N/A".to_string())
                )),
        );

        tracing::info!(
            total = set.total_count(),
            medical = set.medical.len(),
            financial = set.financial.len(),
            "requirements determined"
        );
        set
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evidence::{EvidenceMetadata, EvidenceSource, EvidenceValue, IdentityEvidence};
    use crate::risk_case::{EvidenceUpdate, ProposalContext};
    use chrono::{NaiveDate, Utc};
    use core_kernel::{Currency, Money};
    use rust_decimal_macros::dec;

    fn engine() -> RequirementEngine {
        RequirementEngine::new(Arc::new(RuleBook::standard().unwrap()))
    }

    fn case_with(sum_assured: rust_decimal::Decimal, age: Option<u32>) -> RiskCase {
        let mut case = RiskCase::new();
        let date = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        case.record_evidence(
            EvidenceUpdate::Proposal(ProposalContext::term_life(
                Money::new(sum_assured, Currency::INR),
                date,
            )),
            Actor::System,
            "Test",
            "proposal",
        );
        if let Some(age) = age {
            let meta = EvidenceMetadata::new(EvidenceSource::ProposalForm, "PF-1", Utc::now());
            case.record_evidence(
                EvidenceUpdate::Identity(
                    IdentityEvidence::new(EvidenceValue::attested_with("A".to_string(), meta))
                        .with_age(age),
                ),
                Actor::System,
                "Test",
                "identity",
            );
        }
        case
    }

    #[test]
    fn test_missing_proposal_yields_empty_set_without_audit() {
        let mut case = RiskCase::new();
        let set = engine().determine(&mut case);
        assert!(set.is_empty());
        assert!(case.audit_trail().is_empty());
    }

    #[test]
    fn test_slab_upper_bound_is_inclusive() {
        let mut case = case_with(dec!(2500000), Some(30));
        let set = engine().determine(&mut case);
        assert_eq!(set.types(RequirementCategory::Medical), vec!["Basic_Proposal"]);
        assert_eq!(set.medical[0].triggered_by, "SA_SLAB_0_2500000");
    }

    #[test]
    fn test_age_modifier_does_not_duplicate_slab_tests() {
        let mut case = case_with(dec!(15000000), Some(50));
        let set = engine().determine(&mut case);
        let medical = set.types(RequirementCategory::Medical);
        assert_eq!(medical.iter().filter(|t| **t == "ECG").count(), 1);
        assert_eq!(medical.iter().filter(|t| **t == "HbA1c").count(), 1);
    }

    #[test]
    fn test_missing_identity_skips_age_modifiers() {
        let mut case = case_with(dec!(1000000), None);
        let set = engine().determine(&mut case);
        assert_eq!(set.types(RequirementCategory::Medical), vec!["Basic_Proposal"]);
        assert_eq!(set.kyc.len(), 3);
    }

    #[test]
    fn test_ids_are_sequential_per_case() {
        let mut case = case_with(dec!(1000000), Some(30));
        let set = engine().determine(&mut case);
        let ids: Vec<String> = set.iter().map(|r| r.id.to_string()).collect();
        assert_eq!(ids.first().map(String::as_str), Some("REQ-0001"));
        assert_eq!(ids.last().map(String::as_str), Some("REQ-0008"));
    }

    #[test]
    fn test_one_audit_entry_per_requirement_plus_summary() {
        let mut case = case_with(dec!(1000000), Some(30));
        let before = case.audit_trail().len();
        let set = engine().determine(&mut case);
        assert_eq!(case.audit_trail().len(), before + set.total_count() + 1);
        let last = case.audit_trail().last().unwrap();
        assert_eq!(last.action, AuditAction::RequirementsDetermined);
        assert_eq!(last.new_value, Some(set.total_count().to_string()));
    }
}
