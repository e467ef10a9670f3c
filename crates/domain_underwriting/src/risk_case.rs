//! Risk Case aggregate root
//!
//! The Risk Case holds everything known about one applicant interaction:
//! identity, proposal terms, evidence panels, derived metrics, underwriting
//! state, pricing basis and the audit trail.
//!
//! # Invariants
//!
//! - Every mutation appends exactly one [`AuditEntry`]
//! - `updated_at` changes only when an audit entry is appended
//! - Requirements are append-only; the only status change this crate makes
//!   is `PENDING -> RECEIVED`
//! - A case in a terminal status (`APPROVED`, `DECLINED`, `REFERRED`,
//!   `WITHDRAWN`) never changes status again

use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, Money, ProposalId};

use crate::audit::{Actor, AuditAction, AuditEntry, AuditRecord, AuditTrail};
use crate::error::UnderwritingError;
use crate::evidence::{
    attested_number, BmiCategory, CardiacEvidence, DiabetesEvidence, FinancialEvidence,
    IdentityEvidence, LifestyleEvidence, LiverPanel, LipidPanel, MedicalEvidence,
    MedicalHistory, RenalPanel, SmokingStatus, VitalsEvidence, AlcoholStatus,
};
use crate::rating::RiskClass;
use crate::requirement::{Requirement, RequirementId, RequirementStatus};

const COMPONENT: &str = "RiskCase";

/// Underwriting case status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CaseStatus {
    #[default]
    Draft,
    PendingRequirements,
    UnderReview,
    PendingMedical,
    StpEligible,
    ManualReview,
    DecisionReady,
    Approved,
    Declined,
    Referred,
    Withdrawn,
}

impl CaseStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            CaseStatus::Approved | CaseStatus::Declined | CaseStatus::Referred | CaseStatus::Withdrawn
        )
    }
}

impl fmt::Display for CaseStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            CaseStatus::Draft => "DRAFT",
            CaseStatus::PendingRequirements => "PENDING_REQUIREMENTS",
            CaseStatus::UnderReview => "UNDER_REVIEW",
            CaseStatus::PendingMedical => "PENDING_MEDICAL",
            CaseStatus::StpEligible => "STP_ELIGIBLE",
            CaseStatus::ManualReview => "MANUAL_REVIEW",
            CaseStatus::DecisionReady => "DECISION_READY",
            CaseStatus::Approved => "APPROVED",
            CaseStatus::Declined => "DECLINED",
            CaseStatus::Referred => "REFERRED",
            CaseStatus::Withdrawn => "WITHDRAWN",
        };
        f.write_str(s)
    }
}

/// Distribution channel of the proposal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Channel {
    #[default]
    Direct,
    Agent,
    Banca,
    Digital,
}

/// Proposal terms
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProposalContext {
    pub proposal_id: ProposalId,
    pub proposal_date: NaiveDate,
    pub product_code: String,
    pub product_name: String,
    pub sum_assured: Money,
    pub policy_term_years: u32,
    pub premium_term_years: u32,
    pub channel: Channel,
}

impl ProposalContext {
    /// A 20-year term life proposal for the given sum assured
    pub fn term_life(sum_assured: Money, proposal_date: NaiveDate) -> Self {
        Self {
            proposal_id: ProposalId::new(),
            proposal_date,
            product_code: "TERM_LIFE".to_string(),
            product_name: "Term Life Insurance".to_string(),
            sum_assured,
            policy_term_years: 20,
            premium_term_years: 20,
            channel: Channel::Direct,
        }
    }
}

/// Metrics calculated from evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DerivedMetrics {
    pub bmi: Option<Decimal>,
    pub bmi_category: BmiCategory,
    pub risk_flags: Vec<String>,
}

impl DerivedMetrics {
    /// Recomputes metrics from the current evidence
    pub fn compute(medical: &MedicalEvidence, lifestyle: &LifestyleEvidence) -> Self {
        let bmi = medical.vitals.effective_bmi();
        let bmi_category = bmi.map(BmiCategory::from_bmi).unwrap_or_default();

        let mut risk_flags = Vec::new();
        if matches!(bmi_category, BmiCategory::Obese | BmiCategory::SeverelyObese) {
            risk_flags.push("ELEVATED_BMI".to_string());
        }
        if medical.diabetes.is_disclosed() {
            risk_flags.push("DIABETES_DISCLOSED".to_string());
        }
        if attested_number(&medical.diabetes.hba1c).is_some_and(|v| v > Decimal::from(7)) {
            risk_flags.push("HBA1C_ABOVE_TARGET".to_string());
        }
        if medical.vitals.latest_bp().is_some_and(|r| r.systolic >= 140 || r.diastolic >= 90) {
            risk_flags.push("HYPERTENSIVE_READING".to_string());
        }
        if medical.cardiac.ecg_abnormal {
            risk_flags.push("ABNORMAL_ECG".to_string());
        }
        if lifestyle.smoking.status == SmokingStatus::Current {
            risk_flags.push("CURRENT_SMOKER".to_string());
        }
        if lifestyle.alcohol.status == AlcoholStatus::Heavy {
            risk_flags.push("HEAVY_ALCOHOL".to_string());
        }

        Self {
            bmi,
            bmi_category,
            risk_flags,
        }
    }
}

/// Current state of the underwriting process
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingState {
    pub status: CaseStatus,
    pub requirements: Vec<Requirement>,
    pub assigned_underwriter: Option<String>,
}

/// Pricing computed by the offer constructor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingBasis {
    pub base_rate_per_thousand: Decimal,
    pub base_premium_annual: Money,
    pub total_loading_percent: u32,
    pub loaded_premium_annual: Money,
    pub exclusions: Vec<String>,
    pub risk_class: RiskClass,
}

/// A replacement for one evidence panel
///
/// Each variant maps to exactly one audit field path, so evidence never has
/// to be addressed by a runtime field name.
#[derive(Debug, Clone, PartialEq)]
pub enum EvidenceUpdate {
    Identity(IdentityEvidence),
    Proposal(ProposalContext),
    Vitals(VitalsEvidence),
    Diabetes(DiabetesEvidence),
    Liver(LiverPanel),
    Renal(RenalPanel),
    Lipid(LipidPanel),
    Cardiac(CardiacEvidence),
    History(MedicalHistory),
    Lifestyle(LifestyleEvidence),
    Financial(FinancialEvidence),
}

impl EvidenceUpdate {
    /// Audit field path of the panel this update replaces
    pub fn field_path(&self) -> &'static str {
        match self {
            EvidenceUpdate::Identity(_) => "identity",
            EvidenceUpdate::Proposal(_) => "proposal",
            EvidenceUpdate::Vitals(_) => "medical.vitals",
            EvidenceUpdate::Diabetes(_) => "medical.diabetes",
            EvidenceUpdate::Liver(_) => "medical.liver",
            EvidenceUpdate::Renal(_) => "medical.renal",
            EvidenceUpdate::Lipid(_) => "medical.lipid",
            EvidenceUpdate::Cardiac(_) => "medical.cardiac",
            EvidenceUpdate::History(_) => "medical.history",
            EvidenceUpdate::Lifestyle(_) => "lifestyle",
            EvidenceUpdate::Financial(_) => "financial",
        }
    }

    /// Short description of the new panel content
    fn describe(&self) -> String {
        fn num(v: Option<Decimal>) -> String {
            v.map(|d| d.normalize().to_string()).unwrap_or_else(|| "-".to_string())
        }
        match self {
            EvidenceUpdate::Identity(i) => format!(
                "age={}",
                i.age.map(|a| a.to_string()).unwrap_or_else(|| "-".to_string())
            ),
            EvidenceUpdate::Proposal(p) => format!("sum_assured={}", p.sum_assured),
            EvidenceUpdate::Vitals(v) => {
                let bp = v
                    .latest_bp()
                    .map(|r| format!("{}/{}", r.systolic, r.diastolic))
                    .unwrap_or_else(|| "-".to_string());
                format!("bmi={} bp={}", num(v.effective_bmi()), bp)
            }
            EvidenceUpdate::Diabetes(d) => {
                format!("status={:?} hba1c={}", d.status, num(attested_number(&d.hba1c)))
            }
            EvidenceUpdate::Liver(l) => format!(
                "sgot={} sgpt={}",
                num(attested_number(&l.sgot)),
                num(attested_number(&l.sgpt))
            ),
            EvidenceUpdate::Renal(r) => format!(
                "creatinine={} urea={}",
                num(attested_number(&r.creatinine)),
                num(attested_number(&r.urea))
            ),
            EvidenceUpdate::Lipid(l) => format!(
                "ldl={} hdl={}",
                num(attested_number(&l.ldl)),
                num(attested_number(&l.hdl))
            ),
            EvidenceUpdate::Cardiac(c) => format!("ecg_abnormal={}", c.ecg_abnormal),
            EvidenceUpdate::History(h) => format!("conditions={}", h.conditions.len()),
            EvidenceUpdate::Lifestyle(l) => format!(
                "smoking={:?} alcohol={:?} occupation_class={}",
                l.smoking.status, l.alcohol.status, l.occupation.occupation_class
            ),
            EvidenceUpdate::Financial(f) => format!(
                "declared_income={}",
                f.income
                    .positive_declared()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "-".to_string())
            ),
        }
    }

    /// Source documents referenced by the attested values in this update
    fn document_refs(&self) -> Vec<String> {
        let mut refs: Vec<String> = match self {
            EvidenceUpdate::Identity(i) => [i.full_name.document_ref()]
                .into_iter()
                .chain(i.date_of_birth.as_ref().map(|v| v.document_ref()))
                .chain(i.pan.as_ref().map(|v| v.document_ref()))
                .flatten()
                .map(str::to_string)
                .collect(),
            EvidenceUpdate::Vitals(v) => [&v.height_cm, &v.weight_kg, &v.bmi]
                .into_iter()
                .flatten()
                .filter_map(|m| m.document_ref())
                .chain(
                    v.bp_readings
                        .iter()
                        .filter_map(|r| r.metadata.as_ref().map(|m| m.source_document_id.as_str())),
                )
                .map(str::to_string)
                .collect(),
            EvidenceUpdate::Diabetes(d) => [&d.hba1c, &d.fbs, &d.ppbs]
                .into_iter()
                .flatten()
                .filter_map(|m| m.document_ref())
                .map(str::to_string)
                .collect(),
            EvidenceUpdate::Liver(l) => [&l.sgot, &l.sgpt, &l.ggt]
                .into_iter()
                .flatten()
                .filter_map(|m| m.document_ref())
                .map(str::to_string)
                .collect(),
            EvidenceUpdate::Renal(r) => [&r.creatinine, &r.urea, &r.egfr]
                .into_iter()
                .flatten()
                .filter_map(|m| m.document_ref())
                .map(str::to_string)
                .collect(),
            EvidenceUpdate::Financial(f) => f
                .income
                .declared_annual
                .iter()
                .chain(&f.income.verified_annual)
                .filter_map(|v| v.document_ref())
                .map(str::to_string)
                .collect(),
            EvidenceUpdate::Proposal(_)
            | EvidenceUpdate::Lipid(_)
            | EvidenceUpdate::Cardiac(_)
            | EvidenceUpdate::History(_)
            | EvidenceUpdate::Lifestyle(_) => Vec::new(),
        };
        refs.sort();
        refs.dedup();
        refs
    }
}

/// The Risk Case aggregate root
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskCase {
    id: CaseId,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    identity: Option<IdentityEvidence>,
    proposal: Option<ProposalContext>,
    medical: MedicalEvidence,
    lifestyle: LifestyleEvidence,
    financial: FinancialEvidence,
    derived_metrics: DerivedMetrics,
    underwriting_state: UnderwritingState,
    pricing_basis: Option<PricingBasis>,
    audit_trail: AuditTrail,
}

impl Default for RiskCase {
    fn default() -> Self {
        Self::new()
    }
}

impl RiskCase {
    /// Creates an empty case in `DRAFT` with a fresh identifier
    pub fn new() -> Self {
        Self::with_id(CaseId::new())
    }

    pub fn with_id(id: CaseId) -> Self {
        let now = Utc::now();
        Self {
            id,
            created_at: now,
            updated_at: now,
            identity: None,
            proposal: None,
            medical: MedicalEvidence::default(),
            lifestyle: LifestyleEvidence::default(),
            financial: FinancialEvidence::default(),
            derived_metrics: DerivedMetrics::default(),
            underwriting_state: UnderwritingState::default(),
            pricing_basis: None,
            audit_trail: AuditTrail::new(),
        }
    }

    pub fn id(&self) -> CaseId {
        self.id
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn updated_at(&self) -> DateTime<Utc> {
        self.updated_at
    }

    pub fn identity(&self) -> Option<&IdentityEvidence> {
        self.identity.as_ref()
    }

    pub fn proposal(&self) -> Option<&ProposalContext> {
        self.proposal.as_ref()
    }

    pub fn medical(&self) -> &MedicalEvidence {
        &self.medical
    }

    pub fn lifestyle(&self) -> &LifestyleEvidence {
        &self.lifestyle
    }

    pub fn financial(&self) -> &FinancialEvidence {
        &self.financial
    }

    pub fn derived_metrics(&self) -> &DerivedMetrics {
        &self.derived_metrics
    }

    pub fn underwriting_state(&self) -> &UnderwritingState {
        &self.underwriting_state
    }

    pub fn status(&self) -> CaseStatus {
        self.underwriting_state.status
    }

    pub fn pricing_basis(&self) -> Option<&PricingBasis> {
        self.pricing_basis.as_ref()
    }

    pub fn audit_trail(&self) -> &AuditTrail {
        &self.audit_trail
    }

    /// Applicant age, when identity carries one
    pub fn age(&self) -> Option<u32> {
        self.identity.as_ref().and_then(|i| i.age)
    }

    /// All requirements in the order they were added
    pub fn requirements(&self) -> &[Requirement] {
        &self.underwriting_state.requirements
    }

    pub fn pending_requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.underwriting_state
            .requirements
            .iter()
            .filter(|r| r.is_pending())
    }

    /// Appends an audit entry and refreshes `updated_at`
    pub fn log_audit(&mut self, record: AuditRecord) -> &AuditEntry {
        let entry = self.audit_trail.append(record, Utc::now());
        self.updated_at = entry.timestamp;
        entry
    }

    /// Replaces one evidence panel
    pub fn record_evidence(
        &mut self,
        update: EvidenceUpdate,
        actor: Actor,
        component: &str,
        reason: impl Into<String>,
    ) {
        let record = AuditRecord::new(AuditAction::EvidenceRecorded, actor, component)
            .field(update.field_path())
            .new_value(update.describe())
            .evidence(update.document_refs())
            .reason(reason);

        match update {
            EvidenceUpdate::Identity(identity) => self.identity = Some(identity),
            EvidenceUpdate::Proposal(proposal) => self.proposal = Some(proposal),
            EvidenceUpdate::Vitals(vitals) => self.medical.vitals = vitals,
            EvidenceUpdate::Diabetes(diabetes) => self.medical.diabetes = diabetes,
            EvidenceUpdate::Liver(liver) => self.medical.liver = liver,
            EvidenceUpdate::Renal(renal) => self.medical.renal = renal,
            EvidenceUpdate::Lipid(lipid) => self.medical.lipid = lipid,
            EvidenceUpdate::Cardiac(cardiac) => self.medical.cardiac = cardiac,
            EvidenceUpdate::History(history) => self.medical.history = history,
            EvidenceUpdate::Lifestyle(lifestyle) => self.lifestyle = lifestyle,
            EvidenceUpdate::Financial(financial) => self.financial = financial,
        }
        self.log_audit(record);
    }

    /// Recomputes derived metrics from the current evidence
    pub fn refresh_derived_metrics(&mut self) {
        let metrics = DerivedMetrics::compute(&self.medical, &self.lifestyle);
        let record = AuditRecord::new(AuditAction::DerivedMetricsRefreshed, Actor::System, COMPONENT)
            .field("derived_metrics")
            .new_value(format!(
                "bmi_category={} flags=[{}]",
                metrics.bmi_category.label(),
                metrics.risk_flags.join(",")
            ));
        self.derived_metrics = metrics;
        self.log_audit(record);
    }

    /// Adds a requirement
    pub fn add_requirement(&mut self, requirement: Requirement, component: &str) {
        let record = AuditRecord::new(AuditAction::RequirementAdded, Actor::System, component)
            .field("pending_requirements")
            .new_value(format!("{} {}", requirement.id, requirement.requirement_type))
            .reason(requirement.triggered_by.clone());
        self.underwriting_state.requirements.push(requirement);
        self.log_audit(record);
    }

    /// Marks a pending requirement as received
    ///
    /// # Errors
    ///
    /// Returns an error if no requirement has this id, or if it is not
    /// `PENDING`.
    pub fn satisfy_requirement(
        &mut self,
        requirement_id: &RequirementId,
        document_ref: &str,
    ) -> Result<(), UnderwritingError> {
        let now = Utc::now();
        let requirement = self
            .underwriting_state
            .requirements
            .iter_mut()
            .find(|r| &r.id == requirement_id)
            .ok_or_else(|| UnderwritingError::RequirementNotFound(requirement_id.to_string()))?;

        if requirement.status != RequirementStatus::Pending {
            return Err(UnderwritingError::RequirementNotPending {
                id: requirement_id.to_string(),
                status: requirement.status.to_string(),
            });
        }

        requirement.status = RequirementStatus::Received;
        requirement.received_at = Some(now);
        requirement.document_ref = Some(document_ref.to_string());

        self.log_audit(
            AuditRecord::new(AuditAction::RequirementSatisfied, Actor::System, "EvidenceCollection")
                .field(format!("requirement.{requirement_id}.status"))
                .old_value(RequirementStatus::Pending.to_string())
                .new_value(RequirementStatus::Received.to_string())
                .evidence([document_ref.to_string()]),
        );
        Ok(())
    }

    /// Moves the case to a new status
    ///
    /// # Errors
    ///
    /// Returns [`UnderwritingError::InvalidStatusTransition`] if the case is
    /// already in a terminal status.
    pub fn transition_status(
        &mut self,
        to: CaseStatus,
        actor: Actor,
        component: &str,
        reason: impl Into<String>,
    ) -> Result<(), UnderwritingError> {
        let from = self.underwriting_state.status;
        if from.is_terminal() {
            return Err(UnderwritingError::InvalidStatusTransition { from, to });
        }
        self.underwriting_state.status = to;
        tracing::debug!(case_id = %self.id, %from, %to, "status changed");
        self.log_audit(
            AuditRecord::new(AuditAction::StatusChanged, actor, component)
                .field("underwriting_state.status")
                .old_value(from.to_string())
                .new_value(to.to_string())
                .reason(reason),
        );
        Ok(())
    }

    /// Stores the pricing computed for an approved decision
    pub fn set_pricing_basis(&mut self, basis: PricingBasis, component: &str) {
        let record = AuditRecord::new(AuditAction::PricingBasisSet, Actor::System, component)
            .field("pricing_basis")
            .old_value(
                self.pricing_basis
                    .as_ref()
                    .map(|p| p.loaded_premium_annual.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            )
            .new_value(basis.loaded_premium_annual.to_string())
            .reason(format!(
                "base rate {} per 1000, loading {}%",
                basis.base_rate_per_thousand, basis.total_loading_percent
            ));
        self.pricing_basis = Some(basis);
        self.log_audit(record);
    }

    /// Human-readable chronological audit summary
    pub fn audit_summary(&self) -> String {
        self.audit_trail.summary(&self.id.short_code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::requirement::RequirementCategory;

    fn requirement(case: &RiskCase, kind: &str) -> Requirement {
        Requirement::new(
            RequirementId::sequence(case.requirements().len() + 1),
            RequirementCategory::Medical,
            kind,
            "Required for SA slab",
            "SA_SLAB_0_2500000",
        )
    }

    #[test]
    fn test_new_case_is_draft_with_empty_trail() {
        let case = RiskCase::new();
        assert_eq!(case.status(), CaseStatus::Draft);
        assert!(case.audit_trail().is_empty());
        assert_eq!(case.created_at(), case.updated_at());
    }

    #[test]
    fn test_add_requirement_appends_one_audit_entry() {
        let mut case = RiskCase::new();
        let req = requirement(&case, "ECG");
        case.add_requirement(req, "RequirementEngine");

        assert_eq!(case.requirements().len(), 1);
        assert_eq!(case.audit_trail().len(), 1);
        let entry = case.audit_trail().last().unwrap();
        assert_eq!(entry.action, AuditAction::RequirementAdded);
        assert_eq!(entry.reason, "SA_SLAB_0_2500000");
        assert_eq!(case.updated_at(), entry.timestamp);
    }

    #[test]
    fn test_satisfy_requirement_moves_pending_to_received() {
        let mut case = RiskCase::new();
        let req = requirement(&case, "HbA1c");
        let id = req.id.clone();
        case.add_requirement(req, "RequirementEngine");

        case.satisfy_requirement(&id, "LAB-42").unwrap();

        let stored = &case.requirements()[0];
        assert_eq!(stored.status, RequirementStatus::Received);
        assert_eq!(stored.document_ref.as_deref(), Some("LAB-42"));
        assert_eq!(case.pending_requirements().count(), 0);

        let entry = case.audit_trail().last().unwrap();
        assert_eq!(entry.old_value.as_deref(), Some("PENDING"));
        assert_eq!(entry.new_value.as_deref(), Some("RECEIVED"));
        assert_eq!(entry.evidence_refs, vec!["LAB-42".to_string()]);
    }

    #[test]
    fn test_satisfy_requirement_twice_is_rejected() {
        let mut case = RiskCase::new();
        let req = requirement(&case, "HbA1c");
        let id = req.id.clone();
        case.add_requirement(req, "RequirementEngine");
        case.satisfy_requirement(&id, "LAB-1").unwrap();

        let err = case.satisfy_requirement(&id, "LAB-2").unwrap_err();
        assert!(matches!(err, UnderwritingError::RequirementNotPending { .. }));
        assert_eq!(case.audit_trail().len(), 2);
    }

    #[test]
    fn test_satisfy_unknown_requirement() {
        let mut case = RiskCase::new();
        let err = case
            .satisfy_requirement(&RequirementId::from("REQ-9999"), "DOC")
            .unwrap_err();
        assert!(matches!(err, UnderwritingError::RequirementNotFound(_)));
        assert!(case.audit_trail().is_empty());
    }

    #[test]
    fn test_terminal_status_is_final() {
        let mut case = RiskCase::new();
        case.transition_status(CaseStatus::Withdrawn, Actor::Human, "Underwriter", "withdrawn")
            .unwrap();
        let err = case
            .transition_status(CaseStatus::UnderReview, Actor::System, "Pipeline", "retry")
            .unwrap_err();
        assert!(matches!(
            err,
            UnderwritingError::InvalidStatusTransition {
                from: CaseStatus::Withdrawn,
                to: CaseStatus::UnderReview
            }
        ));
        assert_eq!(case.audit_trail().len(), 1);
    }

    #[test]
    fn test_record_evidence_maps_panel_to_field_path() {
        let mut case = RiskCase::new();
        case.record_evidence(
            EvidenceUpdate::Cardiac(CardiacEvidence {
                ecg_abnormal: true,
                ..Default::default()
            }),
            Actor::System,
            "Intake",
            "ECG report",
        );
        assert!(case.medical().cardiac.ecg_abnormal);
        let entry = case.audit_trail().last().unwrap();
        assert_eq!(entry.field_changed.as_deref(), Some("medical.cardiac"));
        assert_eq!(entry.new_value.as_deref(), Some("ecg_abnormal=true"));
    }
}
