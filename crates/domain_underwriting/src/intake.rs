//! Intake adapter
//!
//! Upstream extraction hands over a flat key/value map of evidence. This
//! module turns that map into a [`RiskCase`] through audited evidence
//! updates, attaching provenance to every number so the engines treat it as
//! attested.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use core_kernel::{Currency, Money};

use crate::audit::{Actor, AuditAction, AuditRecord};
use crate::error::{EvidenceError, UnderwritingError};
use crate::evidence::{
    AlcoholEvidence, AlcoholStatus, BpReading, CardiacEvidence, DiabetesEvidence, DiabeticStatus,
    EvidenceMetadata, EvidenceSource, EvidenceValue, FinancialEvidence, IdentityEvidence,
    IncomeEvidence, LifestyleEvidence, LiverPanel, Measurement, MedicalHistory,
    OccupationEvidence, RenalPanel, SmokingEvidence, SmokingStatus, VitalsEvidence,
};
use crate::risk_case::{EvidenceUpdate, ProposalContext, RiskCase};

const COMPONENT: &str = "CaseIntake";
/// Sum assured when the intake carries none
const DEFAULT_SUM_ASSURED: i64 = 1_000_000;

/// Flat evidence map as produced by document extraction
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaseIntake {
    // Identity
    pub full_name: Option<String>,
    pub dob: Option<NaiveDate>,
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub pan: Option<String>,
    pub aadhaar: Option<String>,
    pub address: Option<String>,

    // Proposal
    pub proposal_date: Option<NaiveDate>,
    pub product_code: Option<String>,
    pub sum_assured: Option<Decimal>,
    pub currency: Option<Currency>,

    // Vitals
    pub height_cm: Option<Decimal>,
    pub weight_kg: Option<Decimal>,
    pub bmi: Option<Decimal>,
    pub bp_systolic: Option<u32>,
    pub bp_diastolic: Option<u32>,

    // Diabetes
    pub diabetes_declared: Option<DiabeticStatus>,
    pub hba1c: Option<Decimal>,
    pub fbs: Option<Decimal>,
    pub ppbs: Option<Decimal>,
    pub diabetes_duration: Option<Decimal>,
    pub diabetes_treatment: Option<String>,
    pub diabetes_complications: Vec<String>,

    // Liver and kidney
    pub sgot: Option<Decimal>,
    pub sgpt: Option<Decimal>,
    pub liver_status: Option<String>,
    pub creatinine: Option<Decimal>,
    pub urea: Option<Decimal>,
    pub kidney_status: Option<String>,

    // Cardiac and history
    pub ecg_abnormal: bool,
    pub ecg_findings: Option<String>,
    pub medical_conditions: Vec<String>,

    // Lifestyle
    pub smoking_status: Option<SmokingStatus>,
    pub pack_years: Option<Decimal>,
    pub years_since_quit: Option<Decimal>,
    pub alcohol_status: Option<AlcoholStatus>,
    pub alcohol_units_per_week: Option<Decimal>,
    pub occupation: Option<String>,
    pub occupation_class: Option<u8>,

    // Financial
    pub annual_income: Option<Decimal>,
}

/// Attaches provenance for one source document
struct Attester {
    document_id: String,
    extracted_at: DateTime<Utc>,
}

impl Attester {
    fn meta(&self, source: EvidenceSource) -> EvidenceMetadata {
        EvidenceMetadata::new(source, self.document_id.clone(), self.extracted_at)
    }

    /// Positive numbers become attested measurements; blanks and zeros are
    /// left absent
    fn measure(&self, value: Option<Decimal>, source: EvidenceSource, unit: &str) -> Option<Measurement> {
        value
            .filter(|v| *v > Decimal::ZERO)
            .map(|v| Measurement::attested_with(v, self.meta(source)).with_unit(unit))
    }

    fn text(&self, value: Option<&String>) -> Option<EvidenceValue<String>> {
        value
            .filter(|s| !s.trim().is_empty())
            .map(|s| EvidenceValue::attested_with(s.clone(), self.meta(EvidenceSource::ProposalForm)))
    }
}

impl CaseIntake {
    /// Parses an intake document
    pub fn from_json_str(json: &str) -> Result<Self, UnderwritingError> {
        serde_json::from_str(json).map_err(|e| {
            UnderwritingError::from(EvidenceError::InvalidField {
                field: "intake".to_string(),
                message: e.to_string(),
            })
        })
    }

    /// Builds a risk case from the intake map
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::InvalidField`] for a negative sum assured or
    /// income.
    pub fn into_risk_case(self, document_id: &str) -> Result<RiskCase, UnderwritingError> {
        let sum_assured = self
            .sum_assured
            .unwrap_or_else(|| Decimal::from(DEFAULT_SUM_ASSURED));
        if sum_assured < Decimal::ZERO {
            return Err(EvidenceError::InvalidField {
                field: "sum_assured".to_string(),
                message: format!("negative amount {sum_assured}"),
            }
            .into());
        }
        if self.annual_income.is_some_and(|i| i < Decimal::ZERO) {
            return Err(EvidenceError::InvalidField {
                field: "annual_income".to_string(),
                message: "negative amount".to_string(),
            }
            .into());
        }

        let now = Utc::now();
        let attester = Attester {
            document_id: document_id.to_string(),
            extracted_at: now,
        };
        let currency = self.currency.unwrap_or_default();
        let reason = format!("Loaded from {document_id}");

        let mut case = RiskCase::new();
        case.log_audit(
            AuditRecord::new(AuditAction::RiskCaseCreated, Actor::System, COMPONENT)
                .evidence([document_id.to_string()])
                .reason("Created from intake document"),
        );

        let name = self.full_name.clone().unwrap_or_else(|| "Unknown".to_string());
        let mut identity = IdentityEvidence::new(EvidenceValue::attested_with(
            name,
            attester.meta(EvidenceSource::ProposalForm),
        ));
        identity.date_of_birth = self
            .dob
            .map(|d| EvidenceValue::attested_with(d, attester.meta(EvidenceSource::ProposalForm)));
        identity.age = self.age;
        identity.gender = self.gender.clone();
        identity.pan = attester.text(self.pan.as_ref());
        identity.aadhaar = attester.text(self.aadhaar.as_ref());
        identity.address = self.address.clone();

        let mut proposal = ProposalContext::term_life(
            Money::new(sum_assured, currency),
            self.proposal_date.unwrap_or_else(|| now.date_naive()),
        );
        if let Some(code) = &self.product_code {
            proposal.product_code = code.clone();
        }

        let mut vitals = VitalsEvidence {
            height_cm: attester.measure(self.height_cm, EvidenceSource::MedicalExam, "cm"),
            weight_kg: attester.measure(self.weight_kg, EvidenceSource::MedicalExam, "kg"),
            bmi: attester.measure(self.bmi, EvidenceSource::MedicalExam, "kg/m2"),
            ..Default::default()
        };
        if let (Some(systolic), Some(diastolic)) = (self.bp_systolic, self.bp_diastolic) {
            if systolic > 0 && diastolic > 0 {
                vitals.bp_readings.push(
                    BpReading::new(systolic, diastolic, attester.meta(EvidenceSource::MedicalExam))
                        .taken_at(now),
                );
            }
        }

        let diabetes = DiabetesEvidence {
            status: self.diabetes_declared.unwrap_or(DiabeticStatus::No),
            duration_years: self.diabetes_duration,
            hba1c: attester.measure(self.hba1c, EvidenceSource::LabReport, "%"),
            fbs: attester.measure(self.fbs, EvidenceSource::LabReport, "mg/dL"),
            ppbs: attester.measure(self.ppbs, EvidenceSource::LabReport, "mg/dL"),
            treatment_type: self.diabetes_treatment.clone(),
            has_complications: !self.diabetes_complications.is_empty(),
            complications: self.diabetes_complications.clone(),
            ..Default::default()
        };

        let liver = LiverPanel {
            sgot: attester.measure(self.sgot, EvidenceSource::LabReport, "U/L"),
            sgpt: attester.measure(self.sgpt, EvidenceSource::LabReport, "U/L"),
            status: Some(self.liver_status.clone().unwrap_or_else(|| "Normal".to_string())),
            ..Default::default()
        };

        let renal = RenalPanel {
            creatinine: attester.measure(self.creatinine, EvidenceSource::LabReport, "mg/dL"),
            urea: attester.measure(self.urea, EvidenceSource::LabReport, "mg/dL"),
            status: Some(self.kidney_status.clone().unwrap_or_else(|| "Normal".to_string())),
            ..Default::default()
        };

        let lifestyle = LifestyleEvidence {
            smoking: SmokingEvidence {
                status: self.smoking_status.unwrap_or_default(),
                pack_years: self.pack_years,
                quit_date: None,
                years_since_quit: self.years_since_quit,
            },
            alcohol: AlcoholEvidence {
                status: self.alcohol_status.unwrap_or_default(),
                units_per_week: self.alcohol_units_per_week,
                cage_score: None,
            },
            occupation: OccupationEvidence {
                occupation: self
                    .occupation
                    .clone()
                    .unwrap_or_else(|| "Office Worker".to_string()),
                occupation_class: self.occupation_class.unwrap_or(1),
                ..Default::default()
            },
            ..Default::default()
        };

        let financial = FinancialEvidence {
            income: IncomeEvidence {
                declared_annual: self.annual_income.filter(|i| *i > Decimal::ZERO).map(|i| {
                    EvidenceValue::attested_with(
                        Money::new(i, currency),
                        attester.meta(EvidenceSource::ProposalForm),
                    )
                }),
                ..Default::default()
            },
            ..Default::default()
        };

        let updates = [
            EvidenceUpdate::Identity(identity),
            EvidenceUpdate::Proposal(proposal),
            EvidenceUpdate::Vitals(vitals),
            EvidenceUpdate::Diabetes(diabetes),
            EvidenceUpdate::Liver(liver),
            EvidenceUpdate::Renal(renal),
            EvidenceUpdate::Cardiac(CardiacEvidence {
                ecg_abnormal: self.ecg_abnormal,
                ecg_findings: self.ecg_findings.clone(),
                ..Default::default()
            }),
            EvidenceUpdate::History(MedicalHistory {
                conditions: self.medical_conditions.clone(),
                ..Default::default()
            }),
            EvidenceUpdate::Lifestyle(lifestyle),
            EvidenceUpdate::Financial(financial),
        ];
        for update in updates {
            case.record_evidence(update, Actor::System, COMPONENT, reason.clone());
        }
        case.refresh_derived_metrics();

        tracing::debug!(case_id = %case.id(), document_id, "risk case created from intake");
        Ok(case)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_numbers_are_attested_with_source() {
        let intake = CaseIntake {
            age: Some(40),
            hba1c: Some(dec!(6.1)),
            bmi: Some(dec!(24.0)),
            ..Default::default()
        };
        let case = intake.into_risk_case("DOC-7").unwrap();

        let hba1c = case.medical().diabetes.hba1c.as_ref().unwrap();
        assert_eq!(hba1c.attested(), Some(&dec!(6.1)));
        assert_eq!(
            hba1c.metadata.as_ref().map(|m| m.source),
            Some(EvidenceSource::LabReport)
        );
        assert_eq!(hba1c.document_ref(), Some("DOC-7"));
        assert_eq!(case.age(), Some(40));
    }

    #[test]
    fn test_creation_is_the_first_audit_entry() {
        let case = CaseIntake::default().into_risk_case("DOC-1").unwrap();
        let first = &case.audit_trail().entries()[0];
        assert_eq!(first.action, AuditAction::RiskCaseCreated);
        assert!(case
            .audit_trail()
            .with_action(&AuditAction::EvidenceRecorded)
            .any(|e| e.field_changed.as_deref() == Some("medical.vitals")));
    }

    #[test]
    fn test_defaults_follow_intake_conventions() {
        let case = CaseIntake::default().into_risk_case("DOC-1").unwrap();
        assert_eq!(
            case.proposal().map(|p| p.sum_assured.amount()),
            Some(dec!(1000000))
        );
        assert_eq!(case.medical().diabetes.status, DiabeticStatus::No);
        assert_eq!(case.lifestyle().occupation.occupation_class, 1);
        assert!(case.financial().income.declared_annual.is_none());
    }

    #[test]
    fn test_zero_lab_values_are_treated_as_blank() {
        let intake = CaseIntake {
            hba1c: Some(Decimal::ZERO),
            ..Default::default()
        };
        let case = intake.into_risk_case("DOC-1").unwrap();
        assert!(case.medical().diabetes.hba1c.is_none());
    }

    #[test]
    fn test_negative_sum_assured_is_rejected() {
        let intake = CaseIntake {
            sum_assured: Some(dec!(-1)),
            ..Default::default()
        };
        assert!(matches!(
            intake.into_risk_case("DOC-1"),
            Err(UnderwritingError::Evidence(EvidenceError::InvalidField { .. }))
        ));
    }

    #[test]
    fn test_parses_flat_json() {
        let intake = CaseIntake::from_json_str(
            r#"{"age": 45, "sum_assured": "5000000", "smoking_status": "Current", "pack_years": 15}"#,
        )
        .unwrap();
        assert_eq!(intake.age, Some(45));
        assert_eq!(intake.sum_assured, Some(dec!(5000000)));
        assert_eq!(intake.smoking_status, Some(SmokingStatus::Current));
    }
}
