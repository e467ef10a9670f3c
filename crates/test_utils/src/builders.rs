//! Test Data Builders
//!
//! Provides a builder for risk cases. Tests specify only the evidence that
//! matters to them; everything else takes the intake defaults.

use domain_underwriting::audit::Actor;
use domain_underwriting::evidence::{
    AlcoholStatus, DiabeticStatus, Measurement, SmokingStatus,
};
use domain_underwriting::{CaseIntake, EvidenceUpdate, RiskCase};
use rust_decimal::Decimal;

use crate::fixtures::FIXTURE_DOCUMENT;

/// Builder for constructing test risk cases
#[derive(Debug, Clone, Default)]
pub struct RiskCaseBuilder {
    intake: CaseIntake,
    unattested_hba1c: Option<Decimal>,
}

impl RiskCaseBuilder {
    /// Creates a builder with an empty intake
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts from an existing intake
    pub fn from_intake(intake: CaseIntake) -> Self {
        Self {
            intake,
            unattested_hba1c: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.intake.age = Some(age);
        self
    }

    pub fn with_sum_assured(mut self, sum_assured: Decimal) -> Self {
        self.intake.sum_assured = Some(sum_assured);
        self
    }

    pub fn with_bmi(mut self, bmi: Decimal) -> Self {
        self.intake.bmi = Some(bmi);
        self
    }

    pub fn with_height_weight(mut self, height_cm: Decimal, weight_kg: Decimal) -> Self {
        self.intake.height_cm = Some(height_cm);
        self.intake.weight_kg = Some(weight_kg);
        self
    }

    pub fn with_bp(mut self, systolic: u32, diastolic: u32) -> Self {
        self.intake.bp_systolic = Some(systolic);
        self.intake.bp_diastolic = Some(diastolic);
        self
    }

    /// Declares diabetes with an attested HbA1c and duration in years
    pub fn with_diabetes(mut self, hba1c: Decimal, duration_years: Decimal) -> Self {
        self.intake.diabetes_declared = Some(DiabeticStatus::Yes);
        self.intake.hba1c = Some(hba1c);
        self.intake.diabetes_duration = Some(duration_years);
        self
    }

    pub fn with_hba1c(mut self, hba1c: Decimal) -> Self {
        self.intake.hba1c = Some(hba1c);
        self
    }

    /// Replaces the HbA1c with a value that carries no provenance
    pub fn with_unattested_hba1c(mut self, hba1c: Decimal) -> Self {
        self.unattested_hba1c = Some(hba1c);
        self
    }

    pub fn with_diabetic_complications(mut self, complications: &[&str]) -> Self {
        self.intake.diabetes_complications =
            complications.iter().map(|c| c.to_string()).collect();
        self
    }

    pub fn with_current_smoking(mut self, pack_years: Decimal) -> Self {
        self.intake.smoking_status = Some(SmokingStatus::Current);
        self.intake.pack_years = Some(pack_years);
        self
    }

    pub fn with_former_smoking(mut self, years_since_quit: Decimal) -> Self {
        self.intake.smoking_status = Some(SmokingStatus::Former);
        self.intake.years_since_quit = Some(years_since_quit);
        self
    }

    pub fn with_alcohol(mut self, status: AlcoholStatus) -> Self {
        self.intake.alcohol_status = Some(status);
        self
    }

    pub fn with_occupation_class(mut self, class: u8) -> Self {
        self.intake.occupation_class = Some(class);
        self
    }

    pub fn with_income(mut self, annual_income: Decimal) -> Self {
        self.intake.annual_income = Some(annual_income);
        self
    }

    pub fn with_condition(mut self, condition: &str) -> Self {
        self.intake.medical_conditions.push(condition.to_string());
        self
    }

    pub fn with_abnormal_ecg(mut self, findings: &str) -> Self {
        self.intake.ecg_abnormal = true;
        self.intake.ecg_findings = Some(findings.to_string());
        self
    }

    pub fn intake(&self) -> &CaseIntake {
        &self.intake
    }

    /// Builds the case through the intake adapter
    pub fn build(self) -> RiskCase {
        let mut case = self
            .intake
            .clone()
            .into_risk_case(FIXTURE_DOCUMENT)
            .expect("builder intake is valid");

        if let Some(hba1c) = self.unattested_hba1c {
            let mut diabetes = case.medical().diabetes.clone();
            diabetes.hba1c = Some(Measurement::unattested(hba1c));
            case.record_evidence(
                EvidenceUpdate::Diabetes(diabetes),
                Actor::Human,
                "TestBuilder",
                "unattested override",
            );
        }
        case
    }
}
