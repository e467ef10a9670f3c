//! Evidence model
//!
//! Every clinically or financially significant number is carried as an
//! [`EvidenceValue`] with provenance. A value without [`EvidenceMetadata`]
//! is *unattested*: it is kept for display but every rule reads numbers
//! through [`EvidenceValue::attested`], so an unattested number behaves as
//! if it were absent rather than as zero.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::Money;

use crate::error::EvidenceError;

/// Where a piece of evidence came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EvidenceSource {
    LabReport,
    MedicalExam,
    ProposalForm,
    KycDocument,
    FinancialDoc,
    BureauCheck,
    SelfDeclaration,
    ThirdParty,
}

/// Provenance attached to an evidence value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceMetadata {
    pub source: EvidenceSource,
    pub source_document_id: String,
    pub extracted_at: DateTime<Utc>,
    pub lab_name: Option<String>,
    pub test_date: Option<NaiveDate>,
    pub reference_range: Option<String>,
    confidence: Decimal,
    pub verified: bool,
}

impl EvidenceMetadata {
    /// Default extraction confidence when the producer supplies none
    pub const DEFAULT_CONFIDENCE: Decimal = dec!(0.95);

    /// Creates metadata with the default confidence, unverified
    pub fn new(
        source: EvidenceSource,
        source_document_id: impl Into<String>,
        extracted_at: DateTime<Utc>,
    ) -> Self {
        Self {
            source,
            source_document_id: source_document_id.into(),
            extracted_at,
            lab_name: None,
            test_date: None,
            reference_range: None,
            confidence: Self::DEFAULT_CONFIDENCE,
            verified: false,
        }
    }

    /// Sets the extraction confidence
    ///
    /// # Errors
    ///
    /// Returns [`EvidenceError::ConfidenceOutOfRange`] unless `0 <= confidence <= 1`.
    pub fn with_confidence(mut self, confidence: Decimal) -> Result<Self, EvidenceError> {
        if confidence < Decimal::ZERO || confidence > Decimal::ONE {
            return Err(EvidenceError::ConfidenceOutOfRange(confidence));
        }
        self.confidence = confidence;
        Ok(self)
    }

    pub fn confidence(&self) -> Decimal {
        self.confidence
    }
}

/// A single evidence-backed value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvidenceValue<T> {
    pub value: T,
    pub unit: Option<String>,
    pub metadata: Option<EvidenceMetadata>,
}

impl<T> EvidenceValue<T> {
    /// Creates an attested value
    pub fn attested_with(value: T, metadata: EvidenceMetadata) -> Self {
        Self {
            value,
            unit: None,
            metadata: Some(metadata),
        }
    }

    /// Creates a value with no provenance
    pub fn unattested(value: T) -> Self {
        Self {
            value,
            unit: None,
            metadata: None,
        }
    }

    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = Some(unit.into());
        self
    }

    /// Returns the value only when provenance is attached
    pub fn attested(&self) -> Option<&T> {
        self.metadata.as_ref().map(|_| &self.value)
    }

    /// Source document reference, if any
    pub fn document_ref(&self) -> Option<&str> {
        self.metadata.as_ref().map(|m| m.source_document_id.as_str())
    }
}

/// A numeric measurement such as a lab value
pub type Measurement = EvidenceValue<Decimal>;

/// Reads the attested number out of an optional measurement
pub fn attested_number(value: &Option<Measurement>) -> Option<Decimal> {
    value.as_ref().and_then(|v| v.attested().copied())
}

// ============================================================================
// MEDICAL EVIDENCE
// ============================================================================

/// Position of the applicant during a blood-pressure reading
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BpPosition {
    #[default]
    Sitting,
    Standing,
    Supine,
}

/// Blood pressure reading with context
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpReading {
    pub systolic: u32,
    pub diastolic: u32,
    pub pulse: Option<u32>,
    pub reading_date: Option<DateTime<Utc>>,
    pub position: BpPosition,
    pub metadata: Option<EvidenceMetadata>,
}

impl BpReading {
    pub fn new(systolic: u32, diastolic: u32, metadata: EvidenceMetadata) -> Self {
        Self {
            systolic,
            diastolic,
            pulse: None,
            reading_date: None,
            position: BpPosition::Sitting,
            metadata: Some(metadata),
        }
    }

    pub fn taken_at(mut self, reading_date: DateTime<Utc>) -> Self {
        self.reading_date = Some(reading_date);
        self
    }

    pub fn is_attested(&self) -> bool {
        self.metadata.is_some()
    }
}

/// BMI category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BmiCategory {
    Underweight,
    Normal,
    Overweight,
    Obese,
    SeverelyObese,
    #[default]
    Unknown,
}

impl BmiCategory {
    pub fn from_bmi(bmi: Decimal) -> Self {
        if bmi < dec!(18.5) {
            BmiCategory::Underweight
        } else if bmi < dec!(25) {
            BmiCategory::Normal
        } else if bmi < dec!(30) {
            BmiCategory::Overweight
        } else if bmi < dec!(35) {
            BmiCategory::Obese
        } else {
            BmiCategory::SeverelyObese
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BmiCategory::Underweight => "Underweight",
            BmiCategory::Normal => "Normal",
            BmiCategory::Overweight => "Overweight",
            BmiCategory::Obese => "Obese",
            BmiCategory::SeverelyObese => "Severely_Obese",
            BmiCategory::Unknown => "Unknown",
        }
    }
}

/// Physical vitals
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct VitalsEvidence {
    pub height_cm: Option<Measurement>,
    pub weight_kg: Option<Measurement>,
    pub bmi: Option<Measurement>,
    pub waist_circumference_cm: Option<Measurement>,
    /// Readings in the order they were recorded
    pub bp_readings: Vec<BpReading>,
}

impl VitalsEvidence {
    /// Attested BMI, or BMI computed from attested height and weight
    pub fn effective_bmi(&self) -> Option<Decimal> {
        if let Some(bmi) = attested_number(&self.bmi) {
            return Some(bmi);
        }
        let height_cm = attested_number(&self.height_cm)?;
        let weight_kg = attested_number(&self.weight_kg)?;
        if height_cm <= Decimal::ZERO {
            return None;
        }
        let height_m = height_cm / dec!(100);
        let height_squared = height_m.checked_mul(height_m)?;
        weight_kg
            .checked_div(height_squared)
            .map(|bmi| bmi.round_dp(1))
    }

    /// The most recent attested blood-pressure reading
    ///
    /// Dated readings win over undated ones; among equals the later-recorded
    /// reading wins.
    pub fn latest_bp(&self) -> Option<&BpReading> {
        self.bp_readings
            .iter()
            .filter(|r| r.is_attested())
            .max_by_key(|r| r.reading_date)
    }
}

/// Declared diabetic status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DiabeticStatus {
    Yes,
    No,
    Prediabetic,
    #[default]
    Unknown,
}

/// Diabetes evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiabetesEvidence {
    pub status: DiabeticStatus,
    pub diagnosis_date: Option<NaiveDate>,
    pub duration_years: Option<Decimal>,
    pub hba1c: Option<Measurement>,
    pub fbs: Option<Measurement>,
    pub ppbs: Option<Measurement>,
    /// Diet, OHA, Insulin
    pub treatment_type: Option<String>,
    pub medications: Vec<String>,
    pub has_complications: bool,
    pub complications: Vec<String>,
}

impl DiabetesEvidence {
    pub fn is_disclosed(&self) -> bool {
        matches!(self.status, DiabeticStatus::Yes | DiabeticStatus::Prediabetic)
    }
}

/// Liver function panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LiverPanel {
    pub sgot: Option<Measurement>,
    pub sgpt: Option<Measurement>,
    pub alkaline_phosphatase: Option<Measurement>,
    pub bilirubin_total: Option<Measurement>,
    pub ggt: Option<Measurement>,
    pub albumin: Option<Measurement>,
    pub status: Option<String>,
    pub fatty_liver: bool,
}

/// Kidney function panel
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RenalPanel {
    pub creatinine: Option<Measurement>,
    pub urea: Option<Measurement>,
    pub uric_acid: Option<Measurement>,
    pub egfr: Option<Measurement>,
    pub urine_albumin: Option<Measurement>,
    pub urine_protein: Option<Measurement>,
    pub status: Option<String>,
    /// 1-5
    pub ckd_stage: Option<u8>,
}

/// Lipid profile
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LipidPanel {
    pub total_cholesterol: Option<Measurement>,
    pub ldl: Option<Measurement>,
    pub hdl: Option<Measurement>,
    pub triglycerides: Option<Measurement>,
}

/// Cardiac evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CardiacEvidence {
    pub ecg_findings: Option<String>,
    pub ecg_abnormal: bool,
    pub tmt_result: Option<String>,
    pub echo_ejection_fraction: Option<Measurement>,
    pub known_heart_disease: bool,
}

/// Past medical and family history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalHistory {
    pub conditions: Vec<String>,
    pub surgeries: Vec<String>,
    pub current_medications: Vec<String>,
    pub family_diabetes: bool,
    pub family_heart_disease: bool,
    pub family_cancer: bool,
}

impl MedicalHistory {
    /// Case-insensitive substring match over disclosed conditions
    pub fn mentions(&self, needle: &str) -> bool {
        let needle = needle.to_lowercase();
        self.conditions
            .iter()
            .any(|c| c.to_lowercase().contains(&needle))
    }
}

/// Complete medical evidence collection
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MedicalEvidence {
    pub vitals: VitalsEvidence,
    pub diabetes: DiabetesEvidence,
    pub liver: LiverPanel,
    pub renal: RenalPanel,
    pub lipid: LipidPanel,
    pub cardiac: CardiacEvidence,
    pub history: MedicalHistory,
}

// ============================================================================
// LIFESTYLE EVIDENCE
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SmokingStatus {
    #[default]
    Never,
    Former,
    Current,
}

/// Smoking history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SmokingEvidence {
    pub status: SmokingStatus,
    /// packs per day × years smoked
    pub pack_years: Option<Decimal>,
    pub quit_date: Option<NaiveDate>,
    pub years_since_quit: Option<Decimal>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum AlcoholStatus {
    #[default]
    Never,
    Social,
    Regular,
    Heavy,
}

/// Alcohol history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AlcoholEvidence {
    pub status: AlcoholStatus,
    pub units_per_week: Option<Decimal>,
    /// CAGE screening score, 0-4
    pub cage_score: Option<u8>,
}

/// Occupation with risk grading
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OccupationEvidence {
    pub occupation: String,
    pub employer: Option<String>,
    /// 1 (office) to 4 (hazardous)
    pub occupation_class: u8,
    pub hazards: Vec<String>,
}

impl Default for OccupationEvidence {
    fn default() -> Self {
        Self {
            occupation: String::new(),
            employer: None,
            occupation_class: 1,
            hazards: Vec::new(),
        }
    }
}

/// Complete lifestyle evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LifestyleEvidence {
    pub smoking: SmokingEvidence,
    pub alcohol: AlcoholEvidence,
    pub occupation: OccupationEvidence,
    pub hazardous_hobbies: Vec<String>,
    pub high_risk_countries: Vec<String>,
}

// ============================================================================
// FINANCIAL EVIDENCE
// ============================================================================

/// Income with verification
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncomeEvidence {
    pub declared_annual: Option<EvidenceValue<Money>>,
    pub verified_annual: Option<EvidenceValue<Money>>,
    pub income_source: Option<String>,
    pub verification_method: Option<String>,
}

impl IncomeEvidence {
    /// Declared annual income when attested and strictly positive
    pub fn positive_declared(&self) -> Option<Money> {
        self.declared_annual
            .as_ref()
            .and_then(|v| v.attested())
            .filter(|m| m.is_positive())
            .copied()
    }
}

/// Complete financial evidence
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FinancialEvidence {
    pub income: IncomeEvidence,
    pub existing_cover: Option<Money>,
    pub cibil_score: Option<EvidenceValue<u16>>,
}

// ============================================================================
// IDENTITY EVIDENCE
// ============================================================================

/// Applicant identity
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdentityEvidence {
    pub full_name: EvidenceValue<String>,
    pub date_of_birth: Option<EvidenceValue<NaiveDate>>,
    /// Age at entry, in completed years
    pub age: Option<u32>,
    pub gender: Option<String>,
    pub pan: Option<EvidenceValue<String>>,
    pub aadhaar: Option<EvidenceValue<String>>,
    pub kyc_verified: bool,
    pub address: Option<String>,
}

impl IdentityEvidence {
    pub fn new(full_name: EvidenceValue<String>) -> Self {
        Self {
            full_name,
            date_of_birth: None,
            age: None,
            gender: None,
            pan: None,
            aadhaar: None,
            kyc_verified: false,
            address: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }
}
