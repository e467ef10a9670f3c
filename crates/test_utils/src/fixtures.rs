//! Pre-built Test Fixtures
//!
//! Provides ready-to-use applicant profiles and amounts. The two reference
//! profiles are the healthy applicant and the multi-condition applicant
//! used throughout the acceptance tests.

use chrono::NaiveDate;
use core_kernel::{Currency, Money};
use domain_underwriting::evidence::{AlcoholStatus, DiabeticStatus, SmokingStatus};
use domain_underwriting::CaseIntake;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

/// Document id stamped on fixture evidence
pub const FIXTURE_DOCUMENT: &str = "DOC-TEST-001";

/// Fixture for Money test data
pub struct MoneyFixtures;

impl MoneyFixtures {
    pub fn inr(amount: Decimal) -> Money {
        Money::new(amount, Currency::INR)
    }

    /// Sum assured of the reference profiles
    pub fn sum_assured_15m() -> Money {
        Self::inr(dec!(15000000))
    }

    pub fn usd(amount: Decimal) -> Money {
        Money::new(amount, Currency::USD)
    }
}

/// Fixture for intake documents
pub struct IntakeFixtures;

impl IntakeFixtures {
    pub fn proposal_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 1).expect("valid date")
    }

    /// Healthy 36-year-old office worker, SA 15M, no HbA1c on file
    ///
    /// Expected: `APPROVE`, `PREFERRED`, 0% loading.
    pub fn healthy_applicant() -> CaseIntake {
        CaseIntake {
            full_name: Some("Rahul Sharma".to_string()),
            age: Some(36),
            gender: Some("Male".to_string()),
            pan: Some("ABCDE1234F".to_string()),
            proposal_date: Some(Self::proposal_date()),
            sum_assured: Some(dec!(15000000)),
            height_cm: Some(dec!(175)),
            weight_kg: Some(dec!(67.7)),
            bmi: Some(dec!(22.1)),
            bp_systolic: Some(122),
            bp_diastolic: Some(78),
            diabetes_declared: Some(DiabeticStatus::No),
            smoking_status: Some(SmokingStatus::Never),
            alcohol_status: Some(AlcoholStatus::Social),
            occupation: Some("Software Engineer".to_string()),
            occupation_class: Some(1),
            annual_income: Some(dec!(2500000)),
            ..Default::default()
        }
    }

    /// 45-year-old obese diabetic current smoker with hypertension, SA 15M
    ///
    /// Expected loadings: BMI_Obese 50, Diabetes 75, Hypertension 50,
    /// Smoking 100, for 275% and `SUBSTANDARD_4`, referred.
    pub fn multi_condition_applicant() -> CaseIntake {
        CaseIntake {
            full_name: Some("Vikram Mehta".to_string()),
            age: Some(45),
            gender: Some("Male".to_string()),
            proposal_date: Some(Self::proposal_date()),
            sum_assured: Some(dec!(15000000)),
            height_cm: Some(dec!(170)),
            weight_kg: Some(dec!(89.6)),
            bmi: Some(dec!(31.0)),
            bp_systolic: Some(145),
            bp_diastolic: Some(95),
            diabetes_declared: Some(DiabeticStatus::Yes),
            hba1c: Some(dec!(8.2)),
            fbs: Some(dec!(156)),
            diabetes_duration: Some(dec!(3)),
            diabetes_treatment: Some("OHA".to_string()),
            medical_conditions: vec!["Hypertension".to_string()],
            smoking_status: Some(SmokingStatus::Current),
            pack_years: Some(dec!(15)),
            alcohol_status: Some(AlcoholStatus::Social),
            occupation: Some("Sales Manager".to_string()),
            occupation_class: Some(1),
            annual_income: Some(dec!(1200000)),
            ..Default::default()
        }
    }

    /// Healthy applicant as a flat JSON intake document
    pub fn healthy_applicant_json() -> String {
        serde_json::json!({
            "full_name": "Rahul Sharma",
            "age": 36,
            "proposal_date": "2024-06-01",
            "sum_assured": "15000000",
            "bmi": "22.1",
            "bp_systolic": 122,
            "bp_diastolic": 78,
            "diabetes_declared": "No",
            "smoking_status": "Never",
            "alcohol_status": "Social",
            "occupation": "Software Engineer",
            "occupation_class": 1,
            "annual_income": "2500000"
        })
        .to_string()
    }
}
