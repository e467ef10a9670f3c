//! Property-Based Test Generators
//!
//! Provides proptest strategies for generating applicant profiles that
//! stay inside the intake's accepted ranges.

use domain_underwriting::evidence::{AlcoholStatus, DiabeticStatus, SmokingStatus};
use domain_underwriting::CaseIntake;
use proptest::prelude::*;
use rust_decimal::Decimal;

/// Strategy for ages inside the insurable range
pub fn insurable_age_strategy() -> impl Strategy<Value = u32> {
    18u32..=65u32
}

/// Strategy for ages outside the insurable range
pub fn uninsurable_age_strategy() -> impl Strategy<Value = u32> {
    prop_oneof![0u32..18u32, 66u32..110u32]
}

/// Strategy for BMI values with one decimal place, 15.0 to 45.0
pub fn bmi_strategy() -> impl Strategy<Value = Decimal> {
    (150i64..=450i64).prop_map(|n| Decimal::new(n, 1))
}

/// Strategy for HbA1c values with one decimal place, 4.5 to 12.0
pub fn hba1c_strategy() -> impl Strategy<Value = Decimal> {
    (45i64..=120i64).prop_map(|n| Decimal::new(n, 1))
}

/// Strategy for whole-unit sums assured, 100k to 200M
pub fn sum_assured_strategy() -> impl Strategy<Value = Decimal> {
    (100_000i64..=200_000_000i64).prop_map(Decimal::from)
}

/// Strategy for total loading percentages
pub fn loading_percent_strategy() -> impl Strategy<Value = u32> {
    0u32..=400u32
}

pub fn smoking_status_strategy() -> impl Strategy<Value = SmokingStatus> {
    prop_oneof![
        Just(SmokingStatus::Never),
        Just(SmokingStatus::Former),
        Just(SmokingStatus::Current),
    ]
}

pub fn alcohol_status_strategy() -> impl Strategy<Value = AlcoholStatus> {
    prop_oneof![
        Just(AlcoholStatus::Never),
        Just(AlcoholStatus::Social),
        Just(AlcoholStatus::Regular),
        Just(AlcoholStatus::Heavy),
    ]
}

/// Strategy for complete applicant intakes
pub fn intake_strategy() -> impl Strategy<Value = CaseIntake> {
    (
        (0u32..=90u32, bmi_strategy(), hba1c_strategy(), sum_assured_strategy()),
        (90u32..=180u32, 60u32..=110u32),
        (smoking_status_strategy(), 0i64..=40i64, 0i64..=10i64),
        (alcohol_status_strategy(), 1u8..=4u8, 0i64..=10i64),
    )
        .prop_map(
            |(
                (age, bmi, hba1c, sum_assured),
                (systolic, diastolic),
                (smoking, pack_years, years_since_quit),
                (alcohol, occupation_class, duration),
            )| CaseIntake {
                full_name: Some("Generated Applicant".to_string()),
                age: Some(age),
                sum_assured: Some(sum_assured),
                bmi: Some(bmi),
                bp_systolic: Some(systolic),
                bp_diastolic: Some(diastolic),
                diabetes_declared: Some(if hba1c > Decimal::new(65, 1) {
                    DiabeticStatus::Yes
                } else {
                    DiabeticStatus::No
                }),
                hba1c: Some(hba1c),
                diabetes_duration: Some(Decimal::from(duration)),
                smoking_status: Some(smoking),
                pack_years: Some(Decimal::from(pack_years)),
                years_since_quit: Some(Decimal::from(years_since_quit)),
                alcohol_status: Some(alcohol),
                occupation_class: Some(occupation_class),
                ..Default::default()
            },
        )
}
