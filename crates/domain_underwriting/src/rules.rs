//! Rule book
//!
//! All actuarial and requirement tables live in one immutable [`RuleBook`].
//! A rule book can only be obtained through [`RuleBook::standard`],
//! [`RuleBook::from_json_str`] or deserialisation, and each of these sorts
//! and validates every table first. Engines never see an unvalidated book.

use std::fmt;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::bands::{BandTable, HalfOpenBand, InclusiveBand, Tail};
use crate::error::RuleTableError;

fn names(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

// ============================================================================
// REQUIREMENT RULES
// ============================================================================

/// Medical tests triggered by disclosures
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DisclosureTests {
    pub diabetes: Vec<String>,
    pub hypertension: Vec<String>,
    pub smoking: Vec<String>,
    pub heavy_alcohol: Vec<String>,
}

/// Tables used by the requirement engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementRules {
    /// Medical tests per sum-assured slab, in whole currency units
    pub sum_assured_grid: BandTable<InclusiveBand<Vec<String>>>,
    /// Additional medical tests per age band
    pub age_modifiers: BandTable<InclusiveBand<Vec<String>>>,
    pub disclosure_tests: DisclosureTests,
    /// Financial documents per sum-assured / income ratio
    pub income_ratio: BandTable<HalfOpenBand<Vec<String>>>,
    /// Financial documents when no usable income is declared
    pub default_financial: Vec<String>,
    pub kyc: Vec<String>,
    pub third_party: Vec<String>,
}

impl RequirementRules {
    pub fn standard() -> Result<Self, RuleTableError> {
        let full_medical_100m = [
            "Full_Medical",
            "ECG",
            "2D_Echo",
            "TMT",
            "Full_Blood",
            "HIV",
            "HbA1c",
            "CT_Chest",
        ];
        let mut full_medical_beyond = names(&full_medical_100m);
        full_medical_beyond.push("Specialist_Opinion".to_string());

        Ok(Self {
            sum_assured_grid: BandTable::new(
                "sum_assured_grid",
                vec![
                    InclusiveBand::new(0, 2_500_000, names(&["Basic_Proposal"])),
                    InclusiveBand::new(
                        2_500_001,
                        5_000_000,
                        names(&["Basic_Proposal", "PPBS", "HIV"]),
                    ),
                    InclusiveBand::new(
                        5_000_001,
                        10_000_000,
                        names(&["Full_Medical", "Lipid_Profile", "LFT", "KFT", "HIV"]),
                    ),
                    InclusiveBand::new(
                        10_000_001,
                        25_000_000,
                        names(&[
                            "Full_Medical",
                            "ECG",
                            "Lipid_Profile",
                            "LFT",
                            "KFT",
                            "HIV",
                            "HbA1c",
                        ]),
                    ),
                    InclusiveBand::new(
                        25_000_001,
                        50_000_000,
                        names(&[
                            "Full_Medical",
                            "ECG",
                            "TMT",
                            "Full_Blood",
                            "HIV",
                            "HbA1c",
                            "USG_Abdomen",
                        ]),
                    ),
                    InclusiveBand::new(50_000_001, 100_000_000, names(&full_medical_100m)),
                    InclusiveBand::open_ended(100_000_001, full_medical_beyond),
                ],
                Tail::Unbounded,
            )?,
            age_modifiers: BandTable::new(
                "age_modifiers",
                vec![
                    InclusiveBand::new(0, 35, Vec::new()),
                    InclusiveBand::new(36, 45, names(&["ECG"])),
                    InclusiveBand::new(46, 55, names(&["ECG", "Lipid_Profile", "HbA1c"])),
                    InclusiveBand::new(
                        56,
                        60,
                        names(&["ECG", "TMT", "Lipid_Profile", "HbA1c", "PSA_if_male"]),
                    ),
                    InclusiveBand::new(
                        61,
                        65,
                        names(&["ECG", "2D_Echo", "TMT", "Full_Blood", "HbA1c"]),
                    ),
                ],
                Tail::Bounded,
            )?,
            disclosure_tests: DisclosureTests {
                diabetes: names(&["HbA1c", "FBS", "PPBS", "KFT", "Urine_ACR", "Fundoscopy"]),
                hypertension: names(&["ECG", "2D_Echo", "KFT", "Fundoscopy"]),
                smoking: names(&["Cotinine_Test"]),
                heavy_alcohol: names(&["GGT", "MCV", "Liver_Screen"]),
            },
            income_ratio: BandTable::new(
                "income_ratio",
                vec![
                    HalfOpenBand::new(dec!(0), dec!(10), names(&["Income_Declaration"])),
                    HalfOpenBand::new(
                        dec!(10),
                        dec!(15),
                        names(&["Income_Declaration", "ITR_1year"]),
                    ),
                    HalfOpenBand::new(
                        dec!(15),
                        dec!(20),
                        names(&["ITR_2years", "Bank_Statement_6months"]),
                    ),
                    HalfOpenBand::new(
                        dec!(20),
                        dec!(25),
                        names(&["ITR_3years", "Bank_Statement_12months", "CA_Certificate"]),
                    ),
                    HalfOpenBand::open_ended(
                        dec!(25),
                        names(&["ITR_3years", "Networth_Statement", "Special_Approval"]),
                    ),
                ],
                Tail::Unbounded,
            )?,
            default_financial: names(&["Income_Declaration", "PAN_Verification"]),
            kyc: names(&["Aadhaar_Verification", "PAN_Verification", "Photo_ID"]),
            third_party: names(&["CIBIL_Score", "IIB_Claims_Check"]),
        })
    }

    fn normalize(&mut self) {
        self.sum_assured_grid.normalize();
        self.age_modifiers.normalize();
        self.income_ratio.normalize();
    }

    fn validate(&self) -> Result<(), RuleTableError> {
        self.sum_assured_grid
            .validate("sum_assured_grid", Tail::Unbounded)?;
        self.age_modifiers.validate("age_modifiers", Tail::Bounded)?;
        self.income_ratio.validate("income_ratio", Tail::Unbounded)?;
        if self.income_ratio.bands()[0].lower > Decimal::ZERO {
            return Err(RuleTableError::invalid(
                "income_ratio",
                "first band must start at 0",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// RATING RULES
// ============================================================================

/// Hard thresholds that decline a case outright
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeclineRules {
    pub min_age: u32,
    pub max_age: u32,
    /// Declined when BMI is strictly greater
    pub max_bmi: Decimal,
    /// Declined when HbA1c is strictly greater
    pub max_hba1c: Decimal,
    /// Declined when a current smoker's pack-years are strictly greater
    pub max_current_pack_years: Decimal,
}

/// Glycaemic control grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiabetesControl {
    Controlled,
    Suboptimal,
    Uncontrolled,
}

impl fmt::Display for DiabetesControl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DiabetesControl::Controlled => "controlled",
            DiabetesControl::Suboptimal => "suboptimal",
            DiabetesControl::Uncontrolled => "uncontrolled",
        };
        f.write_str(s)
    }
}

/// Disease duration grade
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiabetesDuration {
    Short,
    Long,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiabetesCell {
    pub control: DiabetesControl,
    pub duration: DiabetesDuration,
    pub loading_percent: u32,
}

/// Diabetes grading thresholds and the `(control, duration)` loading table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiabetesRules {
    /// Controlled when HbA1c is at or below
    pub controlled_max_hba1c: Decimal,
    /// Suboptimal when HbA1c is at or below, otherwise uncontrolled
    pub suboptimal_max_hba1c: Decimal,
    /// Long duration when years since diagnosis reach this value
    pub long_duration_years: Decimal,
    pub loadings: Vec<DiabetesCell>,
}

impl DiabetesRules {
    pub fn control(&self, hba1c: Decimal) -> DiabetesControl {
        if hba1c <= self.controlled_max_hba1c {
            DiabetesControl::Controlled
        } else if hba1c <= self.suboptimal_max_hba1c {
            DiabetesControl::Suboptimal
        } else {
            DiabetesControl::Uncontrolled
        }
    }

    pub fn duration(&self, years: Decimal) -> DiabetesDuration {
        if years < self.long_duration_years {
            DiabetesDuration::Short
        } else {
            DiabetesDuration::Long
        }
    }

    pub fn loading(&self, control: DiabetesControl, duration: DiabetesDuration) -> Option<u32> {
        self.loadings
            .iter()
            .find(|c| c.control == control && c.duration == duration)
            .map(|c| c.loading_percent)
    }

    fn validate(&self) -> Result<(), RuleTableError> {
        if self.controlled_max_hba1c >= self.suboptimal_max_hba1c {
            return Err(RuleTableError::invalid(
                "diabetes_loadings",
                "controlled HbA1c ceiling must be below the suboptimal ceiling",
            ));
        }
        for control in [DiabetesControl::Controlled, DiabetesControl::Suboptimal] {
            for duration in [DiabetesDuration::Short, DiabetesDuration::Long] {
                if self.loading(control, duration).is_none() {
                    return Err(RuleTableError::MissingCell {
                        table: "diabetes_loadings".to_string(),
                        key: format!("({control}, {duration:?})"),
                    });
                }
            }
        }
        Ok(())
    }
}

/// A blood-pressure threshold: fires when either component reaches its limit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BpThreshold {
    pub systolic: u32,
    pub diastolic: u32,
    pub loading_percent: u32,
}

impl BpThreshold {
    pub fn fires(&self, systolic: u32, diastolic: u32) -> bool {
        systolic >= self.systolic || diastolic >= self.diastolic
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BloodPressureRules {
    pub hypertension: BpThreshold,
    pub elevated: BpThreshold,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmokingRules {
    /// Current smokers below this many pack-years get the light loading
    pub light_max_pack_years: Decimal,
    pub current_light_loading: u32,
    pub current_heavy_loading: u32,
    /// Former smokers who quit less than this many years ago
    pub recent_quit_years: Decimal,
    pub recent_quit_loading: u32,
    pub ex_quit_years: Decimal,
    pub ex_quit_loading: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlcoholRules {
    pub regular_loading: u32,
}

/// Tables used by the rating engine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingRules {
    pub decline: DeclineRules,
    pub bmi_loadings: BandTable<HalfOpenBand<u32>>,
    pub diabetes: DiabetesRules,
    pub blood_pressure: BloodPressureRules,
    pub smoking: SmokingRules,
    pub alcohol: AlcoholRules,
    /// Loading per occupation class
    pub occupation_loadings: BandTable<InclusiveBand<u32>>,
}

impl RatingRules {
    pub fn standard() -> Result<Self, RuleTableError> {
        Ok(Self {
            decline: DeclineRules {
                min_age: 18,
                max_age: 65,
                max_bmi: dec!(40),
                max_hba1c: dec!(10),
                max_current_pack_years: dec!(30),
            },
            bmi_loadings: BandTable::new(
                "bmi_loadings",
                vec![
                    HalfOpenBand::new(dec!(0), dec!(18.5), 25),
                    HalfOpenBand::new(dec!(18.5), dec!(25), 0),
                    HalfOpenBand::new(dec!(25), dec!(30), 25),
                    HalfOpenBand::new(dec!(30), dec!(35), 50),
                    HalfOpenBand::open_ended(dec!(35), 100),
                ],
                Tail::Unbounded,
            )?,
            diabetes: DiabetesRules {
                controlled_max_hba1c: dec!(7),
                suboptimal_max_hba1c: dec!(8.5),
                long_duration_years: dec!(5),
                loadings: vec![
                    DiabetesCell {
                        control: DiabetesControl::Controlled,
                        duration: DiabetesDuration::Short,
                        loading_percent: 25,
                    },
                    DiabetesCell {
                        control: DiabetesControl::Controlled,
                        duration: DiabetesDuration::Long,
                        loading_percent: 50,
                    },
                    DiabetesCell {
                        control: DiabetesControl::Suboptimal,
                        duration: DiabetesDuration::Short,
                        loading_percent: 75,
                    },
                    DiabetesCell {
                        control: DiabetesControl::Suboptimal,
                        duration: DiabetesDuration::Long,
                        loading_percent: 100,
                    },
                ],
            },
            blood_pressure: BloodPressureRules {
                hypertension: BpThreshold {
                    systolic: 140,
                    diastolic: 90,
                    loading_percent: 50,
                },
                elevated: BpThreshold {
                    systolic: 130,
                    diastolic: 80,
                    loading_percent: 25,
                },
            },
            smoking: SmokingRules {
                light_max_pack_years: dec!(10),
                current_light_loading: 75,
                current_heavy_loading: 100,
                recent_quit_years: dec!(2),
                recent_quit_loading: 50,
                ex_quit_years: dec!(5),
                ex_quit_loading: 25,
            },
            alcohol: AlcoholRules { regular_loading: 25 },
            occupation_loadings: BandTable::new(
                "occupation_loadings",
                vec![
                    InclusiveBand::new(1, 2, 0),
                    InclusiveBand::new(3, 3, 25),
                    InclusiveBand::open_ended(4, 50),
                ],
                Tail::Unbounded,
            )?,
        })
    }

    fn normalize(&mut self) {
        self.bmi_loadings.normalize();
        self.occupation_loadings.normalize();
    }

    fn validate(&self) -> Result<(), RuleTableError> {
        if self.decline.min_age > self.decline.max_age {
            return Err(RuleTableError::invalid(
                "decline",
                format!(
                    "minimum age {} exceeds maximum age {}",
                    self.decline.min_age, self.decline.max_age
                ),
            ));
        }
        self.bmi_loadings.validate("bmi_loadings", Tail::Unbounded)?;
        self.occupation_loadings
            .validate("occupation_loadings", Tail::Unbounded)?;
        self.diabetes.validate()?;

        let bp = &self.blood_pressure;
        if bp.elevated.systolic > bp.hypertension.systolic
            || bp.elevated.diastolic > bp.hypertension.diastolic
        {
            return Err(RuleTableError::invalid(
                "blood_pressure",
                "elevated thresholds must not exceed hypertension thresholds",
            ));
        }
        if self.smoking.recent_quit_years > self.smoking.ex_quit_years {
            return Err(RuleTableError::invalid(
                "smoking",
                "recent-quit window must not exceed the ex-smoker window",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// BASE RATES
// ============================================================================

/// Base mortality rate per 1000 sum assured, by age
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BaseRateTable {
    pub bands: BandTable<InclusiveBand<Decimal>>,
    /// Used when the age is unknown or falls outside every band
    pub fallback_per_thousand: Decimal,
}

impl BaseRateTable {
    pub fn standard() -> Result<Self, RuleTableError> {
        Ok(Self {
            bands: BandTable::new(
                "base_rates",
                vec![
                    InclusiveBand::new(18, 25, dec!(1.20)),
                    InclusiveBand::new(26, 30, dec!(1.50)),
                    InclusiveBand::new(31, 35, dec!(1.90)),
                    InclusiveBand::new(36, 40, dec!(2.50)),
                    InclusiveBand::new(41, 45, dec!(3.30)),
                    InclusiveBand::new(46, 50, dec!(4.50)),
                    InclusiveBand::new(51, 55, dec!(6.20)),
                    InclusiveBand::new(56, 60, dec!(8.50)),
                    InclusiveBand::new(61, 65, dec!(11.80)),
                ],
                Tail::Bounded,
            )?,
            fallback_per_thousand: dec!(2.50),
        })
    }

    /// Rate for an age, and whether the fallback was used
    pub fn rate_for_age(&self, age: Option<u32>) -> (Decimal, bool) {
        match age.and_then(|a| self.bands.find(u64::from(a))) {
            Some(band) => (band.value, false),
            None => (self.fallback_per_thousand, true),
        }
    }

    fn validate(&self) -> Result<(), RuleTableError> {
        self.bands.validate("base_rates", Tail::Bounded)?;
        if let Some(band) = self.bands.bands().iter().find(|b| b.value < Decimal::ZERO) {
            return Err(RuleTableError::invalid(
                "base_rates",
                format!("negative rate {} for band {}", band.value, band.label()),
            ));
        }
        if self.fallback_per_thousand < Decimal::ZERO {
            return Err(RuleTableError::invalid(
                "base_rates",
                "fallback rate must not be negative",
            ));
        }
        Ok(())
    }
}

// ============================================================================
// RULE BOOK
// ============================================================================

/// Unvalidated rule book document as read from JSON
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleBookDocument {
    pub requirements: RequirementRules,
    pub rating: RatingRules,
    pub base_rates: BaseRateTable,
}

/// Validated, immutable rule tables
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RuleBookDocument")]
pub struct RuleBook {
    requirements: RequirementRules,
    rating: RatingRules,
    base_rates: BaseRateTable,
}

impl RuleBook {
    /// The built-in rule tables
    ///
    /// # Errors
    ///
    /// Only fails if the built-in tables are themselves inconsistent.
    pub fn standard() -> Result<Self, RuleTableError> {
        Self::try_from(RuleBookDocument {
            requirements: RequirementRules::standard()?,
            rating: RatingRules::standard()?,
            base_rates: BaseRateTable::standard()?,
        })
    }

    /// Parses and validates a JSON rule book
    pub fn from_json_str(json: &str) -> Result<Self, RuleTableError> {
        let document: RuleBookDocument =
            serde_json::from_str(json).map_err(|e| RuleTableError::Parse(e.to_string()))?;
        Self::try_from(document)
    }

    pub fn to_json_pretty(&self) -> Result<String, RuleTableError> {
        serde_json::to_string_pretty(self).map_err(|e| RuleTableError::Parse(e.to_string()))
    }

    pub fn requirements(&self) -> &RequirementRules {
        &self.requirements
    }

    pub fn rating(&self) -> &RatingRules {
        &self.rating
    }

    pub fn base_rates(&self) -> &BaseRateTable {
        &self.base_rates
    }
}

impl TryFrom<RuleBookDocument> for RuleBook {
    type Error = RuleTableError;

    fn try_from(mut document: RuleBookDocument) -> Result<Self, Self::Error> {
        document.requirements.normalize();
        document.rating.normalize();
        document.base_rates.bands.normalize();

        document.requirements.validate()?;
        document.rating.validate()?;
        document.base_rates.validate()?;

        tracing::debug!(
            sum_assured_slabs = document.requirements.sum_assured_grid.bands().len(),
            base_rate_bands = document.base_rates.bands.bands().len(),
            "rule book validated"
        );

        Ok(Self {
            requirements: document.requirements,
            rating: document.rating,
            base_rates: document.base_rates,
        })
    }
}
