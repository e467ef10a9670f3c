//! Deterministic Rating Engine
//!
//! Rates a case from its evidence and the rule book alone. The engine never
//! consults the advisory layer and keeps no state between calls, so rating
//! an unmodified case twice yields the same [`RatingResult`].
//!
//! Evaluation is a single pass:
//!
//! 1. Auto-decline gate. Any hard threshold short-circuits to `DECLINE`.
//! 2. Loadings for BMI, diabetes, blood pressure, smoking, alcohol and
//!    occupation, summed without capping.
//! 3. Risk class from total loading.
//! 4. Exclusions.
//! 5. Refer override.
//! 6. Approval variant.

use std::fmt;
use std::sync::Arc;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::audit::{Actor, AuditAction, AuditRecord};
use crate::error::UnderwritingError;
use crate::evidence::{attested_number, AlcoholStatus, BmiCategory, SmokingStatus};
use crate::risk_case::RiskCase;
use crate::rules::{DiabetesControl, RuleBook};

const COMPONENT: &str = "DeterministicRatingEngine";

/// Total loading above which a case is referred
pub const AUTO_APPROVE_LOADING_LIMIT: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DecisionType {
    Approve,
    ApproveWithLoading,
    ApproveWithExclusion,
    Decline,
    Refer,
}

impl DecisionType {
    /// Whether this decision issues a priced offer
    pub fn is_approval(&self) -> bool {
        matches!(
            self,
            DecisionType::Approve
                | DecisionType::ApproveWithLoading
                | DecisionType::ApproveWithExclusion
        )
    }
}

impl fmt::Display for DecisionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            DecisionType::Approve => "APPROVE",
            DecisionType::ApproveWithLoading => "APPROVE_WITH_LOADING",
            DecisionType::ApproveWithExclusion => "APPROVE_WITH_EXCLUSION",
            DecisionType::Decline => "DECLINE",
            DecisionType::Refer => "REFER",
        };
        f.write_str(s)
    }
}

/// Aggregate underwriting tier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskClass {
    #[serde(rename = "PREFERRED")]
    Preferred,
    #[serde(rename = "STANDARD")]
    Standard,
    #[serde(rename = "SUBSTANDARD_1")]
    Substandard1,
    #[serde(rename = "SUBSTANDARD_2")]
    Substandard2,
    #[serde(rename = "SUBSTANDARD_3")]
    Substandard3,
    #[serde(rename = "SUBSTANDARD_4")]
    Substandard4,
    #[serde(rename = "DECLINE")]
    Decline,
}

impl RiskClass {
    /// Maps total loading to a tier: 0, ≤25, ≤50, ≤75, ≤100, >100
    pub fn from_total_loading(total_loading_percent: u32) -> Self {
        match total_loading_percent {
            0 => RiskClass::Preferred,
            1..=25 => RiskClass::Standard,
            26..=50 => RiskClass::Substandard1,
            51..=75 => RiskClass::Substandard2,
            76..=100 => RiskClass::Substandard3,
            _ => RiskClass::Substandard4,
        }
    }
}

impl fmt::Display for RiskClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RiskClass::Preferred => "PREFERRED",
            RiskClass::Standard => "STANDARD",
            RiskClass::Substandard1 => "SUBSTANDARD_1",
            RiskClass::Substandard2 => "SUBSTANDARD_2",
            RiskClass::Substandard3 => "SUBSTANDARD_3",
            RiskClass::Substandard4 => "SUBSTANDARD_4",
            RiskClass::Decline => "DECLINE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LoadingCategory {
    Medical,
    Lifestyle,
    Occupation,
}

/// One loading tied to the condition and evidence that fired it
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadingReason {
    pub category: LoadingCategory,
    /// e.g. `BMI_Obese`, `Diabetes`, `Hypertension`, `Smoking`
    pub condition: String,
    /// Evidence path the rule read, e.g. `medical.diabetes.hba1c`
    pub evidence_field: String,
    pub loading_percent: u32,
    pub reason: String,
    pub evidence_ref: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionReason {
    pub condition: String,
    pub evidence_field: String,
    pub exclusion_text: String,
    /// `Permanent` or a period such as `5 years`
    pub duration: String,
    pub reason: String,
}

/// Outcome of rating a case
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingResult {
    pub decision: DecisionType,
    pub risk_class: RiskClass,
    pub loadings: Vec<LoadingReason>,
    pub total_loading_percent: u32,
    pub exclusions: Vec<ExclusionReason>,
    pub decline_reasons: Vec<String>,
    pub refer_reasons: Vec<String>,
    pub reasoning: String,
}

impl RatingResult {
    fn declined(decline_reasons: Vec<String>) -> Self {
        let reasoning = format!("Declined due to: {}", decline_reasons.join(", "));
        Self {
            decision: DecisionType::Decline,
            risk_class: RiskClass::Decline,
            loadings: Vec::new(),
            total_loading_percent: 0,
            exclusions: Vec::new(),
            decline_reasons,
            refer_reasons: Vec::new(),
            reasoning,
        }
    }

    /// REFER produced when evaluation itself fails
    ///
    /// No loading was computed, so the class is the one for a zero total.
    fn system_refer(error: &UnderwritingError) -> Self {
        let reason = format!("System error during rating: {error}");
        Self {
            decision: DecisionType::Refer,
            risk_class: RiskClass::from_total_loading(0),
            loadings: Vec::new(),
            total_loading_percent: 0,
            exclusions: Vec::new(),
            decline_reasons: Vec::new(),
            reasoning: format!("Referred for manual review: {reason}"),
            refer_reasons: vec![reason],
        }
    }

    /// `DECISION|CLASS|total%`, as recorded in the audit trail
    pub fn audit_value(&self) -> String {
        format!(
            "{}|{}|{}%",
            self.decision, self.risk_class, self.total_loading_percent
        )
    }
}

/// Rates cases against a validated rule book
#[derive(Debug, Clone)]
pub struct RatingEngine {
    rules: Arc<RuleBook>,
}

impl RatingEngine {
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self { rules }
    }

    /// Rates the case and appends one `RATING_COMPLETED` audit entry
    ///
    /// Never fails: an evaluation error becomes a REFER carrying a system
    /// reason.
    #[tracing::instrument(skip_all, fields(case_id = %case.id()))]
    pub fn rate(&self, case: &mut RiskCase) -> RatingResult {
        let result = match self.evaluate(case) {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(%error, "rating failed, referring case");
                RatingResult::system_refer(&error)
            }
        };

        let evidence: Vec<String> = result
            .loadings
            .iter()
            .filter_map(|l| l.evidence_ref.clone())
            .collect();
        case.log_audit(
            AuditRecord::new(AuditAction::RatingCompleted, Actor::System, COMPONENT)
                .new_value(result.audit_value())
                .evidence(evidence)
                .reason(result.reasoning.clone()),
        );

        tracing::info!(
            decision = %result.decision,
            risk_class = %result.risk_class,
            total_loading_percent = result.total_loading_percent,
            "rating completed"
        );
        result
    }

    /// Pure evaluation of the case against the rule book
    pub fn evaluate(&self, case: &RiskCase) -> Result<RatingResult, UnderwritingError> {
        let decline_reasons = self.decline_reasons(case);
        if !decline_reasons.is_empty() {
            return Ok(RatingResult::declined(decline_reasons));
        }

        let mut loadings = Vec::new();
        loadings.extend(self.bmi_loading(case));
        loadings.extend(self.diabetes_loading(case)?);
        loadings.extend(self.blood_pressure_loading(case));
        loadings.extend(self.smoking_loading(case));
        loadings.extend(self.alcohol_loading(case));
        loadings.extend(self.occupation_loading(case));

        let total_loading_percent = loadings.iter().try_fold(0u32, |total, l| {
            total
                .checked_add(l.loading_percent)
                .ok_or(UnderwritingError::Overflow("total loading"))
        })?;
        let risk_class = RiskClass::from_total_loading(total_loading_percent);
        let exclusions = self.exclusions(case);

        let mut override_reasons = Vec::new();
        if total_loading_percent > AUTO_APPROVE_LOADING_LIMIT {
            override_reasons.push(format!(
                "Total loading {total_loading_percent}% exceeds auto-approve threshold"
            ));
        }
        if case.medical().diabetes.has_complications {
            override_reasons.push("Diabetic complications require underwriter review".to_string());
        }
        if case.medical().cardiac.ecg_abnormal {
            override_reasons.push("Abnormal ECG requires underwriter review".to_string());
        }

        let (decision, reasoning) = if !override_reasons.is_empty() {
            (
                DecisionType::Refer,
                format!("Referred for manual review: {}", override_reasons.join(", ")),
            )
        } else if !loadings.is_empty() {
            let conditions: Vec<&str> = loadings.iter().map(|l| l.condition.as_str()).collect();
            let mut text = format!(
                "Approved with {total_loading_percent}% loading. Loadings for: {}",
                conditions.join(", ")
            );
            if !exclusions.is_empty() {
                let excluded: Vec<&str> = exclusions.iter().map(|e| e.condition.as_str()).collect();
                text.push_str(&format!(". Exclusions: {}", excluded.join(", ")));
            }
            (DecisionType::ApproveWithLoading, text)
        } else if !exclusions.is_empty() {
            let excluded: Vec<&str> = exclusions.iter().map(|e| e.condition.as_str()).collect();
            (
                DecisionType::ApproveWithExclusion,
                format!("Approved with exclusions: {}", excluded.join(", ")),
            )
        } else {
            (
                DecisionType::Approve,
                "Standard risk, no significant loadings.".to_string(),
            )
        };

        Ok(RatingResult {
            decision,
            risk_class,
            loadings,
            total_loading_percent,
            exclusions,
            decline_reasons: Vec::new(),
            refer_reasons: override_reasons,
            reasoning,
        })
    }

    fn decline_reasons(&self, case: &RiskCase) -> Vec<String> {
        let rules = &self.rules.rating().decline;
        let mut reasons = Vec::new();

        match case.age() {
            Some(age) if age < rules.min_age => {
                reasons.push(format!("Age {age} below minimum ({})", rules.min_age))
            }
            Some(age) if age > rules.max_age => {
                reasons.push(format!("Age {age} above maximum ({})", rules.max_age))
            }
            Some(_) => {}
            None => tracing::debug!("no applicant age, age gate skipped"),
        }

        if let Some(bmi) = case.medical().vitals.effective_bmi() {
            if bmi > rules.max_bmi {
                reasons.push(format!("BMI {bmi} indicates morbid obesity"));
            }
        }

        if let Some(hba1c) = attested_number(&case.medical().diabetes.hba1c) {
            if hba1c > rules.max_hba1c {
                reasons.push(format!(
                    "HbA1c {hba1c}% indicates severe uncontrolled diabetes"
                ));
            }
        }

        let lifestyle = case.lifestyle();
        if lifestyle.alcohol.status == AlcoholStatus::Heavy {
            reasons.push("Heavy alcohol consumption".to_string());
        }

        if lifestyle.smoking.status == SmokingStatus::Current
            && lifestyle
                .smoking
                .pack_years
                .is_some_and(|p| p > rules.max_current_pack_years)
        {
            reasons.push(format!(
                "Heavy smoking history (>{} pack-years)",
                rules.max_current_pack_years.normalize()
            ));
        }

        reasons
    }

    fn bmi_loading(&self, case: &RiskCase) -> Option<LoadingReason> {
        let vitals = &case.medical().vitals;
        let Some(bmi) = vitals.effective_bmi() else {
            tracing::debug!("no attested BMI, BMI loading skipped");
            return None;
        };
        let band = self.rules.rating().bmi_loadings.find(bmi)?;
        if band.value == 0 {
            return None;
        }
        let category = BmiCategory::from_bmi(bmi).label();
        let evidence_ref = vitals
            .bmi
            .as_ref()
            .and_then(|v| v.document_ref())
            .or_else(|| vitals.weight_kg.as_ref().and_then(|v| v.document_ref()))
            .map(str::to_string);
        Some(LoadingReason {
            category: LoadingCategory::Medical,
            condition: format!("BMI_{category}"),
            evidence_field: "medical.vitals.bmi".to_string(),
            loading_percent: band.value,
            reason: format!("BMI {bmi:.1} in category {category}"),
            evidence_ref,
        })
    }

    fn diabetes_loading(&self, case: &RiskCase) -> Result<Option<LoadingReason>, UnderwritingError> {
        let diabetes = &case.medical().diabetes;
        let Some(hba1c) = attested_number(&diabetes.hba1c) else {
            tracing::debug!("no attested HbA1c, diabetes loading skipped");
            return Ok(None);
        };
        let rules = &self.rules.rating().diabetes;
        let control = rules.control(hba1c);
        // Above the suboptimal limit the grid has no cell; the decline gate owns > 10
        if control == DiabetesControl::Uncontrolled {
            tracing::debug!(%hba1c, "uncontrolled HbA1c below decline limit, no loading");
            return Ok(None);
        }

        let duration_years = diabetes.duration_years.unwrap_or(Decimal::ZERO);
        let duration = rules.duration(duration_years);
        let loading_percent = rules.loading(control, duration).ok_or_else(|| {
            crate::error::RuleTableError::MissingCell {
                table: "diabetes_loadings".to_string(),
                key: format!("({control}, {duration:?})"),
            }
        })?;
        if loading_percent == 0 {
            return Ok(None);
        }

        Ok(Some(LoadingReason {
            category: LoadingCategory::Medical,
            condition: "Diabetes".to_string(),
            evidence_field: "medical.diabetes.hba1c".to_string(),
            loading_percent,
            reason: format!(
                "HbA1c {hba1c}%, {control} control, {:.0} years duration",
                duration_years
            ),
            evidence_ref: diabetes
                .hba1c
                .as_ref()
                .and_then(|v| v.document_ref())
                .map(str::to_string),
        }))
    }

    fn blood_pressure_loading(&self, case: &RiskCase) -> Option<LoadingReason> {
        let Some(reading) = case.medical().vitals.latest_bp() else {
            tracing::debug!("no attested BP reading, BP loading skipped");
            return None;
        };
        let rules = &self.rules.rating().blood_pressure;
        let (s, d) = (reading.systolic, reading.diastolic);
        let (condition, threshold, reason) = if rules.hypertension.fires(s, d) {
            ("Hypertension", &rules.hypertension, format!("BP {s}/{d} indicates hypertension"))
        } else if rules.elevated.fires(s, d) {
            ("Elevated_BP", &rules.elevated, format!("BP {s}/{d} is elevated"))
        } else {
            return None;
        };
        if threshold.loading_percent == 0 {
            return None;
        }
        Some(LoadingReason {
            category: LoadingCategory::Medical,
            condition: condition.to_string(),
            evidence_field: "medical.vitals.bp_readings".to_string(),
            loading_percent: threshold.loading_percent,
            reason,
            evidence_ref: reading
                .metadata
                .as_ref()
                .map(|m| m.source_document_id.clone()),
        })
    }

    fn smoking_loading(&self, case: &RiskCase) -> Option<LoadingReason> {
        let smoking = &case.lifestyle().smoking;
        let rules = &self.rules.rating().smoking;
        let (condition, loading_percent, reason) = match smoking.status {
            SmokingStatus::Never => return None,
            SmokingStatus::Current => {
                let light = smoking
                    .pack_years
                    .is_some_and(|p| p < rules.light_max_pack_years);
                let loading = if light {
                    rules.current_light_loading
                } else {
                    rules.current_heavy_loading
                };
                let pack_years = smoking
                    .pack_years
                    .map(|p| p.normalize().to_string())
                    .unwrap_or_else(|| "unknown".to_string());
                (
                    "Smoking",
                    loading,
                    format!("Current smoker, {pack_years} pack-years"),
                )
            }
            SmokingStatus::Former => {
                let Some(years) = smoking.years_since_quit else {
                    tracing::debug!("former smoker without quit period, no loading");
                    return None;
                };
                let reason = format!("Quit {years:.1} years ago");
                if years < rules.recent_quit_years {
                    ("Recent_Ex_Smoker", rules.recent_quit_loading, reason)
                } else if years < rules.ex_quit_years {
                    ("Ex_Smoker", rules.ex_quit_loading, reason)
                } else {
                    return None;
                }
            }
        };
        if loading_percent == 0 {
            return None;
        }
        Some(LoadingReason {
            category: LoadingCategory::Lifestyle,
            condition: condition.to_string(),
            evidence_field: "lifestyle.smoking".to_string(),
            loading_percent,
            reason,
            evidence_ref: None,
        })
    }

    fn alcohol_loading(&self, case: &RiskCase) -> Option<LoadingReason> {
        let alcohol = &case.lifestyle().alcohol;
        let loading_percent = self.rules.rating().alcohol.regular_loading;
        if alcohol.status != AlcoholStatus::Regular || loading_percent == 0 {
            return None;
        }
        let units = alcohol
            .units_per_week
            .map(|u| u.normalize().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        Some(LoadingReason {
            category: LoadingCategory::Lifestyle,
            condition: "Regular_Alcohol".to_string(),
            evidence_field: "lifestyle.alcohol".to_string(),
            loading_percent,
            reason: format!("Regular alcohol consumption, {units} units/week"),
            evidence_ref: None,
        })
    }

    fn occupation_loading(&self, case: &RiskCase) -> Option<LoadingReason> {
        let occupation = &case.lifestyle().occupation;
        let class = occupation.occupation_class;
        let band = self
            .rules
            .rating()
            .occupation_loadings
            .find(u64::from(class))?;
        if band.value == 0 {
            return None;
        }
        Some(LoadingReason {
            category: LoadingCategory::Occupation,
            condition: format!("Occupation_Class_{class}"),
            evidence_field: "lifestyle.occupation.occupation_class".to_string(),
            loading_percent: band.value,
            reason: format!("Occupation: {}, Class {class}", occupation.occupation),
            evidence_ref: None,
        })
    }

    fn exclusions(&self, case: &RiskCase) -> Vec<ExclusionReason> {
        let mut exclusions = Vec::new();
        if case.medical().diabetes.has_complications {
            exclusions.push(ExclusionReason {
                condition: "Diabetes_Complications".to_string(),
                evidence_field: "medical.diabetes.complications".to_string(),
                exclusion_text: "Claims related to diabetic complications excluded".to_string(),
                duration: "Permanent".to_string(),
                reason: "Pre-existing diabetic complications disclosed".to_string(),
            });
        }
        exclusions
    }
}
