//! Advisory port
//!
//! An advisor reads a case and returns a non-binding narrative. Its output
//! reaches the offer only as text and never alters the decision, loadings
//! or premium.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use crate::error::AdvisoryError;
use crate::evidence::{attested_number, SmokingStatus};
use crate::risk_case::RiskCase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AdvisorySource {
    Llm,
    Fallback,
}

/// Non-binding advisory output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Advisory {
    pub recommendation: String,
    pub evidence_cited: Vec<String>,
    /// In [0, 1]
    pub confidence: Decimal,
    pub conflicts_detected: Vec<String>,
    pub suggested_actions: Vec<String>,
    pub medical_summary: String,
    pub risk_narrative: String,
    pub source: AdvisorySource,
}

impl Advisory {
    /// Checks the fields an external advisor may get wrong
    pub fn validate(&self) -> Result<(), AdvisoryError> {
        if self.confidence < Decimal::ZERO || self.confidence > Decimal::ONE {
            return Err(AdvisoryError::Malformed(format!(
                "confidence {} outside [0, 1]",
                self.confidence
            )));
        }
        if self.recommendation.trim().is_empty() {
            return Err(AdvisoryError::Malformed("empty recommendation".to_string()));
        }
        Ok(())
    }

    /// Text carried on the offer
    pub fn offer_text(&self) -> String {
        let mut text = format!(
            "{} [{}; confidence {}%]",
            self.recommendation,
            self.risk_narrative,
            (self.confidence * dec!(100)).round()
        );
        if !self.conflicts_detected.is_empty() {
            text.push_str(&format!(
                " Conflicts: {}",
                self.conflicts_detected.join("; ")
            ));
        }
        text
    }
}

/// A source of advisory narratives, such as a language-model service
pub trait AdvisoryProvider: Send + Sync {
    /// Advises on a case without modifying it
    fn advise(&self, case: &RiskCase) -> Result<Advisory, AdvisoryError>;

    fn name(&self) -> &str;
}

/// Deterministic advisor used when no external provider answers
#[derive(Debug, Clone, Default)]
pub struct RuleBasedAdvisor;

impl RuleBasedAdvisor {
    pub const CONFIDENCE: Decimal = dec!(0.75);

    pub fn new() -> Self {
        Self
    }
}

impl AdvisoryProvider for RuleBasedAdvisor {
    fn advise(&self, case: &RiskCase) -> Result<Advisory, AdvisoryError> {
        let mut factors = Vec::new();

        if let Some(bmi) = case.medical().vitals.effective_bmi() {
            if bmi > dec!(30) {
                factors.push(format!("Elevated BMI ({bmi})"));
            }
        }
        if let Some(hba1c) = attested_number(&case.medical().diabetes.hba1c) {
            if hba1c > dec!(7) {
                factors.push(format!("Suboptimal diabetes control (HbA1c {hba1c}%)"));
            } else if hba1c > dec!(6.5) {
                factors.push(format!("Diabetic (HbA1c {hba1c}%)"));
            }
        }
        if case.lifestyle().smoking.status == SmokingStatus::Current {
            factors.push("Current smoker".to_string());
        }

        let (recommendation, narrative) = match factors.len() {
            0 => (
                "No significant risk factors identified. Standard terms may apply.",
                "low_risk",
            ),
            1..=2 => (
                "Some risk factors present. Consider loading or review.",
                "moderate_risk",
            ),
            _ => (
                "Multiple risk factors. Recommend underwriter review.",
                "high_risk",
            ),
        };

        Ok(Advisory {
            recommendation: recommendation.to_string(),
            medical_summary: format!("Profile shows {} risk factor(s).", factors.len()),
            evidence_cited: factors,
            confidence: Self::CONFIDENCE,
            conflicts_detected: Vec::new(),
            suggested_actions: Vec::new(),
            risk_narrative: narrative.to_string(),
            source: AdvisorySource::Fallback,
        })
    }

    fn name(&self) -> &str {
        "RuleBasedAdvisor"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audit::Actor;
    use crate::evidence::LifestyleEvidence;
    use crate::risk_case::EvidenceUpdate;

    #[test]
    fn test_clean_case_is_low_risk() {
        let advisory = RuleBasedAdvisor::new().advise(&RiskCase::new()).unwrap();
        assert_eq!(advisory.risk_narrative, "low_risk");
        assert_eq!(advisory.confidence, dec!(0.75));
        assert_eq!(advisory.source, AdvisorySource::Fallback);
        assert!(advisory.validate().is_ok());
    }

    #[test]
    fn test_current_smoker_is_moderate_risk() {
        let mut case = RiskCase::new();
        let mut lifestyle = LifestyleEvidence::default();
        lifestyle.smoking.status = SmokingStatus::Current;
        case.record_evidence(EvidenceUpdate::Lifestyle(lifestyle), Actor::System, "Test", "");

        let advisory = RuleBasedAdvisor::new().advise(&case).unwrap();
        assert_eq!(advisory.evidence_cited, vec!["Current smoker".to_string()]);
        assert_eq!(advisory.risk_narrative, "moderate_risk");
    }

    #[test]
    fn test_out_of_range_confidence_is_malformed() {
        let mut advisory = RuleBasedAdvisor::new().advise(&RiskCase::new()).unwrap();
        advisory.confidence = dec!(1.2);
        assert!(matches!(advisory.validate(), Err(AdvisoryError::Malformed(_))));
    }

    #[test]
    fn test_offer_text_mentions_narrative_and_confidence() {
        let advisory = RuleBasedAdvisor::new().advise(&RiskCase::new()).unwrap();
        let text = advisory.offer_text();
        assert!(text.contains("low_risk"));
        assert!(text.contains("confidence 75%"));
    }
}
