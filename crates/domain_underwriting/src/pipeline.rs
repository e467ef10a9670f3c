//! Underwriting pipeline
//!
//! Runs one case through requirement determination, rating, advisory and
//! offer construction, and moves it to its terminal status. A pipeline is
//! immutable once built and may be shared between workers; each run owns
//! its case exclusively.

use std::sync::Arc;

use crate::advisory::{Advisory, AdvisoryProvider, AdvisorySource, RuleBasedAdvisor};
use crate::audit::{Actor, AuditAction, AuditRecord};
use crate::error::UnderwritingError;
use crate::offer::{OfferConstructor, UnderwritingOffer};
use crate::rating::{DecisionType, RatingEngine, RatingResult};
use crate::requirement::RequirementSet;
use crate::requirement_engine::RequirementEngine;
use crate::risk_case::{CaseStatus, RiskCase};
use crate::rules::RuleBook;

const COMPONENT: &str = "UnderwritingPipeline";

/// Everything produced by one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOutcome {
    pub requirements: RequirementSet,
    pub rating: RatingResult,
    pub advisory: Option<Advisory>,
    pub offer: UnderwritingOffer,
}

pub struct UnderwritingPipeline {
    requirement_engine: RequirementEngine,
    rating_engine: RatingEngine,
    offer_constructor: OfferConstructor,
    advisor: Option<Box<dyn AdvisoryProvider>>,
    fallback_advisor: RuleBasedAdvisor,
}

impl UnderwritingPipeline {
    /// Builds a pipeline with the rule-based advisor only
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self {
            requirement_engine: RequirementEngine::new(Arc::clone(&rules)),
            rating_engine: RatingEngine::new(Arc::clone(&rules)),
            offer_constructor: OfferConstructor::new(rules),
            advisor: None,
            fallback_advisor: RuleBasedAdvisor::new(),
        }
    }

    /// Consults `advisor` first, falling back to the rule-based advisor
    /// when it errors
    pub fn with_advisor(mut self, advisor: Box<dyn AdvisoryProvider>) -> Self {
        self.advisor = Some(advisor);
        self
    }

    /// Runs the case end to end
    ///
    /// # Errors
    ///
    /// Fails without touching the case if it is already in a terminal
    /// status, and propagates premium arithmetic errors.
    #[tracing::instrument(skip_all, fields(case_id = %case.id()))]
    pub fn process(&self, case: &mut RiskCase) -> Result<PipelineOutcome, UnderwritingError> {
        if case.status().is_terminal() {
            return Err(UnderwritingError::InvalidStatusTransition {
                from: case.status(),
                to: CaseStatus::UnderReview,
            });
        }

        case.log_audit(AuditRecord::new(
            AuditAction::PipelineStarted,
            Actor::System,
            COMPONENT,
        ));

        let requirements = self.requirement_engine.determine(case);
        case.transition_status(
            CaseStatus::UnderReview,
            Actor::System,
            COMPONENT,
            format!("{} requirements determined", requirements.total_count()),
        )?;

        let rating = self.rating_engine.rate(case);
        let advisory = self.advise(case);
        let offer = self.offer_constructor.construct(
            case,
            &rating,
            advisory.as_ref().map(Advisory::offer_text),
        )?;

        let terminal = match rating.decision {
            DecisionType::Approve
            | DecisionType::ApproveWithLoading
            | DecisionType::ApproveWithExclusion => CaseStatus::Approved,
            DecisionType::Decline => CaseStatus::Declined,
            DecisionType::Refer => CaseStatus::Referred,
        };
        case.transition_status(terminal, Actor::System, COMPONENT, rating.reasoning.clone())?;

        case.log_audit(
            AuditRecord::new(AuditAction::PipelineCompleted, Actor::System, COMPONENT)
                .new_value(offer.decision.to_string())
                .reason(offer.reasoning.clone()),
        );

        tracing::info!(
            decision = %offer.decision,
            status = %case.status(),
            audit_entries = case.audit_trail().len(),
            "pipeline completed"
        );

        Ok(PipelineOutcome {
            requirements,
            rating,
            advisory,
            offer,
        })
    }

    /// Consults the configured advisor, falling back on error
    fn advise(&self, case: &mut RiskCase) -> Option<Advisory> {
        let fallback_reason = match &self.advisor {
            Some(advisor) => {
                match advisor
                    .advise(case)
                    .and_then(|advisory| advisory.validate().map(|_| advisory))
                {
                    Ok(advisory) => {
                        let actor = match advisory.source {
                            AdvisorySource::Llm => Actor::Llm,
                            AdvisorySource::Fallback => Actor::System,
                        };
                        case.log_audit(
                            AuditRecord::new(AuditAction::AdvisoryReceived, actor, advisor.name())
                                .new_value(advisory.risk_narrative.clone())
                                .reason(advisory.recommendation.clone()),
                        );
                        return Some(advisory);
                    }
                    Err(error) => {
                        tracing::warn!(advisor = advisor.name(), %error, "advisor failed, using fallback");
                        format!("{} unavailable ({error}), using rule-based fallback", advisor.name())
                    }
                }
            }
            None => "No advisory provider configured, using rule-based fallback".to_string(),
        };

        match self.fallback_advisor.advise(case) {
            Ok(advisory) => {
                case.log_audit(
                    AuditRecord::new(
                        AuditAction::AdvisoryFallback,
                        Actor::System,
                        self.fallback_advisor.name(),
                    )
                    .new_value(advisory.risk_narrative.clone())
                    .reason(fallback_reason),
                );
                Some(advisory)
            }
            Err(error) => {
                tracing::error!(%error, "fallback advisor failed, offer carries no advisory");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AdvisoryError;

    struct OfflineAdvisor;

    impl AdvisoryProvider for OfflineAdvisor {
        fn advise(&self, _case: &RiskCase) -> Result<Advisory, AdvisoryError> {
            Err(AdvisoryError::Unavailable("connection refused".to_string()))
        }

        fn name(&self) -> &str {
            "OfflineAdvisor"
        }
    }

    fn pipeline() -> UnderwritingPipeline {
        UnderwritingPipeline::new(Arc::new(RuleBook::standard().unwrap()))
    }

    #[test]
    fn test_terminal_case_is_rejected_untouched() {
        let mut case = RiskCase::new();
        case.transition_status(CaseStatus::Withdrawn, Actor::Human, "Underwriter", "withdrawn")
            .unwrap();
        let before = case.audit_trail().len();

        assert!(pipeline().process(&mut case).is_err());
        assert_eq!(case.audit_trail().len(), before);
    }

    #[test]
    fn test_failing_advisor_falls_back() {
        let pipeline = pipeline().with_advisor(Box::new(OfflineAdvisor));
        let mut case = RiskCase::new();
        let outcome = pipeline.process(&mut case).unwrap();

        let advisory = outcome.advisory.unwrap();
        assert_eq!(advisory.source, AdvisorySource::Fallback);
        let fallback = case
            .audit_trail()
            .with_action(&AuditAction::AdvisoryFallback)
            .next()
            .unwrap();
        assert!(fallback.reason.contains("OfflineAdvisor unavailable"));
    }

    #[test]
    fn test_trail_is_bracketed_by_pipeline_entries() {
        let mut case = RiskCase::new();
        pipeline().process(&mut case).unwrap();

        let entries = case.audit_trail().entries();
        assert_eq!(entries.first().unwrap().action, AuditAction::PipelineStarted);
        assert_eq!(entries.last().unwrap().action, AuditAction::PipelineCompleted);
        assert_eq!(case.status(), CaseStatus::Approved);
    }
}
