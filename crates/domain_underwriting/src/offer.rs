//! Offer Constructor
//!
//! Prices an approved rating:
//!
//! ```text
//! base_premium   = (sum_assured / 1000) × base_rate(age)
//! loaded_premium = base_premium × (1 + total_loading_percent / 100)
//! ```
//!
//! DECLINE and REFER offers carry zero pricing. An offer is always
//! reconstructible from the case's proposal, the rating result and the
//! base-rate table.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};

use core_kernel::{CaseId, Currency, Money, ProposalId, Rate};

use crate::audit::{Actor, AuditAction, AuditRecord};
use crate::error::UnderwritingError;
use crate::rating::{DecisionType, ExclusionReason, LoadingReason, RatingResult, RiskClass};
use crate::risk_case::{PricingBasis, RiskCase};
use crate::rules::RuleBook;

const COMPONENT: &str = "OfferConstructor";

/// Final underwriting offer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderwritingOffer {
    pub case_id: CaseId,
    pub proposal_id: Option<ProposalId>,
    pub decision: DecisionType,
    pub risk_class: RiskClass,
    pub sum_assured: Option<Money>,
    pub base_rate_per_thousand: Decimal,
    /// True when the applicant's age matched no base-rate band
    pub fallback_rate_applied: bool,
    pub base_premium_annual: Money,
    pub total_loading_percent: u32,
    pub loaded_premium_annual: Money,
    pub loadings: Vec<LoadingReason>,
    pub exclusions: Vec<ExclusionReason>,
    pub decline_reasons: Vec<String>,
    pub refer_reasons: Vec<String>,
    pub reasoning: String,
    /// Non-binding advisory narrative
    pub advisory_text: Option<String>,
    pub constructed_at: DateTime<Utc>,
}

impl UnderwritingOffer {
    pub fn is_priced(&self) -> bool {
        self.decision.is_approval() && self.base_premium_annual.is_positive()
    }
}

impl fmt::Display for UnderwritingOffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Case:           {}", self.case_id)?;
        writeln!(f, "Decision:       {}", self.decision)?;
        writeln!(f, "Risk class:     {}", self.risk_class)?;
        if let Some(sum_assured) = &self.sum_assured {
            writeln!(f, "Sum assured:    {sum_assured}")?;
        }
        if self.decision.is_approval() {
            writeln!(
                f,
                "Base rate:      {} per 1000{}",
                self.base_rate_per_thousand,
                if self.fallback_rate_applied { " (fallback)" } else { "" }
            )?;
            writeln!(f, "Base premium:   {}", self.base_premium_annual)?;
            writeln!(f, "Total loading:  {}%", self.total_loading_percent)?;
            writeln!(f, "Final premium:  {}", self.loaded_premium_annual)?;
        }
        for loading in &self.loadings {
            writeln!(
                f,
                "  + {} {}%: {}",
                loading.condition, loading.loading_percent, loading.reason
            )?;
        }
        for exclusion in &self.exclusions {
            writeln!(
                f,
                "  x {} ({}): {}",
                exclusion.condition, exclusion.duration, exclusion.exclusion_text
            )?;
        }
        for reason in &self.decline_reasons {
            writeln!(f, "  DECLINE: {reason}")?;
        }
        for reason in &self.refer_reasons {
            writeln!(f, "  REFER: {reason}")?;
        }
        writeln!(f, "Reasoning:      {}", self.reasoning)?;
        if let Some(advisory) = &self.advisory_text {
            writeln!(f, "Advisory:       {advisory}")?;
        }
        Ok(())
    }
}

/// Builds priced offers from rating results
#[derive(Debug, Clone)]
pub struct OfferConstructor {
    rules: Arc<RuleBook>,
}

impl OfferConstructor {
    pub fn new(rules: Arc<RuleBook>) -> Self {
        Self { rules }
    }

    /// Builds the offer and, for approvals, stores the pricing basis on the
    /// case
    ///
    /// # Errors
    ///
    /// Returns [`UnderwritingError::Money`] if premium arithmetic overflows.
    #[tracing::instrument(skip_all, fields(case_id = %case.id(), decision = %rating.decision))]
    pub fn construct(
        &self,
        case: &mut RiskCase,
        rating: &RatingResult,
        advisory_text: Option<String>,
    ) -> Result<UnderwritingOffer, UnderwritingError> {
        let proposal = case.proposal();
        let sum_assured = proposal.map(|p| p.sum_assured);
        let proposal_id = proposal.map(|p| p.proposal_id);
        let currency = sum_assured.map(|m| m.currency()).unwrap_or(Currency::INR);
        let (rate, fallback_rate_applied) = self.rules.base_rates().rate_for_age(case.age());

        let mut base_premium = Money::zero(currency);
        let mut loaded_premium = Money::zero(currency);
        let mut base_rate = Decimal::ZERO;

        match (rating.decision.is_approval(), sum_assured) {
            (true, Some(sum_assured)) => {
                if fallback_rate_applied {
                    tracing::warn!(age = ?case.age(), rate = %rate, "age outside base-rate bands, fallback rate applied");
                }
                base_rate = rate;
                base_premium = sum_assured
                    .divide(dec!(1000))?
                    .checked_mul(rate)?
                    .round_to_currency();
                loaded_premium = Rate::from_percentage(Decimal::from(rating.total_loading_percent))
                    .load(&base_premium)?
                    .round_to_currency();

                case.set_pricing_basis(
                    PricingBasis {
                        base_rate_per_thousand: rate,
                        base_premium_annual: base_premium,
                        total_loading_percent: rating.total_loading_percent,
                        loaded_premium_annual: loaded_premium,
                        exclusions: rating
                            .exclusions
                            .iter()
                            .map(|e| e.exclusion_text.clone())
                            .collect(),
                        risk_class: rating.risk_class,
                    },
                    COMPONENT,
                );
            }
            (true, None) => {
                tracing::warn!("approved case has no proposal, offer left unpriced");
            }
            (false, _) => {}
        }

        let offer = UnderwritingOffer {
            case_id: case.id(),
            proposal_id,
            decision: rating.decision,
            risk_class: rating.risk_class,
            sum_assured,
            base_rate_per_thousand: base_rate,
            fallback_rate_applied: fallback_rate_applied && rating.decision.is_approval(),
            base_premium_annual: base_premium,
            total_loading_percent: rating.total_loading_percent,
            loaded_premium_annual: loaded_premium,
            loadings: rating.loadings.clone(),
            exclusions: rating.exclusions.clone(),
            decline_reasons: rating.decline_reasons.clone(),
            refer_reasons: rating.refer_reasons.clone(),
            reasoning: rating.reasoning.clone(),
            advisory_text,
            constructed_at: Utc::now(),
        };

        case.log_audit(
            AuditRecord::new(AuditAction::OfferConstructed, Actor::System, COMPONENT)
                .new_value(format!(
                    "{}|{}",
                    offer.decision, offer.loaded_premium_annual
                ))
                .reason(offer.reasoning.clone()),
        );
        tracing::info!(
            base_premium = %offer.base_premium_annual,
            loaded_premium = %offer.loaded_premium_annual,
            "offer constructed"
        );
        Ok(offer)
    }
}
