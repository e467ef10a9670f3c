//! Underwriting Domain
//!
//! This crate implements the automated underwriting core for individual
//! term-life proposals. Every decision is deterministic and driven by
//! declarative rule tables; every change to a case is recorded on its
//! append-only audit trail.
//!
//! # Architecture
//!
//! - **Aggregate**: [`RiskCase`] owns all evidence, requirements, pricing
//!   and the audit trail for one applicant
//! - **Value Objects**: attested evidence values, requirement sets, rating
//!   results and offers
//! - **Domain Services**: [`RequirementEngine`], [`RatingEngine`],
//!   [`OfferConstructor`], composed by [`UnderwritingPipeline`]
//! - **Ports**: [`AdvisoryProvider`] for non-binding narrative advice
//!
//! # Case Lifecycle
//!
//! ```text
//! Draft -> UnderReview -> Approved
//!                     \-> Declined
//!                     \-> Referred
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use domain_underwriting::{CaseIntake, RuleBook, UnderwritingPipeline};
//!
//! let rules = Arc::new(RuleBook::standard()?);
//! let mut case = CaseIntake::from_json_str(&json)?.into_risk_case("DOC-001")?;
//! let outcome = UnderwritingPipeline::new(rules).process(&mut case)?;
//! println!("{}", outcome.offer);
//! ```

pub mod advisory;
pub mod audit;
pub mod bands;
pub mod error;
pub mod evidence;
pub mod intake;
pub mod offer;
pub mod pipeline;
pub mod rating;
pub mod requirement;
pub mod requirement_engine;
pub mod risk_case;
pub mod rules;

pub use advisory::{Advisory, AdvisoryProvider, AdvisorySource, RuleBasedAdvisor};
pub use audit::{Actor, AuditAction, AuditEntry, AuditRecord, AuditTrail};
pub use error::{AdvisoryError, EvidenceError, RuleTableError, UnderwritingError};
pub use evidence::{
    EvidenceMetadata, EvidenceSource, EvidenceValue, FinancialEvidence, IdentityEvidence,
    LifestyleEvidence, MedicalEvidence,
};
pub use intake::CaseIntake;
pub use offer::{OfferConstructor, UnderwritingOffer};
pub use pipeline::{PipelineOutcome, UnderwritingPipeline};
pub use rating::{DecisionType, RatingEngine, RatingResult, RiskClass};
pub use requirement::{Requirement, RequirementCategory, RequirementId, RequirementSet, RequirementStatus};
pub use requirement_engine::RequirementEngine;
pub use risk_case::{CaseStatus, EvidenceUpdate, ProposalContext, RiskCase};
pub use rules::RuleBook;
