//! Underwriting domain errors
//!
//! Missing optional evidence is never an error: the dependent rule is
//! skipped. Errors here are either rule-table misconfiguration, detected
//! once when a [`crate::rules::RuleBook`] is built, or faults that the
//! rating boundary converts into a REFER.

use rust_decimal::Decimal;
use thiserror::Error;

use core_kernel::MoneyError;

use crate::risk_case::CaseStatus;

/// Rule tables violate a structural invariant
#[derive(Debug, Error, PartialEq)]
pub enum RuleTableError {
    /// A band table has no entries
    #[error("Rule table '{table}' is empty")]
    Empty { table: String },

    /// A band's lower bound exceeds its upper bound
    #[error("Rule table '{table}': band starting at {lower} ends before it starts ({upper})")]
    InvertedBand {
        table: String,
        lower: Decimal,
        upper: Decimal,
    },

    /// Two adjacent bands share values
    #[error("Rule table '{table}': band starting at {lower} overlaps the previous band")]
    Overlap { table: String, lower: Decimal },

    /// Adjacent bands leave values uncovered
    #[error("Rule table '{table}': gap between {previous_upper} and {lower}")]
    Gap {
        table: String,
        previous_upper: Decimal,
        lower: Decimal,
    },

    /// An unbounded band appears before the last position
    #[error("Rule table '{table}': only the last band may be unbounded")]
    UnboundedNotLast { table: String },

    /// The table must extend to infinity but its last band is bounded
    #[error("Rule table '{table}': last band must be unbounded")]
    BoundedTail { table: String },

    /// A keyed table lacks a required cell
    #[error("Rule table '{table}' has no entry for {key}")]
    MissingCell { table: String, key: String },

    /// A numeric parameter is outside its valid domain
    #[error("Rule table '{table}': {message}")]
    InvalidParameter { table: String, message: String },

    /// The rule book document could not be parsed
    #[error("Failed to parse rule book: {0}")]
    Parse(String),
}

impl RuleTableError {
    pub fn invalid(table: impl Into<String>, message: impl Into<String>) -> Self {
        RuleTableError::InvalidParameter {
            table: table.into(),
            message: message.into(),
        }
    }
}

/// Errors raised while building evidence values
#[derive(Debug, Error, PartialEq)]
pub enum EvidenceError {
    #[error("Confidence {0} is outside [0, 1]")]
    ConfidenceOutOfRange(Decimal),

    #[error("Invalid evidence field '{field}': {message}")]
    InvalidField { field: String, message: String },
}

/// Errors raised by the advisory collaborator
#[derive(Debug, Error)]
pub enum AdvisoryError {
    #[error("Advisory service unavailable: {0}")]
    Unavailable(String),

    #[error("Advisory response malformed: {0}")]
    Malformed(String),
}

/// Errors that can occur in the underwriting domain
#[derive(Debug, Error)]
pub enum UnderwritingError {
    #[error(transparent)]
    RuleTable(#[from] RuleTableError),

    #[error(transparent)]
    Evidence(#[from] EvidenceError),

    #[error("Money error: {0}")]
    Money(#[from] MoneyError),

    /// Status change attempted from a terminal status
    #[error("Invalid status transition from {from:?} to {to:?}")]
    InvalidStatusTransition { from: CaseStatus, to: CaseStatus },

    /// Requirement id not present on the case
    #[error("Requirement not found: {0}")]
    RequirementNotFound(String),

    /// Requirement is not pending and cannot be satisfied
    #[error("Requirement {id} is {status} and cannot be satisfied")]
    RequirementNotPending { id: String, status: String },

    /// Arithmetic overflow during rating or pricing
    #[error("Arithmetic overflow while computing {0}")]
    Overflow(&'static str),
}
