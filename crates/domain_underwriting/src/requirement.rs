//! Underwriting requirements
//!
//! A requirement is a piece of evidence the case needs before it can be
//! decided: a medical test, a financial document, a KYC check or a bureau
//! lookup. Requirements are append-only per case.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Requirement identifier, unique within a case (`REQ-0001`, ...)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequirementId(String);

impl RequirementId {
    /// Identifier for the n-th requirement of a case, 1-based
    pub fn sequence(n: usize) -> Self {
        Self(format!("REQ-{n:04}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RequirementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RequirementId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementCategory {
    Medical,
    Financial,
    Kyc,
    ThirdParty,
}

impl fmt::Display for RequirementCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequirementCategory::Medical => "MEDICAL",
            RequirementCategory::Financial => "FINANCIAL",
            RequirementCategory::Kyc => "KYC",
            RequirementCategory::ThirdParty => "THIRD_PARTY",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RequirementStatus {
    Pending,
    Received,
    Verified,
    Waived,
    NotRequired,
}

impl fmt::Display for RequirementStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RequirementStatus::Pending => "PENDING",
            RequirementStatus::Received => "RECEIVED",
            RequirementStatus::Verified => "VERIFIED",
            RequirementStatus::Waived => "WAIVED",
            RequirementStatus::NotRequired => "NOT_REQUIRED",
        };
        f.write_str(s)
    }
}

/// A single requirement
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    pub id: RequirementId,
    pub category: RequirementCategory,
    /// e.g. `HbA1c`, `ITR_1year`, `CIBIL_Score`
    pub requirement_type: String,
    pub description: String,
    pub status: RequirementStatus,
    pub mandatory: bool,
    /// Rule that produced this requirement, e.g. `SA_SLAB_10000001_25000000`
    pub triggered_by: String,
    pub received_at: Option<DateTime<Utc>>,
    pub document_ref: Option<String>,
}

impl Requirement {
    /// Creates a mandatory, pending requirement
    pub fn new(
        id: RequirementId,
        category: RequirementCategory,
        requirement_type: impl Into<String>,
        description: impl Into<String>,
        triggered_by: impl Into<String>,
    ) -> Self {
        Self {
            id,
            category,
            requirement_type: requirement_type.into(),
            description: description.into(),
            status: RequirementStatus::Pending,
            mandatory: true,
            triggered_by: triggered_by.into(),
            received_at: None,
            document_ref: None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.status == RequirementStatus::Pending
    }
}

/// Requirements determined for one case, partitioned by category
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RequirementSet {
    pub medical: Vec<Requirement>,
    pub financial: Vec<Requirement>,
    pub kyc: Vec<Requirement>,
    pub third_party: Vec<Requirement>,
}

impl RequirementSet {
    /// Adds a requirement to its category's partition
    pub fn push(&mut self, requirement: Requirement) {
        match requirement.category {
            RequirementCategory::Medical => self.medical.push(requirement),
            RequirementCategory::Financial => self.financial.push(requirement),
            RequirementCategory::Kyc => self.kyc.push(requirement),
            RequirementCategory::ThirdParty => self.third_party.push(requirement),
        }
    }

    /// Whether a test of this type is already in the given category
    pub fn contains(&self, category: RequirementCategory, requirement_type: &str) -> bool {
        self.category(category)
            .iter()
            .any(|r| r.requirement_type == requirement_type)
    }

    pub fn category(&self, category: RequirementCategory) -> &[Requirement] {
        match category {
            RequirementCategory::Medical => &self.medical,
            RequirementCategory::Financial => &self.financial,
            RequirementCategory::Kyc => &self.kyc,
            RequirementCategory::ThirdParty => &self.third_party,
        }
    }

    /// All requirements, medical first, then financial, KYC, third-party
    pub fn iter(&self) -> impl Iterator<Item = &Requirement> {
        self.medical
            .iter()
            .chain(&self.financial)
            .chain(&self.kyc)
            .chain(&self.third_party)
    }

    pub fn total_count(&self) -> usize {
        self.medical.len() + self.financial.len() + self.kyc.len() + self.third_party.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total_count() == 0
    }

    /// Requirement types of one category, in determination order
    pub fn types(&self, category: RequirementCategory) -> Vec<&str> {
        self.category(category)
            .iter()
            .map(|r| r.requirement_type.as_str())
            .collect()
    }

    /// Short per-category summary, e.g. `medical=7 financial=1 kyc=3 third_party=2`
    pub fn summary(&self) -> String {
        format!(
            "medical={} financial={} kyc={} third_party={}",
            self.medical.len(),
            self.financial.len(),
            self.kyc.len(),
            self.third_party.len()
        )
    }
}
