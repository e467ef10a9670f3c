//! Core Kernel - Foundational types for the underwriting workspace
//!
//! This crate provides the building blocks shared by the domain and
//! interface crates:
//! - Money types with precise decimal arithmetic
//! - Strongly-typed identifiers for cases, proposals and audit entries

pub mod money;
pub mod identifiers;

pub use money::{Money, Currency, MoneyError, Rate};
pub use identifiers::{CaseId, ProposalId, AuditEntryId};
