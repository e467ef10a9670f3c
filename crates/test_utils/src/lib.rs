//! Test Utilities Crate
//!
//! Provides shared test infrastructure, fixtures, and helpers for the
//! underwriting test suite.
//!
//! # Modules
//!
//! - `fixtures`: Reference applicant profiles and money amounts
//! - `builders`: Builder for risk cases with only the relevant evidence set
//! - `assertions`: Custom assertion helpers for domain types
//! - `generators`: Property-based test data generators

use std::sync::Arc;

use domain_underwriting::RuleBook;
use once_cell::sync::Lazy;

pub mod fixtures;
pub mod builders;
pub mod assertions;
pub mod generators;

pub use fixtures::*;
pub use builders::*;
pub use assertions::*;
pub use generators::*;

/// The standard rule book, built once per test binary
pub static STANDARD_RULES: Lazy<Arc<RuleBook>> =
    Lazy::new(|| Arc::new(RuleBook::standard().expect("standard rule book is valid")));

/// Shared handle to [`STANDARD_RULES`]
pub fn standard_rules() -> Arc<RuleBook> {
    Arc::clone(&STANDARD_RULES)
}
