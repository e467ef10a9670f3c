//! Custom Test Assertions
//!
//! Provides specialized assertion helpers for domain types that give
//! more meaningful error messages than standard assertions.

use std::collections::HashSet;

use core_kernel::Money;
use domain_underwriting::{AuditTrail, RatingResult, RequirementCategory, RequirementSet};
use rust_decimal::Decimal;

/// Asserts that a Money value has the expected currency and amount
pub fn assert_money_eq(actual: &Money, expected: &Money) {
    assert_eq!(
        actual.currency(),
        expected.currency(),
        "Currency mismatch: actual={}, expected={}",
        actual.currency(),
        expected.currency()
    );
    assert_eq!(
        actual.amount(),
        expected.amount(),
        "Amount mismatch: actual={}, expected={}",
        actual,
        expected
    );
}

/// Asserts that a Money value has the given amount, ignoring scale
pub fn assert_amount(actual: &Money, expected: Decimal) {
    assert_eq!(
        actual.amount().normalize(),
        expected.normalize(),
        "Amount mismatch: actual={actual}, expected={expected}"
    );
}

/// Asserts that every loading and exclusion names its evidence and reason
pub fn assert_every_adjustment_explained(result: &RatingResult) {
    for loading in &result.loadings {
        assert!(
            !loading.reason.trim().is_empty(),
            "Loading {} has no reason",
            loading.condition
        );
        assert!(
            !loading.evidence_field.trim().is_empty(),
            "Loading {} has no evidence field",
            loading.condition
        );
    }
    for exclusion in &result.exclusions {
        assert!(
            !exclusion.reason.trim().is_empty(),
            "Exclusion {} has no reason",
            exclusion.condition
        );
        assert!(
            !exclusion.evidence_field.trim().is_empty(),
            "Exclusion {} has no evidence field",
            exclusion.condition
        );
    }
}

/// Asserts that the total loading is the sum of the individual loadings
pub fn assert_total_is_sum(result: &RatingResult) {
    let sum: u32 = result.loadings.iter().map(|l| l.loading_percent).sum();
    assert_eq!(
        result.total_loading_percent, sum,
        "Total loading {} differs from sum of loadings {}",
        result.total_loading_percent, sum
    );
}

/// Asserts that no (category, type) pair appears twice
pub fn assert_requirements_unique(set: &RequirementSet) {
    for category in [
        RequirementCategory::Medical,
        RequirementCategory::Financial,
        RequirementCategory::Kyc,
        RequirementCategory::ThirdParty,
    ] {
        let mut seen = HashSet::new();
        for requirement in set.category(category) {
            assert!(
                seen.insert(requirement.requirement_type.as_str()),
                "Duplicate requirement {} in {:?}",
                requirement.requirement_type,
                category
            );
        }
    }
}

/// Asserts that sequence numbers are contiguous and timestamps never go back
pub fn assert_audit_ordered(trail: &AuditTrail) {
    for (index, pair) in trail.entries().windows(2).enumerate() {
        assert_eq!(
            pair[1].sequence,
            pair[0].sequence + 1,
            "Sequence gap after entry {index}"
        );
        assert!(
            pair[1].timestamp >= pair[0].timestamp,
            "Timestamp went backwards after entry {index}"
        );
    }
}
