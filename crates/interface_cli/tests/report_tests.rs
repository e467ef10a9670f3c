//! Report Tests
//!
//! Underwrites fixture intake documents through the CLI library and checks
//! the rendered text and JSON reports.

use core_kernel::Currency;
use interface_cli::{load_rules, underwrite_json, OutputFormat};
use test_utils::IntakeFixtures;

fn healthy_report() -> interface_cli::UnderwritingReport {
    underwrite_json(
        &IntakeFixtures::healthy_applicant_json(),
        "DOC-CLI-1",
        load_rules(None).unwrap(),
        Currency::INR,
    )
    .unwrap()
}

// ============= TEXT =============
mod text {
    use super::*;

    #[test]
    fn test_text_report_has_offer_requirements_and_audit() {
        let text = healthy_report().render(OutputFormat::Text).unwrap();
        assert!(text.contains("Decision:       APPROVE"));
        assert!(text.contains("Risk class:     PREFERRED"));
        assert!(text.contains("Requirements:   medical=7 financial=1 kyc=3 third_party=2"));
        assert!(text.contains("Audit Trail for "));
    }
}

// ============= JSON =============
mod json {
    use super::*;

    #[test]
    fn test_json_report_is_structured() {
        let rendered = healthy_report().render(OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&rendered).unwrap();

        assert_eq!(value["offer"]["decision"], "APPROVE");
        assert_eq!(value["offer"]["risk_class"], "PREFERRED");
        assert_eq!(value["requirements"]["kyc"].as_array().unwrap().len(), 3);
        let trail = value["audit_trail"].as_array().unwrap();
        assert_eq!(trail[0]["action"], "RISK_CASE_CREATED");
    }
}

// ============= INPUT =============
mod input {
    use super::*;

    #[test]
    fn test_default_currency_applies_when_intake_names_none() {
        let report = underwrite_json(
            &IntakeFixtures::healthy_applicant_json(),
            "DOC-CLI-2",
            load_rules(None).unwrap(),
            Currency::USD,
        )
        .unwrap();
        let sum_assured = report.outcome.offer.sum_assured.unwrap();
        assert_eq!(sum_assured.currency(), Currency::USD);
    }

    #[test]
    fn test_invalid_intake_is_reported() {
        let result = underwrite_json(
            "{\"age\": \"thirty\"}",
            "DOC-CLI-3",
            load_rules(None).unwrap(),
            Currency::INR,
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_rule_book_file_is_reported() {
        let result = load_rules(Some(std::path::Path::new("/nonexistent/rules.json")));
        assert!(result.is_err());
    }
}
