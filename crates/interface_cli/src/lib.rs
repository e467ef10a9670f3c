//! Underwriting Command-Line Interface
//!
//! Reads an intake document, runs it through the underwriting pipeline and
//! renders the offer, the requirement summary and the audit summary.
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_cli::{load_rules, underwrite_file, OutputFormat};
//!
//! let rules = load_rules(None)?;
//! let report = underwrite_file("intake.json".as_ref(), rules, Currency::INR)?;
//! println!("{}", report.render(OutputFormat::Text)?);
//! ```

pub mod config;

use std::fs;
use std::path::Path;
use std::sync::Arc;

use anyhow::Context;
use core_kernel::Currency;
use domain_underwriting::{
    AuditEntry, CaseIntake, PipelineOutcome, RequirementSet, RiskCase, RuleBook,
    UnderwritingOffer, UnderwritingPipeline,
};
use serde::Serialize;

/// Report output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Loads a JSON rule book, or the built-in tables when no path is given
pub fn load_rules(path: Option<&Path>) -> anyhow::Result<Arc<RuleBook>> {
    let rules = match path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("reading rule book {}", path.display()))?;
            RuleBook::from_json_str(&json)
                .with_context(|| format!("loading rule book {}", path.display()))?
        }
        None => RuleBook::standard().context("building standard rule book")?,
    };
    Ok(Arc::new(rules))
}

/// A processed case and its pipeline outcome
#[derive(Debug)]
pub struct UnderwritingReport {
    pub case: RiskCase,
    pub outcome: PipelineOutcome,
}

#[derive(Serialize)]
struct JsonReport<'a> {
    offer: &'a UnderwritingOffer,
    requirements: &'a RequirementSet,
    audit_trail: &'a [AuditEntry],
}

impl UnderwritingReport {
    pub fn render(&self, format: OutputFormat) -> anyhow::Result<String> {
        match format {
            OutputFormat::Text => Ok(format!(
                "{}\nRequirements:   {}\n\n{}",
                self.outcome.offer,
                self.outcome.requirements.summary(),
                self.case.audit_summary()
            )),
            OutputFormat::Json => serde_json::to_string_pretty(&JsonReport {
                offer: &self.outcome.offer,
                requirements: &self.outcome.requirements,
                audit_trail: self.case.audit_trail().entries(),
            })
            .context("serialising report"),
        }
    }
}

/// Parses an intake document and underwrites it
///
/// `default_currency` applies when the intake does not name a currency.
pub fn underwrite_json(
    json: &str,
    document_id: &str,
    rules: Arc<RuleBook>,
    default_currency: Currency,
) -> anyhow::Result<UnderwritingReport> {
    let mut intake = CaseIntake::from_json_str(json).context("parsing intake")?;
    intake.currency.get_or_insert(default_currency);

    let mut case = intake
        .into_risk_case(document_id)
        .context("building risk case")?;
    let outcome = UnderwritingPipeline::new(rules)
        .process(&mut case)
        .context("underwriting case")?;

    tracing::info!(
        case_id = %case.id(),
        document_id,
        decision = %outcome.offer.decision,
        "case underwritten"
    );
    Ok(UnderwritingReport { case, outcome })
}

/// Reads an intake file and underwrites it, using the file stem as the
/// document id
pub fn underwrite_file(
    path: &Path,
    rules: Arc<RuleBook>,
    default_currency: Currency,
) -> anyhow::Result<UnderwritingReport> {
    let json = fs::read_to_string(path)
        .with_context(|| format!("reading intake {}", path.display()))?;
    let document_id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "intake".to_string());
    underwrite_json(&json, &document_id, rules, default_currency)
}
