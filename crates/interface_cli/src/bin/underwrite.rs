//! Underwriting CLI Binary
//!
//! Underwrites one intake document and prints the resulting offer.
//!
//! # Usage
//!
//! ```bash
//! # Underwrite with the built-in rule tables
//! underwrite intake.json
//!
//! # Use an operator-supplied rule book and print JSON
//! underwrite intake.json --rules rules.json --format json
//! ```
//!
//! # Environment Variables
//!
//! * `UW_LOG_LEVEL` - Log level or filter directive (default: info)
//! * `UW_LOG_FORMAT` - `text` or `json` (default: text)
//! * `UW_RULES_PATH` - JSON rule book used when `--rules` is not given
//! * `UW_CURRENCY` - Currency for intakes that name none (default: INR)

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use interface_cli::config::{AppConfig, LogFormat};
use interface_cli::{load_rules, underwrite_file, OutputFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Debug, Parser)]
#[command(name = "underwrite", version, about = "Underwrite a term-life intake document")]
struct Args {
    /// Intake document (flat JSON evidence map)
    intake: PathBuf,

    /// JSON rule book; overrides UW_RULES_PATH
    #[arg(long)]
    rules: Option<PathBuf>,

    /// Report format
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let args = Args::parse();
    let config = AppConfig::from_env().context("loading UW_ configuration")?;
    init_tracing(&config);

    let rules_path = args.rules.or(config.rules_path);
    let rules = load_rules(rules_path.as_deref())?;
    tracing::debug!(rules = ?rules_path, intake = %args.intake.display(), "rule book loaded");

    let report = underwrite_file(&args.intake, rules, config.currency)?;
    println!("{}", report.render(args.format)?);
    Ok(())
}

/// Installs the tracing subscriber on stderr so stdout carries only the
/// report
fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let registry = tracing_subscriber::registry().with(filter);
    match config.log_format {
        LogFormat::Text => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_writer(std::io::stderr),
            )
            .init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .init(),
    }
}
