//! Audit risk CLI - evaluate trade-office assessments against a risk policy

use std::path::{Path, PathBuf};

use anyhow::Context;
use audit_risk_core::{evaluate, CriterionTable, RawAssessment, Recalculator, Registry};
use chrono::Utc;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "audit-risk")]
#[command(about = "Risk scoring for trade representative office audits")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate a risk policy file and print its summary
    CheckPolicy {
        /// Path to the policy (YAML or JSON)
        policy: PathBuf,
    },
    /// Evaluate a raw assessment into a scored record
    Evaluate {
        /// Path to the policy (YAML or JSON)
        #[arg(long)]
        policy: PathBuf,

        /// Path to the raw assessment (YAML or JSON)
        #[arg(long)]
        input: PathBuf,

        /// Output format
        #[arg(long, default_value = "json")]
        format: OutputFormat,

        /// Verify the record and stamp it as updated by this editor
        #[arg(long)]
        editor: Option<String>,
    },
    /// List criteria that still lack a score
    Missing {
        /// Path to the policy (YAML or JSON)
        #[arg(long)]
        policy: PathBuf,

        /// Path to the raw assessment (YAML or JSON)
        #[arg(long)]
        input: PathBuf,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum OutputFormat {
    Json,
    Yaml,
}

fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();

    match cli.command {
        Commands::CheckPolicy { policy } => {
            let registry = load_registry(&policy)?;
            let range = registry.score_range();
            println!(
                "{} (version {}): ok, scores {}..={}",
                registry.policy_name(),
                registry.policy_version(),
                range.min,
                range.max
            );
            for entry in registry.entries() {
                let table = match &entry.table {
                    CriterionTable::Bands(bands) => format!("{} bands", bands.bands().len()),
                    CriterionTable::Choices(choices) => {
                        choices.values().collect::<Vec<_>>().join(", ")
                    }
                };
                println!(
                    "  {:<26} {:<14} weight {:<5} {}",
                    entry.id().as_str(),
                    entry.kind().as_str(),
                    entry.weight,
                    entry.spec.description
                );
                println!("  {:<26} {}", "", table);
            }
            println!(
                "  profile: {}",
                registry
                    .profile_table()
                    .bands()
                    .iter()
                    .map(|band| band.label.as_str())
                    .collect::<Vec<_>>()
                    .join(" < ")
            );
        }
        Commands::Evaluate {
            policy,
            input,
            format,
            editor,
        } => {
            let registry = load_registry(&policy)?;
            let raw = load_assessment(&input)?;
            let mut record = evaluate(&registry, &raw)
                .with_context(|| format!("Failed to evaluate {}", input.display()))?;

            if let Some(editor) = editor {
                record = Recalculator::new(&registry)
                    .prepare_save(&record, &editor, Utc::now())
                    .context("Record failed verification")?;
            }

            match format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&record)?),
                OutputFormat::Yaml => print!("{}", serde_yaml::to_string(&record)?),
            }
        }
        Commands::Missing { policy, input } => {
            let registry = load_registry(&policy)?;
            let raw = load_assessment(&input)?;
            let record = evaluate(&registry, &raw)
                .with_context(|| format!("Failed to evaluate {}", input.display()))?;

            let missing = record.missing_criteria();
            if missing.is_empty() {
                println!("All criteria scored");
            } else {
                for id in missing {
                    println!("{}", id);
                }
                std::process::exit(2);
            }
        }
    }

    Ok(())
}

/// Log to stderr, filtered by `RUST_LOG` (default `warn`).
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_registry(path: &Path) -> anyhow::Result<Registry> {
    tracing::debug!(policy = %path.display(), "Loading risk policy");
    Registry::from_policy_file(path)
        .with_context(|| format!("Invalid risk policy {}", path.display()))
}

fn load_assessment(path: &Path) -> anyhow::Result<RawAssessment> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;

    let raw = match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
        _ => serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?,
    };
    Ok(raw)
}
