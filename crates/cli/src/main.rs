use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use insight_core::domain::recommendation::Category;
use insight_core::domain::report::ColumnMapping;
use insight_core::engine::InsightEngine;
use insight_core::llm::anthropic::AnthropicClient;
use insight_core::llm::{ColumnResolver, NoColumnResolver, SummaryGenerator, SummaryInput};

mod output;

#[derive(Debug, Parser)]
#[command(name = "insight_cli", about = "Rule-based campaign performance analysis")]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Print single-line JSON instead of pretty output.
    #[arg(long, global = true)]
    compact: bool,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Analyze a JSON or CSV export and print the report.
    Analyze {
        /// Input file (.json record array / request object, or .csv export).
        #[arg(long, short)]
        input: PathBuf,

        /// JSON object mapping raw column names to canonical fields.
        #[arg(long)]
        column_mapping: Option<PathBuf>,

        /// Only run these analyzers (roas, ctr, conversion, frequency).
        #[arg(long, value_parser = parse_category)]
        focus: Vec<Category>,

        /// Run the rules without any network call and print the result without a summary.
        #[arg(long)]
        dry_run: bool,
    },

    /// Print the canonical mapping for the given column names.
    MapColumns {
        columns: Vec<String>,

        /// Use local matching only; unresolved columns stay unknown.
        #[arg(long)]
        offline: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let settings = insight_core::config::Settings::from_env()?;
    let _sentry_guard = init_sentry(&settings);

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(sentry_tracing::layer())
        .init();

    let args = Args::parse();

    match args.command {
        Command::Analyze {
            input,
            column_mapping,
            focus,
            dry_run,
        } => {
            let mut request = insight_core::ingest::load_request(&input)?;
            if let Some(path) = column_mapping {
                request.column_mapping = Some(read_column_mapping(&path)?);
            }
            if !focus.is_empty() {
                request.analysis_focus = Some(focus);
            }

            tracing::info!(
                input = %input.display(),
                records_len = request.data.len(),
                dry_run,
                "analyzing export"
            );

            if dry_run {
                let engine = offline_engine(settings.anthropic_model());
                let (mapping, evaluation) = engine.evaluate(&request).await;
                output::print_json(&output::DryRun::new(mapping, &evaluation), args.compact)?;
                return Ok(());
            }

            let engine = online_engine(&settings)?;
            match engine.analyze(request).await {
                Ok(report) => output::print_json(&report, args.compact)?,
                Err(err) => {
                    sentry_anyhow::capture_anyhow(&err);
                    tracing::error!(error = %err, "analysis failed");
                    return Err(err);
                }
            }
        }
        Command::MapColumns { columns, offline } => {
            let engine = if offline {
                offline_engine(settings.anthropic_model())
            } else {
                online_engine(&settings)?
            };
            let mapping = engine.map_columns(&columns).await;
            output::print_json(&mapping, args.compact)?;
        }
    }

    Ok(())
}

fn online_engine(settings: &insight_core::config::Settings) -> anyhow::Result<InsightEngine> {
    let client = Arc::new(AnthropicClient::from_settings(settings)?);
    let model = client.model().to_string();
    Ok(InsightEngine::new(client.clone(), client, model))
}

fn offline_engine(model: &str) -> InsightEngine {
    let resolver: Arc<dyn ColumnResolver> = Arc::new(NoColumnResolver);
    InsightEngine::new(resolver, Arc::new(NoSummary), model)
}

/// Summary writer for offline runs. Refuses rather than inventing text.
struct NoSummary;

#[async_trait::async_trait]
impl SummaryGenerator for NoSummary {
    async fn generate_summary(&self, _input: &SummaryInput) -> anyhow::Result<String> {
        anyhow::bail!("summary generation is unavailable offline")
    }
}

fn read_column_mapping(path: &Path) -> anyhow::Result<ColumnMapping> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text)
        .with_context(|| format!("column mapping in {} must be a JSON object of strings", path.display()))
}

fn parse_category(s: &str) -> Result<Category, String> {
    serde_json::from_value(serde_json::Value::String(s.trim().to_ascii_lowercase()))
        .map_err(|_| format!("unknown category: {s}"))
}

fn init_sentry(settings: &insight_core::config::Settings) -> Option<sentry::ClientInitGuard> {
    let dsn = settings.sentry_dsn.as_deref()?;
    Some(sentry::init((
        dsn,
        sentry::ClientOptions {
            release: sentry::release_name!(),
            ..Default::default()
        },
    )))
}
