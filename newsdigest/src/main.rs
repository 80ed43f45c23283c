/*
newsdigest - main.rs
Runs one digest: builds the sector queries, fetches and filters headlines,
generates the analysis with the first model that answers, delivers it and
records what was surfaced.
*/

use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use common::Config;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use newsdigest::delivery::sink_from_config;
use newsdigest::history::HistoryStore;
use newsdigest::ingestion::GoogleNewsSource;
use newsdigest::llm::{GeminiProvider, GenerationOrchestrator, ModelCandidate, RetryPolicy};
use newsdigest::pipeline::{select_items, Pipeline, RunOutcome};
use newsdigest::prompt::render_prompt;
use newsdigest::query::{Locale, Query, QueryBuilder};

#[derive(Parser, Debug)]
#[command(name = "newsdigest", about = "Sector news digest with model fallback")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Fetch and filter only: print the prompt, skip generation, delivery and history
    #[arg(long)]
    dry_run: bool,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    let config = load_config(args.config).await?;

    let queries = QueryBuilder::new(config.queries.clone(), Locale::from(&config.feeds)).build();
    let source = GoogleNewsSource::new(&config.feeds)?;
    let history = HistoryStore::new(&config.history.path);
    info!(path = %history.path().display(), "history store");

    if args.dry_run {
        return dry_run(&config, queries, source, history).await;
    }

    let api_key = config.api_key()?;
    let provider = GeminiProvider::new(config.llm.api_url.clone(), api_key)?
        .with_timeout(config.llm.timeout_seconds.unwrap_or(30));
    let candidates: Vec<ModelCandidate> = config.llm.models.iter().cloned().map(ModelCandidate::from).collect();
    let orchestrator = GenerationOrchestrator::new(provider, candidates).with_retry_policy(RetryPolicy {
        max_attempts: config.llm.max_attempts.unwrap_or(3),
        backoff: Duration::from_secs(config.llm.backoff_seconds.unwrap_or(5)),
    });
    let models: Vec<&str> = orchestrator.candidates().iter().map(ModelCandidate::as_str).collect();
    info!("Model candidates in order: {}", models.join(", "));
    let sink = sink_from_config(&config.delivery)?;

    let pipeline = Pipeline::new(queries, source, config.filters.clone(), history, orchestrator, sink)
        .with_recipients(config.delivery.recipients.clone());

    match pipeline.run(Utc::now()).await {
        Ok(RunOutcome::Delivered { items, model, committed }) => {
            info!(%model, "Digest of {} items delivered, {} links remembered", items, committed);
        }
        Ok(RunOutcome::NoItems { report }) => {
            warn!("No specific news found today ({} raw items considered)", report.considered);
        }
        Ok(RunOutcome::GenerationFailed { items, error }) => {
            error!("CRITICAL: {} items selected but every model failed: {}", items, error);
        }
        Ok(RunOutcome::DeliveryFailed { items, error }) => {
            error!("Digest of {} items generated but not delivered: {:#}", items, error);
        }
        Err(e) => {
            error!("Digest delivered but history could not be saved: {:#}", e);
        }
    }

    Ok(())
}

/// `config.default.toml` merged with `--config` or `./config.toml`.
async fn load_config(explicit: Option<PathBuf>) -> Result<Config> {
    let default_path = PathBuf::from("config.default.toml");

    let override_path = if let Some(p) = explicit {
        if !p.exists() {
            error!(path = ?p, "specified config file not found");
            return Err(anyhow::anyhow!("Config file not found: {}", p.display()));
        }
        Some(p)
    } else {
        let p = PathBuf::from("config.toml");
        if p.exists() { Some(p) } else { None }
    };

    let config = Config::load_with_defaults(
        if default_path.exists() { Some(default_path.as_path()) } else { None },
        override_path.as_deref(),
    )
    .await?;
    info!(default = ?default_path, override = ?override_path, "configuration loaded");
    Ok(config)
}

async fn dry_run(
    config: &Config,
    queries: Vec<Query>,
    source: GoogleNewsSource,
    history: HistoryStore,
) -> Result<()> {
    for query in &queries {
        info!("query: {}", query.search_terms());
    }

    let selection = select_items(&source, &queries, &config.filters, &history, Utc::now()).await;
    let (items, report) = (selection.items, selection.report);

    info!("dry run: {} of {} items kept", report.accepted, report.considered);
    if items.is_empty() {
        println!("No specific news found today.");
    } else {
        println!("{}", render_prompt(&items));
    }
    Ok(())
}
