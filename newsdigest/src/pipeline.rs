//! One digest run: query, fetch, filter, generate, deliver, remember.
//!
//! History is only committed after the sink accepts the digest, so items from a
//! run that failed anywhere are offered again next time.

use anyhow::Result;
use chrono::{DateTime, Utc};
use common::FilterConfig;
use tracing::{error, info, warn};

use crate::delivery::DeliverySink;
use crate::filters::{FilterChain, FilterContext, FilterReport};
use crate::history::HistoryStore;
use crate::ingestion::{fetch_all, FeedSource, NewsItem};
use crate::llm::{GenerationOrchestrator, GenerationProvider, GenerationRequest, ModelCandidate, OrchestratorError};
use crate::prompt::render_prompt;
use crate::query::Query;

/// How a run ended. Only `Delivered` touches the history file.
#[derive(Debug)]
pub enum RunOutcome {
    /// Nothing survived filtering
    NoItems { report: FilterReport },
    GenerationFailed { items: usize, error: OrchestratorError },
    DeliveryFailed { items: usize, error: anyhow::Error },
    Delivered {
        items: usize,
        model: ModelCandidate,
        committed: usize,
    },
}

/// Items that survived filtering, plus what the run would commit.
#[derive(Debug, Clone)]
pub struct Selection {
    pub items: Vec<NewsItem>,
    pub report: FilterReport,
    pub link_hashes: Vec<String>,
}

/// Resolves every query and runs the results through the standard filter chain
/// against the persisted history.
pub async fn select_items<S: FeedSource + ?Sized>(
    source: &S,
    queries: &[Query],
    filters: &FilterConfig,
    history: &HistoryStore,
    now: DateTime<Utc>,
) -> Selection {
    info!("Fetching {} queries", queries.len());
    let raw = fetch_all(source, queries).await;

    let record = history.load().await;
    let chain = FilterChain::from_config(filters, record);
    let mut context = FilterContext::new(now);
    let (items, report) = chain.run(raw, &mut context);

    Selection {
        items,
        report,
        link_hashes: context.into_accepted_hashes(),
    }
}

pub struct Pipeline<S, P> {
    queries: Vec<Query>,
    source: S,
    filters: FilterConfig,
    history: HistoryStore,
    orchestrator: GenerationOrchestrator<P>,
    sink: Box<dyn DeliverySink>,
    recipients: Vec<String>,
}

impl<S: FeedSource, P: GenerationProvider> Pipeline<S, P> {
    pub fn new(
        queries: Vec<Query>,
        source: S,
        filters: FilterConfig,
        history: HistoryStore,
        orchestrator: GenerationOrchestrator<P>,
        sink: Box<dyn DeliverySink>,
    ) -> Self {
        Self {
            queries,
            source,
            filters,
            history,
            orchestrator,
            sink,
            recipients: Vec::new(),
        }
    }

    pub fn with_recipients(mut self, recipients: Vec<String>) -> Self {
        self.recipients = recipients;
        self
    }

    /// Fetch and filter without generating or touching history.
    pub async fn select(&self, now: DateTime<Utc>) -> Selection {
        select_items(&self.source, &self.queries, &self.filters, &self.history, now).await
    }

    /// Full run. Failures short of a history write error are reported through
    /// the outcome, not as errors.
    pub async fn run(&self, now: DateTime<Utc>) -> Result<RunOutcome> {
        let selection = self.select(now).await;
        let count = selection.items.len();
        if count == 0 {
            warn!("No qualifying news found in this run");
            return Ok(RunOutcome::NoItems {
                report: selection.report,
            });
        }

        info!("Found {} headlines. Sending for analysis...", count);
        let request = GenerationRequest::new(render_prompt(&selection.items));
        let generation = match self.orchestrator.generate(&request).await {
            Ok(generation) => generation,
            Err(error) => {
                error!("All generation candidates failed: {}", error);
                return Ok(RunOutcome::GenerationFailed { items: count, error });
            }
        };

        if let Err(error) = self.sink.deliver(&generation.text, &self.recipients).await {
            error!("Delivery failed, history left untouched: {:#}", error);
            return Ok(RunOutcome::DeliveryFailed { items: count, error });
        }

        self.history.commit(&selection.link_hashes).await?;

        Ok(RunOutcome::Delivered {
            items: count,
            model: generation.model,
            committed: selection.link_hashes.len(),
        })
    }
}
