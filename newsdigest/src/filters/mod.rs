//! Ordered per-item filter stages.
//!
//! Every raw item is checked against the stages in order and dropped at the
//! first one that rejects it. Accepted items feed back into the run's
//! [`FilterContext`] so later items are compared against them.

use chrono::{DateTime, Utc};
use common::FilterConfig;
use std::collections::HashSet;
use tracing::{debug, info};

use crate::history::{link_hash, HistoryRecord};
use crate::ingestion::NewsItem;

pub mod credibility;
pub mod history;
pub mod noise;
pub mod recency;
pub mod similarity;

pub use credibility::CredibilityFilter;
pub use history::HistoryFilter;
pub use noise::{normalize_title, NoiseFilter};
pub use recency::RecencyFilter;
pub use similarity::{jaccard_similarity, title_tokens, SimilarityFilter};

/// A raw item with the derived keys every stage works from, computed once.
#[derive(Debug, Clone)]
pub struct Candidate<'a> {
    pub item: &'a NewsItem,
    pub link_hash: String,
    pub normalized_title: String,
    pub tokens: HashSet<String>,
}

impl<'a> Candidate<'a> {
    pub fn new(item: &'a NewsItem) -> Self {
        let normalized_title = normalize_title(&item.title);
        let tokens = title_tokens(&normalized_title);
        Self {
            item,
            link_hash: link_hash(&item.link),
            normalized_title,
            tokens,
        }
    }
}

/// Per-run state shared by the stages. Only `accepted_hashes` outlives the run,
/// and only once delivery succeeds.
#[derive(Debug, Clone)]
pub struct FilterContext {
    /// Clock the recency stage measures against
    pub now: DateTime<Utc>,
    accepted_titles: Vec<HashSet<String>>,
    accepted_hashes: Vec<String>,
    hash_index: HashSet<String>,
}

impl FilterContext {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self {
            now,
            accepted_titles: Vec::new(),
            accepted_hashes: Vec::new(),
            hash_index: HashSet::new(),
        }
    }

    pub fn accepted_titles(&self) -> &[HashSet<String>] {
        &self.accepted_titles
    }

    /// Link hashes of accepted items, in acceptance order.
    pub fn accepted_hashes(&self) -> &[String] {
        &self.accepted_hashes
    }

    pub fn has_accepted(&self, link_hash: &str) -> bool {
        self.hash_index.contains(link_hash)
    }

    pub fn into_accepted_hashes(self) -> Vec<String> {
        self.accepted_hashes
    }

    fn accept(&mut self, candidate: Candidate<'_>) {
        self.accepted_titles.push(candidate.tokens);
        self.hash_index.insert(candidate.link_hash.clone());
        self.accepted_hashes.push(candidate.link_hash);
    }
}

/// One predicate stage of the chain.
pub trait Filter: Send + Sync {
    /// Stage name, used in logs and the report
    fn name(&self) -> &str;

    fn accepts(&self, candidate: &Candidate<'_>, context: &FilterContext) -> bool;
}

/// Counts of what happened to the raw items during one run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterReport {
    pub considered: usize,
    pub accepted: usize,
    /// Rejections per stage, in chain order
    pub rejected: Vec<(String, usize)>,
    /// Items never looked at because `max_items` was reached
    pub skipped_after_cap: usize,
}

impl FilterReport {
    pub fn rejected_by(&self, stage: &str) -> usize {
        self.rejected
            .iter()
            .find(|(name, _)| name == stage)
            .map(|(_, n)| *n)
            .unwrap_or(0)
    }
}

/// Chains the stages together and enforces the output cap.
///
/// ```ignore
/// let chain = FilterChain::new(25)
///     .add_filter(HistoryFilter::new(record))
///     .add_filter(RecencyFilter::new(2));
/// let (items, report) = chain.run(raw, &mut FilterContext::new(Utc::now()));
/// ```
pub struct FilterChain {
    filters: Vec<Box<dyn Filter>>,
    max_items: usize,
}

impl FilterChain {
    pub fn new(max_items: usize) -> Self {
        Self {
            filters: Vec::new(),
            max_items,
        }
    }

    /// The standard chain: history, recency, credibility, noise, similarity.
    pub fn from_config(config: &FilterConfig, history: HistoryRecord) -> Self {
        Self::new(config.max_items)
            .add_filter(HistoryFilter::new(history))
            .add_filter(RecencyFilter::new(config.max_age_days))
            .add_filter(CredibilityFilter::new(&config.credible_sources))
            .add_filter(NoiseFilter::new(
                &config.noise_keywords,
                &config.fundamentals_terms,
                &config.bad_context_terms,
            ))
            .add_filter(SimilarityFilter::new(config.similarity_threshold))
    }

    pub fn add_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    pub fn stage_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Runs every item through the stages in order, keeping feed order among
    /// the survivors.
    pub fn run(&self, items: Vec<NewsItem>, context: &mut FilterContext) -> (Vec<NewsItem>, FilterReport) {
        let mut report = FilterReport {
            considered: items.len(),
            rejected: self.filters.iter().map(|f| (f.name().to_string(), 0)).collect(),
            ..Default::default()
        };
        let mut accepted = Vec::new();

        for (index, item) in items.iter().enumerate() {
            if accepted.len() >= self.max_items {
                report.skipped_after_cap = items.len() - index;
                break;
            }

            let candidate = Candidate::new(item);
            let rejected_at = self
                .filters
                .iter()
                .position(|filter| !filter.accepts(&candidate, context));

            match rejected_at {
                Some(stage) => {
                    debug!(stage = self.filters[stage].name(), "rejected: {}", item.title);
                    report.rejected[stage].1 += 1;
                }
                None => {
                    context.accept(candidate);
                    accepted.push(item.clone());
                }
            }
        }

        report.accepted = accepted.len();
        info!(
            "Filtered {} items -> {} kept (rejected: {:?}, skipped after cap: {})",
            report.considered, report.accepted, report.rejected, report.skipped_after_cap
        );

        (accepted, report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(title: &str, link: &str, source: &str) -> NewsItem {
        NewsItem {
            title: title.to_string(),
            link: link.to_string(),
            source_name: source.to_string(),
            published_at: None,
        }
    }

    #[test]
    fn test_stage_order() {
        let chain = FilterChain::from_config(&FilterConfig::default(), HistoryRecord::default());
        assert_eq!(
            chain.stage_names(),
            vec!["history", "recency", "credibility", "noise", "similarity"]
        );
    }

    #[test]
    fn test_known_link_is_rejected_first() {
        let seen = item("Muthoot Finance quarter profit rises - Mint", "https://x/1", "Mint");
        let record = HistoryRecord::from_hashes([link_hash(&seen.link)]);
        let chain = FilterChain::from_config(&FilterConfig::default(), record);

        let mut context = FilterContext::new(Utc::now());
        let (kept, report) = chain.run(vec![seen], &mut context);

        assert!(kept.is_empty());
        assert_eq!(report.rejected_by("history"), 1);
        assert!(context.accepted_hashes().is_empty());
    }

    #[test]
    fn test_same_link_twice_in_run() {
        let chain = FilterChain::from_config(&FilterConfig::default(), HistoryRecord::default());
        let a = item("Poonawalla Fincorp completes acquisition of lender - Reuters", "https://x/1", "Reuters");
        let b = item("Completely different wording entirely here - Reuters", "https://x/1", "Reuters");

        let mut context = FilterContext::new(Utc::now());
        let (kept, report) = chain.run(vec![a, b], &mut context);

        assert_eq!(kept.len(), 1);
        assert_eq!(report.rejected_by("history"), 1);
    }

    #[test]
    fn test_max_items_caps_output() {
        let mut config = FilterConfig::default();
        config.max_items = 2;
        let chain = FilterChain::from_config(&config, HistoryRecord::default());

        let items = vec![
            item("Shriram Finance raises funding from global investors - Reuters", "https://x/1", "Reuters"),
            item("Tata Capital merger with parent approved by regulator - Mint", "https://x/2", "Mint"),
            item("IIFL Finance gold loan business cleared by RBI - Business Standard", "https://x/3", "Business Standard"),
            item("Microfinance lenders see collections improve - Economic Times", "https://x/4", "Economic Times"),
        ];

        let mut context = FilterContext::new(Utc::now());
        let (kept, report) = chain.run(items, &mut context);

        assert_eq!(kept.len(), 2);
        assert_eq!(report.skipped_after_cap, 2);
        assert_eq!(context.accepted_hashes().len(), 2);
        assert_eq!(context.accepted_titles().len(), 2);
    }

    #[test]
    fn test_end_to_end_duplicate_and_noise() {
        let chain = FilterChain::from_config(&FilterConfig::default(), HistoryRecord::default());
        let now = Utc::now();
        let mut first = item(
            "Bajaj Finance acquires minority stake in fintech startup Alpha - The Economic Times",
            "https://x/1",
            "The Economic Times",
        );
        first.published_at = Some(now - Duration::hours(3));
        let second = item(
            "Bajaj Finance acquires stake in Alpha fintech lender platform - Mint",
            "https://x/2",
            "Mint",
        );
        let noise = item("Stock hits 52-week high - Moneycontrol", "https://x/3", "Moneycontrol");

        let mut context = FilterContext::new(now);
        let (kept, report) = chain.run(vec![first.clone(), second, noise], &mut context);

        assert_eq!(kept, vec![first.clone()]);
        assert_eq!(report.rejected_by("similarity"), 1);
        assert_eq!(report.rejected_by("noise"), 1);
        assert_eq!(context.into_accepted_hashes(), vec![link_hash(&first.link)]);
    }
}
