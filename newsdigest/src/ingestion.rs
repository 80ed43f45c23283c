use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use common::FeedsConfig;
use feed_rs::model::{Entry, Feed};
use feed_rs::parser;
use reqwest::Client;
use std::collections::HashSet;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::query::Query;

/// One headline resolved from a feed search. `link` is the unique key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source_name: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Resolves a query into news items.
#[async_trait::async_trait]
pub trait FeedSource: Send + Sync {
    async fn fetch(&self, query: &Query) -> Result<Vec<NewsItem>>;
}

/// Google News RSS search over HTTP.
pub struct GoogleNewsSource {
    client: Client,
    endpoint: String,
    max_attempts: u32,
    base_backoff: Duration,
}

impl GoogleNewsSource {
    pub fn new(config: &FeedsConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds.unwrap_or(15)))
            .user_agent(config.user_agent.as_deref().unwrap_or("Newsdigest/0.1.0"))
            .build()
            .context("failed to build reqwest client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            max_attempts: 3,
            base_backoff: Duration::from_secs(1),
        })
    }

    pub fn with_retries(mut self, max_attempts: u32, base_backoff: Duration) -> Self {
        self.max_attempts = max_attempts.max(1);
        self.base_backoff = base_backoff;
        self
    }

    /// Fetches the search URL and parses the feed, retrying 5xx, 429 and
    /// network errors with exponential backoff.
    async fn fetch_and_parse_feed(&self, url: &str) -> Result<Feed> {
        let mut last_error = None;

        for attempt in 1..=self.max_attempts {
            if attempt > 1 {
                let backoff = self.base_backoff * 2u32.pow(attempt - 2); // 1x, 2x, 4x...
                info!("Retrying feed fetch for {} (attempt {}/{}) after {:?}...", url, attempt, self.max_attempts, backoff);
                tokio::time::sleep(backoff).await;
            }

            match self.client.get(url).send().await {
                Ok(response) => {
                    let status = response.status();
                    if status.is_success() {
                        let bytes = response.bytes().await.context("failed to read response body")?;
                        let feed = parser::parse(bytes.as_ref()).context("failed to parse feed")?;
                        return Ok(feed);
                    } else if status.is_server_error() || status == reqwest::StatusCode::TOO_MANY_REQUESTS {
                        last_error = Some(anyhow::anyhow!("feed server returned {}", status));
                    } else {
                        return Err(anyhow::anyhow!("feed fetch failed with status: {}", status));
                    }
                }
                Err(e) => {
                    last_error = Some(anyhow::Error::new(e).context("network error during fetch"));
                }
            }
        }

        Err(last_error.unwrap_or_else(|| anyhow::anyhow!("unknown error after retries")))
    }
}

#[async_trait::async_trait]
impl FeedSource for GoogleNewsSource {
    async fn fetch(&self, query: &Query) -> Result<Vec<NewsItem>> {
        let url = query.to_url(&self.endpoint)?;
        let feed = self.fetch_and_parse_feed(url.as_str()).await?;
        Ok(items_from_feed(&feed))
    }
}

/// Maps feed entries to news items, skipping entries without a title or link.
pub fn items_from_feed(feed: &Feed) -> Vec<NewsItem> {
    let feed_title = feed.title.as_ref().map(|t| t.content.trim().to_string());

    feed.entries
        .iter()
        .filter_map(|entry| {
            let item = item_from_entry(entry, feed_title.as_deref());
            if item.is_none() {
                debug!("Skipping malformed entry {:?}", entry.id);
            }
            item
        })
        .collect()
}

fn item_from_entry(entry: &Entry, feed_title: Option<&str>) -> Option<NewsItem> {
    let title = entry.title.as_ref().map(|t| t.content.trim().to_string())?;
    let link = entry.links.first().map(|l| l.href.trim().to_string())?;
    if title.is_empty() || link.is_empty() {
        return None;
    }

    // Search results carry the publisher as a " - Publisher" title suffix
    let source_name = title
        .rsplit_once(" - ")
        .map(|(_, source)| source.trim().to_string())
        .filter(|s| !s.is_empty())
        .or_else(|| feed_title.map(str::to_string))
        .unwrap_or_default();

    Some(NewsItem {
        title,
        link,
        source_name,
        published_at: entry.published.or(entry.updated),
    })
}

/// Resolves every query in order. A failing query is logged and contributes
/// nothing; the first occurrence of a link wins.
pub async fn fetch_all<S: FeedSource + ?Sized>(source: &S, queries: &[Query]) -> Vec<NewsItem> {
    let mut seen = HashSet::new();
    let mut items = Vec::new();

    for (i, query) in queries.iter().enumerate() {
        match source.fetch(query).await {
            Ok(fetched) => {
                let total = fetched.len();
                let before = items.len();
                items.extend(fetched.into_iter().filter(|item| seen.insert(item.link.clone())));
                info!(
                    query = %query.expression,
                    "Query {}/{}: {} items ({} new)",
                    i + 1,
                    queries.len(),
                    total,
                    items.len() - before
                );
            }
            Err(e) => {
                warn!(query = %query.expression, "Query {}/{} failed: {:#}", i + 1, queries.len(), e);
            }
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>"NBFC" - Google News</title>
    <link>https://news.google.com</link>
    <description>Google News</description>
    <item>
      <title>Shriram Finance raises $500 million - Reuters</title>
      <link>https://news.example.com/a</link>
      <pubDate>Mon, 12 Oct 2026 08:00:00 GMT</pubDate>
      <source url="https://www.reuters.com">Reuters</source>
    </item>
    <item>
      <title>Headline without publisher</title>
      <link>https://news.example.com/b</link>
      <pubDate>not a date</pubDate>
    </item>
    <item>
      <link>https://news.example.com/c</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_items_from_feed() {
        let feed = parser::parse(RSS.as_bytes()).unwrap();
        let items = items_from_feed(&feed);

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].title, "Shriram Finance raises $500 million - Reuters");
        assert_eq!(items[0].source_name, "Reuters");
        assert_eq!(items[0].link, "https://news.example.com/a");
        assert!(items[0].published_at.is_some());

        assert_eq!(items[1].source_name, "\"NBFC\" - Google News");
        assert!(items[1].published_at.is_none());
    }
}
