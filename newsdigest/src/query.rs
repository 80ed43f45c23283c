//! Search query construction.
//!
//! Turns the configured vocabulary into a handful of short boolean search
//! expressions: one for the sector x action combination and one per chunk of
//! the watchlist, so no single query grows past the search provider's limits.

use anyhow::{Context, Result};
use common::{FeedsConfig, QueryConfig};
use url::Url;

/// A single feed search, immutable once built.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    /// Boolean expression, e.g. `(NBFC OR Banking) AND (deal OR merger)`
    pub expression: String,
    pub recency_days: u32,
    pub locale: Locale,
}

/// Geography / language qualifier appended to every search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Locale {
    pub hl: String,
    pub gl: String,
    pub ceid: String,
}

impl From<&FeedsConfig> for Locale {
    fn from(cfg: &FeedsConfig) -> Self {
        Self {
            hl: cfg.hl.clone(),
            gl: cfg.gl.clone(),
            ceid: cfg.ceid.clone(),
        }
    }
}

impl Query {
    /// Search string as sent in the `q` parameter, recency qualifier included.
    pub fn search_terms(&self) -> String {
        format!("{} when:{}d", self.expression, self.recency_days)
    }

    /// Full search URL against the given endpoint, URL-encoded.
    pub fn to_url(&self, endpoint: &str) -> Result<Url> {
        Url::parse_with_params(
            endpoint,
            &[
                ("q", self.search_terms()),
                ("hl", self.locale.hl.clone()),
                ("gl", self.locale.gl.clone()),
                ("ceid", self.locale.ceid.clone()),
            ],
        )
        .with_context(|| format!("invalid feed endpoint: {}", endpoint))
    }
}

/// Builds the per-run query set from injected vocabulary.
pub struct QueryBuilder {
    config: QueryConfig,
    locale: Locale,
}

impl QueryBuilder {
    pub fn new(config: QueryConfig, locale: Locale) -> Self {
        Self { config, locale }
    }

    /// General query first, then one query per watchlist chunk.
    pub fn build(&self) -> Vec<Query> {
        let mut queries = Vec::new();

        let groups: Vec<String> = [&self.config.sector_keywords, &self.config.action_keywords]
            .into_iter()
            .filter_map(|terms| or_group(terms))
            .collect();
        if !groups.is_empty() {
            queries.push(self.query(groups.join(" AND ")));
        }

        let chunk_size = self.config.chunk_size.max(1);
        let watchlist: Vec<String> = self
            .config
            .watchlist
            .iter()
            .filter(|name| !name.trim().is_empty())
            .cloned()
            .collect();
        for chunk in watchlist.chunks(chunk_size) {
            if let Some(group) = or_group(chunk) {
                queries.push(self.query(group));
            }
        }

        queries
    }

    fn query(&self, expression: String) -> Query {
        Query {
            expression,
            recency_days: self.config.recency_days,
            locale: self.locale.clone(),
        }
    }
}

/// `(a OR "b c")`, or None when every term is blank.
fn or_group(terms: &[String]) -> Option<String> {
    let quoted: Vec<String> = terms
        .iter()
        .map(|t| t.trim())
        .filter(|t| !t.is_empty())
        .map(quote_term)
        .collect();

    if quoted.is_empty() {
        None
    } else {
        Some(format!("({})", quoted.join(" OR ")))
    }
}

fn quote_term(term: &str) -> String {
    if term.contains(char::is_whitespace) {
        format!("\"{}\"", term.replace('"', ""))
    } else {
        term.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn locale() -> Locale {
        Locale::from(&FeedsConfig::default())
    }

    fn config(sector: &[&str], action: &[&str], watchlist: &[&str], chunk_size: usize) -> QueryConfig {
        let owned = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();
        QueryConfig {
            sector_keywords: owned(sector),
            action_keywords: owned(action),
            watchlist: owned(watchlist),
            chunk_size,
            recency_days: 2,
        }
    }

    #[test]
    fn test_general_query_combines_groups() {
        let builder = QueryBuilder::new(config(&["NBFC", "Banking"], &["deal", "merger"], &[], 8), locale());
        let queries = builder.build();

        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].expression, "(NBFC OR Banking) AND (deal OR merger)");
        assert_eq!(queries[0].search_terms(), "(NBFC OR Banking) AND (deal OR merger) when:2d");
    }

    #[test]
    fn test_watchlist_is_chunked() {
        let names: Vec<String> = (1..=10).map(|i| format!("Co{}", i)).collect();
        let refs: Vec<&str> = names.iter().map(|s| s.as_str()).collect();
        let builder = QueryBuilder::new(config(&["NBFC"], &["deal"], &refs, 4), locale());
        let queries = builder.build();

        // 1 general + ceil(10 / 4) chunks
        assert_eq!(queries.len(), 4);
        assert_eq!(queries[1].expression, "(Co1 OR Co2 OR Co3 OR Co4)");
        assert_eq!(queries[3].expression, "(Co9 OR Co10)");
    }

    #[test]
    fn test_multi_word_terms_are_quoted() {
        let builder = QueryBuilder::new(config(&[], &[], &["Bajaj Finance", "IIFL"], 8), locale());
        let queries = builder.build();

        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].expression, "(\"Bajaj Finance\" OR IIFL)");
    }

    #[test]
    fn test_empty_groups_are_dropped() {
        let builder = QueryBuilder::new(config(&["NBFC"], &["  "], &[], 0), locale());
        let queries = builder.build();

        assert_eq!(queries.len(), 1);
        assert_eq!(queries[0].expression, "(NBFC)");

        let builder = QueryBuilder::new(config(&[], &[], &[], 8), locale());
        assert!(builder.build().is_empty());
    }

    #[test]
    fn test_url_is_encoded_with_locale() {
        let builder = QueryBuilder::new(config(&["NBFC"], &["deal"], &[], 8), locale());
        let queries = builder.build();
        let url = queries[0].to_url("https://news.google.com/rss/search").unwrap();

        let pairs: Vec<(String, String)> = url.query_pairs().into_owned().collect();
        assert_eq!(pairs[0], ("q".to_string(), "(NBFC) AND (deal) when:2d".to_string()));
        assert!(pairs.contains(&("gl".to_string(), "IN".to_string())));
        assert!(pairs.contains(&("ceid".to_string(), "IN:en".to_string())));
        assert!(!url.as_str().contains(' '));
    }
}
