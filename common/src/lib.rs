/*!
common/src/lib.rs

Shared configuration types for newsdigest.

This file provides:
- Config data structures (deserialized from TOML)
- An async loader for a TOML config file, with default + override layering
- Built-in defaults for the NBFC / Indian banking vocabulary
*/

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Feed search endpoint and politeness settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedsConfig {
    /// RSS search endpoint (Google News search by default)
    pub endpoint: String,
    pub timeout_seconds: Option<u64>,
    pub user_agent: Option<String>,
    /// Interface language, e.g. "en-IN"
    pub hl: String,
    /// Geography, e.g. "IN"
    pub gl: String,
    /// Edition, e.g. "IN:en"
    pub ceid: String,
}

impl Default for FeedsConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://news.google.com/rss/search".to_string(),
            timeout_seconds: Some(15),
            user_agent: None,
            hl: "en-IN".to_string(),
            gl: "IN".to_string(),
            ceid: "IN:en".to_string(),
        }
    }
}

/// Search vocabulary used to build queries
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryConfig {
    pub sector_keywords: Vec<String>,
    pub action_keywords: Vec<String>,
    /// Named entities tracked individually, searched in chunks
    pub watchlist: Vec<String>,
    pub chunk_size: usize,
    /// Search recency window, rendered as `when:<N>d`
    pub recency_days: u32,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            sector_keywords: strings(&["NBFC", "Non-Banking Financial", "Banking", "Microfinance"]),
            action_keywords: strings(&[
                "investment",
                "deal",
                "funding",
                "acquisition",
                "merger",
                "stake",
                "RBI",
            ]),
            watchlist: strings(&[
                "Bajaj Finance",
                "Shriram Finance",
                "Cholamandalam Finance",
                "Muthoot Finance",
                "Manappuram Finance",
                "Mahindra Finance",
                "L&T Finance",
                "Aditya Birla Capital",
                "Poonawalla Fincorp",
                "Piramal Enterprises",
                "IIFL Finance",
                "Tata Capital",
                "HDB Financial",
                "Five Star Business Finance",
                "Aavas Financiers",
                "Home First Finance",
            ]),
            chunk_size: 8,
            recency_days: 2,
        }
    }
}

/// Filter stage vocabulary and thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterConfig {
    /// Items published longer ago than this are dropped (undated items are kept)
    pub max_age_days: u32,
    /// Publisher allow-list, matched case-insensitively as substrings of the source name
    pub credible_sources: Vec<String>,
    pub noise_keywords: Vec<String>,
    pub fundamentals_terms: Vec<String>,
    pub bad_context_terms: Vec<String>,
    pub similarity_threshold: f64,
    pub max_items: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_age_days: 2,
            credible_sources: strings(&[
                "Economic Times",
                "Moneycontrol",
                "Mint",
                "Business Standard",
                "Financial Express",
                "Hindu BusinessLine",
                "BusinessLine",
                "Reuters",
                "Bloomberg",
                "CNBC",
                "NDTV Profit",
                "Times of India",
                "The Hindu",
                "Business Today",
                "Inc42",
                "Entrackr",
                "VCCircle",
                "Fortune India",
            ]),
            noise_keywords: strings(&[
                // price action
                "share price",
                "share",
                "stock",
                "rally",
                "surge",
                "jumps",
                "slumps",
                "tumbles",
                "52-week",
                "market cap",
                "sensex",
                "nifty",
                // technical analysis
                "technical",
                "breakout",
                "support level",
                "resistance",
                // brokerage ratings
                "target",
                "buy rating",
                "sell rating",
                "upgrade",
                "downgrade",
                "brokerage",
                // day trading
                "intraday",
                "stocks to buy",
                "trading ideas",
                // corporate actions
                "dividend",
                "bonus issue",
                "stock split",
                "record date",
            ]),
            fundamentals_terms: strings(&[
                "profit",
                "result",
                "earnings",
                "revenue",
                "quarter",
                "net interest income",
                "aum",
            ]),
            bad_context_terms: strings(&["share", "stock", "target", "dividend"]),
            similarity_threshold: 0.45,
            max_items: 25,
        }
    }
}

/// Cross-run history file location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Path to the newline-delimited hash file (e.g. "data/history.txt")
    pub path: String,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        Self {
            path: "data/history.txt".to_string(),
        }
    }
}

/// Generation provider config (Gemini generateContent API)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    pub api_url: String,
    /// Name of the env var holding the API key
    pub api_key_env: Option<String>,
    /// Ordered model candidates, preferred first
    pub models: Vec<String>,
    pub timeout_seconds: Option<u64>,
    pub max_attempts: Option<u32>,
    pub backoff_seconds: Option<u64>,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            api_url: "https://generativelanguage.googleapis.com/v1beta".to_string(),
            api_key_env: None,
            models: strings(&[
                "gemini-2.5-flash",
                "gemini-2.5-flash-lite",
                "gemini-3.0-pro-preview",
                "gemini-2.0-flash",
            ]),
            timeout_seconds: Some(30),
            max_attempts: Some(3),
            backoff_seconds: Some(5),
        }
    }
}

/// Where the generated digest goes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// "stdout" or "file"
    pub kind: String,
    /// Output path when `kind = "file"`
    pub path: Option<String>,
    pub recipients: Vec<String>,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            kind: "stdout".to_string(),
            path: None,
            recipients: Vec::new(),
        }
    }
}

/// Top-level application configuration (deserialized from config.toml)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub feeds: FeedsConfig,
    pub queries: QueryConfig,
    pub filters: FilterConfig,
    pub history: HistoryConfig,
    pub llm: LlmConfig,
    pub delivery: DeliveryConfig,
}

impl Config {
    /// Load configuration from a TOML file asynchronously.
    ///
    /// Example:
    ///   let cfg = Config::from_file("config.toml").await?;
    pub async fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = tokio::fs::read_to_string(path.as_ref())
            .await
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;
        let cfg: Config = toml::from_str(&data).context("Failed to parse TOML configuration")?;
        Ok(cfg)
    }

    /// Load configuration with an optional default file and an optional override file.
    /// If both are present, they are merged (override takes precedence).
    pub async fn load_with_defaults(default_path: Option<&Path>, override_path: Option<&Path>) -> Result<Self> {
        let mut config_value = toml::Value::Table(toml::map::Map::new());

        for path in [default_path, override_path].into_iter().flatten() {
            if !path.exists() {
                continue;
            }
            let data = tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let val: toml::Value = toml::from_str(&data)
                .with_context(|| format!("Failed to parse configuration: {}", path.display()))?;
            merge_toml(&mut config_value, val);
        }

        let cfg: Config = config_value.try_into().context("Failed to parse merged configuration")?;
        Ok(cfg)
    }

    /// Resolve the generation API key: the configured env var first, then the
    /// conventional Gemini variable names.
    pub fn api_key(&self) -> Result<String> {
        let mut names: Vec<&str> = Vec::new();
        if let Some(name) = self.llm.api_key_env.as_deref() {
            names.push(name);
        }
        names.extend(["GEMINI_API_KEY", "GOOGLE_API_KEY"]);

        names
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.trim().is_empty()))
            .with_context(|| format!("no API key found in env vars {:?}", names))
    }
}

fn merge_toml(a: &mut toml::Value, b: toml::Value) {
    match (a, b) {
        (toml::Value::Table(a_map), toml::Value::Table(b_map)) => {
            for (k, v) in b_map {
                if let Some(a_val) = a_map.get_mut(&k) {
                    merge_toml(a_val, v);
                } else {
                    a_map.insert(k, v);
                }
            }
        }
        (a_val, b_val) => *a_val = b_val,
    }
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}
