//! Keyword noise filter.
//!
//! Price action, technical analysis, brokerage calls and corporate-action
//! coverage share vocabulary with genuine results coverage ("profit", "share",
//! "quarter"), so a noise hit is forgiven when the title also talks about
//! fundamentals, unless it additionally carries a bad-context term.

use super::{Candidate, Filter, FilterContext};

/// Lowercased headline with the trailing " - Publisher" suffix and all
/// punctuation removed, whitespace collapsed.
pub fn normalize_title(title: &str) -> String {
    let headline = match title.rsplit_once(" - ") {
        Some((headline, _source)) => headline,
        None => title,
    };

    let stripped: String = headline
        .chars()
        .filter(|c| c.is_alphanumeric() || c.is_whitespace())
        .collect();

    stripped
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub struct NoiseFilter {
    noise: Vec<String>,
    fundamentals: Vec<String>,
    bad_context: Vec<String>,
}

impl NoiseFilter {
    /// Terms are normalized the same way titles are, so "52-week" matches
    /// "52-week high" once both lose their hyphen.
    pub fn new(noise: &[String], fundamentals: &[String], bad_context: &[String]) -> Self {
        Self {
            noise: normalize_terms(noise),
            fundamentals: normalize_terms(fundamentals),
            bad_context: normalize_terms(bad_context),
        }
    }

    fn is_noise(&self, normalized_title: &str) -> bool {
        if !contains_any(normalized_title, &self.noise) {
            return false;
        }
        if contains_any(normalized_title, &self.fundamentals) {
            return contains_any(normalized_title, &self.bad_context);
        }
        true
    }
}

impl Filter for NoiseFilter {
    fn name(&self) -> &str {
        "noise"
    }

    fn accepts(&self, candidate: &Candidate<'_>, _context: &FilterContext) -> bool {
        !self.is_noise(&candidate.normalized_title)
    }
}

fn normalize_terms(terms: &[String]) -> Vec<String> {
    terms
        .iter()
        .map(|t| normalize_title(t))
        .filter(|t| !t.is_empty())
        .collect()
}

/// Plain substring test, so a keyword also matches its inflections.
fn contains_any(haystack: &str, needles: &[String]) -> bool {
    needles.iter().any(|n| haystack.contains(n.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use common::FilterConfig;

    fn default_filter() -> NoiseFilter {
        let cfg = FilterConfig::default();
        NoiseFilter::new(&cfg.noise_keywords, &cfg.fundamentals_terms, &cfg.bad_context_terms)
    }

    #[test]
    fn test_normalize_title() {
        assert_eq!(
            normalize_title("Firm X posts strong profit - Times of India"),
            "firm x posts strong profit"
        );
        assert_eq!(normalize_title("  RBI's  new   norms!  "), "rbis new norms");
        assert_eq!(normalize_title("Stock hits 52-week high - Moneycontrol"), "stock hits 52week high");
    }

    #[test]
    fn test_normalize_cuts_at_last_separator() {
        assert_eq!(
            normalize_title("Q2 update - lending grows - Business Standard"),
            "q2 update lending grows"
        );
    }

    #[test]
    fn test_price_action_is_noise() {
        let filter = default_filter();
        assert!(filter.is_noise(&normalize_title("Bajaj Finance share price today - Mint")));
        assert!(filter.is_noise(&normalize_title("Stock hits 52-week high - Moneycontrol")));
        assert!(filter.is_noise(&normalize_title("Brokerage sees upside, sets target of Rs 900")));
    }

    #[test]
    fn test_fundamentals_forgive_noise_without_bad_context() {
        let filter = default_filter();
        assert!(!filter.is_noise(&normalize_title(
            "Cholamandalam profit surges 30% in September quarter - Reuters"
        )));
        assert!(!filter.is_noise(&normalize_title("Muthoot Finance quarter profit rises - Mint")));
    }

    #[test]
    fn test_fundamentals_with_bad_context_is_noise() {
        let filter = default_filter();
        assert!(filter.is_noise(&normalize_title("Shriram Finance profit beats estimates, share jumps 5%")));
        assert!(filter.is_noise(&normalize_title("Mahindra Finance Q2 profit up; declares dividend")));
    }

    #[test]
    fn test_keywords_match_inside_words() {
        let filter = default_filter();
        // "surge" covers "surges" and "surged"
        assert!(filter.is_noise(&normalize_title("Manappuram Finance surged on gold prices - Mint")));
        // and "share" covers "shareholding"
        assert!(filter.is_noise(&normalize_title(
            "Bajaj Finserv raises shareholding in Bajaj Finance - Reuters"
        )));
        assert!(filter.is_noise(&normalize_title("Microfinance lenders gain market share - Mint")));
    }

    #[test]
    fn test_clean_deal_headline_passes() {
        let filter = default_filter();
        assert!(!filter.is_noise(&normalize_title(
            "Piramal Enterprises completes acquisition of housing lender - Business Standard"
        )));
    }
}
