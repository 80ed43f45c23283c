//! Near-duplicate detection across publishers.
//!
//! The same event is usually covered by several outlets under different links,
//! so the history check cannot catch it. Headlines are compared as word sets.

use std::collections::HashSet;

use super::{Candidate, Filter, FilterContext};

/// Words of a normalized title longer than 3 characters.
pub fn title_tokens(normalized_title: &str) -> HashSet<String> {
    normalized_title
        .split_whitespace()
        .map(|w| w.chars().filter(|c| c.is_alphanumeric()).collect::<String>().to_lowercase())
        .filter(|w| w.chars().count() > 3)
        .collect()
}

/// |A ∩ B| / |A ∪ B|; two empty sets are not similar.
pub fn jaccard_similarity(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Drops items whose title is more than `threshold` similar to any title
/// already accepted in this run.
pub struct SimilarityFilter {
    threshold: f64,
}

impl SimilarityFilter {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }
}

impl Filter for SimilarityFilter {
    fn name(&self) -> &str {
        "similarity"
    }

    fn accepts(&self, candidate: &Candidate<'_>, context: &FilterContext) -> bool {
        context
            .accepted_titles()
            .iter()
            .all(|accepted| jaccard_similarity(&candidate.tokens, accepted) <= self.threshold)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::normalize_title;

    fn tokens(title: &str) -> HashSet<String> {
        title_tokens(&normalize_title(title))
    }

    #[test]
    fn test_short_words_are_dropped() {
        let t = tokens("RBI fines two NBFCs for KYC lapses - Mint");
        let expected: HashSet<String> = ["fines", "nbfcs", "lapses"].iter().map(|s| s.to_string()).collect();
        assert_eq!(t, expected);
    }

    #[test]
    fn test_jaccard_similarity() {
        // 6 shared of 10 distinct words
        let a = tokens("Bajaj Finance acquires minority stake in fintech startup Alpha");
        let b = tokens("Bajaj Finance acquires stake in Alpha fintech lender platform");
        assert!((jaccard_similarity(&a, &b) - 0.6).abs() < 1e-9);

        let empty = HashSet::new();
        assert_eq!(jaccard_similarity(&empty, &empty), 0.0);
        assert_eq!(jaccard_similarity(&a, &a), 1.0);
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let filter = SimilarityFilter::new(0.45);
        let mut context = FilterContext::new(chrono::Utc::now());

        // 9 shared of 20 distinct words: exactly 0.45
        let accepted = "alpha bravo charlie delta echoes foxtrot golf1 hotel india1 julia1 kilo1 lima1 mike1 nova1 oscar1";
        let borderline = "alpha bravo charlie delta echoes foxtrot golf1 hotel india1 papa1 quebec romeo sierra tango1";
        let near = "alpha bravo charlie delta echoes foxtrot golf1 hotel india1 julia1 kilo1 lima1 zulu1";

        let first = crate::ingestion::NewsItem {
            title: accepted.to_string(),
            link: "https://x/1".to_string(),
            source_name: "Mint".to_string(),
            published_at: None,
        };
        let first_candidate = Candidate::new(&first);
        assert!(filter.accepts(&first_candidate, &context));
        context.accept(first_candidate);

        let second = crate::ingestion::NewsItem { title: borderline.to_string(), link: "https://x/2".to_string(), ..first.clone() };
        let third = crate::ingestion::NewsItem { title: near.to_string(), link: "https://x/3".to_string(), ..first.clone() };

        assert!((jaccard_similarity(&tokens(accepted), &tokens(borderline)) - 0.45).abs() < 1e-9);
        assert!(filter.accepts(&Candidate::new(&second), &context));
        assert!(!filter.accepts(&Candidate::new(&third), &context));
    }
}
