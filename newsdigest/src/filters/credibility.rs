use super::{Candidate, Filter, FilterContext};

/// Keeps items whose publisher name contains one of the allow-listed names,
/// case-insensitively. An empty allow-list lets everything through.
pub struct CredibilityFilter {
    allowed: Vec<String>,
}

impl CredibilityFilter {
    pub fn new(allowed: &[String]) -> Self {
        Self {
            allowed: allowed
                .iter()
                .map(|s| s.trim().to_lowercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }
}

impl Filter for CredibilityFilter {
    fn name(&self) -> &str {
        "credibility"
    }

    fn accepts(&self, candidate: &Candidate<'_>, _context: &FilterContext) -> bool {
        if self.allowed.is_empty() {
            return true;
        }
        let source = candidate.item.source_name.to_lowercase();
        self.allowed.iter().any(|name| source.contains(name.as_str()))
    }
}
