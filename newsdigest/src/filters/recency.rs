//! Age filter on the published timestamp.

use chrono::Duration;

use super::{Candidate, Filter, FilterContext};

/// Drops items published more than `max_age_days` before the run clock.
///
/// Items without a usable timestamp are kept: date formats in search feeds
/// vary too much to treat a missing date as evidence of age.
pub struct RecencyFilter {
    max_age: Duration,
}

impl RecencyFilter {
    pub fn new(max_age_days: u32) -> Self {
        Self {
            max_age: Duration::days(i64::from(max_age_days)),
        }
    }
}

impl Filter for RecencyFilter {
    fn name(&self) -> &str {
        "recency"
    }

    fn accepts(&self, candidate: &Candidate<'_>, context: &FilterContext) -> bool {
        match candidate.item.published_at {
            Some(published) => context.now - published <= self.max_age,
            None => true,
        }
    }
}
