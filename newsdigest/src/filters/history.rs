use super::{Candidate, Filter, FilterContext};
use crate::history::HistoryRecord;

/// Drops items already surfaced by a previous run, or earlier in this one.
pub struct HistoryFilter {
    record: HistoryRecord,
}

impl HistoryFilter {
    pub fn new(record: HistoryRecord) -> Self {
        Self { record }
    }
}

impl Filter for HistoryFilter {
    fn name(&self) -> &str {
        "history"
    }

    fn accepts(&self, candidate: &Candidate<'_>, context: &FilterContext) -> bool {
        !self.record.contains(&candidate.link_hash) && !context.has_accepted(&candidate.link_hash)
    }
}
