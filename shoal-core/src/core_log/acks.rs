/*
    acks.rs - Acknowledgment vector

    For each group member, the last summary that member is known to
    have reported. An entry only changes through sync sessions, always
    by never-regress merge. The garbage collector reads this to find
    the highest stamp every member has provably seen.
*/

use super::summary::Summary;
use super::timestamp::{NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Per-member record of reported summaries
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AckSummary {
    data: HashMap<NodeId, Summary>,
}

impl AckSummary {
    pub fn new() -> Self {
        AckSummary { data: HashMap::new() }
    }

    /// Fold a summary reported by `member` into its entry
    pub fn record(&mut self, member: impl Into<NodeId>, summary: &Summary) {
        self.data.entry(member.into()).or_default().merge(summary);
    }

    /// Fold every entry of another acknowledgment vector in
    pub fn update(&mut self, other: &AckSummary) {
        for (member, summary) in &other.data {
            self.record(member.clone(), summary);
        }
    }

    pub fn get(&self, member: &str) -> Option<&Summary> {
        self.data.get(member)
    }

    /// Members a reported summary is held for
    pub fn acked_members(&self) -> Vec<NodeId> {
        self.data.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Highest stamp of `origin` that every recorded member has seen.
    ///
    /// `None` when any member's reported summary lacks an entry for
    /// `origin` (or when no summaries are recorded at all): without a
    /// report from every member nothing of `origin` is provably safe
    /// to reclaim.
    pub fn lowest_common_stamp(&self, origin: &str) -> Option<&Timestamp> {
        let mut floor: Option<&Timestamp> = None;

        for summary in self.data.values() {
            let last = summary.last(origin)?;
            floor = match floor {
                Some(current) if current.seq_number() <= last.seq_number() => Some(current),
                _ => Some(last),
            };
        }

        floor
    }
}
