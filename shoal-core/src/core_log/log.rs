/*
    log.rs - Append-only per-node operation history

    One ordered sub-log per originating node, keyed by sequence number.
    Sequence numbers are not assumed dense: clocks may skip values, so
    every range walk goes through the ordered map rather than counting.
    The only removal is a contiguous prefix drop driven by the causal
    garbage collector.
*/

use super::operation::Operation;
use super::timestamp::{NodeId, Timestamp};
use std::collections::{BTreeMap, HashMap};
use std::ops::Bound;

/// Operations known to a node, grouped by originating node
#[derive(Debug, Default)]
pub struct OperationLog {
    data: HashMap<NodeId, BTreeMap<u64, Operation>>,
}

impl OperationLog {
    pub fn new() -> Self {
        OperationLog { data: HashMap::new() }
    }

    /// Append an operation under its origin node. Re-adding an already
    /// present sequence number overwrites the entry.
    pub fn add(&mut self, op: Operation) {
        let stamp = op.timestamp().clone();
        self.data
            .entry(stamp.node_id().to_string())
            .or_default()
            .insert(stamp.seq_number(), op);
    }

    /// Earliest retained operation for `node_id`
    pub fn first(&self, node_id: &str) -> Option<&Operation> {
        self.data.get(node_id).and_then(|ops| ops.values().next())
    }

    /// Operations of `node_id` within `(from, to]`, ascending; with
    /// `include_from` the lower bound becomes inclusive.
    ///
    /// An absent `from` means the requesting side has never seen this
    /// node, so the range starts at the earliest retained operation and
    /// that boundary is always included.
    pub fn extract(
        &self,
        node_id: &str,
        from: Option<&Timestamp>,
        to: &Timestamp,
        include_from: bool,
    ) -> Vec<Operation> {
        let Some(ops) = self.data.get(node_id) else {
            return Vec::new();
        };

        let lower = match from {
            None => Bound::Unbounded,
            Some(from) if include_from => Bound::Included(from.seq_number()),
            Some(from) => Bound::Excluded(from.seq_number()),
        };

        ops.range((lower, Bound::Included(to.seq_number())))
            .map(|(_, op)| op.clone())
            .collect()
    }

    /// Drop every retained operation of `node_id` stamped at or before
    /// `last_seen`. Removes exactly the keys present in that range.
    pub fn remove_all_preceding(&mut self, node_id: &str, last_seen: &Timestamp) -> usize {
        let Some(ops) = self.data.get_mut(node_id) else {
            return 0;
        };

        let before = ops.len();
        ops.retain(|&seq, _| seq > last_seen.seq_number());
        before - ops.len()
    }

    /// Every retained operation, flattened across origin nodes
    pub fn operations(&self) -> Vec<Operation> {
        self.data.values().flat_map(|ops| ops.values().cloned()).collect()
    }

    /// Retained operations of one origin node, ascending
    pub fn operations_of(&self, node_id: &str) -> Vec<Operation> {
        self.data
            .get(node_id)
            .map(|ops| ops.values().cloned().collect())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.data.values().map(|ops| ops.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.data.values().all(|ops| ops.is_empty())
    }
}
