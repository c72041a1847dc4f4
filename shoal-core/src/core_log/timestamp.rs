/*
    timestamp.rs - Per-node logical stamps for operation ordering

    Every operation a node creates carries a stamp of that node's
    identifier and a strictly increasing sequence number. Stamps from
    the same node are totally ordered by sequence number; stamps from
    different nodes carry no order at all, so the comparison surface
    makes that case unrepresentable instead of silently comparing.
*/

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;

/// Node identifier, `ip:port` as listed in the group configuration
pub type NodeId = String;

/// Logical stamp of a single operation
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Timestamp {
    node_id: NodeId,
    seq_number: u64,
}

impl Timestamp {
    pub fn new(node_id: impl Into<NodeId>, seq_number: u64) -> Self {
        Timestamp { node_id: node_id.into(), seq_number }
    }

    /// Node that issued this stamp
    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    pub fn seq_number(&self) -> u64 {
        self.seq_number
    }

    /// Order two stamps issued by the same node.
    ///
    /// Returns `None` when the stamps come from different nodes; such
    /// stamps are incomparable and callers must not fabricate an order
    /// for them.
    pub fn partial_cmp(&self, other: &Timestamp) -> Option<Ordering> {
        if self.node_id != other.node_id {
            return None;
        }
        Some(self.seq_number.cmp(&other.seq_number))
    }

    /// True when this stamp supersedes `other`.
    ///
    /// A missing counterpart means the other side has never seen
    /// anything from this node, so any stamp is newer than `None`.
    /// Stamps from a different node are never considered newer.
    pub fn is_newer_than(&self, other: Option<&Timestamp>) -> bool {
        match other {
            None => true,
            Some(other) => matches!(self.partial_cmp(other), Some(Ordering::Greater)),
        }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{},{}]", self.node_id, self.seq_number)
    }
}
