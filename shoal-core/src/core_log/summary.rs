/*
    summary.rs - Version vector of operations known to a node

    Maps each originating node to the highest stamp seen from it.
    Updates are pointwise-max merges and never move an entry backward,
    which is the invariant the dedup check and the garbage collector
    both lean on.
*/

use super::timestamp::{NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Summary vector: origin node to highest stamp seen
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Summary {
    data: HashMap<NodeId, Timestamp>,
}

impl Summary {
    pub fn new() -> Self {
        Summary { data: HashMap::new() }
    }

    /// Fold one stamp in, keeping the entry monotonic
    pub fn update(&mut self, timestamp: &Timestamp) {
        let newer = timestamp.is_newer_than(self.data.get(timestamp.node_id()));
        if newer {
            self.data.insert(timestamp.node_id().to_string(), timestamp.clone());
        }
    }

    /// Fold every entry of another summary in
    pub fn merge(&mut self, other: &Summary) {
        for timestamp in other.data.values() {
            self.update(timestamp);
        }
    }

    /// Highest stamp known for `node_id`
    pub fn last(&self, node_id: &str) -> Option<&Timestamp> {
        self.data.get(node_id)
    }

    /// Identifiers of every summarized node
    pub fn summarized_nodes(&self) -> Vec<NodeId> {
        self.data.keys().cloned().collect()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}
