//! Test fixtures for wiring nodes and crafting operations

use crate::config::{MemberSettings, NodeConfig, NodeSettings};
use crate::core_index::{FileRecord, MemoryFileStore};
use crate::core_log::{NodeId, Operation, OperationKind, Timestamp};
use crate::core_sync::{MemoryTransport, SyncPolicy};
use crate::node::Node;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Node id used by cluster member `index`
pub fn cluster_node_id(index: u16) -> NodeId {
    format!("127.0.0.1:{}", 7001 + index)
}

/// Configuration for member `index` of a `size`-node group
pub fn test_config(index: u16, size: u16, policy: SyncPolicy) -> NodeConfig {
    NodeConfig {
        node: NodeSettings {
            ip: "127.0.0.1".to_string(),
            port: 7001 + index,
            sync_port: 9001 + index,
        },
        publish_dir: PathBuf::from(format!("/tmp/shoal-test/{index}")),
        policy,
        sync_interval: Duration::from_secs(30),
        group: (0..size)
            .map(|i| MemberSettings {
                ip: "127.0.0.1".to_string(),
                port: 7001 + i,
                sync_port: Some(9001 + i),
            })
            .collect(),
    }
}

/// A stamped ADD as another node would have created it
pub fn foreign_add(node: &str, seq: u64, filename: &str) -> Operation {
    let stamp = Timestamp::new(node, seq);
    let record = FileRecord::new(
        filename,
        node,
        format!("/tmp/{filename}"),
        format!("mem://{node}/shared/{filename}"),
        stamp.clone(),
    );
    Operation::new(OperationKind::Add, record, stamp)
}

/// A group of connected nodes sharing one in-memory transport
pub struct TestCluster {
    pub transport: MemoryTransport,
    pub nodes: Vec<Arc<Node>>,
}

impl TestCluster {
    /// Broadcast-policy cluster of `size` nodes, all connected
    pub fn new(size: u16) -> Self {
        Self::with_policy(size, SyncPolicy::Broadcast)
    }

    pub fn with_policy(size: u16, policy: SyncPolicy) -> Self {
        let transport = MemoryTransport::new();
        let nodes: Vec<Arc<Node>> = (0..size)
            .map(|i| {
                let config = test_config(i, size, policy);
                let store = Arc::new(MemoryFileStore::new(config.node_id()));
                let node = Arc::new(Node::new(config, store, Arc::new(transport.clone())));
                transport.register(node.node_id(), node.sync_manager());
                node.connect();
                node
            })
            .collect();

        TestCluster { transport, nodes }
    }

    /// Take member `index` off the wire
    pub fn disconnect(&self, index: usize) {
        let node = &self.nodes[index];
        self.transport.unregister(&node.node_id());
        node.disconnect();
    }

    /// Put member `index` back on the wire
    pub fn reconnect(&self, index: usize) {
        let node = &self.nodes[index];
        self.transport.register(node.node_id(), node.sync_manager());
        node.connect();
    }
}
