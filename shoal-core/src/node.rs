/*
    node.rs - Node facade

    Wires configuration, the file store, the operation engine and the
    sync driver into the surface the surrounding application talks to:
    share and retract files, inspect replicated state, trigger a sync
    round. Collaborators (storage, transport) are injected; the facade
    owns nothing wire- or disk-specific.
*/

use crate::config::NodeConfig;
use crate::core_index::{FileRecord, FileStore};
use crate::core_log::{
    AckSummary, NodeId, Operation, OperationKind, OperationManager, OperationResult, Summary,
};
use crate::core_sync::{PeerTransport, SyncManager};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::info;

/// One member of a shoal group
pub struct Node {
    config: NodeConfig,
    connected: AtomicBool,
    file_store: Arc<dyn FileStore>,
    operations: Arc<OperationManager>,
    sync: Arc<SyncManager>,
}

impl Node {
    pub fn new(
        config: NodeConfig,
        file_store: Arc<dyn FileStore>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        let operations =
            Arc::new(OperationManager::new(config.node_id(), file_store.clone()));
        let sync = Arc::new(SyncManager::new(
            config.peers(),
            config.policy,
            operations.clone(),
            transport,
        ));

        Node { config, connected: AtomicBool::new(false), file_store, operations, sync }
    }

    pub fn node_id(&self) -> NodeId {
        self.config.node_id()
    }

    pub fn config(&self) -> &NodeConfig {
        &self.config
    }

    /// Serve side of the node; register this with the transport to
    /// make the node reachable by its peers
    pub fn sync_manager(&self) -> Arc<SyncManager> {
        self.sync.clone()
    }

    /// Join the group: the node starts taking part in sync rounds
    pub fn connect(&self) {
        self.connected.store(true, Ordering::SeqCst);
        info!(node = %self.node_id(), "connected to group");
    }

    /// Leave the group; replicated state stays intact
    pub fn disconnect(&self) {
        self.connected.store(false, Ordering::SeqCst);
        info!(node = %self.node_id(), "disconnected from group");
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::SeqCst)
    }

    /// Share a file with the group. Creates and applies the ADD
    /// synchronously; replication happens on the next sync round.
    pub fn add(&self, path: &Path) -> OperationResult<Operation> {
        let op = self.operations.create_operation(OperationKind::Add, path)?;
        self.operations.execute_operation(&op)?;
        info!(%op, "shared file");
        Ok(op)
    }

    /// Retract a shared file. Fails when nothing matches `path` or the
    /// file belongs to another node.
    pub fn remove(&self, path: &Path) -> OperationResult<Operation> {
        let op = self.operations.create_operation(OperationKind::Remove, path)?;
        self.operations.execute_operation(&op)?;
        info!(%op, "retracted file");
        Ok(op)
    }

    /// Current view of every file shared within the group
    pub fn index(&self) -> Vec<FileRecord> {
        self.file_store.list()
    }

    /// Retained operation log, across origin nodes
    pub fn log(&self) -> Vec<Operation> {
        self.operations.log_operations()
    }

    pub fn summary(&self) -> Summary {
        self.operations.summary()
    }

    pub fn ack_summary(&self) -> AckSummary {
        self.operations.acks()
    }

    /// Run one sync round; blocks until every session finishes
    pub async fn start_sync_session(&self) -> usize {
        self.sync.start_session().await
    }

    /// Drive rounds forever at the configured interval. Rounds are
    /// skipped while disconnected; callers spawn and abort this.
    pub async fn run_sync_loop(&self) {
        let mut interval = tokio::time::interval(self.config.sync_interval);
        loop {
            interval.tick().await;
            if self.is_connected() {
                self.start_sync_session().await;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_log::OperationError;
    use crate::test_utils::TestCluster;

    #[tokio::test]
    async fn test_add_updates_index_log_and_summary() {
        let cluster = TestCluster::new(2);
        let node = &cluster.nodes[0];

        node.add(Path::new("/data/a.txt")).unwrap();

        assert_eq!(node.index().len(), 1);
        assert_eq!(node.log().len(), 1);
        assert!(node.summary().last(&node.node_id()).is_some());
    }

    #[tokio::test]
    async fn test_remove_unknown_file_fails() {
        let cluster = TestCluster::new(2);
        let err = cluster.nodes[0].remove(Path::new("/data/ghost.txt"));
        assert!(matches!(err, Err(OperationError::TargetNotFound { .. })));
    }

    #[tokio::test]
    async fn test_remove_foreign_file_is_unauthorized() {
        let cluster = TestCluster::new(2);
        let (a, b) = (&cluster.nodes[0], &cluster.nodes[1]);

        a.add(Path::new("/data/a.txt")).unwrap();
        a.start_sync_session().await;

        // b now indexes a's file but does not own it
        assert_eq!(b.index().len(), 1);
        let err = b.remove(Path::new("/data/a.txt"));
        assert!(matches!(err, Err(OperationError::Unauthorized { .. })));

        // nothing changed on either side
        assert_eq!(b.index().len(), 1);
        assert_eq!(a.index().len(), 1);
    }

    #[tokio::test]
    async fn test_connect_flag() {
        let cluster = TestCluster::new(1);
        let node = &cluster.nodes[0];

        assert!(node.is_connected());
        node.disconnect();
        assert!(!node.is_connected());
    }
}
