/*
    synchronizer.rs - One bilateral sync session

    Pull the peer's vectors, push the delta it is missing together with
    our own vectors, apply what comes back, fold in its
    acknowledgments. One round trip per pairwise synchronization.

    The availability claim on the peer is released by a drop guard, so
    every exit path (clean, error, panic) frees the peer for the next
    round.
*/

use super::errors::SyncResult;
use super::peer::Peer;
use super::session::SyncRequest;
use super::sync_map::{AvailabilityGuard, SyncMap};
use super::transport::PeerTransport;
use crate::core_log::OperationManager;
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one session against a single peer
pub struct Synchronizer {
    peer: Peer,
    operations: Arc<OperationManager>,
    sync_map: Arc<SyncMap>,
    transport: Arc<dyn PeerTransport>,
}

impl Synchronizer {
    pub fn new(
        peer: Peer,
        operations: Arc<OperationManager>,
        sync_map: Arc<SyncMap>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        Synchronizer { peer, operations, sync_map, transport }
    }

    pub async fn run(self) -> SyncResult<()> {
        let _guard = AvailabilityGuard::new(self.sync_map.clone(), self.peer.id.clone());
        debug!(peer = %self.peer.id, "starting sync session");

        let handle = self.transport.resolve(&self.peer).await?;
        let peer_summary = handle.summary().await?;
        let peer_acks = handle.ack_summary().await?;

        let (ops, summary, acks) =
            self.operations.prepare_session(&self.peer.id, &peer_summary);
        let pushed = ops.len();

        let request = SyncRequest {
            from: self.operations.node_id().to_string(),
            ops,
            summary,
            acks,
        };

        let response = handle.perform_sync_session(request).await?;
        let pulled = self.operations.update_log(&response.ops)?;
        self.operations.update_acks(&peer_acks);

        counter!("shoal_sync_sessions_total").increment(1);
        info!(peer = %self.peer.id, pushed, pulled, "sync session complete");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_index::MemoryFileStore;
    use crate::core_log::{OperationKind, Timestamp};
    use crate::core_sync::manager::SyncManager;
    use crate::core_sync::transport::MemoryTransport;
    use crate::core_sync::SyncError;
    use crate::core_sync::SyncPolicy;
    use std::path::Path;

    fn node(id: &str, peers: Vec<Peer>, transport: &MemoryTransport) -> Arc<SyncManager> {
        let operations =
            Arc::new(OperationManager::new(id, Arc::new(MemoryFileStore::new(id))));
        Arc::new(SyncManager::new(peers, SyncPolicy::Broadcast, operations, Arc::new(transport.clone())))
    }

    #[tokio::test]
    async fn test_session_converges_two_nodes() {
        let transport = MemoryTransport::new();
        let peer_a = Peer::new("127.0.0.1", 7001, 9001);
        let peer_b = Peer::new("127.0.0.1", 7002, 9002);

        let a = node(&peer_a.id, vec![peer_b.clone()], &transport);
        let b = node(&peer_b.id, vec![peer_a.clone()], &transport);
        transport.register(peer_a.id.clone(), a.clone());
        transport.register(peer_b.id.clone(), b.clone());

        let op_a = a
            .operations()
            .create_operation(OperationKind::Add, Path::new("/data/f1.txt"))
            .unwrap();
        a.operations().execute_operation(&op_a).unwrap();

        let op_b = b
            .operations()
            .create_operation(OperationKind::Add, Path::new("/data/f2.txt"))
            .unwrap();
        b.operations().execute_operation(&op_b).unwrap();

        let synchronizer = Synchronizer::new(
            peer_b.clone(),
            a.operations().clone(),
            Arc::new(SyncMap::new()),
            Arc::new(transport.clone()),
        );
        synchronizer.run().await.unwrap();

        // both sides now know both operations
        assert_eq!(a.operations().summary(), b.operations().summary());
        assert_eq!(a.operations().log_operations().len(), 2);
        assert_eq!(b.operations().log_operations().len(), 2);

        assert_eq!(
            a.operations().summary().last(&peer_a.id).map(Timestamp::seq_number),
            Some(1)
        );
        assert_eq!(
            a.operations().summary().last(&peer_b.id).map(Timestamp::seq_number),
            Some(1)
        );
    }

    #[tokio::test]
    async fn test_unreachable_peer_fails_and_releases() {
        let transport = MemoryTransport::new();
        let ghost = Peer::new("127.0.0.1", 7009, 9009);

        let operations = Arc::new(OperationManager::new(
            "127.0.0.1:7001",
            Arc::new(MemoryFileStore::new("127.0.0.1:7001")),
        ));
        let sync_map = Arc::new(SyncMap::new());
        sync_map.set_unavailable(&ghost.id);

        let synchronizer = Synchronizer::new(
            ghost.clone(),
            operations,
            sync_map.clone(),
            Arc::new(transport),
        );

        let err = synchronizer.run().await;
        assert!(matches!(err, Err(SyncError::Unreachable(_))));

        // the guard released the peer despite the failure
        assert!(sync_map.is_available(&ghost.id));
    }
}
