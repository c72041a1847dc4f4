/*
    manager.rs - Drives one full anti-entropy round

    Selection through the configured policy, one concurrent session per
    selected peer, a barrier join, then causal garbage collection. A
    failed session is logged and swallowed; the peer stays in the group
    and gets retried whenever a later round selects it again.

    The manager is also the node's serve side: the transport hands
    inbound session calls to its SyncEndpoint implementation.
*/

use super::errors::SyncResult;
use super::peer::Peer;
use super::policy::SyncPolicy;
use super::session::{SyncRequest, SyncResponse};
use super::sync_map::SyncMap;
use super::synchronizer::Synchronizer;
use super::transport::{PeerTransport, SyncEndpoint};
use crate::core_log::{AckSummary, OperationManager, Summary};
use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Fans a sync round out across the group
pub struct SyncManager {
    peers: Vec<Peer>,
    policy: SyncPolicy,
    sync_map: Arc<SyncMap>,
    operations: Arc<OperationManager>,
    transport: Arc<dyn PeerTransport>,
}

impl SyncManager {
    pub fn new(
        peers: Vec<Peer>,
        policy: SyncPolicy,
        operations: Arc<OperationManager>,
        transport: Arc<dyn PeerTransport>,
    ) -> Self {
        SyncManager {
            peers,
            policy,
            sync_map: Arc::new(SyncMap::new()),
            operations,
            transport,
        }
    }

    pub fn peers(&self) -> &[Peer] {
        &self.peers
    }

    pub fn policy(&self) -> SyncPolicy {
        self.policy
    }

    /// Peers plus the local node
    pub fn group_size(&self) -> usize {
        self.peers.len() + 1
    }

    pub fn operations(&self) -> &Arc<OperationManager> {
        &self.operations
    }

    /// Run one round: select, synchronize concurrently, join, purge.
    ///
    /// Blocks until every spawned session finishes. Returns the number
    /// of sessions that completed cleanly.
    pub async fn start_session(&self) -> usize {
        let selected = self
            .policy
            .select_sync_nodes(&self.peers, &self.sync_map, self.transport.as_ref())
            .await;

        info!(count = selected.len(), "starting sync round");
        counter!("shoal_sync_rounds_total").increment(1);

        let mut sessions = JoinSet::new();
        for peer in selected {
            let peer_id = peer.id.clone();
            let synchronizer = Synchronizer::new(
                peer,
                self.operations.clone(),
                self.sync_map.clone(),
                self.transport.clone(),
            );
            sessions.spawn(async move { (peer_id, synchronizer.run().await) });
        }

        let mut completed = 0;
        while let Some(outcome) = sessions.join_next().await {
            match outcome {
                Ok((_, Ok(()))) => completed += 1,
                Ok((peer_id, Err(err))) => {
                    counter!("shoal_sync_failures_total").increment(1);
                    warn!(peer = %peer_id, error = %err, "sync session failed, peer retried next round");
                }
                Err(err) => {
                    counter!("shoal_sync_failures_total").increment(1);
                    warn!(error = %err, "sync session task aborted");
                }
            }
        }

        let purged = self.operations.purge_log(self.group_size());
        debug!(completed, purged, "sync round finished");
        completed
    }
}

#[async_trait]
impl SyncEndpoint for SyncManager {
    async fn serve_summary(&self) -> Summary {
        self.operations.report_summary()
    }

    async fn serve_ack_summary(&self) -> AckSummary {
        self.operations.acks()
    }

    async fn serve_sync_session(&self, request: SyncRequest) -> SyncResult<SyncResponse> {
        let ops = self.operations.perform_session(
            &request.from,
            &request.ops,
            &request.summary,
            &request.acks,
        )?;
        Ok(SyncResponse { ops })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_index::MemoryFileStore;
    use crate::core_log::OperationKind;
    use crate::core_sync::transport::MemoryTransport;
    use std::path::Path;

    fn wire_group(
        ids: &[&str],
        transport: &MemoryTransport,
        policy: SyncPolicy,
    ) -> Vec<Arc<SyncManager>> {
        let peers: Vec<Peer> = (0..ids.len() as u16)
            .map(|i| Peer::new("127.0.0.1", 7001 + i, 9001 + i))
            .collect();

        let mut managers = Vec::new();
        for (i, id) in ids.iter().enumerate() {
            let others: Vec<Peer> =
                peers.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, p)| p.clone()).collect();
            let operations =
                Arc::new(OperationManager::new(*id, Arc::new(MemoryFileStore::new(*id))));
            let manager = Arc::new(SyncManager::new(
                others,
                policy,
                operations,
                Arc::new(transport.clone()),
            ));
            transport.register(*id, manager.clone());
            managers.push(manager);
        }
        managers
    }

    #[tokio::test]
    async fn test_broadcast_round_converges_three_nodes() {
        let transport = MemoryTransport::new();
        let ids = ["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7003"];
        let managers = wire_group(&ids, &transport, SyncPolicy::Broadcast);

        for (i, manager) in managers.iter().enumerate() {
            let op = manager
                .operations()
                .create_operation(OperationKind::Add, Path::new(&format!("/data/f{i}.txt")))
                .unwrap();
            manager.operations().execute_operation(&op).unwrap();
        }

        assert_eq!(managers[0].start_session().await, 2);

        // the initiator has everything, the others at least its history
        assert_eq!(managers[0].operations().log_operations().len(), 3);
        for manager in &managers {
            assert!(manager
                .operations()
                .summary()
                .last("127.0.0.1:7001")
                .is_some());
        }
    }

    #[tokio::test]
    async fn test_round_isolates_unreachable_peer() {
        let transport = MemoryTransport::new();
        let ids = ["127.0.0.1:7001", "127.0.0.1:7002", "127.0.0.1:7003"];
        let managers = wire_group(&ids, &transport, SyncPolicy::Broadcast);

        let op = managers[1]
            .operations()
            .create_operation(OperationKind::Add, Path::new("/data/f2.txt"))
            .unwrap();
        managers[1].operations().execute_operation(&op).unwrap();

        // node 3 drops off the wire before the round
        transport.unregister(ids[2]);

        let completed = managers[0].start_session().await;
        assert_eq!(completed, 1);

        // the reachable peer still synchronized
        assert!(managers[0].operations().summary().last(ids[1]).is_some());

        // and every peer is available again for the next round
        for id in ids.iter().skip(1) {
            assert!(managers[0].sync_map.is_available(id));
        }
    }

    #[tokio::test]
    async fn test_group_size_counts_self() {
        let transport = MemoryTransport::new();
        let managers = wire_group(&["127.0.0.1:7001", "127.0.0.1:7002"], &transport, SyncPolicy::Unicast);
        assert_eq!(managers[0].group_size(), 2);
    }
}
