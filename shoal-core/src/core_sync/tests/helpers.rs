/*
    Shared helpers for sync scenario tests
*/

use crate::core_index::MemoryFileStore;
use crate::core_log::{AckSummary, OperationKind, OperationManager, Summary};
use crate::core_sync::session::{SyncRequest, SyncResponse};
use crate::core_sync::transport::{MemoryTransport, SyncEndpoint};
use crate::core_sync::{Peer, SyncError, SyncManager, SyncPolicy, SyncResult};
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Build a fully wired group of sync managers over one in-memory
/// transport. Node ids follow the `127.0.0.1:<port>` convention.
pub fn wire_group(
    size: u16,
    transport: &MemoryTransport,
    policy: SyncPolicy,
) -> Vec<Arc<SyncManager>> {
    let peers: Vec<Peer> =
        (0..size).map(|i| Peer::new("127.0.0.1", 7001 + i, 9001 + i)).collect();

    let mut managers = Vec::new();
    for (i, peer) in peers.iter().enumerate() {
        let others: Vec<Peer> =
            peers.iter().enumerate().filter(|(j, _)| *j != i).map(|(_, p)| p.clone()).collect();
        let operations = Arc::new(OperationManager::new(
            peer.id.clone(),
            Arc::new(MemoryFileStore::new(peer.id.clone())),
        ));
        let manager =
            Arc::new(SyncManager::new(others, policy, operations, Arc::new(transport.clone())));
        transport.register(peer.id.clone(), manager.clone());
        managers.push(manager);
    }
    managers
}

/// Execute a locally created ADD on `manager`
pub fn share_file(manager: &SyncManager, filename: &str) {
    let op = manager
        .operations()
        .create_operation(OperationKind::Add, Path::new(&format!("/data/{filename}")))
        .expect("create add operation");
    manager.operations().execute_operation(&op).expect("execute add operation");
}

/// Endpoint that accepts probes but fails every session call
pub struct FailingEndpoint;

#[async_trait]
impl SyncEndpoint for FailingEndpoint {
    async fn serve_summary(&self) -> Summary {
        Summary::new()
    }

    async fn serve_ack_summary(&self) -> AckSummary {
        AckSummary::new()
    }

    async fn serve_sync_session(&self, _request: SyncRequest) -> SyncResult<SyncResponse> {
        Err(SyncError::Transport("injected session failure".to_string()))
    }
}
