/*
    transport.rs - Peer transport collaborator seam

    The engine never speaks a wire protocol; it resolves a peer to a
    handle and issues the three session calls through it. Any RPC
    mechanism qualifies as long as the payloads round-trip losslessly.

    `MemoryTransport` is the in-process implementation used by tests
    and simulations: registered endpoints stand in for remote nodes,
    and every payload still passes through its byte encoding so the
    wire contract stays honest.
*/

use super::errors::{SyncError, SyncResult};
use super::peer::Peer;
use super::session::{SyncRequest, SyncResponse};
use crate::core_log::{AckSummary, NodeId, Summary};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Resolves peers to callable handles
#[async_trait]
pub trait PeerTransport: Send + Sync {
    async fn resolve(&self, peer: &Peer) -> SyncResult<Arc<dyn PeerHandle>>;
}

/// One resolved peer, ready for session calls
#[async_trait]
pub trait PeerHandle: Send + Sync {
    /// Cheap connectivity probe
    async fn is_reachable(&self) -> bool;

    /// Pull the peer's summary vector
    async fn summary(&self) -> SyncResult<Summary>;

    /// Pull the peer's acknowledgment vector
    async fn ack_summary(&self) -> SyncResult<AckSummary>;

    /// Run the push/pull exchange on the peer
    async fn perform_sync_session(&self, request: SyncRequest) -> SyncResult<SyncResponse>;
}

/// Server half a node exposes to the transport
#[async_trait]
pub trait SyncEndpoint: Send + Sync {
    async fn serve_summary(&self) -> Summary;

    async fn serve_ack_summary(&self) -> AckSummary;

    async fn serve_sync_session(&self, request: SyncRequest) -> SyncResult<SyncResponse>;
}

#[derive(Default)]
struct Registry {
    endpoints: Mutex<HashMap<NodeId, Arc<dyn SyncEndpoint>>>,
}

impl Registry {
    fn endpoint(&self, peer_id: &str) -> SyncResult<Arc<dyn SyncEndpoint>> {
        self.endpoints
            .lock()
            .expect("transport registry lock poisoned")
            .get(peer_id)
            .cloned()
            .ok_or_else(|| SyncError::Unreachable(peer_id.to_string()))
    }

    fn contains(&self, peer_id: &str) -> bool {
        self.endpoints
            .lock()
            .expect("transport registry lock poisoned")
            .contains_key(peer_id)
    }
}

/// In-process transport connecting endpoints registered by node id
#[derive(Clone, Default)]
pub struct MemoryTransport {
    registry: Arc<Registry>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `endpoint` reachable under `node_id`
    pub fn register(&self, node_id: impl Into<NodeId>, endpoint: Arc<dyn SyncEndpoint>) {
        self.registry
            .endpoints
            .lock()
            .expect("transport registry lock poisoned")
            .insert(node_id.into(), endpoint);
    }

    /// Drop `node_id` from the wire, simulating a disconnect
    pub fn unregister(&self, node_id: &str) {
        self.registry
            .endpoints
            .lock()
            .expect("transport registry lock poisoned")
            .remove(node_id);
    }
}

#[async_trait]
impl PeerTransport for MemoryTransport {
    async fn resolve(&self, peer: &Peer) -> SyncResult<Arc<dyn PeerHandle>> {
        if !self.registry.contains(&peer.id) {
            return Err(SyncError::Unreachable(peer.id.clone()));
        }
        Ok(Arc::new(MemoryHandle {
            registry: self.registry.clone(),
            peer_id: peer.id.clone(),
        }))
    }
}

struct MemoryHandle {
    registry: Arc<Registry>,
    peer_id: NodeId,
}

#[async_trait]
impl PeerHandle for MemoryHandle {
    async fn is_reachable(&self) -> bool {
        self.registry.contains(&self.peer_id)
    }

    async fn summary(&self) -> SyncResult<Summary> {
        let endpoint = self.registry.endpoint(&self.peer_id)?;
        Ok(endpoint.serve_summary().await)
    }

    async fn ack_summary(&self) -> SyncResult<AckSummary> {
        let endpoint = self.registry.endpoint(&self.peer_id)?;
        Ok(endpoint.serve_ack_summary().await)
    }

    async fn perform_sync_session(&self, request: SyncRequest) -> SyncResult<SyncResponse> {
        let endpoint = self.registry.endpoint(&self.peer_id)?;

        // round-trip both payloads through their byte encoding so the
        // in-process path exercises the same wire contract as an RPC one
        let request = SyncRequest::from_bytes(&request.to_bytes()?)?;
        let response = endpoint.serve_sync_session(request).await?;
        SyncResponse::from_bytes(&response.to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core_log::Timestamp;

    struct StubEndpoint {
        summary: Summary,
    }

    #[async_trait]
    impl SyncEndpoint for StubEndpoint {
        async fn serve_summary(&self) -> Summary {
            self.summary.clone()
        }

        async fn serve_ack_summary(&self) -> AckSummary {
            AckSummary::new()
        }

        async fn serve_sync_session(&self, _request: SyncRequest) -> SyncResult<SyncResponse> {
            Ok(SyncResponse { ops: Vec::new() })
        }
    }

    fn stub() -> Arc<StubEndpoint> {
        let mut summary = Summary::new();
        summary.update(&Timestamp::new("n2", 5));
        Arc::new(StubEndpoint { summary })
    }

    #[tokio::test]
    async fn test_resolve_unknown_peer_is_unreachable() {
        let transport = MemoryTransport::new();
        let peer = Peer::new("10.0.0.2", 7002, 9002);

        let err = transport.resolve(&peer).await;
        assert!(matches!(err, Err(SyncError::Unreachable(_))));
    }

    #[tokio::test]
    async fn test_registered_peer_serves_summary() {
        let transport = MemoryTransport::new();
        let peer = Peer::new("10.0.0.2", 7002, 9002);
        transport.register(peer.id.clone(), stub());

        let handle = transport.resolve(&peer).await.unwrap();
        assert!(handle.is_reachable().await);

        let summary = handle.summary().await.unwrap();
        assert_eq!(summary.last("n2").map(Timestamp::seq_number), Some(5));
    }

    #[tokio::test]
    async fn test_unregister_breaks_existing_handles() {
        let transport = MemoryTransport::new();
        let peer = Peer::new("10.0.0.2", 7002, 9002);
        transport.register(peer.id.clone(), stub());

        let handle = transport.resolve(&peer).await.unwrap();
        transport.unregister(&peer.id);

        assert!(!handle.is_reachable().await);
        assert!(matches!(handle.summary().await, Err(SyncError::Unreachable(_))));
    }
}
