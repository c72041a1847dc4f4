/*
    sync_map.rs - Per-peer session availability gate

    Guards against two concurrent sessions with the same peer. Peers
    never seen before are available. Selection must go through
    `try_acquire`, which checks and flips the flag under one lock, so
    two rounds racing for the same peer cannot both win it.
*/

use crate::core_log::NodeId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tracing::debug;

/// Availability of each peer for synchronization
#[derive(Debug, Default)]
pub struct SyncMap {
    data: Mutex<HashMap<NodeId, bool>>,
}

impl SyncMap {
    pub fn new() -> Self {
        SyncMap { data: Mutex::new(HashMap::new()) }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<NodeId, bool>> {
        self.data.lock().expect("sync map lock poisoned")
    }

    /// Whether a session with `peer_id` may start
    pub fn is_available(&self, peer_id: &str) -> bool {
        self.lock().get(peer_id).copied().unwrap_or(true)
    }

    /// Atomically claim `peer_id` for a session. Returns false when a
    /// session already holds it.
    pub fn try_acquire(&self, peer_id: &str) -> bool {
        let mut data = self.lock();
        let available = data.get(peer_id).copied().unwrap_or(true);
        if available {
            data.insert(peer_id.to_string(), false);
        }
        available
    }

    pub fn set_available(&self, peer_id: &str) {
        self.lock().insert(peer_id.to_string(), true);
    }

    pub fn set_unavailable(&self, peer_id: &str) {
        self.lock().insert(peer_id.to_string(), false);
    }
}

/// Releases a claimed peer when dropped, whatever path the session
/// takes out of scope
pub struct AvailabilityGuard {
    map: Arc<SyncMap>,
    peer_id: NodeId,
}

impl AvailabilityGuard {
    pub fn new(map: Arc<SyncMap>, peer_id: impl Into<NodeId>) -> Self {
        AvailabilityGuard { map, peer_id: peer_id.into() }
    }
}

impl Drop for AvailabilityGuard {
    fn drop(&mut self) {
        debug!(peer = %self.peer_id, "released sync availability");
        self.map.set_available(&self.peer_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unseen_peers_default_available() {
        let map = SyncMap::new();
        assert!(map.is_available("n1"));
    }

    #[test]
    fn test_toggle() {
        let map = SyncMap::new();
        map.set_unavailable("n1");
        assert!(!map.is_available("n1"));
        map.set_available("n1");
        assert!(map.is_available("n1"));
    }

    #[test]
    fn test_try_acquire_claims_once() {
        let map = SyncMap::new();
        assert!(map.try_acquire("n1"));
        assert!(!map.try_acquire("n1"));
        assert!(!map.is_available("n1"));
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let map = Arc::new(SyncMap::new());
        assert!(map.try_acquire("n1"));

        {
            let _guard = AvailabilityGuard::new(map.clone(), "n1");
            assert!(!map.is_available("n1"));
        }

        assert!(map.is_available("n1"));
    }

    #[test]
    fn test_guard_releases_even_on_panic() {
        let map = Arc::new(SyncMap::new());
        map.set_unavailable("n1");

        let held = map.clone();
        let result = std::panic::catch_unwind(move || {
            let _guard = AvailabilityGuard::new(held, "n1");
            panic!("session blew up");
        });

        assert!(result.is_err());
        assert!(map.is_available("n1"));
    }
}
