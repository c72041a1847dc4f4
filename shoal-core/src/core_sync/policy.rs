/*
    policy.rs - Peer-selection strategies for a sync round

    The classic epidemic trade-off: broadcast converges fastest at O(N)
    sessions per round, multicast keeps expected-logarithmic
    convergence at a fraction of the cost, unicast is the cheapest and
    slowest. The variant is picked once at startup from configuration.

    Selection claims each chosen peer in the sync map as part of
    picking it, and random variants run under a bounded attempt budget
    so they terminate even when nothing is reachable.
*/

use super::peer::Peer;
use super::sync_map::SyncMap;
use super::transport::PeerTransport;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// How many peers a round reaches out to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncPolicy {
    /// One random connected peer per round
    Unicast,
    /// A random logarithmic subset of connected peers
    Multicast,
    /// Every connected peer
    Broadcast,
}

impl SyncPolicy {
    /// Pick the peers to contact this round, claiming each selected
    /// peer's availability as part of selection.
    pub async fn select_sync_nodes(
        &self,
        peers: &[Peer],
        sync_map: &SyncMap,
        transport: &dyn PeerTransport,
    ) -> Vec<Peer> {
        let selected = match self {
            SyncPolicy::Broadcast => select_all(peers, sync_map, transport).await,
            SyncPolicy::Multicast => {
                select_random(peers, sync_map, transport, fanout(peers.len())).await
            }
            SyncPolicy::Unicast => select_random(peers, sync_map, transport, 1).await,
        };

        debug!(policy = ?self, count = selected.len(), "selected sync peers");
        selected
    }
}

/// Gossip fan-out for a group of `n` peers: ceil(log2(n) + 1)
fn fanout(n: usize) -> usize {
    if n == 0 {
        return 0;
    }
    ((n as f64).log2() + 1.0).ceil() as usize
}

async fn is_connected(transport: &dyn PeerTransport, peer: &Peer) -> bool {
    match transport.resolve(peer).await {
        Ok(handle) => handle.is_reachable().await,
        Err(_) => false,
    }
}

async fn select_all(
    peers: &[Peer],
    sync_map: &SyncMap,
    transport: &dyn PeerTransport,
) -> Vec<Peer> {
    let mut selected = Vec::new();

    for peer in peers {
        if !sync_map.is_available(&peer.id) {
            continue;
        }
        if !is_connected(transport, peer).await {
            continue;
        }
        if sync_map.try_acquire(&peer.id) {
            selected.push(peer.clone());
        }
    }

    selected
}

async fn select_random(
    peers: &[Peer],
    sync_map: &SyncMap,
    transport: &dyn PeerTransport,
    target: usize,
) -> Vec<Peer> {
    let n = peers.len();
    if n == 0 || target == 0 {
        return Vec::new();
    }

    // budget of 1.5x the group fan-out, so exhausted or busy groups
    // produce a short round instead of an endless search
    let mut attempts = fanout(n).saturating_mul(3) / 2;
    let mut rng = StdRng::from_os_rng();
    let mut selected = Vec::new();

    while selected.len() < target && attempts > 0 {
        attempts -= 1;

        let peer = &peers[rng.random_range(0..n)];
        if !sync_map.is_available(&peer.id) {
            continue;
        }
        if !is_connected(transport, peer).await {
            continue;
        }
        if sync_map.try_acquire(&peer.id) {
            selected.push(peer.clone());
        }
    }

    selected
}
