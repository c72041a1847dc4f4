/*
    session.rs - Wire payloads of one synchronization session

    A session amortizes to a single round trip: the caller pushes the
    operations the peer is missing together with its summary and
    acknowledgment vectors, and the peer answers with the operations
    the caller is missing. Payloads are serde types so any transport
    can carry them; the bincode helpers give byte-level round-trips at
    the seam.
*/

use super::errors::SyncResult;
use crate::core_log::{AckSummary, NodeId, Operation, Summary};
use serde::{Deserialize, Serialize};

/// Push half of a session: what the caller sends
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    /// Caller's node identifier
    pub from: NodeId,

    /// Operations the peer is missing, per the caller's view
    pub ops: Vec<Operation>,

    /// Caller's summary vector at send time
    pub summary: Summary,

    /// Caller's acknowledgment vector at send time
    pub acks: AckSummary,
}

impl SyncRequest {
    pub fn to_bytes(&self) -> SyncResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> SyncResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}

/// Pull half of a session: what the peer answers
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncResponse {
    /// Operations the caller is missing, per the peer's view
    pub ops: Vec<Operation>,
}

impl SyncResponse {
    pub fn to_bytes(&self) -> SyncResult<Vec<u8>> {
        Ok(bincode::serialize(self)?)
    }

    pub fn from_bytes(bytes: &[u8]) -> SyncResult<Self> {
        Ok(bincode::deserialize(bytes)?)
    }
}
