/*
    errors.rs - Error types for the synchronization subsystem
*/

use crate::core_log::{NodeId, OperationError};
use thiserror::Error;

/// Errors raised while synchronizing with peers
#[derive(Debug, Error)]
pub enum SyncError {
    /// The peer could not be resolved or probed
    #[error("peer {0} is unreachable")]
    Unreachable(NodeId),

    /// The transport failed mid-session
    #[error("transport failure: {0}")]
    Transport(String),

    /// A payload failed to encode or decode
    #[error("payload encoding failed: {0}")]
    Serialization(String),

    /// Applying exchanged operations failed locally
    #[error(transparent)]
    Apply(#[from] OperationError),
}

/// Result type for synchronization calls
pub type SyncResult<T> = Result<T, SyncError>;

impl From<bincode::Error> for SyncError {
    fn from(err: bincode::Error) -> Self {
        SyncError::Serialization(err.to_string())
    }
}
