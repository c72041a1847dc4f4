/*
    errors.rs - Error types for the operation engine
*/

use super::timestamp::NodeId;
use crate::core_index::FileStoreError;
use thiserror::Error;

/// Errors raised while creating or applying operations
#[derive(Debug, Error)]
pub enum OperationError {
    /// REMOVE targets a file nobody shares
    #[error("no shared file matches {path}")]
    TargetNotFound { path: String },

    /// REMOVE created by a node that does not own the file
    #[error("node {creator} cannot remove a file owned by {owner}")]
    Unauthorized { creator: NodeId, owner: NodeId },

    /// The file store failed to apply the operation
    #[error(transparent)]
    Store(#[from] FileStoreError),
}

/// Result type for operation engine calls
pub type OperationResult<T> = Result<T, OperationError>;
