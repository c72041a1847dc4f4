/*
    shoal-core - Replicated file index over timestamped anti-entropy

    A peer-to-peer node keeping an eventually consistent index of
    shared files across a static group. Nodes log index operations,
    gossip summary and acknowledgment vectors in bilateral sessions,
    and garbage-collect log entries the whole group has seen.
*/

pub mod config;
pub mod core_index;
pub mod core_log;
pub mod core_sync;
pub mod logging;
pub mod node;
pub mod test_utils;

pub use config::{ConfigError, NodeConfig};
pub use core_index::{FileRecord, FileStore, LocalFileStore, MemoryFileStore};
pub use core_log::{
    AckSummary, NodeId, Operation, OperationError, OperationKind, OperationManager, Summary,
    Timestamp,
};
pub use core_sync::{
    MemoryTransport, Peer, PeerHandle, PeerTransport, SyncError, SyncManager, SyncPolicy,
};
pub use logging::{init_logging, init_logging_with_config, LogConfig, LogLevel};
pub use node::Node;
