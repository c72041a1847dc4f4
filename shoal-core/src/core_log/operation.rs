/*
    operation.rs - Immutable index mutations

    An operation either publishes a file or retracts one, stamped by
    the node that created it. Identity is (origin node, sequence
    number); the engine replicates operations, never index state.
*/

use super::timestamp::Timestamp;
use crate::core_index::FileRecord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// What an operation does to the shared index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OperationKind {
    Add,
    Remove,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Remove => write!(f, "remove"),
        }
    }
}

/// One replicated mutation of the shared file index
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Operation {
    kind: OperationKind,
    target: FileRecord,
    timestamp: Timestamp,
}

impl Operation {
    pub fn new(kind: OperationKind, target: FileRecord, timestamp: Timestamp) -> Self {
        Operation { kind, target, timestamp }
    }

    pub fn kind(&self) -> OperationKind {
        self.kind
    }

    pub fn target(&self) -> &FileRecord {
        &self.target
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Operation[{},{},{}]", self.timestamp, self.kind, self.target.uri())
    }
}
