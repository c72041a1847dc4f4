/*
    descriptor.rs - Metadata describing one shared file

    A record travels with the ADD operation that published the file and
    is what remote nodes hold in their index; only the owning node has
    the bytes on disk.
*/

use crate::core_log::{NodeId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

/// Descriptor of a file shared within the group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Basename the file is indexed under
    filename: String,

    /// Node that published the file
    owner: NodeId,

    /// Location of the bytes on the owning node
    path: PathBuf,

    /// Address remote nodes can fetch the file from
    uri: String,

    /// Stamp of the ADD operation that published the file
    timestamp: Timestamp,
}

impl FileRecord {
    pub fn new(
        filename: impl Into<String>,
        owner: impl Into<NodeId>,
        path: impl Into<PathBuf>,
        uri: impl Into<String>,
        timestamp: Timestamp,
    ) -> Self {
        FileRecord {
            filename: filename.into(),
            owner: owner.into(),
            path: path.into(),
            uri: uri.into(),
            timestamp,
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn owner(&self) -> &str {
        &self.owner
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn uri(&self) -> &str {
        &self.uri
    }

    pub fn timestamp(&self) -> &Timestamp {
        &self.timestamp
    }

    /// Copy of this record with the on-disk location moved, used once
    /// the owning node has placed the file in its publish directory
    pub fn relocated(&self, path: impl Into<PathBuf>) -> Self {
        FileRecord { path: path.into(), ..self.clone() }
    }
}

impl fmt::Display for FileRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "File[{},{}]", self.timestamp, self.uri)
    }
}
