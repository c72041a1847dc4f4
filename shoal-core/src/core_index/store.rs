/*
    store.rs - File store collaborator seam

    The operation engine never touches bytes on disk directly; it
    drives one of these. `LocalFileStore` backs a real node with a
    publish directory, `MemoryFileStore` backs tests and simulations
    with index-only state.

    Materialize/delete are index mutations on every node; the copy to
    or removal from the publish directory happens only on the node
    that owns the file.
*/

use super::descriptor::FileRecord;
use super::errors::{FileStoreError, FileStoreResult};
use super::index::FileIndex;
use crate::core_log::{NodeId, Timestamp};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::debug;

/// Storage collaborator the operation engine delegates to
pub trait FileStore: Send + Sync {
    /// Build the descriptor for a file about to be published. `stamp`
    /// is the stamp of the ADD operation being created; its node is
    /// the owner of the record.
    fn create_record(&self, path: &Path, stamp: &Timestamp) -> FileStoreResult<FileRecord>;

    /// Look up the indexed record for a path's basename
    fn find(&self, path: &Path) -> Option<FileRecord>;

    /// Apply an ADD: store the bytes where required and index the record
    fn materialize(&self, record: &FileRecord) -> FileStoreResult<()>;

    /// Apply a REMOVE: drop the bytes where required and unindex the record
    fn delete(&self, record: &FileRecord) -> FileStoreResult<()>;

    /// Every file currently shared within the group
    fn list(&self) -> Vec<FileRecord>;
}

fn basename(path: &Path) -> FileStoreResult<String> {
    path.file_name()
        .and_then(|name| name.to_str())
        .map(|name| name.to_string())
        .ok_or_else(|| FileStoreError::InvalidPath { path: path.to_path_buf() })
}

/// File store backed by a publish directory on the local disk
pub struct LocalFileStore {
    node_id: NodeId,
    publish_dir: PathBuf,
    base_uri: String,
    index: Mutex<FileIndex>,
}

impl LocalFileStore {
    pub fn new(
        node_id: impl Into<NodeId>,
        publish_dir: impl Into<PathBuf>,
        base_uri: impl Into<String>,
    ) -> Self {
        LocalFileStore {
            node_id: node_id.into(),
            publish_dir: publish_dir.into(),
            base_uri: base_uri.into(),
            index: Mutex::new(FileIndex::new()),
        }
    }

    fn published_path(&self, filename: &str) -> PathBuf {
        self.publish_dir.join(filename)
    }

    fn owns(&self, record: &FileRecord) -> bool {
        record.owner() == self.node_id
    }
}

impl FileStore for LocalFileStore {
    fn create_record(&self, path: &Path, stamp: &Timestamp) -> FileStoreResult<FileRecord> {
        let filename = basename(path)?;
        let uri = format!("{}/{}", self.base_uri, filename);
        Ok(FileRecord::new(filename, stamp.node_id(), path, uri, stamp.clone()))
    }

    fn find(&self, path: &Path) -> Option<FileRecord> {
        let filename = basename(path).ok()?;
        self.index.lock().expect("file index lock poisoned").search(&filename).cloned()
    }

    fn materialize(&self, record: &FileRecord) -> FileStoreResult<()> {
        let mut indexed = record.clone();

        if self.owns(record) {
            let source = record.path();
            if !source.exists() {
                return Err(FileStoreError::Missing { path: source.to_path_buf() });
            }

            let destination = self.published_path(record.filename());
            if !destination.exists() {
                fs::create_dir_all(&self.publish_dir)?;
                fs::copy(source, &destination)?;
            }
            debug!(file = record.filename(), "published file locally");
            indexed = record.relocated(destination);
        }

        self.index.lock().expect("file index lock poisoned").add(indexed);
        Ok(())
    }

    fn delete(&self, record: &FileRecord) -> FileStoreResult<()> {
        if self.owns(record) {
            let published = self.published_path(record.filename());
            if !published.exists() {
                return Err(FileStoreError::Missing { path: published });
            }
            fs::remove_file(&published)?;
            debug!(file = record.filename(), "unpublished local file");
        }

        self.index.lock().expect("file index lock poisoned").remove(record.filename());
        Ok(())
    }

    fn list(&self) -> Vec<FileRecord> {
        self.index.lock().expect("file index lock poisoned").records()
    }
}

/// Index-only file store for tests and simulations
pub struct MemoryFileStore {
    node_id: NodeId,
    base_uri: String,
    index: Mutex<FileIndex>,
}

impl MemoryFileStore {
    pub fn new(node_id: impl Into<NodeId>) -> Self {
        let node_id = node_id.into();
        let base_uri = format!("mem://{node_id}/shared");
        MemoryFileStore { node_id, base_uri, index: Mutex::new(FileIndex::new()) }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }
}

impl FileStore for MemoryFileStore {
    fn create_record(&self, path: &Path, stamp: &Timestamp) -> FileStoreResult<FileRecord> {
        let filename = basename(path)?;
        let uri = format!("{}/{}", self.base_uri, filename);
        Ok(FileRecord::new(filename, stamp.node_id(), path, uri, stamp.clone()))
    }

    fn find(&self, path: &Path) -> Option<FileRecord> {
        let filename = basename(path).ok()?;
        self.index.lock().expect("file index lock poisoned").search(&filename).cloned()
    }

    fn materialize(&self, record: &FileRecord) -> FileStoreResult<()> {
        self.index.lock().expect("file index lock poisoned").add(record.clone());
        Ok(())
    }

    fn delete(&self, record: &FileRecord) -> FileStoreResult<()> {
        self.index.lock().expect("file index lock poisoned").remove(record.filename());
        Ok(())
    }

    fn list(&self) -> Vec<FileRecord> {
        self.index.lock().expect("file index lock poisoned").records()
    }
}
