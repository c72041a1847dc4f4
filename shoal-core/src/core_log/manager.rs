/*
    manager.rs - Authoritative operation state machine

    Owns the log, the summary vector, the acknowledgment vector and the
    logical clock behind one mutex. Every mutation (dedup check,
    authorization, file store apply, log append, summary fold) runs as
    a single critical section, so concurrent sync workers interleave at
    operation granularity and never race each other.
*/

use super::acks::AckSummary;
use super::clock::LogicalClock;
use super::errors::{OperationError, OperationResult};
use super::log::OperationLog;
use super::operation::{Operation, OperationKind};
use super::summary::Summary;
use super::timestamp::NodeId;
use crate::core_index::FileStore;
use metrics::counter;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};
use tracing::{debug, info};

struct Inner {
    clock: LogicalClock,
    log: OperationLog,
    summary: Summary,
    acks: AckSummary,
}

/// Creates, applies and garbage-collects index operations
pub struct OperationManager {
    node_id: NodeId,
    file_store: Arc<dyn FileStore>,
    inner: Mutex<Inner>,
}

impl OperationManager {
    pub fn new(node_id: impl Into<NodeId>, file_store: Arc<dyn FileStore>) -> Self {
        let node_id = node_id.into();
        OperationManager {
            file_store,
            inner: Mutex::new(Inner {
                clock: LogicalClock::new(node_id.clone()),
                log: OperationLog::new(),
                summary: Summary::new(),
                acks: AckSummary::new(),
            }),
            node_id,
        }
    }

    pub fn node_id(&self) -> &str {
        &self.node_id
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().expect("operation state lock poisoned")
    }

    /// Build a locally stamped operation without applying it.
    ///
    /// ADD publishes a fresh descriptor for `path`; REMOVE targets the
    /// indexed record for `path` and fails when nothing matches.
    pub fn create_operation(
        &self,
        kind: OperationKind,
        path: &Path,
    ) -> OperationResult<Operation> {
        let mut inner = self.lock();

        let op = match kind {
            OperationKind::Add => {
                let stamp = inner.clock.tick();
                let record = self.file_store.create_record(path, &stamp)?;
                Operation::new(kind, record, stamp)
            }
            OperationKind::Remove => {
                let record = self.file_store.find(path).ok_or_else(|| {
                    OperationError::TargetNotFound { path: path.display().to_string() }
                })?;
                let stamp = inner.clock.tick();
                Operation::new(kind, record, stamp)
            }
        };

        debug!(%op, "created operation");
        Ok(op)
    }

    /// Idempotent apply. Returns `Ok(false)` without side effects when
    /// the summary shows the operation was already executed.
    pub fn execute_operation(&self, op: &Operation) -> OperationResult<bool> {
        let mut inner = self.lock();
        self.execute_locked(&mut inner, op)
    }

    fn execute_locked(&self, inner: &mut Inner, op: &Operation) -> OperationResult<bool> {
        let origin = op.timestamp().node_id();

        if !op.timestamp().is_newer_than(inner.summary.last(origin)) {
            debug!(%op, "operation already executed, skipping");
            return Ok(false);
        }

        match op.kind() {
            OperationKind::Add => self.file_store.materialize(op.target())?,
            OperationKind::Remove => {
                let owner = op.target().owner();
                if origin != owner {
                    return Err(OperationError::Unauthorized {
                        creator: origin.to_string(),
                        owner: owner.to_string(),
                    });
                }
                self.file_store.delete(op.target())?;
            }
        }

        if origin == self.node_id {
            inner.clock.observe(op.timestamp().seq_number());
        }

        inner.log.add(op.clone());
        inner.summary.update(op.timestamp());
        counter!("shoal_operations_applied_total").increment(1);

        debug!(%op, "applied operation");
        Ok(true)
    }

    /// Apply a batch in order, stopping at the first failure. Earlier
    /// applications stay committed; redelivery is idempotent, so a
    /// future round completes the rest.
    pub fn update_log(&self, ops: &[Operation]) -> OperationResult<usize> {
        let mut applied = 0;
        for op in ops {
            if self.execute_operation(op)? {
                applied += 1;
            }
        }
        Ok(applied)
    }

    /// Operations the holder of `peer_summary` is missing: for every
    /// origin node the peer has never heard of or trails on, the
    /// retained suffix past the peer's last stamp.
    pub fn extract_operations(&self, peer_summary: &Summary) -> Vec<Operation> {
        let inner = self.lock();
        Self::extract_locked(&inner, peer_summary)
    }

    fn extract_locked(inner: &Inner, peer_summary: &Summary) -> Vec<Operation> {
        let mut ops_to_send = Vec::new();

        for node_id in inner.summary.summarized_nodes() {
            let Some(last) = inner.summary.last(&node_id) else {
                continue;
            };
            let peer_last = peer_summary.last(&node_id);

            if last.is_newer_than(peer_last) {
                ops_to_send.extend(inner.log.extract(&node_id, peer_last, last, false));
            }
        }

        ops_to_send
    }

    /// Client half of a session, one critical section: record the
    /// peer's freshly pulled summary as its acknowledgment, compute the
    /// delta it is missing, and snapshot what we report back (our
    /// summary becomes our own acknowledgment the moment we send it).
    pub fn prepare_session(
        &self,
        peer_id: &str,
        peer_summary: &Summary,
    ) -> (Vec<Operation>, Summary, AckSummary) {
        let mut inner = self.lock();

        inner.acks.record(peer_id, peer_summary);
        let ops = Self::extract_locked(&inner, peer_summary);
        let summary = inner.summary.clone();
        inner.acks.record(self.node_id.clone(), &summary);
        let acks = inner.acks.clone();

        (ops, summary, acks)
    }

    /// Server half of a session, one critical section: record the
    /// caller's reported summary and acknowledgments, extract what the
    /// caller is missing, then apply the inbound batch. A failing
    /// inbound operation aborts the session; whatever applied before it
    /// stays committed.
    pub fn perform_session(
        &self,
        from: &str,
        ops: &[Operation],
        peer_summary: &Summary,
        peer_acks: &AckSummary,
    ) -> OperationResult<Vec<Operation>> {
        let mut inner = self.lock();

        inner.acks.record(from, peer_summary);
        inner.acks.update(peer_acks);

        let ops_to_send = Self::extract_locked(&inner, peer_summary);

        for op in ops {
            self.execute_locked(&mut inner, op)?;
        }

        Ok(ops_to_send)
    }

    /// Current summary vector
    pub fn summary(&self) -> Summary {
        self.lock().summary.clone()
    }

    /// Summary vector as reported to a peer; reporting it makes it the
    /// local node's own acknowledgment entry
    pub fn report_summary(&self) -> Summary {
        let mut inner = self.lock();
        let summary = inner.summary.clone();
        inner.acks.record(self.node_id.clone(), &summary);
        summary
    }

    /// Current acknowledgment vector
    pub fn acks(&self) -> AckSummary {
        self.lock().acks.clone()
    }

    /// Fold a peer's acknowledgment vector into ours
    pub fn update_acks(&self, acks: &AckSummary) {
        self.lock().acks.update(acks);
    }

    /// Every retained log entry, across origin nodes
    pub fn log_operations(&self) -> Vec<Operation> {
        self.lock().log.operations()
    }

    /// Reclaim log entries the whole group has acknowledged.
    ///
    /// Runs only once acknowledgments are recorded for `group_size`
    /// distinct members (the local node's own entry included). For each
    /// origin node with a group-wide floor, drops the retained prefix
    /// up to that floor. Returns the number of entries reclaimed.
    pub fn purge_log(&self, group_size: usize) -> usize {
        let mut inner = self.lock();

        if inner.acks.len() != group_size {
            debug!(
                recorded = inner.acks.len(),
                group_size, "log purge skipped, acknowledgments incomplete"
            );
            return 0;
        }

        let mut purged = 0;
        for origin in inner.summary.summarized_nodes() {
            let Some(floor) = inner.acks.lowest_common_stamp(&origin) else {
                continue;
            };
            let floor = floor.clone();
            purged += inner.log.remove_all_preceding(&origin, &floor);
        }

        if purged > 0 {
            counter!("shoal_log_entries_purged_total").increment(purged as u64);
            info!(purged, "reclaimed acknowledged log entries");
        }
        purged
    }
}
