// Path: crates/statedb/src/db.rs

//! The `VersionedDb` adapter and its provider.

use crate::apply::partition_namespace;
use crate::keys::composite_key;
use crate::lineage;
use crate::snapshots::SnapshotTracker;
use provkv_api::engine::SnapshotEngine;
use provkv_api::error::{EngineError, StateDbError};
use provkv_api::state::{
    Height, LineageKind, LineageQuery, ScanMetadata, StateQueryReply, StateScanIter, UpdateBatch,
    VersionedDb, VersionedValue, LATEST_SNAPSHOT, SAVEPOINT_KEY,
};
use std::sync::Arc;

/// A versioned state database over a shared snapshot engine.
///
/// Each instance owns its snapshot bookkeeping; the engine itself is
/// shared and externally owned.
pub struct ProvStateDb<E> {
    engine: Arc<E>,
    db_name: String,
    snapshots: SnapshotTracker,
}

impl<E: SnapshotEngine> ProvStateDb<E> {
    /// Creates an adapter over `engine` for the named database.
    pub fn new(engine: Arc<E>, db_name: impl Into<String>) -> Self {
        Self {
            engine,
            db_name: db_name.into(),
            snapshots: SnapshotTracker::new(),
        }
    }

    fn read_versioned(
        &self,
        snapshot: u64,
        namespace: &str,
        key: &str,
    ) -> Result<Option<VersionedValue>, StateDbError> {
        let composite = composite_key(namespace, key);
        match self.engine.hist(&composite, snapshot) {
            Ok(entry) => {
                let block = if snapshot == LATEST_SNAPSHOT {
                    entry.created_block
                } else {
                    snapshot
                };
                Ok(Some(VersionedValue {
                    version: Height::new(block, 0),
                    value: entry.value,
                    metadata: None,
                }))
            }
            Err(EngineError::NotFound) => Ok(None),
            Err(err) => Err(StateDbError::Engine(format!(
                "failed to get state for key {composite:?}: {err}"
            ))),
        }
    }
}

impl<E: SnapshotEngine> VersionedDb for ProvStateDb<E> {
    fn open(&self) -> Result<(), StateDbError> {
        self.engine
            .init_global_state()
            .map_err(|err| StateDbError::Init(err.to_string()))
    }

    fn close(&self) {
        // Shared engine instance; its shutdown belongs to the embedder.
    }

    fn get_state(&self, namespace: &str, key: &str) -> Result<StateQueryReply, StateDbError> {
        self.get_state_at_snapshot(LATEST_SNAPSHOT, namespace, key)
    }

    fn get_state_at_snapshot(
        &self,
        snapshot: u64,
        namespace: &str,
        key: &str,
    ) -> Result<StateQueryReply, StateDbError> {
        tracing::debug!(
            target: "statedb",
            db = %self.db_name,
            namespace,
            key,
            snapshot,
            "state read"
        );
        match LineageQuery::parse(key)? {
            Some(query) => Ok(StateQueryReply::Lineage(lineage::run(
                self.engine.as_ref(),
                namespace,
                &query,
            ))),
            None => Ok(StateQueryReply::Value(
                self.read_versioned(snapshot, namespace, key)?,
            )),
        }
    }

    fn get_version(&self, namespace: &str, key: &str) -> Result<Option<Height>, StateDbError> {
        if LineageKind::of(key).is_some() {
            return Ok(Some(Height::zero()));
        }
        Ok(self
            .read_versioned(LATEST_SNAPSHOT, namespace, key)?
            .map(|value| value.version))
    }

    fn apply_updates(&self, batch: &UpdateBatch, height: Height) -> Result<(), StateDbError> {
        let block = height.block_num;
        tracing::debug!(target: "statedb", db = %self.db_name, block, "applying update batch");
        for namespace in batch.namespaces() {
            let Some(updates) = batch.updates(namespace) else {
                continue;
            };
            for write in partition_namespace(namespace, updates)? {
                let token = write
                    .pinned_snapshot
                    .and_then(|pinned| self.snapshots.token_for(pinned));
                tracing::trace!(
                    target: "statedb",
                    key = %write.composite_key,
                    txn_id = write.txn_id,
                    block,
                    deps = write.deps.len(),
                    pinned = token.is_some(),
                    "put state"
                );
                self.engine
                    .put_state(
                        &write.composite_key,
                        write.value,
                        write.txn_id,
                        block,
                        &write.deps,
                        token.as_ref(),
                    )
                    .map_err(|err| {
                        StateDbError::Engine(format!(
                            "failed to put state for key {:?}: {err}",
                            write.composite_key
                        ))
                    })?;
            }
        }
        let token = self
            .engine
            .commit()
            .map_err(|err| StateDbError::Commit(err.to_string()))?;
        self.snapshots.record_commit(block, token);
        tracing::debug!(target: "statedb", db = %self.db_name, block, "committed block");
        self.engine
            .put(SAVEPOINT_KEY, block.to_string().as_bytes())
            .map_err(|err| {
                StateDbError::Savepoint(format!("failed to persist latest height: {err}"))
            })
    }

    fn latest_savepoint(&self) -> Result<Height, StateDbError> {
        let raw = self
            .engine
            .get(SAVEPOINT_KEY)
            .map_err(|err| StateDbError::Savepoint(format!("failed to read latest height: {err}")))?;
        let text = std::str::from_utf8(&raw)
            .map_err(|_| StateDbError::Parse("latest height marker is not valid UTF-8".to_owned()))?;
        let block = text.parse::<u64>().map_err(|_| {
            StateDbError::Parse(format!("latest height marker {text:?} is not a decimal height"))
        })?;
        Ok(Height::new(block, 0))
    }

    fn retrieve_latest_snapshot(&self) -> u64 {
        self.snapshots.latest_height()
    }

    fn release_snapshot(&self, snapshot: u64) -> bool {
        self.snapshots.release(snapshot)
    }

    fn get_state_multiple_keys(
        &self,
        _namespace: &str,
        _keys: &[String],
    ) -> Result<Vec<Option<VersionedValue>>, StateDbError> {
        Err(StateDbError::Unsupported("get_state_multiple_keys"))
    }

    fn get_state_range_scan(
        &self,
        _namespace: &str,
        _start_key: &str,
        _end_key: &str,
    ) -> Result<StateScanIter<'_>, StateDbError> {
        Err(StateDbError::Unsupported("get_state_range_scan"))
    }

    fn get_state_range_scan_with_metadata(
        &self,
        _namespace: &str,
        _start_key: &str,
        _end_key: &str,
        _metadata: Option<&ScanMetadata>,
    ) -> Result<StateScanIter<'_>, StateDbError> {
        Err(StateDbError::Unsupported("get_state_range_scan_with_metadata"))
    }

    fn execute_query(
        &self,
        _namespace: &str,
        _query: &str,
    ) -> Result<StateScanIter<'_>, StateDbError> {
        Err(StateDbError::Unsupported("execute_query"))
    }

    fn execute_query_with_metadata(
        &self,
        _namespace: &str,
        _query: &str,
        _metadata: Option<&ScanMetadata>,
    ) -> Result<StateScanIter<'_>, StateDbError> {
        Err(StateDbError::Unsupported("execute_query_with_metadata"))
    }
}

/// Hands out `ProvStateDb` instances over one shared engine.
pub struct ProvStateDbProvider<E> {
    engine: Arc<E>,
}

impl<E: SnapshotEngine> ProvStateDbProvider<E> {
    /// Creates a provider over a shared engine.
    pub fn new(engine: Arc<E>) -> Self {
        Self { engine }
    }

    /// Returns a fresh adapter for the named database. Handles share the
    /// engine but keep independent snapshot bookkeeping.
    pub fn db_handle(&self, db_name: &str) -> ProvStateDb<E> {
        ProvStateDb::new(self.engine.clone(), db_name)
    }

    /// Closes the provider. The engine outlives it.
    pub fn close(&self) {}
}
