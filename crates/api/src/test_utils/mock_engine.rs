// Path: crates/api/src/test_utils/mock_engine.rs

//! In-memory `SnapshotEngine` for tests.

use crate::engine::{BackwardTrace, ForwardTrace, HistEntry, SnapshotEngine, VersionToken};
use crate::error::EngineError;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard};

/// A versioned put as observed by the engine, journaled for assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPut {
    /// The composite key written.
    pub composite_key: String,
    /// The raw value bytes.
    pub value: Vec<u8>,
    /// The transaction id attached to the write.
    pub txn_id: String,
    /// The block the write was applied at.
    pub block: u64,
    /// Composite keys the write declared as dependencies.
    pub deps: Vec<String>,
    /// The snapshot token the write was pinned to, if any.
    pub snapshot_token: Option<VersionToken>,
}

#[derive(Debug, Clone)]
struct VersionEntry {
    block: u64,
    value: Vec<u8>,
    txn_id: String,
    deps: Vec<String>,
}

#[derive(Debug, Default)]
struct Inner {
    plain: HashMap<String, Vec<u8>>,
    chains: HashMap<String, Vec<VersionEntry>>,
    pending: Vec<RecordedPut>,
    forward_edges: HashMap<String, Vec<(String, u64, String)>>,
    journal: Vec<RecordedPut>,
    commits: u64,
}

impl Inner {
    fn resolve(&self, key: &str, block: u64) -> Option<&VersionEntry> {
        let chain = self.chains.get(key)?;
        chain
            .iter()
            .rev()
            .find(|entry| block == u64::MAX || entry.block <= block)
    }
}

/// An in-memory engine with honest version chains and dependency edges.
///
/// `commit` makes staged puts durable and mints tokens `"v1"`, `"v2"`, ...
/// Reads against unknown keys or blocks return `EngineError::NotFound`.
#[derive(Debug, Default)]
pub struct MockEngine {
    inner: Mutex<Inner>,
    fail_commits: AtomicBool,
}

impl MockEngine {
    /// Creates an empty engine.
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent `commit` fail with a status error.
    pub fn set_fail_commits(&self, fail: bool) {
        self.fail_commits.store(fail, Ordering::SeqCst);
    }

    /// Every versioned put observed so far, in order.
    pub fn recorded_puts(&self) -> Vec<RecordedPut> {
        self.inner
            .lock()
            .map(|inner| inner.journal.clone())
            .unwrap_or_default()
    }

    /// The number of successful commits.
    pub fn commit_count(&self) -> u64 {
        self.inner.lock().map(|inner| inner.commits).unwrap_or(0)
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner>, EngineError> {
        self.inner
            .lock()
            .map_err(|_| EngineError::Status("mock engine poisoned".to_owned()))
    }
}

impl SnapshotEngine for MockEngine {
    fn init_global_state(&self) -> Result<(), EngineError> {
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Vec<u8>, EngineError> {
        self.lock()?
            .plain
            .get(key)
            .cloned()
            .ok_or(EngineError::NotFound)
    }

    fn put(&self, key: &str, value: &[u8]) -> Result<(), EngineError> {
        self.lock()?.plain.insert(key.to_owned(), value.to_vec());
        Ok(())
    }

    fn put_state(
        &self,
        composite_key: &str,
        value: &[u8],
        txn_id: &str,
        block: u64,
        deps: &[String],
        snapshot_token: Option<&VersionToken>,
    ) -> Result<(), EngineError> {
        if txn_id.is_empty() {
            return Err(EngineError::Status("empty transaction id".to_owned()));
        }
        let put = RecordedPut {
            composite_key: composite_key.to_owned(),
            value: value.to_vec(),
            txn_id: txn_id.to_owned(),
            block,
            deps: deps.to_vec(),
            snapshot_token: snapshot_token.cloned(),
        };
        let mut inner = self.lock()?;
        inner.journal.push(put.clone());
        inner.pending.push(put);
        Ok(())
    }

    fn commit(&self) -> Result<VersionToken, EngineError> {
        if self.fail_commits.load(Ordering::SeqCst) {
            return Err(EngineError::Status("commit rejected".to_owned()));
        }
        let mut inner = self.lock()?;
        let staged = std::mem::take(&mut inner.pending);
        for put in staged {
            let RecordedPut {
                composite_key,
                value,
                txn_id,
                block,
                deps,
                ..
            } = put;
            for dep in &deps {
                inner
                    .forward_edges
                    .entry(dep.clone())
                    .or_default()
                    .push((composite_key.clone(), block, txn_id.clone()));
            }
            inner
                .chains
                .entry(composite_key)
                .or_default()
                .push(VersionEntry {
                    block,
                    value,
                    txn_id,
                    deps,
                });
        }
        inner.commits += 1;
        Ok(VersionToken(format!("v{}", inner.commits)))
    }

    fn hist(&self, composite_key: &str, block: u64) -> Result<HistEntry, EngineError> {
        let inner = self.lock()?;
        let entry = inner
            .resolve(composite_key, block)
            .ok_or(EngineError::NotFound)?;
        Ok(HistEntry {
            value: entry.value.clone(),
            created_block: entry.block,
        })
    }

    fn backward(&self, composite_key: &str, block: u64) -> Result<BackwardTrace, EngineError> {
        let inner = self.lock()?;
        let entry = inner
            .resolve(composite_key, block)
            .ok_or(EngineError::NotFound)?;
        let dep_blocks = entry
            .deps
            .iter()
            .map(|dep| {
                inner
                    .resolve(dep, entry.block)
                    .map(|found| found.block)
                    .unwrap_or(0)
            })
            .collect();
        Ok(BackwardTrace {
            dep_keys: entry.deps.clone(),
            dep_blocks,
            txn_id: entry.txn_id.clone(),
        })
    }

    fn forward(&self, composite_key: &str, block: u64) -> Result<ForwardTrace, EngineError> {
        let inner = self.lock()?;
        if inner.resolve(composite_key, block).is_none() {
            return Err(EngineError::NotFound);
        }
        let mut trace = ForwardTrace::default();
        if let Some(edges) = inner.forward_edges.get(composite_key) {
            for (key, edge_block, txn_id) in edges.iter().filter(|(_, b, _)| *b >= block) {
                trace.forward_keys.push(key.clone());
                trace.forward_blocks.push(*edge_block);
                trace.txn_ids.push(txn_id.clone());
            }
        }
        Ok(trace)
    }
}
