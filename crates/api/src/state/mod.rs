// Path: crates/api/src/state/mod.rs

//! State value types and the `VersionedDb` contract exposed to the
//! ledger's transaction-management layer.

pub mod lineage;

use crate::error::StateDbError;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

pub use lineage::{LineageKind, LineageOutcome, LineageQuery, LineageReply};

/// Reserved snapshot sentinel meaning "latest / no explicit snapshot".
pub const LATEST_SNAPSHOT: u64 = u64::MAX;

/// Fixed bookkeeping key under which the adapter persists the most
/// recently committed block height as a decimal string.
pub const SAVEPOINT_KEY: &str = "latest-height";

/// A `(block, txn)` version coordinate.
///
/// This adapter always records transaction offset 0; the field exists so
/// savepoints and value versions stay compatible with hosts that track
/// intra-block offsets.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Height {
    /// The block number.
    pub block_num: u64,
    /// The transaction offset within the block.
    pub txn_num: u64,
}

impl Height {
    /// Creates a height from block and transaction numbers.
    pub const fn new(block_num: u64, txn_num: u64) -> Self {
        Self { block_num, txn_num }
    }

    /// The zero height, reported as the version of lineage query replies.
    pub const fn zero() -> Self {
        Self::new(0, 0)
    }
}

/// A raw value together with the version it was recorded (or requested) at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionedValue {
    /// The value's version: the block it was created at for latest reads,
    /// or the requested snapshot height for snapshot-scoped reads.
    pub version: Height,
    /// The raw value bytes.
    pub value: Vec<u8>,
    /// Optional opaque metadata; unused by this adapter.
    pub metadata: Option<Vec<u8>>,
}

/// One block's worth of updates, grouped by namespace.
///
/// A real key `K` may carry sibling side-channel entries: `K_prov` (a
/// `_`-joined dependency list), `K_txnID` (the originating transaction
/// id), and `K_snapshot` (an 8-byte little-endian target snapshot
/// height). Sidecar entries are consumed while applying `K` and are never
/// written to the engine themselves.
#[derive(Debug, Clone, Default)]
pub struct UpdateBatch {
    updates: HashMap<String, HashMap<String, Vec<u8>>>,
}

impl UpdateBatch {
    /// Creates an empty batch.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stages `value` under `(namespace, key)`.
    pub fn put(&mut self, namespace: &str, key: &str, value: impl Into<Vec<u8>>) {
        self.updates
            .entry(namespace.to_owned())
            .or_default()
            .insert(key.to_owned(), value.into());
    }

    /// Namespaces with at least one staged update, sorted for
    /// deterministic apply order.
    pub fn namespaces(&self) -> Vec<&str> {
        let mut namespaces: Vec<&str> = self.updates.keys().map(String::as_str).collect();
        namespaces.sort_unstable();
        namespaces
    }

    /// The staged updates for `namespace`.
    pub fn updates(&self, namespace: &str) -> Option<&HashMap<String, Vec<u8>>> {
        self.updates.get(namespace)
    }

    /// True when no namespace has staged updates.
    pub fn is_empty(&self) -> bool {
        self.updates.is_empty()
    }
}

/// Untyped options attached to metadata-bearing query operations.
pub type ScanMetadata = serde_json::Map<String, serde_json::Value>;

/// A stream of `(logical key, versioned value)` pairs from a scan or query.
pub type StateScanIter<'a> =
    Box<dyn Iterator<Item = Result<(String, VersionedValue), StateDbError>> + Send + 'a>;

/// What a state read resolves to: an ordinary versioned value, or the
/// structured reply of a lineage query encoded in the key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum StateQueryReply {
    /// An ordinary versioned read; `None` when the key is absent.
    Value(Option<VersionedValue>),
    /// A lineage query reply (historical / backward / forward).
    Lineage(LineageReply),
}

/// The versioned state database contract.
///
/// Reads may run concurrently from any number of callers; `apply_updates`
/// is the only mutator and is expected to be serialized per instance by
/// the caller.
pub trait VersionedDb: Send + Sync {
    /// Initializes the engine's global state.
    fn open(&self) -> Result<(), StateDbError>;

    /// Releases nothing: the engine is shared and externally owned.
    fn close(&self);

    /// Reads the latest value of `(namespace, key)`, or runs the lineage
    /// query encoded in `key`.
    fn get_state(&self, namespace: &str, key: &str) -> Result<StateQueryReply, StateDbError>;

    /// Reads `(namespace, key)` as of `snapshot` (`LATEST_SNAPSHOT` for
    /// the newest committed value).
    ///
    /// A snapshot-scoped reply reports the requested height verbatim; a
    /// latest read reports the block the engine attributes to the value.
    fn get_state_at_snapshot(
        &self,
        snapshot: u64,
        namespace: &str,
        key: &str,
    ) -> Result<StateQueryReply, StateDbError>;

    /// The version of the latest value of `(namespace, key)`, `None` when
    /// absent. Lineage-suffixed keys resolve to `Height::zero()` without
    /// consulting the engine.
    fn get_version(&self, namespace: &str, key: &str) -> Result<Option<Height>, StateDbError>;

    /// Applies one block's updates: one versioned put per real key, then
    /// a single commit for the whole batch, then snapshot and savepoint
    /// bookkeeping.
    fn apply_updates(&self, batch: &UpdateBatch, height: Height) -> Result<(), StateDbError>;

    /// The externally persisted marker of the most recently fully
    /// committed block height.
    fn latest_savepoint(&self) -> Result<Height, StateDbError>;

    /// The most recently committed height this instance has observed;
    /// 0 before any commit.
    fn retrieve_latest_snapshot(&self) -> u64;

    /// Acknowledges a snapshot release. Snapshot entries are intentionally
    /// never evicted; always returns true.
    fn release_snapshot(&self, snapshot: u64) -> bool;

    /// Unsupported; fails deterministically.
    fn get_state_multiple_keys(
        &self,
        namespace: &str,
        keys: &[String],
    ) -> Result<Vec<Option<VersionedValue>>, StateDbError>;

    /// Unsupported; fails deterministically. `start_key` is inclusive and
    /// `end_key` exclusive in the contract this stub refuses to serve.
    fn get_state_range_scan(
        &self,
        namespace: &str,
        start_key: &str,
        end_key: &str,
    ) -> Result<StateScanIter<'_>, StateDbError>;

    /// Unsupported; fails deterministically.
    fn get_state_range_scan_with_metadata(
        &self,
        namespace: &str,
        start_key: &str,
        end_key: &str,
        metadata: Option<&ScanMetadata>,
    ) -> Result<StateScanIter<'_>, StateDbError>;

    /// Unsupported; fails deterministically.
    fn execute_query(&self, namespace: &str, query: &str)
        -> Result<StateScanIter<'_>, StateDbError>;

    /// Unsupported; fails deterministically.
    fn execute_query_with_metadata(
        &self,
        namespace: &str,
        query: &str,
        metadata: Option<&ScanMetadata>,
    ) -> Result<StateScanIter<'_>, StateDbError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn namespaces_are_sorted() {
        let mut batch = UpdateBatch::new();
        batch.put("zeta", "k", b"v".to_vec());
        batch.put("alpha", "k", b"v".to_vec());
        batch.put("mid", "k", b"v".to_vec());
        assert_eq!(batch.namespaces(), vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn put_overwrites_within_a_namespace() {
        let mut batch = UpdateBatch::new();
        batch.put("ns", "k", b"v1".to_vec());
        batch.put("ns", "k", b"v2".to_vec());
        let updates = batch.updates("ns").unwrap();
        assert_eq!(updates.get("k").unwrap(), &b"v2".to_vec());
    }
}
