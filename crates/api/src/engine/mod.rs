// Path: crates/api/src/engine/mod.rs

//! Capability traits for the underlying snapshot-capable key-value engine.
//!
//! The adapter never looks inside the engine: it only needs init, plain
//! get/put, a versioned put with provenance, commit-with-version-token,
//! and the three lineage primitives. Every call is synchronous and
//! run-to-completion; a hung engine call hangs the caller.

use crate::error::EngineError;

/// An opaque token identifying the engine state after a commit.
///
/// Tokens are stored and replayed verbatim; the adapter never interprets
/// their contents.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct VersionToken(pub String);

impl VersionToken {
    /// Returns the token's raw text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for VersionToken {
    fn from(raw: String) -> Self {
        Self(raw)
    }
}

/// A value resolved by a point-in-time historical lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistEntry {
    /// The raw value bytes.
    pub value: Vec<u8>,
    /// The block at which this value was created.
    pub created_block: u64,
}

/// The dependency set recorded for a key's version, traced backward.
///
/// `dep_keys` and `dep_blocks` are parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BackwardTrace {
    /// Composite keys the traced version declared as dependencies.
    pub dep_keys: Vec<String>,
    /// The block at which each dependency's value was created.
    pub dep_blocks: Vec<u64>,
    /// The transaction that produced the traced version.
    pub txn_id: String,
}

/// Writes that declared a dependency on a key's version, traced forward.
///
/// The three arrays are parallel.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ForwardTrace {
    /// Composite keys of the referencing writes.
    pub forward_keys: Vec<String>,
    /// The block of each referencing write.
    pub forward_blocks: Vec<u64>,
    /// The transaction id of each referencing write.
    pub txn_ids: Vec<String>,
}

/// The abstract capability set the adapter requires from the engine.
pub trait SnapshotEngine: Send + Sync {
    /// Initializes the engine's global state. Called once on `open`.
    fn init_global_state(&self) -> Result<(), EngineError>;

    /// Reads a plain (unversioned) key.
    fn get(&self, key: &str) -> Result<Vec<u8>, EngineError>;

    /// Writes a plain (unversioned) key.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), EngineError>;

    /// Stages a versioned write with provenance.
    ///
    /// `txn_id` must be non-empty. `deps` are composite keys this write
    /// depends on. `snapshot_token` pins the write to a committed engine
    /// version; `None` applies without pinning.
    fn put_state(
        &self,
        composite_key: &str,
        value: &[u8],
        txn_id: &str,
        block: u64,
        deps: &[String],
        snapshot_token: Option<&VersionToken>,
    ) -> Result<(), EngineError>;

    /// Commits every staged write and returns the new version token.
    fn commit(&self) -> Result<VersionToken, EngineError>;

    /// Resolves the value of `composite_key` as of `block`.
    ///
    /// `u64::MAX` selects the latest committed version.
    fn hist(&self, composite_key: &str, block: u64) -> Result<HistEntry, EngineError>;

    /// Traces the dependencies of the version of `composite_key` at `block`.
    fn backward(&self, composite_key: &str, block: u64) -> Result<BackwardTrace, EngineError>;

    /// Traces writes that depend on the version of `composite_key` at `block`.
    fn forward(&self, composite_key: &str, block: u64) -> Result<ForwardTrace, EngineError>;
}
