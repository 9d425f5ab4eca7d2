// Path: crates/statedb/src/snapshots.rs

//! Maps committed block heights to the engine's opaque version tokens.

use ahash::AHashMap;
use provkv_api::engine::VersionToken;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{PoisonError, RwLock};

/// Per-adapter snapshot bookkeeping.
///
/// Written only from the apply path, which the caller serializes; read
/// concurrently from any number of callers. The latest height is an
/// atomic so readers never observe a torn value. Entries are never
/// evicted: growth is bounded by chain length, an accepted cost.
#[derive(Debug, Default)]
pub struct SnapshotTracker {
    latest: AtomicU64,
    versions: RwLock<AHashMap<u64, VersionToken>>,
}

impl SnapshotTracker {
    /// Creates an empty tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a successful commit: stores the token, then publishes the
    /// new latest height.
    pub fn record_commit(&self, height: u64, token: VersionToken) {
        self.versions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(height, token);
        self.latest.store(height, Ordering::Release);
    }

    /// The most recently committed height; 0 before any commit.
    pub fn latest_height(&self) -> u64 {
        self.latest.load(Ordering::Acquire)
    }

    /// The version token recorded at `height`. Absent means no commit
    /// recorded that height; callers apply without snapshot pinning.
    pub fn token_for(&self, height: u64) -> Option<VersionToken> {
        self.versions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&height)
            .cloned()
    }

    /// Acknowledges a release without evicting anything.
    pub fn release(&self, _height: u64) -> bool {
        true
    }
}
