// Path: crates/api/src/lib.rs

//! # provkv API Crate Lints
//!
//! This crate enforces a strict set of lints to ensure high-quality,
//! panic-free, and well-documented code. Panics are disallowed in non-test
//! code to promote robust error handling.
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::todo,
        clippy::unimplemented,
        clippy::indexing_slicing
    )
)]
//! # provkv API
//!
//! Core traits and interfaces for the provkv versioned state adapter.
//! This crate defines the stable contract between the ledger's
//! transaction-management layer, the adapter, and the snapshot-capable
//! engine underneath it.

/// Capability traits and result types for the underlying snapshot engine.
pub mod engine;
/// Core error types and the `ErrorCode` trait.
pub mod error;
/// State value types, lineage queries, and the `VersionedDb` contract.
pub mod state;
/// In-memory mock engine for tests.
pub mod test_utils;

/// A curated set of the most commonly used traits and types.
pub mod prelude {
    pub use crate::engine::{SnapshotEngine, VersionToken};
    pub use crate::error::{EngineError, ErrorCode, StateDbError};
    pub use crate::state::{
        Height, StateQueryReply, UpdateBatch, VersionedDb, VersionedValue, LATEST_SNAPSHOT,
    };
}
