// Path: crates/api/src/error/mod.rs
//! Core error types for the provkv state adapter.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Status outcomes surfaced by the underlying snapshot engine.
///
/// `NotFound` is separated from the generic status variant because the two
/// are handled differently upstream: an ordinary read maps `NotFound` to an
/// absent value, while any other status is propagated with its text.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Any non-OK, non-not-found status, carrying the engine's status text.
    #[error("engine status: {0}")]
    Status(String),
    /// The requested key (or version) does not exist in the engine.
    #[error("not found")]
    NotFound,
}

impl ErrorCode for EngineError {
    fn code(&self) -> &'static str {
        match self {
            Self::Status(_) => "ENGINE_STATUS",
            Self::NotFound => "ENGINE_NOT_FOUND",
        }
    }
}

/// Errors returned by the versioned state adapter.
///
/// An absent value on an ordinary read is NOT an error; it is represented
/// as `Ok(None)`. Lineage query failures are not represented here either:
/// they resolve to a structured soft-failure reply.
#[derive(Debug, Error)]
pub enum StateDbError {
    /// Engine global-state initialization failed on `open`.
    #[error("failed to initialize global state: {0}")]
    Init(String),
    /// An engine status failure on an ordinary read or a versioned put.
    #[error("engine error: {0}")]
    Engine(String),
    /// The block commit failed; the batch is entirely uncommitted.
    #[error("commit failed: {0}")]
    Commit(String),
    /// The savepoint marker is absent, unreadable, or failed to persist.
    #[error("savepoint error: {0}")]
    Savepoint(String),
    /// A malformed lineage key, snapshot sidecar, or savepoint payload.
    #[error("parse error: {0}")]
    Parse(String),
    /// The operation is not implemented by this adapter. Callers get this
    /// error deterministically, never a partial or empty success.
    #[error("{0} is not supported")]
    Unsupported(&'static str),
}

impl ErrorCode for StateDbError {
    fn code(&self) -> &'static str {
        match self {
            Self::Init(_) => "STATEDB_INIT_FAILED",
            Self::Engine(_) => "STATEDB_ENGINE_ERROR",
            Self::Commit(_) => "STATEDB_COMMIT_FAILED",
            Self::Savepoint(_) => "STATEDB_SAVEPOINT",
            Self::Parse(_) => "STATEDB_PARSE_FAILED",
            Self::Unsupported(_) => "STATEDB_UNSUPPORTED",
        }
    }
}
