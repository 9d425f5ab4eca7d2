// Path: crates/api/src/state/lineage.rs

//! Lineage queries: requests parsed once at the boundary, and their
//! structured replies.
//!
//! A logical key ending in `_hist`, `_backward`, or `_forward` is not an
//! ordinary read: it encodes a diagnostic query against a key's value or
//! dependency history. Engine failures on these paths are converted into
//! a structured `Failed` reply instead of an error, so a single bad trace
//! never aborts a broader read-only operation. A malformed block-index
//! segment is the exception: that is a caller bug and always a hard error.

use crate::error::StateDbError;
use serde::{Deserialize, Serialize};

const HIST_SUFFIX: &str = "_hist";
const BACKWARD_SUFFIX: &str = "_backward";
const FORWARD_SUFFIX: &str = "_forward";

/// The three lineage query kinds, keyed by reserved key suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineageKind {
    /// Historical value as of a block.
    Hist,
    /// Backward dependency trace.
    Backward,
    /// Forward dependency trace.
    Forward,
}

impl LineageKind {
    /// Returns the kind encoded in `key`'s suffix, if any.
    ///
    /// Pure suffix inspection; does not validate the block index segment
    /// (the `get_version` fast path relies on that distinction).
    pub fn of(key: &str) -> Option<Self> {
        if key.ends_with(HIST_SUFFIX) {
            Some(Self::Hist)
        } else if key.ends_with(BACKWARD_SUFFIX) {
            Some(Self::Backward)
        } else if key.ends_with(FORWARD_SUFFIX) {
            Some(Self::Forward)
        } else {
            None
        }
    }

    fn suffix(self) -> &'static str {
        match self {
            Self::Hist => HIST_SUFFIX,
            Self::Backward => BACKWARD_SUFFIX,
            Self::Forward => FORWARD_SUFFIX,
        }
    }
}

/// A fully parsed lineage request, `<original>_<blkIdx>_<suffix>` in key
/// form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineageQuery {
    /// Which trace to run.
    pub kind: LineageKind,
    /// The key whose lineage is queried. May itself contain `_`; the
    /// block index segment is resolved from the right.
    pub original_key: String,
    /// The block index the trace is anchored at.
    pub block: u64,
}

impl LineageQuery {
    /// Parses `key` into a lineage request, or `None` for an ordinary key.
    ///
    /// The block index is the `_`-separated segment immediately before the
    /// reserved suffix; a missing or non-integer segment is a hard
    /// `Parse` error.
    pub fn parse(key: &str) -> Result<Option<Self>, StateDbError> {
        let Some(kind) = LineageKind::of(key) else {
            return Ok(None);
        };
        let stem = key.strip_suffix(kind.suffix()).unwrap_or(key);
        let Some((original_key, block)) = stem.rsplit_once('_') else {
            return Err(StateDbError::Parse(format!(
                "missing block index segment in lineage key {key:?}"
            )));
        };
        let block = block.parse::<u64>().map_err(|_| {
            StateDbError::Parse(format!(
                "invalid block index {block:?} in lineage key {key:?}"
            ))
        })?;
        Ok(Some(Self {
            kind,
            original_key: original_key.to_owned(),
            block,
        }))
    }
}

/// The reply to a historical-value query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistRecord {
    /// The value as of the queried block.
    pub value: Vec<u8>,
    /// The block at which that value was created.
    pub created_block: u64,
}

/// The reply to a backward dependency trace.
///
/// `dep_keys` and `dep_blocks` are parallel arrays.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackwardRecord {
    /// Composite keys the traced version declared as dependencies.
    pub dep_keys: Vec<String>,
    /// The block at which each dependency's value was created.
    pub dep_blocks: Vec<u64>,
    /// The transaction that produced the traced version.
    pub txn_id: String,
}

/// The reply to a forward dependency trace.
///
/// The three arrays are parallel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForwardRecord {
    /// Composite keys of the referencing writes.
    pub forward_keys: Vec<String>,
    /// The block of each referencing write.
    pub forward_blocks: Vec<u64>,
    /// The transaction id of each referencing write.
    pub txn_ids: Vec<String>,
}

/// A lineage query always resolves to a structured reply: either the
/// record, or the engine's failure text. Failures here are soft by
/// contract.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineageOutcome<T> {
    /// The trace succeeded.
    Found(T),
    /// The engine rejected the trace.
    Failed {
        /// The engine's status text. Never empty.
        message: String,
    },
}

/// The reply of a lineage query, tagged by kind.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LineageReply {
    /// Historical-value query reply.
    Hist(LineageOutcome<HistRecord>),
    /// Backward dependency trace reply.
    Backward(LineageOutcome<BackwardRecord>),
    /// Forward dependency trace reply.
    Forward(LineageOutcome<ForwardRecord>),
}
