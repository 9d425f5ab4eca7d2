// Path: crates/statedb/src/lineage.rs

//! Runs parsed lineage queries against the engine.
//!
//! Engine failures become `Failed { message }` replies, never errors:
//! lineage queries are diagnostic and must always return a structured
//! answer.

use crate::keys::composite_key;
use provkv_api::engine::SnapshotEngine;
use provkv_api::state::lineage::{
    BackwardRecord, ForwardRecord, HistRecord, LineageKind, LineageOutcome, LineageQuery,
    LineageReply,
};

pub(crate) fn run<E: SnapshotEngine + ?Sized>(
    engine: &E,
    namespace: &str,
    query: &LineageQuery,
) -> LineageReply {
    let key = composite_key(namespace, &query.original_key);
    match query.kind {
        LineageKind::Hist => LineageReply::Hist(hist(engine, &key, query.block)),
        LineageKind::Backward => LineageReply::Backward(backward(engine, &key, query.block)),
        LineageKind::Forward => LineageReply::Forward(forward(engine, &key, query.block)),
    }
}

fn hist<E: SnapshotEngine + ?Sized>(engine: &E, key: &str, block: u64) -> LineageOutcome<HistRecord> {
    match engine.hist(key, block) {
        Ok(entry) => LineageOutcome::Found(HistRecord {
            value: entry.value,
            created_block: entry.created_block,
        }),
        Err(err) => {
            tracing::debug!(target: "statedb", key, block, %err, "historical query failed");
            LineageOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}

fn backward<E: SnapshotEngine + ?Sized>(
    engine: &E,
    key: &str,
    block: u64,
) -> LineageOutcome<BackwardRecord> {
    match engine.backward(key, block) {
        Ok(trace) => LineageOutcome::Found(BackwardRecord {
            dep_keys: trace.dep_keys,
            dep_blocks: trace.dep_blocks,
            txn_id: trace.txn_id,
        }),
        Err(err) => {
            tracing::debug!(target: "statedb", key, block, %err, "backward query failed");
            LineageOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}

fn forward<E: SnapshotEngine + ?Sized>(
    engine: &E,
    key: &str,
    block: u64,
) -> LineageOutcome<ForwardRecord> {
    match engine.forward(key, block) {
        Ok(trace) => LineageOutcome::Found(ForwardRecord {
            forward_keys: trace.forward_keys,
            forward_blocks: trace.forward_blocks,
            txn_ids: trace.txn_ids,
        }),
        Err(err) => {
            tracing::debug!(target: "statedb", key, block, %err, "forward query failed");
            LineageOutcome::Failed {
                message: err.to_string(),
            }
        }
    }
}
