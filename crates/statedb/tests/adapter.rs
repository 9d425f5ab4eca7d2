// Path: crates/statedb/tests/adapter.rs

//! End-to-end adapter behavior over the in-memory mock engine.

use provkv_api::engine::VersionToken;
use provkv_api::error::{ErrorCode, StateDbError};
use provkv_api::state::lineage::{LineageOutcome, LineageReply};
use provkv_api::state::{Height, StateQueryReply, UpdateBatch, VersionedDb};
use provkv_api::test_utils::MockEngine;
use provkv_statedb::{ProvStateDb, ProvStateDbProvider};
use std::sync::Arc;

fn adapter() -> (Arc<MockEngine>, ProvStateDb<MockEngine>) {
    let engine = Arc::new(MockEngine::new());
    let db = ProvStateDb::new(engine.clone(), "chain-a");
    (engine, db)
}

fn single(namespace: &str, key: &str, value: &[u8]) -> UpdateBatch {
    let mut batch = UpdateBatch::new();
    batch.put(namespace, key, value.to_vec());
    batch
}

#[test]
fn open_initializes_the_engine() {
    let (_, db) = adapter();
    db.open().unwrap();
    db.close();
}

#[test]
fn savepoint_follows_sequential_commits() {
    let (_, db) = adapter();
    db.open().unwrap();
    for height in 1..=4u64 {
        db.apply_updates(&single("ns", "k", b"v"), Height::new(height, 0))
            .unwrap();
        assert_eq!(db.latest_savepoint().unwrap(), Height::new(height, 0));
        assert_eq!(db.retrieve_latest_snapshot(), height);
    }
}

#[test]
fn savepoint_is_an_error_before_any_commit() {
    let (_, db) = adapter();
    match db.latest_savepoint() {
        Err(StateDbError::Savepoint(_)) => {}
        other => panic!("expected savepoint error, got {other:?}"),
    }
}

#[test]
fn latest_read_reports_commit_height() {
    let (_, db) = adapter();
    db.apply_updates(&single("ns", "k", b"v1"), Height::new(5, 0))
        .unwrap();
    match db.get_state("ns", "k").unwrap() {
        StateQueryReply::Value(Some(value)) => {
            assert_eq!(value.value, b"v1");
            assert_eq!(value.version, Height::new(5, 0));
            assert!(value.metadata.is_none());
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn snapshot_read_reports_requested_height_verbatim() {
    let (_, db) = adapter();
    db.apply_updates(&single("ns", "k", b"v1"), Height::new(2, 0))
        .unwrap();
    match db.get_state_at_snapshot(7, "ns", "k").unwrap() {
        StateQueryReply::Value(Some(value)) => {
            assert_eq!(value.value, b"v1");
            assert_eq!(value.version, Height::new(7, 0));
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn absent_key_reads_as_none() {
    let (_, db) = adapter();
    assert_eq!(
        db.get_state("ns", "ghost").unwrap(),
        StateQueryReply::Value(None)
    );
    assert_eq!(db.get_version("ns", "ghost").unwrap(), None);
}

#[test]
fn hist_query_returns_soft_success() {
    let (_, db) = adapter();
    db.apply_updates(&single("ns", "foo", b"payload"), Height::new(5, 0))
        .unwrap();
    match db.get_state("ns", "foo_5_hist").unwrap() {
        StateQueryReply::Lineage(LineageReply::Hist(LineageOutcome::Found(record))) => {
            assert_eq!(record.value, b"payload");
            assert_eq!(record.created_block, 5);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn hist_query_soft_fails_on_engine_error() {
    let (_, db) = adapter();
    match db.get_state("ns", "ghost_3_hist").unwrap() {
        StateQueryReply::Lineage(LineageReply::Hist(LineageOutcome::Failed { message })) => {
            assert!(!message.is_empty());
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn malformed_block_index_is_a_hard_error() {
    let (_, db) = adapter();
    for key in ["foo_abc_hist", "foo_hist", "bar_x_backward", "baz__forward"] {
        match db.get_state("ns", key) {
            Err(StateDbError::Parse(_)) => {}
            other => panic!("expected parse error for {key}, got {other:?}"),
        }
    }
}

#[test]
fn underscored_original_keys_resolve_from_the_right() {
    let (_, db) = adapter();
    db.apply_updates(&single("ns", "my_key", b"v"), Height::new(3, 0))
        .unwrap();
    match db.get_state("ns", "my_key_3_hist").unwrap() {
        StateQueryReply::Lineage(LineageReply::Hist(LineageOutcome::Found(record))) => {
            assert_eq!(record.created_block, 3);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn unsupported_operations_fail_deterministically() {
    let (_, db) = adapter();
    let err = db
        .get_state_multiple_keys("ns", &["a".to_owned(), "b".to_owned()])
        .unwrap_err();
    assert!(matches!(err, StateDbError::Unsupported(_)));
    assert_eq!(err.code(), "STATEDB_UNSUPPORTED");
    assert!(matches!(
        db.get_state_range_scan("ns", "a", "z"),
        Err(StateDbError::Unsupported(_))
    ));
    assert!(matches!(
        db.get_state_range_scan_with_metadata("ns", "a", "z", None),
        Err(StateDbError::Unsupported(_))
    ));
    assert!(matches!(
        db.execute_query("ns", "{}"),
        Err(StateDbError::Unsupported(_))
    ));
    assert!(matches!(
        db.execute_query_with_metadata("ns", "{}", None),
        Err(StateDbError::Unsupported(_))
    ));
}

#[test]
fn provenance_and_txn_id_round_trip_to_the_engine() {
    let (engine, db) = adapter();
    let mut batch = UpdateBatch::new();
    batch.put("ns", "k1", b"v".to_vec());
    batch.put("ns", "k1_prov", b"a_b".to_vec());
    batch.put("ns", "k1_txnID", b"t1".to_vec());
    db.apply_updates(&batch, Height::new(4, 0)).unwrap();

    let puts = engine.recorded_puts();
    assert_eq!(puts.len(), 1, "sidecar entries must never be written");
    assert_eq!(puts[0].composite_key, "ns\u{0}k1");
    assert_eq!(
        puts[0].deps,
        vec!["ns\u{0}a".to_string(), "ns\u{0}b".to_string()]
    );
    assert_eq!(puts[0].txn_id, "t1");
    assert_eq!(puts[0].block, 4);
}

#[test]
fn placeholder_txn_id_when_batch_carries_none() {
    let (engine, db) = adapter();
    db.apply_updates(&single("ns", "k", b"v"), Height::new(1, 0))
        .unwrap();
    let puts = engine.recorded_puts();
    assert_eq!(puts[0].txn_id, "faketxnid");
    assert_eq!(puts[0].snapshot_token, None);
}

#[test]
fn snapshot_sidecar_pins_to_recorded_token() {
    let (engine, db) = adapter();
    db.apply_updates(&single("ns", "base", b"v0"), Height::new(1, 0))
        .unwrap();

    let mut batch = UpdateBatch::new();
    batch.put("ns", "k2", b"v2".to_vec());
    batch.put("ns", "k2_snapshot", 1u64.to_le_bytes().to_vec());
    db.apply_updates(&batch, Height::new(2, 0)).unwrap();

    let puts = engine.recorded_puts();
    assert_eq!(
        puts[1].snapshot_token,
        Some(VersionToken("v1".to_owned()))
    );
}

#[test]
fn sentinel_and_unknown_snapshots_apply_unpinned() {
    let (engine, db) = adapter();

    let mut batch = UpdateBatch::new();
    batch.put("ns", "k1", b"v".to_vec());
    batch.put("ns", "k1_snapshot", u64::MAX.to_le_bytes().to_vec());
    db.apply_updates(&batch, Height::new(1, 0)).unwrap();

    let mut batch = UpdateBatch::new();
    batch.put("ns", "k2", b"v".to_vec());
    batch.put("ns", "k2_snapshot", 9u64.to_le_bytes().to_vec());
    db.apply_updates(&batch, Height::new(2, 0)).unwrap();

    let puts = engine.recorded_puts();
    assert_eq!(puts[0].snapshot_token, None);
    assert_eq!(puts[1].snapshot_token, None);
}

#[test]
fn short_snapshot_sidecar_aborts_before_commit() {
    let (engine, db) = adapter();
    let mut batch = UpdateBatch::new();
    batch.put("ns", "k", b"v".to_vec());
    batch.put("ns", "k_snapshot", b"abc".to_vec());
    assert!(matches!(
        db.apply_updates(&batch, Height::new(1, 0)),
        Err(StateDbError::Parse(_))
    ));
    assert_eq!(engine.commit_count(), 0);
    assert_eq!(db.retrieve_latest_snapshot(), 0);
}

#[test]
fn release_snapshot_never_evicts() {
    let (engine, db) = adapter();
    db.apply_updates(&single("ns", "base", b"v"), Height::new(1, 0))
        .unwrap();
    assert!(db.release_snapshot(1));

    let mut batch = UpdateBatch::new();
    batch.put("ns", "k2", b"v".to_vec());
    batch.put("ns", "k2_snapshot", 1u64.to_le_bytes().to_vec());
    db.apply_updates(&batch, Height::new(2, 0)).unwrap();

    let puts = engine.recorded_puts();
    assert_eq!(
        puts[1].snapshot_token,
        Some(VersionToken("v1".to_owned()))
    );
}

#[test]
fn commit_failure_skips_bookkeeping() {
    let (engine, db) = adapter();
    engine.set_fail_commits(true);
    match db.apply_updates(&single("ns", "k", b"v"), Height::new(1, 0)) {
        Err(StateDbError::Commit(message)) => assert!(message.contains("commit rejected")),
        other => panic!("expected commit error, got {other:?}"),
    }
    assert_eq!(db.retrieve_latest_snapshot(), 0);
    assert!(matches!(
        db.latest_savepoint(),
        Err(StateDbError::Savepoint(_))
    ));
}

#[test]
fn get_version_fast_paths_lineage_suffixes() {
    let (_, db) = adapter();
    assert_eq!(
        db.get_version("ns", "foo_2_hist").unwrap(),
        Some(Height::zero())
    );
    // Suffix inspection only: a bad block segment is not parsed here.
    assert_eq!(
        db.get_version("ns", "foo_abc_forward").unwrap(),
        Some(Height::zero())
    );

    db.apply_updates(&single("ns", "k", b"v"), Height::new(5, 0))
        .unwrap();
    assert_eq!(db.get_version("ns", "k").unwrap(), Some(Height::new(5, 0)));
}

#[test]
fn backward_and_forward_traces() {
    let (_, db) = adapter();
    db.apply_updates(&single("ns", "a", b"base"), Height::new(1, 0))
        .unwrap();

    let mut batch = UpdateBatch::new();
    batch.put("ns", "k", b"v".to_vec());
    batch.put("ns", "k_prov", b"a".to_vec());
    batch.put("ns", "k_txnID", b"t9".to_vec());
    db.apply_updates(&batch, Height::new(2, 0)).unwrap();

    match db.get_state("ns", "k_2_backward").unwrap() {
        StateQueryReply::Lineage(LineageReply::Backward(LineageOutcome::Found(record))) => {
            assert_eq!(record.dep_keys, vec!["ns\u{0}a".to_string()]);
            assert_eq!(record.dep_blocks, vec![1]);
            assert_eq!(record.txn_id, "t9");
        }
        other => panic!("unexpected reply: {other:?}"),
    }

    match db.get_state("ns", "a_1_forward").unwrap() {
        StateQueryReply::Lineage(LineageReply::Forward(LineageOutcome::Found(record))) => {
            assert_eq!(record.forward_keys, vec!["ns\u{0}k".to_string()]);
            assert_eq!(record.forward_blocks, vec![2]);
            assert_eq!(record.txn_ids, vec!["t9".to_string()]);
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn backward_query_soft_fails_on_unknown_key() {
    let (_, db) = adapter();
    match db.get_state("ns", "ghost_1_backward").unwrap() {
        StateQueryReply::Lineage(LineageReply::Backward(LineageOutcome::Failed { message })) => {
            assert!(!message.is_empty());
        }
        other => panic!("unexpected reply: {other:?}"),
    }
}

#[test]
fn provider_hands_out_independent_handles() {
    let engine = Arc::new(MockEngine::new());
    let provider = ProvStateDbProvider::new(engine.clone());

    let first = provider.db_handle("chain-a");
    first.open().unwrap();
    first
        .apply_updates(&single("ns", "k", b"v"), Height::new(1, 0))
        .unwrap();
    assert_eq!(first.retrieve_latest_snapshot(), 1);

    // Fresh handle, fresh snapshot bookkeeping, shared engine.
    let second = provider.db_handle("chain-b");
    assert_eq!(second.retrieve_latest_snapshot(), 0);
    match second.get_state("ns", "k").unwrap() {
        StateQueryReply::Value(Some(value)) => assert_eq!(value.value, b"v"),
        other => panic!("unexpected reply: {other:?}"),
    }

    provider.close();
}
