// Path: crates/statedb/src/apply.rs

//! Splits one namespace's flat update map into explicit per-key writes.
//!
//! Upstream batches carry per-key metadata as sibling pseudo-entries
//! (`K_prov`, `K_txnID`, `K_snapshot`). They are consumed here, once,
//! into a `StateWrite` per real key; sidecars are never written to the
//! engine themselves.

use crate::keys::composite_key;
use provkv_api::error::StateDbError;
use provkv_api::state::LATEST_SNAPSHOT;
use std::collections::HashMap;

pub(crate) const PROV_SUFFIX: &str = "_prov";
pub(crate) const TXN_ID_SUFFIX: &str = "_txnID";
pub(crate) const SNAPSHOT_SUFFIX: &str = "_snapshot";

/// The engine rejects empty transaction ids, so writes whose batch
/// carries none get this fixed placeholder.
const PLACEHOLDER_TXN_ID: &str = "faketxnid";

/// One real key's fully resolved write.
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct StateWrite<'a> {
    pub composite_key: String,
    pub value: &'a [u8],
    pub deps: Vec<String>,
    pub txn_id: &'a str,
    /// Snapshot height to pin against, if the batch requested one.
    pub pinned_snapshot: Option<u64>,
}

fn is_sidecar(key: &str) -> bool {
    key.ends_with(PROV_SUFFIX) || key.ends_with(TXN_ID_SUFFIX) || key.ends_with(SNAPSHOT_SUFFIX)
}

fn sidecar_str<'a>(
    updates: &'a HashMap<String, Vec<u8>>,
    key: &str,
    suffix: &str,
) -> Result<Option<&'a str>, StateDbError> {
    match updates.get(&format!("{key}{suffix}")) {
        Some(raw) => std::str::from_utf8(raw).map(Some).map_err(|_| {
            StateDbError::Parse(format!("{key}{suffix} sidecar is not valid UTF-8"))
        }),
        None => Ok(None),
    }
}

/// Resolves every real key in `updates`, sorted for deterministic apply
/// order. Orphan sidecar entries are dropped.
pub(crate) fn partition_namespace<'a>(
    namespace: &str,
    updates: &'a HashMap<String, Vec<u8>>,
) -> Result<Vec<StateWrite<'a>>, StateDbError> {
    let mut real: Vec<(&String, &Vec<u8>)> = updates
        .iter()
        .filter(|(key, _)| !is_sidecar(key.as_str()))
        .collect();
    real.sort_by(|a, b| a.0.cmp(b.0));

    let mut writes = Vec::with_capacity(real.len());
    for (key, value) in real {
        let deps = match sidecar_str(updates, key, PROV_SUFFIX)? {
            Some(prov) => prov
                .split('_')
                .filter(|dep| !dep.is_empty())
                .map(|dep| composite_key(namespace, dep))
                .collect(),
            None => Vec::new(),
        };
        let txn_id = sidecar_str(updates, key, TXN_ID_SUFFIX)?.unwrap_or(PLACEHOLDER_TXN_ID);
        let pinned_snapshot = match updates.get(&format!("{key}{SNAPSHOT_SUFFIX}")) {
            Some(raw) => {
                let bytes: [u8; 8] = raw.as_slice().try_into().map_err(|_| {
                    StateDbError::Parse(format!(
                        "{key}{SNAPSHOT_SUFFIX} sidecar must be 8 bytes, got {}",
                        raw.len()
                    ))
                })?;
                match u64::from_le_bytes(bytes) {
                    LATEST_SNAPSHOT => None,
                    height => Some(height),
                }
            }
            None => None,
        };
        writes.push(StateWrite {
            composite_key: composite_key(namespace, key),
            value,
            deps,
            txn_id,
            pinned_snapshot,
        });
    }
    Ok(writes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn updates(entries: &[(&str, &[u8])]) -> HashMap<String, Vec<u8>> {
        entries
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_vec()))
            .collect()
    }

    #[test]
    fn splits_provenance_and_drops_empty_segments() {
        let updates = updates(&[("k", b"v"), ("k_prov", b"a__b_")]);
        let writes = partition_namespace("ns", &updates).unwrap();
        assert_eq!(writes.len(), 1);
        assert_eq!(
            writes[0].deps,
            vec!["ns\u{0}a".to_string(), "ns\u{0}b".to_string()]
        );
    }

    #[test]
    fn placeholder_txn_id_when_sidecar_absent() {
        let updates = updates(&[("k", b"v")]);
        let writes = partition_namespace("ns", &updates).unwrap();
        assert_eq!(writes[0].txn_id, "faketxnid");
        assert!(writes[0].deps.is_empty());
        assert_eq!(writes[0].pinned_snapshot, None);
    }

    #[test]
    fn real_keys_are_sorted() {
        let updates = updates(&[("k2", b"b"), ("k1", b"a"), ("k3", b"c")]);
        let writes = partition_namespace("ns", &updates).unwrap();
        let keys: Vec<&str> = writes.iter().map(|w| w.composite_key.as_str()).collect();
        assert_eq!(keys, vec!["ns\u{0}k1", "ns\u{0}k2", "ns\u{0}k3"]);
    }

    #[test]
    fn snapshot_sidecar_decodes_little_endian() {
        let raw = 42u64.to_le_bytes();
        let updates = updates(&[("k", b"v"), ("k_snapshot", raw.as_slice())]);
        let writes = partition_namespace("ns", &updates).unwrap();
        assert_eq!(writes[0].pinned_snapshot, Some(42));
    }

    #[test]
    fn snapshot_sentinel_means_no_pinning() {
        let raw = u64::MAX.to_le_bytes();
        let updates = updates(&[("k", b"v"), ("k_snapshot", raw.as_slice())]);
        let writes = partition_namespace("ns", &updates).unwrap();
        assert_eq!(writes[0].pinned_snapshot, None);
    }

    #[test]
    fn short_snapshot_sidecar_is_a_parse_error() {
        let updates = updates(&[("k", b"v"), ("k_snapshot", b"abc")]);
        assert!(matches!(
            partition_namespace("ns", &updates),
            Err(StateDbError::Parse(_))
        ));
    }

    #[test]
    fn orphan_sidecars_are_dropped() {
        let updates = updates(&[("x_prov", b"a"), ("y_txnID", b"t"), ("z_snapshot", b"12345678")]);
        let writes = partition_namespace("ns", &updates).unwrap();
        assert!(writes.is_empty());
    }
}
