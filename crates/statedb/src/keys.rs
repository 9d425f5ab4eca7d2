// Path: crates/statedb/src/keys.rs

//! Composite key construction for the flat engine keyspace.

/// Separator between the namespace and the logical key. A single byte:
/// the mapping is injective only while namespaces never contain it, and
/// the engine keyspace depends on this exact layout.
pub const COMPOSITE_KEY_SEP: char = '\u{0}';

/// Flattens `(namespace, key)` into the engine's composite keyspace.
///
/// Pure and deterministic; never reversed by this adapter.
pub fn composite_key(namespace: &str, key: &str) -> String {
    let mut out = String::with_capacity(namespace.len() + key.len() + 1);
    out.push_str(namespace);
    out.push(COMPOSITE_KEY_SEP);
    out.push_str(key);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn stable_across_calls() {
        assert_eq!(composite_key("ns", "key"), composite_key("ns", "key"));
        assert_eq!(composite_key("ns", "key"), "ns\u{0}key");
    }

    #[test]
    fn distinct_pairs_stay_distinct() {
        assert_ne!(composite_key("a", "bc"), composite_key("ab", "c"));
        assert_ne!(composite_key("", "k"), composite_key("k", ""));
    }

    proptest! {
        #[test]
        fn reversible_for_separator_free_namespaces(
            ns in "[a-z0-9_:.-]{0,12}",
            key in "(?s).{0,24}",
        ) {
            let ck = composite_key(&ns, &key);
            let (decoded_ns, decoded_key) = ck.split_once(COMPOSITE_KEY_SEP).unwrap();
            prop_assert_eq!(decoded_ns, ns);
            prop_assert_eq!(decoded_key, key);
        }
    }
}
