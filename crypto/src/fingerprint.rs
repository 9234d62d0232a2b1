//! Response fingerprints for conditional requests.
//!
//! A fingerprint is the SHA-256 of the payload's canonical JSON form (object
//! keys sorted at every depth, no whitespace), hex encoded and wrapped in
//! double quotes so it can be used verbatim as an `ETag`.

use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::Result;

/// Serialize `payload` canonically.
pub fn canonical_json<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    let value = serde_json::to_value(payload)?;
    Ok(serde_json::to_string(&canonicalize(value))?)
}

// Rebuild objects with keys inserted in sorted order. This holds whether or
// not serde_json's `preserve_order` feature is enabled somewhere in the graph.
fn canonicalize(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));

            let mut sorted = Map::new();
            for (key, child) in entries {
                sorted.insert(key, canonicalize(child));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(canonicalize).collect()),
        other => other,
    }
}

/// Compute the quoted validator token for `payload`.
pub fn fingerprint<T: Serialize + ?Sized>(payload: &T) -> Result<String> {
    let canonical = canonical_json(payload)?;
    let digest = Sha256::digest(canonical.as_bytes());

    let mut token = String::with_capacity(66);
    token.push('"');
    for byte in digest {
        token.push_str(&format!("{:02x}", byte));
    }
    token.push('"');
    Ok(token)
}

/// Whether a client-supplied validator matches the current one.
///
/// Plain string equality; no validator never matches.
pub fn matches(client_token: Option<&str>, current_token: &str) -> bool {
    client_token == Some(current_token)
}

/// `Cache-Control` value using `ttl_secs` for every freshness directive.
pub fn cache_control(ttl_secs: u64) -> String {
    format!(
        "public, max-age={ttl}, s-maxage={ttl}, stale-while-revalidate={ttl}, stale-if-error={ttl}",
        ttl = ttl_secs
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn is_token(token: &str) -> bool {
        token.len() == 66
            && token.starts_with('"')
            && token.ends_with('"')
            && token[1..65].chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase())
    }

    #[test]
    fn test_canonical_form_is_sorted_and_compact() {
        let payload = json!({"b": 1, "a": {"d": [1, {"z": 0, "y": 1}], "c": "x"}});
        assert_eq!(
            canonical_json(&payload).unwrap(),
            r#"{"a":{"c":"x","d":[1,{"y":1,"z":0}]},"b":1}"#
        );
    }

    #[test]
    fn test_key_order_does_not_matter() {
        let a = json!({"base": "EUR", "rates": {"USD": 1.08, "JPY": 161.0}, "date": "2024-02-05"});
        let b = json!({"date": "2024-02-05", "rates": {"JPY": 161.0, "USD": 1.08}, "base": "EUR"});
        assert_eq!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_leaf_change_changes_token() {
        let a = json!({"rates": {"USD": 1.08}});
        let b = json!({"rates": {"USD": 1.09}});
        assert_ne!(fingerprint(&a).unwrap(), fingerprint(&b).unwrap());
    }

    #[test]
    fn test_known_token() {
        // sha256 of the two bytes "{}"
        assert_eq!(
            fingerprint(&json!({})).unwrap(),
            "\"44136fa355b3678a1146ad16f7e8649e94fb4fc21fe77e8310c060f61caaff8a\""
        );
        // digest of the canonical bytes {"a":1,"b":[2]}
        assert_eq!(
            fingerprint(&json!({"b": [2], "a": 1})).unwrap(),
            "\"0855bfc20eb6cfaa4be7d6b510c63dd22997718bddadcb1a4915cec3a16145b9\""
        );
    }

    #[test]
    fn test_matches() {
        let token = fingerprint(&json!({"a": 1})).unwrap();
        assert!(matches(Some(token.as_str()), &token));
        assert!(!matches(None, &token));
        assert!(!matches(Some("\"other\""), &token));
        // weak or unquoted forms are not equal
        assert!(!matches(Some(token.trim_matches('"')), &token));
    }

    #[test]
    fn test_cache_control() {
        assert_eq!(
            cache_control(86400),
            "public, max-age=86400, s-maxage=86400, stale-while-revalidate=86400, stale-if-error=86400"
        );
    }

    fn json_value() -> impl Strategy<Value = Value> {
        let leaf = prop_oneof![
            any::<bool>().prop_map(Value::from),
            any::<i64>().prop_map(Value::from),
            "[a-z]{0,6}".prop_map(Value::from),
        ];
        leaf.prop_recursive(3, 24, 4, |inner| {
            prop_oneof![
                prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
                prop::collection::btree_map("[a-z]{1,4}", inner, 0..4)
                    .prop_map(|m| Value::Object(m.into_iter().collect())),
            ]
        })
    }

    // Same entries, inserted in reverse order.
    fn reinsert_reversed(value: &Value) -> Value {
        match value {
            Value::Object(map) => {
                let mut entries: Vec<_> = map.iter().collect();
                entries.reverse();
                let mut out = Map::new();
                for (k, v) in entries {
                    out.insert(k.clone(), reinsert_reversed(v));
                }
                Value::Object(out)
            }
            Value::Array(items) => Value::Array(items.iter().map(reinsert_reversed).collect()),
            other => other.clone(),
        }
    }

    proptest! {
        #[test]
        fn prop_token_shape(value in json_value()) {
            let token = fingerprint(&value).unwrap();
            prop_assert!(is_token(&token));
        }

        #[test]
        fn prop_insertion_order_is_irrelevant(value in json_value()) {
            let reordered = reinsert_reversed(&value);
            prop_assert_eq!(fingerprint(&value).unwrap(), fingerprint(&reordered).unwrap());
        }
    }
}
