use serde_json::Value;
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;

/// Serializes a JSON value into its canonical form: object keys sorted, no whitespace.
///
/// The result is independent of the map implementation backing `serde_json::Map`, so the
/// content hash of a state point stays stable even if some dependency enables
/// `preserve_order`.
pub fn to_canonical_json(value: &Value) -> String {
    match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => Value::String(s.clone()).to_string(),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(to_canonical_json).collect();
            format!("[{}]", items.join(","))
        }
        Value::Object(map) => {
            let sorted: BTreeMap<&String, String> = map
                .iter()
                .map(|(k, v)| (k, to_canonical_json(v)))
                .collect();
            let items: Vec<String> = sorted
                .into_iter()
                .map(|(k, v)| format!("{}:{}", Value::String(k.clone()), v))
                .collect();
            format!("{{{}}}", items.join(","))
        }
    }
}

/// Hex-encoded SHA-256 digest of the canonical JSON form of `value`.
pub fn content_hash(value: &Value) -> String {
    let digest = Sha256::digest(to_canonical_json(value).as_bytes());
    hex::encode(digest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn primitives_serialize_compactly() {
        assert_eq!(to_canonical_json(&json!(null)), "null");
        assert_eq!(to_canonical_json(&json!(true)), "true");
        assert_eq!(to_canonical_json(&json!(20)), "20");
        assert_eq!(to_canonical_json(&json!(1.3)), "1.3");
        assert_eq!(to_canonical_json(&json!("a\"b")), "\"a\\\"b\"");
    }

    #[test]
    fn nested_objects_have_sorted_keys() {
        let value = json!({ "z": [ { "y": 1 }, null ], "a": { "x": [16, 16, 16] } });
        assert_eq!(
            to_canonical_json(&value),
            "{\"a\":{\"x\":[16,16,16]},\"z\":[{\"y\":1},null]}"
        );
    }

    #[test]
    fn content_hash_is_hex_sha256() {
        let hash = content_hash(&json!({ "lengths": 20 }));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
        assert_eq!(hash, content_hash(&json!({ "lengths": 20 })));
        assert_ne!(hash, content_hash(&json!({ "lengths": 30 })));
    }
}
