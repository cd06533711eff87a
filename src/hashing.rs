//! Hashing - SHA-256 fingerprints for render reports
//!
//! A printed sheet can be traced back to the exact tuning values and item
//! list that produced it.

use sha2::{Sha256, Digest};
use serde::Serialize;
use serde_json::{Value, to_string};

use crate::item::Item;
use crate::layout::LayoutConfig;

/// Compute SHA-256 hash of bytes, return hex string
pub fn sha256_hex(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    let result = hasher.finalize();
    hex::encode(result)
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let v: Value = serde_json::to_value(value)?;
    let sorted = sort_value(&v);
    to_string(&sorted)
}

fn sort_value(v: &Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut sorted: Vec<_> = map.iter().collect();
            sorted.sort_by(|a, b| a.0.cmp(b.0));
            let sorted_map: serde_json::Map<String, Value> = sorted
                .into_iter()
                .map(|(k, v)| (k.clone(), sort_value(v)))
                .collect();
            Value::Object(sorted_map)
        }
        Value::Array(arr) => {
            Value::Array(arr.iter().map(sort_value).collect())
        }
        _ => v.clone()
    }
}

/// Fingerprint of every tuning value in a layout
pub fn layout_fingerprint(layout: &LayoutConfig) -> Result<String, serde_json::Error> {
    let canonical = canonical_json(layout)?;
    Ok(sha256_hex(canonical.as_bytes()))
}

/// Fingerprint of one render job
/// job_hash = sha256(layout_fingerprint + canonical_items + engine_version)
pub fn compute_job_hash(
    layout: &LayoutConfig,
    items: &[Item],
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let canonical_items = canonical_json(&items)?;
    let combined = format!(
        "{}:{}:{}",
        layout_fingerprint(layout)?, canonical_items, engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

mod hex {
    pub fn encode(bytes: impl AsRef<[u8]>) -> String {
        bytes.as_ref().iter().map(|b| format!("{:02x}", b)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": 3});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":3,"z":1}"#);
    }

    #[test]
    fn test_known_digest() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_layout_fingerprint_tracks_values() {
        let defaults = LayoutConfig::defaults();
        let h1 = layout_fingerprint(&defaults).unwrap();
        let h2 = layout_fingerprint(&LayoutConfig::defaults()).unwrap();
        assert_eq!(h1, h2);
        assert_eq!(h1.len(), 64);

        let tuned = LayoutConfig {
            dish_ar_gap_mm: 9.0,
            ..LayoutConfig::defaults()
        };
        assert_ne!(h1, layout_fingerprint(&tuned).unwrap());
    }

    #[test]
    fn test_job_hash_depends_on_items() {
        let layout = LayoutConfig::defaults();
        let a = vec![Item::new("Hummus", "")];
        let b = vec![Item::new("Falafel", "")];
        assert_ne!(
            compute_job_hash(&layout, &a, "1.0.0").unwrap(),
            compute_job_hash(&layout, &b, "1.0.0").unwrap()
        );
    }
}
