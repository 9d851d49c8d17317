//! Hashing - SHA-256 digests for exported bitmaps and manifests
//!
//! Identical inputs must give identical hashes, so everything hashed as
//! JSON goes through the canonical (sorted-key) form first.

use serde::Serialize;
use serde_json::Value;
use sha2::{Digest, Sha256};

use crate::print::PrintSettings;
use crate::symbol::VectorSurface;

pub fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Convert to canonical JSON (sorted keys, no whitespace)
pub fn canonical_json<T: Serialize>(value: &T) -> Result<String, serde_json::Error> {
    let sorted = sort_value(serde_json::to_value(value)?);
    serde_json::to_string(&sorted)
}

fn sort_value(v: Value) -> Value {
    match v {
        Value::Object(map) => {
            let mut entries: Vec<_> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sort_value(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sort_value).collect()),
        other => other,
    }
}

pub fn compute_manifest_hash<T: Serialize>(manifest: &T) -> Result<String, serde_json::Error> {
    Ok(sha256_hex(canonical_json(manifest)?.as_bytes()))
}

/// job_hash = sha256(canonical surface : canonical settings : engine version)
///
/// The settings authority is left out: the same label at the same size
/// and DPI is the same job whoever asked for it.
pub fn compute_job_hash(
    surface: &VectorSurface,
    settings: &PrintSettings,
    engine_version: &str,
) -> Result<String, serde_json::Error> {
    let mut settings_value = serde_json::to_value(settings)?;
    if let Value::Object(map) = &mut settings_value {
        map.remove("authority");
    }
    let combined = format!(
        "{}:{}:{}",
        canonical_json(surface)?,
        canonical_json(&settings_value)?,
        engine_version
    );
    Ok(sha256_hex(combined.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::print::PrintAuthority;
    use serde_json::json;

    #[test]
    fn test_canonical_json_sorted() {
        let obj = json!({"z": 1, "a": 2, "m": {"y": 1, "b": [{"d": 1, "c": 2}]}});
        let canonical = canonical_json(&obj).unwrap();
        assert_eq!(canonical, r#"{"a":2,"m":{"b":[{"c":2,"d":1}],"y":1},"z":1}"#);
    }

    #[test]
    fn test_sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_job_hash_ignores_authority_but_not_dpi() {
        let mut surface = VectorSurface::new(20.0, 10.0);
        surface.push_bar(1.0, 0.0, 1.0, 10.0);

        let system = PrintSettings::default();
        let user = PrintSettings { authority: PrintAuthority::User, ..system.clone() };
        let finer = PrintSettings { dpi: 600, ..system.clone() };

        let h1 = compute_job_hash(&surface, &system, "1.0.0").unwrap();
        let h2 = compute_job_hash(&surface, &user, "1.0.0").unwrap();
        let h3 = compute_job_hash(&surface, &finer, "1.0.0").unwrap();
        assert_eq!(h1, h2);
        assert_ne!(h1, h3);
    }
}
