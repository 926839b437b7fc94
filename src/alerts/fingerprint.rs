//! Deterministic alert fingerprints
//!
//! A fingerprint identifies a class of alert for correlation: the firing
//! `service_down` alert and the recovery event that closes it share one
//! fingerprint. Inputs are canonicalized (sorted keys) before hashing so
//! field order never changes the digest.

use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::model::AlertType;

/// Hex width of an emitted fingerprint (128 bits of SHA-256)
const FINGERPRINT_WIDTH: usize = 32;

/// Compute the stable fingerprint for (service, alert type, correlation
/// fields). Independent of wall-clock time.
pub fn fingerprint(
    service: &str,
    alert_type: AlertType,
    fields: &BTreeMap<String, String>,
) -> String {
    let mut hasher = Sha256::new();
    hasher.update(service.as_bytes());
    hasher.update([0u8]);
    hasher.update(alert_type.as_str().as_bytes());

    // BTreeMap iteration is key-sorted, which is the canonical order
    for (key, value) in fields {
        hasher.update([0u8]);
        hasher.update(key.as_bytes());
        hasher.update([b'=']);
        hasher.update(value.as_bytes());
    }

    let digest = hasher.finalize();
    let mut out = String::with_capacity(FINGERPRINT_WIDTH);
    for byte in digest.iter().take(FINGERPRINT_WIDTH / 2) {
        out.push_str(&format!("{:02x}", byte));
    }
    out
}

/// Fingerprint used both to file a down alert and to locate it again when
/// the service recovers. Always computed from the `service_down` type, so
/// recovery events resolve to the same key.
pub fn service_down_fingerprint(service: &str) -> String {
    fingerprint(service, AlertType::ServiceDown, &BTreeMap::new())
}
