//! Content-addressed shape identities.
//!
//! A shape's identity is a pure function of its field signature: the sorted
//! list of `(field name, type label)` pairs. Declaration order and defaults do
//! not participate, so two independently declared shapes with the same
//! signature get the same identity and can be deduplicated or cached freely.
use indexmap::IndexMap;
use sha2::{Digest, Sha256};

use crate::ir::FieldSpec;

/// Hex digits of the SHA-256 digest kept in the identity.
pub const IDENTITY_HEX_LEN: usize = 32;

/// Sorted `(name, label)` pairs.
pub fn signature(fields: &IndexMap<String, FieldSpec>) -> Vec<(String, String)> {
    let mut pairs: Vec<(String, String)> = fields
        .iter()
        .map(|(name, spec)| (name.clone(), spec.ty().label()))
        .collect();
    pairs.sort();
    pairs
}

/// `_` followed by the truncated hex digest, so the identity is also a valid
/// identifier in generated bindings.
pub fn compute(fields: &IndexMap<String, FieldSpec>) -> String {
    let mut hasher = Sha256::new();
    // field names are identifiers, so ':' and '\n' cannot appear inside them
    for (name, label) in signature(fields) {
        hasher.update(name.as_bytes());
        hasher.update(b":");
        hasher.update(label.as_bytes());
        hasher.update(b"\n");
    }
    let digest = format!("{:x}", hasher.finalize());
    format!("_{}", &digest[..IDENTITY_HEX_LEN])
}
