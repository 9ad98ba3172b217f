//! Content fingerprinting
//!
//! Annotation sessions on the same recording are grouped by a SHA-256 digest
//! of the original file bytes. The digest is an opaque key: nothing downstream
//! inspects it beyond equality.

use crate::Result;
use sha2::{Digest, Sha256};
use std::path::Path;

/// Calculate the SHA-256 fingerprint of a byte slice as lowercase hex.
pub fn fingerprint_bytes(bytes: &[u8]) -> String {
    let hash = Sha256::digest(bytes);
    format!("{:x}", hash)
}

/// Calculate the SHA-256 fingerprint of a file's contents.
pub fn fingerprint_file(path: &Path) -> Result<String> {
    let contents = std::fs::read(path)?;
    Ok(fingerprint_bytes(&contents))
}
