//! One-way hashing of access codes.
//!
//! Codes are hashed with SHA-256 over their UTF-8 bytes and encoded as
//! lowercase hex, which is exactly what the viewer computes with
//! `crypto.subtle.digest('SHA-256', ...)` before comparing. Plaintext codes
//! are consumed here and never serialized.

use crate::config::GalleryConfig;
use sha2::{Digest, Sha256};

/// Lowercase hex SHA-256 of `code`.
pub fn hash_code(code: &str) -> String {
    format!("{:x}", Sha256::digest(code.as_bytes()))
}

/// Lock state of an album as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlbumLock {
    pub locked: bool,
    pub unlock_hash: Option<String>,
}

/// An unlock code always locks the album, whatever `locked` says.
pub fn seal_album(locked: bool, unlock_code: Option<&str>) -> AlbumLock {
    let unlock_hash = unlock_code.filter(|c| !c.is_empty()).map(hash_code);
    AlbumLock {
        locked: locked || unlock_hash.is_some(),
        unlock_hash,
    }
}

/// Replace the master code with its hash. A `masterHash` already present in
/// the config file is kept when there is no code to hash.
pub fn seal_config(config: &mut GalleryConfig) {
    if let Some(code) = config.master_code.take().filter(|c| !c.is_empty()) {
        config.master_hash = Some(hash_code(&code));
    }
}
