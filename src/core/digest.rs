//! Content digests for assembled cartridge buffers

use sha2::{Digest as _, Sha256};

/// SHA-256 of `buffer`, lowercase hex (64 characters)
///
/// This is the identity key for database lookup. Any byte difference,
/// including the presence of a copier header, yields a different digest.
pub fn sha256_hex(buffer: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(buffer);
    hex::encode(hasher.finalize())
}

/// Case-insensitive digest comparison
pub fn same_digest(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}
