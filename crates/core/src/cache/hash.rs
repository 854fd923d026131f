//! Content digests for cached media.

use sha2::{Digest, Sha256};

use crate::Error;

/// SHA-256 of `bytes` as lowercase hex.
pub fn content_hash(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Short, path-safe tag derived from a URL.
///
/// `len` is clamped to the full digest length.
pub fn url_tag(url: &str, len: usize) -> String {
    let mut tag = hex::encode(Sha256::digest(url.as_bytes()));
    tag.truncate(len.min(64));
    tag
}

/// Check that `hash` looks like a SHA-256 hex digest.
pub fn validate_hash(hash: &str) -> Result<(), Error> {
    if hash.len() == 64 && hash.chars().all(|c| c.is_ascii_hexdigit()) {
        Ok(())
    } else {
        Err(Error::InvalidHash)
    }
}
