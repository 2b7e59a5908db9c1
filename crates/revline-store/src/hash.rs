//! Blake3 helpers for content-addressed snapshots

use std::io;
use std::path::Path;

/// Hash a file's contents (memory-mapped for large files).
pub fn hash_file(path: &Path) -> io::Result<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    hasher.update_mmap(path)?;
    Ok(hasher.finalize())
}

/// Hash the given parts in order, each length-prefixed so that
/// `["ab", "c"]` and `["a", "bc"]` differ.
pub fn hash_parts<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> blake3::Hash {
    let mut hasher = blake3::Hasher::new();
    for part in parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize()
}

/// First 8 hex characters, used for commit IDs.
pub fn short_hash(hash: &blake3::Hash) -> String {
    hash.to_hex()[..8].to_string()
}
