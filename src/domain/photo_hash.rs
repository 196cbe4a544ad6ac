use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

use sha2::{Digest, Sha384};

pub const SHORT_HASH_LEN: usize = 8;

/// Streams the file through SHA-384 and returns the lowercase hex digest.
pub fn hash_file(path: &Path) -> io::Result<String> {
    let mut file = File::open(path)?;
    let mut hasher = Sha384::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let read = file.read(&mut buf)?;
        if read == 0 {
            break;
        }
        hasher.update(&buf[..read]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

#[cfg(test)]
pub fn hash_bytes(bytes: &[u8]) -> String {
    let mut hasher = Sha384::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

pub fn short_hash(full_hash: &str) -> &str {
    match full_hash.char_indices().nth(SHORT_HASH_LEN) {
        Some((idx, _)) => &full_hash[..idx],
        None => full_hash,
    }
}
