//! Content digests for snapshot files

use crate::error::Result;
use blake3::Hasher;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// A hash value represented as a hex string
pub type HashValue = String;

/// Hash a byte slice
pub fn digest_bytes(bytes: &[u8]) -> HashValue {
    blake3::hash(bytes).to_hex().to_string()
}

/// Hash a file's contents without loading it all into memory
pub fn digest_file(path: &Path) -> Result<HashValue> {
    let mut file = File::open(path)?;
    let mut hasher = Hasher::new();
    let mut buffer = [0u8; 64 * 1024];

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(hasher.finalize().to_hex().to_string())
}

/// Whether two files have identical contents
pub fn same_contents(a: &Path, b: &Path) -> Result<bool> {
    if std::fs::metadata(a)?.len() != std::fs::metadata(b)?.len() {
        return Ok(false);
    }
    Ok(digest_file(a)? == digest_file(b)?)
}
