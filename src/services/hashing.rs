//! Content digests used for change detection.
//!
//! MD5 is plenty here: digests only decide whether a file needs copying, they
//! are not an integrity check.

use crate::services::SyncError;
use camino::Utf8Path;
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{self, Read};

const HASH_BUFFER_SIZE: usize = 64 * 1024;

/// Computes the MD5 of everything remaining in `reader` as lowercase hex.
///
/// The reader is consumed to the end exactly once.
pub fn hash_reader<R: Read + ?Sized>(reader: &mut R) -> io::Result<String> {
    let mut hasher = Md5::new();
    let mut buf = vec![0u8; HASH_BUFFER_SIZE];
    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };
        hasher.update(&buf[..n]);
    }
    Ok(hex::encode(hasher.finalize()))
}

/// Computes the MD5 of an in-memory buffer as lowercase hex.
pub fn hash_bytes(data: &[u8]) -> String {
    hex::encode(Md5::digest(data))
}

/// Computes the MD5 of a file on disk as lowercase hex.
pub fn hash_file(path: &Utf8Path) -> Result<String, SyncError> {
    let mut file = File::open(path).map_err(|e| SyncError::io(path, e))?;
    hash_reader(&mut file).map_err(|e| SyncError::io(path, e))
}
