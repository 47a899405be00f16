// Hash computation utilities

use crate::cache::{Cache, namespace};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256, Sha512};
use std::fs::File;
use std::io;
use std::path::Path;
use std::time::UNIX_EPOCH;

/// Hash algorithm types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HashAlgorithm {
    Sha256,
    Sha512,
}

impl HashAlgorithm {
    pub fn prefix(&self) -> &'static str {
        match self {
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Sha512 => "sha512",
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct CachedHash {
    hash: String,
    size: u64,
    mtime: i64,
}

/// Compute the lowercase hex digest of a file.
///
/// Results are memoized in the `filehash` namespace keyed by path, size and
/// modification time; a memoized hash is only trusted while the file's
/// current size and mtime still match. A missing file surfaces as
/// `io::ErrorKind::NotFound`.
pub fn file_digest(cache: &Cache, path: &Path, algorithm: HashAlgorithm) -> io::Result<String> {
    let metadata = std::fs::metadata(path)?;
    let size = metadata.len();
    let mtime = metadata
        .modified()?
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as i64)
        .unwrap_or(0);

    let key = format!(
        "{}:{}:{}:{}",
        algorithm.prefix(),
        path.display(),
        size,
        mtime
    );

    if let Some(cached) = cache.get::<CachedHash>(namespace::FILEHASH, &key) {
        if cached.size == size && cached.mtime == mtime {
            return Ok(cached.hash);
        }
    }

    let hash = stream_digest(File::open(path)?, algorithm)?;

    cache.set_permanent(
        namespace::FILEHASH,
        &key,
        &CachedHash {
            hash: hash.clone(),
            size,
            mtime,
        },
    );

    Ok(hash)
}

/// Digest a reader without buffering it whole.
pub fn stream_digest<R: io::Read>(mut reader: R, algorithm: HashAlgorithm) -> io::Result<String> {
    let hash_hex = match algorithm {
        HashAlgorithm::Sha256 => {
            let mut hasher = Sha256::new();
            io::copy(&mut reader, &mut hasher)?;
            hex::encode(hasher.finalize())
        }
        HashAlgorithm::Sha512 => {
            let mut hasher = Sha512::new();
            io::copy(&mut reader, &mut hasher)?;
            hex::encode(hasher.finalize())
        }
    };
    Ok(hash_hex)
}

/// Compute hash of in-memory data.
pub fn compute_hash(data: &[u8], algorithm: HashAlgorithm) -> String {
    match algorithm {
        HashAlgorithm::Sha256 => hex::encode(Sha256::digest(data)),
        HashAlgorithm::Sha512 => hex::encode(Sha512::digest(data)),
    }
}
