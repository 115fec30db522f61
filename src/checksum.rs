//! Checksum computation for scanned files.
//!
//! DAT catalogs identify artifacts by three digests of differing
//! strength: a 32-bit CRC, MD5, and SHA-1. All three are derived from a
//! single read of the file contents. The whole file is read into memory
//! at once; ROM images are small enough that simplicity wins over
//! streaming.

use md5::{Digest, Md5};
use sha1::Sha1;
use std::fs;
use std::path::{Path, PathBuf};

/// Errors that can occur while computing checksums.
#[derive(thiserror::Error, Debug)]
pub enum ChecksumError {
    /// The file could not be opened or read.
    #[error("I/O error for {path}: {source}")]
    Io {
        /// Path where the error occurred
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },
}

/// Size and digests of one file's contents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checksums {
    /// Content length in bytes
    pub size: u64,
    /// CRC-32, exactly 8 lowercase hex digits, zero-padded
    pub crc: String,
    /// MD5 digest, 32 lowercase hex digits
    pub md5: String,
    /// SHA-1 digest, 40 lowercase hex digits
    pub sha1: String,
}

/// Compute size and all three digests for the file at `path`.
///
/// Whether an I/O failure is fatal or merely skips this one file is the
/// caller's decision.
pub fn compute(path: &Path) -> Result<Checksums, ChecksumError> {
    let bytes = fs::read(path).map_err(|source| ChecksumError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(compute_bytes(&bytes))
}

/// Compute size and digests over an in-memory buffer.
#[must_use]
pub fn compute_bytes(bytes: &[u8]) -> Checksums {
    let mut crc = crc32fast::Hasher::new();
    crc.update(bytes);

    Checksums {
        size: bytes.len() as u64,
        crc: format!("{:08x}", crc.finalize()),
        md5: to_hex(&Md5::digest(bytes)),
        sha1: to_hex(&Sha1::digest(bytes)),
    }
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}
