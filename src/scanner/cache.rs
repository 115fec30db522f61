//! Incremental file cache with dirty-checking.
//!
//! [`resolve`] maps a path to its stored [`FileRecord`], re-hashing
//! only when the record is dirty: size or mtime unrecorded, recorded
//! size differing from disk, or the on-disk mtime having moved forward
//! past the recorded one. The forward-only mtime comparison avoids
//! spurious rehashes from clock skew, at the documented cost of missing
//! a file restored to an older mtime with different content.

use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::checksum::{self, ChecksumError};
use crate::store::{FileRecord, Store, StoreError};

/// Errors from resolving a file through the cache.
///
/// Store failures are fatal to the run; the other variants concern a
/// single path and callers usually skip it and continue.
#[derive(thiserror::Error, Debug)]
pub enum CacheError {
    /// The persistent store failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Reading file contents for hashing failed.
    #[error(transparent)]
    Checksum(#[from] ChecksumError),

    /// The file could not be stat'd (vanished, permissions).
    #[error("cannot stat {path}: {source}")]
    Stat {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Resolve `path` to an up-to-date file record.
///
/// Creates a blank record on first sight of a path. When the record is
/// dirty the stored digests are invalidated and recomputed from one
/// read of the file; individually present fields are kept (partial
/// recovery after an interrupted earlier run). A record whose backing
/// path has vanished is never deleted; the stat error propagates and
/// the caller decides whether to skip or abort.
pub fn resolve(store: &Store, path: &Path) -> Result<FileRecord, CacheError> {
    let key = path.to_string_lossy();
    let mut record = match store.file_by_path(&key)? {
        Some(record) => record,
        None => store.insert_file(&key)?,
    };

    let metadata = path.metadata().map_err(|source| CacheError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    let disk_size = metadata.len() as i64;
    let disk_mtime = mtime_seconds(&metadata);

    if is_dirty(&record, disk_size, disk_mtime) {
        record.size = Some(disk_size);
        record.mtime = Some(disk_mtime);
        record.crc = None;
        record.md5 = None;
        record.sha1 = None;
    }

    if !record.has_digests() {
        let sums = checksum::compute(path)?;
        if record.size.is_none() {
            record.size = Some(sums.size as i64);
        }
        if record.crc.is_none() {
            record.crc = Some(sums.crc);
        }
        if record.md5.is_none() {
            record.md5 = Some(sums.md5);
        }
        if record.sha1.is_none() {
            record.sha1 = Some(sums.sha1);
        }
        store.update_file(&record)?;
    }

    Ok(record)
}

/// Whether the stored record disagrees with current disk state.
///
/// Any dirtiness invalidates all three digests and triggers a full
/// rehash; a bare size mismatch is not trusted to keep prior digests.
#[must_use]
pub fn is_dirty(record: &FileRecord, disk_size: i64, disk_mtime: i64) -> bool {
    match (record.size, record.mtime) {
        (Some(size), Some(mtime)) => size != disk_size || disk_mtime > mtime,
        _ => true,
    }
}

/// Check whether the file backing `record` has changed on disk.
pub fn is_stale(record: &FileRecord, path: &Path) -> Result<bool, CacheError> {
    let metadata = path.metadata().map_err(|source| CacheError::Stat {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(is_dirty(record, metadata.len() as i64, mtime_seconds(&metadata)))
}

/// Last-modified time as unix seconds.
fn mtime_seconds(metadata: &Metadata) -> i64 {
    match metadata.modified() {
        Ok(modified) => match modified.duration_since(UNIX_EPOCH) {
            Ok(elapsed) => elapsed.as_secs() as i64,
            Err(before_epoch) => -(before_epoch.duration().as_secs() as i64),
        },
        // Platforms without mtime support always look dirty.
        Err(_) => 0,
    }
}
