//! The `scan` command: compute and cache checksums.
//!
//! Resolves every file beneath the given paths through the file cache,
//! so later `report` runs (and re-scans of unchanged trees) skip the
//! expensive hashing. A file that cannot be read is skipped with a
//! warning; only store failures abort the run. Progress is committed
//! on a wall-clock interval so an interrupted scan keeps everything
//! but its uncommitted tail.

use anyhow::Result;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use crate::error::ExitCode;
use crate::scanner::{self, cache, CacheError};
use crate::store::{FileRecord, Store};

/// Wall-clock interval between mid-scan commits.
pub const COMMIT_INTERVAL: Duration = Duration::from_secs(10);

/// Resolve every file beneath `paths` through the cache.
///
/// Returns the records of the files that were resolved successfully;
/// unreadable files are logged, skipped and excluded from the result.
pub fn scan_paths(store: &Store, paths: &[PathBuf]) -> Result<Vec<FileRecord>> {
    let files = scanner::find_files(paths, None);
    log::info!("Scanning {} files", files.len());

    let mut records = Vec::with_capacity(files.len());
    let mut skipped = 0usize;
    let mut last_commit = Instant::now();

    store.begin_batch()?;
    for path in &files {
        match cache::resolve(store, path) {
            Ok(record) => {
                log::debug!(
                    "{}: size={:?} crc={:?}",
                    record.path,
                    record.size,
                    record.crc
                );
                records.push(record);
            }
            Err(CacheError::Store(e)) => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                skipped += 1;
            }
        }

        if last_commit.elapsed() >= COMMIT_INTERVAL {
            log::debug!("Committing scan progress");
            store.commit_batch()?;
            store.begin_batch()?;
            last_commit = Instant::now();
        }
    }
    store.commit_batch()?;

    if skipped > 0 {
        log::warn!("Skipped {skipped} unreadable files");
    }
    Ok(records)
}

/// Run the scan command.
pub fn run(store: &Store, paths: &[PathBuf]) -> Result<ExitCode> {
    let records = scan_paths(store, paths)?;
    log::info!("Scanned {} files", records.len());
    Ok(ExitCode::Success)
}
