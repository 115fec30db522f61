//! The `import` command: discover and ingest DAT catalogs.
//!
//! For every `.dat` file beneath the given paths:
//!
//! * already imported and unchanged on disk - skip
//! * already imported but source file dirty - delete the old catalog
//!   subtree and re-import
//! * never seen - import fresh
//!
//! A catalog that fails to parse is skipped with a warning; the walk
//! routinely encounters unrelated files with a `.dat` extension.
//! Pending rows are flushed to the store whenever the running count
//! crosses [`FLUSH_THRESHOLD`], keeping transactions bounded during
//! bulk imports of large DAT collections.

use anyhow::Result;
use std::collections::HashMap;
use std::path::PathBuf;

use crate::catalog::parse_catalog;
use crate::scanner::{self, cache, CacheError};
use crate::store::{CatalogRecord, FileRecord, Store};

/// Pending rows (catalogs + entries + refs) that trigger a mid-run
/// commit. MAME-sized DATs bring hundreds of thousands of rows.
pub const FLUSH_THRESHOLD: usize = 10_000;

/// File extension of catalog documents.
const DAT_EXTENSION: &str = "dat";

/// Import all catalogs found beneath `paths`.
///
/// Returns the number of catalogs imported (fresh plus re-imported).
pub fn run(store: &Store, paths: &[PathBuf]) -> Result<usize> {
    let dat_paths = scanner::find_files(paths, Some(DAT_EXTENSION));
    log::info!("Found {} DAT files", dat_paths.len());

    // Bulk prefetch: one in-set query for the file rows, one for their
    // catalogs, instead of two point lookups per document.
    let keys: Vec<String> = dat_paths
        .iter()
        .map(|p| p.to_string_lossy().into_owned())
        .collect();
    let files_by_path: HashMap<String, FileRecord> = store
        .files_by_paths(&keys)?
        .into_iter()
        .map(|f| (f.path.clone(), f))
        .collect();
    let file_ids: Vec<i64> = files_by_path.values().map(|f| f.id).collect();
    let catalogs_by_file: HashMap<i64, CatalogRecord> = store
        .catalogs_by_file_ids(&file_ids)?
        .into_iter()
        .map(|c| (c.file_id, c))
        .collect();

    let mut imported = 0;
    let mut pending_rows = 0;
    store.begin_batch()?;

    for (path, key) in dat_paths.iter().zip(&keys) {
        let existing_file = files_by_path.get(key);
        let existing_catalog = existing_file.and_then(|f| catalogs_by_file.get(&f.id));

        if let (Some(file), Some(catalog)) = (existing_file, existing_catalog) {
            match cache::is_stale(file, path) {
                Ok(false) => {
                    log::debug!("Already imported: {} -> {}", path.display(), catalog.name);
                    continue;
                }
                Ok(true) => {
                    log::info!("Reimporting {}...", path.display());
                    store.delete_catalog(catalog.id)?;
                    pending_rows += 1;
                }
                Err(CacheError::Store(e)) => return Err(e.into()),
                Err(e) => {
                    log::warn!("Skipping {}: {e}", path.display());
                    continue;
                }
            }
        } else {
            log::debug!("Importing {}...", path.display());
        }

        let parsed = match parse_catalog(path) {
            Ok(Some(parsed)) => parsed,
            // Not a DAT document; the parser already warned.
            Ok(None) => continue,
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };

        // Checksum the document itself so the next run can dirty-check it.
        let file = match cache::resolve(store, path) {
            Ok(file) => file,
            Err(CacheError::Store(e)) => return Err(e.into()),
            Err(e) => {
                log::warn!("Skipping {}: {e}", path.display());
                continue;
            }
        };

        store.insert_catalog_graph(file.id, &parsed)?;
        imported += 1;
        pending_rows += 1 + parsed.entries.len() + parsed.reference_count();
        log::info!(
            "--> {}: {} entries / {} refs",
            parsed.name,
            parsed.entries.len(),
            parsed.reference_count()
        );

        if pending_rows >= FLUSH_THRESHOLD {
            // Keep the enclosing transaction from growing unbounded.
            store.commit_batch()?;
            store.begin_batch()?;
            pending_rows = 0;
        }
    }

    store.commit_batch()?;
    log::info!("Import complete.");
    Ok(imported)
}
