//! Sequential file discovery.
//!
//! The engine processes files one at a time, so a plain `walkdir`
//! traversal is all that is needed. Paths given directly as files are
//! taken as-is (still honoring the extension filter); directories are
//! walked recursively.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

/// Find all files at or beneath the given paths.
///
/// `extension` constrains matches to the given file extension,
/// compared case-insensitively (DATs arrive as both `.dat` and `.DAT`).
/// Results are canonicalized, deduplicated and sorted. Unreadable
/// entries are logged and skipped; discovery never aborts the run.
#[must_use]
pub fn find_files(paths: &[PathBuf], extension: Option<&str>) -> Vec<PathBuf> {
    let mut found = BTreeSet::new();
    for root in paths {
        if root.is_file() {
            if matches_extension(root, extension) {
                push_canonical(&mut found, root);
            }
            continue;
        }
        for entry in WalkDir::new(root) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {e}", root.display());
                    continue;
                }
            };
            if entry.file_type().is_file() && matches_extension(entry.path(), extension) {
                push_canonical(&mut found, entry.path());
            }
        }
    }
    found.into_iter().collect()
}

fn matches_extension(path: &Path, extension: Option<&str>) -> bool {
    match extension {
        None => true,
        Some(ext) => path
            .extension()
            .is_some_and(|e| e.to_string_lossy().eq_ignore_ascii_case(ext)),
    }
}

fn push_canonical(found: &mut BTreeSet<PathBuf>, path: &Path) {
    match path.canonicalize() {
        Ok(absolute) => {
            found.insert(absolute);
        }
        Err(e) => log::warn!("Skipping {}: {e}", path.display()),
    }
}
