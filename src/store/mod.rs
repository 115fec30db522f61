//! Persistent store for files, catalogs, entries and references.
//!
//! Four related tables back the matching engine:
//!
//! * `files` - scanned on-disk artifacts, keyed by absolute path
//! * `catalogs` - imported DAT documents, each referencing the file row
//!   of its own source document (for dirty-checking re-imports)
//! * `entries` - named units within a catalog
//! * `refs` - expected artifacts within an entry (`references` is a
//!   reserved word in SQL)
//!
//! Deleting a catalog deletes its whole entry/ref subtree. That
//! invariant is enforced by the store layer with an explicit
//! transactional delete, not left to implicit framework behavior,
//! though the schema carries `ON DELETE CASCADE` as a second line of
//! defense.

pub mod database;

pub use database::{Store, StoreError};

/// Metadata for a scanned binary file.
///
/// Created blank on first sight of a path; size/mtime/digests are
/// filled in by the file cache and mutated in place when the file is
/// found dirty. Rows are never deleted automatically, even when the
/// backing path has vanished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileRecord {
    pub id: i64,
    /// Absolute path, unique per row.
    pub path: String,
    pub size: Option<i64>,
    /// Last-modified time, unix seconds.
    pub mtime: Option<i64>,
    /// CRC-32 as 8 lowercase hex digits, zero-padded.
    pub crc: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

impl FileRecord {
    /// Whether all three digests are populated.
    #[must_use]
    pub fn has_digests(&self) -> bool {
        self.crc.is_some() && self.md5.is_some() && self.sha1.is_some()
    }
}

/// One imported DAT document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRecord {
    pub id: i64,
    /// File row of the source document; at most one catalog per file.
    pub file_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
}

/// A named unit within a catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryRecord {
    pub id: i64,
    pub catalog_id: i64,
    pub name: String,
    pub description: Option<String>,
}

/// An expected artifact within an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefRecord {
    pub id: i64,
    pub entry_id: i64,
    pub name: String,
    /// Expected size, or [`crate::catalog::INVALID_SIZE`].
    pub size: i64,
    pub crc: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
}

/// One row of the reference/file match join.
///
/// Matches are derived fresh for each report and never persisted; both
/// the file and reference populations change between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchRow {
    pub ref_id: i64,
    pub catalog_id: i64,
    /// Path of the matching file.
    pub path: String,
}
