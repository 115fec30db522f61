//! Parsed catalog model.
//!
//! A catalog is one imported DAT document: a named list of entries
//! ("games"/"machines"), each holding references ("roms") with the
//! checksums an artifact is expected to have. These types are the
//! parser's output; the store persists them as a catalog → entry → ref
//! graph (see [`crate::store`]).

pub mod parser;

pub use parser::parse_catalog;

/// Sentinel for a missing or non-numeric reference size.
///
/// A malformed size degrades to this value instead of aborting the
/// catalog, and is never silently coerced to zero (zero is a legal size).
pub const INVALID_SIZE: i64 = -1;

/// One parsed DAT document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedCatalog {
    /// Resolved name: header `name`, else `listname`, else the file stem.
    pub name: String,
    pub description: Option<String>,
    pub version: Option<String>,
    pub date: Option<String>,
    pub author: Option<String>,
    pub url: Option<String>,
    pub entries: Vec<ParsedEntry>,
}

impl ParsedCatalog {
    /// Total number of references across all entries.
    #[must_use]
    pub fn reference_count(&self) -> usize {
        self.entries.iter().map(|e| e.references.len()).sum()
    }
}

/// A named unit within a catalog (a "game" or "machine").
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEntry {
    pub name: String,
    pub description: Option<String>,
    pub references: Vec<ParsedReference>,
}

/// An expected artifact within an entry (a "rom").
///
/// Each checksum field is optional; catalogs may omit any of them.
/// Hex values are normalized to lowercase and empty attributes to
/// `None` so that matching against computed digests is exact.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedReference {
    pub name: String,
    /// Expected size in bytes, or [`INVALID_SIZE`].
    pub size: i64,
    pub crc: Option<String>,
    pub md5: Option<String>,
    pub sha1: Option<String>,
}
