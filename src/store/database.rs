//! SQLite-backed store implementation.
//!
//! One `Store` is opened per command invocation and passed explicitly
//! to every component that needs it; there is no shared global session.
//! Writes are grouped into batches by the callers ([`Store::begin_batch`]
//! / [`Store::commit_batch`]) so a crash loses only the uncommitted
//! tail of a run, while [`Store::insert_catalog_graph`] guarantees a
//! catalog subtree is never committed partially.

use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::Path;

use crate::catalog::ParsedCatalog;

use super::{CatalogRecord, EntryRecord, FileRecord, MatchRow, RefRecord};

/// Errors raised by the persistent store. All of them are fatal to the
/// running command.
#[derive(thiserror::Error, Debug)]
pub enum StoreError {
    /// An underlying SQLite failure.
    #[error("store error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}

type Result<T> = std::result::Result<T, StoreError>;

/// SQLite maximum host-parameter count is comfortably above this;
/// bulk `IN (...)` queries are chunked to stay well clear of it.
const IN_CHUNK: usize = 500;

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS files (
    id    INTEGER PRIMARY KEY,
    path  TEXT NOT NULL UNIQUE,
    size  INTEGER,
    mtime INTEGER,
    crc   TEXT,
    md5   TEXT,
    sha1  TEXT
);
CREATE TABLE IF NOT EXISTS catalogs (
    id          INTEGER PRIMARY KEY,
    file_id     INTEGER NOT NULL UNIQUE REFERENCES files(id),
    name        TEXT NOT NULL,
    description TEXT,
    version     TEXT,
    date        TEXT,
    author      TEXT,
    url         TEXT
);
CREATE TABLE IF NOT EXISTS entries (
    id          INTEGER PRIMARY KEY,
    catalog_id  INTEGER NOT NULL REFERENCES catalogs(id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    description TEXT
);
CREATE TABLE IF NOT EXISTS refs (
    id       INTEGER PRIMARY KEY,
    entry_id INTEGER NOT NULL REFERENCES entries(id) ON DELETE CASCADE,
    name     TEXT NOT NULL,
    size     INTEGER NOT NULL,
    crc      TEXT,
    md5      TEXT,
    sha1     TEXT
);
CREATE INDEX IF NOT EXISTS idx_entries_catalog_id ON entries(catalog_id);
CREATE INDEX IF NOT EXISTS idx_refs_entry_id ON refs(entry_id);
CREATE INDEX IF NOT EXISTS idx_refs_match ON refs(size, crc, md5, sha1);
CREATE INDEX IF NOT EXISTS idx_files_match ON files(size, crc, md5, sha1);
";

/// The reference/file match join.
///
/// Strict simultaneous equality across size and all three checksum
/// columns. A NULL checksum is "not constraining" only when NULL on
/// both sides, and a reference with no checksums at all has no key to
/// join on and is excluded outright.
const MATCH_SQL: &str = "
SELECT refs.id, entries.catalog_id, files.path
FROM refs
JOIN entries ON entries.id = refs.entry_id
JOIN files ON files.size = refs.size
    AND (files.crc  = refs.crc  OR (files.crc  IS NULL AND refs.crc  IS NULL))
    AND (files.md5  = refs.md5  OR (files.md5  IS NULL AND refs.md5  IS NULL))
    AND (files.sha1 = refs.sha1 OR (files.sha1 IS NULL AND refs.sha1 IS NULL))
WHERE refs.crc IS NOT NULL OR refs.md5 IS NOT NULL OR refs.sha1 IS NOT NULL
";

/// Handle to the persistent store.
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the store at `path`.
    pub fn open(path: &Path) -> Result<Self> {
        Self::init(Connection::open(path)?)
    }

    /// Open a fresh in-memory store. Used by tests; the data vanishes
    /// when the handle drops.
    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    // ---- batching --------------------------------------------------

    /// Start an enclosing write batch. Must be paired with
    /// [`Store::commit_batch`]; batches do not nest.
    pub fn begin_batch(&self) -> Result<()> {
        self.conn.execute_batch("BEGIN IMMEDIATE")?;
        Ok(())
    }

    /// Commit the current write batch.
    pub fn commit_batch(&self) -> Result<()> {
        self.conn.execute_batch("COMMIT")?;
        Ok(())
    }

    // ---- files -----------------------------------------------------

    /// Look up a file row by absolute path.
    pub fn file_by_path(&self, path: &str) -> Result<Option<FileRecord>> {
        Ok(self
            .conn
            .prepare_cached("SELECT id, path, size, mtime, crc, md5, sha1 FROM files WHERE path = ?1")?
            .query_row(params![path], file_from_row)
            .optional()?)
    }

    /// Bulk lookup of file rows whose path is in `paths`.
    pub fn files_by_paths(&self, paths: &[String]) -> Result<Vec<FileRecord>> {
        let mut records = Vec::new();
        for chunk in paths.chunks(IN_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT id, path, size, mtime, crc, md5, sha1 FROM files WHERE path IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), file_from_row)?;
            for row in rows {
                records.push(row?);
            }
        }
        Ok(records)
    }

    /// Create a blank file row for `path`.
    pub fn insert_file(&self, path: &str) -> Result<FileRecord> {
        self.conn
            .prepare_cached("INSERT INTO files (path) VALUES (?1)")?
            .execute(params![path])?;
        Ok(FileRecord {
            id: self.conn.last_insert_rowid(),
            path: path.to_string(),
            size: None,
            mtime: None,
            crc: None,
            md5: None,
            sha1: None,
        })
    }

    /// Write back a mutated file row.
    pub fn update_file(&self, record: &FileRecord) -> Result<()> {
        self.conn
            .prepare_cached(
                "UPDATE files SET size = ?1, mtime = ?2, crc = ?3, md5 = ?4, sha1 = ?5 WHERE id = ?6",
            )?
            .execute(params![
                record.size,
                record.mtime,
                record.crc,
                record.md5,
                record.sha1,
                record.id
            ])?;
        Ok(())
    }

    // ---- catalogs --------------------------------------------------

    /// Look up the catalog imported from the given source file, if any.
    pub fn catalog_by_file_id(&self, file_id: i64) -> Result<Option<CatalogRecord>> {
        Ok(self
            .conn
            .prepare_cached(
                "SELECT id, file_id, name, description, version, date, author, url
                 FROM catalogs WHERE file_id = ?1",
            )?
            .query_row(params![file_id], catalog_from_row)
            .optional()?)
    }

    /// Bulk lookup of catalogs by source file id.
    pub fn catalogs_by_file_ids(&self, file_ids: &[i64]) -> Result<Vec<CatalogRecord>> {
        let mut records = Vec::new();
        for chunk in file_ids.chunks(IN_CHUNK) {
            let placeholders = vec!["?"; chunk.len()].join(",");
            let sql = format!(
                "SELECT id, file_id, name, description, version, date, author, url
                 FROM catalogs WHERE file_id IN ({placeholders})"
            );
            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), catalog_from_row)?;
            for row in rows {
                records.push(row?);
            }
        }
        Ok(records)
    }

    /// Look up a catalog by id.
    pub fn catalog_by_id(&self, id: i64) -> Result<Option<CatalogRecord>> {
        Ok(self
            .conn
            .prepare_cached(
                "SELECT id, file_id, name, description, version, date, author, url
                 FROM catalogs WHERE id = ?1",
            )?
            .query_row(params![id], catalog_from_row)
            .optional()?)
    }

    /// Number of imported catalogs.
    pub fn catalog_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .prepare_cached("SELECT COUNT(*) FROM catalogs")?
            .query_row([], |row| row.get(0))?)
    }

    /// Entries of a catalog, in insertion order.
    pub fn entries_for_catalog(&self, catalog_id: i64) -> Result<Vec<EntryRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, catalog_id, name, description FROM entries
             WHERE catalog_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![catalog_id], |row| {
            Ok(EntryRecord {
                id: row.get(0)?,
                catalog_id: row.get(1)?,
                name: row.get(2)?,
                description: row.get(3)?,
            })
        })?;
        rows.map(|r| Ok(r?)).collect()
    }

    /// References of an entry, in insertion order.
    pub fn refs_for_entry(&self, entry_id: i64) -> Result<Vec<RefRecord>> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT id, entry_id, name, size, crc, md5, sha1 FROM refs
             WHERE entry_id = ?1 ORDER BY id",
        )?;
        let rows = stmt.query_map(params![entry_id], |row| {
            Ok(RefRecord {
                id: row.get(0)?,
                entry_id: row.get(1)?,
                name: row.get(2)?,
                size: row.get(3)?,
                crc: row.get(4)?,
                md5: row.get(5)?,
                sha1: row.get(6)?,
            })
        })?;
        rows.map(|r| Ok(r?)).collect()
    }

    /// Insert a parsed catalog with all its entries and references as
    /// one graph. Runs under a savepoint, so an enclosing batch never
    /// sees a partial subtree; entry and ref rows always land together
    /// with their parent catalog.
    ///
    /// Returns the new catalog id.
    pub fn insert_catalog_graph(&self, file_id: i64, parsed: &ParsedCatalog) -> Result<i64> {
        self.conn.execute_batch("SAVEPOINT catalog_graph")?;
        match self.insert_graph_rows(file_id, parsed) {
            Ok(catalog_id) => {
                self.conn.execute_batch("RELEASE catalog_graph")?;
                Ok(catalog_id)
            }
            Err(e) => {
                let _ = self
                    .conn
                    .execute_batch("ROLLBACK TO catalog_graph; RELEASE catalog_graph");
                Err(e)
            }
        }
    }

    fn insert_graph_rows(&self, file_id: i64, parsed: &ParsedCatalog) -> Result<i64> {
        self.conn
            .prepare_cached(
                "INSERT INTO catalogs (file_id, name, description, version, date, author, url)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            )?
            .execute(params![
                file_id,
                parsed.name,
                parsed.description,
                parsed.version,
                parsed.date,
                parsed.author,
                parsed.url
            ])?;
        let catalog_id = self.conn.last_insert_rowid();

        let mut insert_entry = self
            .conn
            .prepare_cached("INSERT INTO entries (catalog_id, name, description) VALUES (?1, ?2, ?3)")?;
        let mut insert_ref = self.conn.prepare_cached(
            "INSERT INTO refs (entry_id, name, size, crc, md5, sha1)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;

        for entry in &parsed.entries {
            insert_entry.execute(params![catalog_id, entry.name, entry.description])?;
            let entry_id = self.conn.last_insert_rowid();
            for reference in &entry.references {
                insert_ref.execute(params![
                    entry_id,
                    reference.name,
                    reference.size,
                    reference.crc,
                    reference.md5,
                    reference.sha1
                ])?;
            }
        }
        Ok(catalog_id)
    }

    /// Delete a catalog and its whole entry/ref subtree.
    ///
    /// The subtree delete is explicit and transactional (savepoint);
    /// the schema's `ON DELETE CASCADE` would catch stragglers anyway,
    /// but the invariant belongs to the store layer.
    pub fn delete_catalog(&self, catalog_id: i64) -> Result<()> {
        self.conn.execute_batch("SAVEPOINT catalog_delete")?;
        let result: Result<()> = (|| {
            self.conn
                .prepare_cached(
                    "DELETE FROM refs WHERE entry_id IN
                     (SELECT id FROM entries WHERE catalog_id = ?1)",
                )?
                .execute(params![catalog_id])?;
            self.conn
                .prepare_cached("DELETE FROM entries WHERE catalog_id = ?1")?
                .execute(params![catalog_id])?;
            self.conn
                .prepare_cached("DELETE FROM catalogs WHERE id = ?1")?
                .execute(params![catalog_id])?;
            Ok(())
        })();
        match result {
            Ok(()) => {
                self.conn.execute_batch("RELEASE catalog_delete")?;
                Ok(())
            }
            Err(e) => {
                let _ = self
                    .conn
                    .execute_batch("ROLLBACK TO catalog_delete; RELEASE catalog_delete");
                Err(e)
            }
        }
    }

    // ---- matching --------------------------------------------------

    /// Run the reference/file match join across the whole store.
    ///
    /// The result may include files cached by earlier runs; the caller
    /// intersects paths against the current scan set.
    pub fn match_refs(&self) -> Result<Vec<MatchRow>> {
        let mut stmt = self.conn.prepare(MATCH_SQL)?;
        let rows = stmt.query_map([], |row| {
            Ok(MatchRow {
                ref_id: row.get(0)?,
                catalog_id: row.get(1)?,
                path: row.get(2)?,
            })
        })?;
        rows.map(|r| Ok(r?)).collect()
    }
}

fn file_from_row(row: &Row<'_>) -> rusqlite::Result<FileRecord> {
    Ok(FileRecord {
        id: row.get(0)?,
        path: row.get(1)?,
        size: row.get(2)?,
        mtime: row.get(3)?,
        crc: row.get(4)?,
        md5: row.get(5)?,
        sha1: row.get(6)?,
    })
}

fn catalog_from_row(row: &Row<'_>) -> rusqlite::Result<CatalogRecord> {
    Ok(CatalogRecord {
        id: row.get(0)?,
        file_id: row.get(1)?,
        name: row.get(2)?,
        description: row.get(3)?,
        version: row.get(4)?,
        date: row.get(5)?,
        author: row.get(6)?,
        url: row.get(7)?,
    })
}
