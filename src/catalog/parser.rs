//! DAT document parser.
//!
//! DAT files are XML: an optional `header` element with descriptive
//! metadata, then `game` and/or `machine` elements (both vocabularies
//! mean the same thing and are concatenated), each with a `description`
//! child and zero or more `rom` elements carrying `name`, `size`,
//! `crc`, `md5` and `sha1` attributes.
//!
//! The import walk encounters plenty of files that merely end in
//! `.dat` without being DAT documents, so failure to parse is not an
//! error here: [`parse_catalog`] returns `Ok(None)` and the caller
//! moves on. Only I/O failures propagate.

use serde::Deserialize;
use std::io;
use std::path::Path;

use super::{ParsedCatalog, ParsedEntry, ParsedReference, INVALID_SIZE};

/// Raw `<datafile>` document as deserialized by quick-xml.
///
/// Unknown elements are ignored, which keeps the parser tolerant of the
/// various DAT dialects in circulation.
#[derive(Debug, Deserialize)]
struct DatafileDoc {
    header: Option<HeaderDoc>,
    #[serde(default, rename = "game")]
    games: Vec<EntryDoc>,
    #[serde(default, rename = "machine")]
    machines: Vec<EntryDoc>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HeaderDoc {
    name: Option<String>,
    listname: Option<String>,
    description: Option<String>,
    version: Option<String>,
    date: Option<String>,
    author: Option<String>,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EntryDoc {
    #[serde(rename = "@name")]
    name: String,
    // Required: an entry without a description makes the whole document
    // unparseable rather than producing a half-formed entry.
    description: String,
    #[serde(default, rename = "rom")]
    roms: Vec<RomDoc>,
}

#[derive(Debug, Deserialize)]
struct RomDoc {
    #[serde(rename = "@name")]
    name: String,
    #[serde(rename = "@size")]
    size: Option<String>,
    #[serde(rename = "@crc")]
    crc: Option<String>,
    #[serde(rename = "@md5")]
    md5: Option<String>,
    #[serde(rename = "@sha1")]
    sha1: Option<String>,
}

/// Parse the DAT document at `path`.
///
/// Returns `Ok(None)` when the file is not a parseable DAT document
/// (logged at warn level). I/O errors reading the file propagate.
pub fn parse_catalog(path: &Path) -> io::Result<Option<ParsedCatalog>> {
    let text = std::fs::read_to_string(path)?;
    let doc: DatafileDoc = match quick_xml::de::from_str(&text) {
        Ok(doc) => doc,
        Err(e) => {
            // Probably not an XML file.
            log::warn!("Skipping unparseable file {}: {e}", path.display());
            return Ok(None);
        }
    };

    let header = doc.header.unwrap_or_default();
    let name = non_empty(header.name)
        .or_else(|| non_empty(header.listname))
        .unwrap_or_else(|| file_stem(path));

    let mut entries: Vec<ParsedEntry> = Vec::with_capacity(doc.games.len() + doc.machines.len());
    entries.extend(doc.games.into_iter().map(convert_entry));
    entries.extend(doc.machines.into_iter().map(convert_entry));

    Ok(Some(ParsedCatalog {
        name,
        description: non_empty(header.description),
        version: non_empty(header.version),
        date: non_empty(header.date),
        author: non_empty(header.author),
        url: non_empty(header.url),
        entries,
    }))
}

fn convert_entry(entry: EntryDoc) -> ParsedEntry {
    ParsedEntry {
        name: entry.name,
        description: non_empty(Some(entry.description)),
        references: entry.roms.into_iter().map(convert_reference).collect(),
    }
}

fn convert_reference(rom: RomDoc) -> ParsedReference {
    ParsedReference {
        name: rom.name,
        size: parse_size(rom.size.as_deref()),
        crc: normalize_hex(rom.crc),
        md5: normalize_hex(rom.md5),
        sha1: normalize_hex(rom.sha1),
    }
}

/// Parse a size attribute, degrading to [`INVALID_SIZE`] on anything
/// missing or non-numeric so one malformed rom does not abort the
/// whole catalog.
fn parse_size(size: Option<&str>) -> i64 {
    size.and_then(|s| s.trim().parse::<i64>().ok())
        .unwrap_or(INVALID_SIZE)
}

/// DATs carry hex in both cases; computed digests are lowercase.
fn normalize_hex(value: Option<String>) -> Option<String> {
    non_empty(value).map(|s| s.to_ascii_lowercase())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

/// Document filename without its extension, the last-resort name.
fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string_lossy().into_owned())
}
