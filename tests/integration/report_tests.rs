use romcheck::checksum;
use romcheck::commands::report::{self, RefStatus, ReportOptions};
use romcheck::commands::import;
use romcheck::error::ExitCode;
use romcheck::store::Store;
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Build a DAT whose single reference carries the real checksums of
/// `content`, so a scanned file with that content matches exactly.
fn dat_for_content(game: &str, rom: &str, content: &[u8]) -> String {
    let sums = checksum::compute_bytes(content);
    format!(
        r#"<datafile>
  <header><name>{game} Catalog</name></header>
  <game name="{game}">
    <description>{game}</description>
    <rom name="{rom}" size="{}" crc="{}" md5="{}" sha1="{}"/>
  </game>
</datafile>"#,
        sums.size, sums.crc, sums.md5, sums.sha1
    )
}

fn canonical(path: &Path) -> String {
    fs::canonicalize(path).unwrap().to_string_lossy().into_owned()
}

const CONTENT_A: &[u8] = b"0123456789";
const CONTENT_B: &[u8] = b"9876543210";

fn setup(store: &Store) -> (tempfile::TempDir, tempfile::TempDir) {
    let dats = tempdir().unwrap();
    let roms = tempdir().unwrap();
    fs::write(
        dats.path().join("a.dat"),
        dat_for_content("Game A", "a.bin", CONTENT_A),
    )
    .unwrap();
    fs::write(roms.path().join("have.bin"), CONTENT_A).unwrap();
    fs::write(roms.path().join("stray.bin"), CONTENT_B).unwrap();
    import::run(store, &[dats.path().to_path_buf()]).unwrap();
    (dats, roms)
}

#[test]
fn test_end_to_end_have_miss_unmatched() {
    let store = Store::open_in_memory().unwrap();
    let (_dats, roms) = setup(&store);
    let have = roms.path().join("have.bin");

    let report = report::build_report(&store, &[roms.path().to_path_buf()]).unwrap();

    assert_eq!(report.scanned, 2);
    assert_eq!(report.catalogs.len(), 1);

    let summary = &report.catalogs[0];
    assert_eq!(summary.name, "Game A Catalog");
    assert_eq!(summary.have, 1);
    assert_eq!(summary.miss, 0);
    assert!((summary.percent() - 100.0).abs() < f64::EPSILON);
    match &summary.refs[0] {
        (name, RefStatus::Matched(paths)) => {
            assert_eq!(name, "a.bin");
            assert_eq!(paths, &vec![canonical(&have)]);
        }
        other => panic!("expected a match, got {other:?}"),
    }

    // The second 10-byte file has a different CRC: Unmatched: 1/2.
    assert_eq!(
        report.unmatched,
        vec![canonical(&roms.path().join("stray.bin"))]
    );
}

#[test]
fn test_missing_reference_is_counted() {
    let store = Store::open_in_memory().unwrap();
    let dats = tempdir().unwrap();
    let roms = tempdir().unwrap();

    // Two games in one catalog; only one has its file on disk.
    let sums_a = checksum::compute_bytes(CONTENT_A);
    let sums_b = checksum::compute_bytes(CONTENT_B);
    let body = format!(
        r#"<datafile>
  <header><name>Pair</name></header>
  <game name="Game A">
    <description>Game A</description>
    <rom name="a.bin" size="{}" crc="{}" md5="{}" sha1="{}"/>
  </game>
  <game name="Game B">
    <description>Game B</description>
    <rom name="b.bin" size="{}" crc="{}" md5="{}" sha1="{}"/>
  </game>
</datafile>"#,
        sums_a.size, sums_a.crc, sums_a.md5, sums_a.sha1,
        sums_b.size, sums_b.crc, sums_b.md5, sums_b.sha1,
    );
    fs::write(dats.path().join("pair.dat"), body).unwrap();
    fs::write(roms.path().join("a.bin"), CONTENT_A).unwrap();

    import::run(&store, &[dats.path().to_path_buf()]).unwrap();
    let report = report::build_report(&store, &[roms.path().to_path_buf()]).unwrap();

    let summary = &report.catalogs[0];
    assert_eq!(summary.have, 1);
    assert_eq!(summary.miss, 1);
    assert_eq!(summary.refs[1], ("b.bin".to_string(), RefStatus::Missing));
    assert!(report.unmatched.is_empty());
}

#[test]
fn test_partial_key_reference_never_matches() {
    let store = Store::open_in_memory().unwrap();
    let dats = tempdir().unwrap();
    let roms = tempdir().unwrap();

    // Correct crc and size, but no md5/sha1: the strict join rejects it.
    let sums = checksum::compute_bytes(CONTENT_A);
    let body = format!(
        r#"<datafile>
  <header><name>Partial</name></header>
  <game name="Game A">
    <description>Game A</description>
    <rom name="a.bin" size="{}" crc="{}"/>
  </game>
</datafile>"#,
        sums.size, sums.crc
    );
    fs::write(dats.path().join("partial.dat"), body).unwrap();
    fs::write(roms.path().join("a.bin"), CONTENT_A).unwrap();

    import::run(&store, &[dats.path().to_path_buf()]).unwrap();
    let report = report::build_report(&store, &[roms.path().to_path_buf()]).unwrap();

    // Zero-hit catalogs are omitted entirely.
    assert!(report.catalogs.is_empty());
    assert_eq!(report.unmatched.len(), 1);
}

#[test]
fn test_files_cached_by_earlier_runs_do_not_leak_in() {
    let store = Store::open_in_memory().unwrap();
    let (_dats, roms) = setup(&store);

    // Cache the matching rom directory in one run...
    report::build_report(&store, &[roms.path().to_path_buf()]).unwrap();

    // ...then report on an unrelated directory. The join still sees the
    // cached file rows, but they are outside this run's requested set.
    let other = tempdir().unwrap();
    fs::write(other.path().join("noise.bin"), b"noise").unwrap();
    let report = report::build_report(&store, &[other.path().to_path_buf()]).unwrap();

    assert!(report.catalogs.is_empty());
    assert_eq!(report.scanned, 1);
    assert_eq!(report.unmatched.len(), 1);
}

#[test]
fn test_report_against_empty_store_exits_nonzero() {
    let store = Store::open_in_memory().unwrap();
    let roms = tempdir().unwrap();
    let code = report::run(&store, &[roms.path().to_path_buf()], ReportOptions::default()).unwrap();
    assert_eq!(code, ExitCode::GeneralError);
}

#[test]
fn test_duplicate_files_each_match() {
    let store = Store::open_in_memory().unwrap();
    let (_dats, roms) = setup(&store);
    let have = roms.path().join("have.bin");

    // A byte-identical copy: one reference, two matching paths.
    fs::write(roms.path().join("copy.bin"), CONTENT_A).unwrap();
    let report = report::build_report(&store, &[roms.path().to_path_buf()]).unwrap();

    let summary = &report.catalogs[0];
    assert_eq!(summary.have, 1);
    match &summary.refs[0].1 {
        RefStatus::Matched(paths) => {
            assert_eq!(paths.len(), 2);
            assert!(paths.contains(&canonical(&have)));
            assert!(paths.contains(&canonical(&roms.path().join("copy.bin"))));
        }
        RefStatus::Missing => panic!("expected a match"),
    }
}
