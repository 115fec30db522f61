//! The `report` command: the match engine and its statistics.
//!
//! Scans the requested paths (through the file cache), joins the
//! store's references against the store's files on strict simultaneous
//! equality of size and checksums, then prints have/miss statistics
//! per catalog and the paths that matched nothing.

use anyhow::Result;
use std::collections::{BTreeSet, HashMap};
use std::path::PathBuf;

use crate::error::ExitCode;
use crate::store::Store;

use super::scan;

/// Detail toggles for the report output.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReportOptions {
    /// Print matched references with the paths that satisfy them.
    pub have: bool,
    /// Print missing references.
    pub miss: bool,
    /// Print scanned paths that matched nothing.
    pub unmatched: bool,
}

/// Match/miss classification of one reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RefStatus {
    /// Matched by the listed scanned paths (several, when duplicate
    /// files satisfy the same reference).
    Matched(Vec<String>),
    Missing,
}

/// Have/miss statistics for one catalog.
#[derive(Debug, Clone)]
pub struct CatalogSummary {
    pub name: String,
    pub have: usize,
    pub miss: usize,
    /// Every reference of the catalog with its status, in catalog order.
    pub refs: Vec<(String, RefStatus)>,
}

impl CatalogSummary {
    /// Matched share as a percentage.
    #[must_use]
    pub fn percent(&self) -> f64 {
        100.0 * self.have as f64 / (self.have + self.miss) as f64
    }
}

/// The derived match report for one run.
///
/// Matches are computed fresh each run and never persisted; both file and
/// reference populations change between runs.
#[derive(Debug, Clone)]
pub struct Report {
    /// Summaries of catalogs with at least one match, in import order.
    /// Catalogs with zero hits are omitted as noise.
    pub catalogs: Vec<CatalogSummary>,
    /// Scanned paths that matched no reference, sorted.
    pub unmatched: Vec<String>,
    /// Total number of scanned paths considered.
    pub scanned: usize,
}

/// Scan `paths` and compute the match report.
pub fn build_report(store: &Store, paths: &[PathBuf]) -> Result<Report> {
    let records = scan::scan_paths(store, paths)?;
    let requested: BTreeSet<String> = records.into_iter().map(|r| r.path).collect();

    log::info!("Scanning for matches");
    // The join runs over every file ever cached; only matches inside
    // this run's requested set count.
    let mut matched_paths: BTreeSet<String> = BTreeSet::new();
    let mut matched_refs: HashMap<i64, Vec<String>> = HashMap::new();
    let mut matched_catalogs: BTreeSet<i64> = BTreeSet::new();
    for row in store.match_refs()? {
        if !requested.contains(&row.path) {
            continue;
        }
        matched_paths.insert(row.path.clone());
        matched_catalogs.insert(row.catalog_id);
        matched_refs.entry(row.ref_id).or_default().push(row.path);
    }

    log::info!("Calculating statistics");
    let mut catalogs = Vec::with_capacity(matched_catalogs.len());
    for catalog_id in matched_catalogs {
        let Some(catalog) = store.catalog_by_id(catalog_id)? else {
            continue;
        };

        let mut have = 0usize;
        let mut miss = 0usize;
        let mut refs = Vec::new();
        for entry in store.entries_for_catalog(catalog_id)? {
            for reference in store.refs_for_entry(entry.id)? {
                match matched_refs.remove(&reference.id) {
                    Some(paths) => {
                        have += 1;
                        refs.push((reference.name, RefStatus::Matched(paths)));
                    }
                    None => {
                        miss += 1;
                        refs.push((reference.name, RefStatus::Missing));
                    }
                }
            }
        }
        catalogs.push(CatalogSummary {
            name: catalog.name,
            have,
            miss,
            refs,
        });
    }

    Ok(Report {
        catalogs,
        unmatched: requested.difference(&matched_paths).cloned().collect(),
        scanned: requested.len(),
    })
}

/// Run the report command.
///
/// Reporting against an empty catalog store is a user-facing error
/// (exit code 1), not a crash.
pub fn run(store: &Store, paths: &[PathBuf], options: ReportOptions) -> Result<ExitCode> {
    if store.catalog_count()? == 0 {
        log::error!("No catalogs available. Use \"romcheck import\" first to add some.");
        return Ok(ExitCode::GeneralError);
    }

    let report = build_report(store, paths)?;

    for catalog in &report.catalogs {
        println!(
            "{}: {}/{} ({:.1}%)",
            catalog.name,
            catalog.have,
            catalog.have + catalog.miss,
            catalog.percent()
        );
        if options.have || options.miss {
            for (name, status) in &catalog.refs {
                match status {
                    RefStatus::Matched(paths) if options.have => {
                        println!("--> {} -> {}", name, paths.join(", "));
                    }
                    RefStatus::Missing if options.miss => {
                        println!("--> [MISSING] {name}");
                    }
                    _ => {}
                }
            }
        }
    }

    println!("Unmatched: {}/{}", report.unmatched.len(), report.scanned);
    if options.unmatched {
        for path in &report.unmatched {
            println!("--> {path}");
        }
    }

    Ok(ExitCode::Success)
}
