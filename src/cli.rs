//! Command-line interface definitions.
//!
//! All arguments, subcommands and options live here, using the clap
//! derive API: global options (verbosity, structured errors) plus one
//! subcommand per operation.
//!
//! ```bash
//! # Import DAT catalogs
//! romcheck import ~/dats
//!
//! # Warm the checksum cache
//! romcheck scan ~/roms
//!
//! # Audit a collection, listing what is missing
//! romcheck report --miss ~/roms
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::commands::report::ReportOptions;

/// Audit ROM collections against DAT catalogs of known checksums.
///
/// romcheck imports DAT files into a local store, caches checksums of
/// your binary files across runs, and reports which catalog entries
/// you have, which you are missing, and which files match nothing.
#[derive(Debug, Parser)]
#[command(name = "romcheck")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Emit errors as JSON on stderr (for scripting)
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Directory holding the store, overriding the platform default
    #[arg(long, global = true, value_name = "DIR", env = crate::config::CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan for DAT catalogs and import them into the store
    Import(ImportArgs),
    /// Compute and cache checksums for the given paths
    Scan(ScanArgs),
    /// Display catalog matches for the given paths
    Report(ReportArgs),
}

/// Arguments for the import subcommand.
#[derive(Debug, Args)]
pub struct ImportArgs {
    /// File paths to search for DAT catalogs
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for the scan subcommand.
#[derive(Debug, Args)]
pub struct ScanArgs {
    /// File paths to scan
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

/// Arguments for the report subcommand.
#[derive(Debug, Args)]
pub struct ReportArgs {
    /// Print matched references and the files satisfying them
    #[arg(long)]
    pub have: bool,

    /// Print missing references
    #[arg(long)]
    pub miss: bool,

    /// Print scanned paths that matched nothing
    #[arg(long)]
    pub unmatched: bool,

    /// File paths to analyze
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,
}

impl ReportArgs {
    /// Collect the detail toggles.
    #[must_use]
    pub fn options(&self) -> ReportOptions {
        ReportOptions {
            have: self.have,
            miss: self.miss,
            unmatched: self.unmatched,
        }
    }
}
