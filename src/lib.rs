//! romcheck - audit ROM collections against DAT catalogs.
//!
//! romcheck identifies binary files by comparing their checksums
//! against catalogs of known reference files imported from DAT
//! documents. Both catalogs and scanned file metadata live in a
//! persistent SQLite store, so repeated runs over the same files are
//! fast: only files whose size or mtime changed get re-hashed.

pub mod catalog;
pub mod checksum;
pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod scanner;
pub mod store;

use anyhow::{Context, Result};

use crate::cli::{Cli, Commands};
use crate::error::ExitCode;
use crate::store::Store;

/// Run the application with parsed CLI arguments.
///
/// Opens the store once and threads it through the chosen command; its
/// lifetime is scoped to this invocation.
pub fn run_app(cli: Cli) -> Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);

    let store_path = config::store_path(cli.config)?;
    let store = Store::open(&store_path)
        .with_context(|| format!("failed to open store at {}", store_path.display()))?;

    match cli.command {
        Commands::Import(args) => {
            commands::import::run(&store, &args.paths)?;
            Ok(ExitCode::Success)
        }
        Commands::Scan(args) => commands::scan::run(&store, &args.paths),
        Commands::Report(args) => commands::report::run(&store, &args.paths, args.options()),
    }
}
