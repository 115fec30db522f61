//! Command implementations behind the CLI subcommands.
//!
//! Each command opens nothing itself; the store handle is created once
//! per invocation in [`crate::run_app`] and passed down explicitly.

pub mod import;
pub mod report;
pub mod scan;
