//! File discovery and the incremental checksum cache.
//!
//! [`walker`] finds files beneath the requested roots; [`cache`]
//! resolves each one to a stored [`crate::store::FileRecord`], hashing
//! only when the on-disk state disagrees with what was recorded.

pub mod cache;
pub mod walker;

pub use cache::{resolve, CacheError};
pub use walker::find_files;
