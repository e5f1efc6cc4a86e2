//! Content-addressed archive library for image galleries.
//!
//! `picvault-core` acquires image archives (zip, rar, 7z) from URLs or
//! local files, extracts their images safely (path traversal and symlink
//! escapes are rejected), and keeps the archive binaries in a
//! size-bounded persistent library with least-recently-used eviction.
//! Starred archives are exempt from eviction. All metadata lives in a
//! JSON document saved atomically with rotating backups.
//!
//! # Examples
//!
//! ```no_run
//! use picvault_core::{NoopProgress, Vault, VaultConfig};
//! use std::path::PathBuf;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let vault = Vault::open(VaultConfig::new(PathBuf::from("/data/picvault")))?;
//! let loaded = vault.load_from_url("https://example.com/cats.cbz", &mut NoopProgress)?;
//! println!("{} images in {}", loaded.images.len(), loaded.session_dir.display());
//! # Ok(())
//! # }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod api;
pub mod cache;
pub mod config;
pub mod db;
pub mod error;
pub mod formats;
pub mod fsutil;
pub mod ingest;
pub mod progress;
pub mod security;
pub mod session;
pub mod store;

#[doc(hidden)]
pub mod test_utils;

// Re-export main API types
pub use api::LoadOutcome;
pub use api::LoadResult;
pub use api::Vault;
pub use cache::LibraryUsage;
pub use config::VaultConfig;
pub use error::Result;
pub use error::VaultError;
pub use progress::NoopProgress;
pub use progress::ProgressCallback;
pub use store::Placement;
