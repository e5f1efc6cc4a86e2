//! Path safety validation for untrusted archive entry names.

mod claims;
mod entry_path;

pub use claims::ClaimedPaths;
pub use entry_path::resolve_entry_path;
pub use entry_path::sanitize_entry_name;
