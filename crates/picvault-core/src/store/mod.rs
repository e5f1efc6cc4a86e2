//! Content-addressed persistence of archive binaries.

mod download;
mod identity;
mod library;

pub use identity::{
    display_name_for_path, display_name_for_url, id_for_bytes, id_for_path, id_for_url,
};
pub use library::{LibraryStore, Placement, StoredArchive};
