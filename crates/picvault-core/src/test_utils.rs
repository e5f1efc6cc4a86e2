//! Test utilities for building archive fixtures.
//!
//! # Panics
//!
//! All functions here may panic on I/O errors since they are designed for
//! test use only where panics are acceptable.

#![allow(clippy::unwrap_used, clippy::missing_panics_doc)]

use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::{SimpleFileOptions, ZipWriter};

/// Writes a ZIP archive at `path` from a list of `(entry_name, content)`
/// pairs. Entries are stored uncompressed; entry names are written
/// verbatim, including hostile ones like `../escape.jpg`.
pub fn write_zip_fixture(path: &Path, entries: &[(&str, &[u8])]) {
    let file = File::create(path).unwrap();
    let mut zip = ZipWriter::new(file);
    let options =
        SimpleFileOptions::default().compression_method(zip::CompressionMethod::Stored);

    for (name, data) in entries {
        zip.start_file(*name, options).unwrap();
        zip.write_all(data).unwrap();
    }
    zip.finish().unwrap();
}

/// Writes a ZIP fixture and returns its size in bytes.
pub fn write_zip_fixture_sized(path: &Path, entries: &[(&str, &[u8])]) -> u64 {
    write_zip_fixture(path, entries);
    std::fs::metadata(path).unwrap().len()
}
