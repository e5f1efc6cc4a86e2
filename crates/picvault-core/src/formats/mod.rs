//! Archive format adapters.
//!
//! One adapter per supported format (ZIP, RAR, 7z), all exposing the same
//! [`EntryExtractor`] contract: list entries, extract all image entries,
//! extract a single entry. Format selection happens once at ingestion time
//! from the file extension.

pub mod detect;
pub mod images;
pub mod rar;
pub mod sevenz;
pub mod traits;
pub mod zip;

pub use detect::ArchiveKind;
pub use detect::detect_format;
pub use traits::EntryExtractor;
pub use traits::EntryInfo;
pub use traits::ExtractedImage;
pub use traits::extractor_for;
