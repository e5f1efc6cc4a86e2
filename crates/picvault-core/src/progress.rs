//! Progress reporting for downloads and extraction.

/// Callback interface for long-running operations.
///
/// Download progress reports transferred bytes against an optional total
/// (absent when the server sends no Content-Length). Extraction progress
/// reports processed entry counts; counts are monotonically non-decreasing
/// and the final call always satisfies `processed == total`.
pub trait ProgressCallback {
    /// Called as archive bytes arrive from the network.
    fn on_download(&mut self, _transferred: u64, _total: Option<u64>) {}

    /// Called as entries are processed during extraction.
    fn on_entry(&mut self, _processed: usize, _total: usize) {}

    /// Called exactly once when the operation completes.
    fn on_complete(&mut self) {}
}

/// No-op progress callback for callers that do not report progress.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl ProgressCallback for NoopProgress {}
