//! HTTP acquisition of archives.
//!
//! Downloads stream to a `.part` file next to the final destination and
//! rename into place on success, so an interrupted transfer never leaves
//! a plausible-looking archive behind.

use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::Path;

use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use tracing::{debug, info};

use crate::ProgressCallback;
use crate::config::VaultConfig;
use crate::error::{Result, VaultError, map_http_error};

const COPY_BUF: usize = 64 * 1024;

/// Blocking HTTP client configured from [`VaultConfig`].
pub struct Downloader {
    client: Client,
    timeout_secs: u64,
}

impl Downloader {
    /// Builds the client with the configured timeouts and redirect cap.
    ///
    /// # Errors
    ///
    /// Returns a [`VaultError::Network`] if the TLS backend fails to
    /// initialize.
    pub fn new(config: &VaultConfig) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(config.connect_timeout)
            .timeout(config.request_timeout)
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| VaultError::Network {
                url: String::new(),
                reason: format!("http client init failed: {e}"),
            })?;
        Ok(Self {
            client,
            timeout_secs: config.request_timeout.as_secs(),
        })
    }

    /// Downloads `url` to `dest`, reporting byte progress.
    ///
    /// # Errors
    ///
    /// Returns [`VaultError::Timeout`] when the request exceeds its time
    /// budget, [`VaultError::Network`] for any other HTTP failure
    /// (including non-2xx statuses), or [`VaultError::Io`] when the
    /// destination cannot be written. The `.part` file is removed on
    /// failure.
    pub fn fetch(
        &self,
        url: &str,
        dest: &Path,
        progress: &mut dyn ProgressCallback,
    ) -> Result<u64> {
        debug!(url, dest = %dest.display(), "starting download");

        let response = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .map_err(|e| map_http_error(&e, url, self.timeout_secs))?;

        let expected = response.content_length();
        let part = dest.with_extension("part");

        let written = stream_to_file(response, &part, expected, url, self.timeout_secs, progress);
        match written {
            Ok(bytes) => {
                fs::rename(&part, dest)?;
                info!(url, bytes, "download complete");
                Ok(bytes)
            }
            Err(e) => {
                let _ = fs::remove_file(&part);
                Err(e)
            }
        }
    }
}

fn stream_to_file(
    mut response: reqwest::blocking::Response,
    part: &Path,
    expected: Option<u64>,
    url: &str,
    timeout_secs: u64,
    progress: &mut dyn ProgressCallback,
) -> Result<u64> {
    if let Some(parent) = part.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut out = File::create(part)?;
    let mut buf = [0u8; COPY_BUF];
    let mut written: u64 = 0;

    loop {
        let read = match response.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) => {
                // Body read failures surface as io errors wrapping reqwest.
                let reason = e.to_string();
                return Err(if reason.contains("timed out") {
                    VaultError::Timeout {
                        url: url.to_string(),
                        seconds: timeout_secs,
                    }
                } else {
                    VaultError::Network {
                        url: url.to_string(),
                        reason,
                    }
                });
            }
        };
        out.write_all(&buf[..read])?;
        written += read as u64;
        progress.on_download(written, expected);
    }

    out.flush()?;
    Ok(written)
}
