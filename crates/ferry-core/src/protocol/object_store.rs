//! Object store access through pre-signed URLs.

use crate::Result;
use crate::config::TransferConfig;
use crate::protocol::ensure_success;
use crate::protocol::transport_error;
use std::time::Duration;

/// Whole-body PUT and GET against pre-signed URLs.
///
/// The URLs carry their own authorization; no extra credentials are sent.
pub trait ObjectStore {
    /// Uploads `bytes` to `url`.
    fn put(&self, url: &str, bytes: &[u8]) -> Result<()>;

    /// Downloads the full body at `url`.
    fn get(&self, url: &str) -> Result<Vec<u8>>;
}

/// [`ObjectStore`] over HTTP(S) with blocking `reqwest`.
///
/// Each request is bounded by the configured transfer timeout; exceeding it
/// surfaces as an I/O error of kind `TimedOut`.
#[derive(Debug, Clone)]
pub struct HttpObjectStore {
    client: reqwest::blocking::Client,
}

impl HttpObjectStore {
    /// Builds a store client using `config.transfer_timeout`.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Io` if the HTTP client cannot be constructed.
    pub fn new(config: &TransferConfig) -> Result<Self> {
        Self::with_timeout(config.transfer_timeout)
    }

    /// Builds a store client with an explicit timeout.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::Io` if the HTTP client cannot be constructed.
    pub fn with_timeout(timeout: Duration) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(30).min(timeout))
            .timeout(timeout)
            .build()
            .map_err(|e| transport_error(&e))?;
        Ok(Self { client })
    }
}

impl ObjectStore for HttpObjectStore {
    fn put(&self, url: &str, bytes: &[u8]) -> Result<()> {
        tracing::debug!(bytes = bytes.len(), "uploading archive to signed URL");

        let response = self
            .client
            .put(url)
            .body(bytes.to_vec())
            .send()
            .map_err(|e| transport_error(&e))?;
        ensure_success(response)?;
        Ok(())
    }

    fn get(&self, url: &str) -> Result<Vec<u8>> {
        tracing::debug!("downloading archive from signed URL");

        let response = self
            .client
            .get(url)
            .send()
            .map_err(|e| transport_error(&e))?;
        let response = ensure_success(response)?;
        let bytes = response.bytes().map_err(|e| transport_error(&e))?;

        tracing::debug!(bytes = bytes.len(), "archive downloaded");
        Ok(bytes.to_vec())
    }
}
