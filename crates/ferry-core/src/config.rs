//! Configuration for packing and remote transfers.

use crate::Result;
use crate::TransferError;
use std::fmt;
use std::time::Duration;

/// Environment variable overriding [`TransferConfig::api_base_url`].
pub const ENV_API_BASE_URL: &str = "FERRY_API_BASE_URL";

/// Environment variable supplying [`TransferConfig::api_token`].
pub const ENV_API_TOKEN: &str = "FERRY_TOKEN";

/// Default control API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://api.bitrise.io/v0.1";

/// Default timeout for control API calls.
pub const DEFAULT_API_TIMEOUT: Duration = Duration::from_secs(60);

/// Default timeout for the object-store PUT and GET legs.
pub const DEFAULT_TRANSFER_TIMEOUT: Duration = Duration::from_secs(10 * 60);

/// Configuration shared by the packer and the transfer drivers.
///
/// # Examples
///
/// ```
/// use ferry_core::TransferConfig;
/// use std::time::Duration;
///
/// let config = TransferConfig::default()
///     .with_api_token("secret")
///     .with_transfer_timeout(Duration::from_secs(30))
///     .with_compression_level(9);
///
/// assert!(config.validate().is_ok());
/// ```
#[derive(Clone)]
pub struct TransferConfig {
    /// Base URL of the control API, without a trailing slash.
    ///
    /// Default: `https://api.bitrise.io/v0.1`.
    pub api_base_url: String,

    /// Token sent verbatim in the `Authorization` header.
    ///
    /// Default: `None`. Required for remote operations.
    pub api_token: Option<String>,

    /// Timeout for each control API call.
    ///
    /// Default: 60 seconds.
    pub api_timeout: Duration,

    /// Wall-clock bound for a single PUT or GET of the archive body.
    ///
    /// Default: 10 minutes.
    pub transfer_timeout: Duration,

    /// Gzip compression level (1-9).
    ///
    /// Default: 6.
    pub compression_level: u8,
}

impl Default for TransferConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            api_timeout: DEFAULT_API_TIMEOUT,
            transfer_timeout: DEFAULT_TRANSFER_TIMEOUT,
            compression_level: 6,
        }
    }
}

impl fmt::Debug for TransferConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TransferConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "<redacted>"))
            .field("api_timeout", &self.api_timeout)
            .field("transfer_timeout", &self.transfer_timeout)
            .field("compression_level", &self.compression_level)
            .finish()
    }
}

impl TransferConfig {
    /// Creates a new `TransferConfig` with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a configuration from the defaults overlaid with the process
    /// environment (`FERRY_API_BASE_URL`, `FERRY_TOKEN`).
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`TransferConfig::from_env`] with an injectable variable source.
    ///
    /// Empty values are treated as unset.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let mut config = Self::default();
        if let Some(url) = non_empty(ENV_API_BASE_URL) {
            config = config.with_api_base_url(url);
        }
        config.api_token = non_empty(ENV_API_TOKEN);
        config
    }

    /// Sets the control API base URL. A trailing `/` is dropped.
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        let url = url.into();
        self.api_base_url = url.trim_end_matches('/').to_string();
        self
    }

    /// Sets the API token.
    #[must_use]
    pub fn with_api_token(mut self, token: impl Into<String>) -> Self {
        self.api_token = Some(token.into());
        self
    }

    /// Sets the control API timeout.
    #[must_use]
    pub fn with_api_timeout(mut self, timeout: Duration) -> Self {
        self.api_timeout = timeout;
        self
    }

    /// Sets the PUT/GET timeout.
    #[must_use]
    pub fn with_transfer_timeout(mut self, timeout: Duration) -> Self {
        self.transfer_timeout = timeout;
        self
    }

    /// Sets the gzip compression level.
    #[must_use]
    pub fn with_compression_level(mut self, level: u8) -> Self {
        self.compression_level = level;
        self
    }

    /// Returns the token, or an error naming the variable that supplies it.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidConfig` when no token is configured.
    pub fn require_token(&self) -> Result<&str> {
        self.api_token
            .as_deref()
            .ok_or_else(|| TransferError::InvalidConfig {
                reason: format!("API token is not set (export {ENV_API_TOKEN})"),
            })
    }

    /// Validates the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidConfig` if:
    /// - `api_base_url` is empty or not an http(s) URL
    /// - `compression_level` is outside 1-9
    /// - either timeout is zero
    pub fn validate(&self) -> Result<()> {
        let invalid = |reason: String| Err(TransferError::InvalidConfig { reason });

        if self.api_base_url.is_empty() {
            return invalid("API base URL is empty".into());
        }
        if !(self.api_base_url.starts_with("http://") || self.api_base_url.starts_with("https://"))
        {
            return invalid(format!(
                "API base URL must start with http:// or https://, got {}",
                self.api_base_url
            ));
        }
        if !(1..=9).contains(&self.compression_level) {
            return invalid(format!(
                "compression level must be between 1 and 9, got {}",
                self.compression_level
            ));
        }
        if self.api_timeout.is_zero() || self.transfer_timeout.is_zero() {
            return invalid("timeouts must be greater than zero".into());
        }

        Ok(())
    }
}
