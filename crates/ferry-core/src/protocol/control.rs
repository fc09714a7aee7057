//! Control API client: hands out signed object-store URLs.

use crate::Result;
use crate::TransferError;
use crate::config::TransferConfig;
use crate::protocol::ensure_success;
use crate::protocol::transport_error;
use serde::Deserialize;
use serde::Serialize;
use std::time::Duration;

/// Remote-assigned upload session.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadSession {
    /// Pre-signed URL the archive is PUT to.
    pub signed_url: String,

    /// Id that ties the PUT to the completion call.
    pub upload_id: String,
}

/// Pre-signed URL a download archive can be fetched from.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadTicket {
    /// Pre-signed GET URL.
    pub signed_url: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct CompleteUploadBody<'a> {
    upload_id: &'a str,
    destination_parent_folder: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DownloadBody<'a> {
    source_path: &'a str,
    only_contents_of_folder: bool,
}

/// Authenticated control-plane operations for one remote machine.
pub trait ControlApi {
    /// Opens an upload session.
    fn begin_upload(&self, machine_id: &str) -> Result<UploadSession>;

    /// Tells the machine to unpack the uploaded archive into
    /// `destination_parent`.
    fn complete_upload(
        &self,
        machine_id: &str,
        upload_id: &str,
        destination_parent: &str,
    ) -> Result<()>;

    /// Asks the machine to pack `source_path` and returns where to fetch it.
    fn request_download(
        &self,
        machine_id: &str,
        source_path: &str,
        contents_only: bool,
    ) -> Result<DownloadTicket>;
}

/// [`ControlApi`] over HTTPS with blocking `reqwest`.
///
/// # Examples
///
/// ```no_run
/// use ferry_core::TransferConfig;
/// use ferry_core::protocol::ControlApi;
/// use ferry_core::protocol::HttpControlApi;
///
/// let config = TransferConfig::from_env();
/// let api = HttpControlApi::new(&config)?;
/// let session = api.begin_upload("machine-123")?;
/// println!("upload id {}", session.upload_id);
/// # Ok::<(), ferry_core::TransferError>(())
/// ```
#[derive(Debug, Clone)]
pub struct HttpControlApi {
    base_url: String,
    token: String,
    client: reqwest::blocking::Client,
}

impl HttpControlApi {
    /// Builds a client from the configuration.
    ///
    /// # Errors
    ///
    /// Returns `TransferError::InvalidConfig` if the configuration is invalid
    /// or carries no token, and `TransferError::Io` if the HTTP client cannot
    /// be constructed.
    pub fn new(config: &TransferConfig) -> Result<Self> {
        config.validate()?;
        let token = config.require_token()?.to_string();

        let client = reqwest::blocking::Client::builder()
            .connect_timeout(Duration::from_secs(15).min(config.api_timeout))
            .timeout(config.api_timeout)
            .user_agent(user_agent())
            .build()
            .map_err(|e| transport_error(&e))?;

        Ok(Self {
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token,
            client,
        })
    }

    fn endpoint(&self, machine_id: &str, action: &str) -> Result<String> {
        if machine_id.is_empty() || machine_id.contains(['/', '?', '#']) {
            return Err(TransferError::InvalidConfig {
                reason: format!("invalid machine id: {machine_id:?}"),
            });
        }
        Ok(format!(
            "{}/platform/me/machines/{machine_id}/{action}",
            self.base_url
        ))
    }

    fn post<B: Serialize + ?Sized>(
        &self,
        url: &str,
        body: Option<&B>,
    ) -> Result<reqwest::blocking::Response> {
        let mut request = self
            .client
            .post(url)
            .header(reqwest::header::ACCEPT, "application/json")
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .header(reqwest::header::AUTHORIZATION, &self.token);

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().map_err(|e| transport_error(&e))?;
        ensure_success(response)
    }
}

impl ControlApi for HttpControlApi {
    fn begin_upload(&self, machine_id: &str) -> Result<UploadSession> {
        let url = self.endpoint(machine_id, "start_upload")?;
        tracing::debug!(machine_id, "starting upload session");

        let response = self.post::<()>(&url, None)?;
        decode(response)
    }

    fn complete_upload(
        &self,
        machine_id: &str,
        upload_id: &str,
        destination_parent: &str,
    ) -> Result<()> {
        let url = self.endpoint(machine_id, "complete_upload")?;
        let body = CompleteUploadBody {
            upload_id,
            destination_parent_folder: destination_parent,
        };
        tracing::debug!(machine_id, upload_id, destination_parent, "completing upload");

        self.post(&url, Some(&body))?;
        Ok(())
    }

    fn request_download(
        &self,
        machine_id: &str,
        source_path: &str,
        contents_only: bool,
    ) -> Result<DownloadTicket> {
        let url = self.endpoint(machine_id, "download")?;
        let body = DownloadBody {
            source_path,
            only_contents_of_folder: contents_only,
        };
        tracing::debug!(machine_id, source_path, contents_only, "requesting download");

        let response = self.post(&url, Some(&body))?;
        decode(response)
    }
}

fn decode<T: serde::de::DeserializeOwned>(response: reqwest::blocking::Response) -> Result<T> {
    let status = response.status().as_u16();
    let text = response.text().map_err(|e| transport_error(&e))?;
    serde_json::from_str(&text).map_err(|e| TransferError::Protocol {
        status: Some(status),
        message: format!("invalid response body ({e}): {text}"),
    })
}

/// `User-Agent` sent with every control API call.
#[must_use]
pub fn user_agent() -> String {
    format!("ferry/{}", env!("CARGO_PKG_VERSION"))
}
