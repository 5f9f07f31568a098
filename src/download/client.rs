//! HTTP client wrapper for transferring one asset to disk.
//!
//! This module provides the `HttpClient` struct which streams a response
//! body into a hidden sibling file and publishes it under its final name
//! only once the whole body has been written.

use std::path::Path;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest::{Client, StatusCode};
use tempfile::{Builder, TempPath};
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{CONNECT_TIMEOUT_SECS, PARTIAL_SUFFIX, READ_TIMEOUT_SECS};
use super::error::DownloadError;
use crate::user_agent;

/// HTTP client for streaming asset transfers.
///
/// Create it once and clone it into every transfer; clones share the
/// underlying connection pool.
///
/// # Example
///
/// ```no_run
/// use model_fetcher_core::download::HttpClient;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = HttpClient::new();
/// let bytes = client
///     .transfer("https://example.com/m.glb", Path::new("./downloaded_models/models/m.glb"))
///     .await?;
/// println!("wrote {bytes} bytes");
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: Client,
}

impl Default for HttpClient {
    fn default() -> Self {
        Self::new()
    }
}

impl HttpClient {
    /// Creates a new HTTP client with default timeouts.
    ///
    /// Default configuration:
    /// - Connect timeout: 30 seconds
    /// - Read timeout: 5 minutes between body reads
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the static
    /// configuration. This should never happen in practice.
    #[must_use]
    pub fn new() -> Self {
        Self::new_with_timeouts(CONNECT_TIMEOUT_SECS, READ_TIMEOUT_SECS)
    }

    /// Creates a new HTTP client with explicit timeout values.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client builder fails to build with the supplied
    /// timeout configuration.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn new_with_timeouts(connect_timeout_secs: u64, read_timeout_secs: u64) -> Self {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(connect_timeout_secs))
            .read_timeout(Duration::from_secs(read_timeout_secs))
            .user_agent(user_agent::default_user_agent())
            .build()
            .expect("failed to build HTTP client with static configuration");
        Self { client }
    }

    /// Downloads `url` into `destination`, returning the number of bytes written.
    ///
    /// Only a `200 OK` response is accepted. The body is streamed chunk by
    /// chunk into a uniquely named `.<name>.<random>.part` next to the destination and renamed onto
    /// `destination` after the final flush, so a failed or aborted transfer
    /// never leaves a truncated file under the final name. An existing file
    /// at `destination` is replaced.
    ///
    /// # Errors
    ///
    /// Returns `DownloadError` if:
    /// - The URL is invalid
    /// - The request or the body stream fails (DNS, connect, reset, client timeout)
    /// - The server answers with any status other than 200
    /// - Writing or renaming the file fails
    #[must_use = "transfer result reports whether the asset is on disk"]
    #[instrument(skip(self, url, destination), fields(url = %url, destination = %destination.display()))]
    pub async fn transfer(&self, url: &str, destination: &Path) -> Result<u64, DownloadError> {
        debug!("starting transfer");

        Url::parse(url).map_err(|_| DownloadError::invalid_url(url))?;

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| DownloadError::network(url, e))?;

        let status = response.status();
        if status != StatusCode::OK {
            debug!(status = status.as_u16(), "rejecting non-200 response");
            return Err(DownloadError::http_status(url, status.as_u16()));
        }

        let (file, partial) = create_partial(destination)?;
        let bytes = match stream_to_file(response, url, file, &partial).await {
            Ok(bytes) => bytes,
            Err(e) => {
                discard_partial(partial);
                return Err(e);
            }
        };

        if let Err(e) = partial.persist(destination) {
            discard_partial(e.path);
            return Err(DownloadError::io(destination, e.error));
        }

        info!(bytes, "transfer complete");
        Ok(bytes)
    }

    /// Returns a reference to the underlying reqwest client.
    #[must_use]
    pub fn inner(&self) -> &Client {
        &self.client
    }
}

/// Opens a uniquely named hidden sibling of `destination` for the body.
///
/// The name is `.<file name>.<random>.part`, so two transfers aimed at the
/// same destination never share a partial file. The returned [`TempPath`]
/// removes the file when dropped, which covers cancellation and panics.
fn create_partial(destination: &Path) -> Result<(File, TempPath), DownloadError> {
    let dir = destination
        .parent()
        .filter(|parent| !parent.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let name = destination
        .file_name()
        .map_or_else(|| "asset".into(), |n| n.to_string_lossy());

    let (file, path) = Builder::new()
        .prefix(&format!(".{name}."))
        .suffix(PARTIAL_SUFFIX)
        .tempfile_in(dir)
        .map_err(|e| DownloadError::io(destination, e))?
        .into_parts();
    Ok((File::from_std(file), path))
}

/// Streams response body to `path` in arrival order, returning bytes written.
///
/// The file handle is closed before returning so the caller can rename or
/// remove it.
async fn stream_to_file(
    response: reqwest::Response,
    url: &str,
    file: File,
    path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::new(file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(path, e))?;

        bytes_written += chunk.len() as u64;
    }

    writer.flush().await.map_err(|e| DownloadError::io(path, e))?;
    writer
        .into_inner()
        .sync_all()
        .await
        .map_err(|e| DownloadError::io(path, e))?;

    Ok(bytes_written)
}

/// Best-effort removal of a partial file. Never replaces the transfer error.
fn discard_partial(partial: TempPath) {
    let path = partial.to_path_buf();
    match partial.close() {
        Ok(()) => debug!(path = %path.display(), "removed partial file"),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
        Err(e) => warn!(path = %path.display(), error = %e, "failed to remove partial file"),
    }
}
