use std::future::Future;
use std::io;
use std::time::Duration;

use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use log::{debug, warn};
use reqwest::Client;

use crate::engine::models::ResourceDescriptor;
use crate::transfer::DownloadError;

/// Archive bytes as they arrive from the remote end.
pub type ByteStream = BoxStream<'static, io::Result<Vec<u8>>>;

/// Where remote descriptors and archives come from.
pub trait ResourceSource: Send + Sync {
    /// Fetch and parse the remote descriptor. Any failure yields `None`.
    fn fetch_descriptor(
        &self,
        url: &str,
    ) -> impl Future<Output = Option<ResourceDescriptor>> + Send;

    /// Open a streamed connection to `url`.
    fn open_stream(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<ByteStream, DownloadError>> + Send;
}

#[derive(Clone)]
pub struct NetworkClient {
    client: Client,
}

impl NetworkClient {
    pub fn new(timeout: Duration) -> Self {
        // Only connecting and individual reads are bounded; archives may take a while.
        let client = Client::builder()
            .connect_timeout(timeout)
            .read_timeout(timeout)
            .user_agent(concat!("resource-launcher/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|err| {
                warn!("network client: falling back to default HTTP client configuration ({err})");
                Client::new()
            });
        Self { client }
    }
}

impl ResourceSource for NetworkClient {
    async fn fetch_descriptor(&self, url: &str) -> Option<ResourceDescriptor> {
        let response = match self.client.get(url).send().await {
            Ok(resp) => resp,
            Err(err) => {
                warn!("metadata: could not connect to {}: {}", url, err);
                return None;
            }
        };
        let response = match response.error_for_status() {
            Ok(resp) => resp,
            Err(err) => {
                warn!("metadata: {} returned an error status: {}", url, err);
                return None;
            }
        };
        let body = match response.text().await {
            Ok(body) => body,
            Err(err) => {
                warn!("metadata: failed to read resources metadata from {}: {}", url, err);
                return None;
            }
        };
        let descriptor = ResourceDescriptor::parse(&body);
        debug!(
            "metadata: remote descriptor version {:?}",
            descriptor.as_ref().map(|d| d.version().to_owned())
        );
        descriptor
    }

    async fn open_stream(&self, url: &str) -> Result<ByteStream, DownloadError> {
        let connect_failed = |err: reqwest::Error| DownloadError::ConnectFailed {
            url: url.to_owned(),
            reason: err.to_string(),
        };
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(connect_failed)?
            .error_for_status()
            .map_err(connect_failed)?;
        debug!(
            "download: connected to {} (content length {:?})",
            url,
            response.content_length()
        );

        Ok(response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()).map_err(io::Error::other))
            .boxed())
    }
}
