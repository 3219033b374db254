use crate::error::{Result, StoreError};
use crate::storage::EntryMetadata;
use bytes::Bytes;
use reqwest::{Client, StatusCode, Url};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize)]
struct RemoteMetadataPayload {
    #[serde(default)]
    #[allow(dead_code)]
    name: Option<String>,
    #[serde(flatten)]
    metadata: EntryMetadata,
}

/// HTTP client for the peer-to-peer file endpoints. One instance is shared
/// across all sync and fetch work on a node.
#[derive(Clone)]
pub struct PeerClient {
    client: Client,
}

impl PeerClient {
    pub fn new(request_timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(request_timeout)
            .build()
            .map_err(|error| StoreError::Http(error.to_string()))?;

        Ok(Self { client })
    }

    /// Downloads a peer's metadata for `path`.
    pub async fn fetch_metadata(&self, address: &str, path: &str) -> Result<EntryMetadata> {
        let url = self.file_url(address, path, &[("meta", "true")])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| StoreError::PeerUnreachable {
                node: address.to_string(),
                reason: error.to_string(),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "metadata fetch failed: node={} status={} path={}",
                address,
                response.status(),
                path
            )));
        }

        let payload: RemoteMetadataPayload = response
            .json()
            .await
            .map_err(|error| StoreError::Http(error.to_string()))?;

        Ok(payload.metadata)
    }

    /// Downloads a peer's raw content for `path`.
    pub async fn fetch_content(&self, address: &str, path: &str) -> Result<Bytes> {
        let url = self.file_url(address, path, &[])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| StoreError::PeerUnreachable {
                node: address.to_string(),
                reason: error.to_string(),
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(StoreError::NotFound(path.to_string()));
        }
        if !response.status().is_success() {
            return Err(StoreError::Http(format!(
                "content fetch failed: node={} status={} path={}",
                address,
                response.status(),
                path
            )));
        }

        response
            .bytes()
            .await
            .map_err(|error| StoreError::Http(error.to_string()))
    }

    /// Asks `address` to pull `path` from `source` (the push side of a
    /// sync). The peer acks the trigger and downloads asynchronously.
    pub async fn trigger_fetch(&self, address: &str, path: &str, source: &str) -> Result<()> {
        let url = self.file_url(address, path, &[("getFrom", source)])?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|error| StoreError::PeerUnreachable {
                node: address.to_string(),
                reason: error.to_string(),
            })?;

        if !response.status().is_success() {
            return Err(StoreError::PeerUnreachable {
                node: address.to_string(),
                reason: format!("fetch trigger returned {}", response.status()),
            });
        }

        Ok(())
    }

    fn file_url(&self, address: &str, path: &str, query: &[(&str, &str)]) -> Result<Url> {
        let mut url = Url::parse(&format!("http://{}/files/{}", address, path))
            .map_err(|error| StoreError::Http(error.to_string()))?;

        if !query.is_empty() {
            let mut pairs = url.query_pairs_mut();
            for (key, value) in query {
                pairs.append_pair(key, value);
            }
        }

        Ok(url)
    }
}
