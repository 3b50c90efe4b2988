//! HTTP clients for the managed node and the public peer network.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::types::{DelegateEntry, Envelope, ForgingEntry, PeerEntry, StatusData};
use crate::domain::{ForgingRequest, HeightSample, NodeStatus};
use crate::error::{Result, WatchdogError};
use crate::ports::{NodeApi, PeerDirectory};

/// Build the shared HTTP client.
pub fn build_client() -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .connect_timeout(Duration::from_secs(5))
        .build()
        .map_err(|e| WatchdogError::Config(format!("cannot build HTTP client: {}", e)))
}

/// Send a prepared request and decode a JSON body.
async fn send_json<T: DeserializeOwned>(
    request: reqwest::RequestBuilder,
    url: &str,
    what: &'static str,
) -> Result<T> {
    let response = request
        .send()
        .await
        .and_then(|r| r.error_for_status())
        .map_err(|e| WatchdogError::http(url, e))?;
    let body = response
        .bytes()
        .await
        .map_err(|e| WatchdogError::http(url, e))?;
    serde_json::from_slice(&body).map_err(|e| WatchdogError::Decode {
        what,
        reason: e.to_string(),
    })
}

/// Client for the managed node's REST API.
pub struct HttpNodeClient {
    client: Client,
    base_url: String,
}

impl HttpNodeClient {
    /// Create a client for the node at `base_url`.
    pub fn new(client: Client, base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn status_url(&self) -> String {
        self.url("/api/node/status")
    }

    fn forging_url(&self) -> String {
        self.url("/api/node/status/forging")
    }
}

#[async_trait]
impl NodeApi for HttpNodeClient {
    async fn probe(&self) -> Result<()> {
        let url = self.status_url();
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| WatchdogError::http(&url, e))?;
        debug!(status = %response.status(), "Node API answered");
        Ok(())
    }

    async fn status(&self) -> Result<NodeStatus> {
        let url = self.status_url();
        let env: Envelope<StatusData> =
            send_json(self.client.get(&url), &url, "node status").await?;
        Ok(NodeStatus {
            height: env.data.height,
        })
    }

    async fn forging_status(&self) -> Result<bool> {
        let url = self.forging_url();
        let env: Envelope<Vec<ForgingEntry>> =
            send_json(self.client.get(&url), &url, "forging status").await?;
        env.data
            .first()
            .map(|entry| entry.forging)
            .ok_or(WatchdogError::EmptyResponse(url))
    }

    async fn set_forging(&self, request: ForgingRequest) -> Result<bool> {
        let url = self.forging_url();
        let env: Envelope<Vec<ForgingEntry>> = send_json(
            self.client.put(&url).json(&request),
            &url,
            "forging response",
        )
        .await?;
        env.data
            .first()
            .map(|entry| entry.forging)
            .ok_or(WatchdogError::EmptyResponse(url))
    }

    async fn missed_blocks(&self, delegate: &str) -> Result<u64> {
        let url = self.url("/api/delegates");
        let env: Envelope<Vec<DelegateEntry>> = send_json(
            self.client.get(&url).query(&[("username", delegate)]),
            &url,
            "delegate",
        )
        .await?;
        env.data
            .first()
            .map(|entry| entry.missed_blocks)
            .ok_or_else(|| WatchdogError::DelegateNotFound(delegate.to_string()))
    }
}

/// Peer discovery through a public node.
pub struct HttpPeerDirectory {
    client: Client,
    /// `scheme://host`, the port is appended per query
    public_node_url: String,
    peer_port: u16,
}

impl HttpPeerDirectory {
    pub fn new(client: Client, public_node_url: impl Into<String>, peer_port: u16) -> Self {
        let public_node_url: String = public_node_url.into();
        Self {
            client,
            public_node_url: public_node_url.trim_end_matches('/').to_string(),
            peer_port,
        }
    }
}

#[async_trait]
impl PeerDirectory for HttpPeerDirectory {
    async fn peers(&self, limit: u32) -> Result<Vec<HeightSample>> {
        let url = format!(
            "{}:{}/api/peers?limit={}",
            self.public_node_url, self.peer_port, limit
        );
        let env: Envelope<Vec<PeerEntry>> =
            send_json(self.client.get(&url), &url, "peer list").await?;
        Ok(env
            .data
            .into_iter()
            .map(|peer| HeightSample::new(peer.ip, peer.height))
            .collect())
    }
}
