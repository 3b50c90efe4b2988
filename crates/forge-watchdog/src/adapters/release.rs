//! Installed version from the manifest, latest version from the downloads site.

use std::path::PathBuf;

use async_trait::async_trait;
use reqwest::Client;

use super::types::PackageManifest;
use crate::error::{Result, WatchdogError};
use crate::ports::ReleaseSource;

pub struct HttpReleaseSource {
    client: Client,
    manifest_path: PathBuf,
    latest_url: String,
}

impl HttpReleaseSource {
    pub fn new(client: Client, manifest_path: impl Into<PathBuf>, latest_url: impl Into<String>) -> Self {
        Self {
            client,
            manifest_path: manifest_path.into(),
            latest_url: latest_url.into(),
        }
    }
}

#[async_trait]
impl ReleaseSource for HttpReleaseSource {
    async fn installed_version(&self) -> Result<String> {
        let raw = tokio::fs::read(&self.manifest_path).await.map_err(|e| {
            WatchdogError::io(format!("reading {}", self.manifest_path.display()), e)
        })?;
        let manifest: PackageManifest =
            serde_json::from_slice(&raw).map_err(|e| WatchdogError::Decode {
                what: "installation manifest",
                reason: e.to_string(),
            })?;
        Ok(manifest.version)
    }

    async fn latest_version(&self) -> Result<String> {
        let response = self
            .client
            .get(&self.latest_url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| WatchdogError::http(&self.latest_url, e))?;
        let text = response
            .text()
            .await
            .map_err(|e| WatchdogError::http(&self.latest_url, e))?;
        Ok(text.trim().to_string())
    }
}
