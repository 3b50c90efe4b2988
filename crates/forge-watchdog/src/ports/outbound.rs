//! Outbound ports (driven side - SPI)

use std::path::Path;

use async_trait::async_trait;

use crate::domain::{CommandOutput, ForgingRequest, HeightSample, NodeStatus};
use crate::error::Result;

/// Port: control and status API of the managed node
#[async_trait]
pub trait NodeApi: Send + Sync {
    /// Succeeds when the status endpoint answers at all
    async fn probe(&self) -> Result<()>;

    /// Current node status
    async fn status(&self) -> Result<NodeStatus>;

    /// Whether the node currently reports forging
    async fn forging_status(&self) -> Result<bool>;

    /// Change forging mode; returns the forging flag from the response
    async fn set_forging(&self, request: ForgingRequest) -> Result<bool>;

    /// Cumulative missed-block counter of a delegate
    async fn missed_blocks(&self, delegate: &str) -> Result<u64>;
}

/// Port: public peer discovery
#[async_trait]
pub trait PeerDirectory: Send + Sync {
    /// Up to `limit` peers with their heights
    async fn peers(&self, limit: u32) -> Result<Vec<HeightSample>>;
}

/// Port: installed and published software versions
#[async_trait]
pub trait ReleaseSource: Send + Sync {
    /// Version recorded in the local installation manifest
    async fn installed_version(&self) -> Result<String>;

    /// Latest published version, whitespace-trimmed
    async fn latest_version(&self) -> Result<String>;
}

/// Port: external scripts
#[async_trait]
pub trait ActionExecutor: Send + Sync {
    /// Replace `dest` with a fresh executable copy downloaded from `url`
    async fn fetch_script(&self, url: &str, dest: &Path) -> Result<()>;

    /// Run `program` with `args` and capture its stdout
    async fn run(&self, program: &Path, args: &[String]) -> Result<CommandOutput>;
}
