//! Adapters connecting the ports to HTTP, the filesystem and host processes

mod http;
mod process;
mod release;
mod types;

pub use http::{build_client, HttpNodeClient, HttpPeerDirectory};
pub use process::SystemActionExecutor;
pub use release::HttpReleaseSource;
