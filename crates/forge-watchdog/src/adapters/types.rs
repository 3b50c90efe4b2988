//! Response shapes of the node and peer APIs

use serde::Deserialize;

/// Every API response wraps its payload in `data`
#[derive(Debug, Deserialize)]
pub struct Envelope<T> {
    pub data: T,
}

/// `GET /api/node/status`
#[derive(Debug, Deserialize)]
pub struct StatusData {
    pub height: u64,
}

/// Entry of `GET|PUT /api/node/status/forging`
#[derive(Debug, Deserialize)]
pub struct ForgingEntry {
    pub forging: bool,
}

/// Entry of `GET /api/delegates?username=`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DelegateEntry {
    pub missed_blocks: u64,
}

/// Entry of `GET /api/peers`
#[derive(Debug, Deserialize)]
pub struct PeerEntry {
    #[serde(default)]
    pub ip: String,
    pub height: u64,
}

/// Installation manifest (`package.json`)
#[derive(Debug, Deserialize)]
pub struct PackageManifest {
    pub version: String,
}
