//! # Forge Watchdog
//!
//! Keeps a single forging node healthy without an operator:
//!
//! - **Update**: installs the published release when the installed version differs
//! - **Reload**: restarts the node when it falls behind its peers or misses blocks
//! - **Forging**: re-enables forging after every restart and confirms it
//!
//! ## Architecture Layers
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Adapters (Outer)                                   │
//! │  - HttpNodeClient, HttpPeerDirectory (reqwest)      │
//! │  - HttpReleaseSource (manifest + latest.txt)        │
//! │  - SystemActionExecutor (installer, lisk.sh)        │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Ports (Middle)                                     │
//! │  - NodeApi, PeerDirectory, ReleaseSource,           │
//! │    ActionExecutor                                   │
//! └─────────────────────────────────────────────────────┘
//!                         │
//! ┌─────────────────────────────────────────────────────┐
//! │  Domain (Inner - Pure Logic)                        │
//! │  - Bounded retry executor                           │
//! │  - Drift predicates (version, height, missed blocks)│
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Critical Invariants
//!
//! 1. **Ordering**: update check precedes reload check; each action precedes
//!    its readiness wait, which precedes re-enabling forging
//! 2. **Bounded waits**: readiness polling gives up after a fixed number of probes
//! 3. **Forging confirmed**: a node that does not report forging is a fatal error
//! 4. **Fail fast**: any unreadable status ends the loop

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;

mod error;

pub use config::{WatchdogConfig, DEFAULT_CONFIG_PATH};
pub use error::{Result, WatchdogError};
pub use service::Watchdog;

pub use domain::{
    CommandOutput, CycleReport, ForgingRequest, HeightSample, NodeStatus, Phase, ReloadAssessment,
    RetryPolicy,
};
pub use ports::{ActionExecutor, NodeApi, PeerDirectory, ReleaseSource};
