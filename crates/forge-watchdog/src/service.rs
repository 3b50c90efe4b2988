//! Watchdog Service
//!
//! Orchestrates one node: reads the oracles, decides on drift, runs the
//! corrective actions, and keeps forging enabled.
//!
//! ## Cycle
//!
//! ```text
//! needs_update? ──yes──→ update → wait_until_ready → enable_forging
//!       │
//! needs_reload(baseline)? ──yes──→ reload → wait_until_ready → enable_forging
//!       │
//! baseline = missed_blocks() → sleep(interval) → repeat
//! ```
//!
//! The update check always runs before the reload check, and the reload
//! check runs whether or not an update happened. Everything is sequential
//! on the calling task; any error ends the loop.

use std::sync::Arc;

use tracing::{debug, info, info_span, warn, Instrument};

use crate::adapters::{
    build_client, HttpNodeClient, HttpPeerDirectory, HttpReleaseSource, SystemActionExecutor,
};
use crate::config::WatchdogConfig;
use crate::domain::{
    reduce_peer_heights, retry, version_drift, AttemptError, CommandOutput, CycleReport,
    ForgingRequest, Phase, ReloadAssessment,
};
use crate::error::{Result, WatchdogError};
use crate::ports::{ActionExecutor, NodeApi, PeerDirectory, ReleaseSource};

/// Argument passed to the control script
const RELOAD_ARG: &str = "reload";

/// Reconciliation loop for a single forging node.
pub struct Watchdog {
    config: WatchdogConfig,
    node: Arc<dyn NodeApi>,
    peers: Arc<dyn PeerDirectory>,
    releases: Arc<dyn ReleaseSource>,
    executor: Arc<dyn ActionExecutor>,
}

impl Watchdog {
    /// Create a watchdog over explicit ports.
    pub fn new(
        config: WatchdogConfig,
        node: Arc<dyn NodeApi>,
        peers: Arc<dyn PeerDirectory>,
        releases: Arc<dyn ReleaseSource>,
        executor: Arc<dyn ActionExecutor>,
    ) -> Self {
        Self {
            config,
            node,
            peers,
            releases,
            executor,
        }
    }

    /// Create a watchdog wired to the HTTP, filesystem and process adapters.
    pub fn from_config(config: WatchdogConfig) -> Result<Self> {
        let client = build_client()?;
        let node = Arc::new(HttpNodeClient::new(client.clone(), &config.node_url));
        let peers = Arc::new(HttpPeerDirectory::new(
            client.clone(),
            &config.public_node_url,
            config.peer_port,
        ));
        let releases = Arc::new(HttpReleaseSource::new(
            client.clone(),
            config.manifest_path(),
            config.latest_version_url(),
        ));
        let executor = Arc::new(SystemActionExecutor::new(client));
        Ok(Self::new(config, node, peers, releases, executor))
    }

    fn enter(&self, phase: Phase) {
        debug!(%phase, "Phase");
    }

    // ------------------------------------------------------------------
    // Oracles
    // ------------------------------------------------------------------

    /// Version of the installed node software.
    pub async fn installed_version(&self) -> Result<String> {
        self.releases.installed_version().await
    }

    /// Latest published version.
    pub async fn latest_version(&self) -> Result<String> {
        self.releases.latest_version().await
    }

    /// Chain height of the managed node.
    pub async fn local_height(&self) -> Result<u64> {
        Ok(self.node.status().await?.height)
    }

    /// Representative peer height (minimum over the discovered peers).
    pub async fn network_height(&self) -> Result<u64> {
        let peers = self.peers.peers(self.config.peer_limit).await?;
        let height = reduce_peer_heights(&peers).ok_or(WatchdogError::NoPeers)?;
        debug!(peers = peers.len(), height, "Network height");
        Ok(height)
    }

    /// Missed-block counter of the configured delegate.
    pub async fn missed_blocks(&self) -> Result<u64> {
        self.node.missed_blocks(&self.config.delegate).await
    }

    // ------------------------------------------------------------------
    // Drift detectors
    // ------------------------------------------------------------------

    /// Installed version differs from the published one.
    pub async fn needs_update(&self) -> Result<bool> {
        let installed = self.installed_version().await?;
        let latest = self.latest_version().await?;
        let drift = version_drift(&installed, &latest);
        if drift {
            info!(%installed, %latest, "Version drift detected");
        } else {
            debug!(version = %installed, "Node is on the latest version");
        }
        Ok(drift)
    }

    /// Read every input of the reload decision.
    pub async fn assess_reload(&self, baseline: u64) -> Result<ReloadAssessment> {
        let local_height = self.local_height().await?;
        let network_height = self.network_height().await?;
        let missed_blocks = self.missed_blocks().await?;
        Ok(ReloadAssessment {
            local_height,
            network_height,
            missed_blocks,
            baseline,
        })
    }

    /// Node fell behind the network or missed more blocks than `baseline`.
    pub async fn needs_reload(&self, baseline: u64) -> Result<bool> {
        let assessment = self.assess_reload(baseline).await?;
        if assessment.behind_network() {
            warn!(
                height = assessment.local_height,
                network_height = assessment.network_height,
                "Node is behind the network"
            );
        }
        if assessment.missing_blocks() {
            warn!(
                missed_blocks = assessment.missed_blocks,
                baseline, "Delegate missed blocks since last check"
            );
        }
        Ok(assessment.needs_reload())
    }

    // ------------------------------------------------------------------
    // Actions
    // ------------------------------------------------------------------

    fn check_action(action: &'static str, output: CommandOutput) -> Result<()> {
        if !output.is_success() {
            return Err(WatchdogError::ActionFailed {
                action,
                code: output.exit_code,
                output: output.diagnostics().to_string(),
            });
        }
        if !output.stdout.trim().is_empty() {
            info!(action, output = %output.stdout.trim_end(), "Script output");
        }
        Ok(())
    }

    /// Download the installer and run it in upgrade mode.
    ///
    /// A failed run leaves the downloaded script in place for inspection.
    pub async fn update(&self) -> Result<()> {
        let script = self.config.installer_path();
        self.executor
            .fetch_script(&self.config.installer_url(), &script)
            .await?;
        info!(script = %script.display(), "[watchdog] Beginning node update...");
        let output = self
            .executor
            .run(&script, &self.config.installer_args())
            .await?;
        Self::check_action("update", output)?;
        info!("[watchdog] Update complete");
        Ok(())
    }

    /// Restart the node through its control script.
    pub async fn reload(&self) -> Result<()> {
        let script = self.config.control_script_path();
        info!(script = %script.display(), "[watchdog] Reloading node...");
        let output = self
            .executor
            .run(&script, &[RELOAD_ARG.to_string()])
            .await?;
        Self::check_action("reload", output)
    }

    /// Enable forging and confirm the node reports it.
    pub async fn enable_forging(&self) -> Result<()> {
        let forging = self
            .node
            .set_forging(ForgingRequest {
                forging: true,
                public_key: self.config.public_key.clone(),
                password: self.config.password.clone(),
            })
            .await?;
        if !forging {
            return Err(WatchdogError::ForgingNotEnabled);
        }
        info!("[watchdog] Forging is enabled");
        Ok(())
    }

    /// Block until the node API answers, or give up.
    ///
    /// Returns the number of probes it took.
    pub async fn wait_until_ready(&self) -> Result<u32> {
        let node = &self.node;
        let policy = self.config.readiness_policy();
        let outcome = retry(policy, |attempt| async move {
            debug!(attempt, "Probing node API");
            node.probe().await.map_err(|e| {
                if e.is_transient() {
                    AttemptError::retry(e)
                } else {
                    AttemptError::abort(e)
                }
            })
        })
        .await
        .map_err(|exhausted| WatchdogError::RetryExhausted {
            attempts: exhausted.attempts,
            last_error: Box::new(exhausted.last_error),
        })?;
        info!(attempts = outcome.attempts_used, "[watchdog] Node API is ready");
        Ok(outcome.attempts_used)
    }

    async fn recover(&self) -> Result<()> {
        self.enter(Phase::AwaitingReady);
        self.wait_until_ready().await?;
        self.enter(Phase::ReassertingForging);
        self.enable_forging().await
    }

    // ------------------------------------------------------------------
    // Loop
    // ------------------------------------------------------------------

    /// Startup checks; returns the initial missed-block baseline.
    pub async fn start(&self) -> Result<u64> {
        info!(config = ?self.config, "[watchdog] Starting");
        if let Err(e) = self.node.probe().await {
            debug!(error = %e, "Startup probe failed");
            return Err(WatchdogError::NodeUnreachable(self.config.node_url.clone()));
        }
        let forging = self.node.forging_status().await?;
        info!(forging, "Current forging status");
        let baseline = self.missed_blocks().await?;
        info!(baseline, delegate = %self.config.delegate, "Initial missed-block baseline");
        Ok(baseline)
    }

    /// One reconciliation cycle against `baseline`.
    pub async fn reconcile(&self, baseline: u64) -> Result<CycleReport> {
        let mut report = CycleReport {
            updated: false,
            reloaded: false,
            baseline,
        };

        self.enter(Phase::CheckingUpdate);
        if self.needs_update().await? {
            self.enter(Phase::Updating);
            self.update().await?;
            self.recover().await?;
            report.updated = true;
        }

        // Not an else-branch: an update may itself leave the node behind.
        self.enter(Phase::CheckingReload);
        if self.needs_reload(baseline).await? {
            self.enter(Phase::Reloading);
            self.reload().await?;
            self.recover().await?;
            report.reloaded = true;
        }

        self.enter(Phase::UpdatingBaseline);
        report.baseline = self.missed_blocks().await?;
        Ok(report)
    }

    /// Run until a fatal error.
    pub async fn run(&self) -> Result<()> {
        let mut baseline = self.start().await?;
        let interval = self.config.check_interval();
        let mut cycle: u64 = 0;
        loop {
            cycle += 1;
            self.enter(Phase::Idle);
            let report = self
                .reconcile(baseline)
                .instrument(info_span!("reconcile", cycle))
                .await?;
            baseline = report.baseline;
            info!(
                cycle,
                updated = report.updated,
                reloaded = report.reloaded,
                baseline,
                at = %chrono::Utc::now().to_rfc3339(),
                "cycle complete"
            );

            self.enter(Phase::Sleeping);
            tokio::time::sleep(interval).await;
        }
    }
}
