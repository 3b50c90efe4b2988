//! # Watchdog Configuration
//!
//! Loaded once at startup from a JSON file and read-only afterwards.
//!
//! ## File format
//!
//! ```json
//! {
//!   "NodeURL": "http://127.0.0.1:7000",
//!   "PublicKey": "<delegate public key>",
//!   "Password": "<forging password, not the wallet passphrase>",
//!   "Delegate": "genesis_1",
//!   "HomePath": "/home/lisk",
//!   "InstallationPath": "/home/lisk/lisk-test",
//!   "PublicNodeURL": "https://testnet.lisk.io"
//! }
//! ```
//!
//! Optional keys: `ReleaseChannel`, `DownloadsURL`, `PeerPort`, `PeerLimit`,
//! `CheckIntervalSecs`, `ReadinessAttempts`, `ReadinessDelaySecs`.
//!
//! ## Environment overrides
//!
//! - `WATCHDOG_NODE_URL`
//! - `WATCHDOG_PUBLIC_NODE_URL`
//! - `WATCHDOG_FORGING_PASSWORD`

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use tracing::info;

use crate::domain::RetryPolicy;
use crate::error::{Result, WatchdogError};

/// Default configuration file, relative to the working directory
pub const DEFAULT_CONFIG_PATH: &str = "config.json";

/// Installer script name under the home directory
pub const INSTALLER_SCRIPT: &str = "installLisk.sh";

/// Control script name under the installation directory
pub const CONTROL_SCRIPT: &str = "lisk.sh";

/// Installation manifest name
pub const MANIFEST_FILE: &str = "package.json";

fn default_release_channel() -> String {
    "test".to_string()
}

fn default_downloads_url() -> String {
    "https://downloads.lisk.io/lisk".to_string()
}

fn default_peer_port() -> u16 {
    7000
}

fn default_peer_limit() -> u32 {
    100
}

fn default_check_interval_secs() -> u64 {
    5
}

fn default_readiness_attempts() -> u32 {
    crate::domain::READINESS_MAX_ATTEMPTS
}

fn default_readiness_delay_secs() -> u64 {
    crate::domain::READINESS_DELAY.as_secs()
}

/// Complete watchdog configuration.
#[derive(Clone, Deserialize)]
pub struct WatchdogConfig {
    /// Base URL of the managed node API.
    #[serde(rename = "NodeURL")]
    pub node_url: String,
    /// Delegate public key used to enable forging.
    #[serde(rename = "PublicKey")]
    pub public_key: String,
    /// Forging password.
    #[serde(rename = "Password")]
    pub password: String,
    /// Delegate username in the registry.
    #[serde(rename = "Delegate")]
    pub delegate: String,
    /// Home directory; the installer is downloaded here.
    #[serde(rename = "HomePath")]
    pub home_path: PathBuf,
    /// Node installation directory.
    #[serde(rename = "InstallationPath")]
    pub installation_path: PathBuf,
    /// Public node used for peer discovery (scheme and host, no port).
    #[serde(rename = "PublicNodeURL")]
    pub public_node_url: String,
    /// Release channel passed to the installer.
    #[serde(rename = "ReleaseChannel", default = "default_release_channel")]
    pub release_channel: String,
    /// Base URL of the release downloads.
    #[serde(rename = "DownloadsURL", default = "default_downloads_url")]
    pub downloads_url: String,
    /// Peer API port on the public node.
    #[serde(rename = "PeerPort", default = "default_peer_port")]
    pub peer_port: u16,
    /// Maximum peers requested per discovery query.
    #[serde(rename = "PeerLimit", default = "default_peer_limit")]
    pub peer_limit: u32,
    /// Sleep between reconciliation cycles.
    #[serde(rename = "CheckIntervalSecs", default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Readiness probes before giving up.
    #[serde(rename = "ReadinessAttempts", default = "default_readiness_attempts")]
    pub readiness_attempts: u32,
    /// Seconds between readiness probes.
    #[serde(rename = "ReadinessDelaySecs", default = "default_readiness_delay_secs")]
    pub readiness_delay_secs: u64,
}

impl std::fmt::Debug for WatchdogConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchdogConfig")
            .field("node_url", &self.node_url)
            .field("public_key", &self.public_key)
            .field("password", &"<redacted>")
            .field("delegate", &self.delegate)
            .field("home_path", &self.home_path)
            .field("installation_path", &self.installation_path)
            .field("public_node_url", &self.public_node_url)
            .field("release_channel", &self.release_channel)
            .field("downloads_url", &self.downloads_url)
            .field("peer_port", &self.peer_port)
            .field("peer_limit", &self.peer_limit)
            .field("check_interval_secs", &self.check_interval_secs)
            .field("readiness_attempts", &self.readiness_attempts)
            .field("readiness_delay_secs", &self.readiness_delay_secs)
            .finish()
    }
}

impl WatchdogConfig {
    /// Load, apply environment overrides, and validate.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        Self::load_with(path, |key| std::env::var(key).ok())
    }

    /// [`load`](Self::load) with overrides taken from `lookup`.
    pub fn load_with(
        path: impl AsRef<Path>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|e| {
            WatchdogError::Config(format!("cannot read {}: {}", path.display(), e))
        })?;
        let mut config = Self::from_json(&raw)?;
        config.apply_overrides(lookup);
        config.validate()?;
        Ok(config)
    }

    /// Parse without overrides or validation.
    pub fn from_json(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).map_err(|e| WatchdogError::Config(e.to_string()))
    }

    /// Override fields from a key lookup (the process environment in production).
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup("WATCHDOG_NODE_URL") {
            info!("Node URL overridden from environment");
            self.node_url = url;
        }
        if let Some(url) = lookup("WATCHDOG_PUBLIC_NODE_URL") {
            info!("Public node URL overridden from environment");
            self.public_node_url = url;
        }
        if let Some(password) = lookup("WATCHDOG_FORGING_PASSWORD") {
            info!("Loaded forging password from environment");
            self.password = password;
        }
    }

    /// Reject configurations the watchdog cannot operate with.
    pub fn validate(&self) -> Result<()> {
        let required = [
            ("NodeURL", self.node_url.as_str()),
            ("PublicKey", self.public_key.as_str()),
            ("Password", self.password.as_str()),
            ("Delegate", self.delegate.as_str()),
            ("PublicNodeURL", self.public_node_url.as_str()),
            ("ReleaseChannel", self.release_channel.as_str()),
        ];
        for (key, value) in required {
            if value.trim().is_empty() {
                return Err(WatchdogError::Config(format!("{} must not be empty", key)));
            }
        }
        if self.home_path.as_os_str().is_empty() {
            return Err(WatchdogError::Config("HomePath must not be empty".into()));
        }
        if self.installation_path.as_os_str().is_empty() {
            return Err(WatchdogError::Config(
                "InstallationPath must not be empty".into(),
            ));
        }
        for (key, url) in [
            ("NodeURL", &self.node_url),
            ("PublicNodeURL", &self.public_node_url),
            ("DownloadsURL", &self.downloads_url),
        ] {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(WatchdogError::Config(format!(
                    "{} must start with http:// or https://, got {:?}",
                    key, url
                )));
            }
        }
        if self.peer_limit == 0 {
            return Err(WatchdogError::Config("PeerLimit must be at least 1".into()));
        }
        if self.readiness_attempts == 0 {
            return Err(WatchdogError::Config(
                "ReadinessAttempts must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Resource holding the latest published version.
    pub fn latest_version_url(&self) -> String {
        format!(
            "{}/{}/latest.txt",
            self.downloads_url.trim_end_matches('/'),
            self.release_channel
        )
    }

    /// Installer download location.
    pub fn installer_url(&self) -> String {
        format!(
            "{}/{}/{}",
            self.downloads_url.trim_end_matches('/'),
            self.release_channel,
            INSTALLER_SCRIPT
        )
    }

    pub fn installer_path(&self) -> PathBuf {
        self.home_path.join(INSTALLER_SCRIPT)
    }

    pub fn control_script_path(&self) -> PathBuf {
        self.installation_path.join(CONTROL_SCRIPT)
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.installation_path.join(MANIFEST_FILE)
    }

    /// Installer arguments: upgrade, release channel, home directory, non-interactive.
    pub fn installer_args(&self) -> Vec<String> {
        vec![
            "upgrade".to_string(),
            "-r".to_string(),
            self.release_channel.clone(),
            "-d".to_string(),
            self.home_path.display().to_string(),
            "-0".to_string(),
            "no".to_string(),
        ]
    }

    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn readiness_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.readiness_attempts,
            Duration::from_secs(self.readiness_delay_secs),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "NodeURL": "http://127.0.0.1:7000",
        "PublicKey": "c094ebee7ec0c50ebee32918655e089f6e1a604b83bcaa760293c61e0f18ab6f",
        "Password": "forging-secret",
        "Delegate": "genesis_17",
        "HomePath": "/home/lisk",
        "InstallationPath": "/home/lisk/lisk-test",
        "PublicNodeURL": "https://testnet.lisk.io"
    }"#;

    fn minimal() -> WatchdogConfig {
        WatchdogConfig::from_json(MINIMAL).unwrap()
    }

    #[test]
    fn test_defaults_applied() {
        let config = minimal();
        assert_eq!(config.release_channel, "test");
        assert_eq!(config.peer_port, 7000);
        assert_eq!(config.peer_limit, 100);
        assert_eq!(config.check_interval(), Duration::from_secs(5));
        assert_eq!(config.readiness_policy(), RetryPolicy::readiness());
        config.validate().unwrap();
    }

    #[test]
    fn test_derived_locations() {
        let config = minimal();
        assert_eq!(
            config.latest_version_url(),
            "https://downloads.lisk.io/lisk/test/latest.txt"
        );
        assert_eq!(
            config.installer_url(),
            "https://downloads.lisk.io/lisk/test/installLisk.sh"
        );
        assert_eq!(config.installer_path(), PathBuf::from("/home/lisk/installLisk.sh"));
        assert_eq!(
            config.control_script_path(),
            PathBuf::from("/home/lisk/lisk-test/lisk.sh")
        );
        assert_eq!(
            config.manifest_path(),
            PathBuf::from("/home/lisk/lisk-test/package.json")
        );
    }

    #[test]
    fn test_installer_args() {
        assert_eq!(
            minimal().installer_args(),
            vec!["upgrade", "-r", "test", "-d", "/home/lisk", "-0", "no"]
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let rendered = format!("{:?}", minimal());
        assert!(!rendered.contains("forging-secret"));
        assert!(rendered.contains("<redacted>"));
    }

    #[test]
    fn test_missing_required_key() {
        let err = WatchdogConfig::from_json(r#"{"NodeURL": "http://x"}"#).unwrap_err();
        assert!(matches!(err, WatchdogError::Config(_)));
    }

    #[test]
    fn test_validate_rejects_empty_and_bad_urls() {
        let mut config = minimal();
        config.delegate = "  ".to_string();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.node_url = "127.0.0.1:7000".to_string();
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.readiness_attempts = 0;
        assert!(config.validate().is_err());

        let mut config = minimal();
        config.peer_limit = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_overrides() {
        let mut config = minimal();
        config.apply_overrides(|key| match key {
            "WATCHDOG_NODE_URL" => Some("http://10.0.0.5:7000".to_string()),
            "WATCHDOG_FORGING_PASSWORD" => Some("from-env".to_string()),
            _ => None,
        });
        assert_eq!(config.node_url, "http://10.0.0.5:7000");
        assert_eq!(config.password, "from-env");
        assert_eq!(config.public_node_url, "https://testnet.lisk.io");
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let config = WatchdogConfig::load_with(file.path(), |_| None).unwrap();
        assert_eq!(config.delegate, "genesis_17");
        assert_eq!(config.node_url, "http://127.0.0.1:7000");
    }

    #[test]
    fn test_load_validates_after_overrides() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();
        let err = WatchdogConfig::load_with(file.path(), |key| {
            (key == "WATCHDOG_NODE_URL").then(|| "localhost:7000".to_string())
        })
        .unwrap_err();
        assert!(matches!(err, WatchdogError::Config(_)));
    }

    #[test]
    fn test_load_missing_file() {
        let err = WatchdogConfig::load_with("/nonexistent/config.json", |_| None).unwrap_err();
        assert!(err.to_string().contains("cannot read"));
    }
}
