//! Values exchanged between the watchdog and its collaborators

use serde::Serialize;

/// Chain height reported by one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeightSample {
    /// Peer address
    pub source: String,
    /// Chain height
    pub height: u64,
}

impl HeightSample {
    pub fn new(source: impl Into<String>, height: u64) -> Self {
        Self {
            source: source.into(),
            height,
        }
    }
}

/// Status of the managed node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct NodeStatus {
    /// Current chain height
    pub height: u64,
}

/// Forging mutation sent to the node
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgingRequest {
    pub forging: bool,
    pub public_key: String,
    pub password: String,
}

impl std::fmt::Debug for ForgingRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ForgingRequest")
            .field("forging", &self.forging)
            .field("public_key", &self.public_key)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Exit status and captured output of an external script
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CommandOutput {
    /// Exit code, `None` if the process was killed by a signal
    pub exit_code: Option<i32>,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>) -> Self {
        Self {
            exit_code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    pub fn failure(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            exit_code: Some(exit_code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.exit_code == Some(0)
    }

    /// Text worth showing when the script failed: stderr, else stdout
    pub fn diagnostics(&self) -> &str {
        if self.stderr.trim().is_empty() {
            self.stdout.trim()
        } else {
            self.stderr.trim()
        }
    }
}

/// Phases of one reconciliation cycle
///
/// ```text
/// Idle → CheckingUpdate ─drift→ Updating → AwaitingReady → ReassertingForging
///              │                                                 │
///              └──────────────→ CheckingReload ←──────────────────┘
///                                  │
///                                  ├─drift→ Reloading → AwaitingReady → ReassertingForging
///                                  ↓                                          │
///                           UpdatingBaseline ←─────────────────────────────────┘
///                                  ↓
///                              Sleeping → Idle
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    CheckingUpdate,
    Updating,
    CheckingReload,
    Reloading,
    AwaitingReady,
    ReassertingForging,
    UpdatingBaseline,
    Sleeping,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Phase::Idle => "idle",
            Phase::CheckingUpdate => "checking_update",
            Phase::Updating => "updating",
            Phase::CheckingReload => "checking_reload",
            Phase::Reloading => "reloading",
            Phase::AwaitingReady => "awaiting_ready",
            Phase::ReassertingForging => "reasserting_forging",
            Phase::UpdatingBaseline => "updating_baseline",
            Phase::Sleeping => "sleeping",
        };
        f.write_str(name)
    }
}

/// Summary of one reconciliation cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// An update was installed
    pub updated: bool,
    /// The node was reloaded
    pub reloaded: bool,
    /// Missed-block baseline for the next cycle
    pub baseline: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_forging_request_wire_format() {
        let req = ForgingRequest {
            forging: true,
            public_key: "abc".to_string(),
            password: "secret".to_string(),
        };
        let json = serde_json::to_value(&req).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"forging": true, "publicKey": "abc", "password": "secret"})
        );
        assert!(!format!("{:?}", req).contains("secret"));
    }

    #[test]
    fn test_command_output_success() {
        assert!(CommandOutput::success("ok").is_success());
        assert!(!CommandOutput::failure(1, "boom").is_success());
        assert!(!CommandOutput::default().is_success());
    }

    #[test]
    fn test_command_output_diagnostics() {
        assert_eq!(CommandOutput::failure(1, "boom\n").diagnostics(), "boom");
        let out = CommandOutput {
            exit_code: Some(2),
            stdout: "partial log\n".to_string(),
            stderr: " ".to_string(),
        };
        assert_eq!(out.diagnostics(), "partial log");
    }
}
