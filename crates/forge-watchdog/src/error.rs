//! Error types for the watchdog.
//!
//! Every error is fatal for the reconciliation loop. The only place an error
//! is masked is the readiness gate, which retries transient probe failures
//! while the node restarts.

use thiserror::Error;

/// Result type alias for watchdog operations
pub type Result<T> = std::result::Result<T, WatchdogError>;

/// Errors that can occur while supervising the node
#[derive(Debug, Error)]
pub enum WatchdogError {
    /// Invalid or unreadable configuration
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// HTTP transport failure
    #[error("HTTP request to {url} failed: {reason}")]
    Http {
        /// Requested URL
        url: String,
        /// Transport error message
        reason: String,
    },

    /// Malformed payload from the node, a peer, or the manifest
    #[error("Failed to decode {what}: {reason}")]
    Decode {
        /// What was being decoded
        what: &'static str,
        /// Parser error message
        reason: String,
    },

    /// Response envelope carried no entries
    #[error("Empty response from {0}")]
    EmptyResponse(String),

    /// Peer discovery returned no peers to compare against
    #[error("Peer discovery returned no peers")]
    NoPeers,

    /// Delegate registry has no entry for the configured delegate
    #[error("Delegate not found: {0}")]
    DelegateNotFound(String),

    /// Filesystem or process spawn failure
    #[error("I/O error during {context}: {source}")]
    Io {
        /// Operation in progress
        context: String,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// External script exited with a non-success status
    #[error("{action} failed with exit code {code:?}: {output}")]
    ActionFailed {
        /// Action name (update, reload)
        action: &'static str,
        /// Exit code, `None` when killed by a signal
        code: Option<i32>,
        /// Captured output
        output: String,
    },

    /// Node did not report forging after the enable call
    #[error("Could not enable forging")]
    ForgingNotEnabled,

    /// Node was not reachable at startup
    #[error("Node is not reachable at {0}; it must be running before the watchdog starts")]
    NodeUnreachable(String),

    /// Bounded retry gave up
    #[error("Exceeded max retry limit after {attempts} attempts: {last_error}")]
    RetryExhausted {
        /// Attempts performed
        attempts: u32,
        /// Last observed error
        last_error: Box<WatchdogError>,
    },
}

impl WatchdogError {
    /// Check if the error may clear up on its own (node restarting)
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Http { .. })
    }

    pub(crate) fn http(url: impl Into<String>, err: impl std::fmt::Display) -> Self {
        Self::Http {
            url: url.into(),
            reason: err.to_string(),
        }
    }

    pub(crate) fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }
}
