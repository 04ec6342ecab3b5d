// ── Core error types ──
//
// Fatal, run-aborting errors from stackport-core. Per-port problems
// (unparseable names, unmapped stack members, rejected updates) are not
// errors at this level: they are collected as report entries instead.
// The `From<stackport_api::Error>` impl translates transport-layer errors.

use thiserror::Error;

/// Unified error type for the core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    // ── Legacy device errors ─────────────────────────────────────────
    #[error("Cannot connect to {address}: {reason}")]
    Connectivity { address: String, reason: String },

    #[error("Connection to {address} timed out after {timeout_secs}s")]
    Timeout { address: String, timeout_secs: u64 },

    #[error("All {attempts} credential(s) were rejected by {address}")]
    AllCredentialsFailed { address: String, attempts: usize },

    #[error("No credentials supplied for {address}")]
    NoCredentials { address: String },

    #[error("Failed to retrieve `{command}` from {address}: {reason}")]
    Retrieval {
        address: String,
        command: String,
        reason: String,
    },

    // ── Input errors ─────────────────────────────────────────────────
    #[error("Precondition failed: {message}")]
    Precondition { message: String },

    // ── Dashboard errors (wrapped, not exposed raw) ──────────────────
    #[error("Dashboard rejected the API key")]
    DashboardAuth,

    #[error("Dashboard API error: {message}")]
    Api {
        message: String,
        /// HTTP status code (if applicable).
        status: Option<u16>,
    },

    // ── Configuration errors ─────────────────────────────────────────
    #[error("Configuration error: {message}")]
    Config { message: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CoreError {
    pub(crate) fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition {
            message: message.into(),
        }
    }

    /// Returns `true` for failures caused by an unreachable legacy device.
    pub fn is_connectivity(&self) -> bool {
        matches!(self, Self::Connectivity { .. } | Self::Timeout { .. })
    }

    /// Returns `true` for credential problems on either side.
    pub fn is_authentication(&self) -> bool {
        matches!(
            self,
            Self::AllCredentialsFailed { .. } | Self::NoCredentials { .. } | Self::DashboardAuth
        )
    }
}

// ── Conversion from transport-layer errors ───────────────────────────

impl From<stackport_api::Error> for CoreError {
    fn from(err: stackport_api::Error) -> Self {
        let status = err.status();
        match err {
            stackport_api::Error::InvalidApiKey => CoreError::DashboardAuth,
            stackport_api::Error::InvalidUrl(e) => CoreError::Config {
                message: format!("Invalid dashboard URL: {e}"),
            },
            stackport_api::Error::Tls(msg) => CoreError::Config {
                message: format!("TLS setup failed: {msg}"),
            },
            other => CoreError::Api {
                message: other.to_string(),
                status,
            },
        }
    }
}
