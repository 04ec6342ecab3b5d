//! CLI error types with miette diagnostics.
//!
//! Maps `CoreError` and `ConfigError` into user-facing errors with help text.

use miette::Diagnostic;
use thiserror::Error;

use stackport_config::ConfigError;
use stackport_core::CoreError;

/// Process exit codes.
pub mod exit_code {
    pub const GENERAL: i32 = 1;
    pub const USAGE: i32 = 2;
    pub const AUTH: i32 = 3;
    pub const CONNECTION: i32 = 7;
    pub const TIMEOUT: i32 = 8;
    pub const PARTIAL: i32 = 9;
}

#[derive(Debug, Error, Diagnostic)]
pub enum CliError {
    // ── Legacy device ────────────────────────────────────────────────
    #[error("Could not connect to {address}")]
    #[diagnostic(
        code(stackport::connection_failed),
        help("Check that SSH is reachable on the device and that [device].port is correct.\n{reason}")
    )]
    ConnectionFailed { address: String, reason: String },

    #[error("Timed out after {seconds}s talking to {address}")]
    #[diagnostic(
        code(stackport::timeout),
        help("Raise [device].connect_timeout_secs or read_timeout_secs in the config file.")
    )]
    Timeout { address: String, seconds: u64 },

    #[error("Could not read `{command}` from {address}")]
    #[diagnostic(code(stackport::retrieval), help("{reason}"))]
    Retrieval {
        address: String,
        command: String,
        reason: String,
    },

    // ── Authentication ───────────────────────────────────────────────
    #[error("{message}")]
    #[diagnostic(
        code(stackport::auth_failed),
        help(
            "Device logins come from --username/--ask-password and\n\
             STACKPORT_USERNAME_N / STACKPORT_PASSWORD_N, tried in order."
        )
    )]
    DeviceAuth { message: String },

    #[error("Dashboard rejected the API key")]
    #[diagnostic(
        code(stackport::dashboard_auth),
        help("Check the key and that it has write access to the organization.")
    )]
    DashboardAuth,

    #[error("No {what} configured")]
    #[diagnostic(code(stackport::no_credentials))]
    NoCredentials { what: String },

    // ── Dashboard API ────────────────────────────────────────────────
    #[error("Dashboard API error: {message}")]
    #[diagnostic(code(stackport::api_error))]
    Api { message: String },

    // ── Input ────────────────────────────────────────────────────────
    #[error("Invalid value for {field}: {reason}")]
    #[diagnostic(code(stackport::validation))]
    Validation { field: String, reason: String },

    #[error("{0}")]
    #[diagnostic(code(stackport::precondition))]
    Precondition(String),

    #[error("Could not read {path}")]
    #[diagnostic(code(stackport::io))]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid records in {path}")]
    #[diagnostic(
        code(stackport::records),
        help("Record files are written by `stackport capture status|mac`.")
    )]
    Records {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    // ── Configuration ────────────────────────────────────────────────
    #[error(transparent)]
    #[diagnostic(code(stackport::config))]
    Config(ConfigError),

    // ── Outcome ──────────────────────────────────────────────────────
    #[error("{failed} of {total} item(s) failed")]
    #[diagnostic(
        code(stackport::partial_failure),
        help("The report above lists each failure; rerun after fixing them.")
    )]
    PartialFailure { failed: usize, total: usize },

    // ── IO / Serialization ───────────────────────────────────────────
    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("Serialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl CliError {
    /// Map this error to an exit code for process termination.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConnectionFailed { .. } | Self::Retrieval { .. } => exit_code::CONNECTION,
            Self::Timeout { .. } => exit_code::TIMEOUT,
            Self::DeviceAuth { .. } | Self::DashboardAuth | Self::NoCredentials { .. } => {
                exit_code::AUTH
            }
            Self::Validation { .. } | Self::Precondition(_) => exit_code::USAGE,
            Self::PartialFailure { .. } => exit_code::PARTIAL,
            _ => exit_code::GENERAL,
        }
    }
}

// ── Conversions ──────────────────────────────────────────────────────

impl From<CoreError> for CliError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Connectivity { address, reason } => {
                Self::ConnectionFailed { address, reason }
            }
            CoreError::Timeout {
                address,
                timeout_secs,
            } => Self::Timeout {
                address,
                seconds: timeout_secs,
            },
            e @ (CoreError::AllCredentialsFailed { .. } | CoreError::NoCredentials { .. }) => {
                Self::DeviceAuth {
                    message: e.to_string(),
                }
            }
            CoreError::Retrieval {
                address,
                command,
                reason,
            } => Self::Retrieval {
                address,
                command,
                reason,
            },
            CoreError::Precondition { message } => Self::Precondition(message),
            CoreError::DashboardAuth => Self::DashboardAuth,
            CoreError::Api { message, status } => Self::Api {
                message: match status {
                    Some(code) => format!("HTTP {code}: {message}"),
                    None => message,
                },
            },
            CoreError::Config { message } => Self::Validation {
                field: "config".into(),
                reason: message,
            },
            CoreError::Internal(message) => Self::Internal(message),
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(err: ConfigError) -> Self {
        match err {
            ConfigError::NoCredentials { what } => Self::NoCredentials { what },
            ConfigError::Validation { field, reason } => Self::Validation { field, reason },
            other => Self::Config(other),
        }
    }
}
