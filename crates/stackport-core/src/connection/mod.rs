// ── Legacy device connection layer ──
//
// Opens an authenticated CLI session to a legacy switch, trying each
// credential in order, and runs a single command over it. The transport is
// abstracted behind `CliConnector` / `CliSession`; `ssh::SshConnector` is
// the production implementation.

pub mod ssh;

use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::credential::Credential;
use crate::error::CoreError;
use crate::records::{
    self, InterfaceStatusRecord, MacTableRecord, StructuredCommand,
};

/// Command that returns the full running configuration.
pub const RUNNING_CONFIG_COMMAND: &str = "show running-config";
/// Command used for interface status snapshots.
pub const INTERFACE_STATUS_COMMAND: &str = "show ip interface brief";
/// Command used for MAC table snapshots.
pub const MAC_TABLE_COMMAND: &str = "show mac address-table";

pub const DEFAULT_CONNECT_TIMEOUT: Duration = Duration::from_secs(60);
pub const DEFAULT_READ_TIMEOUT: Duration = Duration::from_secs(120);
/// MAC tables on large stacks take longer to print.
pub const MAC_TABLE_READ_TIMEOUT: Duration = Duration::from_secs(90);

// ── Device profile ──────────────────────────────────────────────────

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum CliPlatform {
    #[default]
    CiscoIos,
}

/// How to reach a legacy device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceProfile {
    pub platform: CliPlatform,
    pub port: u16,
    pub connect_timeout: Duration,
    pub read_timeout: Duration,
    /// SHA-256 host key fingerprint to pin. Any key is accepted when unset.
    pub host_key_fingerprint: Option<String>,
}

impl Default for DeviceProfile {
    fn default() -> Self {
        Self {
            platform: CliPlatform::CiscoIos,
            port: 22,
            connect_timeout: DEFAULT_CONNECT_TIMEOUT,
            read_timeout: DEFAULT_READ_TIMEOUT,
            host_key_fingerprint: None,
        }
    }
}

// ── Transport seam ──────────────────────────────────────────────────

/// Why a single connection attempt failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AttemptFailure {
    #[error("authentication rejected: {0}")]
    Auth(String),
    #[error("timed out")]
    Timeout,
    #[error("{0}")]
    Unexpected(String),
}

/// Errors raised on an established session.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("{operation} timed out after {timeout_secs}s")]
    Timeout { operation: String, timeout_secs: u64 },
    #[error("session closed by device")]
    Closed,
    #[error("channel error: {0}")]
    Channel(String),
    #[error("device rejected `{command}`: {output}")]
    Rejected { command: String, output: String },
}

/// Opens CLI sessions to legacy devices.
#[async_trait]
pub trait CliConnector: Send + Sync {
    async fn open(
        &self,
        address: &str,
        credential: &Credential,
        profile: &DeviceProfile,
    ) -> Result<Box<dyn CliSession>, AttemptFailure>;
}

/// An authenticated interactive CLI session.
#[async_trait]
pub trait CliSession: Send {
    /// Enter privileged mode. A no-op when already privileged.
    async fn enable(&mut self, secret: Option<&SecretString>) -> Result<(), SessionError>;

    /// Hostname as shown in the device prompt.
    async fn hostname(&mut self) -> Result<String, SessionError>;

    /// Run `command` and return its output without echo or prompt.
    async fn send_command(
        &mut self,
        command: &str,
        read_timeout: Duration,
    ) -> Result<String, SessionError>;

    /// Persist the running configuration.
    async fn save_config(&mut self) -> Result<(), SessionError>;

    async fn close(&mut self);
}

// ── Credential fallback ─────────────────────────────────────────────

/// Result of one attempt, classified for the fallback loop.
pub enum AttemptOutcome {
    Connected(Box<dyn CliSession>),
    /// Try the next credential.
    AuthFailed(String),
    /// Abort without trying further credentials.
    Fatal(AttemptFailure),
}

impl From<Result<Box<dyn CliSession>, AttemptFailure>> for AttemptOutcome {
    fn from(result: Result<Box<dyn CliSession>, AttemptFailure>) -> Self {
        match result {
            Ok(session) => Self::Connected(session),
            Err(AttemptFailure::Auth(reason)) => Self::AuthFailed(reason),
            Err(other) => Self::Fatal(other),
        }
    }
}

/// An open session and the credential that opened it.
pub struct Connection {
    pub session: Box<dyn CliSession>,
    pub credential: Credential,
}

impl std::fmt::Debug for Connection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Connection")
            .field("credential", &self.credential.masked())
            .finish_non_exhaustive()
    }
}

/// Try `credentials` in order until one authenticates.
///
/// An authentication rejection moves on to the next credential. A timeout
/// or any other failure aborts immediately: the device is unreachable and
/// further attempts would fail the same way.
pub async fn connect(
    connector: &dyn CliConnector,
    address: &str,
    credentials: &[Credential],
    profile: &DeviceProfile,
) -> Result<Connection, CoreError> {
    if credentials.is_empty() {
        return Err(CoreError::NoCredentials {
            address: address.to_owned(),
        });
    }

    for (attempt, credential) in credentials.iter().enumerate() {
        debug!(address, attempt = attempt + 1, identity = %credential.masked(), "connecting");
        let outcome = match tokio::time::timeout(
            profile.connect_timeout,
            connector.open(address, credential, profile),
        )
        .await
        {
            Ok(result) => AttemptOutcome::from(result),
            Err(_elapsed) => AttemptOutcome::Fatal(AttemptFailure::Timeout),
        };

        match outcome {
            AttemptOutcome::Connected(session) => {
                info!(address, identity = %credential.masked(), "connected");
                return Ok(Connection {
                    session,
                    credential: credential.clone(),
                });
            }
            AttemptOutcome::AuthFailed(reason) => {
                warn!(address, identity = %credential.masked(), %reason, "authentication failed");
            }
            AttemptOutcome::Fatal(AttemptFailure::Timeout) => {
                warn!(address, "connection timed out");
                return Err(CoreError::Timeout {
                    address: address.to_owned(),
                    timeout_secs: profile.connect_timeout.as_secs(),
                });
            }
            AttemptOutcome::Fatal(failure) => {
                warn!(address, error = %failure, "connection failed");
                return Err(CoreError::Connectivity {
                    address: address.to_owned(),
                    reason: failure.to_string(),
                });
            }
        }
    }

    Err(CoreError::AllCredentialsFailed {
        address: address.to_owned(),
        attempts: credentials.len(),
    })
}

// ── Command retrieval ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetrieveOptions {
    pub read_timeout: Duration,
    /// Parse the output into records instead of returning raw text.
    pub structured: bool,
}

impl Default for RetrieveOptions {
    fn default() -> Self {
        Self {
            read_timeout: DEFAULT_READ_TIMEOUT,
            structured: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum CommandOutput {
    Text(String),
    InterfaceStatus(Vec<InterfaceStatusRecord>),
    MacTable(Vec<MacTableRecord>),
}

impl CommandOutput {
    pub fn into_text(self) -> Option<String> {
        match self {
            Self::Text(text) => Some(text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Retrieved {
    pub hostname: String,
    pub output: CommandOutput,
    /// Username of the credential that succeeded.
    pub username: String,
}

/// Whether `command` dumps the running configuration, which triggers a save.
pub fn is_running_config_command(command: &str) -> bool {
    command.contains("running-config")
}

/// Connect, run one command and close the session.
///
/// When `options.structured` is set the command must have a known parser.
/// Running-configuration retrievals also save the configuration.
pub async fn retrieve(
    connector: &dyn CliConnector,
    address: &str,
    credentials: &[Credential],
    profile: &DeviceProfile,
    command: &str,
    options: RetrieveOptions,
) -> Result<Retrieved, CoreError> {
    let parser = if options.structured {
        Some(StructuredCommand::detect(command).ok_or_else(|| {
            CoreError::precondition(format!("no structured parser for `{command}`"))
        })?)
    } else {
        None
    };

    let mut connection = connect(connector, address, credentials, profile).await?;
    let result = run_command(&mut connection, command, options.read_timeout, parser).await;
    connection.session.close().await;

    result.map_err(|e| CoreError::Retrieval {
        address: address.to_owned(),
        command: command.to_owned(),
        reason: e.to_string(),
    })
}

async fn run_command(
    connection: &mut Connection,
    command: &str,
    read_timeout: Duration,
    parser: Option<StructuredCommand>,
) -> Result<Retrieved, SessionError> {
    let session = connection.session.as_mut();
    session
        .enable(connection.credential.enable_secret.as_ref())
        .await?;
    let hostname = session.hostname().await?;
    let text = session.send_command(command, read_timeout).await?;
    debug!(%hostname, command, bytes = text.len(), "command output received");

    let output = match parser {
        None => CommandOutput::Text(text),
        Some(StructuredCommand::InterfaceBrief) => {
            CommandOutput::InterfaceStatus(records::parse_interface_brief(&text))
        }
        Some(StructuredCommand::InterfacesStatus) => {
            CommandOutput::InterfaceStatus(records::parse_interfaces_status(&text))
        }
        Some(StructuredCommand::MacAddressTable) => {
            CommandOutput::MacTable(records::parse_mac_table(&text))
        }
    };

    if is_running_config_command(command) {
        session.save_config().await?;
        info!(%hostname, "configuration saved");
    }

    Ok(Retrieved {
        hostname,
        output,
        username: connection.credential.username.clone(),
    })
}
