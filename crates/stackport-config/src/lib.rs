//! Configuration for the stackport CLI.
//!
//! Layered TOML + environment configuration, the ordered device credential
//! source, dashboard API key resolution, and translation into the core's
//! `DeviceProfile`, `TransportConfig` and `MacFilterPolicy`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use directories::ProjectDirs;
use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stackport_core::{
    CliPlatform, Credential, DeviceProfile, MacFilterPolicy, TlsMode, TransportConfig,
};

pub const ENV_PREFIX: &str = "STACKPORT_";
pub const USERNAME_ENV_PREFIX: &str = "STACKPORT_USERNAME_";
pub const PASSWORD_ENV_PREFIX: &str = "STACKPORT_PASSWORD_";
pub const ENABLE_SECRET_ENV: &str = "STACKPORT_ENABLE_SECRET";

// ── Error ───────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("invalid {field}: {reason}")]
    Validation { field: String, reason: String },

    #[error("no {what} configured")]
    NoCredentials { what: String },

    #[error("failed to serialize config: {0}")]
    Serialization(#[from] toml::ser::Error),

    #[error("config loading failed: {0}")]
    Figment(Box<figment::Error>),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

// ── TOML config structs ─────────────────────────────────────────────

/// Top-level TOML configuration.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub dashboard: DashboardSection,

    #[serde(default)]
    pub device: DeviceSection,

    #[serde(default)]
    pub migrate: MigrateSection,

    #[serde(default)]
    pub compare: CompareSection,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DashboardSection {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key (plaintext, prefer `api_key_env`).
    pub api_key: Option<String>,

    /// Environment variable holding the API key.
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,

    #[serde(default)]
    pub insecure: bool,

    pub ca_cert: Option<PathBuf>,

    /// Replacement devices updated at once.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl Default for DashboardSection {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: None,
            api_key_env: default_api_key_env(),
            timeout_secs: default_timeout(),
            insecure: false,
            ca_cert: None,
            concurrency: default_concurrency(),
        }
    }
}

fn default_base_url() -> String {
    stackport_core::DEFAULT_BASE_URL.into()
}
fn default_api_key_env() -> String {
    "MERAKI_API_KEY".into()
}
fn default_timeout() -> u64 {
    30
}
fn default_concurrency() -> usize {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DeviceSection {
    #[serde(default)]
    pub platform: CliPlatform,

    #[serde(default = "default_ssh_port")]
    pub port: u16,

    #[serde(default = "default_connect_timeout")]
    pub connect_timeout_secs: u64,

    #[serde(default = "default_read_timeout")]
    pub read_timeout_secs: u64,

    #[serde(default = "default_mac_read_timeout")]
    pub mac_read_timeout_secs: u64,

    /// SHA-256 host key fingerprint to pin.
    pub host_key_fingerprint: Option<String>,
}

impl Default for DeviceSection {
    fn default() -> Self {
        Self {
            platform: CliPlatform::default(),
            port: default_ssh_port(),
            connect_timeout_secs: default_connect_timeout(),
            read_timeout_secs: default_read_timeout(),
            mac_read_timeout_secs: default_mac_read_timeout(),
            host_key_fingerprint: None,
        }
    }
}

fn default_ssh_port() -> u16 {
    22
}
fn default_connect_timeout() -> u64 {
    60
}
fn default_read_timeout() -> u64 {
    120
}
fn default_mac_read_timeout() -> u64 {
    90
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct MigrateSection {
    /// Module group that carries access ports in three-part names.
    #[serde(default)]
    pub access_group: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CompareSection {
    /// Highest end-device port number; `0` disables the uplink filter.
    #[serde(default = "default_uplink_threshold")]
    pub uplink_threshold: u32,

    #[serde(default)]
    pub port_prefixes: Vec<String>,

    #[serde(default = "default_client_timespan")]
    pub client_timespan_secs: u64,
}

impl Default for CompareSection {
    fn default() -> Self {
        Self {
            uplink_threshold: default_uplink_threshold(),
            port_prefixes: Vec::new(),
            client_timespan_secs: default_client_timespan(),
        }
    }
}

fn default_uplink_threshold() -> u32 {
    48
}
fn default_client_timespan() -> u64 {
    stackport_core::CLIENT_LOOKBACK.as_secs()
}

// ── Translation into core types ─────────────────────────────────────

impl DashboardSection {
    pub fn base_url(&self) -> Result<url::Url, ConfigError> {
        self.base_url.parse().map_err(|_| ConfigError::Validation {
            field: "dashboard.base_url".into(),
            reason: format!("invalid URL: {}", self.base_url),
        })
    }

    pub fn transport(&self) -> TransportConfig {
        let tls = if self.insecure {
            TlsMode::DangerAcceptInvalid
        } else if let Some(ref ca_path) = self.ca_cert {
            TlsMode::CustomCa(ca_path.clone())
        } else {
            TlsMode::System
        };
        TransportConfig {
            tls,
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

impl DeviceSection {
    pub fn profile(&self) -> DeviceProfile {
        DeviceProfile {
            platform: self.platform,
            port: self.port,
            connect_timeout: Duration::from_secs(self.connect_timeout_secs),
            read_timeout: Duration::from_secs(self.read_timeout_secs),
            host_key_fingerprint: self.host_key_fingerprint.clone(),
        }
    }

    /// Profile for MAC table retrieval, which uses its own read timeout.
    pub fn mac_profile(&self) -> DeviceProfile {
        DeviceProfile {
            read_timeout: Duration::from_secs(self.mac_read_timeout_secs),
            ..self.profile()
        }
    }
}

impl CompareSection {
    pub fn filter_policy(&self) -> MacFilterPolicy {
        MacFilterPolicy {
            uplink_threshold: (self.uplink_threshold > 0).then_some(self.uplink_threshold),
            port_prefixes: self.port_prefixes.clone(),
        }
    }

    pub fn client_timespan(&self) -> Duration {
        Duration::from_secs(self.client_timespan_secs)
    }
}

impl Config {
    fn validate(&self) -> Result<(), ConfigError> {
        if self.dashboard.concurrency == 0 {
            return Err(ConfigError::Validation {
                field: "dashboard.concurrency".into(),
                reason: "must be at least 1".into(),
            });
        }
        if self.device.connect_timeout_secs == 0 || self.device.read_timeout_secs == 0 {
            return Err(ConfigError::Validation {
                field: "device".into(),
                reason: "timeouts must be greater than zero".into(),
            });
        }
        self.dashboard.base_url()?;
        Ok(())
    }
}

// ── Config file path ────────────────────────────────────────────────

/// Resolve the config file path via XDG / platform conventions.
pub fn config_path() -> PathBuf {
    ProjectDirs::from("com", "stackport", "stackport").map_or_else(
        || {
            let mut p = dirs_fallback();
            p.push("config.toml");
            p
        },
        |dirs| dirs.config_dir().join("config.toml"),
    )
}

fn dirs_fallback() -> PathBuf {
    let mut p = PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()));
    p.push(".config");
    p.push("stackport");
    p
}

// ── Config loading ──────────────────────────────────────────────────

/// Load config from defaults, the TOML file and `STACKPORT_*` variables.
///
/// Nested keys use a double underscore: `STACKPORT_DASHBOARD__TIMEOUT_SECS`.
/// A missing file is not an error.
pub fn load_config(path: Option<&Path>) -> Result<Config, ConfigError> {
    let path = path.map_or_else(config_path, Path::to_path_buf);

    let config: Config = Figment::new()
        .merge(Serialized::defaults(Config::default()))
        .merge(Toml::file(&path))
        .merge(Env::prefixed(ENV_PREFIX).split("__"))
        .extract()?;
    config.validate()?;
    Ok(config)
}

/// Render a config as TOML, e.g. for `config show`.
pub fn to_toml(config: &Config) -> Result<String, ConfigError> {
    Ok(toml::to_string_pretty(config)?)
}

// ── Credential resolution ───────────────────────────────────────────

/// Ordered device credentials from `STACKPORT_USERNAME_N` / `STACKPORT_PASSWORD_N`.
pub fn credentials_from_env() -> Vec<Credential> {
    credentials_from_lookup(|key| std::env::var(key).ok())
}

/// Read numbered credential pairs starting at 1, stopping at the first gap.
///
/// A pair needs both the username and the password. The shared enable
/// secret, when present, is attached to every credential.
pub fn credentials_from_lookup<F>(lookup: F) -> Vec<Credential>
where
    F: Fn(&str) -> Option<String>,
{
    let enable = lookup(ENABLE_SECRET_ENV).filter(|s| !s.is_empty());
    let mut credentials = Vec::new();
    for n in 1.. {
        let user = lookup(&format!("{USERNAME_ENV_PREFIX}{n}"));
        let pass = lookup(&format!("{PASSWORD_ENV_PREFIX}{n}"));
        let (Some(user), Some(pass)) = (user, pass) else {
            break;
        };
        let mut credential = Credential::new(user, pass);
        if let Some(ref secret) = enable {
            credential = credential.with_enable_secret(SecretString::from(secret.clone()));
        }
        credentials.push(credential);
    }
    credentials
}

/// Resolve the dashboard API key: flag → `api_key_env` → config file.
pub fn resolve_api_key(
    flag: Option<&str>,
    dashboard: &DashboardSection,
) -> Result<SecretString, ConfigError> {
    resolve_api_key_with(flag, dashboard, |key| std::env::var(key).ok())
}

pub fn resolve_api_key_with<F>(
    flag: Option<&str>,
    dashboard: &DashboardSection,
    lookup: F,
) -> Result<SecretString, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // 1. CLI flag
    if let Some(key) = flag.filter(|k| !k.is_empty()) {
        return Ok(SecretString::from(key.to_owned()));
    }

    // 2. Environment variable named by the config
    if let Some(val) = lookup(&dashboard.api_key_env).filter(|v| !v.is_empty()) {
        return Ok(SecretString::from(val));
    }

    // 3. Plaintext in config
    if let Some(ref key) = dashboard.api_key {
        return Ok(SecretString::from(key.clone()));
    }

    Err(ConfigError::NoCredentials {
        what: format!("dashboard API key (set --api-key or ${})", dashboard.api_key_env),
    })
}
