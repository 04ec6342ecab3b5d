//! Command dispatch and the setup shared by every handler.

pub mod capture;
pub mod compare;
pub mod convert;

use std::path::Path;

use secrecy::SecretString;
use serde::de::DeserializeOwned;

use stackport_config::{Config, ENABLE_SECRET_ENV};
use stackport_core::{CoreError, Credential, DashboardClient, DeviceSerial};

use crate::cli::{Command, GlobalOpts, SerialArgs};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Convert(args) => convert::handle(args, global).await,
        Command::Compare(args) => compare::handle(args, global).await,
        Command::Capture(args) => capture::handle(args, global).await,
        // Completions are handled before dispatch
        Command::Completions(_) => Ok(()),
    }
}

// ── Shared setup ────────────────────────────────────────────────────

pub fn load_config(global: &GlobalOpts) -> Result<Config, CliError> {
    let config = stackport_config::load_config(global.config.as_deref())?;
    tracing::debug!(
        base_url = %config.dashboard.base_url,
        concurrency = config.dashboard.concurrency,
        "configuration loaded"
    );
    Ok(config)
}

/// Build the dashboard client from config, with `--api-key` / `--timeout` overrides.
pub fn dashboard_client(config: &Config, global: &GlobalOpts) -> Result<DashboardClient, CliError> {
    let api_key = stackport_config::resolve_api_key(global.api_key.as_deref(), &config.dashboard)?;
    let base_url = config.dashboard.base_url()?;
    let mut transport = config.dashboard.transport();
    if let Some(secs) = global.timeout {
        transport.timeout = std::time::Duration::from_secs(secs);
    }
    DashboardClient::new(base_url, &api_key, &transport).map_err(|e| CoreError::from(e).into())
}

/// Device logins in the order they are tried.
///
/// `--username` with a prompted password comes first, then the
/// `STACKPORT_USERNAME_N` / `STACKPORT_PASSWORD_N` pairs.
pub fn device_credentials(global: &GlobalOpts) -> Result<Vec<Credential>, CliError> {
    let mut credentials = Vec::new();

    if let Some(ref username) = global.username {
        let password = if global.ask_password {
            rpassword::prompt_password(format!("Password for {username}: "))?
        } else {
            return Err(CliError::Validation {
                field: "--username".into(),
                reason: "requires --ask-password".into(),
            });
        };
        let mut credential = Credential::new(username.clone(), password);
        if let Some(secret) = std::env::var(ENABLE_SECRET_ENV).ok().filter(|s| !s.is_empty()) {
            credential = credential.with_enable_secret(SecretString::from(secret));
        }
        credentials.push(credential);
    }

    credentials.extend(stackport_config::credentials_from_env());

    if credentials.is_empty() {
        return Err(CliError::NoCredentials {
            what: "device login (use --username/--ask-password or STACKPORT_USERNAME_1)".into(),
        });
    }

    let masked: Vec<String> = credentials.iter().map(Credential::masked).collect();
    tracing::debug!(credentials = ?masked, "device credentials resolved");
    Ok(credentials)
}

pub fn serials(args: &SerialArgs) -> Vec<DeviceSerial> {
    args.serials.iter().map(|s| DeviceSerial::new(s.as_str())).collect()
}

/// `--access-group`, falling back to `[migrate].access_group`.
pub fn access_group(args: &SerialArgs, config: &Config) -> u32 {
    args.access_group.unwrap_or(config.migrate.access_group)
}

pub fn read_text(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::ReadFile {
        path: path.display().to_string(),
        source,
    })
}

/// Load records written by `stackport capture`.
pub fn read_records<R: DeserializeOwned>(path: &Path) -> Result<Vec<R>, CliError> {
    let text = read_text(path)?;
    serde_json::from_str(&text).map_err(|source| CliError::Records {
        path: path.display().to_string(),
        source,
    })
}
