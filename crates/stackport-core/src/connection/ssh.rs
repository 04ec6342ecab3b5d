// ── SSH transport ──
//
// Interactive PTY shell over russh. Commands are written to the shell and
// output is read until the device prompt returns, the way an operator
// would drive the CLI.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use async_trait::async_trait;
use regex::Regex;
use russh::client::{self, Handle, Handler};
use russh::keys::key::PublicKey;
use russh::{Channel, ChannelMsg, Disconnect};
use secrecy::{ExposeSecret, SecretString};
use tokio::net::TcpStream;
use tracing::{debug, trace, warn};

use super::{AttemptFailure, CliConnector, CliSession, DeviceProfile, SessionError};
use crate::credential::Credential;

static GENERIC_PROMPT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][\w.\-@:/()]*[>#]$").expect("prompt pattern is valid")
});

const PAGER: &str = "--More--";

const REJECTION_MARKERS: &[&str] = &[
    "% Invalid input detected",
    "% Incomplete command",
    "% Ambiguous command",
    "% Unknown command",
];

// ── Host key policy ─────────────────────────────────────────────────

pub struct HostKeyCheck {
    address: String,
    pinned: Option<String>,
}

#[async_trait]
impl Handler for HostKeyCheck {
    type Error = russh::Error;

    async fn check_server_key(
        &mut self,
        server_public_key: &PublicKey,
    ) -> Result<bool, Self::Error> {
        let fingerprint = server_public_key.fingerprint();
        match &self.pinned {
            Some(pinned) if pinned.trim_start_matches("SHA256:") != fingerprint => {
                warn!(
                    address = %self.address,
                    %fingerprint,
                    "host key does not match the pinned fingerprint, rejecting"
                );
                Ok(false)
            }
            Some(_) => {
                debug!(address = %self.address, "host key matches pinned fingerprint");
                Ok(true)
            }
            None => {
                debug!(address = %self.address, %fingerprint, "accepting host key");
                Ok(true)
            }
        }
    }
}

// ── Connector ───────────────────────────────────────────────────────

/// Opens SSH shell sessions to legacy devices.
#[derive(Debug, Clone, Copy, Default)]
pub struct SshConnector;

impl SshConnector {
    pub fn new() -> Self {
        Self
    }
}

fn socket_address(address: &str, port: u16) -> String {
    if address.contains(':') && !address.starts_with('[') {
        format!("[{address}]:{port}")
    } else {
        format!("{address}:{port}")
    }
}

#[async_trait]
impl CliConnector for SshConnector {
    async fn open(
        &self,
        address: &str,
        credential: &Credential,
        profile: &DeviceProfile,
    ) -> Result<Box<dyn CliSession>, AttemptFailure> {
        let mut config = client::Config::default();
        config.inactivity_timeout = Some(profile.read_timeout.max(profile.connect_timeout));
        let config = Arc::new(config);

        let target = socket_address(address, profile.port);
        let socket = TcpStream::connect(&target).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::TimedOut {
                AttemptFailure::Timeout
            } else {
                AttemptFailure::Unexpected(format!("failed to connect to {target}: {e}"))
            }
        })?;
        let _ = socket.set_nodelay(true);

        let handler = HostKeyCheck {
            address: address.to_owned(),
            pinned: profile.host_key_fingerprint.clone(),
        };
        let mut handle = client::connect_stream(config, socket, handler)
            .await
            .map_err(|e| AttemptFailure::Unexpected(format!("SSH handshake failed: {e}")))?;

        let authenticated = handle
            .authenticate_password(
                credential.username.as_str(),
                credential.password.expose_secret(),
            )
            .await
            .map_err(|e| AttemptFailure::Unexpected(format!("SSH authentication error: {e}")))?;
        if !authenticated {
            return Err(AttemptFailure::Auth(format!(
                "password rejected for {}",
                credential.username
            )));
        }

        let channel = handle
            .channel_open_session()
            .await
            .map_err(|e| AttemptFailure::Unexpected(format!("failed to open channel: {e}")))?;
        channel
            .request_pty(false, "vt100", 511, 24, 0, 0, &[])
            .await
            .map_err(|e| AttemptFailure::Unexpected(format!("PTY request failed: {e}")))?;
        channel
            .request_shell(false)
            .await
            .map_err(|e| AttemptFailure::Unexpected(format!("shell request failed: {e}")))?;

        let mut session = SshSession {
            handle,
            channel,
            buffer: Vec::new(),
            prompt: String::new(),
            hostname: String::new(),
            address: address.to_owned(),
            read_timeout: profile.read_timeout,
        };
        session
            .initialize(profile.connect_timeout)
            .await
            .map_err(|e| match e {
                SessionError::Timeout { .. } => AttemptFailure::Timeout,
                other => AttemptFailure::Unexpected(other.to_string()),
            })?;
        Ok(Box::new(session))
    }
}

// ── Session ─────────────────────────────────────────────────────────

struct SshSession {
    handle: Handle<HostKeyCheck>,
    channel: Channel<client::Msg>,
    /// Raw bytes; decoded only once a read completes.
    buffer: Vec<u8>,
    prompt: String,
    hostname: String,
    address: String,
    read_timeout: Duration,
}

impl SshSession {
    async fn initialize(&mut self, timeout: Duration) -> Result<(), SessionError> {
        let banner = self
            .read_until("initial prompt", timeout, |buf| {
                GENERIC_PROMPT.is_match(last_line(buf))
            })
            .await?;
        self.set_prompt(last_line(&banner));
        debug!(address = %self.address, hostname = %self.hostname, "shell ready");
        self.run("terminal length 0", timeout).await?;
        self.run("terminal width 511", timeout).await?;
        Ok(())
    }

    fn set_prompt(&mut self, line: &str) {
        line.clone_into(&mut self.prompt);
        self.hostname = hostname_from_prompt(line).to_owned();
    }

    async fn write_line(&mut self, line: &str) -> Result<(), SessionError> {
        let data = format!("{line}\n");
        self.channel
            .data(data.as_bytes())
            .await
            .map_err(|e| SessionError::Channel(e.to_string()))
    }

    /// Read channel data until `done` accepts the accumulated buffer.
    async fn read_until<F>(
        &mut self,
        operation: &str,
        timeout: Duration,
        done: F,
    ) -> Result<String, SessionError>
    where
        F: Fn(&str) -> bool + Send,
    {
        let read = async {
            loop {
                if done(&*String::from_utf8_lossy(&self.buffer)) {
                    return Ok(take_text(&mut self.buffer));
                }
                match self.channel.wait().await {
                    Some(ChannelMsg::Data { data } | ChannelMsg::ExtendedData { data, .. }) => {
                        self.buffer.extend_from_slice(&data);
                        if strip_pager(&mut self.buffer) {
                            self.channel
                                .data(&b" "[..])
                                .await
                                .map_err(|e| SessionError::Channel(e.to_string()))?;
                        }
                    }
                    Some(ChannelMsg::Eof | ChannelMsg::Close) | None => {
                        return Err(SessionError::Closed);
                    }
                    Some(_) => {}
                }
            }
        };
        tokio::time::timeout(timeout, read)
            .await
            .map_err(|_| SessionError::Timeout {
                operation: operation.to_owned(),
                timeout_secs: timeout.as_secs(),
            })?
    }

    async fn run(&mut self, command: &str, timeout: Duration) -> Result<String, SessionError> {
        trace!(address = %self.address, command, "sending command");
        self.write_line(command).await?;
        let echo = command.to_owned();
        let hostname = self.hostname.clone();
        let raw = self
            .read_until(command, timeout, move |buf| {
                buf.find(echo.as_str())
                    .is_some_and(|idx| at_prompt(&hostname, &buf[idx + echo.len()..]))
            })
            .await?;
        let output = clean_output(&raw, command);
        if let Some(marker) = REJECTION_MARKERS.iter().find(|m| output.contains(**m)) {
            return Err(SessionError::Rejected {
                command: command.to_owned(),
                output: (*marker).to_owned(),
            });
        }
        self.set_prompt(last_line(&normalize(&raw)));
        Ok(output)
    }
}

#[async_trait]
impl CliSession for SshSession {
    async fn enable(&mut self, secret: Option<&SecretString>) -> Result<(), SessionError> {
        if self.prompt.ends_with('#') {
            return Ok(());
        }
        let timeout = self.read_timeout;
        self.write_line("enable").await?;
        let hostname = self.hostname.clone();
        let mut reply = self
            .read_until("enable", timeout, move |buf| {
                asks_password(buf) || at_prompt(&hostname, buf)
            })
            .await?;

        if asks_password(&reply) {
            let text = secret.map(|s| s.expose_secret().to_owned()).unwrap_or_default();
            self.write_line(&text).await?;
            let hostname = self.hostname.clone();
            reply = self
                .read_until("enable secret", timeout, move |buf| {
                    asks_password(buf) || at_prompt(&hostname, buf)
                })
                .await?;
        }

        let line = last_line(&reply).to_owned();
        if !line.ends_with('#') {
            return Err(SessionError::Rejected {
                command: "enable".into(),
                output: "privileged mode was not granted".into(),
            });
        }
        self.set_prompt(&line);
        debug!(address = %self.address, "privileged mode entered");
        Ok(())
    }

    async fn hostname(&mut self) -> Result<String, SessionError> {
        Ok(self.hostname.clone())
    }

    async fn send_command(
        &mut self,
        command: &str,
        read_timeout: Duration,
    ) -> Result<String, SessionError> {
        self.run(command, read_timeout).await
    }

    async fn save_config(&mut self) -> Result<(), SessionError> {
        let timeout = self.read_timeout;
        self.run("write memory", timeout).await.map(|_| ())
    }

    async fn close(&mut self) {
        let _ = self.write_line("exit").await;
        let _ = self.channel.eof().await;
        let _ = self
            .handle
            .disconnect(Disconnect::ByApplication, "session closed", "en")
            .await;
    }
}

// ── Text helpers ────────────────────────────────────────────────────

/// Drop a trailing pager marker from `buf`, reporting whether one was there.
fn strip_pager(buf: &mut Vec<u8>) -> bool {
    let marker = PAGER.as_bytes();
    let Some(idx) = buf.windows(marker.len()).rposition(|w| w == marker) else {
        return false;
    };
    if buf[idx + marker.len()..].iter().all(u8::is_ascii_whitespace) {
        buf.truncate(idx);
        true
    } else {
        false
    }
}

fn take_text(buf: &mut Vec<u8>) -> String {
    String::from_utf8_lossy(&std::mem::take(buf)).into_owned()
}

fn normalize(raw: &str) -> String {
    raw.replace("\r\n", "\n").replace(['\r', '\u{8}'], "")
}

fn last_line(buf: &str) -> &str {
    buf.rsplit(['\n', '\r']).next().unwrap_or_default().trim()
}

fn hostname_from_prompt(prompt: &str) -> &str {
    let base = prompt.trim_end_matches(['>', '#']);
    base.split_once('(').map_or(base, |(host, _)| host)
}

fn at_prompt(hostname: &str, buf: &str) -> bool {
    let line = last_line(buf);
    if hostname.is_empty() {
        return GENERIC_PROMPT.is_match(line);
    }
    line.starts_with(hostname) && (line.ends_with('#') || line.ends_with('>'))
}

fn asks_password(buf: &str) -> bool {
    last_line(buf).to_ascii_lowercase().starts_with("password")
}

/// Strip the echoed command line and the trailing prompt.
fn clean_output(raw: &str, command: &str) -> String {
    let text = normalize(raw);
    let after_echo = text
        .find(command)
        .map_or(text.as_str(), |idx| &text[idx + command.len()..]);
    let body = after_echo.split_once('\n').map_or("", |(_, rest)| rest);
    match body.rsplit_once('\n') {
        Some((head, _prompt)) if !head.is_empty() => format!("{head}\n"),
        _ => String::new(),
    }
}
