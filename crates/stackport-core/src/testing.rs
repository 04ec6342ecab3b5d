// In-memory fakes for the device CLI and the dashboard.

#![allow(clippy::unwrap_used)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::SecretString;
use stackport_api::{DeviceClient, SwitchPort, SwitchPortStatus, SwitchPortUpdate};

use crate::connection::{AttemptFailure, CliConnector, CliSession, DeviceProfile, SessionError};
use crate::credential::Credential;
use crate::dashboard::SwitchDashboard;

// ── CLI fakes ───────────────────────────────────────────────────────

pub(crate) enum FakeBehavior {
    Accept,
    RejectAuth,
    Timeout,
    Unexpected(String),
    Hang,
}

#[derive(Default)]
struct Counters {
    attempts: AtomicUsize,
    saves: AtomicUsize,
    closes: AtomicUsize,
}

pub(crate) struct FakeConnector {
    behaviors: Mutex<VecDeque<FakeBehavior>>,
    outputs: HashMap<String, String>,
    read_timeout: bool,
    counters: Arc<Counters>,
}

impl FakeConnector {
    pub(crate) fn new(behaviors: Vec<FakeBehavior>) -> Self {
        Self {
            behaviors: Mutex::new(behaviors.into()),
            outputs: HashMap::new(),
            read_timeout: false,
            counters: Arc::default(),
        }
    }

    pub(crate) fn with_output(mut self, command: &str, output: &str) -> Self {
        self.outputs.insert(command.to_owned(), output.to_owned());
        self
    }

    pub(crate) fn with_read_timeout(mut self) -> Self {
        self.read_timeout = true;
        self
    }

    pub(crate) fn attempts(&self) -> usize {
        self.counters.attempts.load(Ordering::SeqCst)
    }

    pub(crate) fn saves(&self) -> usize {
        self.counters.saves.load(Ordering::SeqCst)
    }

    pub(crate) fn closes(&self) -> usize {
        self.counters.closes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CliConnector for FakeConnector {
    async fn open(
        &self,
        _address: &str,
        _credential: &Credential,
        _profile: &DeviceProfile,
    ) -> Result<Box<dyn CliSession>, AttemptFailure> {
        self.counters.attempts.fetch_add(1, Ordering::SeqCst);
        let behavior = self.behaviors.lock().unwrap().pop_front();
        match behavior {
            Some(FakeBehavior::Accept) => Ok(Box::new(FakeSession {
                outputs: self.outputs.clone(),
                read_timeout: self.read_timeout,
                counters: Arc::clone(&self.counters),
            })),
            Some(FakeBehavior::RejectAuth) | None => Err(AttemptFailure::Auth("rejected".into())),
            Some(FakeBehavior::Timeout) => Err(AttemptFailure::Timeout),
            Some(FakeBehavior::Unexpected(msg)) => Err(AttemptFailure::Unexpected(msg)),
            Some(FakeBehavior::Hang) => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(AttemptFailure::Timeout)
            }
        }
    }
}

struct FakeSession {
    outputs: HashMap<String, String>,
    read_timeout: bool,
    counters: Arc<Counters>,
}

#[async_trait]
impl CliSession for FakeSession {
    async fn enable(&mut self, _secret: Option<&SecretString>) -> Result<(), SessionError> {
        Ok(())
    }

    async fn hostname(&mut self) -> Result<String, SessionError> {
        Ok("SW-FAKE".into())
    }

    async fn send_command(
        &mut self,
        command: &str,
        read_timeout: Duration,
    ) -> Result<String, SessionError> {
        if self.read_timeout {
            return Err(SessionError::Timeout {
                operation: command.to_owned(),
                timeout_secs: read_timeout.as_secs(),
            });
        }
        Ok(self.outputs.get(command).cloned().unwrap_or_default())
    }

    async fn save_config(&mut self) -> Result<(), SessionError> {
        self.counters.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn close(&mut self) {
        self.counters.closes.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Dashboard fake ──────────────────────────────────────────────────

#[derive(Default)]
pub(crate) struct FakeDashboard {
    ports: HashMap<String, Vec<String>>,
    statuses: HashMap<String, Vec<(String, String)>>,
    clients: HashMap<String, Vec<DeviceClient>>,
    failing_serials: Vec<String>,
    rejected_ports: Vec<(String, String)>,
    pub(crate) updates: Mutex<Vec<(String, String, SwitchPortUpdate)>>,
}

impl FakeDashboard {
    pub(crate) fn with_ports(mut self, serial: &str, ports: std::ops::RangeInclusive<u32>) -> Self {
        self.ports
            .insert(serial.to_owned(), ports.map(|p| p.to_string()).collect());
        self
    }

    pub(crate) fn with_status(mut self, serial: &str, port: &str, status: &str) -> Self {
        self.statuses
            .entry(serial.to_owned())
            .or_default()
            .push((port.to_owned(), status.to_owned()));
        self
    }

    pub(crate) fn with_client(
        mut self,
        serial: &str,
        mac: &str,
        port: &str,
        vlan: Option<&str>,
    ) -> Self {
        self.clients.entry(serial.to_owned()).or_default().push(DeviceClient {
            id: None,
            mac: mac.to_owned(),
            description: None,
            ip: None,
            vlan: vlan.map(str::to_owned),
            switchport: Some(port.to_owned()),
        });
        self
    }

    pub(crate) fn failing(mut self, serial: &str) -> Self {
        self.failing_serials.push(serial.to_owned());
        self
    }

    pub(crate) fn rejecting(mut self, serial: &str, port: &str) -> Self {
        self.rejected_ports.push((serial.to_owned(), port.to_owned()));
        self
    }

    pub(crate) fn update_count(&self) -> usize {
        self.updates.lock().unwrap().len()
    }

    fn check(&self, serial: &str) -> Result<(), stackport_api::Error> {
        if self.failing_serials.iter().any(|s| s == serial) {
            return Err(stackport_api::Error::Api {
                status: 500,
                message: "internal server error".into(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl SwitchDashboard for FakeDashboard {
    async fn list_switch_ports(
        &self,
        serial: &str,
    ) -> Result<Vec<SwitchPort>, stackport_api::Error> {
        self.check(serial)?;
        Ok(self
            .ports
            .get(serial)
            .map(|ids| {
                ids.iter()
                    .map(|id| SwitchPort {
                        port_id: id.clone(),
                        name: None,
                        enabled: Some(true),
                        port_type: Some("access".into()),
                        vlan: Some("1".into()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn update_switch_port(
        &self,
        serial: &str,
        port_id: &str,
        update: &SwitchPortUpdate,
    ) -> Result<(), stackport_api::Error> {
        self.check(serial)?;
        if self
            .rejected_ports
            .iter()
            .any(|(s, p)| s == serial && p == port_id)
        {
            return Err(stackport_api::Error::Api {
                status: 400,
                message: "Invalid VLAN".into(),
            });
        }
        self.updates
            .lock()
            .unwrap()
            .push((serial.to_owned(), port_id.to_owned(), update.clone()));
        Ok(())
    }

    async fn list_port_statuses(
        &self,
        serial: &str,
    ) -> Result<Vec<SwitchPortStatus>, stackport_api::Error> {
        self.check(serial)?;
        Ok(self
            .statuses
            .get(serial)
            .map(|rows| {
                rows.iter()
                    .map(|(port, status)| SwitchPortStatus {
                        port_id: port.clone(),
                        enabled: Some(true),
                        status: Some(status.clone()),
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn list_device_clients(
        &self,
        serial: &str,
        _timespan: Duration,
    ) -> Result<Vec<DeviceClient>, stackport_api::Error> {
        self.check(serial)?;
        Ok(self.clients.get(serial).cloned().unwrap_or_default())
    }
}
