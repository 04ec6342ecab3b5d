// ── Comparison engine ──
//
// Aligns legacy interface-status or MAC-table records with the replacement
// devices' live state. Records go through the same parser and mapper as a
// conversion, are joined on (serial, port), and each yields one outcome.

pub mod mac;
pub mod status;

use std::fmt;
use std::time::Duration;

use indexmap::IndexSet;
use serde::Serialize;
use tracing::{debug, info};

use crate::connection::{
    self, CliConnector, CommandOutput, DeviceProfile, INTERFACE_STATUS_COMMAND,
    MAC_TABLE_COMMAND, RetrieveOptions,
};
use crate::credential::Credential;
use crate::dashboard::SwitchDashboard;
use crate::error::CoreError;
use crate::format::{FormatDecision, detect_format};
use crate::interface::{InterfaceName, has_ethernet_prefix};
use crate::mapper::{IndexBase, resolve};
use crate::migrate::report::SkipReason;
use crate::model::DeviceSerial;
use crate::records::{InterfaceStatusRecord, MacTableRecord};

pub use mac::{MacComparison, MacFilterPolicy, compare_mac_table};
pub use status::{StatusComparison, compare_status};

pub type StatusComparisonReport = ComparisonReport<StatusComparison>;
pub type MacComparisonReport = ComparisonReport<MacComparison>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum LinkState {
    Up,
    Down,
}

impl LinkState {
    /// Legacy CLI wording: `up` and `connected` are up, anything else down.
    pub fn from_legacy(status: &str) -> Self {
        match status.trim().to_ascii_lowercase().as_str() {
            "up" | "connected" => Self::Up,
            _ => Self::Down,
        }
    }
}

/// What differs between the two sides of a join.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MismatchKind {
    Status {
        legacy: LinkState,
        replacement: LinkState,
    },
    Port {
        expected: String,
        actual: Option<String>,
    },
    Vlan {
        legacy: String,
        replacement: String,
    },
}

impl fmt::Display for MismatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Status {
                legacy,
                replacement,
            } => write!(f, "status {legacy} on legacy, {replacement} on replacement"),
            Self::Port { expected, actual } => write!(
                f,
                "port mismatch: expected {expected}, seen on {}",
                actual.as_deref().unwrap_or("unknown port")
            ),
            Self::Vlan {
                legacy,
                replacement,
            } => write!(f, "VLAN {legacy} on legacy, {replacement} on replacement"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ComparisonOutcome {
    Match,
    Mismatch { mismatch: MismatchKind },
    NotFound,
}

impl ComparisonOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Match => "match",
            Self::Mismatch { .. } => "mismatch",
            Self::NotFound => "not found",
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Mismatch { mismatch } => Some(mismatch.to_string()),
            Self::Match | Self::NotFound => None,
        }
    }
}

/// A legacy record that could not be mapped to a replacement port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedRecord {
    pub interface: String,
    pub reason: SkipReason,
}

/// A replacement device whose live state could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeviceError {
    pub serial: DeviceSerial,
    pub error: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ComparisonCounts {
    pub matched: usize,
    pub mismatched: usize,
    pub not_found: usize,
    pub skipped: usize,
}

/// Joined records plus everything that could not be joined.
#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport<T> {
    /// Hostname of the legacy device, when records came from one.
    pub hostname: Option<String>,
    pub decision: Option<FormatDecision>,
    pub records: Vec<T>,
    pub skipped: Vec<SkippedRecord>,
    /// Non-Ethernet records left out.
    pub excluded: usize,
    /// Records removed by the MAC filter policy.
    pub filtered: usize,
    pub device_errors: Vec<DeviceError>,
}

/// Access to the outcome of a joined record.
pub trait Compared {
    fn outcome(&self) -> &ComparisonOutcome;
}

impl<T: Compared> ComparisonReport<T> {
    pub fn counts(&self) -> ComparisonCounts {
        let mut counts = ComparisonCounts {
            skipped: self.skipped.len(),
            ..ComparisonCounts::default()
        };
        for record in &self.records {
            match record.outcome() {
                ComparisonOutcome::Match => counts.matched += 1,
                ComparisonOutcome::Mismatch { .. } => counts.mismatched += 1,
                ComparisonOutcome::NotFound => counts.not_found += 1,
            }
        }
        counts
    }

    /// Every joined record matched and every device answered.
    pub fn is_clean(&self) -> bool {
        self.device_errors.is_empty()
            && self
                .records
                .iter()
                .all(|r| matches!(r.outcome(), ComparisonOutcome::Match))
    }
}

// ── Entry point ─────────────────────────────────────────────────────

/// Where legacy records come from.
#[derive(Debug, Clone)]
pub enum RecordSource<R> {
    /// Retrieve and parse the records from the device.
    Device {
        address: String,
        credentials: Vec<Credential>,
        profile: DeviceProfile,
    },
    /// Records captured earlier.
    Records(Vec<R>),
}

/// Runs comparisons against a dashboard, reaching devices through `connector`.
pub struct Comparator<'a> {
    dashboard: &'a dyn SwitchDashboard,
    connector: &'a dyn CliConnector,
}

impl<'a> Comparator<'a> {
    pub fn new(dashboard: &'a dyn SwitchDashboard, connector: &'a dyn CliConnector) -> Self {
        Self {
            dashboard,
            connector,
        }
    }

    pub async fn status(
        &self,
        serials: &[DeviceSerial],
        source: RecordSource<InterfaceStatusRecord>,
        expected_group: Option<u32>,
    ) -> Result<StatusComparisonReport, CoreError> {
        require_serials(serials)?;
        let (records, hostname) = match source {
            RecordSource::Records(records) => (records, None),
            RecordSource::Device {
                address,
                credentials,
                profile,
            } => {
                let retrieved = self
                    .fetch(&address, &credentials, &profile, INTERFACE_STATUS_COMMAND)
                    .await?;
                match retrieved.output {
                    CommandOutput::InterfaceStatus(rows) => (rows, Some(retrieved.hostname)),
                    _ => return Err(unexpected_output(INTERFACE_STATUS_COMMAND)),
                }
            }
        };
        let mut report = compare_status(self.dashboard, serials, &records, expected_group).await;
        report.hostname = hostname;
        log_counts("status", &report.counts());
        Ok(report)
    }

    pub async fn mac(
        &self,
        serials: &[DeviceSerial],
        source: RecordSource<MacTableRecord>,
        policy: &MacFilterPolicy,
        expected_group: Option<u32>,
        timespan: Duration,
    ) -> Result<MacComparisonReport, CoreError> {
        require_serials(serials)?;
        let (records, hostname) = match source {
            RecordSource::Records(records) => (records, None),
            RecordSource::Device {
                address,
                credentials,
                profile,
            } => {
                let retrieved = self
                    .fetch(&address, &credentials, &profile, MAC_TABLE_COMMAND)
                    .await?;
                match retrieved.output {
                    CommandOutput::MacTable(rows) => (rows, Some(retrieved.hostname)),
                    _ => return Err(unexpected_output(MAC_TABLE_COMMAND)),
                }
            }
        };
        let mut report = compare_mac_table(
            self.dashboard,
            serials,
            &records,
            policy,
            expected_group,
            timespan,
        )
        .await;
        report.hostname = hostname;
        log_counts("mac", &report.counts());
        Ok(report)
    }

    async fn fetch(
        &self,
        address: &str,
        credentials: &[Credential],
        profile: &DeviceProfile,
        command: &str,
    ) -> Result<connection::Retrieved, CoreError> {
        connection::retrieve(
            self.connector,
            address,
            credentials,
            profile,
            command,
            RetrieveOptions {
                read_timeout: profile.read_timeout,
                structured: true,
            },
        )
        .await
    }
}

fn require_serials(serials: &[DeviceSerial]) -> Result<(), CoreError> {
    if serials.is_empty() {
        return Err(CoreError::precondition("at least one device serial is required"));
    }
    Ok(())
}

fn unexpected_output(command: &str) -> CoreError {
    CoreError::Internal(format!("`{command}` did not return structured records"))
}

fn log_counts(kind: &str, counts: &ComparisonCounts) {
    info!(
        kind,
        matched = counts.matched,
        mismatched = counts.mismatched,
        not_found = counts.not_found,
        skipped = counts.skipped,
        "comparison finished"
    );
}

// ── Shared mapping step ─────────────────────────────────────────────

pub(crate) struct MappedRecord<'r, R> {
    pub(crate) record: &'r R,
    pub(crate) interface: String,
    pub(crate) serial: DeviceSerial,
    pub(crate) port: u32,
}

pub(crate) struct Mapping<'r, R> {
    pub(crate) decision: Option<FormatDecision>,
    pub(crate) mapped: Vec<MappedRecord<'r, R>>,
    pub(crate) skipped: Vec<SkippedRecord>,
    pub(crate) excluded: usize,
}

impl<R> Mapping<'_, R> {
    /// Serials that received at least one record, in first-seen order.
    pub(crate) fn serials(&self) -> IndexSet<DeviceSerial> {
        self.mapped.iter().map(|m| m.serial.clone()).collect()
    }

    pub(crate) fn into_report<T>(self, records: Vec<T>, filtered: usize) -> ComparisonReport<T> {
        ComparisonReport {
            hostname: None,
            decision: self.decision,
            records,
            skipped: self.skipped,
            excluded: self.excluded,
            filtered,
            device_errors: Vec::new(),
        }
    }
}

pub(crate) fn map_records<'r, R, F>(
    records: &'r [R],
    name_of: F,
    serials: &[DeviceSerial],
    expected_group: Option<u32>,
) -> Mapping<'r, R>
where
    F: Fn(&R) -> &str,
{
    let decision = detect_format(records.iter().map(&name_of));
    let base = decision.map_or(IndexBase::One, |d| d.index_base());
    let mut mapping = Mapping {
        decision,
        mapped: Vec::new(),
        skipped: Vec::new(),
        excluded: 0,
    };

    for record in records {
        let interface = name_of(record).trim();
        if !has_ethernet_prefix(interface) {
            mapping.excluded += 1;
            continue;
        }
        match resolve(InterfaceName::parse(interface), base, serials, expected_group) {
            Ok(target) => mapping.mapped.push(MappedRecord {
                record,
                interface: interface.to_owned(),
                serial: target.serial.clone(),
                port: target.port,
            }),
            Err(err) => {
                debug!(interface, reason = %err, "record skipped");
                mapping.skipped.push(SkippedRecord {
                    interface: interface.to_owned(),
                    reason: SkipReason::from(err),
                });
            }
        }
    }
    mapping
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::testing::{FakeBehavior, FakeConnector, FakeDashboard};

    #[tokio::test]
    async fn status_from_device_carries_hostname() {
        let dashboard = FakeDashboard::default().with_status("Q2-A", "1", "Connected");
        let connector = FakeConnector::new(vec![FakeBehavior::Accept]).with_output(
            INTERFACE_STATUS_COMMAND,
            "GigabitEthernet1/0/1   unassigned      YES unset  up                    up\n",
        );
        let source = RecordSource::Device {
            address: "10.0.0.2".into(),
            credentials: vec![Credential::new("netops", "pw")],
            profile: DeviceProfile::default(),
        };
        let report = Comparator::new(&dashboard, &connector)
            .status(&[DeviceSerial::from("Q2-A")], source, Some(0))
            .await
            .unwrap();
        assert_eq!(report.hostname.as_deref(), Some("SW-FAKE"));
        assert_eq!(report.counts().matched, 1);
        assert!(report.is_clean());
        assert_eq!(connector.saves(), 0);
    }

    #[tokio::test]
    async fn comparison_requires_serials() {
        let dashboard = FakeDashboard::default();
        let connector = FakeConnector::new(vec![]);
        let err = Comparator::new(&dashboard, &connector)
            .mac(
                &[],
                RecordSource::Records(vec![]),
                &MacFilterPolicy::default(),
                None,
                crate::CLIENT_LOOKBACK,
            )
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Precondition { .. }));
    }

    #[test]
    fn legacy_link_states() {
        assert_eq!(LinkState::from_legacy("up"), LinkState::Up);
        assert_eq!(LinkState::from_legacy("connected"), LinkState::Up);
        assert_eq!(LinkState::from_legacy("administratively down"), LinkState::Down);
        assert_eq!(LinkState::from_legacy("notconnect"), LinkState::Down);
    }

    #[test]
    fn mismatch_descriptions() {
        let port = MismatchKind::Port {
            expected: "5".into(),
            actual: Some("7".into()),
        };
        assert_eq!(port.to_string(), "port mismatch: expected 5, seen on 7");
        let status = MismatchKind::Status {
            legacy: LinkState::Up,
            replacement: LinkState::Down,
        };
        assert_eq!(status.to_string(), "status up on legacy, down on replacement");
    }
}
