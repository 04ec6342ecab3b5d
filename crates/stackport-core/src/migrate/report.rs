// ── Migration report ──
//
// Append-only collector of per-port outcomes. Per-item problems land here
// as values so the caller always sees everything that was attempted.

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use crate::format::FormatDecision;
use crate::mapper::{MappingError, fmt_range};
use crate::model::{DeviceSerial, PortAssignment};

/// Why an interface was not applied.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SkipReason {
    #[error("interface name does not follow a recognized port pattern")]
    UnrecognizedName,

    #[error("stack index {index} has no replacement device (valid: {})", fmt_range(.valid))]
    StackIndexOutOfRange {
        index: u32,
        valid: Option<(u32, u32)>,
    },

    #[error("not in expected group {expected} (found group {group})")]
    NotInExpectedGroup { group: u32, expected: u32 },

    #[error("port {port} does not exist remotely")]
    PortNotPresent { port: u32 },

    #[error("port {port} already assigned from {first}")]
    DuplicatePort { port: u32, first: String },
}

impl From<MappingError> for SkipReason {
    fn from(err: MappingError) -> Self {
        match err {
            MappingError::OutOfRange { index, valid } => {
                Self::StackIndexOutOfRange { index, valid }
            }
            MappingError::NotInExpectedGroup { group, expected } => {
                Self::NotInExpectedGroup { group, expected }
            }
            MappingError::Unrecognized => Self::UnrecognizedName,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum OutcomeStatus {
    Applied,
    /// Would have been applied; dry run.
    Planned,
    Skipped { reason: SkipReason },
    Failed { error: String },
}

impl OutcomeStatus {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Applied => "applied",
            Self::Planned => "planned",
            Self::Skipped { .. } => "skipped",
            Self::Failed { .. } => "failed",
        }
    }

    pub fn detail(&self) -> Option<String> {
        match self {
            Self::Skipped { reason } => Some(reason.to_string()),
            Self::Failed { error } => Some(error.clone()),
            Self::Applied | Self::Planned => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortOutcome {
    pub interface: String,
    pub serial: Option<DeviceSerial>,
    pub port: Option<u32>,
    #[serde(flatten)]
    pub status: OutcomeStatus,
}

impl PortOutcome {
    pub(crate) fn for_assignment(assignment: &PortAssignment, status: OutcomeStatus) -> Self {
        Self {
            interface: assignment.interface.clone(),
            serial: Some(assignment.serial.clone()),
            port: Some(assignment.port),
            status,
        }
    }

    pub(crate) fn unmapped(interface: &str, port: Option<u32>, reason: SkipReason) -> Self {
        Self {
            interface: interface.to_owned(),
            serial: None,
            port,
            status: OutcomeStatus::Skipped { reason },
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ReportCounts {
    pub applied: usize,
    pub planned: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl ReportCounts {
    pub fn total(&self) -> usize {
        self.applied + self.planned + self.skipped + self.failed
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// Hostname of the legacy device, when the configuration came from one.
    pub hostname: Option<String>,
    pub dry_run: bool,
    pub decision: Option<FormatDecision>,
    /// Interface blocks found in the configuration.
    pub interfaces_seen: usize,
    /// Non-Ethernet interfaces left out of conversion.
    pub excluded: usize,
    pub outcomes: Vec<PortOutcome>,
}

impl MigrationReport {
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            hostname: None,
            dry_run,
            decision: None,
            interfaces_seen: 0,
            excluded: 0,
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, outcome: PortOutcome) {
        self.outcomes.push(outcome);
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    pub fn counts(&self) -> ReportCounts {
        self.outcomes
            .iter()
            .fold(ReportCounts::default(), |mut counts, outcome| {
                match outcome.status {
                    OutcomeStatus::Applied => counts.applied += 1,
                    OutcomeStatus::Planned => counts.planned += 1,
                    OutcomeStatus::Skipped { .. } => counts.skipped += 1,
                    OutcomeStatus::Failed { .. } => counts.failed += 1,
                }
                counts
            })
    }

    pub fn has_failures(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, OutcomeStatus::Failed { .. }))
    }

    /// No Ethernet interface was recognized in the configuration.
    pub fn is_empty(&self) -> bool {
        self.decision.is_none()
    }
}
