// ── Assignment application ──
//
// Per device: fetch the port existence set, then submit each assignment in
// order. Devices run concurrently up to a limit; each device fills its own
// outcome list and the lists are concatenated in serial-list order.

use std::collections::HashSet;

use futures_util::stream::{self, StreamExt};
use indexmap::IndexMap;
use stackport_api::SwitchPortUpdate;
use thiserror::Error;
use tracing::{debug, info, warn};

use super::report::{OutcomeStatus, PortOutcome, SkipReason};
use crate::dashboard::SwitchDashboard;
use crate::extract::{DEFAULT_ALLOWED_VLANS, PortMode, PortSettings};
use crate::model::{DeviceSerial, PortAssignment};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ApplyOptions {
    pub dry_run: bool,
    /// Devices processed at once; values below 1 mean sequential.
    pub concurrency: usize,
}

impl Default for ApplyOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            concurrency: 1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field} `{value}` is not a valid VLAN ID")]
pub struct InvalidVlan {
    pub field: &'static str,
    pub value: String,
}

fn vlan_id(field: &'static str, value: &str) -> Result<u16, InvalidVlan> {
    value
        .trim()
        .parse::<u16>()
        .ok()
        .filter(|id| (1..=4094).contains(id))
        .ok_or_else(|| InvalidVlan {
            field,
            value: value.to_owned(),
        })
}

/// Translate extracted settings into the dashboard's port update body.
///
/// Access ports always send the platform's default allowed range.
pub fn update_payload(settings: &PortSettings) -> Result<SwitchPortUpdate, InvalidVlan> {
    let allowed_vlans = match settings.mode {
        PortMode::Trunk => settings.allowed_vlans.clone(),
        PortMode::Access => DEFAULT_ALLOWED_VLANS.to_owned(),
    };
    Ok(SwitchPortUpdate {
        name: settings.description.clone(),
        enabled: settings.enabled,
        port_type: settings.mode.to_string(),
        vlan: vlan_id("vlan", &settings.vlan)?,
        voice_vlan: settings
            .voice_vlan
            .as_deref()
            .map(|v| vlan_id("voice vlan", v))
            .transpose()?,
        allowed_vlans,
        poe_enabled: settings.poe_enabled,
        isolation_enabled: settings.isolation_enabled,
        rstp_enabled: settings.rstp_enabled,
        stp_guard: settings.stp_guard.to_string(),
        link_negotiation: settings.link_negotiation.to_string(),
    })
}

/// Apply every device's assignments and return outcomes in serial order.
pub async fn apply_assignments(
    dashboard: &dyn SwitchDashboard,
    assignments: IndexMap<DeviceSerial, Vec<PortAssignment>>,
    options: ApplyOptions,
) -> Vec<PortOutcome> {
    let per_device: Vec<Vec<PortOutcome>> = stream::iter(
        assignments
            .into_iter()
            .filter(|(_, items)| !items.is_empty()),
    )
    .map(|(serial, items)| apply_device(dashboard, serial, items, options.dry_run))
    .buffered(options.concurrency.max(1))
    .collect()
    .await;

    per_device.into_iter().flatten().collect()
}

async fn apply_device(
    dashboard: &dyn SwitchDashboard,
    serial: DeviceSerial,
    items: Vec<PortAssignment>,
    dry_run: bool,
) -> Vec<PortOutcome> {
    let existing: HashSet<String> = match dashboard.list_switch_ports(serial.as_str()).await {
        Ok(ports) => ports.into_iter().map(|p| p.port_id).collect(),
        Err(e) => {
            warn!(%serial, error = %e, "could not list replacement ports");
            let error = format!("could not list ports on {serial}: {e}");
            return items
                .iter()
                .map(|a| {
                    let status = OutcomeStatus::Failed {
                        error: error.clone(),
                    };
                    PortOutcome::for_assignment(a, status)
                })
                .collect();
        }
    };
    debug!(%serial, ports = existing.len(), "existence set fetched");

    let mut outcomes = Vec::with_capacity(items.len());
    for assignment in &items {
        let status = apply_one(dashboard, &existing, assignment, dry_run).await;
        outcomes.push(PortOutcome::for_assignment(assignment, status));
    }
    outcomes
}

async fn apply_one(
    dashboard: &dyn SwitchDashboard,
    existing: &HashSet<String>,
    assignment: &PortAssignment,
    dry_run: bool,
) -> OutcomeStatus {
    let port_id = assignment.port_id();
    if !existing.contains(&port_id) {
        debug!(serial = %assignment.serial, port = %port_id, "port does not exist remotely");
        return OutcomeStatus::Skipped {
            reason: SkipReason::PortNotPresent {
                port: assignment.port,
            },
        };
    }

    let update = match update_payload(&assignment.settings) {
        Ok(update) => update,
        Err(e) => return OutcomeStatus::Failed { error: e.to_string() },
    };
    if dry_run {
        return OutcomeStatus::Planned;
    }

    match dashboard
        .update_switch_port(assignment.serial.as_str(), &port_id, &update)
        .await
    {
        Ok(()) => {
            info!(
                serial = %assignment.serial,
                port = %port_id,
                interface = %assignment.interface,
                "port updated"
            );
            OutcomeStatus::Applied
        }
        Err(e) => {
            warn!(serial = %assignment.serial, port = %port_id, error = %e, "port update failed");
            OutcomeStatus::Failed {
                error: e.to_string(),
            }
        }
    }
}
