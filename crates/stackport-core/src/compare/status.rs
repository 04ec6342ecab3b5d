use std::collections::HashMap;

use serde::Serialize;
use tracing::{debug, warn};

use super::{
    ComparisonOutcome, Compared, DeviceError, LinkState, MismatchKind, StatusComparisonReport,
    map_records,
};
use crate::dashboard::SwitchDashboard;
use crate::model::DeviceSerial;
use crate::records::InterfaceStatusRecord;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusComparison {
    pub interface: String,
    pub serial: DeviceSerial,
    pub port: u32,
    pub legacy: LinkState,
    pub replacement: Option<LinkState>,
    #[serde(flatten)]
    pub outcome: ComparisonOutcome,
}

impl Compared for StatusComparison {
    fn outcome(&self) -> &ComparisonOutcome {
        &self.outcome
    }
}

/// Compare legacy link states with the replacement ports' live status.
pub async fn compare_status(
    dashboard: &dyn SwitchDashboard,
    serials: &[DeviceSerial],
    records: &[InterfaceStatusRecord],
    expected_group: Option<u32>,
) -> StatusComparisonReport {
    let mapping = map_records(records, |r| r.interface.as_str(), serials, expected_group);

    let mut live: HashMap<DeviceSerial, HashMap<String, LinkState>> = HashMap::new();
    let mut device_errors = Vec::new();
    for serial in mapping.serials() {
        match dashboard.list_port_statuses(serial.as_str()).await {
            Ok(rows) => {
                debug!(%serial, ports = rows.len(), "port statuses fetched");
                let states = rows
                    .into_iter()
                    .map(|row| {
                        let state = if row.is_connected() {
                            LinkState::Up
                        } else {
                            LinkState::Down
                        };
                        (row.port_id, state)
                    })
                    .collect();
                live.insert(serial, states);
            }
            Err(e) => {
                warn!(%serial, error = %e, "could not fetch port statuses");
                device_errors.push(DeviceError {
                    serial,
                    error: e.to_string(),
                });
            }
        }
    }

    let joined: Vec<StatusComparison> = mapping
        .mapped
        .iter()
        .map(|m| {
            let legacy = LinkState::from_legacy(&m.record.status);
            let replacement = live
                .get(&m.serial)
                .and_then(|ports| ports.get(&m.port.to_string()))
                .copied();
            let outcome = match replacement {
                None => ComparisonOutcome::NotFound,
                Some(state) if state == legacy => ComparisonOutcome::Match,
                Some(state) => ComparisonOutcome::Mismatch {
                    mismatch: MismatchKind::Status {
                        legacy,
                        replacement: state,
                    },
                },
            };
            StatusComparison {
                interface: m.interface.clone(),
                serial: m.serial.clone(),
                port: m.port,
                legacy,
                replacement,
                outcome,
            }
        })
        .collect();

    let mut report = mapping.into_report(joined, 0);
    report.device_errors = device_errors;
    report
}
