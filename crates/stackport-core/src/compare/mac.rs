use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use stackport_api::DeviceClient;
use tracing::{debug, warn};

use super::{
    ComparisonOutcome, Compared, DeviceError, MacComparisonReport, MismatchKind, map_records,
};
use crate::dashboard::SwitchDashboard;
use crate::interface::InterfaceName;
use crate::model::{DeviceSerial, MacAddress};
use crate::records::MacTableRecord;

pub const DEFAULT_UPLINK_THRESHOLD: u32 = 48;

/// Which legacy MAC entries take part in a comparison.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacFilterPolicy {
    /// Ports numbered above this are uplinks and are left out.
    pub uplink_threshold: Option<u32>,
    /// When non-empty, only ports whose name starts with one of these.
    pub port_prefixes: Vec<String>,
}

impl Default for MacFilterPolicy {
    fn default() -> Self {
        Self {
            uplink_threshold: Some(DEFAULT_UPLINK_THRESHOLD),
            port_prefixes: Vec::new(),
        }
    }
}

impl MacFilterPolicy {
    /// No filtering at all.
    pub fn none() -> Self {
        Self {
            uplink_threshold: None,
            port_prefixes: Vec::new(),
        }
    }

    pub fn admits(&self, port_name: &str) -> bool {
        let port_name = port_name.trim();
        if !self.port_prefixes.is_empty()
            && !self
                .port_prefixes
                .iter()
                .any(|prefix| port_name.starts_with(prefix.as_str()))
        {
            return false;
        }
        match (self.uplink_threshold, InterfaceName::parse(port_name).port()) {
            (Some(threshold), Some(port)) => port <= threshold,
            _ => true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MacComparison {
    pub mac: MacAddress,
    pub interface: String,
    pub vlan: String,
    pub serial: DeviceSerial,
    pub port: u32,
    pub replacement_port: Option<String>,
    pub replacement_vlan: Option<String>,
    #[serde(flatten)]
    pub outcome: ComparisonOutcome,
}

impl Compared for MacComparison {
    fn outcome(&self) -> &ComparisonOutcome {
        &self.outcome
    }
}

/// Check that every legacy MAC entry shows up on its mapped replacement port.
pub async fn compare_mac_table(
    dashboard: &dyn SwitchDashboard,
    serials: &[DeviceSerial],
    records: &[MacTableRecord],
    policy: &MacFilterPolicy,
    expected_group: Option<u32>,
    timespan: Duration,
) -> MacComparisonReport {
    let admitted: Vec<&MacTableRecord> = records
        .iter()
        .filter(|r| policy.admits(&r.destination_port))
        .collect();
    let filtered = records.len() - admitted.len();
    debug!(total = records.len(), filtered, "MAC filter policy applied");

    let mapping = map_records(
        &admitted,
        |r| r.destination_port.as_str(),
        serials,
        expected_group,
    );

    let mut clients: HashMap<DeviceSerial, Vec<DeviceClient>> = HashMap::new();
    let mut device_errors = Vec::new();
    for serial in mapping.serials() {
        match dashboard.list_device_clients(serial.as_str(), timespan).await {
            Ok(list) => {
                debug!(%serial, clients = list.len(), "clients fetched");
                clients.insert(serial, list);
            }
            Err(e) => {
                warn!(%serial, error = %e, "could not fetch clients");
                device_errors.push(DeviceError {
                    serial,
                    error: e.to_string(),
                });
            }
        }
    }

    let joined: Vec<MacComparison> = mapping
        .mapped
        .iter()
        .map(|m| {
            let mac = MacAddress::new(&m.record.destination_address);
            let vlan = m.record.vlan_id.trim().to_owned();
            let client = clients
                .get(&m.serial)
                .and_then(|list| list.iter().find(|c| MacAddress::new(&c.mac) == mac));
            let outcome = match client {
                None => ComparisonOutcome::NotFound,
                Some(client) => join_client(client, m.port, &vlan),
            };
            MacComparison {
                mac,
                interface: m.interface.clone(),
                vlan,
                serial: m.serial.clone(),
                port: m.port,
                replacement_port: client.and_then(|c| c.switchport.clone()),
                replacement_vlan: client.and_then(|c| c.vlan.clone()),
                outcome,
            }
        })
        .collect();

    let mut report = mapping.into_report(joined, filtered);
    report.device_errors = device_errors;
    report
}

fn join_client(client: &DeviceClient, port: u32, legacy_vlan: &str) -> ComparisonOutcome {
    let expected = port.to_string();
    match client.switchport.as_deref().map(str::trim) {
        Some(actual) if actual == expected => match client.vlan.as_deref().map(str::trim) {
            Some(seen) if !legacy_vlan.is_empty() && seen != legacy_vlan => {
                ComparisonOutcome::Mismatch {
                    mismatch: MismatchKind::Vlan {
                        legacy: legacy_vlan.to_owned(),
                        replacement: seen.to_owned(),
                    },
                }
            }
            _ => ComparisonOutcome::Match,
        },
        actual => ComparisonOutcome::Mismatch {
            mismatch: MismatchKind::Port {
                expected,
                actual: actual.map(str::to_owned),
            },
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::FakeDashboard;
    use pretty_assertions::assert_eq;
    use stackport_api::CLIENT_LOOKBACK;

    fn entry(mac: &str, port: &str, vlan: &str) -> MacTableRecord {
        MacTableRecord {
            destination_address: mac.into(),
            destination_port: port.into(),
            vlan_id: vlan.into(),
        }
    }

    #[test]
    fn threshold_port_is_kept_and_ports_above_are_dropped() {
        let policy = MacFilterPolicy::default();
        assert!(policy.admits("GigabitEthernet1/0/48"));
        assert!(!policy.admits("GigabitEthernet1/0/49"));
        assert!(!policy.admits("TenGigabitEthernet1/1/52"));
        assert!(policy.admits("CPU"));
    }

    #[test]
    fn prefix_filter() {
        let policy = MacFilterPolicy {
            uplink_threshold: None,
            port_prefixes: vec!["Gi".into()],
        };
        assert!(policy.admits("Gi1/0/5"));
        assert!(policy.admits("GigabitEthernet1/0/5"));
        assert!(!policy.admits("Te1/1/1"));
        assert!(MacFilterPolicy::none().admits("Te1/1/60"));
    }

    #[tokio::test]
    async fn mac_join_outcomes() {
        let dashboard = FakeDashboard::default()
            .with_client("Q2-A", "00:11:22:33:44:55", "5", Some("20"))
            .with_client("Q2-A", "aa:bb:cc:00:01:00", "9", Some("20"))
            .with_client("Q2-B", "de:ad:be:ef:00:01", "3", Some("40"));
        let serials = vec![DeviceSerial::from("Q2-A"), DeviceSerial::from("Q2-B")];
        let records = vec![
            entry("0011.2233.4455", "Gi1/0/5", "20"),
            entry("AABB.CC00.0100", "Gi1/0/7", "20"),
            entry("dead.beef.0001", "Gi2/0/3", "30"),
            entry("0000.0000.0001", "Gi2/0/4", "30"),
            entry("0000.0000.0002", "Gi1/0/49", "30"),
            entry("0100.0ccc.cccc", "CPU", "1"),
        ];

        let report = compare_mac_table(
            &dashboard,
            &serials,
            &records,
            &MacFilterPolicy::default(),
            Some(0),
            CLIENT_LOOKBACK,
        )
        .await;

        assert_eq!(report.filtered, 1);
        assert_eq!(report.excluded, 1);
        let outcomes: Vec<&ComparisonOutcome> = report.records.iter().map(|r| &r.outcome).collect();
        assert_eq!(
            outcomes,
            vec![
                &ComparisonOutcome::Match,
                &ComparisonOutcome::Mismatch {
                    mismatch: MismatchKind::Port {
                        expected: "7".into(),
                        actual: Some("9".into())
                    }
                },
                &ComparisonOutcome::Mismatch {
                    mismatch: MismatchKind::Vlan {
                        legacy: "30".into(),
                        replacement: "40".into()
                    }
                },
                &ComparisonOutcome::NotFound,
            ]
        );
        assert_eq!(report.records[0].mac.to_string(), "00:11:22:33:44:55");
        assert_eq!(report.records[2].serial.as_str(), "Q2-B");
    }

    #[tokio::test]
    async fn threshold_boundary_in_comparison() {
        let dashboard =
            FakeDashboard::default().with_client("Q2-A", "00:00:00:00:00:48", "48", None);
        let serials = vec![DeviceSerial::from("Q2-A")];
        let records = vec![
            entry("0000.0000.0048", "Gi1/0/48", "1"),
            entry("0000.0000.0049", "Gi1/0/49", "1"),
        ];
        let report = compare_mac_table(
            &dashboard,
            &serials,
            &records,
            &MacFilterPolicy::default(),
            None,
            CLIENT_LOOKBACK,
        )
        .await;
        assert_eq!(report.filtered, 1);
        assert_eq!(report.records.len(), 1);
        assert_eq!(report.records[0].port, 48);
        assert_eq!(report.records[0].outcome, ComparisonOutcome::Match);
    }
}
