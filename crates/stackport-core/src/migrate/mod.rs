// ── Migration orchestrator ──
//
// Start → AcquireConfig → Parse → DetectFormat → BuildAssignments →
// FetchExistingPorts (per device) → Apply → Report. Only input and
// acquisition problems abort the run; everything after that is recorded
// per port in the `MigrationReport`.

pub mod apply;
pub mod plan;
pub mod report;

use tracing::info;

use crate::connection::{
    self, CliConnector, DeviceProfile, RUNNING_CONFIG_COMMAND, RetrieveOptions,
};
use crate::credential::Credential;
use crate::dashboard::SwitchDashboard;
use crate::error::CoreError;
use crate::model::DeviceSerial;

use self::apply::{ApplyOptions, apply_assignments};
use self::plan::build_plan;
use self::report::MigrationReport;

/// Where the legacy configuration comes from.
#[derive(Debug, Clone)]
pub enum ConfigSource {
    /// Retrieve `show running-config` from the device.
    Device {
        address: String,
        credentials: Vec<Credential>,
        profile: DeviceProfile,
    },
    /// Configuration text supplied by the caller.
    Text(String),
}

#[derive(Debug, Clone)]
pub struct ConversionRequest {
    /// Replacement devices in stack order.
    pub serials: Vec<DeviceSerial>,
    pub source: ConfigSource,
    /// Required module group for three-part names.
    pub expected_group: Option<u32>,
    pub dry_run: bool,
    pub concurrency: usize,
}

impl ConversionRequest {
    pub fn new(serials: Vec<DeviceSerial>, source: ConfigSource) -> Self {
        Self {
            serials,
            source,
            expected_group: Some(0),
            dry_run: false,
            concurrency: 1,
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.serials.is_empty() {
            return Err(CoreError::precondition("at least one device serial is required"));
        }
        match &self.source {
            ConfigSource::Device { address, .. } if address.trim().is_empty() => {
                Err(CoreError::precondition("device address is empty"))
            }
            ConfigSource::Text(text) if text.trim().is_empty() => {
                Err(CoreError::precondition("configuration text is empty"))
            }
            _ => Ok(()),
        }
    }
}

/// Drives a conversion against a dashboard, reaching devices through `connector`.
pub struct Migrator<'a> {
    dashboard: &'a dyn SwitchDashboard,
    connector: &'a dyn CliConnector,
}

impl<'a> Migrator<'a> {
    pub fn new(dashboard: &'a dyn SwitchDashboard, connector: &'a dyn CliConnector) -> Self {
        Self {
            dashboard,
            connector,
        }
    }

    pub async fn run(&self, request: ConversionRequest) -> Result<MigrationReport, CoreError> {
        request.validate()?;
        let mut report = MigrationReport::new(request.dry_run);

        let (config, hostname) = self.acquire_config(&request.source).await?;
        report.hostname = hostname;

        let plan = build_plan(&config, &request.serials, request.expected_group);
        report.decision = plan.decision;
        report.interfaces_seen = plan.interfaces_seen;
        report.excluded = plan.excluded;
        if plan.decision.is_none() {
            info!("no Ethernet interfaces found in configuration");
        }
        for outcome in plan.skipped {
            report.record(outcome);
        }

        let outcomes = apply_assignments(
            self.dashboard,
            plan.assignments,
            ApplyOptions {
                dry_run: request.dry_run,
                concurrency: request.concurrency,
            },
        )
        .await;
        for outcome in outcomes {
            report.record(outcome);
        }
        report.finish();

        let counts = report.counts();
        info!(
            applied = counts.applied,
            planned = counts.planned,
            skipped = counts.skipped,
            failed = counts.failed,
            "conversion finished"
        );
        Ok(report)
    }

    async fn acquire_config(
        &self,
        source: &ConfigSource,
    ) -> Result<(String, Option<String>), CoreError> {
        match source {
            ConfigSource::Text(text) => Ok((text.clone(), None)),
            ConfigSource::Device {
                address,
                credentials,
                profile,
            } => {
                let retrieved = connection::retrieve(
                    self.connector,
                    address,
                    credentials,
                    profile,
                    RUNNING_CONFIG_COMMAND,
                    RetrieveOptions {
                        read_timeout: profile.read_timeout,
                        structured: false,
                    },
                )
                .await?;
                let text = retrieved.output.into_text().ok_or_else(|| {
                    CoreError::Internal("running configuration was not returned as text".into())
                })?;
                Ok((text, Some(retrieved.hostname)))
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::migrate::report::{OutcomeStatus, SkipReason};
    use crate::testing::{FakeBehavior, FakeConnector, FakeDashboard};
    use pretty_assertions::assert_eq;

    const CONFIG: &str = "\
hostname SW-CORE-01
!
interface Vlan1
 ip address 10.0.0.2 255.255.255.0
!
interface GigabitEthernet1/0/1
 description Desk 12
 switchport access vlan 20
 switchport voice vlan 30
!
interface GigabitEthernet1/0/2
 shutdown
!
interface GigabitEthernet1/0/52
!
interface GigabitEthernet2/0/1
 switchport mode trunk
!
interface GigabitEthernet3/0/1
!
";

    fn serials() -> Vec<DeviceSerial> {
        vec![DeviceSerial::from("Q2-A"), DeviceSerial::from("Q2-B")]
    }

    fn dashboard() -> FakeDashboard {
        FakeDashboard::default()
            .with_ports("Q2-A", 1..=48)
            .with_ports("Q2-B", 1..=48)
    }

    fn text_request() -> ConversionRequest {
        ConversionRequest::new(serials(), ConfigSource::Text(CONFIG.into()))
    }

    #[tokio::test]
    async fn applies_existing_ports_and_reports_the_rest() {
        let dashboard = dashboard();
        let connector = FakeConnector::new(vec![]);
        let report = Migrator::new(&dashboard, &connector)
            .run(text_request())
            .await
            .unwrap();

        let counts = report.counts();
        assert_eq!(counts.applied, 3);
        assert_eq!(counts.skipped, 2);
        assert_eq!(counts.failed, 0);
        assert_eq!(report.excluded, 1);
        assert!(report.finished_at.is_some());

        let updates = dashboard.updates.lock().unwrap();
        let (serial, port, body) = &updates[0];
        assert_eq!((serial.as_str(), port.as_str()), ("Q2-A", "1"));
        assert_eq!(body.vlan, 20);
        assert_eq!(body.voice_vlan, Some(30));
        assert!(!updates[1].2.enabled);
        assert_eq!(updates[2].0, "Q2-B");
        assert_eq!(updates[2].2.allowed_vlans, "1-1000");

        let missing = report
            .outcomes
            .iter()
            .find(|o| o.interface == "GigabitEthernet1/0/52")
            .unwrap();
        assert_eq!(
            missing.status,
            OutcomeStatus::Skipped {
                reason: SkipReason::PortNotPresent { port: 52 }
            }
        );
    }

    #[tokio::test]
    async fn dry_run_submits_nothing() {
        let dashboard = dashboard();
        let connector = FakeConnector::new(vec![]);
        let mut request = text_request();
        request.dry_run = true;
        let report = Migrator::new(&dashboard, &connector).run(request).await.unwrap();
        assert_eq!(report.counts().planned, 3);
        assert_eq!(dashboard.update_count(), 0);
    }

    #[tokio::test]
    async fn rejected_update_does_not_stop_the_batch() {
        let dashboard = dashboard().rejecting("Q2-A", "1");
        let connector = FakeConnector::new(vec![]);
        let report = Migrator::new(&dashboard, &connector)
            .run(text_request())
            .await
            .unwrap();
        let counts = report.counts();
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.applied, 2);
        assert!(report.has_failures());
    }

    #[tokio::test]
    async fn unreachable_device_fails_only_its_ports() {
        let dashboard = FakeDashboard::default()
            .with_ports("Q2-B", 1..=48)
            .failing("Q2-A");
        let connector = FakeConnector::new(vec![]);
        let mut request = text_request();
        request.concurrency = 2;
        let report = Migrator::new(&dashboard, &connector).run(request).await.unwrap();
        let counts = report.counts();
        assert_eq!(counts.failed, 3);
        assert_eq!(counts.applied, 1);

        // Outcomes keep serial-list order regardless of concurrency.
        let order: Vec<&str> = report
            .outcomes
            .iter()
            .filter_map(|o| o.serial.as_ref().map(DeviceSerial::as_str))
            .collect();
        assert_eq!(order, vec!["Q2-A", "Q2-A", "Q2-A", "Q2-B"]);
    }

    #[tokio::test]
    async fn configuration_from_device() {
        let dashboard = dashboard();
        let connector = FakeConnector::new(vec![FakeBehavior::RejectAuth, FakeBehavior::Accept])
            .with_output(RUNNING_CONFIG_COMMAND, CONFIG);
        let request = ConversionRequest::new(
            serials(),
            ConfigSource::Device {
                address: "10.0.0.2".into(),
                credentials: vec![
                    Credential::new("old", "pw"),
                    Credential::new("netops", "pw"),
                ],
                profile: DeviceProfile::default(),
            },
        );
        let report = Migrator::new(&dashboard, &connector).run(request).await.unwrap();
        assert_eq!(report.hostname.as_deref(), Some("SW-FAKE"));
        assert_eq!(report.counts().applied, 3);
        assert_eq!(connector.saves(), 1);
    }

    #[tokio::test]
    async fn unreachable_legacy_device_aborts() {
        let dashboard = dashboard();
        let connector = FakeConnector::new(vec![FakeBehavior::Timeout]);
        let request = ConversionRequest::new(
            serials(),
            ConfigSource::Device {
                address: "10.0.0.2".into(),
                credentials: vec![Credential::new("netops", "pw")],
                profile: DeviceProfile::default(),
            },
        );
        let err = Migrator::new(&dashboard, &connector).run(request).await.unwrap_err();
        assert!(matches!(err, CoreError::Timeout { .. }));
        assert_eq!(dashboard.update_count(), 0);
    }

    #[tokio::test]
    async fn preconditions_are_checked_first() {
        let dashboard = dashboard();
        let connector = FakeConnector::new(vec![FakeBehavior::Accept]);
        let migrator = Migrator::new(&dashboard, &connector);

        let err = migrator
            .run(ConversionRequest::new(vec![], ConfigSource::Text(CONFIG.into())))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Precondition { .. }));

        let err = migrator
            .run(ConversionRequest::new(serials(), ConfigSource::Text("  \n".into())))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Precondition { .. }));
        assert_eq!(connector.attempts(), 0);
    }

    #[tokio::test]
    async fn no_ethernet_interfaces_is_an_empty_report() {
        let dashboard = dashboard();
        let connector = FakeConnector::new(vec![]);
        let request = ConversionRequest::new(
            serials(),
            ConfigSource::Text("interface Vlan1\n!\n".into()),
        );
        let report = Migrator::new(&dashboard, &connector).run(request).await.unwrap();
        assert!(report.is_empty());
        assert_eq!(report.counts().total(), 0);
    }
}
