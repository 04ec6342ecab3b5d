// ── Dashboard seam ──
//
// The migration and comparison engines reach the cloud dashboard through
// this trait so they can run against the HTTP client or an in-memory fake.

use std::time::Duration;

use async_trait::async_trait;
use stackport_api::{
    DashboardClient, DeviceClient, Error, SwitchPort, SwitchPortStatus, SwitchPortUpdate,
};

#[async_trait]
pub trait SwitchDashboard: Send + Sync {
    async fn list_switch_ports(&self, serial: &str) -> Result<Vec<SwitchPort>, Error>;

    async fn update_switch_port(
        &self,
        serial: &str,
        port_id: &str,
        update: &SwitchPortUpdate,
    ) -> Result<(), Error>;

    async fn list_port_statuses(&self, serial: &str) -> Result<Vec<SwitchPortStatus>, Error>;

    async fn list_device_clients(
        &self,
        serial: &str,
        timespan: Duration,
    ) -> Result<Vec<DeviceClient>, Error>;
}

#[async_trait]
impl SwitchDashboard for DashboardClient {
    async fn list_switch_ports(&self, serial: &str) -> Result<Vec<SwitchPort>, Error> {
        DashboardClient::list_switch_ports(self, serial).await
    }

    async fn update_switch_port(
        &self,
        serial: &str,
        port_id: &str,
        update: &SwitchPortUpdate,
    ) -> Result<(), Error> {
        DashboardClient::update_switch_port(self, serial, port_id, update)
            .await
            .map(|_| ())
    }

    async fn list_port_statuses(&self, serial: &str) -> Result<Vec<SwitchPortStatus>, Error> {
        DashboardClient::list_port_statuses(self, serial).await
    }

    async fn list_device_clients(
        &self,
        serial: &str,
        timespan: Duration,
    ) -> Result<Vec<DeviceClient>, Error> {
        DashboardClient::list_device_clients(self, serial, timespan).await
    }
}
