// Dashboard switch-port endpoints
//
// Port inventory (the existence set), per-port settings updates, and
// live port status.

use tracing::debug;

use crate::dashboard::client::DashboardClient;
use crate::dashboard::models::{SwitchPort, SwitchPortStatus, SwitchPortUpdate};
use crate::error::Error;

impl DashboardClient {
    /// List every port that exists on a switch.
    ///
    /// `GET /devices/{serial}/switch/ports`
    pub async fn list_switch_ports(&self, serial: &str) -> Result<Vec<SwitchPort>, Error> {
        let url = self.device_url(serial, "switch/ports")?;
        debug!(serial, "listing switch ports");
        self.get(url).await
    }

    /// Replace one port's settings.
    ///
    /// `PUT /devices/{serial}/switch/ports/{portId}`
    pub async fn update_switch_port(
        &self,
        serial: &str,
        port_id: &str,
        update: &SwitchPortUpdate,
    ) -> Result<SwitchPort, Error> {
        let url = self.device_url(serial, &format!("switch/ports/{port_id}"))?;
        debug!(serial, port_id, "updating switch port");
        self.put(url, update).await
    }

    /// Live link status for every port on a switch.
    ///
    /// `GET /devices/{serial}/switch/ports/statuses`
    pub async fn list_port_statuses(&self, serial: &str) -> Result<Vec<SwitchPortStatus>, Error> {
        let url = self.device_url(serial, "switch/ports/statuses")?;
        debug!(serial, "listing switch port statuses");
        self.get(url).await
    }
}
