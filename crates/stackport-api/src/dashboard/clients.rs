// Dashboard device-client endpoints

use std::time::Duration;

use tracing::debug;

use crate::dashboard::client::DashboardClient;
use crate::dashboard::models::DeviceClient;
use crate::error::Error;

impl DashboardClient {
    /// Clients seen by a device within `timespan`.
    ///
    /// `GET /devices/{serial}/clients?timespan={secs}`
    pub async fn list_device_clients(
        &self,
        serial: &str,
        timespan: Duration,
    ) -> Result<Vec<DeviceClient>, Error> {
        let mut url = self.device_url(serial, "clients")?;
        url.query_pairs_mut()
            .append_pair("timespan", &timespan.as_secs().to_string());
        debug!(serial, timespan_secs = timespan.as_secs(), "listing device clients");
        self.get(url).await
    }
}
