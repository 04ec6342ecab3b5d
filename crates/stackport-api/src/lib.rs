// stackport-api: Async Rust client for the cloud dashboard switch-port API

pub mod dashboard;
pub mod error;
pub mod transport;

pub use dashboard::DashboardClient;
pub use dashboard::client::DEFAULT_BASE_URL;
pub use dashboard::models::{
    DeviceClient, SwitchPort, SwitchPortStatus, SwitchPortUpdate, CLIENT_LOOKBACK,
};
pub use error::Error;
pub use transport::{TlsMode, TransportConfig};
