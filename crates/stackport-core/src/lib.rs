// stackport-core: Migration and comparison engine between legacy stacked
// switches and their cloud-managed replacements.

pub mod compare;
pub mod connection;
pub mod credential;
pub mod dashboard;
pub mod error;
pub mod extract;
pub mod format;
pub mod interface;
pub mod mapper;
pub mod migrate;
pub mod model;
pub mod records;

#[cfg(test)]
pub(crate) mod testing;

// ── Primary re-exports ──────────────────────────────────────────────
pub use compare::{
    Comparator, ComparisonCounts, ComparisonOutcome, ComparisonReport, DeviceError, LinkState,
    MacComparison, MacComparisonReport, MacFilterPolicy, MismatchKind, RecordSource,
    SkippedRecord, StatusComparison, StatusComparisonReport, compare_mac_table, compare_status,
};
pub use connection::{
    AttemptFailure, CliConnector, CliPlatform, CliSession, CommandOutput, Connection,
    DeviceProfile, INTERFACE_STATUS_COMMAND, MAC_TABLE_COMMAND, MAC_TABLE_READ_TIMEOUT,
    RUNNING_CONFIG_COMMAND, RetrieveOptions, Retrieved, SessionError, connect, retrieve,
};
pub use connection::ssh::SshConnector;
pub use credential::Credential;
pub use dashboard::SwitchDashboard;
pub use error::CoreError;
pub use extract::{InterfaceBlock, LinkNegotiation, PortMode, PortSettings, StpGuard};
pub use format::{FormatDecision, NamingFormat};
pub use interface::InterfaceName;
pub use mapper::{IndexBase, MappingError};
pub use migrate::{ConfigSource, ConversionRequest, Migrator};
pub use migrate::report::{MigrationReport, OutcomeStatus, PortOutcome, ReportCounts, SkipReason};
pub use model::{DeviceSerial, MacAddress, PortAssignment};
pub use records::{InterfaceStatusRecord, MacTableRecord};

pub use stackport_api::{
    CLIENT_LOOKBACK, DEFAULT_BASE_URL, DashboardClient, TlsMode, TransportConfig,
};
