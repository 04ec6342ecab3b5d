// Dashboard API client modules
//
// Hand-written client for the handful of switch endpoints the migration
// engine consumes. Transport mechanics live in `client`; endpoint groups
// are inherent methods in sibling files.

pub mod client;
pub mod clients;
pub mod models;
pub mod ports;

pub use client::DashboardClient;
