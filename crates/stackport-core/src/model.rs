// ── Shared identity types ──
//
// DeviceSerial identifies a replacement switch; its position in the
// caller's list encodes stack order. MacAddress normalizes the many
// vendor spellings of a hardware address so both sides compare equal.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::extract::PortSettings;

// ── DeviceSerial ────────────────────────────────────────────────────

/// Opaque identifier of a replacement device.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DeviceSerial(String);

impl DeviceSerial {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_owned())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for DeviceSerial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for DeviceSerial {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for DeviceSerial {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl FromStr for DeviceSerial {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── MacAddress ──────────────────────────────────────────────────────

/// MAC address normalized to lowercase hex digits with separators removed.
///
/// `0011.2233.4455`, `00-11-22-33-44-55` and `00:11:22:33:44:55` all
/// normalize to the same value. Display renders colon-separated pairs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct MacAddress(String);

impl MacAddress {
    pub fn new(raw: impl AsRef<str>) -> Self {
        let normalized = raw
            .as_ref()
            .chars()
            .filter(char::is_ascii_alphanumeric)
            .map(|c| c.to_ascii_lowercase())
            .collect();
        Self(normalized)
    }

    /// The bare normalized digits (`001122334455`).
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.len() != 12 {
            return f.write_str(&self.0);
        }
        let pairs: Vec<&str> = (0..12)
            .step_by(2)
            .filter_map(|i| self.0.get(i..i + 2))
            .collect();
        f.write_str(&pairs.join(":"))
    }
}

impl From<String> for MacAddress {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> Self {
        mac.to_string()
    }
}

impl FromStr for MacAddress {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(s))
    }
}

// ── PortAssignment ──────────────────────────────────────────────────

/// One legacy interface resolved to a replacement port, with its settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortAssignment {
    /// Legacy interface name the settings came from.
    pub interface: String,
    pub serial: DeviceSerial,
    pub port: u32,
    pub settings: PortSettings,
}

impl PortAssignment {
    /// Port identifier as the dashboard spells it.
    pub fn port_id(&self) -> String {
        self.port.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn mac_address_normalizes_cisco_dotted() {
        let mac = MacAddress::new("0011.22AA.bbCC");
        assert_eq!(mac.as_str(), "001122aabbcc");
        assert_eq!(mac.to_string(), "00:11:22:aa:bb:cc");
    }

    #[test]
    fn mac_address_separators_compare_equal() {
        assert_eq!(
            MacAddress::new("00-11-22-33-44-55"),
            MacAddress::new("00:11:22:33:44:55")
        );
        assert_eq!(
            MacAddress::new("0011.2233.4455"),
            MacAddress::new("00:11:22:33:44:55")
        );
    }

    #[test]
    fn mac_address_from_str() {
        let mac: MacAddress = "AA-BB-CC-DD-EE-FF".parse().unwrap();
        assert_eq!(mac.to_string(), "aa:bb:cc:dd:ee:ff");
    }

    #[test]
    fn serial_is_trimmed() {
        assert_eq!(DeviceSerial::new("  Q2AB-0001 ").as_str(), "Q2AB-0001");
    }
}
