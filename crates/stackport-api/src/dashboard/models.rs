// Dashboard API wire types
//
// Field names follow the dashboard's camelCase JSON. Only the fields the
// migration and comparison flows read are modeled; anything else in a
// response body is ignored by serde.

use std::time::Duration;

use serde::{Deserialize, Deserializer, Serialize};

/// Lookback window used when listing recently-seen clients (one day).
pub const CLIENT_LOOKBACK: Duration = Duration::from_secs(86_400);

/// A switch port as returned by `GET /devices/{serial}/switch/ports`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPort {
    #[serde(deserialize_with = "string_or_number")]
    pub port_id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub enabled: Option<bool>,
    #[serde(default, rename = "type")]
    pub port_type: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub vlan: Option<String>,
}

/// Full settings body for `PUT /devices/{serial}/switch/ports/{portId}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPortUpdate {
    pub name: Option<String>,
    pub enabled: bool,
    #[serde(rename = "type")]
    pub port_type: String,
    pub vlan: u16,
    pub voice_vlan: Option<u16>,
    pub allowed_vlans: String,
    pub poe_enabled: bool,
    pub isolation_enabled: bool,
    pub rstp_enabled: bool,
    pub stp_guard: String,
    pub link_negotiation: String,
}

/// Live port state from `GET /devices/{serial}/switch/ports/statuses`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwitchPortStatus {
    #[serde(deserialize_with = "string_or_number")]
    pub port_id: String,
    #[serde(default)]
    pub enabled: Option<bool>,
    /// `"Connected"` or `"Disconnected"`.
    #[serde(default)]
    pub status: Option<String>,
}

impl SwitchPortStatus {
    /// Whether the dashboard reports a live link on this port.
    pub fn is_connected(&self) -> bool {
        self.status
            .as_deref()
            .is_some_and(|s| s.eq_ignore_ascii_case("connected"))
    }
}

/// A client seen by a device, from `GET /devices/{serial}/clients`.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceClient {
    #[serde(default)]
    pub id: Option<String>,
    pub mac: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub ip: Option<String>,
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub vlan: Option<String>,
    /// Port the client was last seen on (switches only).
    #[serde(default, deserialize_with = "opt_string_or_number")]
    pub switchport: Option<String>,
}

/// Error body returned by the dashboard on non-2xx responses.
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub errors: Vec<String>,
}

// ── Lenient scalar decoding ──────────────────────────────────────────
//
// The dashboard is inconsistent about numbers vs strings for port ids
// and VLANs depending on firmware and endpoint.

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Str(String),
    Int(i64),
}

impl From<Scalar> for String {
    fn from(s: Scalar) -> Self {
        match s {
            Scalar::Str(s) => s,
            Scalar::Int(n) => n.to_string(),
        }
    }
}

fn string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<String, D::Error> {
    Scalar::deserialize(de).map(String::from)
}

fn opt_string_or_number<'de, D: Deserializer<'de>>(de: D) -> Result<Option<String>, D::Error> {
    Ok(Option::<Scalar>::deserialize(de)?.map(String::from))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn port_id_accepts_number_or_string() {
        let a: SwitchPort = serde_json::from_str(r#"{"portId": "7"}"#).unwrap();
        let b: SwitchPort = serde_json::from_str(r#"{"portId": 7}"#).unwrap();
        assert_eq!(a.port_id, "7");
        assert_eq!(b.port_id, "7");
    }

    #[test]
    fn client_vlan_and_switchport_are_normalized() {
        let c: DeviceClient = serde_json::from_str(
            r#"{"mac": "aa:bb:cc:dd:ee:ff", "vlan": 20, "switchport": "5"}"#,
        )
        .unwrap();
        assert_eq!(c.vlan.as_deref(), Some("20"));
        assert_eq!(c.switchport.as_deref(), Some("5"));

        let c: DeviceClient =
            serde_json::from_str(r#"{"mac": "aa:bb:cc:dd:ee:ff", "switchport": null}"#).unwrap();
        assert!(c.switchport.is_none());
    }

    #[test]
    fn update_serializes_camel_case() {
        let update = SwitchPortUpdate {
            name: Some("desk".into()),
            enabled: true,
            port_type: "access".into(),
            vlan: 20,
            voice_vlan: Some(30),
            allowed_vlans: "1-1000".into(),
            poe_enabled: true,
            isolation_enabled: false,
            rstp_enabled: true,
            stp_guard: "disabled".into(),
            link_negotiation: "Auto negotiate".into(),
        };
        let v = serde_json::to_value(&update).unwrap();
        assert_eq!(v["type"], "access");
        assert_eq!(v["voiceVlan"], 30);
        assert_eq!(v["allowedVlans"], "1-1000");
        assert_eq!(v["linkNegotiation"], "Auto negotiate");
    }

    #[test]
    fn status_connected_is_case_insensitive() {
        let s: SwitchPortStatus =
            serde_json::from_str(r#"{"portId": "1", "status": "Connected"}"#).unwrap();
        assert!(s.is_connected());
        let s: SwitchPortStatus =
            serde_json::from_str(r#"{"portId": "1", "status": "Disconnected"}"#).unwrap();
        assert!(!s.is_connected());
    }
}
