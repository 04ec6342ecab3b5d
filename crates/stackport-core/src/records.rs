// ── Structured command output ──
//
// Parses the tabular text of `show ip interface brief`, `show interfaces
// status` and `show mac address-table` into records. Records also
// deserialize from saved captures so a comparison can run
// against a snapshot taken before the cut-over.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};

/// One row of interface status output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceStatusRecord {
    #[serde(alias = "intf", alias = "port")]
    pub interface: String,
    #[serde(alias = "link_status")]
    pub status: String,
}

/// One row of the MAC address table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacTableRecord {
    #[serde(alias = "mac_address", alias = "mac")]
    pub destination_address: String,
    /// First port of the row; device output may list several.
    #[serde(alias = "port", deserialize_with = "first_scalar")]
    pub destination_port: String,
    #[serde(alias = "vlan", deserialize_with = "first_scalar")]
    pub vlan_id: String,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Number(u64),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Self::Text(s) => s,
            Self::Number(n) => n.to_string(),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(Scalar),
    Many(Vec<Scalar>),
}

fn first_scalar<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(value) => value.into_string(),
        OneOrMany::Many(values) => values
            .into_iter()
            .next()
            .map(Scalar::into_string)
            .unwrap_or_default(),
    })
}

// ── Command recognition ─────────────────────────────────────────────

/// Commands with a structured parser.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StructuredCommand {
    InterfaceBrief,
    InterfacesStatus,
    MacAddressTable,
}

/// `true` when `token` is an accepted abbreviation of `word`.
fn abbreviates(token: &str, word: &str, min: usize) -> bool {
    token.len() >= min && word.starts_with(token)
}

impl StructuredCommand {
    /// Recognize a command, including IOS abbreviations (`sh ip int br`).
    pub fn detect(command: &str) -> Option<Self> {
        let lowered = command.to_ascii_lowercase();
        let tokens: Vec<&str> = lowered.split_whitespace().collect();
        match tokens.as_slice() {
            [show, ip, int, brief]
                if abbreviates(show, "show", 2)
                    && *ip == "ip"
                    && abbreviates(int, "interface", 3)
                    && abbreviates(brief, "brief", 2) =>
            {
                Some(Self::InterfaceBrief)
            }
            [show, int, status]
                if abbreviates(show, "show", 2)
                    && abbreviates(int, "interfaces", 3)
                    && abbreviates(status, "status", 4) =>
            {
                Some(Self::InterfacesStatus)
            }
            [show, mac, table]
                if abbreviates(show, "show", 2)
                    && *mac == "mac"
                    && abbreviates(table, "address-table", 3) =>
            {
                Some(Self::MacAddressTable)
            }
            [show, table] if abbreviates(show, "show", 2) && *table == "mac-address-table" => {
                Some(Self::MacAddressTable)
            }
            _ => None,
        }
    }
}

// ── Text parsers ────────────────────────────────────────────────────

static BRIEF_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<intf>\S+)\s+(?P<ip>\S+)\s+(?:YES|NO)\s+\S+\s+(?P<status>administratively down|up|down|deleted)\s+(?P<proto>up|down)\s*$",
    )
    .expect("interface brief row pattern is valid")
});

static STATUS_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^(?P<port>\S+)\s+(?:.*?\s+)?(?P<status>connected|notconnect|disabled|err-disabled|inactive|monitoring|suspended|sfpAbsent)\s+\S+",
    )
    .expect("interface status row pattern is valid")
});

static MAC_ROW: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"^\s*(?P<vlan>\d+|All)\s+(?P<mac>[0-9a-fA-F]{4}\.[0-9a-fA-F]{4}\.[0-9a-fA-F]{4})\s+\S+\s+(?P<rest>.+?)\s*$",
    )
    .expect("mac table row pattern is valid")
});

fn named(caps: &regex::Captures<'_>, name: &str) -> String {
    caps.name(name).map(|m| m.as_str().to_owned()).unwrap_or_default()
}

/// Parse `show ip interface brief`.
pub fn parse_interface_brief(text: &str) -> Vec<InterfaceStatusRecord> {
    text.lines()
        .filter_map(|line| BRIEF_ROW.captures(line.trim_end_matches('\r')))
        .map(|caps| InterfaceStatusRecord {
            interface: named(&caps, "intf"),
            status: named(&caps, "status"),
        })
        .collect()
}

/// Parse `show interfaces status`.
pub fn parse_interfaces_status(text: &str) -> Vec<InterfaceStatusRecord> {
    text.lines()
        .filter(|line| !line.starts_with("Port "))
        .filter_map(|line| STATUS_ROW.captures(line.trim_end_matches('\r')))
        .map(|caps| InterfaceStatusRecord {
            interface: named(&caps, "port"),
            status: named(&caps, "status"),
        })
        .collect()
}

/// Parse `show mac address-table`. The port column is the last column
/// of the row; comma-separated port lists keep their first entry.
pub fn parse_mac_table(text: &str) -> Vec<MacTableRecord> {
    text.lines()
        .filter_map(|line| MAC_ROW.captures(line.trim_end_matches('\r')))
        .filter_map(|caps| {
            let rest = caps.name("rest")?.as_str();
            let port = rest
                .split_whitespace()
                .last()?
                .split(',')
                .next()?
                .trim()
                .to_owned();
            Some(MacTableRecord {
                destination_address: named(&caps, "mac"),
                destination_port: port,
                vlan_id: named(&caps, "vlan"),
            })
        })
        .collect()
}
