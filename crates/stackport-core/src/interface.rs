// ── Interface name parsing ──
//
// Legacy Ethernet interface names come in two shapes:
//   three-part  <prefix><stack>/<group>/<port>   e.g. GigabitEthernet2/0/14
//   two-part    <prefix><stack>/<port>           e.g. Gi0/7
// Everything else (VLAN, loopback, port-channel, management) is not an
// Ethernet port and classifies as `Unrecognized`.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::format::NamingFormat;

/// Recognized Ethernet prefixes, longest first so full names win over
/// their abbreviations.
pub const ETHERNET_PREFIXES: &[&str] = &[
    "TwentyFiveGigE",
    "FortyGigabitEthernet",
    "HundredGigE",
    "TenGigabitEthernet",
    "GigabitEthernet",
    "FastEthernet",
    "Twe",
    "Fo",
    "Hu",
    "Te",
    "Gi",
    "Fa",
];

fn prefix_alternation() -> String {
    ETHERNET_PREFIXES.join("|")
}

// Both shapes must end at the port number; sub-interfaces (`Gi1/0/1.100`)
// share the parent's port and are left unrecognized.
static THREE_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{})(\d+)/(\d+)/(\d+)$", prefix_alternation()))
        .expect("three-part interface pattern is valid")
});

static TWO_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^(?:{})(\d+)/(\d+)$", prefix_alternation()))
        .expect("two-part interface pattern is valid")
});

/// Structural classification of a legacy interface name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum InterfaceName {
    ThreePart { stack: u32, group: u32, port: u32 },
    TwoPart { stack: u32, port: u32 },
    Unrecognized,
}

impl InterfaceName {
    /// Classify `name`. Three-part is tried first.
    pub fn parse(name: &str) -> Self {
        let name = name.trim();
        if let Some(caps) = THREE_PART.captures(name) {
            if let (Some(stack), Some(group), Some(port)) =
                (number(&caps, 1), number(&caps, 2), number(&caps, 3))
            {
                return Self::ThreePart { stack, group, port };
            }
        }
        if let Some(caps) = TWO_PART.captures(name) {
            if let (Some(stack), Some(port)) = (number(&caps, 1), number(&caps, 2)) {
                return Self::TwoPart { stack, port };
            }
        }
        Self::Unrecognized
    }

    pub fn format(self) -> Option<NamingFormat> {
        match self {
            Self::ThreePart { .. } => Some(NamingFormat::ThreePart),
            Self::TwoPart { .. } => Some(NamingFormat::TwoPart),
            Self::Unrecognized => None,
        }
    }

    pub fn stack(self) -> Option<u32> {
        match self {
            Self::ThreePart { stack, .. } | Self::TwoPart { stack, .. } => Some(stack),
            Self::Unrecognized => None,
        }
    }

    pub fn group(self) -> Option<u32> {
        match self {
            Self::ThreePart { group, .. } => Some(group),
            _ => None,
        }
    }

    pub fn port(self) -> Option<u32> {
        match self {
            Self::ThreePart { port, .. } | Self::TwoPart { port, .. } => Some(port),
            Self::Unrecognized => None,
        }
    }
}

fn number(caps: &regex::Captures<'_>, idx: usize) -> Option<u32> {
    caps.get(idx).and_then(|m| m.as_str().parse().ok())
}

/// Whether `name` starts with a recognized Ethernet prefix.
///
/// Names without one (Vlan1, Loopback0, Port-channel1) are not ports and
/// are excluded from conversion without being reported as failures.
pub fn has_ethernet_prefix(name: &str) -> bool {
    let name = name.trim();
    ETHERNET_PREFIXES.iter().any(|prefix| {
        name.strip_prefix(prefix)
            .is_some_and(|rest| rest.starts_with(|c: char| c.is_ascii_digit()))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn three_part_full_name() {
        assert_eq!(
            InterfaceName::parse("GigabitEthernet2/0/14"),
            InterfaceName::ThreePart {
                stack: 2,
                group: 0,
                port: 14
            }
        );
    }

    #[test]
    fn three_part_abbreviations() {
        assert_eq!(
            InterfaceName::parse("Te1/1/4"),
            InterfaceName::ThreePart {
                stack: 1,
                group: 1,
                port: 4
            }
        );
        assert_eq!(
            InterfaceName::parse("TwentyFiveGigE3/0/48"),
            InterfaceName::ThreePart {
                stack: 3,
                group: 0,
                port: 48
            }
        );
    }

    #[test]
    fn two_part_names() {
        assert_eq!(
            InterfaceName::parse("FastEthernet0/7"),
            InterfaceName::TwoPart { stack: 0, port: 7 }
        );
        assert_eq!(
            InterfaceName::parse("Gi1/24"),
            InterfaceName::TwoPart { stack: 1, port: 24 }
        );
    }

    #[test]
    fn three_part_sub_interface_is_unrecognized() {
        assert_eq!(
            InterfaceName::parse("GigabitEthernet1/0/1.100"),
            InterfaceName::Unrecognized
        );
        assert_eq!(InterfaceName::parse("Te2/1/4.20"), InterfaceName::Unrecognized);
    }

    #[test]
    fn two_part_rejects_trailing_text() {
        assert_eq!(InterfaceName::parse("Gi1/24.100"), InterfaceName::Unrecognized);
    }

    #[test]
    fn non_ethernet_names_are_unrecognized() {
        for name in ["Vlan1", "Loopback0", "Port-channel1", "AppGigabitEthernet1/0/1", "mgmt0"] {
            assert_eq!(InterfaceName::parse(name), InterfaceName::Unrecognized, "{name}");
        }
    }

    #[test]
    fn accessors() {
        let name = InterfaceName::parse("Gi2/1/3");
        assert_eq!(name.stack(), Some(2));
        assert_eq!(name.group(), Some(1));
        assert_eq!(name.port(), Some(3));
        assert_eq!(name.format(), Some(NamingFormat::ThreePart));
        assert_eq!(InterfaceName::parse("Gi0/3").group(), None);
    }

    #[test]
    fn ethernet_prefix_detection() {
        assert!(has_ethernet_prefix("GigabitEthernet1/0/1"));
        assert!(has_ethernet_prefix("Gi1"));
        assert!(!has_ethernet_prefix("Vlan10"));
        assert!(!has_ethernet_prefix("Giga"));
    }
}
