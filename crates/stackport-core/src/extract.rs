// ── Configuration block extraction ──
//
// Splits a running configuration into per-interface blocks and derives a
// normalized `PortSettings` from each block. Extraction is pure and never
// fails: unknown directives are ignored and missing ones keep defaults.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

pub const DEFAULT_VLAN: &str = "1";
pub const DEFAULT_ALLOWED_VLANS: &str = "1-1000";

/// One `interface <name>` block, body excluding the header and the
/// terminating `!` line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceBlock {
    pub name: String,
    pub body: String,
}

/// Split configuration text into interface blocks.
///
/// A block opens on a line beginning with `interface ` and closes on a line
/// that is only `!`. A new `interface` line also closes the open block, and
/// a block still open at end of input is kept.
pub fn split_interface_blocks(config: &str) -> Vec<InterfaceBlock> {
    let mut blocks = Vec::new();
    let mut current: Option<(String, Vec<&str>)> = None;

    for raw in config.lines() {
        let line = raw.trim_end_matches('\r');
        if let Some(rest) = line.strip_prefix("interface ") {
            if let Some((name, body)) = current.take() {
                blocks.push(finish_block(name, &body));
            }
            let name = rest.split_whitespace().next().unwrap_or_default();
            if !name.is_empty() {
                current = Some((name.to_owned(), Vec::new()));
            }
            continue;
        }
        if line.trim() == "!" {
            if let Some((name, body)) = current.take() {
                blocks.push(finish_block(name, &body));
            }
        } else if let Some((_, body)) = current.as_mut() {
            body.push(line);
        }
    }
    if let Some((name, body)) = current {
        tracing::debug!(interface = %name, "unterminated interface block at end of configuration");
        blocks.push(finish_block(name, &body));
    }
    blocks
}

fn finish_block(name: String, body: &[&str]) -> InterfaceBlock {
    InterfaceBlock {
        name,
        body: body.join("\n"),
    }
}

// ── Normalized settings ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum PortMode {
    #[default]
    Access,
    Trunk,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum StpGuard {
    #[default]
    #[serde(rename = "disabled")]
    #[strum(serialize = "disabled")]
    Disabled,
    #[serde(rename = "bpdu guard")]
    #[strum(serialize = "bpdu guard")]
    BpduGuard,
    #[serde(rename = "root guard")]
    #[strum(serialize = "root guard")]
    RootGuard,
}

/// Link negotiation modes understood by the replacement platform.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, strum::Display, strum::AsRefStr)]
pub enum LinkNegotiation {
    #[default]
    #[serde(rename = "Auto negotiate")]
    #[strum(serialize = "Auto negotiate")]
    AutoNegotiate,
    #[serde(rename = "1 Gigabit full duplex (forced)")]
    #[strum(serialize = "1 Gigabit full duplex (forced)")]
    Gigabit,
    #[serde(rename = "100 Megabit (auto)")]
    #[strum(serialize = "100 Megabit (auto)")]
    Megabit100Auto,
    #[serde(rename = "100 Megabit full duplex (forced)")]
    #[strum(serialize = "100 Megabit full duplex (forced)")]
    Megabit100Full,
    #[serde(rename = "10 Megabit (auto)")]
    #[strum(serialize = "10 Megabit (auto)")]
    Megabit10Auto,
    #[serde(rename = "10 Megabit full duplex (forced)")]
    #[strum(serialize = "10 Megabit full duplex (forced)")]
    Megabit10Full,
}

/// Settings carried from a legacy interface to a replacement port.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PortSettings {
    pub enabled: bool,
    pub description: Option<String>,
    pub mode: PortMode,
    /// Access VLAN, or the native VLAN for trunks.
    pub vlan: String,
    pub voice_vlan: Option<String>,
    pub allowed_vlans: String,
    pub poe_enabled: bool,
    pub isolation_enabled: bool,
    pub rstp_enabled: bool,
    pub stp_guard: StpGuard,
    pub link_negotiation: LinkNegotiation,
}

impl Default for PortSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            description: None,
            mode: PortMode::Access,
            vlan: DEFAULT_VLAN.to_owned(),
            voice_vlan: None,
            allowed_vlans: DEFAULT_ALLOWED_VLANS.to_owned(),
            poe_enabled: true,
            isolation_enabled: false,
            rstp_enabled: true,
            stp_guard: StpGuard::Disabled,
            link_negotiation: LinkNegotiation::AutoNegotiate,
        }
    }
}

// ── Directive patterns ──────────────────────────────────────────────

macro_rules! directive {
    ($name:ident, $pattern:literal) => {
        static $name: LazyLock<Regex> =
            LazyLock::new(|| Regex::new($pattern).expect(concat!("valid pattern: ", $pattern)));
    };
}

directive!(SHUTDOWN, r"(?m)^\s*shutdown\s*$");
directive!(DESCRIPTION, r"(?m)^\s*description\s+(.+?)\s*$");
directive!(MODE_TRUNK, r"(?m)^\s*switchport mode trunk\s*$");
directive!(ALLOWED_VLANS, r"(?m)^\s*switchport trunk allowed vlan\s+(.+?)\s*$");
directive!(NATIVE_VLAN, r"(?m)^\s*switchport trunk native vlan\s+(\d+)");
directive!(ACCESS_VLAN, r"(?m)^\s*switchport access vlan\s+(\d+)");
directive!(VOICE_VLAN, r"(?m)^\s*switchport voice vlan\s+(\d+)");
directive!(PORTFAST, r"(?m)^\s*spanning-tree portfast\b");
directive!(BPDU_GUARD, r"(?m)^\s*spanning-tree bpduguard enable\s*$");
directive!(ROOT_GUARD, r"(?m)^\s*spanning-tree guard root\s*$");
directive!(POE_NEVER, r"(?m)^\s*power inline never\s*$");
directive!(SPEED, r"(?m)^\s*speed\s+(\d+)\s*$");
directive!(DUPLEX, r"(?m)^\s*duplex\s+(full|half|auto)\s*$");

fn capture<'a>(re: &Regex, text: &'a str) -> Option<&'a str> {
    re.captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

fn last_position(re: &Regex, text: &str) -> Option<usize> {
    re.find_iter(text).last().map(|m| m.start())
}

/// Derive port settings from an interface block body.
pub fn extract(body: &str) -> PortSettings {
    let mut settings = PortSettings::default();

    if SHUTDOWN.is_match(body) {
        settings.enabled = false;
    }
    if let Some(text) = capture(&DESCRIPTION, body) {
        settings.description = Some(text.to_owned());
    }

    if MODE_TRUNK.is_match(body) {
        settings.mode = PortMode::Trunk;
        if let Some(list) = allowed_vlan_list(body) {
            settings.allowed_vlans = list;
        }
        if let Some(native) = capture(&NATIVE_VLAN, body) {
            native.clone_into(&mut settings.vlan);
        }
    } else {
        if let Some(access) = capture(&ACCESS_VLAN, body) {
            access.clone_into(&mut settings.vlan);
        }
        if let Some(voice) = capture(&VOICE_VLAN, body) {
            settings.voice_vlan = Some(voice.to_owned());
        }
    }

    if PORTFAST.is_match(body) {
        settings.rstp_enabled = true;
    }
    // The later of two guard directives wins.
    let guards = (
        last_position(&BPDU_GUARD, body),
        last_position(&ROOT_GUARD, body),
    );
    settings.stp_guard = match guards {
        (Some(bpdu), Some(root)) if bpdu > root => StpGuard::BpduGuard,
        (_, Some(_)) => StpGuard::RootGuard,
        (Some(_), None) => StpGuard::BpduGuard,
        (None, None) => StpGuard::Disabled,
    };

    if POE_NEVER.is_match(body) {
        settings.poe_enabled = false;
    }
    settings.link_negotiation = link_negotiation(body);

    settings
}

/// Allowed VLAN list, folding `allowed vlan add ...` continuation lines.
fn allowed_vlan_list(body: &str) -> Option<String> {
    let mut list: Option<String> = None;
    for caps in ALLOWED_VLANS.captures_iter(body) {
        let Some(value) = caps.get(1).map(|m| m.as_str()) else {
            continue;
        };
        match (value.strip_prefix("add "), list.as_mut()) {
            // `none` and `all` are keywords, not list members
            (Some(extra), Some(existing)) if matches!(existing.as_str(), "none" | "all") => {
                *existing = extra.trim().to_owned();
            }
            (Some(extra), Some(existing)) => {
                existing.push(',');
                existing.push_str(extra.trim());
            }
            (Some(extra), None) => list = Some(extra.trim().to_owned()),
            (None, _) => list = Some(value.to_owned()),
        }
    }
    list
}

fn link_negotiation(body: &str) -> LinkNegotiation {
    let full = capture(&DUPLEX, body) == Some("full");
    match (capture(&SPEED, body), full) {
        (Some("1000"), _) => LinkNegotiation::Gigabit,
        (Some("100"), true) => LinkNegotiation::Megabit100Full,
        (Some("100"), false) => LinkNegotiation::Megabit100Auto,
        (Some("10"), true) => LinkNegotiation::Megabit10Full,
        (Some("10"), false) => LinkNegotiation::Megabit10Auto,
        _ => LinkNegotiation::AutoNegotiate,
    }
}
