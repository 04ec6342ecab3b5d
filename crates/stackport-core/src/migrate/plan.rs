use std::collections::HashMap;

use indexmap::IndexMap;
use tracing::{debug, warn};

use super::report::{OutcomeStatus, PortOutcome, SkipReason};
use crate::extract::{extract, split_interface_blocks};
use crate::format::{FormatDecision, detect_format};
use crate::interface::{InterfaceName, has_ethernet_prefix};
use crate::mapper::{IndexBase, resolve};
use crate::model::{DeviceSerial, PortAssignment};

/// Port assignments grouped by replacement device, in serial-list order.
#[derive(Debug, Clone)]
pub struct MigrationPlan {
    pub decision: Option<FormatDecision>,
    pub interfaces_seen: usize,
    pub excluded: usize,
    pub assignments: IndexMap<DeviceSerial, Vec<PortAssignment>>,
    /// Interfaces that could not be placed on any device.
    pub skipped: Vec<PortOutcome>,
}

impl MigrationPlan {
    pub fn assignment_count(&self) -> usize {
        self.assignments.values().map(Vec::len).sum()
    }
}

/// Parse `config`, detect the batch format and map every Ethernet
/// interface onto the serial list.
pub fn build_plan(
    config: &str,
    serials: &[DeviceSerial],
    expected_group: Option<u32>,
) -> MigrationPlan {
    let blocks = split_interface_blocks(config);
    let decision = detect_format(blocks.iter().map(|b| b.name.as_str()));
    let base = decision.map_or(IndexBase::One, |d| d.index_base());

    let mut plan = MigrationPlan {
        decision,
        interfaces_seen: blocks.len(),
        excluded: 0,
        assignments: serials.iter().map(|s| (s.clone(), Vec::new())).collect(),
        skipped: Vec::new(),
    };

    // (serial, port) -> first interface that claimed it
    let mut claimed: HashMap<(DeviceSerial, u32), String> = HashMap::new();

    for block in &blocks {
        if !has_ethernet_prefix(&block.name) {
            plan.excluded += 1;
            continue;
        }
        let name = InterfaceName::parse(&block.name);
        match resolve(name, base, serials, expected_group) {
            Ok(target) => {
                let key = (target.serial.clone(), target.port);
                if let Some(first) = claimed.get(&key) {
                    warn!(
                        interface = %block.name,
                        first = %first,
                        port = target.port,
                        "duplicate port skipped"
                    );
                    plan.skipped.push(PortOutcome {
                        interface: block.name.clone(),
                        serial: Some(target.serial.clone()),
                        port: Some(target.port),
                        status: OutcomeStatus::Skipped {
                            reason: SkipReason::DuplicatePort {
                                port: target.port,
                                first: first.clone(),
                            },
                        },
                    });
                    continue;
                }
                claimed.insert(key, block.name.clone());
                let assignment = PortAssignment {
                    interface: block.name.clone(),
                    serial: target.serial.clone(),
                    port: target.port,
                    settings: extract(&block.body),
                };
                plan.assignments
                    .entry(assignment.serial.clone())
                    .or_default()
                    .push(assignment);
            }
            Err(err) => {
                debug!(interface = %block.name, reason = %err, "interface skipped");
                plan.skipped.push(PortOutcome::unmapped(
                    &block.name,
                    name.port(),
                    SkipReason::from(err),
                ));
            }
        }
    }

    debug!(
        interfaces = plan.interfaces_seen,
        excluded = plan.excluded,
        assigned = plan.assignment_count(),
        skipped = plan.skipped.len(),
        "migration plan built"
    );
    plan
}
