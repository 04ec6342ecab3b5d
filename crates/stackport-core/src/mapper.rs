// ── Stack-index mapping ──
//
// Stack member numbers on the legacy side become positions in the ordered
// serial list. Three-part batches number members from 1, two-part batches
// from 0.

use serde::Serialize;
use thiserror::Error;

use crate::interface::InterfaceName;
use crate::model::DeviceSerial;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
pub enum IndexBase {
    #[strum(serialize = "0")]
    Zero,
    #[strum(serialize = "1")]
    One,
}

impl IndexBase {
    pub fn offset(self) -> u32 {
        match self {
            Self::Zero => 0,
            Self::One => 1,
        }
    }

    /// Inclusive range of valid stack indices for `serial_count` devices.
    pub fn valid_range(self, serial_count: usize) -> Option<(u32, u32)> {
        let count = u32::try_from(serial_count).ok()?;
        if count == 0 {
            return None;
        }
        let min = self.offset();
        Some((min, min + count - 1))
    }
}

/// Why a legacy interface could not be placed on a replacement device.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MappingError {
    #[error("stack index {index} has no replacement device (valid: {})", fmt_range(.valid))]
    OutOfRange {
        index: u32,
        valid: Option<(u32, u32)>,
    },

    #[error("module group {group} is not the expected group {expected}")]
    NotInExpectedGroup { group: u32, expected: u32 },

    #[error("interface name does not follow a recognized port pattern")]
    Unrecognized,
}

pub(crate) fn fmt_range(valid: &Option<(u32, u32)>) -> String {
    match valid {
        Some((min, max)) => format!("{min}..={max}"),
        None => "none".to_owned(),
    }
}

/// Resolve a stack member index to its replacement serial.
pub fn map_stack_index(
    index: u32,
    base: IndexBase,
    serials: &[DeviceSerial],
) -> Result<&DeviceSerial, MappingError> {
    let out_of_range = || MappingError::OutOfRange {
        index,
        valid: base.valid_range(serials.len()),
    };
    let position = index.checked_sub(base.offset()).ok_or_else(out_of_range)?;
    usize::try_from(position)
        .ok()
        .and_then(|pos| serials.get(pos))
        .ok_or_else(out_of_range)
}

/// A legacy interface placed on a concrete replacement port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PortTarget<'a> {
    pub serial: &'a DeviceSerial,
    pub port: u32,
}

/// Map a parsed interface name onto a serial and port number.
///
/// `expected_group` only constrains three-part names; two-part names
/// carry no group. The batch's `base` applies to every name, including
/// names in the minority format.
pub fn resolve<'a>(
    name: InterfaceName,
    base: IndexBase,
    serials: &'a [DeviceSerial],
    expected_group: Option<u32>,
) -> Result<PortTarget<'a>, MappingError> {
    let (stack, port) = match name {
        InterfaceName::ThreePart { stack, group, port } => {
            if let Some(expected) = expected_group {
                if group != expected {
                    return Err(MappingError::NotInExpectedGroup { group, expected });
                }
            }
            (stack, port)
        }
        InterfaceName::TwoPart { stack, port } => (stack, port),
        InterfaceName::Unrecognized => return Err(MappingError::Unrecognized),
    };
    let serial = map_stack_index(stack, base, serials)?;
    Ok(PortTarget { serial, port })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn serials(names: &[&str]) -> Vec<DeviceSerial> {
        names.iter().copied().map(DeviceSerial::from).collect()
    }

    #[test]
    fn one_based_mapping() {
        let list = serials(&["Q2-A", "Q2-B"]);
        assert_eq!(map_stack_index(1, IndexBase::One, &list).unwrap().as_str(), "Q2-A");
        assert_eq!(map_stack_index(2, IndexBase::One, &list).unwrap().as_str(), "Q2-B");
    }

    #[test]
    fn zero_based_mapping() {
        let list = serials(&["Q2-A", "Q2-B"]);
        assert_eq!(map_stack_index(0, IndexBase::Zero, &list).unwrap().as_str(), "Q2-A");
        assert_eq!(map_stack_index(1, IndexBase::Zero, &list).unwrap().as_str(), "Q2-B");
    }

    #[test]
    fn out_of_range_reports_bounds() {
        let list = serials(&["Q2-A", "Q2-B"]);
        let err = map_stack_index(3, IndexBase::One, &list).unwrap_err();
        assert_eq!(
            err,
            MappingError::OutOfRange {
                index: 3,
                valid: Some((1, 2))
            }
        );
        assert_eq!(
            err.to_string(),
            "stack index 3 has no replacement device (valid: 1..=2)"
        );
    }

    #[test]
    fn zero_index_in_one_based_batch_is_out_of_range() {
        let list = serials(&["Q2-A"]);
        assert!(matches!(
            map_stack_index(0, IndexBase::One, &list),
            Err(MappingError::OutOfRange { index: 0, .. })
        ));
    }

    #[test]
    fn empty_serial_list() {
        let err = map_stack_index(0, IndexBase::Zero, &[]).unwrap_err();
        assert_eq!(
            err,
            MappingError::OutOfRange {
                index: 0,
                valid: None
            }
        );
    }

    #[test]
    fn group_mismatch_is_distinct() {
        let list = serials(&["Q2-A"]);
        let name = InterfaceName::parse("Gi1/1/1");
        assert_eq!(
            resolve(name, IndexBase::One, &list, Some(0)).unwrap_err(),
            MappingError::NotInExpectedGroup {
                group: 1,
                expected: 0
            }
        );
        let target = resolve(name, IndexBase::One, &list, None).unwrap();
        assert_eq!(target.port, 1);
    }

    #[test]
    fn minority_two_part_uses_batch_base() {
        let list = serials(&["Q2-A", "Q2-B"]);
        let target =
            resolve(InterfaceName::parse("Gi1/5"), IndexBase::One, &list, Some(0)).unwrap();
        assert_eq!(target.serial.as_str(), "Q2-A");
        assert_eq!(target.port, 5);
    }
}
