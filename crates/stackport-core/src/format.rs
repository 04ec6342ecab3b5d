// ── Naming format detection ──
//
// A whole batch of interface names is converted under one convention,
// chosen by majority vote. The vote decides the index base used to map
// stack numbers onto the caller's serial list.

use serde::Serialize;

use crate::interface::InterfaceName;
use crate::mapper::IndexBase;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "kebab-case")]
pub enum NamingFormat {
    /// `<prefix><stack>/<group>/<port>`, stack members numbered from 1.
    ThreePart,
    /// `<prefix><stack>/<port>`, stack members numbered from 0.
    TwoPart,
}

impl NamingFormat {
    pub fn index_base(self) -> IndexBase {
        match self {
            Self::ThreePart => IndexBase::One,
            Self::TwoPart => IndexBase::Zero,
        }
    }
}

/// The convention chosen for a batch, with the tallies behind it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FormatDecision {
    pub format: NamingFormat,
    pub three_part_count: usize,
    pub two_part_count: usize,
}

impl FormatDecision {
    pub fn index_base(&self) -> IndexBase {
        self.format.index_base()
    }
}

/// Tally naming shapes across `names` and pick the dominant one.
///
/// Ties go to three-part. Returns `None` when no name parses.
pub fn detect_format<I, S>(names: I) -> Option<FormatDecision>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let (mut three, mut two) = (0usize, 0usize);
    for name in names {
        match InterfaceName::parse(name.as_ref()).format() {
            Some(NamingFormat::ThreePart) => three += 1,
            Some(NamingFormat::TwoPart) => two += 1,
            None => {}
        }
    }
    if three == 0 && two == 0 {
        return None;
    }
    let format = if three >= two {
        NamingFormat::ThreePart
    } else {
        NamingFormat::TwoPart
    };
    tracing::debug!(%format, three_part = three, two_part = two, "naming format detected");
    Some(FormatDecision {
        format,
        three_part_count: three,
        two_part_count: two,
    })
}
