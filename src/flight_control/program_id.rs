use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

/// Identifier of the flight programs the controller can run.
#[derive(Debug, Display, EnumIter, PartialEq, Eq, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgramId {
    Manual,
    SurfaceCheck,
    LevelFlight,
    QuickWiggle,
}

impl ProgramId {
    /// Whether pilot stick input beyond the interrupt threshold hands control back to the pilot.
    pub const fn is_interruptable(self) -> bool { !matches!(self, ProgramId::Manual) }

    /// Checks whether an explicit request may switch from `self` to `to`.
    pub fn may_switch_to(self, to: ProgramId) -> bool { EXPLICIT_TRANSITIONS.contains(&(self, to)) }
}

/// Explicit program requests the controller accepts.
///
/// Returning to `Manual` and the confirmation wiggle are always possible, as is restarting
/// the running program. The surface check and the autopilot can only be started from `Manual`.
pub static EXPLICIT_TRANSITIONS: LazyLock<HashSet<(ProgramId, ProgramId)>> = LazyLock::new(|| {
    let mut lookup = HashSet::new();
    for from in ProgramId::iter() {
        lookup.insert((from, ProgramId::Manual));
        lookup.insert((from, ProgramId::QuickWiggle));
        lookup.insert((from, from));
    }
    lookup.insert((ProgramId::Manual, ProgramId::SurfaceCheck));
    lookup.insert((ProgramId::Manual, ProgramId::LevelFlight));
    lookup
});
