//! Realtime status of a single transit leg.

use super::{LegId, LegTime, RealtimeState, RentalStation};

/// The realtime view of one transit leg, as returned by the leg query.
///
/// Only the fields that change in realtime are carried; everything else
/// comes from the planned leg it is merged into.
#[derive(Debug, Clone, PartialEq)]
pub struct RealtimeLeg {
    pub leg_id: LegId,

    /// Whether the upstream has realtime data for this leg at all
    pub realtime: bool,

    pub realtime_state: Option<RealtimeState>,

    pub start: LegTime,
    pub end: LegTime,

    /// Current availability at the destination's rental station
    pub destination_rental_station: Option<RentalStation>,
}
