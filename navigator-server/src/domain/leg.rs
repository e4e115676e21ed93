//! Itinerary leg type.
//!
//! A `Leg` is one contiguous segment of an itinerary. The per-kind data
//! lives in [`LegKind`]; the timing interface (`start_time`, `end_time`,
//! `is_transit`) is common to all kinds, which is all the reconciliation
//! code needs.

use std::fmt;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use super::{DomainError, LegTime, Place, RealtimeLeg, Timestamp};

/// Travel mode as reported by the planner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Walk,
    Bicycle,
    Scooter,
    Car,
    Wait,
    Bus,
    Rail,
    Tram,
    Subway,
    Ferry,
    Airplane,
    Funicular,
    Gondola,
    CableCar,
    Carpool,
    Taxi,
    /// A mode this crate doesn't know about yet
    #[serde(other)]
    Other,
}

impl Mode {
    /// Returns true for modes served by scheduled public transport.
    pub fn is_transit(self) -> bool {
        matches!(
            self,
            Mode::Bus
                | Mode::Rail
                | Mode::Tram
                | Mode::Subway
                | Mode::Ferry
                | Mode::Airplane
                | Mode::Funicular
                | Mode::Gondola
                | Mode::CableCar
        )
    }
}

/// Realtime state of a transit leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RealtimeState {
    Scheduled,
    Updated,
    Canceled,
    Added,
}

/// Stable identifier used to fetch a transit leg's realtime status.
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LegId(String);

impl LegId {
    /// Wrap a leg id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "LegId({})", self.0)
    }
}

impl fmt::Display for LegId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Details carried only by transit legs.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitDetails {
    pub mode: Mode,

    /// Id for realtime queries; legs without one are never refreshed
    pub leg_id: Option<LegId>,

    /// This leg continues the previous transit leg's vehicle run
    pub interline_with_previous_leg: bool,

    /// Whether the timing comes from realtime data
    pub realtime: bool,

    pub realtime_state: Option<RealtimeState>,

    /// Route short name (e.g. "550")
    pub route: Option<String>,

    pub headsign: Option<String>,
}

impl TransitDetails {
    /// Transit details with no realtime data and no interlining.
    pub fn new(mode: Mode, leg_id: Option<LegId>) -> Self {
        Self {
            mode,
            leg_id,
            interline_with_previous_leg: false,
            realtime: false,
            realtime_state: None,
            route: None,
            headsign: None,
        }
    }

    /// Mark this leg as interlined with the previous one.
    pub fn interlined(mut self) -> Self {
        self.interline_with_previous_leg = true;
        self
    }
}

/// What kind of travel a leg is.
#[derive(Debug, Clone, PartialEq)]
pub enum LegKind {
    /// Street leg before the first or after the last transit leg
    Walk { mode: Mode },

    /// Street leg between two transit legs
    Transfer { mode: Mode },

    /// Waiting in place
    Wait,

    /// Aboard a scheduled vehicle
    Transit(TransitDetails),
}

impl LegKind {
    /// Classify a non-transit leg by mode and position.
    ///
    /// `between_transit` is true when there is a transit leg both before and
    /// after this one in the itinerary.
    pub fn street(mode: Mode, between_transit: bool) -> Self {
        match mode {
            Mode::Wait => LegKind::Wait,
            _ if between_transit => LegKind::Transfer { mode },
            _ => LegKind::Walk { mode },
        }
    }
}

/// A leg of an itinerary.
///
/// # Invariants
///
/// - `end.time() >= start.time()` when constructed through [`Leg::new`]
#[derive(Debug, Clone, PartialEq)]
pub struct Leg {
    pub kind: LegKind,
    pub start: LegTime,
    pub end: LegTime,
    pub from: Place,
    pub to: Place,

    /// Encoded polyline (precision 5)
    pub geometry: String,

    /// Distance in metres
    pub distance: f64,

    /// Planned duration in seconds
    pub duration: f64,
}

impl Leg {
    /// Construct a leg, validating that it doesn't end before it starts.
    ///
    /// # Examples
    ///
    /// ```
    /// use navigator_server::domain::{Leg, LegKind, LegTime, Mode, Place, Timestamp};
    ///
    /// let leg = Leg::new(
    ///     LegKind::Walk { mode: Mode::Walk },
    ///     LegTime::scheduled(Timestamp::from_millis(0)),
    ///     LegTime::scheduled(Timestamp::from_millis(60_000)),
    ///     Place::new(60.17, 24.94),
    ///     Place::new(60.18, 24.95),
    /// )
    /// .unwrap();
    ///
    /// assert!(!leg.is_transit());
    /// assert_eq!(leg.span().num_seconds(), 60);
    /// ```
    pub fn new(
        kind: LegKind,
        start: LegTime,
        end: LegTime,
        from: Place,
        to: Place,
    ) -> Result<Self, DomainError> {
        if end.time() < start.time() {
            return Err(DomainError::InvalidLeg("leg must not end before it starts"));
        }

        let duration = (end.time() - start.time()).num_milliseconds() as f64 / 1000.0;

        Ok(Self {
            kind,
            start,
            end,
            from,
            to,
            geometry: String::new(),
            distance: 0.0,
            duration,
        })
    }

    /// Set the encoded polyline.
    pub fn with_geometry(mut self, geometry: impl Into<String>) -> Self {
        self.geometry = geometry.into();
        self
    }

    /// Set the distance in metres.
    pub fn with_distance(mut self, distance: f64) -> Self {
        self.distance = distance;
        self
    }

    /// Returns the travel mode.
    pub fn mode(&self) -> Mode {
        match &self.kind {
            LegKind::Walk { mode } | LegKind::Transfer { mode } => *mode,
            LegKind::Wait => Mode::Wait,
            LegKind::Transit(details) => details.mode,
        }
    }

    /// Returns true if this leg is aboard a scheduled vehicle.
    pub fn is_transit(&self) -> bool {
        matches!(self.kind, LegKind::Transit(_))
    }

    /// Returns the transit details, if this is a transit leg.
    pub fn transit(&self) -> Option<&TransitDetails> {
        match &self.kind {
            LegKind::Transit(details) => Some(details),
            _ => None,
        }
    }

    /// Returns the realtime leg id, if this is a transit leg that has one.
    pub fn leg_id(&self) -> Option<&LegId> {
        self.transit().and_then(|t| t.leg_id.as_ref())
    }

    /// Returns true if this transit leg continues the previous vehicle run.
    pub fn is_interlined(&self) -> bool {
        self.transit()
            .is_some_and(|t| t.interline_with_previous_leg)
    }

    /// Returns true if the upstream reports the leg as cancelled.
    pub fn is_canceled(&self) -> bool {
        self.transit()
            .is_some_and(|t| t.realtime_state == Some(super::RealtimeState::Canceled))
    }

    /// Effective start time.
    pub fn start_time(&self) -> Timestamp {
        self.start.time()
    }

    /// Effective end time.
    pub fn end_time(&self) -> Timestamp {
        self.end.time()
    }

    /// Time between effective start and end.
    pub fn span(&self) -> Duration {
        self.end_time() - self.start_time()
    }

    /// Returns true if `time` lies within `[start, end]` (inclusive).
    pub fn contains(&self, time: Timestamp) -> bool {
        self.start_time() <= time && time <= self.end_time()
    }

    /// Overwrite the effective start and end times.
    pub fn set_times(&mut self, start: Timestamp, end: Timestamp) {
        self.start.set_time(start);
        self.end.set_time(end);
    }

    /// Merge a realtime status into this leg.
    ///
    /// Replaces the timing and realtime fields, and carries the updated
    /// rental station availability onto the destination. Returns false
    /// (and leaves the leg alone) if this isn't a transit leg.
    pub fn merge_realtime(&mut self, realtime: &RealtimeLeg) -> bool {
        let LegKind::Transit(details) = &mut self.kind else {
            return false;
        };

        details.realtime = realtime.realtime;
        details.realtime_state = realtime.realtime_state;
        self.start = realtime.start;
        self.end = realtime.end;
        self.to.vehicle_rental_station = realtime.destination_rental_station.clone();
        true
    }
}
