//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::digitransit::{ConversionError, LegDto, leg_to_dto};
use crate::geometry::{Enu, LatLon};
use crate::interest::LegsOfInterest;
use crate::session::{JourneyProgress, ProgressConfig, Snapshot};
use crate::timing::Conflict;

use super::state::SessionId;

/// Request to start tracking an itinerary.
#[derive(Debug, Deserialize)]
pub struct CreateSessionRequest {
    /// Legs as returned by the planner's `plan` query
    pub legs: Vec<LegDto>,
}

/// Optional device position for progress queries.
#[derive(Debug, Default, Deserialize)]
pub struct PositionQuery {
    pub lat: Option<f64>,
    pub lon: Option<f64>,
}

impl PositionQuery {
    /// The position, if both coordinates were given.
    pub fn position(&self) -> Option<LatLon> {
        Some(LatLon::new(self.lat?, self.lon?))
    }
}

/// A session and its current state.
#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: SessionId,
    pub snapshot: SnapshotResponse,
}

/// A published snapshot.
#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    /// Refresh cycle that produced the snapshot (0 = planned only)
    pub cycle: u64,

    /// Snapshot time, in the first leg's offset
    pub time: String,

    /// Reconciled legs
    pub legs: Vec<LegDto>,

    pub interest: InterestResponse,

    pub origin: OriginResponse,

    /// Planar polyline per leg, metres east/north/up of the origin
    pub geometry: Vec<Vec<[f64; 3]>>,

    pub conflicts: Vec<ConflictResponse>,

    pub progress: Option<ProgressResponse>,
}

/// Legs of interest as indices into `legs`.
#[derive(Debug, Serialize)]
pub struct InterestResponse {
    pub first: Option<usize>,
    pub last: Option<usize>,
    pub previous: Option<usize>,
    pub current: Option<usize>,
    pub next: Option<usize>,
}

impl From<LegsOfInterest> for InterestResponse {
    fn from(interest: LegsOfInterest) -> Self {
        Self {
            first: interest.first,
            last: interest.last,
            previous: interest.previous,
            current: interest.current,
            next: interest.next,
        }
    }
}

/// Origin of the local frame.
#[derive(Debug, Serialize)]
pub struct OriginResponse {
    pub lat: f64,
    pub lon: f64,

    /// Earth-centred, earth-fixed x/y/z in metres
    pub ecef: [f64; 3],
}

/// A reconciliation conflict.
#[derive(Debug, Serialize)]
#[serde(tag = "type")]
pub enum ConflictResponse {
    TransitOverlap {
        before: usize,
        after: usize,
        overlap_secs: i64,
    },
}

impl From<&Conflict> for ConflictResponse {
    fn from(conflict: &Conflict) -> Self {
        match conflict {
            Conflict::TransitOverlap {
                before,
                after,
                overlap,
            } => ConflictResponse::TransitOverlap {
                before: *before,
                after: *after,
                overlap_secs: overlap.num_seconds(),
            },
        }
    }
}

/// Journey progress.
#[derive(Debug, Serialize)]
pub struct ProgressResponse {
    pub arrival: String,
    pub destination_reached: bool,
    pub past_expected_arrival: bool,
    pub completed: bool,
    pub distance_to_destination: Option<f64>,
    pub display_leg: Option<usize>,
}

impl SnapshotResponse {
    /// Convert a snapshot, computing progress for an optional position.
    pub fn from_snapshot(
        snapshot: &Snapshot,
        position: Option<LatLon>,
        config: &ProgressConfig,
    ) -> Result<Self, ConversionError> {
        let offset = snapshot
            .legs
            .first()
            .map(|leg| leg.start.offset)
            .ok_or(ConversionError::MissingField("legs"))?;

        let legs = snapshot
            .legs
            .iter()
            .map(leg_to_dto)
            .collect::<Result<Vec<_>, _>>()?;

        let progress = match snapshot.progress(position, config) {
            Some(progress) => Some(ProgressResponse::from_progress(&progress, offset)?),
            None => None,
        };

        let origin = snapshot.frame.origin();
        let ecef = snapshot.frame.origin_ecef();

        Ok(Self {
            cycle: snapshot.cycle,
            time: snapshot.time.to_iso(offset)?,
            legs,
            interest: snapshot.interest.into(),
            origin: OriginResponse {
                lat: origin.lat,
                lon: origin.lon,
                ecef: [ecef.x, ecef.y, ecef.z],
            },
            geometry: snapshot
                .geometry
                .iter()
                .map(|line| line.iter().map(enu_triple).collect())
                .collect(),
            conflicts: snapshot.conflicts.iter().map(ConflictResponse::from).collect(),
            progress,
        })
    }
}

fn enu_triple(p: &Enu) -> [f64; 3] {
    [p.east, p.north, p.up]
}

impl ProgressResponse {
    fn from_progress(
        progress: &JourneyProgress,
        offset: chrono::FixedOffset,
    ) -> Result<Self, ConversionError> {
        Ok(Self {
            arrival: progress.arrival.to_iso(offset)?,
            destination_reached: progress.destination_reached,
            past_expected_arrival: progress.past_expected_arrival,
            completed: progress.completed(),
            distance_to_destination: progress.distance_to_destination,
            display_leg: progress.display_leg,
        })
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error message
    pub error: String,
}
