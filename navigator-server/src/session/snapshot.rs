//! Immutable session state handed to readers.

use std::sync::Arc;

use crate::domain::{Leg, Timestamp};
use crate::geometry::{Enu, LatLon, LocalFrame};
use crate::interest::{LegsOfInterest, legs_of_interest};
use crate::timing::Conflict;

use super::config::ProgressConfig;
use super::progress::{JourneyProgress, journey_progress};

/// One published view of a session.
///
/// Snapshots are never mutated; each refresh publishes a new one.
#[derive(Debug, Clone)]
pub struct Snapshot {
    /// 0 for the initial snapshot, then the number of the refresh cycle
    /// that produced it
    pub cycle: u64,

    pub time: Timestamp,

    /// Reconciled legs
    pub legs: Arc<[Leg]>,

    /// Frame anchored at the first leg's departure point
    pub frame: LocalFrame,

    /// Planar polyline per leg, in `frame`
    pub geometry: Arc<[Vec<Enu>]>,

    pub interest: LegsOfInterest,

    /// Problems the last reconciliation couldn't fix
    pub conflicts: Vec<Conflict>,
}

impl Snapshot {
    pub(crate) fn new(
        cycle: u64,
        time: Timestamp,
        legs: Arc<[Leg]>,
        frame: LocalFrame,
        geometry: Arc<[Vec<Enu>]>,
        conflicts: Vec<Conflict>,
    ) -> Self {
        let interest = legs_of_interest(&legs, time);
        Self {
            cycle,
            time,
            legs,
            frame,
            geometry,
            interest,
            conflicts,
        }
    }

    /// The same legs seen at a later time.
    pub(crate) fn at(&self, time: Timestamp) -> Self {
        Self {
            time,
            interest: legs_of_interest(&self.legs, time),
            ..self.clone()
        }
    }

    /// Effective end of the last leg.
    pub fn end_time(&self) -> Option<Timestamp> {
        self.legs.last().map(Leg::end_time)
    }

    /// Returns true once the snapshot's time has reached the end of the last leg.
    pub fn is_finished(&self) -> bool {
        self.end_time().is_some_and(|end| self.time >= end)
    }

    pub fn current_leg(&self) -> Option<&Leg> {
        self.interest.current_leg(&self.legs)
    }

    /// Journey progress for an optional device position.
    pub fn progress(
        &self,
        position: Option<LatLon>,
        config: &ProgressConfig,
    ) -> Option<JourneyProgress> {
        journey_progress(&self.legs, &self.interest, self.time, position, config)
    }
}
