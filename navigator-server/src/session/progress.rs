//! Journey progress: has the rider arrived, and which leg to show.

use crate::domain::{Leg, Timestamp};
use crate::geometry::{LatLon, haversine_distance};
use crate::interest::LegsOfInterest;

use super::config::ProgressConfig;

/// Where the rider stands relative to the end of the journey.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JourneyProgress {
    /// Effective end of the last leg
    pub arrival: Timestamp,

    /// The device is within the configured radius of the destination
    pub destination_reached: bool,

    /// More than the grace period has passed since `arrival`
    pub past_expected_arrival: bool,

    /// Distance to the destination in metres, when a position is known
    pub distance_to_destination: Option<f64>,

    /// Leg the navigator should display
    pub display_leg: Option<usize>,
}

impl JourneyProgress {
    /// Returns true once the journey is over by either measure.
    pub fn completed(&self) -> bool {
        self.destination_reached || self.past_expected_arrival
    }
}

/// Work out progress for `legs` at `time`.
///
/// Returns `None` for an empty sequence.
pub fn journey_progress(
    legs: &[Leg],
    interest: &LegsOfInterest,
    time: Timestamp,
    position: Option<LatLon>,
    config: &ProgressConfig,
) -> Option<JourneyProgress> {
    let last = legs.last()?;
    let arrival = last.end_time();
    let destination = LatLon::new(last.to.lat, last.to.lon);

    let distance_to_destination = position.map(|p| haversine_distance(p, destination));

    Some(JourneyProgress {
        arrival,
        destination_reached: distance_to_destination
            .is_some_and(|d| d <= config.destination_radius_m),
        past_expected_arrival: time > arrival + config.arrival_grace,
        distance_to_destination,
        display_leg: if time > arrival {
            interest.previous
        } else {
            interest.current
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LegKind, LegTime, Mode, Place};
    use crate::interest::legs_of_interest;

    const DEST: LatLon = LatLon {
        lat: 60.1699,
        lon: 24.9384,
    };

    fn mins(m: i64) -> Timestamp {
        Timestamp::from_millis(m * 60_000)
    }

    fn legs() -> Vec<Leg> {
        let leg = |start: i64, end: i64, to: Place| {
            Leg::new(
                LegKind::Walk { mode: Mode::Walk },
                LegTime::scheduled(mins(start)),
                LegTime::scheduled(mins(end)),
                Place::new(60.16, 24.93),
                to,
            )
            .unwrap()
        };
        vec![
            leg(0, 10, Place::new(60.165, 24.935)),
            leg(10, 20, Place::new(DEST.lat, DEST.lon)),
        ]
    }

    fn progress_at(time: Timestamp, position: Option<LatLon>) -> JourneyProgress {
        let legs = legs();
        let interest = legs_of_interest(&legs, time);
        journey_progress(&legs, &interest, time, position, &ProgressConfig::default()).unwrap()
    }

    #[test]
    fn empty_legs_have_no_progress() {
        let interest = LegsOfInterest::default();
        assert!(
            journey_progress(&[], &interest, mins(0), None, &ProgressConfig::default()).is_none()
        );
    }

    #[test]
    fn mid_journey() {
        let progress = progress_at(mins(15), None);

        assert_eq!(progress.arrival, mins(20));
        assert_eq!(progress.display_leg, Some(1));
        assert!(!progress.completed());
        assert!(progress.distance_to_destination.is_none());
    }

    #[test]
    fn near_destination_counts_as_arrived() {
        // About 11 m north of the destination
        let nearby = LatLon::new(DEST.lat + 0.0001, DEST.lon);
        let progress = progress_at(mins(15), Some(nearby));

        assert!(progress.destination_reached);
        assert!(progress.completed());
    }

    #[test]
    fn far_from_destination() {
        let progress = progress_at(mins(15), Some(LatLon::new(60.17, 24.95)));

        assert!(!progress.destination_reached);
        assert!(progress.distance_to_destination.unwrap() > 20.0);
    }

    #[test]
    fn grace_period_after_arrival() {
        let within_grace = progress_at(mins(20) + chrono::Duration::seconds(30), None);
        assert!(!within_grace.past_expected_arrival);
        // After arrival the last finished leg is shown
        assert_eq!(within_grace.display_leg, Some(1));

        let past_grace = progress_at(mins(22), None);
        assert!(past_grace.past_expected_arrival);
        assert!(past_grace.completed());
    }
}
