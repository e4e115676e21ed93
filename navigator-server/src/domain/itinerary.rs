//! Itinerary type.
//!
//! An `Itinerary` is the planned, ordered sequence of legs for one trip.
//! It is immutable once built; reconciliation works on copies of its legs.

use std::sync::Arc;

use chrono::Duration;

use super::{DomainError, Leg, Timestamp};

/// A planned trip from origin to destination.
///
/// Legs are shared behind an `Arc` so a tracking session can hold the
/// planned sequence without copying it on every refresh.
///
/// # Invariants
///
/// - At least one leg
#[derive(Debug, Clone)]
pub struct Itinerary {
    legs: Arc<[Leg]>,
}

impl Itinerary {
    /// Build an itinerary from its legs.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::EmptyItinerary` if `legs` is empty.
    pub fn new(legs: Vec<Leg>) -> Result<Self, DomainError> {
        if legs.is_empty() {
            return Err(DomainError::EmptyItinerary);
        }

        Ok(Self { legs: legs.into() })
    }

    /// Returns the legs in travel order.
    pub fn legs(&self) -> &[Leg] {
        &self.legs
    }

    /// Returns the first leg.
    pub fn first_leg(&self) -> &Leg {
        // Safe: non-empty by construction
        &self.legs[0]
    }

    /// Returns the last leg.
    pub fn last_leg(&self) -> &Leg {
        // Safe: non-empty by construction
        &self.legs[self.legs.len() - 1]
    }

    /// Effective start of the first leg.
    pub fn start_time(&self) -> Timestamp {
        self.first_leg().start_time()
    }

    /// Effective end of the last leg.
    pub fn end_time(&self) -> Timestamp {
        self.last_leg().end_time()
    }

    /// Total time from first departure to final arrival.
    pub fn total_duration(&self) -> Duration {
        self.end_time() - self.start_time()
    }

    /// Number of transit legs, counting an interlined run once.
    pub fn boardings(&self) -> usize {
        self.legs
            .iter()
            .filter(|leg| leg.is_transit() && !leg.is_interlined())
            .count()
    }

    /// Returns true if any transit leg can be refreshed in realtime.
    pub fn has_realtime_legs(&self) -> bool {
        self.legs.iter().any(|leg| leg.leg_id().is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LegId, LegKind, LegTime, Mode, Place, TransitDetails};

    fn t(mins: i64) -> Timestamp {
        Timestamp::from_millis(mins * 60_000)
    }

    fn leg(kind: LegKind, start: i64, end: i64) -> Leg {
        Leg::new(
            kind,
            LegTime::scheduled(t(start)),
            LegTime::scheduled(t(end)),
            Place::new(60.0, 24.0),
            Place::new(60.0, 24.0),
        )
        .unwrap()
    }

    #[test]
    fn empty_itinerary_rejected() {
        assert!(matches!(
            Itinerary::new(vec![]),
            Err(DomainError::EmptyItinerary)
        ));
    }

    #[test]
    fn times_and_boardings() {
        let itinerary = Itinerary::new(vec![
            leg(LegKind::Walk { mode: Mode::Walk }, 0, 5),
            leg(
                LegKind::Transit(TransitDetails::new(Mode::Bus, Some(LegId::new("a")))),
                5,
                20,
            ),
            leg(
                LegKind::Transit(TransitDetails::new(Mode::Bus, None).interlined()),
                20,
                30,
            ),
            leg(LegKind::Walk { mode: Mode::Walk }, 30, 34),
        ])
        .unwrap();

        assert_eq!(itinerary.start_time(), t(0));
        assert_eq!(itinerary.end_time(), t(34));
        assert_eq!(itinerary.total_duration(), Duration::minutes(34));
        assert_eq!(itinerary.boardings(), 1);
        assert!(itinerary.has_realtime_legs());
    }

    #[test]
    fn walk_only_itinerary_has_no_realtime_legs() {
        let itinerary =
            Itinerary::new(vec![leg(LegKind::Walk { mode: Mode::Walk }, 0, 15)]).unwrap();

        assert!(!itinerary.has_realtime_legs());
        assert_eq!(itinerary.boardings(), 0);
        assert!(std::ptr::eq(itinerary.first_leg(), itinerary.last_leg()));
    }
}
