//! Legs of interest relative to a point in time.
//!
//! The navigator shows the rider where they are in their trip: which leg
//! they're on, which one they just finished and which one is coming up.

use crate::domain::{Leg, Timestamp};

/// Indices of the legs that matter at a given moment.
///
/// All fields are `None` for an empty sequence.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LegsOfInterest {
    pub first: Option<usize>,
    pub last: Option<usize>,

    /// Latest leg that ended strictly before the time
    pub previous: Option<usize>,

    /// Leg whose `[start, end]` contains the time
    pub current: Option<usize>,

    /// Earliest leg that starts strictly after the time
    pub next: Option<usize>,
}

impl LegsOfInterest {
    /// Look up the current leg in `legs`.
    pub fn current_leg<'a>(&self, legs: &'a [Leg]) -> Option<&'a Leg> {
        self.current.and_then(|i| legs.get(i))
    }

    /// Look up the previous leg in `legs`.
    pub fn previous_leg<'a>(&self, legs: &'a [Leg]) -> Option<&'a Leg> {
        self.previous.and_then(|i| legs.get(i))
    }

    /// Look up the next leg in `legs`.
    pub fn next_leg<'a>(&self, legs: &'a [Leg]) -> Option<&'a Leg> {
        self.next.and_then(|i| legs.get(i))
    }
}

/// Compute the legs of interest for `legs` at `time`.
///
/// # Examples
///
/// ```
/// use navigator_server::domain::{Leg, LegKind, LegTime, Mode, Place, Timestamp};
/// use navigator_server::interest::legs_of_interest;
///
/// let leg = |start: i64, end: i64| {
///     Leg::new(
///         LegKind::Walk { mode: Mode::Walk },
///         LegTime::scheduled(Timestamp::from_millis(start)),
///         LegTime::scheduled(Timestamp::from_millis(end)),
///         Place::new(0.0, 0.0),
///         Place::new(0.0, 0.0),
///     )
///     .unwrap()
/// };
/// let legs = vec![leg(0, 10), leg(10, 20), leg(20, 30)];
///
/// let interest = legs_of_interest(&legs, Timestamp::from_millis(15));
/// assert_eq!(interest.current, Some(1));
/// assert_eq!(interest.previous, Some(0));
/// assert_eq!(interest.next, Some(2));
/// ```
pub fn legs_of_interest(legs: &[Leg], time: Timestamp) -> LegsOfInterest {
    if legs.is_empty() {
        return LegsOfInterest::default();
    }

    LegsOfInterest {
        first: Some(0),
        last: Some(legs.len() - 1),
        previous: legs.iter().rposition(|leg| leg.end_time() < time),
        current: legs.iter().position(|leg| leg.contains(time)),
        next: legs.iter().position(|leg| leg.start_time() > time),
    }
}
