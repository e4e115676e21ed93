//! Domain types for the trip navigator.
//!
//! This module contains the core domain model: legs, their endpoints and
//! timing, and the itinerary that orders them. Types enforce their
//! invariants at construction time where they have any.

mod error;
mod itinerary;
mod leg;
mod place;
mod realtime;
mod time;

pub use error::DomainError;
pub use itinerary::Itinerary;
pub use leg::{Leg, LegId, LegKind, Mode, RealtimeState, TransitDetails};
pub use place::{Place, RentalStation, RentalVehicle, StopRef};
pub use realtime::RealtimeLeg;
pub use time::{Estimate, LegTime, TimeError, Timestamp};
