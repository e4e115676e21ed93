//! Realtime leg sessions.
//!
//! A session owns one planned itinerary and keeps a reconciled copy of it
//! up to date by polling a [`LegSource`](crate::digitransit::LegSource).
//! Readers get immutable [`Snapshot`]s, either on demand or pushed through a
//! watch channel.

mod clock;
mod config;
mod error;
mod progress;
mod refresh;
mod snapshot;
mod tracker;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{ProgressConfig, SessionConfig};
pub use error::SessionError;
pub use progress::{JourneyProgress, journey_progress};
pub use refresh::{Refreshed, refresh_legs};
pub use snapshot::Snapshot;
pub use tracker::RealtimeLegSession;
