//! Session and journey-progress configuration.

use std::time::Duration;

/// Configuration for a realtime leg session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Time between refresh cycles.
    pub poll_interval: Duration,

    /// How long a finished session stays available after its last leg ends.
    pub finished_retention: chrono::Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(10),
            finished_retention: chrono::Duration::minutes(15),
        }
    }
}

impl SessionConfig {
    /// Set the refresh period.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn with_finished_retention(mut self, retention: chrono::Duration) -> Self {
        self.finished_retention = retention;
        self
    }
}

/// When a journey counts as finished.
#[derive(Debug, Clone)]
pub struct ProgressConfig {
    /// Distance from the destination, in metres, that counts as arrived.
    pub destination_radius_m: f64,

    /// How long after the expected arrival the journey is considered over
    /// even without a position fix.
    pub arrival_grace: chrono::Duration,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            destination_radius_m: 20.0,
            arrival_grace: chrono::Duration::seconds(60),
        }
    }
}

impl ProgressConfig {
    pub fn with_destination_radius(mut self, metres: f64) -> Self {
        self.destination_radius_m = metres;
        self
    }

    pub fn with_arrival_grace(mut self, grace: chrono::Duration) -> Self {
        self.arrival_grace = grace;
        self
    }
}
