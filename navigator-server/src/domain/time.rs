//! Timestamps for itinerary legs.
//!
//! The planner sends times as ISO-8601 strings with a UTC offset, e.g.
//! `"2024-05-20T10:15:00+03:00"`. All timing arithmetic happens on epoch
//! milliseconds; the offset is only kept so that outgoing strings read the
//! same as the ones that came in.

use std::fmt;
use std::ops::{Add, Sub};

use chrono::{DateTime, Duration, FixedOffset, Offset, SecondsFormat, Utc};

/// Error returned when a timestamp cannot be parsed or represented.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TimeError {
    /// The string is not an ISO-8601 timestamp with an offset
    #[error("invalid timestamp {value:?}: {reason}")]
    Parse { value: String, reason: String },

    /// The epoch value is outside chrono's representable range
    #[error("timestamp out of range: {0} ms")]
    OutOfRange(i64),
}

/// A point in time, stored as milliseconds since the Unix epoch.
///
/// # Examples
///
/// ```
/// use navigator_server::domain::Timestamp;
/// use chrono::Duration;
///
/// let (t, offset) = Timestamp::parse_iso("2024-05-20T10:15:00+03:00").unwrap();
/// assert_eq!(t.as_millis(), 1_716_189_300_000);
///
/// let later = t + Duration::minutes(5);
/// assert_eq!(later.to_iso(offset).unwrap(), "2024-05-20T10:20:00+03:00");
/// ```
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp(i64);

impl Timestamp {
    /// Create a timestamp from epoch milliseconds.
    pub const fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    /// Returns the epoch milliseconds.
    pub const fn as_millis(self) -> i64 {
        self.0
    }

    /// The current wall-clock time.
    pub fn now() -> Self {
        Self::from_datetime(&Utc::now())
    }

    /// Create a timestamp from any chrono datetime.
    pub fn from_datetime<Tz: chrono::TimeZone>(dt: &DateTime<Tz>) -> Self {
        Self(dt.timestamp_millis())
    }

    /// Parse an ISO-8601 / RFC 3339 timestamp, returning its offset as well.
    pub fn parse_iso(s: &str) -> Result<(Self, FixedOffset), TimeError> {
        let dt = DateTime::parse_from_rfc3339(s).map_err(|e| TimeError::Parse {
            value: s.to_string(),
            reason: e.to_string(),
        })?;
        Ok((Self::from_datetime(&dt), *dt.offset()))
    }

    /// Convert to a datetime in the given offset.
    pub fn to_datetime(self, offset: FixedOffset) -> Result<DateTime<FixedOffset>, TimeError> {
        DateTime::from_timestamp_millis(self.0)
            .map(|dt| dt.with_timezone(&offset))
            .ok_or(TimeError::OutOfRange(self.0))
    }

    /// Format as an ISO-8601 string in the given offset.
    pub fn to_iso(self, offset: FixedOffset) -> Result<String, TimeError> {
        Ok(self
            .to_datetime(offset)?
            .to_rfc3339_opts(SecondsFormat::AutoSi, false))
    }

    /// Returns the signed duration from `other` to `self`.
    pub fn signed_duration_since(self, other: Self) -> Duration {
        Duration::milliseconds(self.0.saturating_sub(other.0))
    }
}

impl Add<Duration> for Timestamp {
    type Output = Self;

    fn add(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_add(rhs.num_milliseconds()))
    }
}

impl Sub<Duration> for Timestamp {
    type Output = Self;

    fn sub(self, rhs: Duration) -> Self::Output {
        Self(self.0.saturating_sub(rhs.num_milliseconds()))
    }
}

impl Sub for Timestamp {
    type Output = Duration;

    fn sub(self, rhs: Self) -> Self::Output {
        self.signed_duration_since(rhs)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_iso(Utc.fix()) {
            Ok(iso) => f.write_str(&iso),
            Err(_) => write!(f, "{}ms", self.0),
        }
    }
}

/// A realtime estimate for one end of a leg.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Estimate {
    pub time: Timestamp,
}

/// Start or end time of a leg.
///
/// The effective time is the realtime estimate when one is present,
/// otherwise the scheduled time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LegTime {
    /// Scheduled (or reconciled) time
    pub scheduled: Timestamp,

    /// Realtime estimate, if the upstream has one
    pub estimated: Option<Estimate>,

    /// Offset of the original string, used when formatting
    pub offset: FixedOffset,
}

impl LegTime {
    /// A scheduled time in UTC with no estimate.
    pub fn scheduled(time: Timestamp) -> Self {
        Self {
            scheduled: time,
            estimated: None,
            offset: Utc.fix(),
        }
    }

    /// Attach a realtime estimate.
    pub fn with_estimate(mut self, time: Timestamp) -> Self {
        self.estimated = Some(Estimate { time });
        self
    }

    /// Set the offset used for formatting.
    pub fn with_offset(mut self, offset: FixedOffset) -> Self {
        self.offset = offset;
        self
    }

    /// Returns the effective time.
    pub fn time(&self) -> Timestamp {
        self.estimated.map_or(self.scheduled, |e| e.time)
    }

    /// Returns true if a realtime estimate is present.
    pub fn is_estimated(&self) -> bool {
        self.estimated.is_some()
    }

    /// Returns the estimate's delay relative to the scheduled time.
    pub fn delay(&self) -> Option<Duration> {
        self.estimated.map(|e| e.time - self.scheduled)
    }

    /// Overwrite the effective time.
    ///
    /// The new value becomes the scheduled time and any estimate is dropped,
    /// so `time()` returns exactly `time` afterwards.
    pub fn set_time(&mut self, time: Timestamp) {
        self.scheduled = time;
        self.estimated = None;
    }
}
