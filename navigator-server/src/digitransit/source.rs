//! The seam between realtime sessions and the upstream API.

use std::future::Future;

use crate::domain::{LegId, RealtimeLeg};

use super::error::DigitransitError;

/// Something that can fetch the realtime status of a transit leg.
///
/// Implemented by the HTTP client, the caching wrapper and the in-memory
/// mock, so sessions can be tested without network access.
pub trait LegSource: Send + Sync + 'static {
    /// Fetch the current realtime view of one leg.
    fn fetch_leg(
        &self,
        id: &LegId,
    ) -> impl Future<Output = Result<RealtimeLeg, DigitransitError>> + Send;
}
