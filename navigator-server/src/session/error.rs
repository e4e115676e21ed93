//! Session error types.

use crate::domain::DomainError;
use crate::geometry::GeometryError;

/// Errors starting a realtime leg session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SessionError {
    /// The itinerary is empty or malformed
    #[error(transparent)]
    Domain(#[from] DomainError),

    /// A leg's geometry couldn't be decoded
    #[error(transparent)]
    Geometry(#[from] GeometryError),
}
