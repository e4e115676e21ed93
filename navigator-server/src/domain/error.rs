//! Domain error types.
//!
//! These errors represent validation failures in the domain layer.
//! They are distinct from API/IO errors.

use super::TimeError;

/// Domain-level errors for validation and data consistency.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    /// Invalid leg construction (e.g., end before start)
    #[error("invalid leg: {0}")]
    InvalidLeg(&'static str),

    /// Itinerary has no legs
    #[error("itinerary must have at least one leg")]
    EmptyItinerary,

    /// A timestamp could not be parsed or represented
    #[error(transparent)]
    Time(#[from] TimeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DomainError::InvalidLeg("leg must not end before it starts");
        assert_eq!(
            err.to_string(),
            "invalid leg: leg must not end before it starts"
        );

        let err = DomainError::EmptyItinerary;
        assert_eq!(err.to_string(), "itinerary must have at least one leg");

        let err = DomainError::from(TimeError::OutOfRange(-1));
        assert_eq!(err.to_string(), "timestamp out of range: -1 ms");
    }
}
