//! Digitransit client error types.

use super::convert::ConversionError;

/// Errors from the Digitransit routing API.
#[derive(Debug, thiserror::Error)]
pub enum DigitransitError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error("JSON parse error: {message}{}", body_suffix(.body))]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// The GraphQL response carried an `errors` array
    #[error("GraphQL error: {0}")]
    GraphQl(String),

    /// The router doesn't know this leg id (expired or invalid)
    #[error("leg not found: {0}")]
    LegNotFound(String),

    /// Rate limited by the API
    #[error("rate limited by Digitransit API")]
    RateLimited,

    /// Invalid subscription key
    #[error("unauthorized (invalid subscription key)")]
    Unauthorized,

    /// The response didn't convert to domain types
    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    /// Feature not configured or not available
    #[error("not configured: {0}")]
    NotConfigured(String),
}

fn body_suffix(body: &Option<String>) -> String {
    body.as_deref()
        .map(|b| format!(" (body: {b})"))
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = DigitransitError::LegNotFound("leg-1".into());
        assert_eq!(err.to_string(), "leg not found: leg-1");

        let err = DigitransitError::ApiError {
            status: 500,
            message: "Internal Server Error".into(),
        };
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");

        let err = DigitransitError::Json {
            message: "expected string".into(),
            body: Some("{}".into()),
        };
        assert_eq!(err.to_string(), "JSON parse error: expected string (body: {})");

        let err = DigitransitError::Json {
            message: "expected string".into(),
            body: None,
        };
        assert_eq!(err.to_string(), "JSON parse error: expected string");
    }
}
