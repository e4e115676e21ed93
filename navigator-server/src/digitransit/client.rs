//! Digitransit routing API client.
//!
//! Fetches the realtime status of single itinerary legs through the GraphQL
//! `leg(id:)` query. Handles authentication, rate limiting, and conversion
//! to domain types.

use std::sync::Arc;

use reqwest::header::{HeaderMap, HeaderValue};
use tokio::sync::Semaphore;
use tracing::debug;

use crate::domain::{LegId, RealtimeLeg};

use super::convert::convert_realtime_leg;
use super::error::DigitransitError;
use super::source::LegSource;
use super::types::{GraphQlRequest, GraphQlResponse, LegQueryData, LegQueryVariables};

/// Default base URL for the Digitransit API.
const DEFAULT_BASE_URL: &str = "https://api.digitransit.fi";

/// Default router (Helsinki region).
const DEFAULT_ROUTER: &str = "hsl";

/// Default maximum concurrent requests.
const DEFAULT_MAX_CONCURRENT: usize = 5;

/// Subscription key header expected by the API gateway.
const API_KEY_HEADER: &str = "digitransit-subscription-key";

/// Realtime fields of one leg.
const LEG_QUERY: &str = r#"query Leg($id: String!) {
  leg(id: $id) {
    id
    realtimeState
    realTime
    start { scheduledTime estimated { time delay } }
    end { scheduledTime estimated { time delay } }
    to {
      vehicleRentalStation {
        stationId
        name
        availableVehicles { total }
        availableSpaces { total }
        operative
      }
    }
  }
}"#;

/// Configuration for the Digitransit client.
#[derive(Debug, Clone)]
pub struct DigitransitConfig {
    /// Subscription key for the API gateway
    pub api_key: String,
    /// Base URL for the API (defaults to production Digitransit)
    pub base_url: String,
    /// Router name, e.g. "hsl", "waltti" or "finland"
    pub router: String,
    /// Maximum concurrent requests
    pub max_concurrent: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl DigitransitConfig {
    /// Create a new config with the given subscription key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            router: DEFAULT_ROUTER.to_string(),
            max_concurrent: DEFAULT_MAX_CONCURRENT,
            timeout_secs: 10,
        }
    }

    /// Set a custom base URL (for testing).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the router.
    pub fn with_router(mut self, router: impl Into<String>) -> Self {
        self.router = router.into();
        self
    }

    /// Set maximum concurrent requests.
    pub fn with_max_concurrent(mut self, n: usize) -> Self {
        self.max_concurrent = n;
        self
    }

    /// Set request timeout.
    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }

    /// The GraphQL endpoint for the configured router.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/routing/v2/{}/gtfs/v1",
            self.base_url.trim_end_matches('/'),
            self.router
        )
    }
}

/// Digitransit routing API client.
///
/// Uses a semaphore to limit concurrent requests and avoid rate limiting.
#[derive(Debug, Clone)]
pub struct DigitransitClient {
    http: reqwest::Client,
    endpoint: String,
    semaphore: Arc<Semaphore>,
}

impl DigitransitClient {
    /// Create a new client with the given configuration.
    pub fn new(config: DigitransitConfig) -> Result<Self, DigitransitError> {
        if config.api_key.is_empty() {
            return Err(DigitransitError::NotConfigured(
                "DIGITRANSIT_API_KEY is empty".to_string(),
            ));
        }

        let mut headers = HeaderMap::new();
        let api_key =
            HeaderValue::from_str(&config.api_key).map_err(|_| DigitransitError::ApiError {
                status: 0,
                message: "Invalid API key format".to_string(),
            })?;
        headers.insert(API_KEY_HEADER, api_key);

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            endpoint: config.endpoint(),
            semaphore: Arc::new(Semaphore::new(config.max_concurrent)),
        })
    }

    /// The GraphQL endpoint this client posts to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Get the realtime status of a leg.
    ///
    /// Leg ids are only valid for as long as the router keeps the trip in
    /// its realtime index; an expired id returns `LegNotFound`.
    pub async fn get_leg(&self, id: &LegId) -> Result<RealtimeLeg, DigitransitError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| DigitransitError::ApiError {
                status: 0,
                message: "Semaphore closed".to_string(),
            })?;

        let request = GraphQlRequest {
            query: LEG_QUERY,
            variables: LegQueryVariables { id: id.as_str() },
        };

        let response = self.http.post(&self.endpoint).json(&request).send().await?;

        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED || status == reqwest::StatusCode::FORBIDDEN
        {
            return Err(DigitransitError::Unauthorized);
        }

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(DigitransitError::RateLimited);
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DigitransitError::ApiError {
                status: status.as_u16(),
                message: body,
            });
        }

        let body = response.text().await?;
        let leg = parse_leg_response(&body, id)?;

        debug!(leg = %id, realtime = leg.realtime, "fetched leg");
        Ok(leg)
    }
}

impl LegSource for DigitransitClient {
    async fn fetch_leg(&self, id: &LegId) -> Result<RealtimeLeg, DigitransitError> {
        self.get_leg(id).await
    }
}

/// Decode a leg query response body.
fn parse_leg_response(body: &str, id: &LegId) -> Result<RealtimeLeg, DigitransitError> {
    let response: GraphQlResponse<LegQueryData> =
        serde_json::from_str(body).map_err(|e| DigitransitError::Json {
            message: e.to_string(),
            body: Some(body.chars().take(500).collect()),
        })?;

    if !response.errors.is_empty() {
        let messages: Vec<&str> = response.errors.iter().map(|e| e.message.as_str()).collect();
        return Err(DigitransitError::GraphQl(messages.join("; ")));
    }

    let leg = response
        .data
        .and_then(|data| data.leg)
        .ok_or_else(|| DigitransitError::LegNotFound(id.to_string()))?;

    Ok(convert_realtime_leg(&leg, id)?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_builder() {
        let config = DigitransitConfig::new("test-key")
            .with_base_url("http://localhost:8080")
            .with_router("waltti")
            .with_max_concurrent(10)
            .with_timeout(60);

        assert_eq!(config.api_key, "test-key");
        assert_eq!(config.base_url, "http://localhost:8080");
        assert_eq!(config.router, "waltti");
        assert_eq!(config.max_concurrent, 10);
        assert_eq!(config.timeout_secs, 60);
    }

    #[test]
    fn config_defaults() {
        let config = DigitransitConfig::new("test-key");

        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.router, DEFAULT_ROUTER);
        assert_eq!(config.max_concurrent, DEFAULT_MAX_CONCURRENT);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn endpoint_format() {
        let config = DigitransitConfig::new("k").with_base_url("http://localhost:8080/");
        assert_eq!(
            config.endpoint(),
            "http://localhost:8080/routing/v2/hsl/gtfs/v1"
        );
    }

    #[test]
    fn client_creation() {
        let client = DigitransitClient::new(DigitransitConfig::new("test-key")).unwrap();
        assert_eq!(
            client.endpoint(),
            "https://api.digitransit.fi/routing/v2/hsl/gtfs/v1"
        );
    }

    #[test]
    fn client_requires_key() {
        assert!(matches!(
            DigitransitClient::new(DigitransitConfig::new("")),
            Err(DigitransitError::NotConfigured(_))
        ));
    }

    #[test]
    fn parse_response_ok() {
        let body = r#"{ "data": { "leg": {
            "id": "leg-1",
            "realTime": true,
            "realtimeState": "UPDATED",
            "start": { "scheduledTime": "2024-05-20T10:15:00+03:00",
                       "estimated": { "time": "2024-05-20T10:18:00+03:00", "delay": "PT3M" } },
            "end": { "scheduledTime": "2024-05-20T10:35:00+03:00" },
            "to": { "vehicleRentalStation": null }
        } } }"#;

        let leg = parse_leg_response(body, &LegId::new("leg-1")).unwrap();

        assert!(leg.realtime);
        assert_eq!(leg.start.delay(), Some(chrono::Duration::minutes(3)));
        assert!(leg.destination_rental_station.is_none());
    }

    #[test]
    fn parse_response_null_leg() {
        let body = r#"{ "data": { "leg": null } }"#;

        assert!(matches!(
            parse_leg_response(body, &LegId::new("gone")),
            Err(DigitransitError::LegNotFound(id)) if id == "gone"
        ));
    }

    #[test]
    fn parse_response_graphql_errors() {
        let body = r#"{ "errors": [{ "message": "a" }, { "message": "b" }] }"#;

        assert!(matches!(
            parse_leg_response(body, &LegId::new("x")),
            Err(DigitransitError::GraphQl(msg)) if msg == "a; b"
        ));
    }

    #[test]
    fn parse_response_garbage() {
        assert!(matches!(
            parse_leg_response("<html>", &LegId::new("x")),
            Err(DigitransitError::Json { body: Some(_), .. })
        ));
    }

    #[test]
    fn parse_response_bad_timestamp() {
        let body = r#"{ "data": { "leg": {
            "id": "leg-1",
            "start": { "scheduledTime": "soon" },
            "end": { "scheduledTime": "2024-05-20T10:35:00+03:00" },
            "to": {}
        } } }"#;

        assert!(matches!(
            parse_leg_response(body, &LegId::new("leg-1")),
            Err(DigitransitError::Conversion(_))
        ));
    }
}
