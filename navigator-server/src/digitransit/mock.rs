//! Mock leg source for testing without API access.
//!
//! Serves canned realtime legs (or canned failures) keyed by leg id, and
//! counts how often it was asked.

use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, PoisonError, RwLock, RwLockWriteGuard};

use crate::domain::{LegId, RealtimeLeg};

use super::convert::convert_realtime_leg;
use super::error::DigitransitError;
use super::source::LegSource;
use super::types::{GraphQlResponse, LegQueryData, RealtimeLegDto};

/// A canned response: a leg, or the message of an API error.
type Canned = Result<RealtimeLeg, String>;

/// Mock leg source that serves data from memory.
///
/// Clones share their responses and fetch counter.
#[derive(Clone, Default)]
pub struct MockLegSource {
    legs: Arc<RwLock<HashMap<LegId, Canned>>>,
    fetches: Arc<AtomicUsize>,
}

impl MockLegSource {
    /// Create an empty source; every fetch fails with `LegNotFound`.
    pub fn new() -> Self {
        Self::default()
    }

    /// Serve `leg` for its id.
    pub fn with_leg(self, leg: RealtimeLeg) -> Self {
        self.set_leg(leg);
        self
    }

    /// Fail every fetch of `id` with an API error.
    pub fn with_failure(self, id: LegId, message: impl Into<String>) -> Self {
        self.canned().insert(id, Err(message.into()));
        self
    }

    /// Replace the response for a leg while sessions are running.
    pub fn set_leg(&self, leg: RealtimeLeg) {
        self.canned().insert(leg.leg_id.clone(), Ok(leg));
    }

    fn canned(&self) -> RwLockWriteGuard<'_, HashMap<LegId, Canned>> {
        self.legs.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Number of fetches served so far, including failures.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }

    /// Load legs from a directory.
    ///
    /// Expects files named `{leg_id}.json`, each holding either a bare
    /// `leg` object or a full GraphQL response.
    pub fn from_dir(data_dir: impl AsRef<Path>) -> Result<Self, DigitransitError> {
        let data_dir = data_dir.as_ref();
        let mut legs = HashMap::new();

        let entries = std::fs::read_dir(data_dir).map_err(|e| {
            DigitransitError::NotConfigured(format!(
                "failed to read mock data directory {data_dir:?}: {e}"
            ))
        })?;

        for entry in entries {
            let path = entry
                .map_err(|e| {
                    DigitransitError::NotConfigured(format!("failed to read directory entry: {e}"))
                })?
                .path();

            if !path.is_file() || path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }

            let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            let id = LegId::new(stem);

            let json = std::fs::read_to_string(&path).map_err(|e| {
                DigitransitError::NotConfigured(format!("failed to read {path:?}: {e}"))
            })?;

            let dto = parse_mock_leg(&json).map_err(|e| DigitransitError::Json {
                message: format!("{path:?}: {e}"),
                body: None,
            })?;

            legs.insert(id.clone(), Ok(convert_realtime_leg(&dto, &id)?));
        }

        if legs.is_empty() {
            return Err(DigitransitError::NotConfigured(format!(
                "no mock leg files found in {data_dir:?}"
            )));
        }

        Ok(Self {
            legs: Arc::new(RwLock::new(legs)),
            fetches: Arc::default(),
        })
    }
}

fn parse_mock_leg(json: &str) -> Result<RealtimeLegDto, serde_json::Error> {
    if let Ok(response) = serde_json::from_str::<GraphQlResponse<LegQueryData>>(json) {
        if let Some(leg) = response.data.and_then(|d| d.leg) {
            return Ok(leg);
        }
    }
    serde_json::from_str(json)
}

impl LegSource for MockLegSource {
    async fn fetch_leg(&self, id: &LegId) -> Result<RealtimeLeg, DigitransitError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        let canned = self
            .legs
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id)
            .cloned();

        match canned {
            Some(Ok(leg)) => Ok(leg),
            Some(Err(message)) => Err(DigitransitError::ApiError {
                status: 503,
                message,
            }),
            None => Err(DigitransitError::LegNotFound(id.to_string())),
        }
    }
}
