//! Application state for the web layer.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::info;

use crate::session::{Clock, ProgressConfig, RealtimeLegSession, SessionConfig};

/// Identifier of a tracked session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub u64);

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Shared application state.
///
/// Contains the leg source every session polls and the registry of
/// running sessions.
pub struct AppState<S> {
    /// Realtime leg source shared by all sessions
    pub source: Arc<S>,

    /// Time source handed to new sessions
    pub clock: Arc<dyn Clock>,

    pub session_config: Arc<SessionConfig>,
    pub progress_config: Arc<ProgressConfig>,

    /// Running sessions
    pub sessions: Arc<RwLock<HashMap<SessionId, RealtimeLegSession<S>>>>,

    next_id: Arc<AtomicU64>,
}

// Derive would require `S: Clone`
impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            clock: Arc::clone(&self.clock),
            session_config: Arc::clone(&self.session_config),
            progress_config: Arc::clone(&self.progress_config),
            sessions: Arc::clone(&self.sessions),
            next_id: Arc::clone(&self.next_id),
        }
    }
}

impl<S> AppState<S> {
    /// Create a new app state.
    pub fn new(
        source: S,
        clock: Arc<dyn Clock>,
        session_config: SessionConfig,
        progress_config: ProgressConfig,
    ) -> Self {
        Self {
            source: Arc::new(source),
            clock,
            session_config: Arc::new(session_config),
            progress_config: Arc::new(progress_config),
            sessions: Arc::new(RwLock::new(HashMap::new())),
            next_id: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Allocate a fresh session id.
    pub fn next_session_id(&self) -> SessionId {
        SessionId(self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of running sessions.
    pub async fn session_count(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drop sessions whose last leg ended more than `finished_retention` ago.
    ///
    /// Returns how many were removed.
    pub async fn evict_finished(&self) -> usize {
        let cutoff = self.clock.now() - self.session_config.finished_retention;

        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, session| {
            let expired = session
                .snapshot()
                .end_time()
                .is_some_and(|end| end <= cutoff);
            if expired {
                info!(session = %id, "evicting finished session");
            }
            !expired
        });

        before - sessions.len()
    }
}
