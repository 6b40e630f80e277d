//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the latest realtime snapshot and, when credentials are
//! configured, the poller that produces it.
//!
//! Refreshes are single-flight: one lock is held across poll and store, so
//! concurrent callers queue behind the running poll. A caller that acquires
//! the lock within `min_refresh` of the last completed poll gets the stored
//! snapshot instead of spending another round of upstream API calls.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};
use tracing::debug;

use crate::realtime::{Poller, Snapshot};

/// What a refresh request produced.
#[derive(Debug, Clone, PartialEq)]
pub enum RefreshOutcome {
    /// A poll ran and its snapshot was stored.
    Polled(Snapshot),
    /// The last poll is too recent; carries the stored snapshot.
    Throttled { snapshot: Snapshot, retry_after: Duration },
}

impl RefreshOutcome {
    #[must_use]
    pub fn snapshot(&self) -> &Snapshot {
        match self {
            Self::Polled(snapshot) | Self::Throttled { snapshot, .. } => snapshot,
        }
    }
}

/// Shared application state, injected into Axum handlers via State extractor.
#[derive(Clone)]
pub struct AppState {
    pub snapshot: Arc<RwLock<Snapshot>>,
    /// `None` if realtime credentials are not configured.
    pub poller: Option<Arc<Poller>>,
    /// Held across poll and store; records when the last poll finished.
    last_poll: Arc<Mutex<Option<Instant>>>,
    min_refresh: Duration,
}

impl AppState {
    #[must_use]
    pub fn new(poller: Option<Arc<Poller>>, min_refresh: Duration) -> Self {
        Self {
            snapshot: Arc::new(RwLock::new(Snapshot::Pending)),
            poller,
            last_poll: Arc::new(Mutex::new(None)),
            min_refresh,
        }
    }

    /// Poll and store the result, unless the last poll finished less than
    /// `min_refresh` ago. `None` when the poller is disabled.
    pub async fn refresh(&self) -> Option<RefreshOutcome> {
        let poller = self.poller.as_ref()?;
        let mut last_poll = self.last_poll.lock().await;

        if let Some(finished) = *last_poll {
            let elapsed = finished.elapsed();
            if elapsed < self.min_refresh {
                let retry_after = self.min_refresh - elapsed;
                debug!(retry_after_ms = retry_after.as_millis(), "realtime refresh throttled");
                return Some(RefreshOutcome::Throttled { snapshot: self.latest().await, retry_after });
            }
        }

        let snapshot = poller.poll().await;
        debug!(markers = snapshot.markers().len(), "realtime snapshot stored");
        *self.snapshot.write().await = snapshot.clone();
        *last_poll = Some(Instant::now());
        Some(RefreshOutcome::Polled(snapshot))
    }

    pub async fn latest(&self) -> Snapshot {
        self.snapshot.read().await.clone()
    }
}

#[cfg(test)]
#[path = "state_test.rs"]
mod tests;

// =============================================================================
// TEST HELPERS
// =============================================================================
