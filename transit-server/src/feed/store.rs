//! Current feed data with background refresh.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::catalog::Catalog;

use super::client::{FeedClient, FeedSource};
use super::error::FeedError;

/// Whether feed data is available to queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FeedStatus {
    /// No load has succeeded yet.
    Uninitialized,
    /// The last refresh succeeded.
    Ready,
    /// Serving an older catalog because the last refresh failed.
    Degraded,
}

/// Result of a refresh that did not fail.
#[derive(Debug, Clone)]
pub enum RefreshOutcome {
    /// A new catalog is now current.
    Published(Arc<Catalog>),
    /// Another refresh was in flight; nothing was done.
    AlreadyRunning,
}

#[derive(Default)]
struct State {
    catalog: Option<Arc<Catalog>>,
    last_error: Option<String>,
    last_attempt: Option<DateTime<Utc>>,
}

struct Inner {
    client: FeedClient,
    state: RwLock<State>,
    /// Held for the duration of a refresh; guards the last published generation.
    refresh: Mutex<u64>,
}

/// Thread-safe holder of the current [`Catalog`].
///
/// Readers take a cheap `Arc` clone of the current catalog. A refresh builds
/// the next catalog off to the side and swaps it in; on failure the previous
/// one stays in place.
#[derive(Clone)]
pub struct FeedStore {
    inner: Arc<Inner>,
}

impl FeedStore {
    /// Create an empty store. Nothing is fetched until [`refresh`](Self::refresh).
    pub fn new(client: FeedClient) -> Self {
        Self {
            inner: Arc::new(Inner {
                client,
                state: RwLock::new(State::default()),
                refresh: Mutex::new(0),
            }),
        }
    }

    pub fn source(&self) -> &FeedSource {
        self.inner.client.source()
    }

    /// The current catalog, if any load has succeeded.
    pub async fn current(&self) -> Option<Arc<Catalog>> {
        self.inner.state.read().await.catalog.clone()
    }

    pub async fn status(&self) -> FeedStatus {
        let state = self.inner.state.read().await;
        match (&state.catalog, &state.last_error) {
            (None, _) => FeedStatus::Uninitialized,
            (Some(_), None) => FeedStatus::Ready,
            (Some(_), Some(_)) => FeedStatus::Degraded,
        }
    }

    /// Message of the last failed refresh, cleared by the next success.
    pub async fn last_error(&self) -> Option<String> {
        self.inner.state.read().await.last_error.clone()
    }

    pub async fn last_attempt(&self) -> Option<DateTime<Utc>> {
        self.inner.state.read().await.last_attempt
    }

    /// Fetch the feed and publish a new catalog.
    ///
    /// Returns [`RefreshOutcome::AlreadyRunning`] without waiting if another
    /// refresh holds the lock. On error the current catalog is untouched.
    pub async fn refresh(&self) -> Result<RefreshOutcome, FeedError> {
        let Ok(mut generation) = self.inner.refresh.try_lock() else {
            debug!("feed refresh already in flight");
            return Ok(RefreshOutcome::AlreadyRunning);
        };

        let started = Instant::now();
        info!(source = ?self.source(), "refreshing feed");

        let result = self.load(*generation + 1).await;

        let mut state = self.inner.state.write().await;
        state.last_attempt = Some(Utc::now());
        match result {
            Ok(catalog) => {
                let catalog = Arc::new(catalog);
                *generation = catalog.generation;
                state.catalog = Some(catalog.clone());
                state.last_error = None;
                drop(state);

                info!(
                    generation = catalog.generation,
                    lines = catalog.lines.len(),
                    indexed = catalog.index.len(),
                    variants = catalog.index.variant_count(),
                    stops = catalog.snapshot.stop_count(),
                    elapsed_ms = started.elapsed().as_millis() as u64,
                    "feed refreshed"
                );
                Ok(RefreshOutcome::Published(catalog))
            }
            Err(e) => {
                state.last_error = Some(e.to_string());
                let serving = state.catalog.as_ref().map(|c| c.generation);
                drop(state);

                warn!(error = %e, ?serving, "feed refresh failed, keeping previous data");
                Err(e)
            }
        }
    }

    async fn load(&self, generation: u64) -> Result<Catalog, FeedError> {
        let bytes = self.inner.client.fetch().await?;
        tokio::task::spawn_blocking(move || Catalog::from_archive(&bytes, generation))
            .await
            .map_err(|e| FeedError::Task(e.to_string()))?
    }
}
