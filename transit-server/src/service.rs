//! Query facade over the feed store and resolution cache.

use std::sync::Arc;

use tracing::debug;

use crate::cache::{CacheConfig, ResolutionCache};
use crate::catalog::Catalog;
use crate::domain::{CategorizedLines, Category, Position, classify};
use crate::feed::{FeedError, FeedStatus, FeedStore, RefreshOutcome, StopScheduleEntry};
use crate::index::{Resolution, RouteVariantSet};

/// Errors from queries against the current catalog.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ServiceError {
    /// No feed has been loaded yet
    #[error("feed data not loaded yet")]
    NotInitialized,

    /// The stop id is not in the stops table
    #[error("stop not found: {0}")]
    StopNotFound(String),
}

/// Core transit queries.
///
/// Cheap to clone; clones share the store and cache.
#[derive(Clone)]
pub struct TransitService {
    store: FeedStore,
    cache: Arc<ResolutionCache>,
}

impl TransitService {
    pub fn new(store: FeedStore, cache_config: &CacheConfig) -> Self {
        Self {
            store,
            cache: Arc::new(ResolutionCache::new(cache_config)),
        }
    }

    pub fn store(&self) -> &FeedStore {
        &self.store
    }

    pub fn cache(&self) -> &ResolutionCache {
        &self.cache
    }

    /// Category of a raw line identifier. Needs no feed data.
    pub fn classify(&self, line: &str) -> Category {
        classify(line)
    }

    /// The current catalog.
    pub async fn catalog(&self) -> Result<Arc<Catalog>, ServiceError> {
        self.store.current().await.ok_or(ServiceError::NotInitialized)
    }

    /// All feed lines sorted into category buckets.
    pub async fn categorized_lines(&self) -> Result<CategorizedLines, ServiceError> {
        Ok(self.catalog().await?.lines.clone())
    }

    /// Best variant of a line, optionally matched against a live position.
    ///
    /// Lines that classify as neither tram nor bus are not served.
    pub async fn resolve(
        &self,
        line: &str,
        position: Option<Position>,
    ) -> Result<Resolution, ServiceError> {
        let catalog = self.catalog().await?;
        if !catalog.lines.contains(line) {
            return Ok(Resolution::LineNotFound);
        }
        Ok(self.cache.get_or_resolve(&catalog, line, position).await)
    }

    /// Every variant of a line, or `None` for an unknown or unclassified line.
    pub async fn list_variants(
        &self,
        line: &str,
    ) -> Result<Option<Arc<RouteVariantSet>>, ServiceError> {
        let catalog = self.catalog().await?;
        if !catalog.lines.contains(line) {
            return Ok(None);
        }
        Ok(catalog.index.get(line).cloned())
    }

    /// Every trip calling at a stop.
    pub async fn stop_schedule(
        &self,
        stop_id: &str,
    ) -> Result<Vec<StopScheduleEntry>, ServiceError> {
        let catalog = self.catalog().await?;
        catalog
            .snapshot
            .stop_schedule(stop_id)
            .ok_or_else(|| ServiceError::StopNotFound(stop_id.to_string()))
    }

    /// Reload the feed, then drop every cached resolution.
    ///
    /// The cache is only invalidated once the new catalog is published, so
    /// queries never mix a fresh cache with the old catalog.
    pub async fn refresh(&self) -> Result<RefreshOutcome, FeedError> {
        let outcome = self.store.refresh().await?;
        if let RefreshOutcome::Published(catalog) = &outcome {
            self.cache.invalidate_all();
            debug!(generation = catalog.generation, "resolution cache invalidated");
        }
        Ok(outcome)
    }

    pub async fn status(&self) -> FeedStatus {
        self.store.status().await
    }
}
