//! Caching layer for variant resolution.
//!
//! Resolving a line against a live position scans every shape point of every
//! variant. Clients poll the same vehicles repeatedly, so answers are cached
//! by line and position rounded to four decimal places (about 11 m).
//!
//! The catalog generation is part of the key: an entry computed against a
//! superseded catalog can never answer a query for the current one, even
//! before `invalidate_all` has finished sweeping.

use std::sync::Arc;

use moka::future::Cache as MokaCache;
use tracing::debug;

use crate::catalog::Catalog;
use crate::domain::{Position, QuantizedPosition};
use crate::index::{self, Resolution, Variant};

/// Cache key: (catalog generation, line, quantized position).
type ResolutionKey = (u64, String, Option<QuantizedPosition>);

/// Configuration for the cache.
#[derive(Debug, Clone, Default)]
pub struct CacheConfig {
    /// Maximum number of cached entries; unbounded when `None`.
    pub max_capacity: Option<u64>,
}

/// Cache of successful resolutions.
pub struct ResolutionCache {
    entries: MokaCache<ResolutionKey, Arc<Variant>>,
}

impl ResolutionCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let mut builder = MokaCache::builder();
        if let Some(max) = config.max_capacity {
            builder = builder.max_capacity(max);
        }

        Self {
            entries: builder.build(),
        }
    }

    /// Resolve `line` against `catalog`, using a cached answer if present.
    ///
    /// Only [`Resolution::Found`] is cached.
    pub async fn get_or_resolve(
        &self,
        catalog: &Catalog,
        line: &str,
        position: Option<Position>,
    ) -> Resolution {
        let key = (
            catalog.generation,
            line.to_string(),
            position.map(|p| p.quantize()),
        );

        if let Some(variant) = self.entries.get(&key).await {
            debug!(line, generation = catalog.generation, "resolution cache hit");
            return Resolution::Found(variant);
        }

        let resolution = resolve_uncached(catalog, line, position);
        if let Resolution::Found(variant) = &resolution {
            self.entries.insert(key, variant.clone()).await;
        }
        resolution
    }

    /// Get cache statistics (for monitoring).
    pub fn entry_count(&self) -> u64 {
        self.entries.entry_count()
    }

    /// Invalidate all cached entries.
    pub fn invalidate_all(&self) {
        self.entries.invalidate_all();
    }

    /// Flush pending maintenance so counts are exact (for tests).
    #[cfg(test)]
    pub(crate) async fn sync(&self) {
        self.entries.run_pending_tasks().await;
    }
}

/// Resolve without touching any cache.
pub fn resolve_uncached(catalog: &Catalog, line: &str, position: Option<Position>) -> Resolution {
    let Some(set) = catalog.index.get(line) else {
        return Resolution::LineNotFound;
    };

    match index::resolve(set, position) {
        Some(variant) => Resolution::Found(variant.clone()),
        None => Resolution::NoGeometry,
    }
}
