//! Caching layer for directions responses.
//!
//! Passenger searches preview every candidate trip, and several passengers
//! searching the same corridor produce identical provider requests. Caching
//! the response for a short TTL keyed by the exact request avoids paying
//! for the same route twice.
//!
//! Only previews go through the cache. Committing a trip mutation always
//! asks the provider directly via [`CachedRouteProvider::inner`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache as MokaCache;
use tracing::trace;

use crate::directions::{DirectionsError, DirectionsRequest, DirectionsResponse, RouteProvider};

/// Cached directions entry.
type RouteEntry = Arc<DirectionsResponse>;

/// Configuration for the cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// TTL for cached entries.
    pub ttl: Duration,

    /// Maximum number of cached entries.
    pub max_capacity: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(60),
            max_capacity: 1000,
        }
    }
}

/// Cache for directions responses.
pub struct RouteCache {
    routes: MokaCache<DirectionsRequest, RouteEntry>,
}

impl RouteCache {
    /// Create a new cache with the given configuration.
    pub fn new(config: &CacheConfig) -> Self {
        let routes = MokaCache::builder()
            .time_to_live(config.ttl)
            .max_capacity(config.max_capacity)
            .build();

        Self { routes }
    }

    /// Get a cached response.
    pub async fn get(&self, key: &DirectionsRequest) -> Option<RouteEntry> {
        self.routes.get(key).await
    }

    /// Insert a response into the cache.
    pub async fn insert(&self, key: DirectionsRequest, entry: RouteEntry) {
        self.routes.insert(key, entry).await;
    }
}

/// Route provider with caching.
///
/// Wraps another provider and caches successful responses. Failures are
/// never cached.
pub struct CachedRouteProvider<P> {
    inner: P,
    cache: RouteCache,
}

impl<P: RouteProvider> CachedRouteProvider<P> {
    /// Create a new cached provider.
    pub fn new(inner: P, cache_config: &CacheConfig) -> Self {
        Self {
            inner,
            cache: RouteCache::new(cache_config),
        }
    }

    /// Access the underlying provider for calls that bypass cache.
    pub fn inner(&self) -> &P {
        &self.inner
    }
}

impl<P: RouteProvider> RouteProvider for CachedRouteProvider<P> {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, DirectionsError> {
        if let Some(cached) = self.cache.get(request).await {
            trace!(route = %request, "directions cache hit");
            return Ok(cached.as_ref().clone());
        }

        let response = self.inner.directions(request).await?;
        self.cache
            .insert(request.clone(), Arc::new(response.clone()))
            .await;

        Ok(response)
    }
}
