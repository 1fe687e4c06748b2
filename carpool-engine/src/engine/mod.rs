//! Trip operations and passenger matching.
//!
//! Every mutating operation follows the same shape: lock the trip and the
//! users involved, load them, apply the change to a copy of the trip, route
//! the copy, and commit the copy together with any status changes. A
//! failure before the commit leaves the store untouched.
//!
//! Routing for mutations always asks the provider directly. Only search
//! previews go through the cache.

mod config;
mod context;
mod error;
mod locks;
mod matcher;
mod trips;
mod waypoints;

#[cfg(test)]
mod engine_tests;

pub use config::{EngineConfig, HubSet};
pub use context::RequestContext;
pub use error::EngineError;
pub use locks::{LockGuard, LockKey, LockTable};
pub use matcher::{SearchRequest, TripMatch, rank_matches};
pub use trips::{PassengerRoute, TripClosed, TripEnded, TripView};
pub use waypoints::{
    JoinRequest, PassengerAdded, PassengerLeft, insert_passenger, remove_passenger,
};

use crate::cache::CachedRouteProvider;
use crate::directions::RouteProvider;
use crate::domain::{Trip, TripId, User, UserId};
use crate::route::{RoutePlan, RouteQuery, Resolver};
use crate::store::TripStore;

/// The carpool engine.
pub struct Engine<P: RouteProvider> {
    provider: CachedRouteProvider<P>,
    config: EngineConfig,
    locks: LockTable,
}

impl<P: RouteProvider> Engine<P> {
    pub fn new(provider: P, config: EngineConfig) -> Self {
        let provider = CachedRouteProvider::new(provider, &config.preview_cache);
        Self {
            provider,
            config,
            locks: LockTable::new(),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn provider(&self) -> &CachedRouteProvider<P> {
        &self.provider
    }

    /// Route a trip for a commit, bypassing the preview cache.
    async fn resolve(&self, query: &RouteQuery) -> Result<RoutePlan, EngineError> {
        let resolver = Resolver::new(self.provider.inner(), self.config.route_timeout());
        Ok(resolver.resolve(query).await?)
    }

    /// Route a read-only preview through the cache.
    async fn preview(&self, query: &RouteQuery) -> Result<RoutePlan, EngineError> {
        let resolver = Resolver::new(&self.provider, self.config.route_timeout());
        Ok(resolver.resolve(query).await?)
    }
}

async fn load_trip<S: TripStore>(store: &S, id: TripId) -> Result<Trip, EngineError> {
    store
        .trip(id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("trip {id} not found")))
}

async fn load_user<S: TripStore>(store: &S, id: UserId) -> Result<User, EngineError> {
    store
        .user(id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("user {id} not found")))
}
