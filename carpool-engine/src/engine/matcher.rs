//! Finding trips a passenger could join.
//!
//! Candidates are trips anchored at a campus on the side the passenger
//! asked for. Each candidate is previewed with the passenger's other end
//! as an extra stop, so results are ranked by when the trip would really
//! arrive with them on board.

use futures::future::join_all;
use tracing::{debug, warn};

use crate::directions::RouteProvider;
use crate::domain::{Trip, UserStatus};
use crate::route::{RoutePlan, RouteQuery};
use crate::store::{TripQuery, TripStore};

use super::context::RequestContext;
use super::error::EngineError;
use super::{Engine, load_user};

/// What a passenger is looking for.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchRequest {
    pub start: String,
    pub destination: String,
    /// Heading to a campus rather than leaving one.
    pub toward_hub: bool,
}

impl SearchRequest {
    pub fn new(start: impl Into<String>, destination: impl Into<String>, toward_hub: bool) -> Self {
        Self {
            start: start.into(),
            destination: destination.into(),
            toward_hub,
        }
    }

    /// The end of the journey that must be a campus.
    pub fn hub_end(&self) -> &str {
        if self.toward_hub {
            &self.destination
        } else {
            &self.start
        }
    }

    /// The end the trip would detour to.
    pub fn other_end(&self) -> &str {
        if self.toward_hub {
            &self.start
        } else {
            &self.destination
        }
    }
}

/// A trip the passenger could join.
#[derive(Debug, Clone, PartialEq)]
pub struct TripMatch {
    pub trip: Trip,
    /// The trip's route with the passenger's stop added.
    pub preview: RoutePlan,
    /// The trip's campus end is exactly the one requested.
    pub same_campus: bool,
    pub driver_name: String,
}

/// Order matches by previewed arrival, keeping input order for ties.
pub fn rank_matches(mut matches: Vec<TripMatch>) -> Vec<TripMatch> {
    matches.sort_by_key(|m| m.preview.eta);
    matches
}

impl<P: RouteProvider> Engine<P> {
    /// Search open trips for the caller.
    ///
    /// A candidate whose preview cannot be routed is left out of the
    /// results rather than failing the search.
    pub async fn search_trips<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
        request: &SearchRequest,
    ) -> Result<Vec<TripMatch>, EngineError> {
        let user = load_user(ctx.store, ctx.user).await?;
        if user.status != UserStatus::Available {
            return Err(EngineError::conflict("user already has an ongoing trip"));
        }

        let hubs = &self.config.hubs;
        if !hubs.contains(request.hub_end()) {
            return Err(EngineError::validation(format!(
                "{} is not a campus",
                request.hub_end()
            )));
        }

        let active = ctx.store.active_trip_ids().await?;
        let query = if request.toward_hub {
            TripQuery::new().with_ids(active).ending_at_any(hubs.names())
        } else {
            TripQuery::new().with_ids(active).starting_at_any(hubs.names())
        };

        let candidates: Vec<Trip> = ctx
            .store
            .find_trips(&query)
            .await?
            .into_iter()
            .filter(|t| t.available_seats > 0 && t.driver != ctx.user)
            .collect();
        debug!(
            user = %ctx.user,
            toward_hub = request.toward_hub,
            candidates = candidates.len(),
            "previewing candidate trips"
        );

        let mut matches = Vec::with_capacity(candidates.len());
        for batch in candidates.chunks(self.config.max_concurrent_previews.max(1)) {
            let previews = join_all(
                batch
                    .iter()
                    .map(|trip| self.preview_match(ctx.store, trip, request)),
            )
            .await;
            matches.extend(previews.into_iter().flatten());
        }

        Ok(rank_matches(matches))
    }

    async fn preview_match<S: TripStore>(
        &self,
        store: &S,
        trip: &Trip,
        request: &SearchRequest,
    ) -> Option<TripMatch> {
        let query = RouteQuery::for_trip(trip).with_extra_stop(request.other_end());
        let preview = match self.preview(&query).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(trip = %trip.id, error = %e, "dropping candidate with no route");
                return None;
            }
        };

        let driver_name = match store.user(trip.driver).await {
            Ok(Some(driver)) => driver.display_name,
            Ok(None) => String::new(),
            Err(e) => {
                warn!(trip = %trip.id, error = %e, "could not load driver");
                String::new()
            }
        };

        let same_campus = if request.toward_hub {
            trip.destination.name == request.destination
        } else {
            trip.start.name == request.start
        };

        Some(TripMatch {
            trip: trip.clone(),
            preview,
            same_campus,
            driver_name,
        })
    }
}
