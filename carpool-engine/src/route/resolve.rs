//! Route resolution.
//!
//! Turns a trip's stops into an ordered, canonically-labelled list of legs
//! with totals and ETA, using one optimized provider request.

use std::collections::HashSet;
use std::time::Duration;

use chrono::{NaiveDateTime, TimeDelta};
use tracing::{debug, warn};

use crate::directions::{DirectionsError, DirectionsRequest, DirectionsResponse, RouteProvider};
use crate::domain::{RouteLeg, Trip};

use super::units::{UnitsError, format_distance, format_duration, leg_distance_km};

/// Why a route could not be produced.
#[derive(Debug, thiserror::Error)]
pub enum ResolveError {
    /// The provider call failed
    #[error("routing provider failed: {0}")]
    Provider(#[from] DirectionsError),

    /// The provider did not answer within the bound
    #[error("routing provider timed out after {0:?}")]
    Timeout(Duration),

    /// The provider answered with something we cannot reconcile
    #[error("malformed directions response: {0}")]
    Malformed(String),
}

impl From<UnitsError> for ResolveError {
    fn from(e: UnitsError) -> Self {
        ResolveError::Malformed(e.to_string())
    }
}

/// The stops to route through and when the trip leaves.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteQuery {
    pub start: String,
    pub destination: String,
    /// Committed waypoints, in stored order.
    pub waypoints: Vec<String>,
    /// A stop routed through for a preview only, appended after the
    /// waypoints.
    pub extra_stop: Option<String>,
    pub departure: NaiveDateTime,
}

impl RouteQuery {
    /// Query for a trip's current stops.
    pub fn for_trip(trip: &Trip) -> Self {
        Self {
            start: trip.start.name.clone(),
            destination: trip.destination.name.clone(),
            waypoints: trip.waypoint_names().map(str::to_string).collect(),
            extra_stop: None,
            departure: trip.time_of_departure,
        }
    }

    /// Add a preview-only stop.
    pub fn with_extra_stop(mut self, stop: impl Into<String>) -> Self {
        self.extra_stop = Some(stop.into());
        self
    }

    /// Canonical stop names by submission index.
    pub fn stops(&self) -> Vec<&str> {
        self.waypoints
            .iter()
            .map(String::as_str)
            .chain(self.extra_stop.as_deref())
            .collect()
    }

    /// The provider request for this query.
    pub fn to_request(&self) -> DirectionsRequest {
        DirectionsRequest::new(
            self.start.clone(),
            self.destination.clone(),
            self.stops().into_iter().map(str::to_string).collect(),
        )
    }
}

/// A resolved route with totals.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutePlan {
    pub legs: Vec<RouteLeg>,
    pub total_duration_secs: u64,
    pub total_distance_km: f64,
    /// Display text for the total distance.
    pub distance: String,
    /// Display text for the total duration.
    pub duration: String,
    pub eta: NaiveDateTime,
}

impl RoutePlan {
    /// Overwrite a trip's route, totals and ETA with this plan.
    pub fn apply_to(self, trip: &mut Trip) {
        trip.route = self.legs;
        trip.distance = self.distance;
        trip.duration = self.duration;
        trip.eta = self.eta;
    }
}

/// Resolves routes through a provider with a bounded wait.
pub struct Resolver<'a, P: RouteProvider> {
    provider: &'a P,
    timeout: Duration,
}

impl<'a, P: RouteProvider> Resolver<'a, P> {
    pub fn new(provider: &'a P, timeout: Duration) -> Self {
        Self { provider, timeout }
    }

    /// Ask the provider for the query's route and reconcile the answer.
    ///
    /// Never retries: a timeout is reported like any other provider failure.
    pub async fn resolve(&self, query: &RouteQuery) -> Result<RoutePlan, ResolveError> {
        let request = query.to_request();

        let response = tokio::time::timeout(self.timeout, self.provider.directions(&request))
            .await
            .map_err(|_| ResolveError::Timeout(self.timeout))?
            .inspect_err(|e| warn!(route = %request, error = %e, "directions failed"))?;

        let plan = reconcile(query, &response)?;
        debug!(
            route = %request,
            legs = plan.legs.len(),
            secs = plan.total_duration_secs,
            "route resolved"
        );
        Ok(plan)
    }
}

/// Reconcile a provider response against the submitted query.
///
/// Leg endpoints are relabelled with the submitted names: the provider's
/// geocoded addresses are display-only and never match what trips and
/// passenger legs store.
pub fn reconcile(
    query: &RouteQuery,
    response: &DirectionsResponse,
) -> Result<RoutePlan, ResolveError> {
    let stops = query.stops();

    let route = response
        .routes
        .first()
        .ok_or_else(|| ResolveError::Malformed("no routes in response".to_string()))?;

    if route.legs.len() != stops.len() + 1 {
        return Err(ResolveError::Malformed(format!(
            "expected {} legs for {} stops, got {}",
            stops.len() + 1,
            stops.len(),
            route.legs.len()
        )));
    }

    let order = visiting_order(&route.waypoint_order, stops.len())?;

    let mut legs = Vec::with_capacity(route.legs.len());
    let mut clock = query.departure;
    let mut total_secs: u64 = 0;
    let mut total_km = 0.0;

    for leg in &route.legs {
        let secs = leg.duration.value;
        let step = i64::try_from(secs)
            .ok()
            .and_then(TimeDelta::try_seconds)
            .ok_or_else(|| ResolveError::Malformed(format!("leg duration {secs}s")))?;
        let arrival = clock
            .checked_add_signed(step)
            .ok_or_else(|| ResolveError::Malformed("arrival time overflow".to_string()))?;

        total_km += leg_distance_km(&leg.distance.text)?;
        total_secs += secs;

        legs.push(RouteLeg {
            start: leg.start_address.clone(),
            destination: leg.end_address.clone(),
            distance: leg.distance.text.clone(),
            duration: leg.duration.text.clone(),
            duration_secs: secs,
            departure_time: clock,
            arrival_time: arrival,
        });
        clock = arrival;
    }

    // Relabel every boundary with the canonical names.
    legs[0].start = query.start.clone();
    for (i, &idx) in order.iter().enumerate() {
        legs[i].destination = stops[idx].to_string();
        legs[i + 1].start = stops[idx].to_string();
    }
    if let Some(last) = legs.last_mut() {
        last.destination = query.destination.clone();
    }

    Ok(RoutePlan {
        legs,
        total_duration_secs: total_secs,
        total_distance_km: total_km,
        distance: format_distance(total_km),
        duration: format_duration(total_secs),
        eta: clock,
    })
}

/// Validate the provider's visiting order as a permutation of `0..n`.
fn visiting_order(order: &[usize], n: usize) -> Result<Vec<usize>, ResolveError> {
    // With no stops the provider may omit the order entirely.
    if n == 0 && order.is_empty() {
        return Ok(Vec::new());
    }

    let distinct: HashSet<usize> = order.iter().copied().collect();
    if order.len() != n || distinct.len() != n || order.iter().any(|&i| i >= n) {
        return Err(ResolveError::Malformed(format!(
            "waypoint order {order:?} is not a permutation of {n} stops"
        )));
    }

    Ok(order.to_vec())
}
