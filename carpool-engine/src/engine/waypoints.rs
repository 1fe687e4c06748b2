//! Adding and removing passengers.
//!
//! A passenger sharing the trip's hub end rides the whole hub-side portion,
//! so only their other end becomes a stop. Stops are shared by name between
//! passengers and are removed only when the last passenger needing one
//! leaves.

use std::collections::HashSet;

use tracing::{debug, info};

use crate::directions::RouteProvider;
use crate::domain::{
    Location, PassengerLeg, StatusEvent, Trip, TripId, User, UserId, Waypoint,
};
use crate::route::RouteQuery;
use crate::store::{Transaction, TripStore};

use super::config::HubSet;
use super::context::RequestContext;
use super::error::EngineError;
use super::locks::LockKey;
use super::{Engine, load_trip, load_user};

/// A passenger to seat on a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinRequest {
    pub passenger: UserId,
    pub start: Location,
    pub destination: Location,
}

/// Committed result of adding a passenger.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerAdded {
    pub trip: Trip,
    /// The passenger shares the trip's start or destination exactly.
    pub is_same_campus: bool,
}

/// Committed result of a passenger leaving.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerLeft {
    pub trip: Trip,
    pub available_seats: u8,
}

/// Seat a passenger on a trip and add the stop they need.
///
/// Operates on the trip in memory only.
pub fn insert_passenger(
    trip: &mut Trip,
    hubs: &HubSet,
    passenger: &User,
    start: &Location,
    destination: &Location,
) -> Result<(), EngineError> {
    if trip.leg_of(passenger.id).is_some() {
        return Err(EngineError::conflict("passenger already in the same trip"));
    }
    if trip.available_seats == 0 {
        return Err(EngineError::conflict("trip full"));
    }

    let (leg_start, leg_destination, stop) =
        if hubs.contains(&trip.start.name) && hubs.contains(&start.name) {
            (trip.start.name.clone(), destination.name.clone(), Some(destination))
        } else if hubs.contains(&trip.destination.name) && hubs.contains(&destination.name) {
            (start.name.clone(), trip.destination.name.clone(), Some(start))
        } else {
            (start.name.clone(), destination.name.clone(), None)
        };

    if let Some(stop) = stop {
        let is_endpoint = stop.name == trip.start.name || stop.name == trip.destination.name;
        let exists = trip.waypoint_names().any(|name| name == stop.name);
        if !is_endpoint && !exists {
            let key = trip.waypoints.next_key("waypoint");
            trip.waypoints.insert(
                key,
                Waypoint {
                    name: stop.name.clone(),
                    passenger: passenger.display_name.clone(),
                    lat: stop.lat,
                    lng: stop.lng,
                },
            );
        }
    }

    trip.available_seats -= 1;
    trip.passengers.insert(
        Trip::passenger_key(passenger.id),
        PassengerLeg {
            passenger_id: passenger.id,
            passenger_name: passenger.display_name.clone(),
            start: leg_start,
            destination: leg_destination,
        },
    );
    Ok(())
}

/// Remove a passenger and any stop no remaining passenger needs.
///
/// Operates on the trip in memory only.
pub fn remove_passenger(trip: &mut Trip, passenger: UserId) -> Result<PassengerLeg, EngineError> {
    let leg = trip
        .passengers
        .remove(&Trip::passenger_key(passenger))
        .ok_or_else(|| EngineError::validation("passenger is not on this trip"))?;

    let still_needed: HashSet<&str> = trip
        .passengers
        .values()
        .flat_map(|p| [p.start.as_str(), p.destination.as_str()])
        .collect();
    let orphaned: Vec<String> = trip
        .waypoints
        .iter()
        .filter(|(_, w)| leg.references(&w.name) && !still_needed.contains(w.name.as_str()))
        .map(|(key, _)| key.to_string())
        .collect();
    for key in orphaned {
        trip.waypoints.remove(&key);
    }

    trip.available_seats = (trip.available_seats + 1).min(trip.capacity);
    Ok(leg)
}

impl<P: RouteProvider> Engine<P> {
    /// Add a passenger to the caller's trip.
    ///
    /// Only the trip's driver may add passengers. The trip is re-routed
    /// through the passenger's stop before anything is committed.
    pub async fn add_passenger<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
        trip_id: TripId,
        join: &JoinRequest,
    ) -> Result<PassengerAdded, EngineError> {
        let _trip_guard = self.locks.acquire(LockKey::Trip(trip_id)).await;
        let _user_guard = self.locks.acquire(LockKey::User(join.passenger)).await;

        let mut trip = load_trip(ctx.store, trip_id).await?;
        if trip.driver != ctx.user {
            return Err(EngineError::validation(
                "only the driver can add passengers to a trip",
            ));
        }
        let passenger = load_user(ctx.store, join.passenger).await?;

        insert_passenger(
            &mut trip,
            &self.config.hubs,
            &passenger,
            &join.start,
            &join.destination,
        )?;
        let status = passenger
            .status
            .transition(StatusEvent::JoinTrip)
            .map_err(|_| EngineError::conflict("passenger already has an ongoing trip"))?;

        let plan = self.resolve(&RouteQuery::for_trip(&trip)).await?;
        plan.apply_to(&mut trip);

        let tx = Transaction::update(trip.clone()).with_status(passenger.id, status, Some(trip_id));
        ctx.store.commit(tx).await?;

        info!(
            trip = %trip_id,
            passenger = %passenger.id,
            seats = trip.available_seats,
            waypoints = trip.waypoints.len(),
            "passenger added"
        );

        let is_same_campus =
            trip.start.name == join.start.name || trip.destination.name == join.destination.name;
        Ok(PassengerAdded {
            trip,
            is_same_campus,
        })
    }

    /// Take the caller off the trip they are riding in.
    pub async fn leave_trip<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
    ) -> Result<PassengerLeft, EngineError> {
        let user = load_user(ctx.store, ctx.user).await?;
        let trip_id = user
            .current_trip
            .ok_or_else(|| EngineError::validation("user has no ongoing trip"))?;

        let _trip_guard = self.locks.acquire(LockKey::Trip(trip_id)).await;
        let _user_guard = self.locks.acquire(LockKey::User(ctx.user)).await;

        // Re-read under the lock: the trip may have closed meanwhile.
        let user = load_user(ctx.store, ctx.user).await?;
        if user.current_trip != Some(trip_id) {
            return Err(EngineError::conflict("user's trip changed, retry"));
        }
        let status = user
            .status
            .transition(StatusEvent::LeaveTrip)
            .map_err(|_| EngineError::validation("only passengers can leave a trip"))?;

        let mut trip = load_trip(ctx.store, trip_id).await?;
        let leg = remove_passenger(&mut trip, ctx.user)?;
        debug!(
            trip = %trip_id,
            start = %leg.start,
            destination = %leg.destination,
            "removed passenger leg"
        );

        let plan = self.resolve(&RouteQuery::for_trip(&trip)).await?;
        plan.apply_to(&mut trip);

        let tx = Transaction::update(trip.clone()).with_status(ctx.user, status, None);
        ctx.store.commit(tx).await?;

        info!(
            trip = %trip_id,
            passenger = %ctx.user,
            seats = trip.available_seats,
            "passenger left"
        );

        Ok(PassengerLeft {
            available_seats: trip.available_seats,
            trip,
        })
    }
}
