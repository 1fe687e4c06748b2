//! Creating, closing and viewing trips.

use chrono::NaiveDateTime;
use tracing::{info, warn};

use crate::directions::RouteProvider;
use crate::domain::{NewTrip, PassengerLeg, StatusEvent, Trip, TripId, UserId, UserStatus};
use crate::route::RouteQuery;
use crate::store::{Transaction, TripStore};

use super::config::HubSet;
use super::context::RequestContext;
use super::error::EngineError;
use super::locks::LockKey;
use super::{Engine, load_trip, load_user};

/// Result of a driver removing their trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripClosed {
    pub trip_id: TripId,
    /// Everyone who was on the trip, driver included.
    pub uids: Vec<UserId>,
}

/// Result of ending a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct TripEnded {
    pub trip_id: TripId,
    pub uids: Vec<UserId>,
    /// The caller was the trip's driver.
    pub driver_authorized: bool,
}

/// A passenger's own pick-up and drop-off within a shared trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerRoute {
    pub start: String,
    pub departure_time: NaiveDateTime,
    pub destination: String,
    pub arrival_time: NaiveDateTime,
}

/// A user's current trip as they see it.
#[derive(Debug, Clone, PartialEq)]
pub struct TripView {
    pub trip: Trip,
    pub status: UserStatus,
    /// Present when the viewer rides in the trip.
    pub passenger_route: Option<PassengerRoute>,
}

impl PassengerRoute {
    /// Work out when a passenger is picked up and dropped off.
    ///
    /// On a trip leaving a hub the passenger boards at the start and gets
    /// off at the end of the leg reaching their destination. Otherwise they
    /// board at the leg leaving their start and ride to the end. A leg that
    /// cannot be found falls back to the trip's own times.
    pub fn for_leg(trip: &Trip, hubs: &HubSet, leg: &PassengerLeg) -> Self {
        if hubs.contains(&trip.start.name) {
            let arrival_time = trip
                .route
                .iter()
                .find(|r| r.destination == leg.destination)
                .map_or(trip.eta, |r| r.arrival_time);
            Self {
                start: trip.start.name.clone(),
                departure_time: trip.time_of_departure,
                destination: leg.destination.clone(),
                arrival_time,
            }
        } else {
            let departure_time = trip
                .route
                .iter()
                .find(|r| r.start == leg.start)
                .map_or(trip.time_of_departure, |r| r.departure_time);
            Self {
                start: leg.start.clone(),
                departure_time,
                destination: trip.destination.name.clone(),
                arrival_time: trip.eta,
            }
        }
    }
}

impl<P: RouteProvider> Engine<P> {
    /// Offer a new trip driven by the caller.
    pub async fn create_trip<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
        offer: NewTrip,
    ) -> Result<Trip, EngineError> {
        let seats = offer.seats()?;

        let _user_guard = self.locks.acquire(LockKey::User(ctx.user)).await;
        let driver = load_user(ctx.store, ctx.user).await?;
        let status = driver
            .status
            .transition(StatusEvent::StartDriving)
            .map_err(|_| EngineError::conflict("user already has an ongoing trip"))?;

        let id = ctx.store.allocate_trip_id().await?;
        let mut trip = Trip::new(id, ctx.user, offer, seats);

        let plan = self.resolve(&RouteQuery::for_trip(&trip)).await?;
        plan.apply_to(&mut trip);

        let tx = Transaction::insert(trip.clone()).with_status(ctx.user, status, Some(id));
        ctx.store.commit(tx).await?;

        info!(
            trip = %id,
            driver = %ctx.user,
            seats,
            eta = %trip.eta,
            "trip created"
        );
        Ok(trip)
    }

    /// Remove the trip the caller is driving.
    pub async fn remove_trip<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
    ) -> Result<TripClosed, EngineError> {
        let user = load_user(ctx.store, ctx.user).await?;
        let trip_id = user
            .current_trip
            .ok_or_else(|| EngineError::validation("user has no ongoing trip"))?;

        let _trip_guard = self.locks.acquire(LockKey::Trip(trip_id)).await;
        let trip = load_trip(ctx.store, trip_id).await?;
        if trip.driver != ctx.user {
            return Err(EngineError::validation("only the driver can remove a trip"));
        }

        let uids = self.close(ctx.store, &trip).await?;

        info!(trip = %trip_id, members = uids.len(), "trip removed");
        Ok(TripClosed { trip_id, uids })
    }

    /// End a trip and free everyone on it.
    pub async fn end_trip<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
        trip_id: TripId,
    ) -> Result<TripEnded, EngineError> {
        let _trip_guard = self.locks.acquire(LockKey::Trip(trip_id)).await;
        let trip = load_trip(ctx.store, trip_id).await?;
        let driver_authorized = trip.driver == ctx.user;

        let uids = self.close(ctx.store, &trip).await?;

        info!(trip = %trip_id, driver_authorized, "trip ended");
        Ok(TripEnded {
            trip_id,
            uids,
            driver_authorized,
        })
    }

    /// The caller's current trip, with their own itinerary if they ride in it.
    pub async fn current_trip<S: TripStore>(
        &self,
        ctx: &RequestContext<'_, S>,
    ) -> Result<TripView, EngineError> {
        let user = load_user(ctx.store, ctx.user).await?;
        let trip_id = user
            .current_trip
            .ok_or_else(|| EngineError::validation("user has no ongoing trip"))?;
        let trip = load_trip(ctx.store, trip_id).await?;

        let passenger_route = if trip.driver == ctx.user {
            None
        } else {
            trip.leg_of(ctx.user)
                .map(|leg| PassengerRoute::for_leg(&trip, &self.config.hubs, leg))
        };

        Ok(TripView {
            trip,
            status: user.status,
            passenger_route,
        })
    }

    /// Delete a trip and free its members. The trip lock must be held.
    async fn close<S: TripStore>(&self, store: &S, trip: &Trip) -> Result<Vec<UserId>, EngineError> {
        let members = store.trip_members(trip.id).await?;
        let _user_guards = self.locks.acquire_users(&members).await;

        let mut tx = Transaction::delete(trip.id);
        for &id in &members {
            let Some(user) = store.user(id).await? else {
                continue;
            };
            let status = user
                .status
                .transition(StatusEvent::TripClosed)
                .unwrap_or_else(|e| {
                    warn!(user = %id, trip = %trip.id, error = %e, "member had no busy status");
                    UserStatus::Available
                });
            tx = tx.with_status(id, status, None);
        }
        store.commit(tx).await?;
        Ok(members)
    }
}
