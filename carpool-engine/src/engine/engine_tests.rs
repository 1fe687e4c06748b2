//! Tests for trip operations against the in-memory store.

use super::*;
use crate::directions::{
    DirectionsError, DirectionsLeg, DirectionsRequest, DirectionsResponse, DirectionsRoute,
    TextValue,
};
use crate::domain::{Location, NewTrip, UserStatus};
use crate::store::MemoryStore;
use chrono::{NaiveDate, NaiveDateTime, TimeDelta};
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

const HUB: &str = "Hub";
const LEG_SECS: u64 = 600;

/// Provider that routes stops in submitted order, ten minutes per leg.
#[derive(Default)]
struct StubProvider {
    calls: AtomicUsize,
    fail: AtomicBool,
    /// Requests mentioning this stop fail.
    unroutable: Mutex<Option<String>>,
    delay: Option<Duration>,
}

impl StubProvider {
    fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn set_failing(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    fn set_unroutable(&self, stop: &str) {
        *self.unroutable.lock().unwrap() = Some(stop.to_string());
    }

    fn rejects(&self, request: &DirectionsRequest) -> bool {
        if self.fail.load(Ordering::SeqCst) {
            return true;
        }
        let unroutable = self.unroutable.lock().unwrap();
        unroutable.as_deref().is_some_and(|bad| {
            request.origin == bad
                || request.destination == bad
                || request.waypoints.iter().any(|w| w == bad)
        })
    }
}

impl RouteProvider for StubProvider {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, DirectionsError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.rejects(request) {
            return Err(DirectionsError::Status {
                status: "ZERO_RESULTS".to_string(),
                message: "no route".to_string(),
            });
        }

        let stops: Vec<&str> = std::iter::once(request.origin.as_str())
            .chain(request.waypoints.iter().map(String::as_str))
            .chain(std::iter::once(request.destination.as_str()))
            .collect();
        let legs = stops
            .windows(2)
            .map(|pair| DirectionsLeg {
                distance: TextValue {
                    text: "5.0 km".to_string(),
                    value: 5000,
                },
                duration: TextValue {
                    text: "10 mins".to_string(),
                    value: LEG_SECS,
                },
                start_address: format!("{}, Ireland", pair[0]),
                end_address: format!("{}, Ireland", pair[1]),
            })
            .collect();

        Ok(DirectionsResponse {
            status: Some("OK".to_string()),
            error_message: None,
            routes: vec![DirectionsRoute {
                waypoint_order: (0..request.waypoints.len()).collect(),
                legs,
            }],
        })
    }
}

const DRIVER: UserId = UserId(1);
const OTHER_DRIVER: UserId = UserId(2);
const ANN: UserId = UserId(10);
const BOB: UserId = UserId(11);
const CAT: UserId = UserId(12);

fn departure(hour: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, 15)
        .unwrap()
        .and_hms_opt(hour, 0, 0)
        .unwrap()
}

fn loc(name: &str) -> Location {
    Location::new(name, 53.4, -6.2)
}

fn offer(start: &str, destination: &str, seats: i32, hour: u32) -> NewTrip {
    NewTrip {
        start: loc(start),
        destination: loc(destination),
        time_of_departure: departure(hour),
        available_seats: seats,
    }
}

fn join(passenger: UserId, start: &str, destination: &str) -> JoinRequest {
    JoinRequest {
        passenger,
        start: loc(start),
        destination: loc(destination),
    }
}

fn engine(provider: StubProvider) -> Engine<StubProvider> {
    let config = EngineConfig::new()
        .with_hubs(HubSet::new([HUB, "North Hub"]))
        .with_route_timeout_secs(1);
    Engine::new(provider, config)
}

async fn store() -> MemoryStore {
    let store = MemoryStore::new();
    for (id, name) in [
        (DRIVER, "Dee R."),
        (OTHER_DRIVER, "Eve S."),
        (ANN, "Ann B."),
        (BOB, "Bob C."),
        (CAT, "Cat D."),
    ] {
        store.add_user(User::new(id, name)).await;
    }
    store
}

async fn status_of(store: &MemoryStore, id: UserId) -> (UserStatus, Option<TripId>) {
    let user = store.user(id).await.unwrap().unwrap();
    (user.status, user.current_trip)
}

#[tokio::test]
async fn create_trip_routes_and_marks_driver_busy() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let ctx = RequestContext::new(DRIVER, &store);

    let trip = engine
        .create_trip(&ctx, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    assert_eq!(trip.route.len(), 1);
    assert_eq!(trip.route[0].start, HUB);
    assert_eq!(trip.route[0].destination, "Swords");
    assert_eq!(trip.eta, departure(8) + TimeDelta::seconds(LEG_SECS as i64));
    assert_eq!(trip.distance, "5 km");
    assert_eq!(trip.capacity, 3);
    assert_eq!(
        status_of(&store, DRIVER).await,
        (UserStatus::DriverBusy, Some(trip.id))
    );
    assert_eq!(store.trip(trip.id).await.unwrap(), Some(trip));
}

#[tokio::test]
async fn second_trip_for_busy_driver_conflicts() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let ctx = RequestContext::new(DRIVER, &store);

    engine
        .create_trip(&ctx, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    let second = engine.create_trip(&ctx, offer(HUB, "Howth", 2, 9)).await;

    assert!(matches!(second, Err(EngineError::Conflict(_))));
    assert_eq!(store.trip_count().await, 1);
}

#[tokio::test]
async fn out_of_range_seats_are_rejected_before_routing() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let ctx = RequestContext::new(DRIVER, &store);

    for seats in [-1, 6] {
        let result = engine.create_trip(&ctx, offer(HUB, "Swords", seats, 8)).await;
        assert!(matches!(result, Err(EngineError::Validation(_))));
    }
    assert_eq!(engine.provider().inner().calls(), 0);
    assert_eq!(status_of(&store, DRIVER).await, (UserStatus::Available, None));
}

#[tokio::test]
async fn unroutable_trip_is_not_created() {
    let engine = engine(StubProvider::default());
    engine.provider().inner().set_failing(true);
    let store = store().await;
    let ctx = RequestContext::new(DRIVER, &store);

    let result = engine.create_trip(&ctx, offer(HUB, "Swords", 3, 8)).await;

    assert!(matches!(result, Err(EngineError::RouteUnavailable(_))));
    assert_eq!(store.trip_count().await, 0);
    assert_eq!(status_of(&store, DRIVER).await, (UserStatus::Available, None));
}

#[tokio::test]
async fn drop_off_en_route_adds_one_waypoint() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    let added = engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();
    let trip = added.trip;

    assert!(added.is_same_campus);
    assert_eq!(trip.available_seats, 2);
    assert_eq!(trip.passengers.len(), 1);
    let stops: Vec<&str> = trip.waypoint_names().collect();
    assert_eq!(stops, vec!["Santry"]);

    let labels: Vec<(&str, &str)> = trip
        .route
        .iter()
        .map(|l| (l.start.as_str(), l.destination.as_str()))
        .collect();
    assert_eq!(labels, vec![(HUB, "Santry"), ("Santry", "Swords")]);

    let total: u64 = trip.route.iter().map(|l| l.duration_secs).sum();
    assert_eq!(trip.eta, trip.time_of_departure + TimeDelta::seconds(total as i64));
    assert_eq!(trip.duration, "0 hours, 20 min, 00 sec");
    assert!(trip.seats_balance());

    assert_eq!(
        status_of(&store, ANN).await,
        (UserStatus::PassengerBusy, Some(trip.id))
    );
    assert_eq!(store.trip(trip.id).await.unwrap(), Some(trip));
}

#[tokio::test]
async fn provider_failure_leaves_trip_untouched() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    engine.provider().inner().set_failing(true);
    let result = engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await;

    assert!(matches!(result, Err(EngineError::RouteUnavailable(_))));
    assert_eq!(store.trip(trip.id).await.unwrap(), Some(trip));
    assert_eq!(status_of(&store, ANN).await, (UserStatus::Available, None));
}

#[tokio::test]
async fn concurrent_adds_for_last_seat_admit_one() {
    let engine = engine(StubProvider::with_delay(Duration::from_millis(20)));
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 1, 8))
        .await
        .unwrap();

    let ann = join(ANN, HUB, "Santry");
    let bob = join(BOB, HUB, "Airport");
    let (a, b) = tokio::join!(
        engine.add_passenger(&driver, trip.id, &ann),
        engine.add_passenger(&driver, trip.id, &bob),
    );

    let (ok, err) = match (a, b) {
        (Ok(ok), Err(err)) | (Err(err), Ok(ok)) => (ok, err),
        (a, b) => panic!("expected exactly one success, got {a:?} and {b:?}"),
    };
    assert!(matches!(err, EngineError::Conflict(ref m) if m == "trip full"));
    assert_eq!(ok.trip.available_seats, 0);
    assert_eq!(ok.trip.passengers.len(), 1);

    let stored = store.trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.passengers.len(), 1);
    assert!(stored.seats_balance());
}

#[tokio::test]
async fn join_and_remove_serialize() {
    for remove_first in [false, true] {
        let engine = engine(StubProvider::with_delay(Duration::from_millis(20)));
        let store = store().await;
        let driver = RequestContext::new(DRIVER, &store);
        let trip = engine
            .create_trip(&driver, offer(HUB, "Swords", 1, 8))
            .await
            .unwrap();

        let ann = join(ANN, HUB, "Santry");
        let (added, removed) = if remove_first {
            let (removed, added) = tokio::join!(
                engine.remove_trip(&driver),
                engine.add_passenger(&driver, trip.id, &ann),
            );
            (added, removed)
        } else {
            tokio::join!(
                engine.add_passenger(&driver, trip.id, &ann),
                engine.remove_trip(&driver),
            )
        };

        let removed = removed.unwrap();
        match added {
            Ok(added) => {
                assert_eq!(added.trip.available_seats, 0);
                assert_eq!(removed.uids, vec![DRIVER, ANN]);
            }
            Err(err) => {
                assert!(matches!(err, EngineError::NotFound(_)), "{err:?}");
                assert_eq!(removed.uids, vec![DRIVER]);
            }
        }
        assert_eq!(store.trip_count().await, 0);
        for id in [DRIVER, ANN] {
            assert_eq!(status_of(&store, id).await, (UserStatus::Available, None));
        }
        assert!(engine.locks.is_empty());
    }
}

#[tokio::test]
async fn join_after_trip_ended_is_not_found() {
    let engine = engine(StubProvider::with_delay(Duration::from_millis(20)));
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 2, 8))
        .await
        .unwrap();

    let ann = join(ANN, HUB, "Santry");
    let (ended, added) = tokio::join!(
        engine.end_trip(&driver, trip.id),
        engine.add_passenger(&driver, trip.id, &ann),
    );

    assert_eq!(ended.unwrap().uids, vec![DRIVER]);
    assert!(matches!(added, Err(EngineError::NotFound(_))));
    assert_eq!(store.trip_count().await, 0);
    assert_eq!(status_of(&store, ANN).await, (UserStatus::Available, None));
}

#[tokio::test]
async fn lock_entries_do_not_outlive_operations() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);

    for id in 100..150 {
        let missing = engine
            .add_passenger(&driver, TripId(id), &join(ANN, HUB, "Santry"))
            .await;
        assert!(matches!(missing, Err(EngineError::NotFound(_))));
    }
    assert!(engine.locks.is_empty());

    engine.provider().inner().set_failing(true);
    let unroutable = engine.create_trip(&driver, offer(HUB, "Swords", 3, 8)).await;
    assert!(unroutable.is_err());
    assert!(engine.locks.is_empty());

    engine.provider().inner().set_failing(false);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();
    engine
        .leave_trip(&RequestContext::new(ANN, &store))
        .await
        .unwrap();
    assert!(engine.locks.is_empty());

    engine.remove_trip(&driver).await.unwrap();
    assert!(engine.locks.is_empty());
}

#[tokio::test]
async fn same_passenger_twice_conflicts() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();
    let again = engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Airport"))
        .await;

    assert!(
        matches!(again, Err(EngineError::Conflict(ref m)) if m == "passenger already in the same trip")
    );
}

#[tokio::test]
async fn busy_passenger_cannot_join_another_trip() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let first = RequestContext::new(DRIVER, &store);
    let second = RequestContext::new(OTHER_DRIVER, &store);
    let a = engine
        .create_trip(&first, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    let b = engine
        .create_trip(&second, offer(HUB, "Howth", 3, 8))
        .await
        .unwrap();

    engine
        .add_passenger(&first, a.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();
    let result = engine
        .add_passenger(&second, b.id, &join(ANN, HUB, "Sutton"))
        .await;

    assert!(matches!(result, Err(EngineError::Conflict(_))));
}

#[tokio::test]
async fn only_driver_adds_passengers() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    let stranger = RequestContext::new(BOB, &store);
    let result = engine
        .add_passenger(&stranger, trip.id, &join(ANN, HUB, "Santry"))
        .await;
    assert!(matches!(result, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn adding_to_missing_trip_is_not_found() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);

    let result = engine
        .add_passenger(&driver, TripId(99), &join(ANN, HUB, "Santry"))
        .await;
    assert!(matches!(result, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn add_then_leave_restores_trip() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let before = engine
        .create_trip(&driver, offer("Swords", HUB, 3, 8))
        .await
        .unwrap();

    engine
        .add_passenger(&driver, before.id, &join(ANN, "Santry", HUB))
        .await
        .unwrap();
    let left = engine
        .leave_trip(&RequestContext::new(ANN, &store))
        .await
        .unwrap();

    assert_eq!(left.available_seats, 3);
    assert_eq!(left.trip, before);
    assert_eq!(store.trip(before.id).await.unwrap(), Some(before));
    assert_eq!(status_of(&store, ANN).await, (UserStatus::Available, None));
}

#[tokio::test]
async fn shared_waypoint_outlives_first_leaver() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    for rider in [ANN, BOB] {
        engine
            .add_passenger(&driver, trip.id, &join(rider, HUB, "Santry"))
            .await
            .unwrap();
    }
    let stored = store.trip(trip.id).await.unwrap().unwrap();
    assert_eq!(stored.waypoints.len(), 1);

    let after_ann = engine
        .leave_trip(&RequestContext::new(ANN, &store))
        .await
        .unwrap();
    let stops: Vec<&str> = after_ann.trip.waypoint_names().collect();
    assert_eq!(stops, vec!["Santry"]);

    let after_bob = engine
        .leave_trip(&RequestContext::new(BOB, &store))
        .await
        .unwrap();
    assert!(after_bob.trip.waypoints.is_empty());
    assert_eq!(after_bob.available_seats, 3);
}

#[tokio::test]
async fn failed_leave_keeps_passenger_seated() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();
    let seated = store.trip(trip.id).await.unwrap();

    engine.provider().inner().set_failing(true);
    let result = engine.leave_trip(&RequestContext::new(ANN, &store)).await;

    assert!(matches!(result, Err(EngineError::RouteUnavailable(_))));
    assert_eq!(store.trip(trip.id).await.unwrap(), seated);
    assert_eq!(
        status_of(&store, ANN).await,
        (UserStatus::PassengerBusy, Some(trip.id))
    );
}

#[tokio::test]
async fn leaving_requires_a_ride() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    let idle = engine.leave_trip(&RequestContext::new(CAT, &store)).await;
    assert!(matches!(idle, Err(EngineError::Validation(_))));

    let as_driver = engine.leave_trip(&driver).await;
    assert!(matches!(as_driver, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn removing_trip_frees_everyone() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();

    let passenger_attempt = engine.remove_trip(&RequestContext::new(ANN, &store)).await;
    assert!(matches!(passenger_attempt, Err(EngineError::Validation(_))));

    let closed = engine.remove_trip(&driver).await.unwrap();

    assert_eq!(closed.trip_id, trip.id);
    assert_eq!(closed.uids, vec![DRIVER, ANN]);
    assert_eq!(store.trip(trip.id).await.unwrap(), None);
    for id in [DRIVER, ANN] {
        assert_eq!(status_of(&store, id).await, (UserStatus::Available, None));
    }
    assert!(engine.locks.is_empty());
}

#[tokio::test]
async fn ending_trip_reports_who_ended_it() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();

    let ended = engine
        .end_trip(&RequestContext::new(ANN, &store), trip.id)
        .await
        .unwrap();

    assert!(!ended.driver_authorized);
    assert_eq!(ended.uids, vec![DRIVER, ANN]);
    assert_eq!(status_of(&store, DRIVER).await, (UserStatus::Available, None));

    let again = engine.end_trip(&driver, trip.id).await;
    assert!(matches!(again, Err(EngineError::NotFound(_))));
}

#[tokio::test]
async fn passenger_view_includes_own_itinerary() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    engine
        .add_passenger(&driver, trip.id, &join(ANN, HUB, "Santry"))
        .await
        .unwrap();

    let view = engine
        .current_trip(&RequestContext::new(ANN, &store))
        .await
        .unwrap();
    let route = view.passenger_route.unwrap();
    assert_eq!(view.status, UserStatus::PassengerBusy);
    assert_eq!(route.start, HUB);
    assert_eq!(route.departure_time, departure(8));
    assert_eq!(route.destination, "Santry");
    assert_eq!(route.arrival_time, departure(8) + TimeDelta::minutes(10));

    let driver_view = engine.current_trip(&driver).await.unwrap();
    assert!(driver_view.passenger_route.is_none());
    assert_eq!(driver_view.status, UserStatus::DriverBusy);

    let nobody = engine.current_trip(&RequestContext::new(CAT, &store)).await;
    assert!(matches!(nobody, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn search_ranks_by_previewed_arrival() {
    let engine = engine(StubProvider::default());
    let store = store().await;

    // Three open trips leaving campus, one full, one heading the wrong way.
    let later = engine
        .create_trip(&RequestContext::new(DRIVER, &store), offer(HUB, "Swords", 3, 9))
        .await
        .unwrap();
    let earlier = engine
        .create_trip(
            &RequestContext::new(OTHER_DRIVER, &store),
            offer("North Hub", "Howth", 2, 8),
        )
        .await
        .unwrap();
    engine
        .create_trip(&RequestContext::new(BOB, &store), offer(HUB, "Malahide", 0, 7))
        .await
        .unwrap();
    engine
        .create_trip(&RequestContext::new(CAT, &store), offer("Swords", HUB, 3, 6))
        .await
        .unwrap();

    let searcher = RequestContext::new(ANN, &store);
    let results = engine
        .search_trips(&searcher, &SearchRequest::new(HUB, "Santry", false))
        .await
        .unwrap();

    let ids: Vec<TripId> = results.iter().map(|m| m.trip.id).collect();
    assert_eq!(ids, vec![earlier.id, later.id]);
    assert!(results.windows(2).all(|w| w[0].preview.eta <= w[1].preview.eta));
    assert!(results.iter().all(|m| m.trip.available_seats > 0));

    assert!(!results[0].same_campus);
    assert!(results[1].same_campus);
    assert_eq!(results[0].driver_name, "Eve S.");
    assert_eq!(
        results[1].preview.eta,
        departure(9) + TimeDelta::seconds(2 * LEG_SECS as i64)
    );

    // Previews never change stored trips.
    assert_eq!(store.trip(later.id).await.unwrap(), Some(later));
}

#[tokio::test]
async fn unroutable_candidate_is_dropped() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let good = engine
        .create_trip(&RequestContext::new(DRIVER, &store), offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();
    engine
        .create_trip(
            &RequestContext::new(OTHER_DRIVER, &store),
            offer(HUB, "Island", 3, 8),
        )
        .await
        .unwrap();

    engine.provider().inner().set_unroutable("Island");
    let results = engine
        .search_trips(
            &RequestContext::new(ANN, &store),
            &SearchRequest::new(HUB, "Santry", false),
        )
        .await
        .unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(results[0].trip.id, good.id);
}

#[tokio::test]
async fn repeated_search_is_served_from_cache() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    engine
        .create_trip(&RequestContext::new(DRIVER, &store), offer("Swords", HUB, 3, 8))
        .await
        .unwrap();

    let searcher = RequestContext::new(ANN, &store);
    let request = SearchRequest::new("Santry", HUB, true);
    let first = engine.search_trips(&searcher, &request).await.unwrap();
    let calls = engine.provider().inner().calls();
    let second = engine.search_trips(&searcher, &request).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(engine.provider().inner().calls(), calls);
}

#[tokio::test]
async fn search_rejects_busy_users_and_non_campus_ends() {
    let engine = engine(StubProvider::default());
    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    engine
        .create_trip(&driver, offer(HUB, "Swords", 3, 8))
        .await
        .unwrap();

    let busy = engine
        .search_trips(&driver, &SearchRequest::new(HUB, "Santry", false))
        .await;
    assert!(matches!(busy, Err(EngineError::Conflict(_))));

    let off_campus = engine
        .search_trips(
            &RequestContext::new(ANN, &store),
            &SearchRequest::new("Santry", "Swords", true),
        )
        .await;
    assert!(matches!(off_campus, Err(EngineError::Validation(_))));
}

#[tokio::test]
async fn previews_are_bounded_in_batches() {
    let engine = Engine::new(
        StubProvider::default(),
        EngineConfig::new()
            .with_hubs(HubSet::new([HUB]))
            .with_max_concurrent_previews(1),
    );
    let store = store().await;
    for (driver, hour) in [(DRIVER, 9), (OTHER_DRIVER, 8)] {
        engine
            .create_trip(&RequestContext::new(driver, &store), offer(HUB, "Swords", 2, hour))
            .await
            .unwrap();
    }

    let results = engine
        .search_trips(
            &RequestContext::new(ANN, &store),
            &SearchRequest::new(HUB, "Santry", false),
        )
        .await
        .unwrap();
    assert_eq!(results.len(), 2);
    assert!(results[0].preview.eta < results[1].preview.eta);
}

#[tokio::test]
async fn bundled_transcript_drives_a_full_trip() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/fixtures/campus_to_swords.json");
    let provider = crate::directions::FixtureProvider::load(path).unwrap();
    let engine = Engine::new(provider, EngineConfig::default());
    let campus = engine.config().hubs.names()[0].clone();

    let store = store().await;
    let driver = RequestContext::new(DRIVER, &store);
    let trip = engine
        .create_trip(&driver, offer(&campus, "Swords, Co. Dublin", 3, 8))
        .await
        .unwrap();
    assert_eq!(trip.distance, "11.8 km");
    assert_eq!(trip.duration, "0 hours, 19 min, 22 sec");

    let added = engine
        .add_passenger(&driver, trip.id, &join(ANN, &campus, "Santry, Dublin"))
        .await
        .unwrap();
    let trip = added.trip;

    assert_eq!(trip.distance, "12.5 km");
    assert_eq!(trip.duration, "0 hours, 22 min, 20 sec");
    assert_eq!(trip.eta, departure(8) + TimeDelta::seconds(489 + 851));
    assert_eq!(trip.route[0].start, campus);
    assert_eq!(trip.route[0].destination, "Santry, Dublin");
    assert_eq!(trip.route[1].destination, "Swords, Co. Dublin");
}
