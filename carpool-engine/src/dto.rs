//! Data transfer objects for the request and response boundary.
//!
//! Field names follow the JSON consumers already read (`tripID`, `ETA`,
//! `passengerName`, ...), so they are renamed explicitly rather than derived.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::domain::{KeyedMap, Location, NewTrip, PassengerLeg, RouteLeg, Trip, Waypoint};
use crate::engine::{
    EngineError, PassengerAdded, PassengerLeft, PassengerRoute, SearchRequest, TripClosed,
    TripEnded, TripMatch, TripView,
};
use crate::route::RoutePlan;

/// Timestamp format for departure times and ETAs.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// Timestamp format for route leg clocks.
pub const LEG_TIME_FORMAT: &str = "%H:%M %m/%d/%Y";

/// Format accepted for submitted departure times.
pub const INPUT_TIME_FORMAT: &str = "%Y-%m-%dT%H:%M";

/// A named place with coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl From<&Location> for LocationData {
    fn from(loc: &Location) -> Self {
        Self {
            name: loc.name.clone(),
            lat: loc.lat,
            lng: loc.lng,
        }
    }
}

impl From<LocationData> for Location {
    fn from(data: LocationData) -> Self {
        Location::new(data.name, data.lat, data.lng)
    }
}

/// Request to offer a trip.
#[derive(Debug, Deserialize)]
pub struct CreateTripRequest {
    pub start: LocationData,
    pub destination: LocationData,

    /// Departure in `%Y-%m-%dT%H:%M` format
    pub time_of_departure: String,

    pub available_seats: i32,
}

impl CreateTripRequest {
    /// Parse into a trip offer.
    pub fn into_new_trip(self) -> Result<NewTrip, EngineError> {
        let time_of_departure = parse_departure(&self.time_of_departure)?;
        Ok(NewTrip {
            start: self.start.into(),
            destination: self.destination.into(),
            time_of_departure,
            available_seats: self.available_seats,
        })
    }
}

/// Parse a submitted departure time.
pub fn parse_departure(text: &str) -> Result<NaiveDateTime, EngineError> {
    NaiveDateTime::parse_from_str(text, INPUT_TIME_FORMAT)
        .map_err(|e| EngineError::Validation(format!("invalid departure time {text:?}: {e}")))
}

/// Request to search for trips.
#[derive(Debug, Deserialize)]
pub struct SearchTripsRequest {
    pub start: String,
    pub destination: String,

    /// Heading to campus rather than leaving it
    #[serde(rename = "toHub")]
    pub toward_hub: bool,
}

impl From<SearchTripsRequest> for SearchRequest {
    fn from(req: SearchTripsRequest) -> Self {
        SearchRequest::new(req.start, req.destination, req.toward_hub)
    }
}

/// One leg of a trip's route.
#[derive(Debug, Serialize)]
pub struct RouteLegResult {
    pub start: String,
    pub destination: String,
    pub distance: String,
    pub duration: String,
    pub departure_time: String,
    pub arrival_time: String,
}

impl RouteLegResult {
    pub fn from_leg(leg: &RouteLeg) -> Self {
        Self {
            start: leg.start.clone(),
            destination: leg.destination.clone(),
            distance: leg.distance.clone(),
            duration: leg.duration.clone(),
            departure_time: leg.departure_time.format(LEG_TIME_FORMAT).to_string(),
            arrival_time: leg.arrival_time.format(LEG_TIME_FORMAT).to_string(),
        }
    }
}

/// Wrapper matching the `route.route[]` nesting.
#[derive(Debug, Serialize)]
pub struct RouteResult {
    pub route: Vec<RouteLegResult>,
}

impl RouteResult {
    pub fn from_legs(legs: &[RouteLeg]) -> Self {
        Self {
            route: legs.iter().map(RouteLegResult::from_leg).collect(),
        }
    }
}

/// A passenger entry, keyed `passenger<id>`.
#[derive(Debug, Serialize)]
pub struct PassengerResult {
    #[serde(rename = "passengerName")]
    pub passenger_name: String,

    #[serde(rename = "passengerID")]
    pub passenger_id: u64,

    #[serde(rename = "passengerStart")]
    pub passenger_start: String,

    #[serde(rename = "passengerDestination")]
    pub passenger_destination: String,
}

impl PassengerResult {
    pub fn from_leg(leg: &PassengerLeg) -> Self {
        Self {
            passenger_name: leg.passenger_name.clone(),
            passenger_id: leg.passenger_id.0,
            passenger_start: leg.start.clone(),
            passenger_destination: leg.destination.clone(),
        }
    }
}

/// A waypoint entry, keyed `waypoint<n>`.
#[derive(Debug, Serialize)]
pub struct WaypointResult {
    pub name: String,
    pub passenger: String,
    pub lat: f64,
    pub lng: f64,
}

impl WaypointResult {
    pub fn from_waypoint(w: &Waypoint) -> Self {
        Self {
            name: w.name.clone(),
            passenger: w.passenger.clone(),
            lat: w.lat,
            lng: w.lng,
        }
    }
}

/// Full trip snapshot.
#[derive(Debug, Serialize)]
pub struct TripResult {
    #[serde(rename = "tripID")]
    pub trip_id: u64,

    #[serde(rename = "driverID")]
    pub driver_id: u64,

    pub time_of_departure: String,

    #[serde(rename = "ETA")]
    pub eta: String,

    pub start: LocationData,
    pub destination: LocationData,
    pub distance: String,
    pub duration: String,
    pub route: RouteResult,
    pub passengers: KeyedMap<PassengerResult>,
    pub waypoints: KeyedMap<WaypointResult>,
    pub available_seats: u8,
    pub capacity: u8,
}

impl TripResult {
    pub fn from_trip(trip: &Trip) -> Self {
        Self {
            trip_id: trip.id.0,
            driver_id: trip.driver.0,
            time_of_departure: trip.time_of_departure.format(TIMESTAMP_FORMAT).to_string(),
            eta: trip.eta.format(TIMESTAMP_FORMAT).to_string(),
            start: LocationData::from(&trip.start),
            destination: LocationData::from(&trip.destination),
            distance: trip.distance.clone(),
            duration: trip.duration.clone(),
            route: RouteResult::from_legs(&trip.route),
            passengers: trip.passengers.map_values(PassengerResult::from_leg),
            waypoints: trip.waypoints.map_values(WaypointResult::from_waypoint),
            available_seats: trip.available_seats,
            capacity: trip.capacity,
        }
    }
}

/// Response after adding a passenger.
#[derive(Debug, Serialize)]
pub struct PassengerAddedResponse {
    pub trip_data: TripResult,
    pub is_same_campus: bool,
}

impl From<&PassengerAdded> for PassengerAddedResponse {
    fn from(added: &PassengerAdded) -> Self {
        Self {
            trip_data: TripResult::from_trip(&added.trip),
            is_same_campus: added.is_same_campus,
        }
    }
}

/// Response after a passenger leaves.
#[derive(Debug, Serialize)]
pub struct LeaveResponse {
    pub trip_data: TripResult,
    pub available_seats: u8,
}

impl From<&PassengerLeft> for LeaveResponse {
    fn from(left: &PassengerLeft) -> Self {
        Self {
            trip_data: TripResult::from_trip(&left.trip),
            available_seats: left.available_seats,
        }
    }
}

/// One search result.
#[derive(Debug, Serialize)]
pub struct SearchResultEntry {
    /// Trip id, as the primary key consumers look up
    pub pk: u64,

    pub driver_name: String,

    #[serde(rename = "isCampusSame")]
    pub is_campus_same: bool,

    /// Previewed arrival with the searcher on board
    #[serde(rename = "previewETA")]
    pub preview_eta: String,

    #[serde(flatten)]
    pub trip: TripResult,
}

impl SearchResultEntry {
    pub fn from_match(m: &TripMatch) -> Self {
        Self {
            pk: m.trip.id.0,
            driver_name: m.driver_name.clone(),
            is_campus_same: m.same_campus,
            preview_eta: m.preview.eta.format(TIMESTAMP_FORMAT).to_string(),
            trip: TripResult::from_trip(&m.trip),
        }
    }
}

/// Response after removing a trip.
#[derive(Debug, Serialize)]
pub struct TripClosedResponse {
    pub uids: Vec<u64>,
}

impl From<&TripClosed> for TripClosedResponse {
    fn from(closed: &TripClosed) -> Self {
        Self {
            uids: closed.uids.iter().map(|u| u.0).collect(),
        }
    }
}

/// Response after ending a trip.
#[derive(Debug, Serialize)]
pub struct TripEndedResponse {
    pub uids: Vec<u64>,
    pub driver_authorized: bool,
}

impl From<&TripEnded> for TripEndedResponse {
    fn from(ended: &TripEnded) -> Self {
        Self {
            uids: ended.uids.iter().map(|u| u.0).collect(),
            driver_authorized: ended.driver_authorized,
        }
    }
}

/// A passenger's own itinerary.
#[derive(Debug, Serialize)]
pub struct PassengerRouteResult {
    #[serde(rename = "passengerStartLoc")]
    pub start: String,

    #[serde(rename = "passengerDepartureTime")]
    pub departure_time: String,

    #[serde(rename = "passengerDestLoc")]
    pub destination: String,

    #[serde(rename = "passengerArrivalTime")]
    pub arrival_time: String,
}

impl PassengerRouteResult {
    pub fn from_route(route: &PassengerRoute) -> Self {
        Self {
            start: route.start.clone(),
            departure_time: route.departure_time.format(LEG_TIME_FORMAT).to_string(),
            destination: route.destination.clone(),
            arrival_time: route.arrival_time.format(LEG_TIME_FORMAT).to_string(),
        }
    }
}

/// The join-trip view.
#[derive(Debug, Serialize)]
pub struct TripViewResponse {
    pub trip_data: TripResult,
    pub status: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub passenger_route: Option<PassengerRouteResult>,
}

impl From<&TripView> for TripViewResponse {
    fn from(view: &TripView) -> Self {
        Self {
            trip_data: TripResult::from_trip(&view.trip),
            status: view.status.to_string(),
            passenger_route: view
                .passenger_route
                .as_ref()
                .map(PassengerRouteResult::from_route),
        }
    }
}

/// A resolved route on its own.
#[derive(Debug, Serialize)]
pub struct RoutePreviewResponse {
    #[serde(rename = "ETA")]
    pub eta: String,
    pub distance: String,
    pub duration: String,
    pub route: RouteResult,
}

impl From<&RoutePlan> for RoutePreviewResponse {
    fn from(plan: &RoutePlan) -> Self {
        Self {
            eta: plan.eta.format(TIMESTAMP_FORMAT).to_string(),
            distance: plan.distance.clone(),
            duration: plan.duration.clone(),
            route: RouteResult::from_legs(&plan.legs),
        }
    }
}

/// Error body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl From<&EngineError> for ErrorResponse {
    fn from(e: &EngineError) -> Self {
        Self {
            error: e.to_string(),
        }
    }
}
