//! Trip data model.

use std::fmt;

use chrono::NaiveDateTime;

use super::keyed::KeyedMap;
use super::status::UserId;

/// Most seats a driver can offer on one trip.
pub const MAX_SEATS: u8 = 5;

/// Identifier of a trip in the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TripId(pub u64);

impl fmt::Display for TripId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error returned for a seat count outside `0..=MAX_SEATS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("malformed seat count {0}: must be between 0 and {MAX_SEATS}")]
pub struct InvalidSeatCount(pub i32);

/// A named place with coordinates.
///
/// `name` is the canonical label chosen when the location was entered. It is
/// what the rest of the system compares on, regardless of how the routing
/// provider later spells the same address.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub fn new(name: impl Into<String>, lat: f64, lng: f64) -> Self {
        Self {
            name: name.into(),
            lat,
            lng,
        }
    }
}

/// An intermediate stop added for a passenger.
#[derive(Debug, Clone, PartialEq)]
pub struct Waypoint {
    pub name: String,
    /// Display name of the passenger the stop was added for.
    pub passenger: String,
    pub lat: f64,
    pub lng: f64,
}

/// A passenger's personal start and end within a shared trip.
#[derive(Debug, Clone, PartialEq)]
pub struct PassengerLeg {
    pub passenger_id: UserId,
    pub passenger_name: String,
    pub start: String,
    pub destination: String,
}

impl PassengerLeg {
    /// Whether either end of this leg is the named location.
    pub fn references(&self, name: &str) -> bool {
        self.start == name || self.destination == name
    }
}

/// One segment of a trip's route between consecutive stops.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteLeg {
    pub start: String,
    pub destination: String,
    /// Provider display text, e.g. "4.2 km".
    pub distance: String,
    /// Provider display text, e.g. "12 mins".
    pub duration: String,
    /// Seconds the provider reported for this leg.
    pub duration_secs: u64,
    pub departure_time: NaiveDateTime,
    pub arrival_time: NaiveDateTime,
}

/// What a driver submits to offer a trip.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTrip {
    pub start: Location,
    pub destination: Location,
    pub time_of_departure: NaiveDateTime,
    pub available_seats: i32,
}

impl NewTrip {
    /// Validate the offered seat count.
    pub fn seats(&self) -> Result<u8, InvalidSeatCount> {
        u8::try_from(self.available_seats)
            .ok()
            .filter(|&n| n <= MAX_SEATS)
            .ok_or(InvalidSeatCount(self.available_seats))
    }
}

/// A driver's trip with its current passengers and route.
#[derive(Debug, Clone, PartialEq)]
pub struct Trip {
    pub id: TripId,
    pub driver: UserId,
    pub time_of_departure: NaiveDateTime,
    pub eta: NaiveDateTime,
    pub start: Location,
    pub destination: Location,
    pub waypoints: KeyedMap<Waypoint>,
    pub passengers: KeyedMap<PassengerLeg>,
    pub available_seats: u8,
    /// Seats offered when the trip was created.
    pub capacity: u8,
    /// Display text for the total distance, e.g. "12.5 km".
    pub distance: String,
    /// Display text for the total duration, e.g. "0 hours, 25 min, 10 sec".
    pub duration: String,
    pub route: Vec<RouteLeg>,
}

impl Trip {
    /// Create a trip with no passengers and no route yet.
    ///
    /// The ETA starts equal to the departure time until a route is applied.
    pub fn new(id: TripId, driver: UserId, offer: NewTrip, seats: u8) -> Self {
        Self {
            id,
            driver,
            time_of_departure: offer.time_of_departure,
            eta: offer.time_of_departure,
            start: offer.start,
            destination: offer.destination,
            waypoints: KeyedMap::new(),
            passengers: KeyedMap::new(),
            available_seats: seats,
            capacity: seats,
            distance: "0".to_string(),
            duration: "0".to_string(),
            route: Vec::new(),
        }
    }

    /// Key under which a passenger's leg is stored.
    pub fn passenger_key(passenger: UserId) -> String {
        format!("passenger{}", passenger.0)
    }

    /// The leg for a passenger, if they are on this trip.
    pub fn leg_of(&self, passenger: UserId) -> Option<&PassengerLeg> {
        self.passengers.get(&Self::passenger_key(passenger))
    }

    /// Waypoint names in stored order.
    pub fn waypoint_names(&self) -> impl Iterator<Item = &str> {
        self.waypoints.values().map(|w| w.name.as_str())
    }

    /// Whether free seats plus seated passengers add up to the offer.
    pub fn seats_balance(&self) -> bool {
        self.available_seats <= MAX_SEATS
            && usize::from(self.available_seats) + self.passengers.len()
                == usize::from(self.capacity)
    }

    /// Whether every waypoint is still needed by some passenger.
    pub fn waypoints_referenced(&self) -> bool {
        self.waypoints
            .values()
            .all(|w| self.passengers.values().any(|p| p.references(&w.name)))
    }
}
