//! Domain types for the carpool engine.
//!
//! Trips, their stops and passengers, and the users who drive or ride in
//! them. Validation that does not need the store or the routing provider
//! lives here too.

mod keyed;
mod status;
mod trip;

pub use keyed::KeyedMap;
pub use status::{InvalidTransition, StatusEvent, User, UserId, UserStatus};
pub use trip::{
    InvalidSeatCount, Location, MAX_SEATS, NewTrip, PassengerLeg, RouteLeg, Trip, TripId, Waypoint,
};
