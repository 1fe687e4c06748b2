//! Users and their trip participation status.

use std::fmt;

use super::trip::TripId;

/// Identifier of a user account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct UserId(pub u64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a user is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserStatus {
    /// Free to offer or join a trip.
    Available,
    /// Driving their own trip.
    DriverBusy,
    /// Riding in someone else's trip.
    PassengerBusy,
}

/// Something that happens to a user's participation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEvent {
    /// The user creates a trip as its driver.
    StartDriving,
    /// The user is added to a trip as a passenger.
    JoinTrip,
    /// The user leaves a trip they are riding in.
    LeaveTrip,
    /// The trip the user belongs to was removed or ended.
    TripClosed,
}

/// A status change that is not allowed from the current state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("cannot apply {event:?} while {from}")]
pub struct InvalidTransition {
    pub from: UserStatus,
    pub event: StatusEvent,
}

impl UserStatus {
    /// Wire name of the status.
    pub fn as_str(&self) -> &'static str {
        match self {
            UserStatus::Available => "available",
            UserStatus::DriverBusy => "driver_busy",
            UserStatus::PassengerBusy => "passenger_busy",
        }
    }

    /// Apply an event, returning the resulting status.
    pub fn transition(self, event: StatusEvent) -> Result<UserStatus, InvalidTransition> {
        use StatusEvent::*;
        use UserStatus::*;

        match (self, event) {
            (Available, StartDriving) => Ok(DriverBusy),
            (Available, JoinTrip) => Ok(PassengerBusy),
            (PassengerBusy, LeaveTrip) => Ok(Available),
            (DriverBusy, TripClosed) | (PassengerBusy, TripClosed) => Ok(Available),
            (DriverBusy, StartDriving)
            | (PassengerBusy, StartDriving)
            | (DriverBusy, JoinTrip)
            | (PassengerBusy, JoinTrip)
            | (Available, LeaveTrip)
            | (DriverBusy, LeaveTrip)
            | (Available, TripClosed) => Err(InvalidTransition { from: self, event }),
        }
    }
}

impl fmt::Display for UserStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The slice of a user account the engine reads and writes.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: UserId,
    /// Short display label, e.g. "Jane D."
    pub display_name: String,
    pub status: UserStatus,
    pub current_trip: Option<TripId>,
}

impl User {
    /// Create an available user with no trip.
    pub fn new(id: UserId, display_name: impl Into<String>) -> Self {
        Self {
            id,
            display_name: display_name.into(),
            status: UserStatus::Available,
            current_trip: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_wire_names() {
        assert_eq!(UserStatus::Available.to_string(), "available");
        assert_eq!(UserStatus::DriverBusy.to_string(), "driver_busy");
        assert_eq!(UserStatus::PassengerBusy.to_string(), "passenger_busy");
    }

    #[test]
    fn only_available_users_start_or_join() {
        assert_eq!(
            UserStatus::Available.transition(StatusEvent::StartDriving),
            Ok(UserStatus::DriverBusy)
        );
        assert_eq!(
            UserStatus::Available.transition(StatusEvent::JoinTrip),
            Ok(UserStatus::PassengerBusy)
        );
        assert!(
            UserStatus::DriverBusy
                .transition(StatusEvent::StartDriving)
                .is_err()
        );
        assert!(
            UserStatus::PassengerBusy
                .transition(StatusEvent::JoinTrip)
                .is_err()
        );
    }

    #[test]
    fn closing_frees_everyone_but_leaving_is_for_passengers() {
        assert_eq!(
            UserStatus::DriverBusy.transition(StatusEvent::TripClosed),
            Ok(UserStatus::Available)
        );
        assert_eq!(
            UserStatus::PassengerBusy.transition(StatusEvent::LeaveTrip),
            Ok(UserStatus::Available)
        );
        assert!(
            UserStatus::DriverBusy
                .transition(StatusEvent::LeaveTrip)
                .is_err()
        );
        assert!(
            UserStatus::Available
                .transition(StatusEvent::TripClosed)
                .is_err()
        );
    }
}
