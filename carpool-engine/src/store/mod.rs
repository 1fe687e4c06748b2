//! Trip registry and user directory.
//!
//! The engine does not own persistence. It reads trips and users through
//! [`TripStore`] and writes through [`TripStore::commit`], which must apply
//! a whole [`Transaction`] or nothing. [`MemoryStore`] is the in-process
//! implementation used by tests and the CLI.

mod memory;

use std::collections::HashSet;

use crate::domain::{Trip, TripId, User, UserId, UserStatus};

pub use memory::MemoryStore;

/// Errors from the store.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    /// An update targeted a trip that no longer exists
    #[error("trip {0} does not exist")]
    MissingTrip(TripId),

    /// An insert reused an existing trip id
    #[error("trip {0} already exists")]
    DuplicateTrip(TripId),

    /// A status write targeted an unknown user
    #[error("user {0} does not exist")]
    UnknownUser(UserId),

    /// Backend failure
    #[error("store backend error: {0}")]
    Backend(String),
}

/// Filter for trip lookups. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TripQuery {
    pub ids: Option<HashSet<TripId>>,
    pub driver: Option<UserId>,
    /// Trip start name must be one of these.
    pub start_in: Option<Vec<String>>,
    /// Trip destination name must be one of these.
    pub destination_in: Option<Vec<String>>,
}

impl TripQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_ids(mut self, ids: HashSet<TripId>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn driven_by(mut self, driver: UserId) -> Self {
        self.driver = Some(driver);
        self
    }

    pub fn starting_at_any(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.start_in = Some(names.into_iter().map(Into::into).collect());
        self
    }

    pub fn ending_at_any(mut self, names: impl IntoIterator<Item = impl Into<String>>) -> Self {
        self.destination_in = Some(names.into_iter().map(Into::into).collect());
        self
    }

    /// Whether a trip passes every set filter.
    pub fn matches(&self, trip: &Trip) -> bool {
        self.ids.as_ref().is_none_or(|ids| ids.contains(&trip.id))
            && self.driver.is_none_or(|d| d == trip.driver)
            && self
                .start_in
                .as_ref()
                .is_none_or(|names| names.contains(&trip.start.name))
            && self
                .destination_in
                .as_ref()
                .is_none_or(|names| names.contains(&trip.destination.name))
    }
}

/// Write to a trip record.
#[derive(Debug, Clone, PartialEq)]
pub enum TripWrite {
    /// Store a new trip; fails if the id is taken.
    Insert(Trip),
    /// Replace an existing trip; fails if it has been deleted.
    Update(Trip),
    /// Delete a trip.
    Delete(TripId),
}

/// New status and trip reference for one user.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatusUpdate {
    pub user: UserId,
    pub status: UserStatus,
    pub current_trip: Option<TripId>,
}

/// A set of writes applied atomically.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Transaction {
    pub trip: Option<TripWrite>,
    pub users: Vec<StatusUpdate>,
}

impl Transaction {
    pub fn insert(trip: Trip) -> Self {
        Self {
            trip: Some(TripWrite::Insert(trip)),
            users: Vec::new(),
        }
    }

    pub fn update(trip: Trip) -> Self {
        Self {
            trip: Some(TripWrite::Update(trip)),
            users: Vec::new(),
        }
    }

    pub fn delete(id: TripId) -> Self {
        Self {
            trip: Some(TripWrite::Delete(id)),
            users: Vec::new(),
        }
    }

    /// Also set a user's status and trip reference.
    pub fn with_status(
        mut self,
        user: UserId,
        status: UserStatus,
        current_trip: Option<TripId>,
    ) -> Self {
        self.users.push(StatusUpdate {
            user,
            status,
            current_trip,
        });
        self
    }
}

/// Transactional access to trips and users.
#[allow(async_fn_in_trait)]
pub trait TripStore {
    async fn trip(&self, id: TripId) -> Result<Option<Trip>, StoreError>;

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError>;

    /// Reserve a fresh trip id.
    async fn allocate_trip_id(&self) -> Result<TripId, StoreError>;

    /// Trips matching the query, ordered by departure time ascending.
    async fn find_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, StoreError>;

    /// Ids of every trip some user currently references.
    async fn active_trip_ids(&self) -> Result<HashSet<TripId>, StoreError>;

    /// Users whose current trip is `id`, driver included.
    async fn trip_members(&self, id: TripId) -> Result<Vec<UserId>, StoreError>;

    /// Apply every write in the transaction, or none of them.
    async fn commit(&self, tx: Transaction) -> Result<(), StoreError>;
}
