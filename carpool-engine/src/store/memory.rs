//! In-memory trip store.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use tokio::sync::RwLock;

use crate::domain::{Trip, TripId, User, UserId};

use super::{StoreError, Transaction, TripQuery, TripStore, TripWrite};

#[derive(Default)]
struct Inner {
    trips: HashMap<TripId, Trip>,
    users: HashMap<UserId, User>,
    last_trip_id: u64,
}

/// Thread-safe in-memory store.
///
/// Every commit runs under one write lock, so readers never observe half a
/// transaction.
#[derive(Clone, Default)]
pub struct MemoryStore {
    inner: Arc<RwLock<Inner>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a user account.
    pub async fn add_user(&self, user: User) {
        self.inner.write().await.users.insert(user.id, user);
    }

    /// Number of stored trips.
    pub async fn trip_count(&self) -> usize {
        self.inner.read().await.trips.len()
    }
}

impl Inner {
    /// Check a transaction can be applied without touching any state.
    fn check(&self, tx: &Transaction) -> Result<(), StoreError> {
        match &tx.trip {
            Some(TripWrite::Insert(trip)) if self.trips.contains_key(&trip.id) => {
                return Err(StoreError::DuplicateTrip(trip.id));
            }
            Some(TripWrite::Update(trip)) if !self.trips.contains_key(&trip.id) => {
                return Err(StoreError::MissingTrip(trip.id));
            }
            _ => {}
        }

        if let Some(update) = tx.users.iter().find(|u| !self.users.contains_key(&u.user)) {
            return Err(StoreError::UnknownUser(update.user));
        }

        Ok(())
    }
}

impl TripStore for MemoryStore {
    async fn trip(&self, id: TripId) -> Result<Option<Trip>, StoreError> {
        Ok(self.inner.read().await.trips.get(&id).cloned())
    }

    async fn user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        Ok(self.inner.read().await.users.get(&id).cloned())
    }

    async fn allocate_trip_id(&self) -> Result<TripId, StoreError> {
        let mut inner = self.inner.write().await;
        inner.last_trip_id += 1;
        Ok(TripId(inner.last_trip_id))
    }

    async fn find_trips(&self, query: &TripQuery) -> Result<Vec<Trip>, StoreError> {
        let inner = self.inner.read().await;
        let mut trips: Vec<Trip> = inner
            .trips
            .values()
            .filter(|t| query.matches(t))
            .cloned()
            .collect();
        trips.sort_by_key(|t| (t.time_of_departure, t.id));
        Ok(trips)
    }

    async fn active_trip_ids(&self) -> Result<HashSet<TripId>, StoreError> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .filter_map(|u| u.current_trip)
            .collect())
    }

    async fn trip_members(&self, id: TripId) -> Result<Vec<UserId>, StoreError> {
        let inner = self.inner.read().await;
        let mut members: Vec<UserId> = inner
            .users
            .values()
            .filter(|u| u.current_trip == Some(id))
            .map(|u| u.id)
            .collect();
        members.sort();
        Ok(members)
    }

    async fn commit(&self, tx: Transaction) -> Result<(), StoreError> {
        let mut inner = self.inner.write().await;
        inner.check(&tx)?;

        match tx.trip {
            Some(TripWrite::Insert(trip)) | Some(TripWrite::Update(trip)) => {
                inner.trips.insert(trip.id, trip);
            }
            Some(TripWrite::Delete(id)) => {
                inner.trips.remove(&id);
            }
            None => {}
        }

        for update in tx.users {
            if let Some(user) = inner.users.get_mut(&update.user) {
                user.status = update.status;
                user.current_trip = update.current_trip;
            }
        }

        Ok(())
    }
}
