use crate::domain::UserId;
use crate::store::TripStore;

/// Who is calling and where their data lives.
pub struct RequestContext<'a, S: TripStore> {
    /// The authenticated user.
    pub user: UserId,
    pub store: &'a S,
}

impl<'a, S: TripStore> RequestContext<'a, S> {
    pub fn new(user: UserId, store: &'a S) -> Self {
        Self { user, store }
    }
}
