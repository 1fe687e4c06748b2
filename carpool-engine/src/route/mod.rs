//! Route resolution against the routing provider.
//!
//! The provider is free to reorder intermediate stops and to re-geocode
//! every address it is given. [`Resolver`] issues the request and
//! [`reconcile`] maps the answer back onto the names the trip stores,
//! producing a [`RoutePlan`] with per-leg times, totals and ETA.

mod resolve;
pub mod units;

pub use resolve::{ResolveError, RoutePlan, RouteQuery, Resolver, reconcile};
