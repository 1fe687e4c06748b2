//! Routing provider access.
//!
//! The engine talks to a directions service through the [`RouteProvider`]
//! trait. Two providers ship with the crate:
//! - [`DirectionsClient`] calls the live HTTP directions API
//! - [`FixtureProvider`] replays recorded transcripts
//!
//! Provider answers may spell addresses differently from what was
//! submitted (the service re-geocodes them). Reconciling that is the route
//! resolver's job, not this module's.

mod client;
mod error;
mod fixture;
mod request;
mod types;

pub use client::{DirectionsClient, DirectionsConfig};
pub use error::DirectionsError;
pub use fixture::{FixtureProvider, TranscriptEntry};
pub use request::{DirectionsRequest, RouteProvider};
pub use types::{DirectionsLeg, DirectionsResponse, DirectionsRoute, TextValue};
