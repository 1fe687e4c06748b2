//! Carpool trip routing and ride matching.
//!
//! Drivers offer trips to or from a campus; passengers search for trips
//! they can join and are added as intermediate stops. Every change to a
//! trip's stops is re-routed through a directions provider before it is
//! committed, so stored routes, seat counts and ETAs always agree.

pub mod cache;
pub mod directions;
pub mod domain;
pub mod dto;
pub mod engine;
pub mod route;
pub mod store;
