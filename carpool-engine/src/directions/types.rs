//! Directions API response DTOs.
//!
//! These map onto the JSON returned by the directions endpoint. Only the
//! fields the route resolver reads are modelled; everything else is ignored.

use serde::{Deserialize, Serialize};

/// Top-level directions response.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DirectionsResponse {
    /// "OK", "ZERO_RESULTS", "REQUEST_DENIED", ...
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,

    /// Human-readable detail accompanying a non-OK status.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,

    #[serde(default)]
    pub routes: Vec<DirectionsRoute>,
}

/// One candidate route.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DirectionsRoute {
    /// Visiting order the provider chose, as indices into the submitted
    /// waypoint list.
    #[serde(default)]
    pub waypoint_order: Vec<usize>,

    /// Legs between consecutive stops, origin first.
    #[serde(default)]
    pub legs: Vec<DirectionsLeg>,
}

/// A leg between two consecutive stops.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct DirectionsLeg {
    pub distance: TextValue,
    pub duration: TextValue,
    /// Provider's geocoded spelling of the leg start.
    pub start_address: String,
    /// Provider's geocoded spelling of the leg end.
    pub end_address: String,
}

/// A display string paired with its numeric value.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct TextValue {
    pub text: String,
    /// Meters for distances, seconds for durations.
    #[serde(default)]
    pub value: u64,
}

impl DirectionsResponse {
    /// Whether the provider reported success (a missing status counts).
    pub fn is_ok(&self) -> bool {
        self.status.as_deref().is_none_or(|s| s == "OK")
    }
}
