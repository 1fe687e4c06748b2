//! Provider-agnostic directions request and the provider trait.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::error::DirectionsError;
use super::types::DirectionsResponse;

/// A request for an optimized route through a set of stops.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct DirectionsRequest {
    pub origin: String,
    pub destination: String,
    /// Intermediate stops in submission order. The provider may visit them
    /// in any order and reports the order it chose.
    #[serde(default)]
    pub waypoints: Vec<String>,
}

impl DirectionsRequest {
    pub fn new(
        origin: impl Into<String>,
        destination: impl Into<String>,
        waypoints: Vec<String>,
    ) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            waypoints,
        }
    }

    /// The `waypoints` query value, asking the provider to optimize order.
    ///
    /// Returns `None` when there are no intermediate stops.
    pub fn waypoints_param(&self) -> Option<String> {
        if self.waypoints.is_empty() {
            return None;
        }
        let mut param = String::from("optimize:true");
        for stop in &self.waypoints {
            param.push('|');
            param.push_str(stop);
        }
        Some(param)
    }
}

impl fmt::Display for DirectionsRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> ", self.origin)?;
        for stop in &self.waypoints {
            write!(f, "{stop} -> ")?;
        }
        f.write_str(&self.destination)
    }
}

/// Source of directions.
///
/// The engine is generic over this so tests can replay recorded provider
/// answers instead of making network calls.
#[allow(async_fn_in_trait)]
pub trait RouteProvider {
    /// Fetch an optimized route for the request.
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, DirectionsError>;
}
