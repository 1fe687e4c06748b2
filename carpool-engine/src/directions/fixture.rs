//! Fixture provider for running without network access.
//!
//! Replays a transcript of recorded provider exchanges. A transcript is a
//! JSON array of `{"request": ..., "response": ...}` objects; the request is
//! matched exactly (origin, destination and waypoint order).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

use super::error::DirectionsError;
use super::request::{DirectionsRequest, RouteProvider};
use super::types::DirectionsResponse;

/// One recorded request/response pair.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TranscriptEntry {
    pub request: DirectionsRequest,
    pub response: DirectionsResponse,
}

/// Provider that answers from recorded responses.
#[derive(Clone, Default)]
pub struct FixtureProvider {
    responses: Arc<RwLock<HashMap<DirectionsRequest, DirectionsResponse>>>,
}

impl FixtureProvider {
    /// Build a provider from in-memory entries.
    pub fn from_entries(entries: impl IntoIterator<Item = TranscriptEntry>) -> Self {
        let responses = entries
            .into_iter()
            .map(|e| (e.request, e.response))
            .collect();
        Self {
            responses: Arc::new(RwLock::new(responses)),
        }
    }

    /// Load a transcript file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, DirectionsError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| DirectionsError::Fixture(format!("failed to read {path:?}: {e}")))?;

        let entries: Vec<TranscriptEntry> = serde_json::from_str(&json)
            .map_err(|e| DirectionsError::Fixture(format!("failed to parse {path:?}: {e}")))?;

        if entries.is_empty() {
            return Err(DirectionsError::Fixture(format!(
                "no recorded exchanges in {path:?}"
            )));
        }

        Ok(Self::from_entries(entries))
    }

    /// Number of recorded exchanges.
    pub async fn len(&self) -> usize {
        self.responses.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.responses.read().await.is_empty()
    }
}

impl RouteProvider for FixtureProvider {
    async fn directions(
        &self,
        request: &DirectionsRequest,
    ) -> Result<DirectionsResponse, DirectionsError> {
        let responses = self.responses.read().await;

        let response = responses
            .get(request)
            .cloned()
            .ok_or_else(|| DirectionsError::NoFixture(request.to_string()))?;

        if !response.is_ok() {
            return Err(DirectionsError::Status {
                status: response.status.unwrap_or_default(),
                message: response.error_message.unwrap_or_default(),
            });
        }

        Ok(response)
    }
}
