//! Directions client error types.

/// Errors from a routing provider.
#[derive(Debug, thiserror::Error)]
pub enum DirectionsError {
    /// HTTP request failed (connection refused, TLS, ...)
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    /// The request did not complete within the client timeout
    #[error("request timed out")]
    Timeout,

    /// JSON deserialization failed
    #[error("JSON parse error: {message}")]
    Json {
        message: String,
        body: Option<String>,
    },

    /// API returned an error status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// API answered but reported a non-OK directions status
    #[error("directions status {status}: {message}")]
    Status { status: String, message: String },

    /// Invalid API key or unauthorized
    #[error("unauthorized (invalid API key)")]
    Unauthorized,

    /// Fixture provider has no recorded answer for the request
    #[error("no recorded response for {0}")]
    NoFixture(String),

    /// Fixture transcript could not be loaded
    #[error("fixture error: {0}")]
    Fixture(String),
}

impl From<reqwest::Error> for DirectionsError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DirectionsError::Timeout
        } else {
            DirectionsError::Http(err)
        }
    }
}
