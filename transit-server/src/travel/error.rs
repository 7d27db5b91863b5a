//! Travel-time provider error types.

/// Errors from a travel-time provider.
#[derive(Debug, thiserror::Error)]
pub enum TravelTimeError {
    /// HTTP request failed (network error, timeout, etc.)
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON deserialization failed
    #[error(
        "JSON parse error: {source}{}",
        .body.as_deref().map(|b| format!(" (body: {b})")).unwrap_or_default()
    )]
    Json {
        #[source]
        source: serde_json::Error,
        /// Start of the offending response body
        body: Option<String>,
    },

    /// Service returned an error status code
    #[error("API error {status}: {message}")]
    ApiError { status: u16, message: String },

    /// Rate limited by the service
    #[error("rate limited by travel-time service")]
    RateLimited,

    /// Matrix response does not match the requested sources and targets
    #[error(
        "matrix shape {}x{} does not match request {}x{}",
        .actual.0, .actual.1, .expected.0, .expected.1
    )]
    MatrixShape {
        expected: (usize, usize),
        actual: (usize, usize),
    },

    /// Isochrone geometry could not be used
    #[error("bad isochrone geometry: {0}")]
    Geometry(String),
}
