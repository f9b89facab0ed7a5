use thiserror::Error;

/// Failure of a single reverse geocoding request.
///
/// None of these are fatal: the caller reports them and keeps going.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("geocoding request timed out")]
    Timeout,

    #[error("geocoding request failed: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("geocoding API returned status: {0}")]
    Status(u16),
}

impl ResolveError {
    /// Classify a transport-level error from reqwest
    pub(crate) fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ResolveError::Timeout
        } else {
            ResolveError::Transport(err)
        }
    }
}

/// Rejected latitude/longitude input
#[derive(Debug, Clone, PartialEq, Error)]
pub enum CoordinateError {
    #[error("coordinate is not a finite number")]
    NotFinite,

    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),

    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
}
