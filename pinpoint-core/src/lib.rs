//! Reverse geocoding for map clicks.
//!
//! A map surface hands clicked coordinates to a [`Bridge`], which forwards
//! them to a background worker. The worker asks a [`ReverseGeocoder`]
//! (normally [`NominatimClient`]) for the nearest place name and sends the
//! [`Resolution`] back for the UI thread to pick up.

// Internal modules
mod bridge;
mod config;
mod coordinate;
mod error;
mod geocoding;
mod throttle;

// Re-export public types
pub use bridge::{Bridge, MapClick, Resolution};
pub use config::{MapConfig, PinpointConfig, ResolverConfig};
pub use coordinate::{Coordinate, MAX_MERCATOR_LATITUDE};
pub use error::{CoordinateError, ResolveError};
pub use geocoding::{extract_place_name, NominatimClient, ReverseGeocoder, NO_PLACE_NAME};
pub use throttle::Throttle;
