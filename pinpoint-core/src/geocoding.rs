use crate::config::ResolverConfig;
use crate::coordinate::Coordinate;
use crate::error::ResolveError;
use serde::Deserialize;
use serde_json::{Map, Value};
use std::time::Duration;

/// Shown when a lookup succeeds but the address carries no usable name
pub const NO_PLACE_NAME: &str = "no place name available";

/// Address keys tried in order; the first non-empty one wins
const PLACE_KEYS: [&str; 4] = ["city", "town", "village", "locality"];

/// Anything that can turn a coordinate into a place name
pub trait ReverseGeocoder {
    /// Look up one coordinate. `Ok(None)` means the service answered but
    /// had no place name for it.
    fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, ResolveError>;

    /// Minimum spacing the service asks for between two requests
    fn min_interval(&self) -> Duration {
        Duration::ZERO
    }
}

/// Nominatim `/reverse` response (only the parts we read)
#[derive(Debug, Deserialize)]
struct ReverseResponse {
    #[serde(default)]
    address: Map<String, Value>,
    error: Option<String>,
}

/// Blocking client for the Nominatim reverse geocoding API
pub struct NominatimClient {
    client: reqwest::blocking::Client,
    config: ResolverConfig,
}

impl NominatimClient {
    pub fn new(config: ResolverConfig) -> Result<Self, ResolveError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout)
            .build()
            .map_err(ResolveError::Client)?;

        Ok(Self { client, config })
    }
}

impl ReverseGeocoder for NominatimClient {
    fn reverse(&self, coordinate: Coordinate) -> Result<Option<String>, ResolveError> {
        log::debug!("Geocoding {} via {}", coordinate, self.config.endpoint);

        let response = self
            .client
            .get(&self.config.endpoint)
            .query(&[
                ("format", "json".to_string()),
                ("lat", coordinate.latitude().to_string()),
                ("lon", coordinate.longitude().to_string()),
                ("zoom", self.config.zoom.to_string()),
                ("addressdetails", "1".to_string()),
            ])
            .send()
            .map_err(ResolveError::from_transport)?;

        let status = response.status();
        if !status.is_success() {
            return Err(ResolveError::Status(status.as_u16()));
        }

        let body = response.text().map_err(ResolveError::from_transport)?;
        log::debug!("Nominatim response: {}", body);

        Ok(extract_place_name(&body))
    }

    fn min_interval(&self) -> Duration {
        self.config.min_interval
    }
}

/// Pull the best place name out of a raw Nominatim response body.
///
/// Bodies that are not the expected shape yield `None`, the same as an
/// address without any of the known keys.
pub fn extract_place_name(body: &str) -> Option<String> {
    let response: ReverseResponse = match serde_json::from_str(body) {
        Ok(response) => response,
        Err(e) => {
            log::warn!("Unexpected geocoding response shape: {}", e);
            return None;
        }
    };

    if let Some(error) = &response.error {
        log::warn!("Geocoding service reported: {}", error);
        return None;
    }

    place_from_address(&response.address)
}

fn place_from_address(address: &Map<String, Value>) -> Option<String> {
    PLACE_KEYS
        .iter()
        .filter_map(|key| address.get(*key).and_then(Value::as_str))
        .find(|name| !name.is_empty())
        .map(str::to_string)
}
