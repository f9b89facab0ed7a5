use std::time::Duration;

/// Public Nominatim reverse geocoding endpoint
const NOMINATIM_REVERSE_URL: &str = "https://nominatim.openstreetmap.org/reverse";

/// Standard OpenStreetMap raster tile server
const OSM_TILE_URL: &str = "https://tile.openstreetmap.org/{z}/{x}/{y}.png";

/// Build the User-Agent with version and contact.
/// Nominatim and the OSM tile servers reject anonymous clients.
fn default_user_agent() -> String {
    format!(
        "Pinpoint/{} (https://github.com/pinpoint-maps/pinpoint; maps@pinpoint.dev)",
        env!("CARGO_PKG_VERSION")
    )
}

/// Configuration for the reverse geocoding client
#[derive(Debug, Clone)]
pub struct ResolverConfig {
    /// Full URL of the `/reverse` endpoint
    pub endpoint: String,
    /// Sent with every request
    pub user_agent: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Nominatim detail level; 10 is city level
    pub zoom: u8,
    /// Minimum spacing between two requests (Nominatim allows 1 per second)
    pub min_interval: Duration,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            endpoint: NOMINATIM_REVERSE_URL.to_string(),
            user_agent: default_user_agent(),
            timeout: Duration::from_secs(10),
            zoom: 10,
            min_interval: Duration::from_secs(1),
        }
    }
}

/// Configuration for the map surface
#[derive(Debug, Clone)]
pub struct MapConfig {
    /// Tile URL template with `{z}`, `{x}` and `{y}` placeholders
    pub tile_url: String,
    /// Sent with every tile request
    pub user_agent: String,
    /// Initial view center as (latitude, longitude)
    pub center: (f64, f64),
    /// Initial zoom level
    pub zoom: u8,
    pub min_zoom: u8,
    pub max_zoom: u8,
    /// Number of background tile download threads
    pub tile_workers: usize,
    /// Upper bound on tiles kept as textures
    pub max_cached_tiles: usize,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            tile_url: OSM_TILE_URL.to_string(),
            user_agent: default_user_agent(),
            center: (34.26, 108.95),
            zoom: 13,
            min_zoom: 2,
            max_zoom: 18,
            tile_workers: 2,
            max_cached_tiles: 256,
        }
    }
}

impl MapConfig {
    /// Expand the tile URL template for one tile
    pub fn tile_url_for(&self, z: u8, x: u32, y: u32) -> String {
        self.tile_url
            .replace("{z}", &z.to_string())
            .replace("{x}", &x.to_string())
            .replace("{y}", &y.to_string())
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Default)]
pub struct PinpointConfig {
    pub resolver: ResolverConfig,
    pub map: MapConfig,
}
