use crate::error::CoordinateError;
use std::fmt;

/// Highest latitude a Web Mercator map can show
pub const MAX_MERCATOR_LATITUDE: f64 = 85.051_128_78;

/// A clicked point on the map, in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    latitude: f64,
    longitude: f64,
}

impl Coordinate {
    /// Validate and build a coordinate
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        if !(-90.0..=90.0).contains(&latitude) {
            return Err(CoordinateError::LatitudeOutOfRange(latitude));
        }
        if !(-180.0..=180.0).contains(&longitude) {
            return Err(CoordinateError::LongitudeOutOfRange(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Build a coordinate from a point on a map that may have been panned
    /// across the antimeridian or past the poles.
    ///
    /// Longitude is wrapped into [-180, 180] and latitude is clamped to the
    /// Mercator limit.
    pub fn from_map_point(latitude: f64, longitude: f64) -> Result<Self, CoordinateError> {
        if !latitude.is_finite() || !longitude.is_finite() {
            return Err(CoordinateError::NotFinite);
        }
        let latitude = latitude.clamp(-MAX_MERCATOR_LATITUDE, MAX_MERCATOR_LATITUDE);
        Self::new(latitude, wrap_longitude(longitude))
    }

    pub fn latitude(&self) -> f64 {
        self.latitude
    }

    pub fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.6}, {:.6}", self.latitude, self.longitude)
    }
}

/// Wrap any longitude into [-180, 180]
fn wrap_longitude(lon: f64) -> f64 {
    if (-180.0..=180.0).contains(&lon) {
        return lon;
    }
    (lon + 180.0).rem_euclid(360.0) - 180.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_valid_ranges() {
        assert!(Coordinate::new(34.26, 108.95).is_ok());
        assert!(Coordinate::new(-90.0, -180.0).is_ok());
        assert!(Coordinate::new(90.0, 180.0).is_ok());
    }

    #[test]
    fn test_rejects_out_of_range() {
        assert_eq!(
            Coordinate::new(91.0, 0.0),
            Err(CoordinateError::LatitudeOutOfRange(91.0))
        );
        assert_eq!(
            Coordinate::new(0.0, -180.5),
            Err(CoordinateError::LongitudeOutOfRange(-180.5))
        );
        assert_eq!(Coordinate::new(f64::NAN, 0.0), Err(CoordinateError::NotFinite));
        assert_eq!(
            Coordinate::new(0.0, f64::INFINITY),
            Err(CoordinateError::NotFinite)
        );
    }

    #[test]
    fn test_from_map_point_wraps_and_clamps() {
        let c = Coordinate::from_map_point(89.9, 190.0).unwrap();
        assert_eq!(c.latitude(), MAX_MERCATOR_LATITUDE);
        assert!((c.longitude() - -170.0).abs() < 1e-9);

        let c = Coordinate::from_map_point(-10.0, -200.0).unwrap();
        assert!((c.longitude() - 160.0).abs() < 1e-9);

        let c = Coordinate::from_map_point(10.0, 540.0).unwrap();
        assert_eq!(c.longitude(), -180.0);
    }

    #[test]
    fn test_display_uses_six_decimals() {
        let c = Coordinate::new(34.26, 108.95).unwrap();
        assert_eq!(c.to_string(), "34.260000, 108.950000");
    }
}
