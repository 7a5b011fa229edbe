//! Great-circle distance between field sites and collectors.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Sentinel distance for comparisons where either side has no usable
/// location. Sorts after every real distance on Earth.
pub const UNKNOWN_DISTANCE_KM: f64 = 999_999.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// A pair is usable only when both components are finite, in range, and
    /// not both exactly zero. Mobile clients report `(0,0)` when the device
    /// has no fix, so it means "unknown", not a point in the Gulf of Guinea.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
            && !(self.latitude == 0.0 && self.longitude == 0.0)
    }
}

/// Haversine distance in kilometers. Symmetric, zero for identical points.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2)
        + a.latitude.to_radians().cos()
            * b.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().atan2((1.0 - h).sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;

    const KHARTOUM: Coordinates = Coordinates {
        latitude: 15.5007,
        longitude: 32.5599,
    };
    const PORT_SUDAN: Coordinates = Coordinates {
        latitude: 19.6158,
        longitude: 37.2164,
    };

    #[test]
    fn identical_points_are_zero() {
        assert_eq!(distance_km(KHARTOUM, KHARTOUM), 0.0);
    }

    #[test]
    fn symmetric() {
        assert_eq!(
            distance_km(KHARTOUM, PORT_SUDAN),
            distance_km(PORT_SUDAN, KHARTOUM)
        );
    }

    #[test]
    fn one_degree_along_equator() {
        let a = Coordinates::new(0.0, 1.0);
        let b = Coordinates::new(0.0, 2.0);
        let d = distance_km(a, b);
        // One degree of longitude at the equator is ~111.19 km.
        assert!((d - 111.19).abs() < 0.1, "got {d}");
    }

    #[test]
    fn khartoum_to_port_sudan_is_plausible() {
        let d = distance_km(KHARTOUM, PORT_SUDAN);
        assert!((600.0..750.0).contains(&d), "got {d}");
    }

    #[test]
    fn origin_sentinel_is_invalid() {
        assert!(!Coordinates::new(0.0, 0.0).is_valid());
        assert!(Coordinates::new(0.0, 0.1).is_valid());
        assert!(KHARTOUM.is_valid());
    }

    #[test]
    fn out_of_range_is_invalid() {
        assert!(!Coordinates::new(91.0, 0.0).is_valid());
        assert!(!Coordinates::new(0.0, 181.0).is_valid());
        assert!(!Coordinates::new(f64::NAN, 10.0).is_valid());
        assert!(!Coordinates::new(10.0, f64::INFINITY).is_valid());
    }
}
