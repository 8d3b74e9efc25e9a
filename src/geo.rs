//! Great-circle math on latitude/longitude pairs.
//!
//! Everything here is pure and total. Malformed input (NaN coordinates) is not
//! rejected: it propagates as NaN through [`distance_meters`] and
//! [`bearing_degrees`], and [`sector_of`] turns a non-finite bearing into
//! `None`. Rejecting bad records is the loader's job.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by the haversine formula.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Angular width of one compass sector.
pub const SECTOR_WIDTH_DEG: f64 = 22.5;

/// Number of compass sectors in the directional histogram.
pub const SECTOR_COUNT: usize = 16;

/// A single point of the race course, in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RoutePoint {
    #[serde(alias = "lat")]
    pub latitude: f64,
    #[serde(alias = "lon", alias = "lng")]
    pub longitude: f64,
}

impl RoutePoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// One of the 16 compass sectors, in clockwise order starting at north.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sector {
    N,
    NNE,
    NE,
    ENE,
    E,
    ESE,
    SE,
    SSE,
    S,
    SSW,
    SW,
    WSW,
    W,
    WNW,
    NW,
    NNW,
}

impl Sector {
    /// All sectors in index order (0 = N, 15 = NNW).
    pub const ALL: [Sector; SECTOR_COUNT] = [
        Sector::N,
        Sector::NNE,
        Sector::NE,
        Sector::ENE,
        Sector::E,
        Sector::ESE,
        Sector::SE,
        Sector::SSE,
        Sector::S,
        Sector::SSW,
        Sector::SW,
        Sector::WSW,
        Sector::W,
        Sector::WNW,
        Sector::NW,
        Sector::NNW,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    /// Sector for an index; wraps modulo 16.
    pub fn from_index(index: usize) -> Self {
        Self::ALL[index % SECTOR_COUNT]
    }

    pub fn label(self) -> &'static str {
        match self {
            Sector::N => "N",
            Sector::NNE => "NNE",
            Sector::NE => "NE",
            Sector::ENE => "ENE",
            Sector::E => "E",
            Sector::ESE => "ESE",
            Sector::SE => "SE",
            Sector::SSE => "SSE",
            Sector::S => "S",
            Sector::SSW => "SSW",
            Sector::SW => "SW",
            Sector::WSW => "WSW",
            Sector::W => "W",
            Sector::WNW => "WNW",
            Sector::NW => "NW",
            Sector::NNW => "NNW",
        }
    }

    /// Centre bearing of the sector: `index * 22.5`.
    pub fn nominal_bearing(self) -> f64 {
        self.index() as f64 * SECTOR_WIDTH_DEG
    }
}

impl std::fmt::Display for Sector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Haversine distance between two points in meters.
pub fn distance_meters(a: &RoutePoint, b: &RoutePoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Initial bearing from `a` to `b`, normalised to `[0, 360)`.
pub fn bearing_degrees(a: &RoutePoint, b: &RoutePoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let y = d_lon.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * d_lon.cos();

    normalize_bearing(y.atan2(x).to_degrees())
}

/// Wraps any angle into `[0, 360)`. NaN stays NaN.
pub fn normalize_bearing(degrees: f64) -> f64 {
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can land on 360.0 for tiny negative inputs
    if wrapped >= 360.0 { 0.0 } else { wrapped }
}

/// Buckets a bearing into one of the 16 sectors using
/// `round(bearing / 22.5) mod 16`, rounding halves upwards.
///
/// Returns `None` when the bearing is not finite.
pub fn sector_of(bearing: f64) -> Option<Sector> {
    if !bearing.is_finite() {
        return None;
    }
    let step = (bearing / SECTOR_WIDTH_DEG + 0.5).floor() as i64;
    Some(Sector::from_index(step.rem_euclid(SECTOR_COUNT as i64) as usize))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pt(lat: f64, lon: f64) -> RoutePoint {
        RoutePoint::new(lat, lon)
    }

    #[test]
    fn test_distance_same_point_is_zero() {
        let a = pt(37.885, -122.059);
        assert_eq!(distance_meters(&a, &a), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = pt(37.885, -122.059);
        let b = pt(37.881, -121.914);
        assert_eq!(distance_meters(&a, &b), distance_meters(&b, &a));
    }

    #[test]
    fn test_distance_one_degree_of_latitude() {
        let d = distance_meters(&pt(0.0, 0.0), &pt(1.0, 0.0));
        // pi * R / 180
        assert!((d - 111_194.93).abs() < 1.0, "got {d}");
    }

    #[test]
    fn test_bearing_cardinal_directions() {
        let origin = pt(0.0, 0.0);
        assert!((bearing_degrees(&origin, &pt(1.0, 0.0)) - 0.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &pt(0.0, 1.0)) - 90.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &pt(-1.0, 0.0)) - 180.0).abs() < 1e-9);
        assert!((bearing_degrees(&origin, &pt(0.0, -1.0)) - 270.0).abs() < 1e-9);
    }

    #[test]
    fn test_bearing_is_normalised() {
        let b = bearing_degrees(&pt(10.0, 10.0), &pt(9.0, 9.0));
        assert!((0.0..360.0).contains(&b));
    }

    #[test]
    fn test_nan_propagates() {
        let a = pt(f64::NAN, 0.0);
        let b = pt(1.0, 1.0);
        assert!(distance_meters(&a, &b).is_nan());
        assert!(bearing_degrees(&a, &b).is_nan());
        assert_eq!(sector_of(f64::NAN), None);
    }

    #[test]
    fn test_sector_boundaries() {
        assert_eq!(sector_of(0.0), Some(Sector::N));
        assert_eq!(sector_of(11.24), Some(Sector::N));
        assert_eq!(sector_of(11.25), Some(Sector::NNE));
        assert_eq!(sector_of(11.26), Some(Sector::NNE));
        assert_eq!(sector_of(90.0), Some(Sector::E));
        assert_eq!(sector_of(348.74), Some(Sector::NNW));
        assert_eq!(sector_of(348.75), Some(Sector::N));
        assert_eq!(sector_of(360.0), sector_of(0.0));
    }

    #[test]
    fn test_sector_round_trip_of_nominal_bearing() {
        for sector in Sector::ALL {
            assert_eq!(sector_of(sector.nominal_bearing()), Some(sector));
        }
    }

    #[test]
    fn test_sector_labels() {
        assert_eq!(Sector::from_index(1).label(), "NNE");
        assert_eq!(Sector::from_index(17), Sector::NNE);
        assert_eq!(Sector::WSW.to_string(), "WSW");
    }
}
