//! Geodetic helpers for leg geometry.
//!
//! Leg shapes arrive as encoded polylines. For distance comparisons the
//! navigator projects them into a local east-north-up frame anchored at the
//! start of the trip, where a metre is a metre in every direction.

use geo_types::LineString;

use crate::domain::Leg;

/// WGS-84 semi-major axis in metres.
const WGS84_A: f64 = 6_378_137.0;

/// WGS-84 first eccentricity squared.
const WGS84_E2: f64 = 6.694_379_990_14e-3;

/// Mean earth radius for great-circle distances.
const EARTH_RADIUS_M: f64 = 6_371_008.8;

/// Polyline precision used by the planner.
const POLYLINE_PRECISION: u32 = 5;

/// Error decoding leg geometry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GeometryError {
    /// The polyline string is malformed
    #[error("invalid polyline: {0}")]
    Decode(String),

    /// A leg's polyline is malformed
    #[error("invalid geometry on leg {index}: {reason}")]
    InvalidLegGeometry { index: usize, reason: String },
}

/// A WGS-84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }
}

/// Earth-centred, earth-fixed coordinate in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ecef {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

/// Local east-north-up coordinate in metres.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Enu {
    pub east: f64,
    pub north: f64,
    pub up: f64,
}

impl Enu {
    /// Straight-line distance from another point in the same frame.
    pub fn distance_to(&self, other: &Enu) -> f64 {
        let (de, dn, du) = (
            self.east - other.east,
            self.north - other.north,
            self.up - other.up,
        );
        (de * de + dn * dn + du * du).sqrt()
    }
}

/// Convert a coordinate on the ellipsoid surface to ECEF.
pub fn geodetic_to_ecef(point: LatLon) -> Ecef {
    let (lat, lon) = (point.lat.to_radians(), point.lon.to_radians());
    let (sin_lat, cos_lat) = lat.sin_cos();
    let (sin_lon, cos_lon) = lon.sin_cos();
    let n = WGS84_A / (1.0 - WGS84_E2 * sin_lat * sin_lat).sqrt();

    Ecef {
        x: n * cos_lat * cos_lon,
        y: n * cos_lat * sin_lon,
        z: n * (1.0 - WGS84_E2) * sin_lat,
    }
}

/// A local tangent frame anchored at one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    origin: LatLon,
    origin_ecef: Ecef,
}

impl LocalFrame {
    /// Create a frame whose origin is `origin`.
    pub fn new(origin: LatLon) -> Self {
        Self {
            origin,
            origin_ecef: geodetic_to_ecef(origin),
        }
    }

    /// The origin in degrees.
    pub fn origin(&self) -> LatLon {
        self.origin
    }

    /// The origin in ECEF.
    pub fn origin_ecef(&self) -> Ecef {
        self.origin_ecef
    }

    /// Project a coordinate into this frame.
    pub fn to_enu(&self, point: LatLon) -> Enu {
        geodetic_to_enu(point, self.origin, self.origin_ecef)
    }
}

/// East/north/up metres of `point` relative to `origin`.
///
/// `origin_ecef` must be `geodetic_to_ecef(origin)`; [`LocalFrame`] caches it.
pub fn geodetic_to_enu(point: LatLon, origin: LatLon, origin_ecef: Ecef) -> Enu {
    let p = geodetic_to_ecef(point);
    let (dx, dy, dz) = (
        p.x - origin_ecef.x,
        p.y - origin_ecef.y,
        p.z - origin_ecef.z,
    );
    let (sin_lat, cos_lat) = origin.lat.to_radians().sin_cos();
    let (sin_lon, cos_lon) = origin.lon.to_radians().sin_cos();

    Enu {
        east: -sin_lon * dx + cos_lon * dy,
        north: -sin_lat * cos_lon * dx - sin_lat * sin_lon * dy + cos_lat * dz,
        up: cos_lat * cos_lon * dx + cos_lat * sin_lon * dy + sin_lat * dz,
    }
}

/// Decode a precision-5 encoded polyline.
pub fn decode_polyline(encoded: &str) -> Result<Vec<LatLon>, GeometryError> {
    let line: LineString<f64> = polyline::decode_polyline(encoded, POLYLINE_PRECISION)
        .map_err(|e| GeometryError::Decode(e.to_string()))?;

    Ok(line.coords().map(|c| LatLon::new(c.y, c.x)).collect())
}

/// Great-circle distance in metres.
pub fn haversine_distance(a: LatLon, b: LatLon) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let d_lat = lat2 - lat1;
    let d_lon = (b.lon - a.lon).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

/// Decode every leg's polyline and project it into `frame`.
///
/// Returns one planar polyline per leg, in leg order.
pub fn project_legs(legs: &[Leg], frame: &LocalFrame) -> Result<Vec<Vec<Enu>>, GeometryError> {
    legs.iter()
        .enumerate()
        .map(|(index, leg)| {
            let points = decode_polyline(&leg.geometry).map_err(|e| {
                GeometryError::InvalidLegGeometry {
                    index,
                    reason: e.to_string(),
                }
            })?;
            Ok(points.into_iter().map(|p| frame.to_enu(p)).collect())
        })
        .collect()
}
