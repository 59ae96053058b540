//! Geographic coordinate type and the great-circle distance engine.
//!
//! All distances in this workspace are **metres**.  The source datasets mix
//! kilometre- and metre-radius haversine variants; every function here uses
//! [`EARTH_RADIUS_M`] and says so in its signature, so there is exactly one
//! unit convention to migrate to.

use crate::{NavError, NavResult};

/// Mean Earth radius in metres, shared by every distance computation.
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// A WGS-84 geographic coordinate in double precision, with an optional
/// altitude in metres.
///
/// Altitude is carried for consumers that render elevation profiles; the
/// distance engine ignores it (great-circle distance is 2-D).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeoPoint {
    pub lat: f64,
    pub lon: f64,
    pub alt: Option<f64>,
}

impl GeoPoint {
    #[inline]
    pub fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon, alt: None }
    }

    #[inline]
    pub fn with_alt(lat: f64, lon: f64, alt: f64) -> Self {
        Self { lat, lon, alt: Some(alt) }
    }

    /// Check that the coordinate is finite and inside the WGS-84 envelope:
    /// latitude in [-90, 90], longitude in [-180, 180].
    ///
    /// # Errors
    ///
    /// Returns [`NavError::InvalidLocation`] carrying the offending values.
    pub fn validate(self) -> NavResult<()> {
        let in_range = self.lat.is_finite()
            && self.lon.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lon);
        if in_range {
            Ok(())
        } else {
            Err(NavError::InvalidLocation { lat: self.lat, lon: self.lon })
        }
    }
}

impl std::fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:.6}, {:.6})", self.lat, self.lon)
    }
}

/// Haversine great-circle distance between two coordinates, in metres.
///
/// Symmetric, and zero for identical inputs.  Out-of-range but finite
/// coordinates are accepted (the formula is total over finite values);
/// range enforcement belongs to [`GeoPoint::validate`].
///
/// # Errors
///
/// Returns [`NavError::InvalidData`] if any latitude or longitude is NaN or
/// infinite — a malformed coordinate must surface as an error, never as a
/// silently propagated NaN distance.
pub fn haversine_m(a: GeoPoint, b: GeoPoint) -> NavResult<f64> {
    if !(a.lat.is_finite() && a.lon.is_finite() && b.lat.is_finite() && b.lon.is_finite()) {
        return Err(NavError::InvalidData(format!(
            "non-finite coordinate in distance input: {a} → {b}"
        )));
    }

    let d_lat = (b.lat - a.lat).to_radians();
    let d_lon = (b.lon - a.lon).to_radians();

    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat * 0.5).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon * 0.5).sin().powi(2);

    let c = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());
    Ok(EARTH_RADIUS_M * c)
}

/// Cumulative [`haversine_m`] length of a point sequence, in metres.
///
/// Sequences with fewer than 2 points have no extent and yield `Ok(0.0)`.
///
/// # Errors
///
/// Returns [`NavError::InvalidData`] if any consecutive pair contains a
/// non-finite coordinate.
pub fn path_length_m(points: &[GeoPoint]) -> NavResult<f64> {
    let mut total = 0.0;
    for pair in points.windows(2) {
        total += haversine_m(pair[0], pair[1])?;
    }
    Ok(total)
}
