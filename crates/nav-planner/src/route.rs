//! Route values exchanged with the external calculator, and the ranked
//! result handed back to callers.
//!
//! A `Route` arrives in one of two shapes: a list of per-segment legs (the
//! calculator kept segment identity) or a flat point path (it didn't).  The
//! planner reads geometry through [`Route::points`] and never mutates it;
//! scoring attaches a [`SafetyAssessment`] beside the geometry.

use nav_core::{path_length_m, GeoPoint, NavError, NavResult};

// ── Safety assessment ─────────────────────────────────────────────────────────

/// One contributing factor of a route's safety score.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyFactor {
    pub label: String,
    /// Signed contribution to the score.
    pub impact: f64,
}

/// A scored route evaluation from the safety-scoring collaborator.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SafetyAssessment {
    /// Aggregate risk summary in [0, 100]; higher is safer.
    pub score: f64,
    pub factors: Vec<SafetyFactor>,
}

impl SafetyAssessment {
    /// The score substituted when scoring a route fails: dead centre, so a
    /// failed evaluation neither promotes nor demotes a route.
    pub const NEUTRAL: f64 = 50.0;

    pub fn neutral() -> Self {
        Self { score: Self::NEUTRAL, factors: Vec::new() }
    }

    /// Enforce the score range; non-finite scores collapse to neutral.
    pub(crate) fn clamped(mut self) -> Self {
        self.score = if self.score.is_finite() {
            self.score.clamp(0.0, 100.0)
        } else {
            Self::NEUTRAL
        };
        self
    }
}

// ── Route ─────────────────────────────────────────────────────────────────────

/// One traversed segment of a calculator route.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteLeg {
    pub segment_id: String,
    pub path: Vec<GeoPoint>,
}

/// The two geometry shapes a calculator may produce.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RouteGeometry {
    /// Ordered per-segment legs; segment ids are available for safety
    /// queries and avoidance requests.
    Segments(Vec<RouteLeg>),
    /// A flattened point path with no segment identity.
    Path(Vec<GeoPoint>),
}

/// A route produced by the external calculator and annotated here.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Route {
    pub geometry: RouteGeometry,
    /// Total length in metres, derived from the geometry.
    pub distance_m: f64,
    pub estimated_time_secs: Option<f64>,
    /// Attached by the planner; `None` until scored.
    pub safety: Option<SafetyAssessment>,
}

impl Route {
    /// Build a segment-shaped route; the distance is derived leg by leg via
    /// the distance engine.
    ///
    /// # Errors
    ///
    /// [`NavError::InvalidData`] if any leg contains a non-finite
    /// coordinate.
    pub fn from_segments(legs: Vec<RouteLeg>) -> NavResult<Route> {
        let mut distance_m = 0.0;
        for leg in &legs {
            distance_m += path_length_m(&leg.path)?;
        }
        Ok(Route {
            geometry: RouteGeometry::Segments(legs),
            distance_m,
            estimated_time_secs: None,
            safety: None,
        })
    }

    /// Build a path-shaped route from a flat point sequence.
    ///
    /// # Errors
    ///
    /// [`NavError::InvalidData`] if the path contains a non-finite
    /// coordinate.
    pub fn from_points(points: Vec<GeoPoint>) -> NavResult<Route> {
        let distance_m = path_length_m(&points)?;
        Ok(Route {
            geometry: RouteGeometry::Path(points),
            distance_m,
            estimated_time_secs: None,
            safety: None,
        })
    }

    pub fn with_estimated_time(mut self, secs: f64) -> Route {
        self.estimated_time_secs = Some(secs);
        self
    }

    /// Attach a safety assessment (clamped to [0, 100]), leaving the
    /// geometry untouched.
    pub fn with_safety(mut self, assessment: SafetyAssessment) -> Route {
        self.safety = Some(assessment.clamped());
        self
    }

    pub fn safety_score(&self) -> Option<f64> {
        self.safety.as_ref().map(|a| a.score)
    }

    /// The ordered point sequence of the route, whichever shape it arrived
    /// in.
    ///
    /// # Errors
    ///
    /// [`NavError::InvalidData`] when the route carries no usable geometry
    /// (no legs, or only empty paths); such a route cannot be scored or
    /// compared.
    pub fn points(&self) -> NavResult<Vec<GeoPoint>> {
        let points: Vec<GeoPoint> = match &self.geometry {
            RouteGeometry::Segments(legs) => {
                legs.iter().flat_map(|leg| leg.path.iter().copied()).collect()
            }
            RouteGeometry::Path(points) => points.clone(),
        };
        if points.is_empty() {
            return Err(NavError::InvalidData(
                "route has no usable geometry".to_owned(),
            ));
        }
        Ok(points)
    }

    /// Segment ids in traversal order; empty for path-shaped routes.
    pub fn segment_ids(&self) -> Vec<&str> {
        match &self.geometry {
            RouteGeometry::Segments(legs) => {
                legs.iter().map(|leg| leg.segment_id.as_str()).collect()
            }
            RouteGeometry::Path(_) => Vec::new(),
        }
    }
}

// ── Request options & ranked result ───────────────────────────────────────────

/// Caller preferences forwarded verbatim to the external calculator.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RouteOptions {
    pub avoid_tolls: bool,
    pub avoid_ferries: bool,
}

/// The outcome of one planning request — ephemeral, never persisted.
///
/// `safer` always duplicates either `main` or `alternative`; callers that
/// only want a single drivable route take `safer` and drop the rest.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RankedResult {
    pub main: Route,
    pub alternative: Option<Route>,
    pub safer: Route,
}
