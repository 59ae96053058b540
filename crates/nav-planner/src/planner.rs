//! The safety-aware route planner.
//!
//! One planning request flows: validate coordinates → (first request only)
//! initialize safety data → compute the base route → query flagged
//! segments → optionally request an avoidance route → compare scores →
//! ranked result.  Degradation is graceful at every optional step: a
//! planner without safety data still answers every request with a usable
//! route, and a scoring failure substitutes the neutral score instead of
//! failing the request.

use std::collections::HashSet;
use std::sync::OnceLock;

use log::{debug, warn};
use rayon::prelude::*;

use nav_core::{GeoPoint, NavResult};

use crate::collaborators::{RouteCalculator, SafetyData, SafetyScorer};
use crate::route::{RankedResult, Route, RouteOptions, SafetyAssessment};

/// An avoidance route may exceed the base route's distance or estimated
/// time by at most 30 % before it is discarded as not worth the detour.
pub const MAX_DETOUR_RATIO: f64 = 1.3;

// ── Readiness ─────────────────────────────────────────────────────────────────

/// Tri-state readiness of the safety-data collaborator.
///
/// Set exactly once, on the first planning request; read-only afterwards.
/// `DegradedReady` means initialization failed and the planner keeps
/// serving requests without safety ranking.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SafetyReadiness {
    NotReady,
    DegradedReady,
    Ready,
}

// ── SafeRoutePlanner ──────────────────────────────────────────────────────────

/// Plans routes and ranks them by safety.
///
/// All collaborators are injected at construction so tests substitute
/// doubles; the planner itself holds no mutable request state and can be
/// shared freely across threads.
///
/// # Example
///
/// ```rust,ignore
/// let planner = SafeRoutePlanner::new(calculator, safety_data, scorer)
///     .with_api_key("…");
/// let ranked = planner.find_safe_route(start, end, &RouteOptions::default())?;
/// drive(ranked.safer);
/// ```
pub struct SafeRoutePlanner<C: RouteCalculator, D: SafetyData, S: SafetyScorer> {
    calculator: C,
    safety_data: D,
    scorer: S,
    api_key: Option<String>,
    readiness: OnceLock<SafetyReadiness>,
}

impl<C: RouteCalculator, D: SafetyData, S: SafetyScorer> SafeRoutePlanner<C, D, S> {
    pub fn new(calculator: C, safety_data: D, scorer: S) -> Self {
        Self {
            calculator,
            safety_data,
            scorer,
            api_key: None,
            readiness: OnceLock::new(),
        }
    }

    /// API key forwarded to [`SafetyData::initialize`].
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Current readiness; `NotReady` until the first planning request.
    pub fn readiness(&self) -> SafetyReadiness {
        self.readiness
            .get()
            .copied()
            .unwrap_or(SafetyReadiness::NotReady)
    }

    // ── Planning ──────────────────────────────────────────────────────────

    /// Plan from `start` to `end`, ranking the base route against an
    /// avoidance route when accident-prone segments are involved.
    ///
    /// # Errors
    ///
    /// - [`NavError::InvalidLocation`](nav_core::NavError) for malformed
    ///   coordinates.
    /// - [`NavError::InvalidData`](nav_core::NavError) when the base route
    ///   carries no usable geometry.
    /// - Calculator failures propagate as-is; safety-data initialization
    ///   failures do **not** (degraded mode).
    pub fn find_safe_route(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        options: &RouteOptions,
    ) -> NavResult<RankedResult> {
        start.validate()?;
        end.validate()?;

        self.ensure_initialized();

        debug!("computing main route {start} → {end}");
        let base = self.calculator.calculate(start, end, options)?;

        if !self.safety_data.is_data_loaded() {
            debug!("safety data not loaded; returning the main route unscored");
            return Ok(single(base));
        }

        // Unsupported geometry must surface before any safety work.
        let base_points = base.points()?;

        let flagged: HashSet<String> = base
            .segment_ids()
            .into_iter()
            .filter(|id| self.safety_data.is_accident_prone(id))
            .map(str::to_owned)
            .collect();

        if flagged.is_empty() {
            debug!("no accident-prone segments on the main route");
            return Ok(single(self.score_with(base, &base_points)));
        }

        debug!(
            "{} accident-prone segment(s) on the main route; requesting avoidance route",
            flagged.len()
        );
        let alternate = self
            .calculator
            .calculate_avoiding(start, end, &flagged, options)?;

        let Some(alternate) = alternate else {
            debug!("no avoidance route available; keeping the main route");
            return Ok(single(self.score_with(base, &base_points)));
        };

        if exceeds_detour_bound(&base, &alternate) {
            debug!("avoidance route exceeds the detour bound; keeping the main route");
            return Ok(single(self.score_with(base, &base_points)));
        }

        let main = self.score_with(base, &base_points);
        let alternative = self.score_route(alternate);

        // The base route wins ties: only a strictly safer alternate is
        // promoted.
        let safer = if score_of(&alternative) > score_of(&main) {
            alternative.clone()
        } else {
            main.clone()
        };

        Ok(RankedResult { main, alternative: Some(alternative), safer })
    }

    /// Score each route independently and return them sorted by descending
    /// safety score.
    ///
    /// Per-route scoring failures substitute the neutral score so one bad
    /// data point cannot fail the whole ranking.  A single-element input is
    /// returned unchanged, unscored.
    pub fn rank_by_safety(&self, routes: Vec<Route>) -> Vec<Route> {
        if routes.len() < 2 {
            return routes;
        }

        let mut scored: Vec<Route> = routes
            .into_par_iter()
            .map(|route| self.score_route(route))
            .collect();

        scored.sort_by(|a, b| score_of(b).total_cmp(&score_of(a)));
        scored
    }

    // ── Internals ─────────────────────────────────────────────────────────

    /// Initialize the safety-data collaborator exactly once, degrading on
    /// failure instead of aborting the request.
    fn ensure_initialized(&self) -> SafetyReadiness {
        *self.readiness.get_or_init(|| {
            match self.safety_data.initialize(self.api_key.as_deref()) {
                Ok(true) => SafetyReadiness::Ready,
                Ok(false) => {
                    warn!("safety data did not initialize; continuing without safety ranking");
                    SafetyReadiness::DegradedReady
                }
                Err(e) => {
                    warn!("safety data initialization failed: {e}; continuing without safety ranking");
                    SafetyReadiness::DegradedReady
                }
            }
        })
    }

    /// Score a route given its already-extracted point sequence.
    fn score_with(&self, route: Route, points: &[GeoPoint]) -> Route {
        let assessment = self.scorer.route_safety_score(points).unwrap_or_else(|e| {
            warn!("route scoring failed ({e}); substituting the neutral score");
            SafetyAssessment::neutral()
        });
        route.with_safety(assessment)
    }

    /// Score a route, extracting its points first; any failure substitutes
    /// the neutral score.
    fn score_route(&self, route: Route) -> Route {
        let assessment = route
            .points()
            .and_then(|points| self.scorer.route_safety_score(&points))
            .unwrap_or_else(|e| {
                warn!("route scoring failed ({e}); substituting the neutral score");
                SafetyAssessment::neutral()
            });
        route.with_safety(assessment)
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

/// A result carrying one route as both main and safer choice.
fn single(route: Route) -> RankedResult {
    RankedResult { main: route.clone(), alternative: None, safer: route }
}

fn score_of(route: &Route) -> f64 {
    route.safety_score().unwrap_or(SafetyAssessment::NEUTRAL)
}

/// Whether the alternate's distance or estimated time exceeds the base's by
/// more than [`MAX_DETOUR_RATIO`].
fn exceeds_detour_bound(base: &Route, alternate: &Route) -> bool {
    if base.distance_m > 0.0 && alternate.distance_m > base.distance_m * MAX_DETOUR_RATIO {
        return true;
    }
    if let (Some(base_secs), Some(alt_secs)) =
        (base.estimated_time_secs, alternate.estimated_time_secs)
    {
        if base_secs > 0.0 && alt_secs > base_secs * MAX_DETOUR_RATIO {
            return true;
        }
    }
    false
}
