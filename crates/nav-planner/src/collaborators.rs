//! External collaborator traits.
//!
//! The planner owns none of the heavy machinery: route computation, the
//! accident-statistics store, and safety scoring are all external services
//! reached through these traits.  Implementations must be `Send + Sync` so
//! planning requests can run as independent tasks sharing one planner.
//!
//! A failing collaborator call propagates once, with context, to the
//! caller; the planner performs no retries, caching, or locking on their
//! behalf.

use std::collections::HashSet;

use nav_core::{GeoPoint, NavResult};

use crate::route::{Route, RouteOptions, SafetyAssessment};

/// The external turn-by-turn route calculator.
pub trait RouteCalculator: Send + Sync {
    /// Compute the base route between two coordinates.
    fn calculate(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        options: &RouteOptions,
    ) -> NavResult<Route>;

    /// Compute a route that avoids the given segment ids, or `None` when no
    /// such route exists.
    fn calculate_avoiding(
        &self,
        start: GeoPoint,
        end: GeoPoint,
        avoid: &HashSet<String>,
        options: &RouteOptions,
    ) -> NavResult<Option<Route>>;
}

/// The external accident-statistics store.
pub trait SafetyData: Send + Sync {
    /// Bring the store up, optionally authenticating with an API key.
    /// `Ok(true)` means fully ready; `Ok(false)` or an error means the
    /// planner continues in degraded mode.
    fn initialize(&self, api_key: Option<&str>) -> NavResult<bool>;

    /// Whether the statistics dataset has been loaded.  Read-only; the one
    /// piece of shared state concurrent planning requests observe.
    fn is_data_loaded(&self) -> bool;

    /// Whether a segment is flagged as accident-prone.
    fn is_accident_prone(&self, segment_id: &str) -> bool;
}

/// The external safety-scoring service.
pub trait SafetyScorer: Send + Sync {
    /// Score a route's point sequence, 0 (dangerous) to 100 (safe).
    fn route_safety_score(&self, points: &[GeoPoint]) -> NavResult<SafetyAssessment>;
}

/// A [`SafetyData`] that never loads.
///
/// Useful as a placeholder in tests and in deployments without an
/// accident-statistics source: every request falls through to the unscored
/// base route.
pub struct NoopSafetyData;

impl SafetyData for NoopSafetyData {
    fn initialize(&self, _api_key: Option<&str>) -> NavResult<bool> {
        Ok(false)
    }

    fn is_data_loaded(&self) -> bool {
        false
    }

    fn is_accident_prone(&self, _segment_id: &str) -> bool {
        false
    }
}
