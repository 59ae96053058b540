//! `nav-planner` — safety-aware route planning.
//!
//! Consumes routes produced by an external route calculator, queries an
//! external accident-statistics service for dangerous segments, and ranks
//! base and avoidance routes by a safety score.  All external services are
//! injected collaborator traits, so tests substitute doubles and no global
//! state exists anywhere.
//!
//! # Crate layout
//!
//! | Module            | Contents                                             |
//! |-------------------|------------------------------------------------------|
//! | [`route`]         | `Route`, `RankedResult`, `SafetyAssessment`          |
//! | [`collaborators`] | `RouteCalculator`, `SafetyData`, `SafetyScorer`      |
//! | [`planner`]       | `SafeRoutePlanner`, `SafetyReadiness`                |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                       |
//! |---------|--------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public data types.      |

pub mod collaborators;
pub mod planner;
pub mod route;

#[cfg(test)]
mod tests;

pub use collaborators::{NoopSafetyData, RouteCalculator, SafetyData, SafetyScorer};
pub use planner::{SafeRoutePlanner, SafetyReadiness, MAX_DETOUR_RATIO};
pub use route::{
    RankedResult, Route, RouteGeometry, RouteLeg, RouteOptions, SafetyAssessment, SafetyFactor,
};
