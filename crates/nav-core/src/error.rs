//! Shared error type for the navigation workspace.
//!
//! `nav-graph` and `nav-planner` both report failures through `NavError`
//! rather than defining their own enums: the taxonomy below is the contract
//! callers dispatch on, and keeping it in one place means a planner can
//! surface an ingestion failure without a conversion layer.

use thiserror::Error;

/// The error taxonomy of the navigation subsystem.
#[derive(Debug, Error)]
pub enum NavError {
    /// A start/end coordinate is malformed (non-finite or out of range).
    #[error("invalid location: lat {lat}, lon {lon}")]
    InvalidLocation { lat: f64, lon: f64 },

    /// Malformed input data: an unusable route shape, an unsupported file
    /// type, a bundle without a geometry member, a non-finite coordinate
    /// reaching the distance engine.
    #[error("invalid data: {0}")]
    InvalidData(String),

    /// The external route calculator failed to produce a route.
    #[error("route calculation failed: {0}")]
    RouteCalculationFailed(String),

    /// The safety-data collaborator is unavailable or errored.
    #[error("safety data error: {0}")]
    SafetyDataError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Shorthand result type for all `nav-*` crates.
pub type NavResult<T> = Result<T, NavError>;
