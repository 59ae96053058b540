//! `nav-graph` — road graph builder.
//!
//! Ingests shapefile bundles (a loose geometry file, or a zip archive of
//! geometry + attribute files) and materializes them into a [`RoadGraph`] of
//! classified [`Node`]s and [`RoadSegment`]s.
//!
//! # Crate layout
//!
//! | Module      | Contents                                                   |
//! |-------------|------------------------------------------------------------|
//! | [`model`]   | `Node`, `RoadSegment`, `RoadClass`, `RoadGraph`            |
//! | [`attrs`]   | `Attributes`, `FieldAliases`, per-field resolution         |
//! | [`bundle`]  | Shapefile/zip bundle decoding into `Feature`s              |
//! | [`builder`] | `RoadGraphBuilder` — feature conversion and composition    |
//! | [`merge`]   | Opt-in coincident-node merge pass                          |
//!
//! # Feature flags
//!
//! | Flag    | Effect                                                         |
//! |---------|----------------------------------------------------------------|
//! | `serde` | Derives `Serialize`/`Deserialize` on public types.             |

pub mod attrs;
pub mod builder;
pub mod bundle;
pub mod merge;
pub mod model;


pub use attrs::{AttrValue, Attributes, FieldAliases};
pub use builder::{Feature, FeatureGeometry, IngestStats, RoadGraphBuilder};
pub use model::{Node, NodeKind, RoadClass, RoadGraph, RoadSegment};
