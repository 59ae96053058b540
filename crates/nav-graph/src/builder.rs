//! Feature-to-graph conversion and dataset composition.
//!
//! One builder ingests any number of bundles sequentially (road + rail +
//! POI composition), appending to its own collections; `build()` hands the
//! finished [`RoadGraph`] to the caller.  Use
//! [`RoadGraphBuilder::ingest_features`] directly for non-shapefile sources.
//!
//! Per-feature failures never abort a run: a feature with unusable geometry
//! is skipped with a warning, and every missing attribute falls back to its
//! documented default.
//!
//! Endpoint nodes are created fresh per segment; coincident endpoints of
//! adjacent segments are **not** deduplicated here.  Graph-search consumers
//! that need a connected graph run
//! [`RoadGraph::merge_coincident_nodes`](crate::model::RoadGraph) afterwards.

use std::path::Path;

use rustc_hash::FxHashSet;

use nav_core::{path_length_m, GeoPoint, NavResult};

use crate::attrs::{self, Attributes, FieldAliases};
use crate::bundle;
use crate::model::{Node, NodeKind, RoadClass, RoadGraph, RoadSegment};

// ── Features ──────────────────────────────────────────────────────────────────

/// Geometry of a decoded feature.
#[derive(Clone, Debug)]
pub enum FeatureGeometry {
    /// An open line — becomes a [`RoadSegment`] plus its two endpoint nodes.
    Line(Vec<GeoPoint>),
    /// A standalone point — becomes a POI [`Node`].
    Point(GeoPoint),
}

/// One decoded dataset feature: geometry plus its attribute set (empty in
/// degraded mode).
#[derive(Clone, Debug)]
pub struct Feature {
    pub geometry: FeatureGeometry,
    pub attrs: Attributes,
}

/// Counts for one ingestion call.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub segments: usize,
    pub poi_nodes: usize,
    pub skipped: usize,
}

// ── RoadGraphBuilder ──────────────────────────────────────────────────────────

/// Construct a [`RoadGraph`] from one or more datasets, then call
/// [`build`](Self::build).
///
/// Generated identifiers (`seg-N`, `node-N`) are unique within one builder,
/// so a composed multi-dataset run never collides with itself.
///
/// # Example
///
/// ```no_run
/// use nav_graph::RoadGraphBuilder;
///
/// let mut b = RoadGraphBuilder::new();
/// b.ingest_file("data/roads.zip".as_ref())?;
/// b.ingest_file("data/rail.zip".as_ref())?;
/// b.ingest_file("data/poi.shp".as_ref())?;
/// let graph = b.build();
/// # Ok::<(), nav_core::NavError>(())
/// ```
#[derive(Debug, Default)]
pub struct RoadGraphBuilder {
    aliases: FieldAliases,
    nodes: Vec<Node>,
    segments: Vec<RoadSegment>,
    generated_segments: u64,
    generated_nodes: u64,
}

impl RoadGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a custom attribute alias table instead of
    /// [`FieldAliases::KOREAN_STANDARD`].
    pub fn with_aliases(aliases: FieldAliases) -> Self {
        Self { aliases, ..Self::default() }
    }

    /// Ingest a shapefile bundle (loose `.shp` or `.zip` archive).
    ///
    /// # Errors
    ///
    /// Propagates [`bundle::read_bundle`] failures; individual malformed
    /// features inside a decodable bundle are skipped, not fatal.
    pub fn ingest_file(&mut self, path: &Path) -> NavResult<IngestStats> {
        let features = bundle::read_bundle(path)?;
        let stats = self.ingest_features(features);
        log::info!(
            "ingested {}: {} segments, {} POI nodes, {} features skipped",
            path.display(),
            stats.segments,
            stats.poi_nodes,
            stats.skipped
        );
        Ok(stats)
    }

    /// Ingest already-decoded features (non-shapefile sources, tests).
    pub fn ingest_features<I>(&mut self, features: I) -> IngestStats
    where
        I: IntoIterator<Item = Feature>,
    {
        let mut stats = IngestStats::default();
        for feature in features {
            match feature.geometry {
                FeatureGeometry::Line(path) => {
                    if self.push_segment(path, &feature.attrs) {
                        stats.segments += 1;
                    } else {
                        stats.skipped += 1;
                    }
                }
                FeatureGeometry::Point(position) => {
                    self.push_poi(position, &feature.attrs);
                    stats.poi_nodes += 1;
                }
            }
        }
        stats
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// Consume the builder and produce the graph.
    pub fn build(self) -> RoadGraph {
        RoadGraph { nodes: self.nodes, segments: self.segments }
    }

    // ── Per-feature conversion ────────────────────────────────────────────

    fn push_segment(&mut self, path: Vec<GeoPoint>, attrs: &Attributes) -> bool {
        let (Some(&first), Some(&last)) = (path.first(), path.last()) else {
            log::warn!("skipping line feature with no coordinates");
            return false;
        };

        // Degenerate single-point paths yield distance 0; non-finite
        // coordinates make the feature unusable.
        let distance_m = match path_length_m(&path) {
            Ok(d) => d,
            Err(e) => {
                log::warn!("skipping line feature with malformed geometry: {e}");
                return false;
            }
        };

        let class = attrs::resolve_road_class(attrs, &self.aliases);
        let id = attrs::resolve_id(attrs, &self.aliases)
            .unwrap_or_else(|| self.fresh_segment_id());

        // Highway endpoints are ramp nodes; everything else meets at grade.
        let (start_kind, end_kind) = match class {
            RoadClass::Highway => (NodeKind::HighwayEntrance, NodeKind::HighwayExit),
            _ => (NodeKind::Intersection, NodeKind::Intersection),
        };
        let start_node_id = self.push_endpoint(first, start_kind, &id);
        let end_node_id = self.push_endpoint(last, end_kind, &id);

        self.segments.push(RoadSegment {
            name: attrs::resolve_name(attrs, &self.aliases),
            start_node_id,
            end_node_id,
            path,
            distance_m,
            speed_limit_kmh: attrs::resolve_speed_limit(attrs, &self.aliases, class),
            class,
            one_way: attrs::resolve_one_way(attrs, &self.aliases),
            traffic_level: 0.0,
            id,
        });
        true
    }

    fn push_endpoint(&mut self, position: GeoPoint, kind: NodeKind, segment_id: &str) -> String {
        let id = self.fresh_node_id();
        let mut connections = FxHashSet::default();
        connections.insert(segment_id.to_owned());
        self.nodes.push(Node { id: id.clone(), position, name: None, kind, connections });
        id
    }

    fn push_poi(&mut self, position: GeoPoint, attrs: &Attributes) {
        let id = attrs::resolve_id(attrs, &self.aliases)
            .unwrap_or_else(|| self.fresh_node_id());
        let name = attrs.text(self.aliases.name).map(str::to_owned);
        self.nodes.push(Node {
            id,
            position,
            name,
            kind: NodeKind::Poi,
            connections: FxHashSet::default(),
        });
    }

    fn fresh_segment_id(&mut self) -> String {
        let id = format!("seg-{}", self.generated_segments);
        self.generated_segments += 1;
        id
    }

    fn fresh_node_id(&mut self) -> String {
        let id = format!("node-{}", self.generated_nodes);
        self.generated_nodes += 1;
        id
    }
}
