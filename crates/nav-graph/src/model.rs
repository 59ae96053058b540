//! Road graph data model — nodes, segments, and the assembled graph.
//!
//! Nodes and segments are created once per ingestion run and held in memory
//! for the session; nothing downstream mutates them.  Identifiers are
//! strings so attribute-provided ids (dataset link ids) and builder-generated
//! ids share one key space.

use rustc_hash::FxHashSet;

use nav_core::GeoPoint;

// ── Node ──────────────────────────────────────────────────────────────────────

/// Role of a node in the road graph.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum NodeKind {
    Intersection,
    HighwayEntrance,
    HighwayExit,
    Poi,
}

/// A graph node: a segment endpoint or a standalone point of interest.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Node {
    pub id: String,
    pub position: GeoPoint,
    pub name: Option<String>,
    pub kind: NodeKind,
    /// Ids of the segments incident to this node.
    pub connections: FxHashSet<String>,
}

// ── RoadSegment ───────────────────────────────────────────────────────────────

/// Road classification, from most to least significant.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum RoadClass {
    Highway,
    MajorRoad,
    MinorRoad,
    LocalRoad,
}

impl RoadClass {
    /// Default speed limit for the class, in km/h, applied when no speed
    /// attribute resolves.
    pub fn default_speed_kmh(self) -> f64 {
        match self {
            RoadClass::Highway => 100.0,
            RoadClass::MajorRoad => 80.0,
            RoadClass::MinorRoad => 60.0,
            RoadClass::LocalRoad => 50.0,
        }
    }

    /// Map a numeric rank attribute to a class: 1 is highway, 2 major,
    /// 3 minor, everything else local.
    pub fn from_rank(rank: i64) -> RoadClass {
        match rank {
            1 => RoadClass::Highway,
            2 => RoadClass::MajorRoad,
            3 => RoadClass::MinorRoad,
            _ => RoadClass::LocalRoad,
        }
    }
}

/// A directed or bidirectional stretch of road between two nodes.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadSegment {
    pub id: String,
    pub name: String,
    pub start_node_id: String,
    pub end_node_id: String,
    /// Ordered geometry of the segment.  A degenerate path (fewer than 2
    /// points) is carried as-is with `distance_m == 0.0`.
    pub path: Vec<GeoPoint>,
    /// Haversine length of `path` in metres.
    pub distance_m: f64,
    pub speed_limit_kmh: f64,
    pub class: RoadClass,
    pub one_way: bool,
    /// Relative congestion in [0, 1].  Always 0.0 at ingestion time;
    /// populated downstream by live traffic feeds.
    pub traffic_level: f64,
}

// ── RoadGraph ─────────────────────────────────────────────────────────────────

/// The materialized road graph: every node and segment from one or more
/// ingestion runs, in ingestion order.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RoadGraph {
    pub nodes: Vec<Node>,
    pub segments: Vec<RoadSegment>,
}

impl RoadGraph {
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.segments.is_empty()
    }

    /// Append another graph's collections to this one.
    ///
    /// Dataset composition (road + rail + POI) is caller-ordered: the order
    /// of `append` calls determines feature order and nothing else.  Callers
    /// combining independently built graphs own id-space separation.
    pub fn append(&mut self, other: RoadGraph) {
        self.nodes.extend(other.nodes);
        self.segments.extend(other.segments);
    }
}
