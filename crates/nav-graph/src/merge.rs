//! Coincident-node merge pass.
//!
//! Ingestion creates endpoint nodes fresh per segment, so two segments that
//! meet at the same junction carry two nodes at (nearly) the same
//! coordinate.  Feature-only consumers are fine with that; graph-search
//! consumers need the duplicates collapsed into shared junction nodes.
//! This pass is opt-in for exactly that reason.
//!
//! Candidate pairs come from an R-tree query in degree space (cheap, may
//! over-report near the poles), then every candidate is confirmed with an
//! exact haversine check before merging.

use rstar::{PointDistance, RTree, RTreeObject, AABB};
use rustc_hash::FxHashMap;

use nav_core::haversine_m;

use crate::model::RoadGraph;

/// Metres per degree of latitude (and of longitude at the equator).
const METERS_PER_DEGREE: f64 = 111_320.0;

// ── R-tree entry ──────────────────────────────────────────────────────────────

/// A `[lat, lon]` point tagged with its index into `RoadGraph::nodes`.
struct NodeEntry {
    point: [f64; 2],
    idx: usize,
}

impl RTreeObject for NodeEntry {
    type Envelope = AABB<[f64; 2]>;
    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.point)
    }
}

impl PointDistance for NodeEntry {
    /// Squared Euclidean distance in lat/lon degree space — a candidate
    /// filter only; merges are confirmed with [`haversine_m`].
    fn distance_2(&self, point: &[f64; 2]) -> f64 {
        let dlat = self.point[0] - point[0];
        let dlon = self.point[1] - point[1];
        dlat * dlat + dlon * dlon
    }
}

// ── Merge pass ────────────────────────────────────────────────────────────────

impl RoadGraph {
    /// Collapse nodes within `tolerance_m` of each other into the earliest
    /// node of each cluster, remapping segment endpoint ids and unioning
    /// connection sets.  Returns the number of nodes removed.
    ///
    /// The earliest node keeps its id, kind, and name.  Merging is
    /// single-level: a node joins the earliest node within tolerance, and
    /// chains (A–B in range, B–C in range, A–C not) are not closed
    /// transitively.
    pub fn merge_coincident_nodes(&mut self, tolerance_m: f64) -> usize {
        let n = self.nodes.len();
        if n < 2 || tolerance_m <= 0.0 {
            return 0;
        }

        let tree = RTree::bulk_load(
            self.nodes
                .iter()
                .enumerate()
                .map(|(idx, node)| NodeEntry {
                    point: [node.position.lat, node.position.lon],
                    idx,
                })
                .collect(),
        );

        // canonical[i] == i means node i survives; otherwise it points at
        // the earlier node absorbing it.
        let mut canonical: Vec<usize> = (0..n).collect();

        for i in 0..n {
            if canonical[i] != i {
                continue;
            }
            let center = self.nodes[i].position;

            // A degree of longitude shrinks with latitude; widen the search
            // radius accordingly so no in-tolerance pair is filtered out.
            let lat_cos = center.lat.to_radians().cos().abs().max(0.01);
            let radius_deg = tolerance_m / (METERS_PER_DEGREE * lat_cos);

            for entry in
                tree.locate_within_distance([center.lat, center.lon], radius_deg * radius_deg)
            {
                let j = entry.idx;
                if j <= i || canonical[j] != j {
                    continue;
                }
                let exact = haversine_m(center, self.nodes[j].position);
                if matches!(exact, Ok(d) if d <= tolerance_m) {
                    canonical[j] = i;
                }
            }
        }

        let removed = canonical.iter().enumerate().filter(|&(i, &c)| i != c).count();
        if removed == 0 {
            return 0;
        }

        // Union connection sets into the surviving node and build the
        // id remap for segment endpoints.
        let mut id_remap: FxHashMap<String, String> = FxHashMap::default();
        for j in 0..n {
            let target = canonical[j];
            if target == j {
                continue;
            }
            let connections = std::mem::take(&mut self.nodes[j].connections);
            self.nodes[target].connections.extend(connections);
            id_remap.insert(self.nodes[j].id.clone(), self.nodes[target].id.clone());
        }

        let mut idx = 0;
        self.nodes.retain(|_| {
            let keep = canonical[idx] == idx;
            idx += 1;
            keep
        });

        for segment in &mut self.segments {
            if let Some(id) = id_remap.get(&segment.start_node_id) {
                segment.start_node_id = id.clone();
            }
            if let Some(id) = id_remap.get(&segment.end_node_id) {
                segment.end_node_id = id.clone();
            }
        }

        log::info!("merged {removed} coincident nodes (tolerance {tolerance_m} m)");
        removed
    }
}
