//! Segment intersection helpers used to keep generated maps readable.

use warband_core::{GameMap, MapNode, MapPoint};

/// Straight edge between two node positions.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    /// Position of the source node.
    pub start: MapPoint,
    /// Position of the target node.
    pub end: MapPoint,
}

impl Segment {
    /// Creates a segment between two points.
    #[must_use]
    pub const fn new(start: MapPoint, end: MapPoint) -> Self {
        Self { start, end }
    }

    /// Reports whether the two segments properly cross.
    #[must_use]
    pub fn intersects(&self, other: &Segment) -> bool {
        segments_intersect(self.start, self.end, other.start, other.end)
    }
}

/// Orientation test: true when `a`, `b`, `c` turn counter-clockwise.
fn ccw(a: MapPoint, b: MapPoint, c: MapPoint) -> bool {
    (c.y - a.y) * (b.x - a.x) > (b.y - a.y) * (c.x - a.x)
}

/// Reports whether segment `p1 p2` crosses segment `p3 p4`.
///
/// Collinear segments are not counted. Segments sharing an endpoint may be.
#[must_use]
pub fn segments_intersect(p1: MapPoint, p2: MapPoint, p3: MapPoint, p4: MapPoint) -> bool {
    ccw(p1, p3, p4) != ccw(p2, p3, p4) && ccw(p1, p2, p3) != ccw(p1, p2, p4)
}

/// Number of `existing` segments that the candidate edge would cross.
#[must_use]
pub fn count_crossings(candidate: Segment, existing: &[Segment]) -> usize {
    existing
        .iter()
        .filter(|segment| candidate.intersects(segment))
        .count()
}

/// Every edge among `nodes` as a segment, in node then connection order.
///
/// Edges to identifiers missing from `nodes` are skipped.
#[must_use]
pub fn edge_segments(nodes: &[MapNode]) -> Vec<Segment> {
    nodes
        .iter()
        .flat_map(|node| {
            node.connections.iter().filter_map(move |target| {
                nodes
                    .iter()
                    .find(|candidate| candidate.id == *target)
                    .map(|target| Segment::new(node.position, target.position))
            })
        })
        .collect()
}

/// Total number of crossing edge pairs in `map`.
#[must_use]
pub fn total_crossings(map: &GameMap) -> usize {
    let segments = edge_segments(&map.nodes);
    let mut crossings = 0;
    for (index, segment) in segments.iter().enumerate() {
        crossings += count_crossings(*segment, &segments[index + 1..]);
    }
    crossings
}
