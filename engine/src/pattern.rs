//! Rune patterns, vertex/edge graphs in anchor-local coordinates.

use anyhow::bail;
use glam::DVec2;
use serde::{Deserialize, Serialize};
use util::{dijkstra_map, within_range};

use crate::{prelude::*, Result, Rgb};

/// Loose line segment, the working form of generator rewrites.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
    pub a: DVec2,
    pub b: DVec2,
    pub color: Option<Rgb>,
}

impl Segment {
    pub fn new(a: DVec2, b: DVec2, color: Option<Rgb>) -> Self {
        Segment { a, b, color }
    }

    pub fn length(&self) -> f64 {
        self.a.distance(self.b)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    pub pos: DVec2,
    pub color: Option<Rgb>,
}

/// Connection between two vertex indices of the owning pattern.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub a: usize,
    pub b: usize,
    pub color: Option<Rgb>,
}

/// Vertex/edge graph. Edges only ever reference existing vertices.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    vertices: Vec<Vertex>,
    edges: Vec<Edge>,
}

/// Snap a coordinate to the 1e-9 grid used to merge coincident vertices.
fn snap_key(p: DVec2) -> (i64, i64) {
    ((p.x * 1e9).round() as i64, (p.y * 1e9).round() as i64)
}

/// World tile containing a world-space point.
pub fn tile_of(p: DVec2) -> IVec2 {
    ivec2(p.x.round_ties_even() as i32, p.y.round_ties_even() as i32)
}

impl Pattern {
    /// Single edge from `a` to `b`.
    pub fn line(a: DVec2, b: DVec2) -> Self {
        Pattern::from_segments(&[Segment::new(a, b, None)])
    }

    /// Assemble segments into a graph, merging coincident endpoints.
    pub fn from_segments(segments: &[Segment]) -> Self {
        let mut ret = Pattern::default();
        let mut index: HashMap<(i64, i64), usize> = HashMap::default();

        let mut vertex =
            |ret: &mut Pattern, p: DVec2, color: Option<Rgb>| -> usize {
            *index.entry(snap_key(p)).or_insert_with(|| {
                ret.vertices.push(Vertex { pos: p, color });
                ret.vertices.len() - 1
            })
        };

        for seg in segments {
            let a = vertex(&mut ret, seg.a, seg.color);
            let b = vertex(&mut ret, seg.b, seg.color);
            ret.edges.push(Edge {
                a,
                b,
                color: seg.color,
            });
        }
        ret
    }

    /// Build from explicit vertices and index pairs.
    pub fn from_graph(
        vertices: Vec<DVec2>,
        edges: Vec<(usize, usize)>,
    ) -> Result<Self> {
        let n = vertices.len();
        if let Some((a, b)) = edges.iter().find(|(a, b)| *a >= n || *b >= n) {
            bail!("edge ({a}, {b}) out of range for {n} vertices");
        }
        Ok(Pattern {
            vertices: vertices
                .into_iter()
                .map(|pos| Vertex { pos, color: None })
                .collect(),
            edges: edges
                .into_iter()
                .map(|(a, b)| Edge { a, b, color: None })
                .collect(),
        })
    }

    pub fn to_segments(&self) -> Vec<Segment> {
        self.edges
            .iter()
            .map(|e| {
                Segment::new(
                    self.vertices[e.a].pos,
                    self.vertices[e.b].pos,
                    e.color,
                )
            })
            .collect()
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Keep only the first `n` vertices and the edges between them.
    pub fn truncate(&mut self, n: usize) {
        if n >= self.vertices.len() {
            return;
        }
        self.vertices.truncate(n);
        self.edges.retain(|e| e.a < n && e.b < n);
    }

    pub fn set_vertex_color(&mut self, i: usize, color: Option<Rgb>) {
        if let Some(v) = self.vertices.get_mut(i) {
            v.color = color;
        }
    }

    pub fn set_edge_color(&mut self, i: usize, color: Option<Rgb>) {
        if let Some(e) = self.edges.get_mut(i) {
            e.color = color;
        }
    }

    pub fn has_colored_edges(&self) -> bool {
        self.edges.iter().any(|e| e.color.is_some())
    }

    /// Undirected adjacency lists.
    pub fn adjacency(&self) -> Vec<Vec<usize>> {
        let mut ret = vec![Vec::new(); self.vertices.len()];
        for e in &self.edges {
            if e.a != e.b {
                ret[e.a].push(e.b);
                ret[e.b].push(e.a);
            }
        }
        ret
    }

    /// Breadth-first step count of every vertex from `root`, `None` for
    /// vertices in other components.
    pub fn depths_from(&self, root: usize) -> Vec<Option<usize>> {
        let mut ret = vec![None; self.vertices.len()];
        if root >= self.vertices.len() {
            return ret;
        }
        let adj = self.adjacency();
        for (i, d) in dijkstra_map(|&i: &usize| adj[i].clone(), [root]) {
            ret[i] = Some(d);
        }
        ret
    }

    /// Vertices at most `depth` edges from `seed`, seed first.
    pub fn neighborhood(&self, seed: usize, depth: usize) -> Vec<usize> {
        if seed >= self.vertices.len() {
            return Vec::new();
        }
        let adj = self.adjacency();
        dijkstra_map(|&i: &usize| adj[i].clone(), [seed])
            .take_while(within_range(depth + 1))
            .map(|(i, _)| i)
            .collect()
    }

    pub fn nearest_vertex(&self, p: DVec2) -> Option<usize> {
        self.vertices
            .iter()
            .enumerate()
            .min_by(|(_, a), (_, b)| {
                a.pos.distance_squared(p).total_cmp(&b.pos.distance_squared(p))
            })
            .map(|(i, _)| i)
    }

    pub fn center_of_mass(&self) -> Option<DVec2> {
        if self.vertices.is_empty() {
            return None;
        }
        let sum: DVec2 = self.vertices.iter().map(|v| v.pos).sum();
        Some(sum / self.vertices.len() as f64)
    }

    pub fn translate(&mut self, d: DVec2) {
        self.vertices.iter_mut().for_each(|v| v.pos += d);
    }

    /// Rotate every vertex around `center` by `angle` radians.
    pub fn rotate_about(&mut self, center: DVec2, angle: f64) {
        let rot = DVec2::from_angle(angle);
        for v in self.vertices.iter_mut() {
            v.pos = center + rot.rotate(v.pos - center);
        }
    }

    /// World-space vertex positions for a pattern anchored at `anchor`.
    pub fn world_positions(
        &self,
        anchor: IVec2,
    ) -> impl Iterator<Item = DVec2> + '_ {
        let origin = anchor.as_dvec2();
        self.vertices.iter().map(move |v| origin + v.pos)
    }
}

#[cfg(test)]
mod test {
    use glam::dvec2;

    use super::*;

    fn chain(n: usize) -> Pattern {
        let segs: Vec<Segment> = (0..n)
            .map(|i| {
                Segment::new(
                    dvec2(i as f64, 0.0),
                    dvec2(i as f64 + 1.0, 0.0),
                    None,
                )
            })
            .collect();
        Pattern::from_segments(&segs)
    }

    #[test]
    fn segments_merge_shared_endpoints() {
        let p = chain(4);
        assert_eq!(p.len(), 5);
        assert_eq!(p.edges().len(), 4);
        assert_eq!(p.to_segments().len(), 4);

        // Float noise below the snapping grid still merges.
        let p = Pattern::from_segments(&[
            Segment::new(dvec2(0.0, 0.0), dvec2(1.0 / 3.0, 0.0), None),
            Segment::new(dvec2(1.0 / 3.0 + 1e-13, 0.0), dvec2(1.0, 0.0), None),
        ]);
        assert_eq!(p.len(), 3);
    }

    #[test]
    fn graph_validation() {
        assert!(Pattern::from_graph(vec![DVec2::ZERO, DVec2::X], vec![(0, 1)])
            .is_ok());
        assert!(Pattern::from_graph(vec![DVec2::ZERO], vec![(0, 1)]).is_err());
    }

    #[test]
    fn neighborhood_depth() {
        let p = chain(6);
        let mut near = p.neighborhood(3, 1);
        near.sort();
        assert_eq!(near, vec![2, 3, 4]);
        assert_eq!(p.neighborhood(3, 0), vec![3]);
        assert_eq!(p.neighborhood(0, 10).len(), 7);
        assert_eq!(p.depths_from(0)[6], Some(6));
    }

    #[test]
    fn truncation_drops_dangling_edges() {
        let mut p = chain(6);
        p.truncate(3);
        assert_eq!(p.len(), 3);
        assert_eq!(p.edges().len(), 2);
        assert!(p.edges().iter().all(|e| e.a < 3 && e.b < 3));
    }

    #[test]
    fn geometry() {
        let mut p = chain(2);
        assert_eq!(p.center_of_mass(), Some(dvec2(1.0, 0.0)));
        p.rotate_about(dvec2(1.0, 0.0), std::f64::consts::FRAC_PI_2);
        assert!(p.vertices()[0].pos.distance(dvec2(1.0, -1.0)) < 1e-9);
        assert_eq!(p.nearest_vertex(dvec2(1.2, 0.9)), Some(2));
        assert_eq!(tile_of(dvec2(0.5, 1.5)), ivec2(0, 2));
        assert_eq!(tile_of(dvec2(-0.6, 2.49)), ivec2(-1, 2));
    }
}
