//! Collapsing of short edges.
//!
//! Edges shorter than `low` are taken shortest first from a min-heap. For
//! each one both directions are tried. The removed endpoint must be allowed
//! to go (see [`ConstraintState::is_removable`]), and a polyline may only
//! lose vertices where it runs nearly straight. The mesh must stay manifold,
//! no new edge may reach `high` and no surviving face may fold over. When
//! both directions pass, the one leaving better shaped triangles wins. An
//! edge that cannot be collapsed is not tried again in the same pass.
//!
//! [`ConstraintState::is_removable`]: super::constraints::ConstraintState::is_removable

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use nalgebra::Point3;
use tracing::trace;

use super::engine::Remesher;
use super::triangle_quality;
use crate::mesh::{EdgeId, HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// Smallest admissible face area after a collapse, relative to `high²`.
const MIN_AREA_FACTOR: f64 = 1e-12;

#[derive(Debug, Clone, Copy)]
struct CollapseCandidate<I: MeshIndex> {
    length_sq: f64,
    edge: EdgeId<I>,
}

impl<I: MeshIndex> PartialEq for CollapseCandidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: MeshIndex> Eq for CollapseCandidate<I> {}

impl<I: MeshIndex> PartialOrd for CollapseCandidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<I: MeshIndex> Ord for CollapseCandidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap
        other
            .length_sq
            .total_cmp(&self.length_sq)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Collapse patch edges shorter than `low`. Returns the number of collapses.
    pub(crate) fn collapse_short_edges(&mut self) -> usize {
        let sq_low = self.low * self.low;

        let mut heap: BinaryHeap<CollapseCandidate<I>> = BinaryHeap::new();
        for edge in self.mesh.edge_ids() {
            if self.state.is_patch_edge(self.mesh, edge) {
                let length_sq = self.mesh.edge_length_squared(edge.halfedge());
                if length_sq < sq_low {
                    heap.push(CollapseCandidate { length_sq, edge });
                }
            }
        }

        let mut rejected = vec![false; self.mesh.edge_capacity()];
        let mut collapses = 0;

        while let Some(candidate) = heap.pop() {
            let edge = candidate.edge;
            if !self.mesh.contains_edge(edge) || rejected[edge.index()] {
                continue;
            }
            let h = edge.halfedge();
            let length_sq = self.mesh.edge_length_squared(h);
            if length_sq != candidate.length_sq || length_sq >= sq_low {
                continue;
            }

            let Some(dir) = self.choose_direction(h) else {
                rejected[edge.index()] = true;
                trace!(edge = edge.index(), "collapse rejected");
                continue;
            };

            let collapse = self.mesh.collapse_edge(dir);
            self.state.on_collapse(&collapse);
            collapses += 1;
            trace!(
                removed = collapse.removed_vertex.index(),
                kept = collapse.kept.index(),
                "collapse"
            );

            // Edges around the kept vertex changed length
            let around: Vec<HalfEdgeId<I>> = self.mesh.vertex_halfedges(collapse.kept).collect();
            for he in around {
                let edge = he.edge();
                if rejected[edge.index()] || !self.state.is_patch_edge(self.mesh, edge) {
                    continue;
                }
                let length_sq = self.mesh.edge_length_squared(he);
                if length_sq < sq_low {
                    heap.push(CollapseCandidate { length_sq, edge });
                }
            }
        }
        collapses
    }

    /// Pick the half-edge to collapse (its origin is removed), if any.
    fn choose_direction(&self, h: HalfEdgeId<I>) -> Option<HalfEdgeId<I>> {
        let forward = self.is_collapse_allowed(h);
        let backward = self.is_collapse_allowed(h.opposite());
        match (forward, backward) {
            (true, false) => Some(h),
            (false, true) => Some(h.opposite()),
            (false, false) => None,
            (true, true) => {
                let q_forward = self.collapse_quality(h);
                let q_backward = self.collapse_quality(h.opposite());
                if q_backward > q_forward {
                    Some(h.opposite())
                } else {
                    Some(h)
                }
            }
        }
    }

    /// Whether merging `origin(h)` into `dest(h)` is allowed.
    fn is_collapse_allowed(&self, h: HalfEdgeId<I>) -> bool {
        let a = self.mesh.origin(h);
        if !self.state.is_removable(
            self.mesh,
            a,
            h.edge(),
            self.protect,
            self.collapse_constraints,
        ) {
            return false;
        }
        if self.state.is_constrained_edge(self.mesh, h.edge()) && self.is_polyline_corner(a) {
            return false;
        }
        if !self.mesh.is_collapse_ok(h) {
            return false;
        }
        !self.collapse_creates_long_edge(h) && !self.collapse_folds_face(h)
    }

    /// Some neighbour of the removed vertex would end up `high` or farther
    /// from the kept vertex.
    fn collapse_creates_long_edge(&self, h: HalfEdgeId<I>) -> bool {
        let a = self.mesh.origin(h);
        let b = self.mesh.dest(h);
        let pb = self.mesh.position(b);
        let sq_high = self.high * self.high;
        self.mesh
            .vertex_neighbors(a)
            .filter(|&x| x != b)
            .any(|x| (self.mesh.position(x) - pb).norm_squared() >= sq_high)
    }

    /// A face of the removed vertex that survives the collapse would flip
    /// orientation or become (nearly) degenerate.
    fn collapse_folds_face(&self, h: HalfEdgeId<I>) -> bool {
        let b = self.mesh.dest(h);
        let pb = *self.mesh.position(b);
        let min_area = MIN_AREA_FACTOR * self.high * self.high;

        self.surviving_faces(h).into_iter().any(|[p, q, r]| {
            let old = (q - p).cross(&(r - p));
            let new = (q - pb).cross(&(r - pb));
            old.dot(&new) < 0.0 || 0.5 * new.norm() < min_area
        })
    }

    /// Minimum triangle quality around the kept vertex after the collapse.
    fn collapse_quality(&self, h: HalfEdgeId<I>) -> f64 {
        let pb = *self.mesh.position(self.mesh.dest(h));
        self.surviving_faces(h)
            .into_iter()
            .map(|[_, q, r]| triangle_quality(&pb, &q, &r))
            .fold(1.0, f64::min)
    }

    /// Faces around `origin(h)` that survive the collapse, each given as
    /// `[removed vertex position, next corner, last corner]`.
    fn surviving_faces(&self, h: HalfEdgeId<I>) -> Vec<[Point3<f64>; 3]> {
        let a = self.mesh.origin(h);
        let b = self.mesh.dest(h);
        let mut faces = Vec::new();
        for he in self.mesh.vertex_halfedges(a) {
            if self.mesh.is_boundary_halfedge(he) {
                continue;
            }
            let q = self.mesh.dest(he);
            let r = self.mesh.dest(self.mesh.next(he));
            if q == b || r == b {
                continue;
            }
            faces.push(corner_positions(self.mesh, a, q, r));
        }
        faces
    }
}

fn corner_positions<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    a: VertexId<I>,
    q: VertexId<I>,
    r: VertexId<I>,
) -> [Point3<f64>; 3] {
    [*mesh.position(a), *mesh.position(q), *mesh.position(r)]
}
