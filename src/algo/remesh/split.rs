//! Splitting of long edges.
//!
//! Edges are processed longest first from a max-heap. Splitting inserts the
//! midpoint, halves the edge and cuts every incident face in two; the halves
//! and the new diagonals go back on the heap if they are still too long.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, HashSet};

use tracing::{debug, trace};

use super::engine::Remesher;
use super::options::SplitOptions;
use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex, VertexId};

/// An edge waiting to be split, keyed by its squared length at push time.
#[derive(Debug, Clone, Copy)]
struct EdgeCandidate<I: MeshIndex> {
    length_sq: f64,
    edge: EdgeId<I>,
}

impl<I: MeshIndex> PartialEq for EdgeCandidate<I> {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl<I: MeshIndex> Eq for EdgeCandidate<I> {}

impl<I: MeshIndex> PartialOrd for EdgeCandidate<I> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

// Longest first; ties broken by id so the order is deterministic
impl<I: MeshIndex> Ord for EdgeCandidate<I> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.length_sq
            .total_cmp(&other.length_sq)
            .then_with(|| other.edge.cmp(&self.edge))
    }
}

/// Result of [`split_long_edges`].
#[derive(Debug, Clone, PartialEq)]
pub struct SplitReport<I: MeshIndex = u32> {
    /// Number of splits performed.
    pub splits: usize,
    /// Vertices inserted, in insertion order.
    pub vertices: Vec<VertexId<I>>,
    /// The input edges and every sub-edge cut from them.
    pub edges: Vec<EdgeId<I>>,
}

/// Split the given edges until none of their pieces is longer than `max_length`.
///
/// Each split inserts the midpoint and divides the incident faces. Sub-edges
/// of an edge marked in the edge constraint map are marked as well, and faces
/// created by a split get the patch id of the face they were cut from. Only
/// pieces of the input edges are split; the diagonals created along the way
/// are left alone.
///
/// This is the way to bring constrained edges under the length bound that
/// [`isotropic_remesh`](super::isotropic_remesh) requires when constraints
/// are protected.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] if `max_length` is not a positive finite
/// number and [`MeshError::InvalidElement`] if an edge does not exist. The
/// mesh is unchanged in both cases.
///
/// # Example
/// ```
/// use isomesh::algo::remesh::{split_long_edges, SplitOptions};
/// use isomesh::mesh::{build_from_triangles, HalfEdgeMesh, VertexId};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(4.0, 0.0, 0.0),
///     Point3::new(2.0, 1.0, 0.0),
/// ];
/// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
/// let base = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap().edge();
///
/// let report = split_long_edges(&mut mesh, &[base], 1.0, SplitOptions::new()).unwrap();
/// assert_eq!(report.splits, 3);
/// assert_eq!(report.edges.len(), 4);
/// assert!(mesh.is_valid());
/// ```
pub fn split_long_edges<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    edges: &[EdgeId<I>],
    max_length: f64,
    options: SplitOptions<'_, I>,
) -> Result<SplitReport<I>> {
    if !max_length.is_finite() || max_length <= 0.0 {
        return Err(MeshError::invalid_param(
            "max_length",
            max_length,
            "must be a positive finite number",
        ));
    }
    if let Some(e) = edges.iter().find(|&&e| !mesh.contains_edge(e)) {
        return Err(MeshError::invalid_element("edge", e.index()));
    }

    let SplitOptions {
        mut edge_constraints,
        mut face_patches,
    } = options;

    let mut seen = HashSet::with_capacity(edges.len());
    let mut pieces: Vec<EdgeId<I>> = edges.iter().copied().filter(|e| seen.insert(*e)).collect();

    let sq_max = max_length * max_length;
    let mut heap: BinaryHeap<EdgeCandidate<I>> = pieces
        .iter()
        .map(|&edge| EdgeCandidate {
            length_sq: mesh.edge_length_squared(edge.halfedge()),
            edge,
        })
        .filter(|c| c.length_sq > sq_max)
        .collect();

    let mut vertices = Vec::new();
    while let Some(candidate) = heap.pop() {
        let h = candidate.edge.halfedge();
        if mesh.edge_length_squared(h) != candidate.length_sq {
            continue;
        }

        let midpoint = mesh.edge_midpoint(h);
        let split = mesh.split_edge(h, midpoint);
        vertices.push(split.vertex);
        pieces.push(split.head.edge());

        if let Some(map) = edge_constraints.as_deref_mut() {
            if map.is_constrained(split.tail.edge()) {
                map.set_constrained(split.head.edge(), true);
            }
        }
        if let Some(map) = face_patches.as_deref_mut() {
            for fs in split.faces.iter().flatten() {
                let patch = map.patch(fs.parent);
                map.set_patch(fs.child, patch);
            }
        }

        for he in [split.head, split.tail] {
            let length_sq = mesh.edge_length_squared(he);
            if length_sq > sq_max {
                heap.push(EdgeCandidate {
                    length_sq,
                    edge: he.edge(),
                });
            }
        }
    }

    debug!(
        input_edges = seen.len(),
        splits = vertices.len(),
        max_length,
        "Split long edges"
    );

    Ok(SplitReport {
        splits: vertices.len(),
        vertices,
        edges: pieces,
    })
}

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Split every patch edge longer than `high`, including edges created
    /// by earlier splits in the same pass. Returns the number of splits.
    pub(crate) fn split_long_edges(&mut self) -> usize {
        let sq_high = self.high * self.high;

        let mut heap: BinaryHeap<EdgeCandidate<I>> = BinaryHeap::new();
        for edge in self.mesh.edge_ids() {
            if self.is_split_candidate(edge) {
                let length_sq = self.mesh.edge_length_squared(edge.halfedge());
                if length_sq > sq_high {
                    heap.push(EdgeCandidate { length_sq, edge });
                }
            }
        }

        let mut splits = 0;
        while let Some(candidate) = heap.pop() {
            let h = candidate.edge.halfedge();
            if self.mesh.edge_length_squared(h) != candidate.length_sq {
                continue;
            }

            let midpoint = self.mesh.edge_midpoint(h);
            let split = self.mesh.split_edge(h, midpoint);
            self.state.on_split(self.mesh, &split);
            self.mark_touched(split.vertex);
            splits += 1;
            trace!(edge = candidate.edge.index(), vertex = split.vertex.index(), "split");

            let diagonals = split.faces.iter().flatten().map(|fs| fs.diagonal);
            let new_edges: Vec<_> = [split.head, split.tail].into_iter().chain(diagonals).collect();
            for he in new_edges {
                let edge = he.edge();
                if !self.is_split_candidate(edge) {
                    continue;
                }
                let length_sq = self.mesh.edge_length_squared(he);
                if length_sq > sq_high {
                    heap.push(EdgeCandidate { length_sq, edge });
                }
            }
        }
        splits
    }

    fn is_split_candidate(&self, e: EdgeId<I>) -> bool {
        self.state.is_patch_edge(self.mesh, e)
            && !(self.protect && self.state.is_constrained_edge(self.mesh, e))
    }
}
