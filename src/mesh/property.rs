//! Property maps over mesh elements.
//!
//! Algorithms that read or write per-element data owned by the caller take
//! these traits as trait objects, so any storage works: a `Vec` indexed by
//! element ID, a `HashSet` of marked elements, a `HashMap`, or a custom type.
//!
//! ```
//! use std::collections::HashSet;
//! use isomesh::mesh::{EdgeConstraintMap, EdgeId};
//!
//! let mut marked: HashSet<EdgeId> = HashSet::new();
//! marked.set_constrained(EdgeId::new(4), true);
//! assert!(marked.is_constrained(EdgeId::new(4)));
//! assert!(!marked.is_constrained(EdgeId::new(5)));
//! ```

use std::collections::{HashMap, HashSet};

use nalgebra::Point3;

use super::index::{EdgeId, FaceId, MeshIndex, VertexId};

/// Read/write access to the "is constrained" flag of edges.
///
/// Remeshing writes back to this map: edges created by splitting a
/// constrained edge are marked, removed edges are cleared.
pub trait EdgeConstraintMap<I: MeshIndex> {
    /// Whether the edge is constrained.
    fn is_constrained(&self, e: EdgeId<I>) -> bool;

    /// Mark or unmark an edge.
    fn set_constrained(&mut self, e: EdgeId<I>, constrained: bool);
}

/// Read access to the "is constrained" flag of vertices.
///
/// Constrained vertices are never removed or moved.
pub trait VertexConstraintMap<I: MeshIndex> {
    /// Whether the vertex is constrained.
    fn is_constrained(&self, v: VertexId<I>) -> bool;
}

/// Read/write access to the patch id of faces.
///
/// Faces created during remeshing are assigned the patch of the face they
/// were split from.
pub trait FacePatchMap<I: MeshIndex> {
    /// The patch the face belongs to.
    fn patch(&self, f: FaceId<I>) -> usize;

    /// Assign a face to a patch.
    fn set_patch(&mut self, f: FaceId<I>, patch: usize);
}

/// Maps a vertex to its position on a reference surface.
///
/// Implemented for every `Fn(VertexId<I>, &Point3<f64>) -> Point3<f64>`; the
/// second argument is the vertex position before projection. Projection
/// queries may run on several threads, hence the `Sync` bound.
pub trait Projection<I: MeshIndex>: Sync {
    /// Project vertex `v`, currently at `position`.
    fn project(&self, v: VertexId<I>, position: &Point3<f64>) -> Point3<f64>;
}

impl<I, F> Projection<I> for F
where
    I: MeshIndex,
    F: Fn(VertexId<I>, &Point3<f64>) -> Point3<f64> + Sync,
{
    #[inline]
    fn project(&self, v: VertexId<I>, position: &Point3<f64>) -> Point3<f64> {
        self(v, position)
    }
}

impl<I: MeshIndex> EdgeConstraintMap<I> for HashSet<EdgeId<I>> {
    fn is_constrained(&self, e: EdgeId<I>) -> bool {
        self.contains(&e)
    }

    fn set_constrained(&mut self, e: EdgeId<I>, constrained: bool) {
        if constrained {
            self.insert(e);
        } else {
            self.remove(&e);
        }
    }
}

impl<I: MeshIndex> EdgeConstraintMap<I> for Vec<bool> {
    fn is_constrained(&self, e: EdgeId<I>) -> bool {
        self.get(e.index()).copied().unwrap_or(false)
    }

    fn set_constrained(&mut self, e: EdgeId<I>, constrained: bool) {
        if e.index() >= self.len() {
            if !constrained {
                return;
            }
            self.resize(e.index() + 1, false);
        }
        self[e.index()] = constrained;
    }
}

impl<I: MeshIndex> VertexConstraintMap<I> for HashSet<VertexId<I>> {
    fn is_constrained(&self, v: VertexId<I>) -> bool {
        self.contains(&v)
    }
}

impl<I: MeshIndex> VertexConstraintMap<I> for Vec<bool> {
    fn is_constrained(&self, v: VertexId<I>) -> bool {
        self.get(v.index()).copied().unwrap_or(false)
    }
}

/// Faces beyond the end of the vector are in patch 0.
impl<I: MeshIndex> FacePatchMap<I> for Vec<usize> {
    fn patch(&self, f: FaceId<I>) -> usize {
        self.get(f.index()).copied().unwrap_or(0)
    }

    fn set_patch(&mut self, f: FaceId<I>, patch: usize) {
        if f.index() >= self.len() {
            self.resize(f.index() + 1, 0);
        }
        self[f.index()] = patch;
    }
}

/// Faces without an entry are in patch 0.
impl<I: MeshIndex> FacePatchMap<I> for HashMap<FaceId<I>, usize> {
    fn patch(&self, f: FaceId<I>) -> usize {
        self.get(&f).copied().unwrap_or(0)
    }

    fn set_patch(&mut self, f: FaceId<I>, patch: usize) {
        self.insert(f, patch);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vec_edge_map_grows_on_demand() {
        let mut map: Vec<bool> = Vec::new();
        EdgeConstraintMap::<u32>::set_constrained(&mut map, EdgeId::new(3), false);
        assert!(map.is_empty());
        EdgeConstraintMap::<u32>::set_constrained(&mut map, EdgeId::new(3), true);
        assert_eq!(map.len(), 4);
        assert!(EdgeConstraintMap::<u32>::is_constrained(&map, EdgeId::new(3)));
        assert!(!EdgeConstraintMap::<u32>::is_constrained(&map, EdgeId::new(10)));
    }

    #[test]
    fn test_patch_maps() {
        let mut by_vec: Vec<usize> = vec![2, 2];
        by_vec.set_patch(FaceId::<u32>::new(4), 7);
        assert_eq!(by_vec.patch(FaceId::<u32>::new(4)), 7);
        assert_eq!(by_vec.patch(FaceId::<u32>::new(3)), 0);
        assert_eq!(by_vec.patch(FaceId::<u32>::new(0)), 2);

        let mut by_map: HashMap<FaceId, usize> = HashMap::new();
        by_map.set_patch(FaceId::new(1), 5);
        assert_eq!(by_map.patch(FaceId::new(1)), 5);
        assert_eq!(by_map.patch(FaceId::new(2)), 0);
    }

    #[test]
    fn test_closure_projection() {
        let flatten = |_: VertexId, p: &Point3<f64>| Point3::new(p.x, p.y, 0.0);
        let projected = flatten.project(VertexId::new(0), &Point3::new(1.0, 2.0, 3.0));
        assert_eq!(projected, Point3::new(1.0, 2.0, 0.0));
    }
}
