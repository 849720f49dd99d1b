//! Projection back onto the reference surface.
//!
//! The reference surface is the patch as it was before the first edit. One
//! [`TriangleBvh`] is built per patch id so a vertex never snaps onto a
//! neighbouring patch. A caller-supplied [`Projection`] replaces the trees
//! entirely, in which case they are never built.

use std::collections::HashMap;

use nalgebra::Point3;
use rayon::prelude::*;
use tracing::{trace, warn};

use super::constraints::{ConstraintState, VertexRole};
use super::engine::Remesher;
use super::options::ProjectionScope;
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, Projection, VertexId};
use crate::spatial::TriangleBvh;

/// Nearest-point projector over the original patch geometry.
#[derive(Debug)]
pub(crate) struct SurfaceProjector {
    trees: HashMap<usize, TriangleBvh>,
}

impl SurfaceProjector {
    /// Copy the current geometry of `faces`, grouped by patch id.
    pub(crate) fn build<I: MeshIndex>(
        mesh: &HalfEdgeMesh<I>,
        state: &ConstraintState,
        faces: &[FaceId<I>],
        parallel: bool,
    ) -> Self {
        let mut soups: HashMap<usize, Vec<[Point3<f64>; 3]>> = HashMap::new();
        for &f in faces {
            soups
                .entry(state.patch_of(f))
                .or_default()
                .push(mesh.face_positions(f));
        }

        let trees = if parallel {
            soups
                .into_par_iter()
                .map(|(patch, triangles)| (patch, TriangleBvh::build(triangles)))
                .collect()
        } else {
            soups
                .into_iter()
                .map(|(patch, triangles)| (patch, TriangleBvh::build(triangles)))
                .collect()
        };

        Self { trees }
    }

    /// Number of per-patch trees.
    pub(crate) fn num_patches(&self) -> usize {
        self.trees.len()
    }

    pub(crate) fn nearest(&self, patch: usize, p: &Point3<f64>) -> Option<Point3<f64>> {
        self.trees.get(&patch)?.nearest_point(p).map(|hit| hit.point)
    }
}

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Project free vertices of the patch. Returns the number of vertices moved.
    pub(crate) fn project(&mut self, projection: Option<&dyn Projection<I>>) -> usize {
        let queries: Vec<(VertexId<I>, Point3<f64>, usize)> = self
            .mesh
            .vertex_ids()
            .filter(|&v| match self.scope {
                ProjectionScope::Touched => self.is_touched(v),
                ProjectionScope::AllFree => true,
            })
            .filter(|&v| self.state.vertex_role(self.mesh, v) == VertexRole::Free)
            .filter_map(|v| {
                let f = self.mesh.vertex_faces(v).next()?;
                Some((v, *self.mesh.position(v), self.state.patch_of(f)))
            })
            .collect();

        let projector = self.projector.as_ref();
        let query = |&(v, p, patch): &(VertexId<I>, Point3<f64>, usize)| -> Option<Point3<f64>> {
            match projection {
                Some(f) => Some(f.project(v, &p)),
                None => projector?.nearest(patch, &p),
            }
        };

        let targets: Vec<Option<Point3<f64>>> = if self.parallel {
            queries.par_iter().map(query).collect()
        } else {
            queries.iter().map(query).collect()
        };

        let mut projected = 0;
        for ((v, _, _), target) in queries.iter().zip(targets) {
            let Some(q) = target else { continue };
            if !q.coords.iter().all(|c| c.is_finite()) {
                warn!(vertex = v.index(), "projection returned a non-finite point; vertex left in place");
                continue;
            }
            self.mesh.set_position(*v, q);
            projected += 1;
        }
        trace!(projected, "projection");
        projected
    }
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;
    use crate::algo::remesh::test_meshes::grid;

    fn lift(_: VertexId, p: &Point3<f64>) -> Point3<f64> {
        Point3::new(p.x, p.y, 1.0)
    }

    #[test]
    fn test_only_touched_free_vertices_move() {
        // 4 x 4 vertices; 5, 6, 9 and 10 are free
        let mut mesh = grid(3, 1.0);
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);
        remesher.mark_touched(VertexId::new(5));
        remesher.mark_touched(VertexId::new(0));

        assert_eq!(remesher.project(Some(&lift)), 1);
        assert_eq!(remesher.mesh.position(VertexId::new(5)).z, 1.0);
        assert_eq!(remesher.mesh.position(VertexId::new(6)).z, 0.0);
        assert_eq!(remesher.mesh.position(VertexId::new(0)).z, 0.0);

        remesher.scope = ProjectionScope::AllFree;
        assert_eq!(remesher.project(Some(&lift)), 4);
        assert_eq!(remesher.mesh.position(VertexId::new(10)).z, 1.0);
    }

    #[test]
    fn test_non_finite_result_is_ignored() {
        let mut mesh = grid(2, 1.0);
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let center = VertexId::new(4);
        let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);
        remesher.mark_touched(center);

        let broken = |_: VertexId, p: &Point3<f64>| Point3::new(p.x, f64::NAN, p.z);
        assert_eq!(remesher.project(Some(&broken)), 0);
        assert_eq!(*remesher.mesh.position(center), Point3::new(0.5, 0.5, 0.0));
    }

    #[test]
    fn test_reference_surface_pulls_vertices_back() {
        let mut mesh = grid(3, 1.0);
        let faces: Vec<FaceId> = mesh.face_ids().collect();

        for parallel in [false, true] {
            let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);
            remesher.parallel = parallel;
            let projector = SurfaceProjector::build(&*remesher.mesh, &remesher.state, &faces, parallel);
            assert_eq!(projector.num_patches(), 1);
            remesher.projector = Some(projector);

            let v = VertexId::new(9);
            remesher.mesh.set_position(v, Point3::new(0.4, 0.6, 0.3));
            remesher.mark_touched(v);
            assert_eq!(remesher.project(None), 1);
            assert_relative_eq!(*remesher.mesh.position(v), Point3::new(0.4, 0.6, 0.0), epsilon = 1e-12);
        }
    }
}
