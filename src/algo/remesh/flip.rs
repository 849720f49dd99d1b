//! Valence equalization by edge flips.
//!
//! One pass over the unconstrained edges inside the patch. An edge is
//! flipped when that strictly lowers the squared deviation of its four
//! vertices from their target valence and the two new triangles keep the
//! orientation of the old pair.

use nalgebra::{Point3, Vector3};
use tracing::trace;

use super::engine::Remesher;
use crate::mesh::{EdgeId, HalfEdgeId, MeshIndex};

/// Smallest admissible area of a flipped triangle, relative to the squared
/// length of the longer diagonal.
const MIN_AREA_FACTOR: f64 = 1e-12;

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Flip edges that improve valences. Returns the number of flips.
    pub(crate) fn equalize_valences(&mut self) -> usize {
        let edges: Vec<EdgeId<I>> = self
            .mesh
            .edge_ids()
            .filter(|&e| self.state.is_patch_interior_edge(self.mesh, e))
            .collect();

        let mut flips = 0;
        for edge in edges {
            let h = edge.halfedge();
            if self.state.is_constrained_edge(self.mesh, edge) || !self.mesh.is_flip_ok(h) {
                continue;
            }
            if !self.flip_improves_valence(h) || !self.flip_keeps_orientation(h) {
                continue;
            }
            self.mesh.flip_edge(h);
            flips += 1;
            trace!(edge = edge.index(), "flip");
        }
        flips
    }

    fn flip_improves_valence(&self, h: HalfEdgeId<I>) -> bool {
        let mesh = &*self.mesh;
        let a = mesh.origin(h);
        let b = mesh.dest(h);
        let c = mesh.dest(mesh.next(h));
        let d = mesh.dest(mesh.next(h.opposite()));

        let deviation = |v, delta: i64| {
            let valence = mesh.valence(v) as i64 + delta;
            let target = self.state.target_valence(mesh, v) as i64;
            (valence - target).pow(2)
        };

        let before = deviation(a, 0) + deviation(b, 0) + deviation(c, 0) + deviation(d, 0);
        let after = deviation(a, -1) + deviation(b, -1) + deviation(c, 1) + deviation(d, 1);
        after < before
    }

    /// Both triangles after the flip face the same side as the pair before it.
    fn flip_keeps_orientation(&self, h: HalfEdgeId<I>) -> bool {
        let mesh = &*self.mesh;
        let pa = mesh.position(mesh.origin(h));
        let pb = mesh.position(mesh.dest(h));
        let pc = mesh.position(mesh.dest(mesh.next(h)));
        let pd = mesh.position(mesh.dest(mesh.next(h.opposite())));

        let cross = |p: &Point3<f64>, q: &Point3<f64>, r: &Point3<f64>| -> Vector3<f64> {
            (q - p).cross(&(r - p))
        };
        let old = cross(pa, pb, pc) + cross(pb, pa, pd);
        let n1 = cross(pa, pd, pc);
        let n2 = cross(pb, pc, pd);

        let scale = (pc - pd).norm_squared().max((pa - pb).norm_squared());
        let min_double_area = 2.0 * MIN_AREA_FACTOR * scale;
        n1.norm() > min_double_area
            && n2.norm() > min_double_area
            && n1.dot(&old) > 0.0
            && n2.dot(&old) > 0.0
            && n1.dot(&n2) > 0.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use nalgebra::Point3;

    use super::*;
    use crate::algo::remesh::test_meshes::fan;
    use crate::mesh::{EdgeConstraintMap, FaceId, HalfEdgeMesh, VertexId};

    /// Sum of squared deviations from valence 4 on the border, 6 inside.
    fn valence_score(mesh: &HalfEdgeMesh) -> i64 {
        mesh.vertex_ids()
            .map(|v| {
                let target = if mesh.is_boundary_vertex(v) { 4 } else { 6 };
                (mesh.valence(v) as i64 - target).pow(2)
            })
            .sum()
    }

    #[test]
    fn test_each_flip_lowers_valence_score() {
        // Center of valence 8 against a rim of valence 3
        let mut mesh = fan(Point3::origin(), 1.0, 8, 0.0);
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let before = valence_score(&mesh);

        let flips = Remesher::for_test(&mut mesh, &faces, None, None, 1.0).equalize_valences();

        assert!(flips > 0);
        assert!(mesh.is_valid());
        assert!(mesh.valence(VertexId::new(0)) < 8);
        assert!(valence_score(&mesh) + flips as i64 <= before);
    }

    #[test]
    fn test_constrained_edges_never_flip() {
        let mut mesh = fan(Point3::origin(), 1.0, 8, 0.0);
        let spokes: HashSet<EdgeId> = mesh
            .vertex_halfedges(VertexId::new(0))
            .map(|he| he.edge())
            .collect();
        let faces: Vec<FaceId> = mesh.face_ids().collect();

        let flips = Remesher::for_test(
            &mut mesh,
            &faces,
            Some(&spokes as &dyn EdgeConstraintMap<u32>),
            None,
            1.0,
        )
        .equalize_valences();

        assert_eq!(flips, 0);
        assert_eq!(mesh.valence(VertexId::new(0)), 8);
    }

    #[test]
    fn test_flip_across_reflex_corner_is_refused() {
        let mut mesh = fan(Point3::origin(), 1.0, 8, 0.0);
        // Pull rim vertex 1 inside the chord between its rim neighbours
        mesh.set_position(VertexId::new(1), Point3::new(0.3, 0.0, 0.0));
        let spoke = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
        let faces: Vec<FaceId> = mesh.face_ids().collect();

        let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);
        assert!(remesher.flip_improves_valence(spoke));
        assert!(!remesher.flip_keeps_orientation(spoke));
        remesher.equalize_valences();

        assert!(mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).is_some());
        assert!(mesh.is_valid());
    }
}
