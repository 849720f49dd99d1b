//! Tangential relaxation.
//!
//! Every free vertex moves toward the average of its one-ring, with the
//! normal component of the move removed so the surface is not shrunk.
//! Targets are computed from the positions at the start of the step and
//! applied together; vertices of a face folded by the combined moves are
//! put back.
//!
//! With polyline relaxation enabled, a vertex on exactly two constrained
//! edges slides toward the midpoint of its two polyline neighbours and is
//! snapped back onto the polyline. Vertices where the polyline turns by more
//! than 60 degrees are corners and stay put.

use std::collections::{HashMap, HashSet};

use nalgebra::{Point3, Vector3};
use tracing::trace;

use super::constraints::VertexRole;
use super::engine::Remesher;
use super::options::RelaxationWeighting;
use crate::mesh::{FaceId, MeshIndex, VertexId};
use crate::spatial::closest_point_on_segment;

/// Cosine of the largest turning angle of a polyline that is still smooth.
const CORNER_COS: f64 = 0.5;

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// One Jacobi relaxation step. Returns the number of vertices moved.
    pub(crate) fn relax(&mut self) -> usize {
        let moves: Vec<(VertexId<I>, Point3<f64>)> = self
            .mesh
            .vertex_ids()
            .filter_map(|v| {
                let target = match self.state.vertex_role(self.mesh, v) {
                    VertexRole::Free => self.tangential_target(v),
                    VertexRole::Polyline if self.relax_constraints => self.polyline_target(v),
                    _ => None,
                }?;
                Some((v, target))
            })
            .collect();

        let mut previous: HashMap<VertexId<I>, Point3<f64>> = HashMap::with_capacity(moves.len());
        for &(v, p) in &moves {
            previous.insert(v, *self.mesh.position(v));
            self.mesh.set_position(v, p);
        }
        self.undo_folds(&mut previous);

        for &v in previous.keys() {
            self.mark_touched(v);
        }
        trace!(moved = previous.len(), "relaxation step");
        previous.len()
    }

    /// Neighbouring vertices that moved together can fold a face even when
    /// each move was safe on its own. Put the vertices of every such face
    /// back until no face is folded.
    fn undo_folds(&mut self, previous: &mut HashMap<VertexId<I>, Point3<f64>>) {
        loop {
            let mesh = &*self.mesh;
            let old_position = |v: VertexId<I>| previous.get(&v).copied().unwrap_or(*mesh.position(v));

            let mut faces: Vec<FaceId<I>> = previous.keys().flat_map(|&v| mesh.vertex_faces(v)).collect();
            faces.sort_unstable();
            faces.dedup();

            let revert: HashSet<VertexId<I>> = faces
                .into_iter()
                .filter(|&f| {
                    let [a, b, c] = mesh.face_triangle(f);
                    let (oa, ob, oc) = (old_position(a), old_position(b), old_position(c));
                    let [pa, pb, pc] = mesh.face_positions(f);
                    let old = (ob - oa).cross(&(oc - oa));
                    let new = (pb - pa).cross(&(pc - pa));
                    old.dot(&new) <= 0.0 && old != Vector3::zeros()
                })
                .flat_map(|f| mesh.face_triangle(f))
                .filter(|v| previous.contains_key(v))
                .collect();

            if revert.is_empty() {
                return;
            }
            for v in revert {
                if let Some(p) = previous.remove(&v) {
                    self.mesh.set_position(v, p);
                }
            }
        }
    }

    fn tangential_target(&self, v: VertexId<I>) -> Option<Point3<f64>> {
        let mesh = &*self.mesh;
        let p = *mesh.position(v);
        let normal = mesh.vertex_normal(v);
        if normal == Vector3::zeros() {
            return None;
        }

        let target = match self.weighting {
            RelaxationWeighting::Area => area_weighted_centroid(self, v),
            RelaxationWeighting::Uniform => None,
        }
        .or_else(|| neighbor_average(self, v))?;

        let d = target - p;
        let tangential = d - normal * normal.dot(&d);
        if tangential.norm_squared() == 0.0 {
            return None;
        }
        let moved = p + tangential;
        self.keeps_orientation(v, &moved).then_some(moved)
    }

    /// Positions of the two polyline neighbours of a degree-2 vertex.
    fn polyline_ends(&self, v: VertexId<I>) -> Option<(Point3<f64>, Point3<f64>)> {
        let mesh = &*self.mesh;
        let mut ends = mesh
            .vertex_halfedges(v)
            .filter(|he| self.state.is_constrained_edge(mesh, he.edge()))
            .map(|he| *mesh.position(mesh.dest(he)));
        let first = ends.next()?;
        let second = ends.next()?;
        ends.next().is_none().then_some((first, second))
    }

    /// The polyline through `v` turns by more than 60 degrees at `v`, or
    /// `v` is not an inner polyline vertex at all.
    pub(super) fn is_polyline_corner(&self, v: VertexId<I>) -> bool {
        let Some((p1, p2)) = self.polyline_ends(v) else {
            return true;
        };
        let p = *self.mesh.position(v);
        match (
            (p - p1).try_normalize(f64::MIN_POSITIVE),
            (p2 - p).try_normalize(f64::MIN_POSITIVE),
        ) {
            (Some(incoming), Some(outgoing)) => incoming.dot(&outgoing) < CORNER_COS,
            _ => true,
        }
    }

    fn polyline_target(&self, v: VertexId<I>) -> Option<Point3<f64>> {
        if self.is_polyline_corner(v) {
            return None;
        }
        let (p1, p2) = self.polyline_ends(v)?;
        let p = *self.mesh.position(v);

        let mid = Point3::from((p1.coords + p2.coords) * 0.5);
        let on_first = closest_point_on_segment(&mid, &p1, &p);
        let on_second = closest_point_on_segment(&mid, &p, &p2);
        let moved = if (on_first - mid).norm_squared() <= (on_second - mid).norm_squared() {
            on_first
        } else {
            on_second
        };
        if moved == p {
            return None;
        }
        self.keeps_orientation(v, &moved).then_some(moved)
    }

    /// No face around `v` flips or collapses when `v` moves to `target`.
    fn keeps_orientation(&self, v: VertexId<I>, target: &Point3<f64>) -> bool {
        let mesh = &*self.mesh;
        let p = mesh.position(v);
        mesh.vertex_halfedges(v)
            .filter(|&he| !mesh.is_boundary_halfedge(he))
            .all(|he| {
                let q = mesh.position(mesh.dest(he));
                let r = mesh.position(mesh.dest(mesh.next(he)));
                let old = (q - p).cross(&(r - p));
                let new = (q - target).cross(&(r - target));
                old.dot(&new) > 0.0
            })
    }
}

/// Area-weighted average of the centroids of the faces around `v`.
fn area_weighted_centroid<I: MeshIndex>(r: &Remesher<'_, I>, v: VertexId<I>) -> Option<Point3<f64>> {
    let mut sum = Vector3::zeros();
    let mut total = 0.0;
    for f in r.mesh.vertex_faces(v) {
        let area = r.mesh.face_area(f);
        sum += r.mesh.face_centroid(f).coords * area;
        total += area;
    }
    (total > f64::MIN_POSITIVE).then(|| Point3::from(sum / total))
}

fn neighbor_average<I: MeshIndex>(r: &Remesher<'_, I>, v: VertexId<I>) -> Option<Point3<f64>> {
    let mut sum = Vector3::zeros();
    let mut count = 0usize;
    for w in r.mesh.vertex_neighbors(v) {
        sum += r.mesh.position(w).coords;
        count += 1;
    }
    (count > 0).then(|| Point3::from(sum / count as f64))
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use approx::assert_relative_eq;

    use super::*;
    use crate::algo::remesh::test_meshes::{fan, grid};
    use crate::mesh::{VertexConstraintMap, HalfEdgeMesh};

    fn all_faces(mesh: &HalfEdgeMesh) -> Vec<FaceId> {
        mesh.face_ids().collect()
    }

    #[test]
    fn test_moves_stay_in_tangent_plane() {
        // Off-center apex of a shallow cone
        let mut mesh = fan(Point3::new(0.2, 0.1, 0.0), 1.0, 6, 0.5);
        let apex = VertexId::new(0);
        let start = *mesh.position(apex);
        let normal = mesh.vertex_normal(apex);
        let faces = all_faces(&mesh);

        for weighting in [RelaxationWeighting::Area, RelaxationWeighting::Uniform] {
            mesh.set_position(apex, start);
            let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);
            remesher.weighting = weighting;
            assert_eq!(remesher.relax(), 1);
            assert!(remesher.is_touched(apex));

            let d = mesh.position(apex) - start;
            assert!(d.norm() > 1e-3, "{weighting:?} left the apex in place");
            assert_relative_eq!(d.dot(&normal), 0.0, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_polyline_vertex_slides_to_midpoint() {
        let mut mesh = grid(4, 1.0);
        mesh.set_position(VertexId::new(1), Point3::new(0.1, 0.0, 0.0));
        // Everything but bottom vertex 1 is pinned
        let pinned: HashSet<VertexId> = mesh.vertex_ids().filter(|v| v.index() != 1).collect();
        let faces = all_faces(&mesh);

        let mut remesher = Remesher::for_test(
            &mut mesh,
            &faces,
            None,
            Some(&pinned as &dyn VertexConstraintMap<u32>),
            1.0,
        );
        assert_eq!(remesher.relax(), 0);
        remesher.relax_constraints = true;
        assert_eq!(remesher.relax(), 1);

        assert_relative_eq!(*mesh.position(VertexId::new(1)), Point3::new(0.25, 0.0, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_polyline_corners_stay_fixed() {
        let mut mesh = grid(4, 1.0);
        mesh.set_position(VertexId::new(2), Point3::new(0.3, 0.0, 0.0));
        let faces = all_faces(&mesh);
        let corners: [VertexId; 4] = [0, 4, 20, 24].map(VertexId::new);
        let at_start: Vec<Point3<f64>> = corners.iter().map(|&v| *mesh.position(v)).collect();

        let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);
        remesher.relax_constraints = true;
        assert!(corners.iter().all(|&v| remesher.is_polyline_corner(v)));
        assert!(!remesher.is_polyline_corner(VertexId::new(2)));
        for _ in 0..5 {
            remesher.relax();
        }

        for (v, p) in corners.iter().zip(&at_start) {
            assert_eq!(mesh.position(*v), p);
        }
        let bottom = mesh.position(VertexId::new(2));
        assert_eq!(bottom.y, 0.0);
        assert!(bottom.x > 0.3 && bottom.x < 0.75);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_folded_faces_are_reverted() {
        let mut mesh = grid(2, 2.0);
        let center = VertexId::new(4);
        let faces = all_faces(&mesh);
        let mut remesher = Remesher::for_test(&mut mesh, &faces, None, None, 1.0);

        // Far outside its ring: faces toward the far corner turn over
        let mut previous = HashMap::from([(center, Point3::new(1.0, 1.0, 0.0))]);
        remesher.mesh.set_position(center, Point3::new(3.0, 3.0, 0.0));
        remesher.undo_folds(&mut previous);
        assert!(previous.is_empty());
        assert_eq!(*remesher.mesh.position(center), Point3::new(1.0, 1.0, 0.0));

        // A small move folds nothing and is kept
        let mut previous = HashMap::from([(center, Point3::new(1.0, 1.0, 0.0))]);
        remesher.mesh.set_position(center, Point3::new(1.1, 0.9, 0.0));
        remesher.undo_folds(&mut previous);
        assert_eq!(previous.len(), 1);
        assert_eq!(*remesher.mesh.position(center), Point3::new(1.1, 0.9, 0.0));
    }
}
