//! Feature edge detection.
//!
//! Sharp creases are the usual source of edge constraints: remeshing across
//! them would round them off.

use std::collections::HashSet;

use crate::error::{MeshError, Result};
use crate::mesh::{EdgeId, HalfEdgeMesh, MeshIndex};

/// Find interior edges whose dihedral angle exceeds `angle_degrees`.
///
/// The angle is measured between the normals of the two incident faces, so
/// 0 means flat. Boundary edges are not reported; remeshing constrains them
/// anyway. Edges next to a degenerate face are skipped.
///
/// The result can be passed directly as an edge constraint map.
///
/// # Errors
///
/// [`MeshError::InvalidParameter`] if the angle is not within `[0, 180]`.
///
/// # Example
/// ```
/// use isomesh::algo::features::detect_sharp_edges;
/// use isomesh::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// // Two faces folded 90 degrees along the x axis
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
///     Point3::new(0.5, 0.0, -1.0),
/// ];
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [1, 0, 3]]).unwrap();
///
/// assert_eq!(detect_sharp_edges(&mesh, 60.0).unwrap().len(), 1);
/// assert!(detect_sharp_edges(&mesh, 120.0).unwrap().is_empty());
/// ```
pub fn detect_sharp_edges<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    angle_degrees: f64,
) -> Result<HashSet<EdgeId<I>>> {
    if !(0.0..=180.0).contains(&angle_degrees) {
        return Err(MeshError::invalid_param(
            "angle_degrees",
            angle_degrees,
            "must be between 0 and 180",
        ));
    }
    let cos_threshold = angle_degrees.to_radians().cos();

    let sharp = mesh
        .edge_ids()
        .filter(|&e| {
            let h = e.halfedge();
            if mesh.is_boundary_edge(h) {
                return false;
            }
            let n1 = mesh.face_normal(mesh.face_of(h));
            let n2 = mesh.face_normal(mesh.face_of(h.opposite()));
            match (n1.try_normalize(f64::MIN_POSITIVE), n2.try_normalize(f64::MIN_POSITIVE)) {
                (Some(n1), Some(n2)) => n1.dot(&n2) < cos_threshold,
                _ => false,
            }
        })
        .collect();
    Ok(sharp)
}
