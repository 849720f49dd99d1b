//! # isomesh
//!
//! Incremental isotropic remeshing of triangle mesh patches.
//!
//! isomesh rewrites a chosen region of a triangle mesh so that its edges
//! converge toward a target length. The region keeps its shape, and edges
//! or vertices the caller marks as constraints stay where they are.
//!
//! The crate is organised bottom up:
//!
//! - [`mesh`] holds the half-edge mesh, its local edits (split, collapse,
//!   flip) and the property-map traits used for caller-owned constraints.
//! - [`spatial`] has the triangle BVH that answers nearest-point queries.
//! - [`algo::remesh`] runs the split, collapse, flip, relax and project
//!   passes. [`algo::features`] finds sharp creases to feed it.
//! - [`io`] reads and writes OBJ, STL and PLY.
//!
//! ## Remeshing a file
//!
//! ```no_run
//! use isomesh::prelude::*;
//! use isomesh::algo::features::detect_sharp_edges;
//!
//! let mut mesh: HalfEdgeMesh = isomesh::io::load("model.obj")?;
//! let faces: Vec<FaceId> = mesh.face_ids().collect();
//! let mut creases = detect_sharp_edges(&mesh, 60.0)?;
//!
//! let options = RemeshOptions::new()
//!     .with_iterations(5)
//!     .with_edge_constraints(&mut creases);
//! let report = isotropic_remesh(&mut mesh, &faces, 0.05, options)?;
//! println!("{report}");
//!
//! isomesh::io::save(&mesh, "remeshed.obj")?;
//! # Ok::<(), isomesh::MeshError>(())
//! ```
//!
//! ## Remeshing part of a mesh
//!
//! Faces left out of the range are never touched, and the edges between the
//! two sets act as constraints.
//!
//! ```
//! use isomesh::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(2.0, 1.0, 0.0),
//! ];
//! let faces = [[0, 1, 4], [0, 4, 3], [1, 2, 5], [1, 5, 4]];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces)?;
//!
//! let left = [FaceId::new(0), FaceId::new(1)];
//! isotropic_remesh(&mut mesh, &left, 0.3, RemeshOptions::new())?;
//!
//! assert!(mesh.is_valid());
//! assert!(mesh.find_halfedge(VertexId::new(1), VertexId::new(5)).is_some());
//! # Ok::<(), isomesh::MeshError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod io;
pub mod mesh;
pub mod spatial;

pub use error::{MeshError, Result};

/// The mesh type, its ids and the two remeshing entry points.
pub mod prelude {
    pub use crate::algo::remesh::{isotropic_remesh, split_long_edges, RemeshOptions, SplitOptions};
    pub use crate::error::{MeshError, Result};
    pub use crate::mesh::{
        build_from_triangles, to_face_vertex, EdgeConstraintMap, EdgeId, FaceId, FacePatchMap,
        HalfEdgeId, HalfEdgeMesh, MeshIndex, VertexConstraintMap, VertexId,
    };
}

pub use nalgebra;

#[cfg(test)]
mod tests {
    use super::prelude::*;
    use nalgebra::Point3;

    #[test]
    fn test_closed_tetrahedron() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];

        let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_halfedges(), 12);
        assert_eq!(mesh.euler_characteristic(), 2);
        assert!(mesh.is_valid());
        assert!(mesh.vertex_ids().all(|v| !mesh.is_boundary_vertex(v)));
    }

    #[test]
    fn test_remesh_closed_surface_keeps_topology() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
        let all: Vec<FaceId> = mesh.face_ids().collect();

        let report = isotropic_remesh(&mut mesh, &all, 0.3, RemeshOptions::new().with_iterations(2)).unwrap();

        assert!(report.splits > 0);
        assert!(mesh.is_valid());
        assert_eq!(mesh.euler_characteristic(), 2);
    }
}
