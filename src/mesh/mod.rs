//! Half-edge triangle meshes.
//!
//! [`HalfEdgeMesh`] stores vertices, faces and half-edges in slot vectors.
//! Half-edges are allocated in twin pairs, so every undirected edge has a
//! stable [`EdgeId`] of its own. Removing an element leaves a dead slot
//! behind; ids of live elements never change.
//!
//! Ids are typed ([`VertexId`], [`HalfEdgeId`], [`FaceId`], [`EdgeId`]) and
//! generic over their storage width through [`MeshIndex`].
//!
//! Caller data that must follow the mesh through edits (constraint flags,
//! patch ids, a projection onto some other surface) is reached through the
//! traits in this module rather than stored on the mesh.
//!
//! # Building
//!
//! ```
//! use isomesh::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
//! assert_eq!(mesh.num_edges(), 5);
//!
//! let (_, faces) = to_face_vertex(&mesh);
//! assert_eq!(faces.len(), 2);
//! ```
//!
//! # Editing
//!
//! ```
//! use isomesh::mesh::{build_from_triangles, HalfEdgeMesh, VertexId};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(2.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//! ];
//! let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2]]).unwrap();
//!
//! let h = mesh.find_halfedge(VertexId::new(0), VertexId::new(1)).unwrap();
//! let split = mesh.split_edge(h, mesh.edge_midpoint(h));
//! assert_eq!(mesh.num_faces(), 2);
//! assert_eq!(mesh.position(split.vertex).x, 1.0);
//! assert!(mesh.is_valid());
//! ```

mod builder;
mod edit;
mod halfedge;
mod index;
mod property;

pub use builder::{build_from_triangles, to_face_vertex};
pub use edit::{EdgeCollapse, EdgeSplit, FaceSplit};
pub use halfedge::{Face, FaceHalfEdgeIter, HalfEdge, HalfEdgeMesh, Vertex, VertexHalfEdgeIter};
pub use index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};
pub use property::{EdgeConstraintMap, FacePatchMap, Projection, VertexConstraintMap};
