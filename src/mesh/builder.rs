//! Mesh construction utilities.
//!
//! This module provides functions for building half-edge meshes from
//! face-vertex lists as commonly found in mesh file formats, and for turning
//! an edited mesh back into compact lists.

use std::collections::HashMap;

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{HalfEdgeId, MeshIndex, VertexId};
use crate::error::{MeshError, Result};

/// Build a half-edge mesh from vertices and triangle faces.
///
/// Faces must be consistently oriented and every edge may be shared by at
/// most two faces. Vertices not referenced by any face are kept as isolated
/// vertices.
///
/// # Example
/// ```
/// use isomesh::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh: HalfEdgeMesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_faces(), 1);
/// assert_eq!(mesh.num_edges(), 3);
/// ```
pub fn build_from_triangles<I: MeshIndex>(
    vertices: &[Point3<f64>],
    faces: &[[usize; 3]],
) -> Result<HalfEdgeMesh<I>> {
    if faces.is_empty() {
        return Err(MeshError::EmptyMesh);
    }
    // Every face adds at most three edges, hence six half-edges
    if vertices.len() > I::LIMIT || faces.len().saturating_mul(6) > I::LIMIT {
        return Err(MeshError::invalid_param(
            "mesh size",
            format!("{} vertices, {} faces", vertices.len(), faces.len()),
            "too large for the index type",
        ));
    }

    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(MeshError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
        if face[0] == face[1] || face[1] == face[2] || face[0] == face[2] {
            return Err(MeshError::DegenerateFace { face: fi });
        }
    }

    let mut mesh = HalfEdgeMesh::with_capacity(vertices.len(), faces.len());

    let vertex_ids: Vec<VertexId<I>> = vertices.iter().map(|&pos| mesh.add_vertex(pos)).collect();

    // Undirected vertex pair -> half-edge leaving the smaller index
    let mut edge_map: HashMap<(usize, usize), HalfEdgeId<I>> = HashMap::new();

    for face in faces {
        let mut ring = [HalfEdgeId::<I>::invalid(); 3];
        for i in 0..3 {
            let (a, b) = (face[i], face[(i + 1) % 3]);
            let key = if a < b { (a, b) } else { (b, a) };
            let base = *edge_map
                .entry(key)
                .or_insert_with(|| mesh.new_edge(vertex_ids[key.0], vertex_ids[key.1]));
            let he = if a < b { base } else { base.opposite() };

            // Second use of the same directed edge: a third face or a flipped neighbour
            if mesh.face_of(he).is_valid() || ring.contains(&he) {
                return Err(MeshError::NonManifoldEdge { v0: a, v1: b });
            }
            ring[i] = he;
        }

        let f = mesh.new_face(ring[0]);
        for i in 0..3 {
            let he = mesh.halfedge_mut(ring[i]);
            he.face = f;
            he.next = ring[(i + 1) % 3];
            he.prev = ring[(i + 2) % 3];
        }
        for i in 0..3 {
            mesh.vertex_mut(vertex_ids[face[i]]).halfedge = ring[i];
        }
    }

    link_boundary_loops(&mut mesh)?;
    fix_boundary_vertex_halfedges(&mut mesh);
    check_vertex_fans(&mesh)?;

    Ok(mesh)
}

/// Link boundary half-edges into proper loops.
fn link_boundary_loops<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) -> Result<()> {
    let boundary_hes: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();

    let mut outgoing: HashMap<usize, HalfEdgeId<I>> = HashMap::new();
    for &he in &boundary_hes {
        let origin = mesh.origin(he).index();
        if outgoing.insert(origin, he).is_some() {
            return Err(MeshError::NonManifold {
                details: format!("vertex {} joins more than one boundary loop", origin),
            });
        }
    }

    for &he in &boundary_hes {
        let dest = mesh.dest(he).index();
        if let Some(&next_he) = outgoing.get(&dest) {
            mesh.halfedge_mut(he).next = next_he;
            mesh.halfedge_mut(next_he).prev = he;
        }
    }

    Ok(())
}

/// Ensure boundary vertices point to a boundary half-edge.
fn fix_boundary_vertex_halfedges<I: MeshIndex>(mesh: &mut HalfEdgeMesh<I>) {
    let boundary: Vec<HalfEdgeId<I>> = mesh
        .halfedge_ids()
        .filter(|&he| mesh.is_boundary_halfedge(he))
        .collect();
    for he in boundary {
        let v = mesh.origin(he);
        mesh.vertex_mut(v).halfedge = he;
    }
}

/// Reject vertices whose faces form more than one fan.
fn check_vertex_fans<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> Result<()> {
    let mut out_degree = vec![0usize; mesh.vertex_capacity()];
    for he in mesh.halfedge_ids() {
        out_degree[mesh.origin(he).index()] += 1;
    }
    for v in mesh.vertex_ids() {
        let expected = out_degree[v.index()];
        if mesh.vertex_halfedges(v).take(expected + 1).count() != expected {
            return Err(MeshError::NonManifold {
                details: format!("vertex {} has more than one fan of faces", v.index()),
            });
        }
    }
    Ok(())
}

/// Convert a half-edge mesh back to a face-vertex representation.
///
/// Removed elements are dropped and the remaining vertices are renumbered in
/// slot order. Returns (vertices, faces) tuple.
pub fn to_face_vertex<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut remap = vec![usize::MAX; mesh.vertex_capacity()];
    let mut vertices = Vec::with_capacity(mesh.num_vertices());
    for v in mesh.vertex_ids() {
        remap[v.index()] = vertices.len();
        vertices.push(*mesh.position(v));
    }

    let faces: Vec<[usize; 3]> = mesh
        .face_ids()
        .map(|f| {
            let [v0, v1, v2] = mesh.face_triangle(f);
            [remap[v0.index()], remap[v1.index()], remap[v2.index()]]
        })
        .collect();

    (vertices, faces)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::FaceId;

    fn single_triangle() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
        ];
        (vertices, vec![[0, 1, 2]])
    }

    fn two_triangles() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, -1.0, 0.0),
        ];
        (vertices, vec![[0, 1, 2], [1, 0, 3]])
    }

    #[test]
    fn test_single_triangle() {
        let (vertices, faces) = single_triangle();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 3);
        assert_eq!(mesh.num_faces(), 1);
        // 3 interior half-edges + 3 boundary half-edges
        assert_eq!(mesh.num_halfedges(), 6);
        assert!(mesh.is_valid());

        for v in mesh.vertex_ids() {
            assert!(mesh.is_boundary_vertex(v));
        }
    }

    #[test]
    fn test_two_triangles() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(mesh.num_edges(), 5);
        assert!(mesh.is_valid());

        let shared = mesh
            .find_halfedge(VertexId::new(0), VertexId::new(1))
            .unwrap();
        assert!(!mesh.is_boundary_edge(shared));
        assert_eq!(mesh.face_of(shared), FaceId::new(0));
        assert_eq!(mesh.face_of(shared.opposite()), FaceId::new(1));
    }

    #[test]
    fn test_roundtrip() {
        let (vertices, faces) = two_triangles();
        let mesh: HalfEdgeMesh<u32> = build_from_triangles(&vertices, &faces).unwrap();

        let (out_verts, out_faces) = to_face_vertex(&mesh);

        assert_eq!(vertices.len(), out_verts.len());
        assert_eq!(faces, out_faces);
    }

    #[test]
    fn test_invalid_vertex_index() {
        let vertices = vec![Point3::new(0.0, 0.0, 0.0)];
        let faces = vec![[0, 1, 2]];

        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::InvalidVertexIndex { .. })));
    }

    #[test]
    fn test_degenerate_face() {
        let (vertices, _) = single_triangle();
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &[[0, 0, 2]]);
        assert!(matches!(result, Err(MeshError::DegenerateFace { face: 0 })));
    }

    #[test]
    fn test_inconsistent_orientation() {
        let (vertices, _) = two_triangles();
        // Both faces traverse 0 -> 1
        let faces = vec![[0, 1, 2], [0, 1, 3]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifoldEdge { .. })));
    }

    #[test]
    fn test_bowtie_vertex_rejected() {
        // Two triangles touching only at vertex 0
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(-1.0, -1.0, 0.0),
        ];
        let faces = vec![[0, 1, 2], [0, 3, 4]];
        let result: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(result, Err(MeshError::NonManifold { .. })));
    }

    #[test]
    fn test_index_type_too_small() {
        let vertices: Vec<Point3<f64>> = (0..3 * 11_000)
            .map(|i| Point3::new((i / 3) as f64 + [0.0, 1.0, 0.0][i % 3], [0.0, 0.0, 1.0][i % 3], 0.0))
            .collect();
        let faces: Vec<[usize; 3]> = (0..11_000).map(|k| [3 * k, 3 * k + 1, 3 * k + 2]).collect();

        let small: Result<HalfEdgeMesh<u16>> = build_from_triangles(&vertices, &faces);
        assert!(matches!(small, Err(MeshError::InvalidParameter { name: "mesh size", .. })));
        let wide: Result<HalfEdgeMesh<u32>> = build_from_triangles(&vertices, &faces);
        assert!(wide.is_ok());
    }
}
