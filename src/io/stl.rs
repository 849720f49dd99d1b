//! STL (stereolithography) format support.
//!
//! STL stores every triangle with its own copy of the corner coordinates.
//! Loading welds corners with bit-identical coordinates back together;
//! nearly coincident corners are kept apart, since merging them could glue
//! unrelated sheets and break manifoldness.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use nalgebra::{Point3, Vector3};

use super::load_error;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Triangles that collapse to
/// a segment or a point after welding are dropped.
///
/// # Example
///
/// ```no_run
/// use isomesh::io::stl;
/// use isomesh::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = stl::load("model.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);

    let stl = stl_io::read_stl(&mut reader).map_err(|e| load_error(path, e.to_string()))?;

    let mut weld: HashMap<[u32; 3], usize> = HashMap::with_capacity(stl.vertices.len());
    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(stl.vertices.len());
    let mut corner = |v: &stl_io::Vertex| -> usize {
        let key = [v[0].to_bits(), v[1].to_bits(), v[2].to_bits()];
        *weld.entry(key).or_insert_with(|| {
            vertices.push(Point3::new(v[0] as f64, v[1] as f64, v[2] as f64));
            vertices.len() - 1
        })
    };

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(stl.faces.len());
    for tri in &stl.faces {
        let [i0, i1, i2] = tri.vertices.map(|k| corner(&stl.vertices[k]));
        if i0 != i1 && i1 != i2 && i0 != i2 {
            faces.push([i0, i1, i2]);
        }
    }

    if faces.is_empty() {
        return Err(load_error(path, "STL file contains no valid triangles"));
    }

    build_from_triangles(&vertices, &faces)
}

/// Save a mesh to a binary STL file.
///
/// Coordinates are stored in single precision, as the format requires.
/// Degenerate faces get a zero normal.
///
/// # Example
///
/// ```no_run
/// use isomesh::io::stl;
/// use isomesh::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// stl::save(&mesh, "output.stl").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);

    let (vertices, faces) = to_face_vertex(mesh);
    let to_f32 = |p: &Point3<f64>| [p.x as f32, p.y as f32, p.z as f32];

    let triangles: Vec<stl_io::Triangle> = faces
        .iter()
        .map(|&[a, b, c]| {
            let (p0, p1, p2) = (&vertices[a], &vertices[b], &vertices[c]);
            let n = (p1 - p0)
                .cross(&(p2 - p0))
                .try_normalize(f64::MIN_POSITIVE)
                .unwrap_or_else(Vector3::zeros);

            stl_io::Triangle {
                normal: stl_io::Normal::new([n.x as f32, n.y as f32, n.z as f32]),
                vertices: [
                    stl_io::Vertex::new(to_f32(p0)),
                    stl_io::Vertex::new(to_f32(p1)),
                    stl_io::Vertex::new(to_f32(p2)),
                ],
            }
        })
        .collect();

    stl_io::write_stl(&mut writer, triangles.iter()).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_ascii_stl_is_welded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("square.stl");
        let mut file = File::create(&path).unwrap();
        write!(
            file,
            "solid square
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 0 0
vertex 1 1 0
endloop
endfacet
facet normal 0 0 1
outer loop
vertex 0 0 0
vertex 1 1 0
vertex 0 1 0
endloop
endfacet
endsolid square
"
        )
        .unwrap();
        drop(file);

        let mesh: HalfEdgeMesh = load(&path).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert!(mesh.is_valid());
    }

    #[test]
    fn test_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let result: Result<HalfEdgeMesh> = load(dir.path().join("missing.stl"));
        assert!(matches!(result, Err(MeshError::Io(_))));
    }
}
