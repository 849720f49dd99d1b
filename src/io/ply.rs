//! PLY (Stanford polygon) format support.
//!
//! Faces may carry an integer `patch` property. It is read into a patch id
//! list by [`load_with_patches`] and written by [`save_with_patches`], so a
//! multi-patch remesh can be stored and resumed.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use super::load_error;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, FacePatchMap, HalfEdgeMesh, MeshIndex};

/// Load a mesh from a PLY file, ignoring any patch ids.
///
/// # Example
///
/// ```no_run
/// use isomesh::io::ply;
/// use isomesh::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = ply::load("model.ply").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    load_with_patches(path).map(|(mesh, _)| mesh)
}

/// Load a mesh and the `patch` property of its faces.
///
/// The returned list is indexed by face id. Faces without the property get
/// patch 0; a polygon split into several triangles gives each the polygon's
/// patch.
pub fn load_with_patches<P: AsRef<Path>, I: MeshIndex>(
    path: P,
) -> Result<(HalfEdgeMesh<I>, Vec<usize>)> {
    let path = path.as_ref();
    let mut reader = BufReader::new(File::open(path)?);
    let (vertices, faces, patches) = parse(&mut reader).map_err(|m| load_error(path, m))?;
    let mesh = build_from_triangles(&vertices, &faces)?;
    Ok((mesh, patches))
}

type Parsed = (Vec<Point3<f64>>, Vec<[usize; 3]>, Vec<usize>);

fn parse<R: BufRead>(reader: &mut R) -> std::result::Result<Parsed, String> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(reader).map_err(|e| e.to_string())?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or("PLY file has no vertex element")?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for (i, vertex) in vertex_element.iter().enumerate() {
        let coord = |name: &str| {
            scalar(vertex, name).ok_or_else(|| format!("vertex {i} has no numeric {name} property"))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply.payload.get("face").ok_or("PLY file has no face element")?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    let mut patches: Vec<usize> = Vec::with_capacity(face_element.len());
    for (i, face) in face_element.iter().enumerate() {
        let indices = index_list(face, "vertex_indices")
            .or_else(|| index_list(face, "vertex_index"))
            .ok_or_else(|| format!("face {i} has no vertex_indices property"))?;
        let patch = match scalar(face, "patch") {
            Some(p) if p >= 0.0 => p as usize,
            Some(p) => return Err(format!("face {i} has negative patch id {p}")),
            None => 0,
        };

        for k in 1..indices.len().saturating_sub(1) {
            faces.push([indices[0], indices[k], indices[k + 1]]);
            patches.push(patch);
        }
    }

    if faces.is_empty() {
        return Err("PLY file contains no faces".to_string());
    }
    Ok((vertices, faces, patches))
}

fn scalar(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn index_list(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

/// Save a mesh to an ASCII PLY file with double precision coordinates.
///
/// # Example
///
/// ```no_run
/// use isomesh::io::ply;
/// use isomesh::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// ply::save(&mesh, "output.ply").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    write_file(mesh, None, path.as_ref())
}

/// Save a mesh with a `patch` property on every face.
pub fn save_with_patches<P: AsRef<Path>, I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    patches: &dyn FacePatchMap<I>,
    path: P,
) -> Result<()> {
    write_file(mesh, Some(patches), path.as_ref())
}

fn write_file<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    patches: Option<&dyn FacePatchMap<I>>,
    path: &Path,
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write(mesh, patches, &mut writer).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write<I: MeshIndex, W: Write>(
    mesh: &HalfEdgeMesh<I>,
    patches: Option<&dyn FacePatchMap<I>>,
    writer: &mut W,
) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "comment Generated by isomesh")?;
    writeln!(writer, "element vertex {}", vertices.len())?;
    for axis in ["x", "y", "z"] {
        writeln!(writer, "property double {axis}")?;
    }
    writeln!(writer, "element face {}", faces.len())?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    if patches.is_some() {
        writeln!(writer, "property int patch")?;
    }
    writeln!(writer, "end_header")?;

    for v in &vertices {
        writeln!(writer, "{} {} {}", v.x, v.y, v.z)?;
    }

    // to_face_vertex lists faces in id order
    for (f, [a, b, c]) in mesh.face_ids().zip(&faces) {
        match patches {
            Some(map) => writeln!(writer, "3 {a} {b} {c} {}", map.patch(f))?,
            None => writeln!(writer, "3 {a} {b} {c}")?,
        }
    }

    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    use crate::mesh::FaceId;

    const QUAD: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
property int patch
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3 5
";

    #[test]
    fn test_parse_quad_with_patch() {
        let (vertices, faces, patches) = parse(&mut Cursor::new(QUAD)).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(faces, vec![[0, 1, 2], [0, 2, 3]]);
        assert_eq!(patches, vec![5, 5]);
    }

    #[test]
    fn test_parse_errors() {
        let no_faces = "ply\nformat ascii 1.0\nelement vertex 1\nproperty float x\nproperty float y\nproperty float z\nend_header\n0 0 0\n";
        assert!(parse(&mut Cursor::new(no_faces)).unwrap_err().contains("no face element"));
        assert!(parse(&mut Cursor::new("not a ply file")).is_err());
    }

    #[test]
    fn test_patch_round_trip() {
        let mesh = crate::io::tests::create_square();
        let patches: Vec<usize> = vec![3, 9];
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patches.ply");

        save_with_patches(&mesh, &patches, &path).unwrap();
        let (loaded, loaded_patches): (HalfEdgeMesh, Vec<usize>) = load_with_patches(&path).unwrap();

        assert_eq!(loaded.num_faces(), 2);
        assert_eq!(loaded_patches, patches);
        assert_eq!(loaded.position(crate::mesh::VertexId::new(3)).z, 0.25);
        assert_eq!(FacePatchMap::patch(&loaded_patches, FaceId::<u32>::new(1)), 9);
    }
}
