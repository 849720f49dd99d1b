//! Wavefront OBJ format support.
//!
//! Only geometry is read: `v` records and the vertex part of `f` records.
//! Texture coordinates, normals, groups and materials are skipped. Face
//! indices may be negative (relative to the end of the vertex list) and may
//! carry `/vt/vn` suffixes.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use nalgebra::Point3;

use super::load_error;
use crate::error::{MeshError, Result};
use crate::mesh::{build_from_triangles, to_face_vertex, HalfEdgeMesh, MeshIndex};

/// Load a mesh from an OBJ file.
///
/// # Example
///
/// ```no_run
/// use isomesh::io::obj;
/// use isomesh::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = obj::load("model.obj").unwrap();
/// ```
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    let reader = BufReader::new(File::open(path)?);
    let (vertices, faces) = parse(reader).map_err(|m| load_error(path, m))?;
    build_from_triangles(&vertices, &faces)
}

fn parse<R: BufRead>(reader: R) -> std::result::Result<(Vec<Point3<f64>>, Vec<[usize; 3]>), String> {
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    for (number, line) in reader.lines().enumerate() {
        let line = line.map_err(|e| e.to_string())?;
        let number = number + 1;
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("v") => {
                let mut coord = || -> std::result::Result<f64, String> {
                    tokens
                        .next()
                        .and_then(|t| t.parse::<f64>().ok())
                        .ok_or_else(|| format!("line {number}: malformed vertex"))
                };
                vertices.push(Point3::new(coord()?, coord()?, coord()?));
            }
            Some("f") => {
                let corners = tokens
                    .map(|t| resolve_index(t, vertices.len()))
                    .collect::<Option<Vec<usize>>>()
                    .ok_or_else(|| format!("line {number}: malformed face index"))?;
                if corners.len() < 3 {
                    return Err(format!("line {number}: face has fewer than 3 corners"));
                }
                for k in 1..corners.len() - 1 {
                    faces.push([corners[0], corners[k], corners[k + 1]]);
                }
            }
            _ => {}
        }
    }

    if faces.is_empty() {
        return Err("OBJ file contains no faces".to_string());
    }
    Ok((vertices, faces))
}

/// Turn an OBJ face token (`7`, `7/1`, `7//3`, `-1`) into a zero-based index.
fn resolve_index(token: &str, num_vertices: usize) -> Option<usize> {
    let raw: i64 = token.split('/').next()?.parse().ok()?;
    match raw {
        0 => None,
        r if r > 0 => Some(r as usize - 1),
        r => num_vertices.checked_sub(r.unsigned_abs() as usize),
    }
}

/// Save a mesh to an OBJ file.
///
/// # Example
///
/// ```no_run
/// use isomesh::io::obj;
/// use isomesh::mesh::HalfEdgeMesh;
///
/// let mesh: HalfEdgeMesh = HalfEdgeMesh::new();
/// obj::save(&mesh, "output.obj").unwrap();
/// ```
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    let mut writer = BufWriter::new(File::create(path)?);
    write(mesh, &mut writer).map_err(|e| MeshError::SaveError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn write<I: MeshIndex, W: Write>(mesh: &HalfEdgeMesh<I>, writer: &mut W) -> std::io::Result<()> {
    let (vertices, faces) = to_face_vertex(mesh);

    writeln!(writer, "# Generated by isomesh")?;
    writeln!(writer, "# {} vertices, {} faces", vertices.len(), faces.len())?;
    for v in &vertices {
        writeln!(writer, "v {} {} {}", v.x, v.y, v.z)?;
    }
    for [a, b, c] in &faces {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_parse_polygon_and_suffixes() {
        let src = "# quad\nv 0 0 0\nv 1 0 0\nv 1 1 0\nv 0 1 0\nvt 0 0\nf 1/1 2//1 3/1/1 -1\n";
        let (vertices, faces) = parse(Cursor::new(src)).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_resolve_index() {
        assert_eq!(resolve_index("3", 5), Some(2));
        assert_eq!(resolve_index("-1", 5), Some(4));
        assert_eq!(resolve_index("-6", 5), None);
        assert_eq!(resolve_index("0", 5), None);
        assert_eq!(resolve_index("x", 5), None);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse(Cursor::new("v 0 0\n")).unwrap_err().contains("line 1"));
        assert!(parse(Cursor::new("v 0 0 0\nf 1 2\n")).unwrap_err().contains("fewer than 3"));
        assert!(parse(Cursor::new("v 0 0 0\n")).unwrap_err().contains("no faces"));
    }

    #[test]
    fn test_write_is_one_based() {
        let mesh = crate::io::tests::create_square();
        let mut out = Vec::new();
        write(&mesh, &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("f 1 2 3"));
        assert!(text.contains("v 0 1 0.25"));
        let (vertices, faces) = parse(Cursor::new(text)).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(faces.len(), 2);
    }
}
