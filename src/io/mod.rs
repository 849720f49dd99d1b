//! Reading and writing mesh files.
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | Wavefront OBJ | `.obj` | geometry only, polygons fan-triangulated |
//! | STL | `.stl` | binary or ASCII in, binary out, corners welded on load |
//! | PLY | `.ply` | ASCII or binary in, binary out, optional per-face `patch` ids |
//!
//! Writing compacts the mesh: slots freed by collapses leave no holes in
//! the vertex numbering of the file.
//!
//! [`load`] and [`save`] pick the format from the extension:
//!
//! ```no_run
//! use isomesh::io;
//! use isomesh::mesh::HalfEdgeMesh;
//!
//! let mesh: HalfEdgeMesh = io::load("scan.stl").unwrap();
//! io::save(&mesh, "scan.ply").unwrap();
//! ```
//!
//! Patch ids need the PLY-specific calls:
//!
//! ```no_run
//! use isomesh::io::ply;
//! use isomesh::mesh::HalfEdgeMesh;
//!
//! let (mesh, patches): (HalfEdgeMesh, Vec<usize>) = ply::load_with_patches("parts.ply").unwrap();
//! ply::save_with_patches(&mesh, &patches, "parts_out.ply").unwrap();
//! ```

pub mod obj;
pub mod ply;
pub mod stl;

use std::path::Path;

use crate::error::{MeshError, Result};
use crate::mesh::{HalfEdgeMesh, MeshIndex};

/// A file format known to [`load`] and [`save`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// `.obj`
    Obj,
    /// `.stl`
    Stl,
    /// `.ply`
    Ply,
}

impl Format {
    /// Format for a file extension, ignoring case.
    pub fn from_extension(ext: &str) -> Option<Format> {
        if ext.eq_ignore_ascii_case("obj") {
            Some(Format::Obj)
        } else if ext.eq_ignore_ascii_case("stl") {
            Some(Format::Stl)
        } else if ext.eq_ignore_ascii_case("ply") {
            Some(Format::Ply)
        } else {
            None
        }
    }

    /// Format for the extension of `path`.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        let ext = path.as_ref().extension()?.to_str()?;
        Format::from_extension(ext)
    }
}

/// Read a mesh, choosing the reader by extension.
///
/// # Errors
///
/// [`MeshError::UnsupportedFormat`] for an unknown extension, otherwise
/// whatever the format reader reports.
pub fn load<P: AsRef<Path>, I: MeshIndex>(path: P) -> Result<HalfEdgeMesh<I>> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::load(path),
        Format::Stl => stl::load(path),
        Format::Ply => ply::load(path),
    }
}

/// Write a mesh, choosing the writer by extension.
pub fn save<P: AsRef<Path>, I: MeshIndex>(mesh: &HalfEdgeMesh<I>, path: P) -> Result<()> {
    let path = path.as_ref();
    match detect(path)? {
        Format::Obj => obj::save(mesh, path),
        Format::Stl => stl::save(mesh, path),
        Format::Ply => ply::save(mesh, path),
    }
}

fn detect(path: &Path) -> Result<Format> {
    Format::from_path(path).ok_or_else(|| MeshError::UnsupportedFormat {
        extension: path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default(),
    })
}

/// Wrap a parse failure with the path it came from.
pub(crate) fn load_error(path: &Path, message: impl Into<String>) -> MeshError {
    MeshError::LoadError {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    use crate::mesh::build_from_triangles;

    pub(super) fn create_square() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.25),
        ];
        build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap()
    }

    #[test]
    fn test_format_detection() {
        assert_eq!(Format::from_path("a/b/model.OBJ"), Some(Format::Obj));
        assert_eq!(Format::from_path("model.stl"), Some(Format::Stl));
        assert_eq!(Format::from_path("model.ply"), Some(Format::Ply));
        assert_eq!(Format::from_path("model.glb"), None);
        assert_eq!(Format::from_path("model"), None);
    }

    #[test]
    fn test_unsupported_extension() {
        let mesh = create_square();
        let err = save(&mesh, "out.xyz").unwrap_err();
        assert!(matches!(err, MeshError::UnsupportedFormat { ref extension } if extension == "xyz"));
        assert!(matches!(
            load::<_, u32>("no_extension"),
            Err(MeshError::UnsupportedFormat { .. })
        ));
    }

    #[test]
    fn test_round_trip_all_formats() {
        let mesh = create_square();
        let dir = tempfile::tempdir().unwrap();
        for name in ["square.obj", "square.stl", "square.ply"] {
            let path = dir.path().join(name);
            save(&mesh, &path).unwrap();
            let loaded: HalfEdgeMesh = load(&path).unwrap();
            assert_eq!(loaded.num_vertices(), 4, "{name}");
            assert_eq!(loaded.num_faces(), 2, "{name}");
            assert!((loaded.surface_area() - mesh.surface_area()).abs() < 1e-6, "{name}");
        }
    }
}
