//! Error types for isomesh.
//!
//! Local operations that fail inside the remeshing loop (a rejected collapse,
//! a flip that would fold a face) are not errors; they return `false` or
//! `None` and the candidate is skipped. Everything here aborts a call.

use std::path::PathBuf;

use thiserror::Error;

/// Shorthand for results carrying a [`MeshError`].
pub type Result<T> = std::result::Result<T, MeshError>;

/// Everything that can make an isomesh call fail.
#[derive(Error, Debug)]
pub enum MeshError {
    /// Construction was given no faces.
    #[error("no faces to build a mesh from")]
    EmptyMesh,

    /// A face names a vertex past the end of the vertex list.
    #[error("face {face} uses vertex {vertex}, which does not exist")]
    InvalidVertexIndex {
        /// Position of the face in the input.
        face: usize,
        /// The out-of-range vertex.
        vertex: usize,
    },

    /// A face uses the same vertex twice.
    #[error("face {face} repeats a vertex")]
    DegenerateFace {
        /// Position of the face in the input.
        face: usize,
    },

    /// A vertex whose faces do not form a single fan.
    #[error("non-manifold vertex: {details}")]
    NonManifold {
        /// Which vertex, and how.
        details: String,
    },

    /// An edge shared by more than two faces, or by two faces that traverse
    /// it in the same direction.
    #[error("edge {v0}-{v1} is non-manifold or inconsistently oriented")]
    NonManifoldEdge {
        /// One endpoint, as an input vertex index.
        v0: usize,
        /// The other endpoint.
        v1: usize,
    },

    /// A face or edge handle passed to an operation is out of range or was removed.
    #[error("{kind} {index} does not exist in the mesh")]
    InvalidElement {
        /// Element kind ("face", "edge", "vertex").
        kind: &'static str,
        /// The raw index.
        index: usize,
    },

    /// A constrained edge is longer than protection allows.
    ///
    /// Protected constrained edges can never be split, so the run refuses
    /// to start. Pre-split such edges with
    /// [`split_long_edges`](crate::algo::remesh::split_long_edges).
    #[error("constrained edge {edge} has length {length} > {max_length}; protection cannot be honored")]
    ConstraintTooLong {
        /// Raw index of the offending edge.
        edge: usize,
        /// Its current length.
        length: f64,
        /// The largest admissible length (4/3 of the target).
        max_length: f64,
    },

    /// Opening, reading or writing a file failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A file was read but its contents could not be turned into a mesh.
    #[error("cannot read {path}: {message}")]
    LoadError {
        /// The file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// The format writer failed.
    #[error("cannot write {path}: {message}")]
    SaveError {
        /// The file.
        path: PathBuf,
        /// What went wrong.
        message: String,
    },

    /// No reader or writer for this file extension.
    #[error("no mesh format for extension {extension:?}")]
    UnsupportedFormat {
        /// The extension, empty if the path had none.
        extension: String,
    },

    /// An argument is out of its valid range.
    #[error("{name} = {value}: {reason}")]
    InvalidParameter {
        /// Argument name.
        name: &'static str,
        /// The rejected value, formatted.
        value: String,
        /// The accepted range.
        reason: &'static str,
    },
}

impl MeshError {
    /// Build an [`InvalidParameter`](Self::InvalidParameter) error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        MeshError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Build an [`InvalidElement`](Self::InvalidElement) error.
    pub fn invalid_element(kind: &'static str, index: usize) -> Self {
        MeshError::InvalidElement { kind, index }
    }
}
