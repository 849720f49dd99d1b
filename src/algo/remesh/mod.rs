//! Isotropic remeshing of surface patches.
//!
//! [`isotropic_remesh`] rewrites a set of faces so that edge lengths
//! converge toward a target while the shape of the patch and any declared
//! constraints are preserved (Botsch & Kobbelt, 2004). Every outer iteration
//! runs the same sequence of local passes:
//!
//! 1. **Split** edges longer than 4/3 × target
//! 2. **Collapse** edges shorter than 4/5 × target
//! 3. **Flip** edges to bring valences toward 6 (4 on borders)
//! 4. **Relax** vertices tangentially toward their one-ring centroid
//! 5. **Project** vertices back onto the original surface
//!
//! # Constraints
//!
//! An edge is constrained when the caller marks it in an
//! [`EdgeConstraintMap`](crate::mesh::EdgeConstraintMap), or when it lies on
//! the border of the patch (one side outside the patch or on the mesh
//! boundary, or two sides with different patch ids). Constrained edges are
//! never flipped. Vertices on them only move with
//! [`RemeshOptions::with_relax_constraints`], and then only along their
//! polyline. With [`RemeshOptions::with_protect_constraints`] they are not
//! split or collapsed either; [`split_long_edges`] brings them under the
//! length bound beforehand.
//!
//! # Example
//!
//! ```no_run
//! use isomesh::prelude::*;
//! use isomesh::algo::remesh::{average_edge_length, isotropic_remesh, RemeshOptions};
//!
//! let mut mesh: HalfEdgeMesh = isomesh::io::load("input.obj").unwrap();
//! let faces: Vec<_> = mesh.face_ids().collect();
//! let target = 0.5 * average_edge_length(&mesh);
//!
//! let report = isotropic_remesh(&mut mesh, &faces, target, RemeshOptions::new().with_iterations(5)).unwrap();
//! println!("{report}");
//!
//! isomesh::io::save(&mesh, "output.obj").unwrap();
//! ```
//!
//! # References
//!
//! - Botsch, M., & Kobbelt, L. (2004). "A remeshing approach to multiresolution modeling."
//!   Symposium on Geometry Processing.
//! - Dunyach, M., et al. (2013). "Adaptive remeshing for real-time mesh deformation."
//!   Eurographics.

mod collapse;
mod constraints;
mod engine;
mod flip;
mod options;
mod project;
mod relax;
mod report;
mod split;

pub use engine::{isotropic_remesh, isotropic_remesh_with_progress};
pub use options::{ProjectionScope, RelaxationWeighting, RemeshOptions, SplitOptions};
pub use report::{average_edge_length, edge_statistics, EdgeStatistics, RemeshReport};
pub use split::{split_long_edges, SplitReport};

use nalgebra::Point3;

/// Shape quality of a triangle in `[0, 1]`: 1 for equilateral, 0 for degenerate.
///
/// Computed as `4√3 · area / Σ edge²`.
pub(crate) fn triangle_quality(a: &Point3<f64>, b: &Point3<f64>, c: &Point3<f64>) -> f64 {
    let sum_sq = (b - a).norm_squared() + (c - b).norm_squared() + (a - c).norm_squared();
    if sum_sq <= f64::MIN_POSITIVE {
        return 0.0;
    }
    let area = 0.5 * (b - a).cross(&(c - a)).norm();
    4.0 * 3.0f64.sqrt() * area / sum_sq
}


#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_triangle_quality() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.5, 3.0f64.sqrt() / 2.0, 0.0);
        assert_relative_eq!(triangle_quality(&a, &b, &c), 1.0, epsilon = 1e-12);

        let flat = Point3::new(2.0, 0.0, 0.0);
        assert_relative_eq!(triangle_quality(&a, &b, &flat), 0.0);
        assert_eq!(triangle_quality(&a, &a, &a), 0.0);

        let right = Point3::new(0.0, 1.0, 0.0);
        let q = triangle_quality(&a, &b, &right);
        assert!(q > 0.8 && q < 0.9);
    }
}
