//! Property tests for remeshing a flat grid.

use std::collections::HashSet;

use isomesh::algo::remesh::{isotropic_remesh, RemeshOptions};
use isomesh::prelude::*;
use nalgebra::Point3;
use proptest::prelude::*;

/// `n` x `n` cells covering the unit square.
fn unit_grid(n: usize) -> HalfEdgeMesh {
    let step = 1.0 / n as f64;
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    for j in 0..=n {
        for i in 0..=n {
            vertices.push(Point3::new(i as f64 * step, j as f64 * step, 0.0));
        }
    }
    let mut faces = Vec::with_capacity(2 * n * n);
    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + n + 1;
            let v11 = v01 + 1;
            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }
    build_from_triangles(&vertices, &faces).unwrap()
}

fn on_square_border(p: &Point3<f64>) -> bool {
    let eps = 1e-9;
    let inside = (-eps..=1.0 + eps).contains(&p.x) && (-eps..=1.0 + eps).contains(&p.y);
    let on_side = p.x.abs() < eps || (p.x - 1.0).abs() < eps || p.y.abs() < eps || (p.y - 1.0).abs() < eps;
    inside && on_side && p.z.abs() < eps
}

fn border_edges(mesh: &HalfEdgeMesh) -> HashSet<EdgeId> {
    mesh.edge_ids().filter(|e| mesh.is_boundary_edge(e.halfedge())).collect()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn remeshed_square_stays_a_square(
        n in 1usize..6,
        target in 0.08f64..0.6,
        iterations in 0usize..4,
        parallel in any::<bool>(),
    ) {
        let mut mesh = unit_grid(n);
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let options = RemeshOptions::new().with_iterations(iterations).with_parallel(parallel);

        let report = isotropic_remesh(&mut mesh, &faces, target, options).unwrap();

        prop_assert!(mesh.is_valid());
        prop_assert_eq!(mesh.euler_characteristic(), 1);
        prop_assert!((mesh.surface_area() - 1.0).abs() < 1e-9);
        prop_assert_eq!(report.iterations, iterations);
        prop_assert_eq!(report.final_faces(), mesh.num_faces());

        for v in mesh.vertex_ids() {
            let p = mesh.position(v);
            prop_assert!(p.z.abs() < 1e-9);
            if mesh.is_boundary_vertex(v) {
                prop_assert!(on_square_border(p), "border vertex {:?} left the square", p);
            }
        }
    }

    #[test]
    fn protected_border_is_untouched(
        n in 1usize..5,
        scale in 1.05f64..2.0,
        iterations in 1usize..3,
    ) {
        let mut mesh = unit_grid(n);
        // Border pieces have length 1/n, which stays below 4/3 of the target
        let target = 0.75 / n as f64 * scale;
        let border = border_edges(&mesh);
        let lengths: Vec<(EdgeId, f64)> = border
            .iter()
            .map(|&e| (e, mesh.edge_length(e.halfedge())))
            .collect();
        let faces: Vec<FaceId> = mesh.face_ids().collect();

        isotropic_remesh(
            &mut mesh,
            &faces,
            target,
            RemeshOptions::new().with_iterations(iterations).with_protect_constraints(true),
        )
        .unwrap();

        prop_assert!(mesh.is_valid());
        prop_assert_eq!(border_edges(&mesh), border);
        for (e, length) in lengths {
            prop_assert_eq!(mesh.edge_length(e.halfedge()), length);
        }
    }
}
