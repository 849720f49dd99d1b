//! The remeshing driver.

use std::collections::HashSet;

use tracing::{debug, debug_span, info};

use super::constraints::ConstraintState;
use super::options::{ProjectionScope, RelaxationWeighting, RemeshOptions};
use super::project::SurfaceProjector;
use super::report::{edge_statistics_where, RemeshReport};
use crate::algo::{Phase, Progress};
use crate::error::{MeshError, Result};
use crate::mesh::{FaceId, HalfEdgeMesh, MeshIndex, VertexId};

/// Working state shared by the phases of one run.
pub(crate) struct Remesher<'m, I: MeshIndex> {
    pub(super) mesh: &'m mut HalfEdgeMesh<I>,
    pub(super) state: ConstraintState,
    pub(super) projector: Option<SurfaceProjector>,
    touched: Vec<bool>,
    pub(super) low: f64,
    pub(super) high: f64,
    pub(super) protect: bool,
    pub(super) collapse_constraints: bool,
    pub(super) relax_constraints: bool,
    pub(super) weighting: RelaxationWeighting,
    pub(super) scope: ProjectionScope,
    pub(super) parallel: bool,
}

impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Record that `v` was created or moved in the current iteration.
    pub(super) fn mark_touched(&mut self, v: VertexId<I>) {
        if v.index() >= self.touched.len() {
            self.touched.resize(self.mesh.vertex_capacity().max(v.index() + 1), false);
        }
        self.touched[v.index()] = true;
    }

    pub(super) fn is_touched(&self, v: VertexId<I>) -> bool {
        self.touched.get(v.index()).copied().unwrap_or(false)
    }

    fn clear_touched(&mut self) {
        self.touched.clear();
        self.touched.resize(self.mesh.vertex_capacity(), false);
    }
}

#[cfg(test)]
impl<'m, I: MeshIndex> Remesher<'m, I> {
    /// Default options over `faces`, without a reference surface.
    pub(super) fn for_test(
        mesh: &'m mut HalfEdgeMesh<I>,
        faces: &[FaceId<I>],
        edge_map: Option<&dyn crate::mesh::EdgeConstraintMap<I>>,
        vertex_map: Option<&dyn crate::mesh::VertexConstraintMap<I>>,
        target_edge_length: f64,
    ) -> Self {
        let state = ConstraintState::new(mesh, faces, edge_map, vertex_map, None);
        Self {
            mesh,
            state,
            projector: None,
            touched: Vec::new(),
            low: 4.0 / 5.0 * target_edge_length,
            high: 4.0 / 3.0 * target_edge_length,
            protect: false,
            collapse_constraints: true,
            relax_constraints: false,
            weighting: RelaxationWeighting::Area,
            scope: ProjectionScope::Touched,
            parallel: false,
        }
    }
}

/// Remesh the patch `faces` toward edges of length `target_edge_length`.
///
/// Each iteration splits edges longer than 4/3 of the target, collapses
/// edges shorter than 4/5 of it, flips edges to bring vertex valences toward
/// 6 (4 on borders), relaxes vertices tangentially and projects them back
/// onto the original surface. A target of 0 skips splitting and collapsing.
///
/// Vertices outside the patch never move. A face outside the patch is only
/// cut in two when it shares a border edge that gets split, and its pieces
/// stay outside the patch.
///
/// Edges marked in the edge constraint map and edges on the border of the
/// patch are constraints: they are never flipped and their vertices stay put
/// unless [`RemeshOptions::relax_constraints`] is set. On return the edge
/// constraint map marks every piece of a constrained edge and the face
/// patch map holds the patch id of every new face.
///
/// # Errors
///
/// - [`MeshError::InvalidParameter`] for a negative or non-finite target, or
///   a patch vertex with a non-finite coordinate.
/// - [`MeshError::InvalidElement`] for a face that does not exist.
/// - [`MeshError::ConstraintTooLong`] when constraints are protected and a
///   constrained edge is longer than 4/3 of the target. Use
///   [`split_long_edges`](super::split_long_edges) first.
///
/// The mesh is left untouched when an error is returned.
///
/// # Example
/// ```
/// use isomesh::algo::remesh::{isotropic_remesh, RemeshOptions};
/// use isomesh::mesh::{build_from_triangles, HalfEdgeMesh};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mut mesh: HalfEdgeMesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
/// let faces: Vec<_> = mesh.face_ids().collect();
///
/// let report = isotropic_remesh(&mut mesh, &faces, 0.25, RemeshOptions::new().with_iterations(3)).unwrap();
/// assert!(report.splits > 0);
/// assert!(mesh.is_valid());
/// ```
pub fn isotropic_remesh<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    faces: &[FaceId<I>],
    target_edge_length: f64,
    options: RemeshOptions<'_, I>,
) -> Result<RemeshReport<I>> {
    isotropic_remesh_with_progress(mesh, faces, target_edge_length, options, &Progress::none())
}

/// Performs isotropic remeshing with progress reporting.
///
/// The observer is told about every phase boundary; see [`Phase`].
pub fn isotropic_remesh_with_progress<I: MeshIndex>(
    mesh: &mut HalfEdgeMesh<I>,
    faces: &[FaceId<I>],
    target_edge_length: f64,
    options: RemeshOptions<'_, I>,
    progress: &Progress,
) -> Result<RemeshReport<I>> {
    let span = debug_span!("isotropic_remesh", faces = faces.len(), target = target_edge_length);
    let _guard = span.enter();

    let RemeshOptions {
        iterations,
        protect_constraints,
        collapse_constraints,
        relaxation_steps,
        relax_constraints,
        do_project,
        relaxation_weighting,
        projection_scope,
        parallel,
        mut edge_constraints,
        vertex_constraints,
        mut face_patches,
        projection,
    } = options;

    progress.report(0, iterations, Phase::Uninitialized);

    if !target_edge_length.is_finite() || target_edge_length < 0.0 {
        return Err(MeshError::invalid_param(
            "target_edge_length",
            target_edge_length,
            "must be a finite number >= 0",
        ));
    }
    if let Some(f) = faces.iter().find(|&&f| !mesh.contains_face(f)) {
        return Err(MeshError::invalid_element("face", f.index()));
    }

    let mut seen = HashSet::with_capacity(faces.len());
    let faces: Vec<FaceId<I>> = faces.iter().copied().filter(|f| seen.insert(*f)).collect();
    if faces.is_empty() {
        debug!("Empty patch; nothing to remesh");
        progress.report(iterations, iterations, Phase::Done);
        return Ok(RemeshReport::empty());
    }

    for &f in &faces {
        for p in mesh.face_positions(f) {
            if !p.coords.iter().all(|c| c.is_finite()) {
                return Err(MeshError::invalid_param(
                    "vertex position",
                    format!("({}, {}, {})", p.x, p.y, p.z),
                    "patch vertices must have finite coordinates",
                ));
            }
        }
    }

    let state = ConstraintState::new(
        mesh,
        &faces,
        edge_constraints.as_deref(),
        vertex_constraints,
        face_patches.as_deref(),
    );

    let high = 4.0 / 3.0 * target_edge_length;
    let low = 4.0 / 5.0 * target_edge_length;

    if protect_constraints && target_edge_length > 0.0 {
        check_protected_lengths(mesh, &state, high)?;
    }

    let initial_faces = faces.len();
    let initial_stats = edge_statistics_where(mesh, |e| state.is_patch_edge(mesh, e));

    let projector = (do_project && projection.is_none() && iterations > 0)
        .then(|| SurfaceProjector::build(mesh, &state, &faces, parallel));
    if let Some(p) = &projector {
        debug!(patches = p.num_patches(), "Built reference surface");
    }
    progress.report(0, iterations, Phase::Initialized);

    let mut remesher = Remesher {
        mesh,
        state,
        projector,
        touched: Vec::new(),
        low,
        high,
        protect: protect_constraints,
        collapse_constraints,
        relax_constraints,
        weighting: relaxation_weighting,
        scope: projection_scope,
        parallel,
    };

    let mut report = RemeshReport::empty();
    report.initial_faces = initial_faces;
    report.initial_stats = initial_stats;

    for iteration in 0..iterations {
        remesher.clear_touched();
        let mut splits = 0;
        let mut collapses = 0;

        if target_edge_length > 0.0 {
            progress.report(iteration, iterations, Phase::Split);
            splits = remesher.split_long_edges();
            progress.report(iteration, iterations, Phase::Collapse);
            collapses = remesher.collapse_short_edges();
        }

        progress.report(iteration, iterations, Phase::EqualizeValences);
        let flips = remesher.equalize_valences();

        progress.report(iteration, iterations, Phase::Relax);
        let mut relaxed = 0;
        for _ in 0..relaxation_steps {
            relaxed += remesher.relax();
        }

        let mut projected = 0;
        if do_project {
            progress.report(iteration, iterations, Phase::Project);
            projected = remesher.project(projection);
        }

        debug!(
            iteration = iteration + 1,
            splits,
            collapses,
            flips,
            relaxed,
            projected,
            faces = remesher.mesh.num_faces(),
            "Remesh iteration"
        );

        report.iterations += 1;
        report.splits += splits;
        report.collapses += collapses;
        report.flips += flips;
        report.relaxed += relaxed;
        report.projected += projected;
    }

    let Remesher { mesh, state, .. } = remesher;
    state.write_back(mesh, edge_constraints.as_deref_mut(), face_patches.as_deref_mut());

    report.faces = state.patch_faces(mesh);
    report.patches = report.faces.iter().map(|&f| (f, state.patch_of(f))).collect();
    report.final_stats = edge_statistics_where(mesh, |e| state.is_patch_edge(mesh, e));
    progress.report(iterations, iterations, Phase::Done);

    info!(
        iterations,
        splits = report.splits,
        collapses = report.collapses,
        flips = report.flips,
        faces = report.faces.len(),
        "Isotropic remeshing complete"
    );
    Ok(report)
}

/// Fail when a protected constrained edge could never reach the target.
fn check_protected_lengths<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    state: &ConstraintState,
    high: f64,
) -> Result<()> {
    for e in mesh.edge_ids() {
        if !state.is_patch_edge(mesh, e) || !state.is_constrained_edge(mesh, e) {
            continue;
        }
        let length = mesh.edge_length(e.halfedge());
        if length > high {
            return Err(MeshError::ConstraintTooLong {
                edge: e.index(),
                length,
                max_length: high,
            });
        }
    }
    Ok(())
}
