//! Options for isotropic remeshing and edge splitting.

use std::fmt;

use crate::mesh::{EdgeConstraintMap, FacePatchMap, MeshIndex, Projection, VertexConstraintMap};

/// How the relaxation target of a vertex is averaged over its one-ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RelaxationWeighting {
    /// Centroids of the incident faces, weighted by face area.
    #[default]
    Area,
    /// Plain average of the neighbouring vertex positions.
    Uniform,
}

/// Which vertices the projection phase moves back onto the surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProjectionScope {
    /// Vertices created or moved during the current iteration.
    #[default]
    Touched,
    /// Every unconstrained vertex of the patch.
    AllFree,
}

/// Options for [`isotropic_remesh`](super::isotropic_remesh).
///
/// Property maps are borrowed for the duration of the call. The edge
/// constraint map and the face patch map are updated in place as edges and
/// faces are created and removed.
///
/// # Example
/// ```
/// use std::collections::HashSet;
/// use isomesh::algo::remesh::RemeshOptions;
/// use isomesh::mesh::EdgeId;
///
/// let mut sharp: HashSet<EdgeId> = HashSet::new();
/// let options = RemeshOptions::new()
///     .with_iterations(3)
///     .with_protect_constraints(false)
///     .with_edge_constraints(&mut sharp);
/// assert_eq!(options.iterations, 3);
/// ```
pub struct RemeshOptions<'a, I: MeshIndex = u32> {
    /// Number of outer iterations.
    pub iterations: usize,

    /// Never split or collapse constrained edges.
    ///
    /// Requires every constrained edge of the patch to be at most 4/3 of the
    /// target length.
    pub protect_constraints: bool,

    /// Allow collapsing constrained edges (ignored under protection).
    pub collapse_constraints: bool,

    /// Number of tangential relaxation steps per iteration.
    pub relaxation_steps: usize,

    /// Move vertices on constrained polylines along the polyline.
    pub relax_constraints: bool,

    /// Project vertices back onto the input surface after each iteration.
    pub do_project: bool,

    /// Weighting of the relaxation target.
    pub relaxation_weighting: RelaxationWeighting,

    /// Which vertices are projected.
    pub projection_scope: ProjectionScope,

    /// Whether to run projection queries in parallel (default: true).
    pub parallel: bool,

    /// Per-edge constraint flags (read and updated).
    pub edge_constraints: Option<&'a mut dyn EdgeConstraintMap<I>>,

    /// Per-vertex constraint flags.
    pub vertex_constraints: Option<&'a dyn VertexConstraintMap<I>>,

    /// Per-face patch ids (read and updated).
    pub face_patches: Option<&'a mut dyn FacePatchMap<I>>,

    /// Replaces the nearest-point projection onto the input surface.
    pub projection: Option<&'a dyn Projection<I>>,
}

impl<'a, I: MeshIndex> Default for RemeshOptions<'a, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, I: MeshIndex> RemeshOptions<'a, I> {
    /// Options with the default values: one iteration, one relaxation step,
    /// no protection, constrained edges collapsible, projection on.
    pub fn new() -> Self {
        Self {
            iterations: 1,
            protect_constraints: false,
            collapse_constraints: true,
            relaxation_steps: 1,
            relax_constraints: false,
            do_project: true,
            relaxation_weighting: RelaxationWeighting::Area,
            projection_scope: ProjectionScope::Touched,
            parallel: true,
            edge_constraints: None,
            vertex_constraints: None,
            face_patches: None,
            projection: None,
        }
    }

    /// Set the number of outer iterations.
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Set whether constrained edges are protected from split and collapse.
    pub fn with_protect_constraints(mut self, protect: bool) -> Self {
        self.protect_constraints = protect;
        self
    }

    /// Set whether unprotected constrained edges may be collapsed.
    pub fn with_collapse_constraints(mut self, collapse: bool) -> Self {
        self.collapse_constraints = collapse;
        self
    }

    /// Set the number of relaxation steps per iteration.
    pub fn with_relaxation_steps(mut self, steps: usize) -> Self {
        self.relaxation_steps = steps;
        self
    }

    /// Set whether vertices slide along constrained polylines.
    pub fn with_relax_constraints(mut self, relax: bool) -> Self {
        self.relax_constraints = relax;
        self
    }

    /// Enable or disable the projection phase.
    pub fn with_projection_enabled(mut self, do_project: bool) -> Self {
        self.do_project = do_project;
        self
    }

    /// Set the relaxation weighting.
    pub fn with_relaxation_weighting(mut self, weighting: RelaxationWeighting) -> Self {
        self.relaxation_weighting = weighting;
        self
    }

    /// Set which vertices are projected.
    pub fn with_projection_scope(mut self, scope: ProjectionScope) -> Self {
        self.projection_scope = scope;
        self
    }

    /// Set whether to use parallel execution.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Create options for single-threaded execution.
    pub fn sequential(mut self) -> Self {
        self.parallel = false;
        self
    }

    /// Use an edge constraint map.
    pub fn with_edge_constraints(mut self, map: &'a mut dyn EdgeConstraintMap<I>) -> Self {
        self.edge_constraints = Some(map);
        self
    }

    /// Use a vertex constraint map.
    pub fn with_vertex_constraints(mut self, map: &'a dyn VertexConstraintMap<I>) -> Self {
        self.vertex_constraints = Some(map);
        self
    }

    /// Use a face patch map instead of deriving patches from connectivity.
    pub fn with_face_patches(mut self, map: &'a mut dyn FacePatchMap<I>) -> Self {
        self.face_patches = Some(map);
        self
    }

    /// Project with a custom function instead of the input surface.
    ///
    /// No spatial index is built when a projection function is set.
    pub fn with_projection(mut self, projection: &'a dyn Projection<I>) -> Self {
        self.projection = Some(projection);
        self
    }
}

impl<'a, I: MeshIndex> fmt::Debug for RemeshOptions<'a, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RemeshOptions")
            .field("iterations", &self.iterations)
            .field("protect_constraints", &self.protect_constraints)
            .field("collapse_constraints", &self.collapse_constraints)
            .field("relaxation_steps", &self.relaxation_steps)
            .field("relax_constraints", &self.relax_constraints)
            .field("do_project", &self.do_project)
            .field("relaxation_weighting", &self.relaxation_weighting)
            .field("projection_scope", &self.projection_scope)
            .field("parallel", &self.parallel)
            .field("edge_constraints", &self.edge_constraints.is_some())
            .field("vertex_constraints", &self.vertex_constraints.is_some())
            .field("face_patches", &self.face_patches.is_some())
            .field("projection", &self.projection.is_some())
            .finish()
    }
}

/// Options for [`split_long_edges`](super::split_long_edges).
pub struct SplitOptions<'a, I: MeshIndex = u32> {
    /// Sub-edges of a constrained edge are marked constrained.
    pub edge_constraints: Option<&'a mut dyn EdgeConstraintMap<I>>,

    /// Faces created by a split get the patch of the face they came from.
    pub face_patches: Option<&'a mut dyn FacePatchMap<I>>,
}

impl<'a, I: MeshIndex> Default for SplitOptions<'a, I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, I: MeshIndex> SplitOptions<'a, I> {
    /// Options without property maps.
    pub fn new() -> Self {
        Self {
            edge_constraints: None,
            face_patches: None,
        }
    }

    /// Use an edge constraint map.
    pub fn with_edge_constraints(mut self, map: &'a mut dyn EdgeConstraintMap<I>) -> Self {
        self.edge_constraints = Some(map);
        self
    }

    /// Use a face patch map.
    pub fn with_face_patches(mut self, map: &'a mut dyn FacePatchMap<I>) -> Self {
        self.face_patches = Some(map);
        self
    }
}

impl<'a, I: MeshIndex> fmt::Debug for SplitOptions<'a, I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SplitOptions")
            .field("edge_constraints", &self.edge_constraints.is_some())
            .field("face_patches", &self.face_patches.is_some())
            .finish()
    }
}
