//! Constraint state of a remeshing run.
//!
//! The engine copies the caller's property maps into dense per-slot vectors
//! at the start of a run, keeps them in sync with every split and collapse,
//! and writes the result back once the run is over.
//!
//! An edge is *constrained* when the caller marked it, or when it separates
//! the patch from the rest of the mesh (including the mesh border), or when
//! it separates two faces with different patch ids. A vertex is constrained
//! only when the caller marked it.

use crate::mesh::{
    EdgeCollapse, EdgeConstraintMap, EdgeId, EdgeSplit, FaceId, FacePatchMap, HalfEdgeMesh,
    MeshIndex, VertexConstraintMap, VertexId,
};

/// How a vertex may move during relaxation and projection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VertexRole {
    /// No incident face belongs to the patch.
    Outside,
    /// Interior to the patch with no incident constrained edge.
    Free,
    /// On exactly two constrained edges: a point of a feature polyline.
    Polyline,
    /// Explicitly constrained, isolated, a polyline end, or a junction.
    Fixed,
}

#[derive(Debug, Clone)]
pub(crate) struct ConstraintState {
    in_patch: Vec<bool>,
    patch: Vec<usize>,
    edge_constrained: Vec<bool>,
    vertex_constrained: Vec<bool>,
    initial_face_capacity: usize,
}

impl ConstraintState {
    /// Snapshot the caller's maps for the patch `faces`.
    ///
    /// Without a face patch map, patch ids are the connected components of
    /// `faces` across unconstrained edges.
    pub(crate) fn new<I: MeshIndex>(
        mesh: &HalfEdgeMesh<I>,
        faces: &[FaceId<I>],
        edge_map: Option<&dyn EdgeConstraintMap<I>>,
        vertex_map: Option<&dyn VertexConstraintMap<I>>,
        patch_map: Option<&dyn FacePatchMap<I>>,
    ) -> Self {
        let mut in_patch = vec![false; mesh.face_capacity()];
        for &f in faces {
            in_patch[f.index()] = true;
        }

        let edge_constrained: Vec<bool> = (0..mesh.edge_capacity())
            .map(|i| {
                let e = EdgeId::new(i);
                mesh.contains_edge(e) && edge_map.map_or(false, |m| m.is_constrained(e))
            })
            .collect();

        let vertex_constrained: Vec<bool> = (0..mesh.vertex_capacity())
            .map(|i| {
                let v = VertexId::new(i);
                mesh.contains_vertex(v) && vertex_map.map_or(false, |m| m.is_constrained(v))
            })
            .collect();

        let mut state = Self {
            in_patch,
            patch: vec![0; mesh.face_capacity()],
            edge_constrained,
            vertex_constrained,
            initial_face_capacity: mesh.face_capacity(),
        };

        match patch_map {
            Some(map) => {
                for f in mesh.face_ids() {
                    state.patch[f.index()] = map.patch(f);
                }
            }
            None => state.label_components(mesh, faces),
        }

        state
    }

    /// Assign one patch id per connected component of the patch.
    fn label_components<I: MeshIndex>(&mut self, mesh: &HalfEdgeMesh<I>, faces: &[FaceId<I>]) {
        let mut visited = vec![false; mesh.face_capacity()];
        let mut next_id = 0;
        let mut stack = Vec::new();

        for &seed in faces {
            if visited[seed.index()] {
                continue;
            }
            visited[seed.index()] = true;
            stack.push(seed);

            while let Some(f) = stack.pop() {
                self.patch[f.index()] = next_id;
                for he in mesh.face_halfedges(f) {
                    if self.edge_constrained[he.edge().index()] {
                        continue;
                    }
                    let g = mesh.face_of(he.opposite());
                    if g.is_valid() && self.in_patch[g.index()] && !visited[g.index()] {
                        visited[g.index()] = true;
                        stack.push(g);
                    }
                }
            }
            next_id += 1;
        }
    }

    // ==================== Queries ====================

    #[inline]
    pub(crate) fn is_in_patch<I: MeshIndex>(&self, f: FaceId<I>) -> bool {
        f.is_valid() && self.in_patch[f.index()]
    }

    #[inline]
    pub(crate) fn patch_of<I: MeshIndex>(&self, f: FaceId<I>) -> usize {
        self.patch[f.index()]
    }

    /// Constrained by the caller (or inherited from a split).
    #[inline]
    pub(crate) fn is_marked_edge<I: MeshIndex>(&self, e: EdgeId<I>) -> bool {
        self.edge_constrained[e.index()]
    }

    #[inline]
    pub(crate) fn is_constrained_vertex<I: MeshIndex>(&self, v: VertexId<I>) -> bool {
        self.vertex_constrained[v.index()]
    }

    /// At least one side of the edge is a patch face.
    pub(crate) fn is_patch_edge<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> bool {
        let [f0, f1] = mesh.edge_faces(e);
        self.is_in_patch(f0) || self.is_in_patch(f1)
    }

    /// Both sides of the edge are patch faces.
    pub(crate) fn is_patch_interior_edge<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        e: EdgeId<I>,
    ) -> bool {
        let [f0, f1] = mesh.edge_faces(e);
        self.is_in_patch(f0) && self.is_in_patch(f1)
    }

    /// The edge separates the patch from the rest of the mesh, or two patches.
    pub(crate) fn is_patch_border<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> bool {
        let [f0, f1] = mesh.edge_faces(e);
        match (self.is_in_patch(f0), self.is_in_patch(f1)) {
            (true, true) => self.patch[f0.index()] != self.patch[f1.index()],
            (false, false) => false,
            _ => true,
        }
    }

    /// Marked by the caller or lying on a patch border.
    #[inline]
    pub(crate) fn is_constrained_edge<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, e: EdgeId<I>) -> bool {
        self.is_marked_edge(e) || self.is_patch_border(mesh, e)
    }

    /// Number of constrained edges incident to `v`.
    pub(crate) fn constraint_degree<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> usize {
        mesh.vertex_halfedges(v)
            .filter(|he| self.is_constrained_edge(mesh, he.edge()))
            .count()
    }

    /// Every face around `v` is a patch face (and there is at least one).
    pub(crate) fn is_vertex_in_patch<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> bool {
        let mut any = false;
        for he in mesh.vertex_halfedges(v) {
            let f = mesh.face_of(he);
            if f.is_valid() {
                if !self.is_in_patch(f) {
                    return false;
                }
                any = true;
            }
        }
        any
    }

    pub(crate) fn vertex_role<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> VertexRole {
        if !mesh.vertex_faces(v).any(|f| self.is_in_patch(f)) {
            return VertexRole::Outside;
        }
        if self.is_constrained_vertex(v) {
            return VertexRole::Fixed;
        }
        match self.constraint_degree(mesh, v) {
            // No constrained edge implies no border edge, hence all faces in the patch
            0 => VertexRole::Free,
            2 => VertexRole::Polyline,
            _ => VertexRole::Fixed,
        }
    }

    /// Target valence used by the flip phase.
    pub(crate) fn target_valence<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>, v: VertexId<I>) -> usize {
        if mesh.is_boundary_vertex(v) || self.constraint_degree(mesh, v) > 0 {
            4
        } else {
            6
        }
    }

    /// Whether the collapse of `e` may remove vertex `v`.
    pub(crate) fn is_removable<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        v: VertexId<I>,
        e: EdgeId<I>,
        protect: bool,
        collapse_constraints: bool,
    ) -> bool {
        if self.is_constrained_vertex(v) || !self.is_vertex_in_patch(mesh, v) {
            return false;
        }
        if self.is_constrained_edge(mesh, e) {
            // Sliding along a polyline keeps its shape only through degree-2 vertices
            !protect && collapse_constraints && self.constraint_degree(mesh, v) == 2
        } else {
            self.constraint_degree(mesh, v) == 0
        }
    }

    // ==================== Updates ====================

    fn grow<I: MeshIndex>(&mut self, mesh: &HalfEdgeMesh<I>) {
        self.in_patch.resize(mesh.face_capacity(), false);
        self.patch.resize(mesh.face_capacity(), 0);
        self.edge_constrained.resize(mesh.edge_capacity(), false);
        self.vertex_constrained.resize(mesh.vertex_capacity(), false);
    }

    /// Record a split: both halves keep the parent's flag, new faces inherit
    /// the patch membership and id of the face they were cut from.
    pub(crate) fn on_split<I: MeshIndex>(&mut self, mesh: &HalfEdgeMesh<I>, split: &EdgeSplit<I>) {
        self.grow(mesh);
        self.edge_constrained[split.head.edge().index()] = self.edge_constrained[split.tail.edge().index()];
        for fs in split.faces.iter().flatten() {
            self.in_patch[fs.child.index()] = self.in_patch[fs.parent.index()];
            self.patch[fs.child.index()] = self.patch[fs.parent.index()];
            self.edge_constrained[fs.diagonal.edge().index()] = false;
        }
    }

    /// Record a collapse: a surviving edge is constrained if either edge it
    /// was merged with was.
    pub(crate) fn on_collapse<I: MeshIndex>(&mut self, collapse: &EdgeCollapse<I>) {
        for &(kept, removed) in &collapse.merged_edges {
            self.edge_constrained[kept.index()] |= self.edge_constrained[removed.index()];
            self.edge_constrained[removed.index()] = false;
        }
        self.edge_constrained[collapse.removed_edge.index()] = false;
        for &f in &collapse.removed_faces {
            self.in_patch[f.index()] = false;
        }
    }

    /// Live patch faces, in slot order.
    pub(crate) fn patch_faces<I: MeshIndex>(&self, mesh: &HalfEdgeMesh<I>) -> Vec<FaceId<I>> {
        mesh.face_ids().filter(|&f| self.is_in_patch(f)).collect()
    }

    /// Write the final constraint flags and patch ids back to the caller's maps.
    pub(crate) fn write_back<I: MeshIndex>(
        &self,
        mesh: &HalfEdgeMesh<I>,
        edge_map: Option<&mut (dyn EdgeConstraintMap<I> + '_)>,
        patch_map: Option<&mut (dyn FacePatchMap<I> + '_)>,
    ) {
        if let Some(map) = edge_map {
            for i in 0..mesh.edge_capacity() {
                let e = EdgeId::new(i);
                let flag = mesh.contains_edge(e) && self.edge_constrained[i];
                if map.is_constrained(e) != flag {
                    map.set_constrained(e, flag);
                }
            }
        }
        if let Some(map) = patch_map {
            for f in mesh.face_ids() {
                if f.index() >= self.initial_face_capacity {
                    map.set_patch(f, self.patch[f.index()]);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    use nalgebra::Point3;

    use crate::mesh::build_from_triangles;

    /// 2x2 grid of unit squares; vertex 4 is the center.
    fn grid() -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        for j in 0..3 {
            for i in 0..3 {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..2 {
            for i in 0..2 {
                let v00 = j * 3 + i;
                faces.push([v00, v00 + 1, v00 + 4]);
                faces.push([v00, v00 + 4, v00 + 3]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn edge(mesh: &HalfEdgeMesh, a: usize, b: usize) -> EdgeId {
        mesh.find_halfedge(VertexId::new(a), VertexId::new(b)).unwrap().edge()
    }

    #[test]
    fn test_whole_mesh_patch() {
        let mesh = grid();
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let state = ConstraintState::new(&mesh, &faces, None, None, None);

        assert!(state.is_patch_border(&mesh, edge(&mesh, 0, 1)));
        assert!(!state.is_patch_border(&mesh, edge(&mesh, 0, 4)));
        assert_eq!(state.vertex_role(&mesh, VertexId::new(4)), VertexRole::Free);
        assert_eq!(state.vertex_role(&mesh, VertexId::new(1)), VertexRole::Polyline);
        assert_eq!(state.target_valence(&mesh, VertexId::new(4)), 6);
        assert_eq!(state.target_valence(&mesh, VertexId::new(1)), 4);
        assert!(faces.iter().all(|&f| state.patch_of(f) == 0));
    }

    #[test]
    fn test_partial_patch_and_components() {
        let mesh = grid();
        // Faces of the lower-left square only
        let faces = vec![FaceId::new(0), FaceId::new(1)];
        let state = ConstraintState::new(&mesh, &faces, None, None, None);

        assert!(state.is_patch_border(&mesh, edge(&mesh, 1, 4)));
        assert!(!state.is_patch_border(&mesh, edge(&mesh, 0, 4)));
        assert_eq!(state.vertex_role(&mesh, VertexId::new(8)), VertexRole::Outside);
        assert!(!state.is_vertex_in_patch(&mesh, VertexId::new(4)));

        // A marked diagonal cuts the square into two patches
        let mut marked: HashSet<EdgeId> = HashSet::new();
        marked.insert(edge(&mesh, 0, 4));
        let state = ConstraintState::new(&mesh, &faces, Some(&marked), None, None);
        assert_ne!(state.patch_of(FaceId::<u32>::new(0)), state.patch_of(FaceId::<u32>::new(1)));
    }

    #[test]
    fn test_removable_rules() {
        let mesh = grid();
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let center = VertexId::new(4);
        let side = VertexId::new(1);

        let state = ConstraintState::new(&mesh, &faces, None, None, None);
        assert!(state.is_removable(&mesh, center, edge(&mesh, 4, 1), false, true));
        // Border vertex along an interior edge would leave the border
        assert!(!state.is_removable(&mesh, side, edge(&mesh, 1, 4), false, true));
        // Border vertex along the border
        assert!(state.is_removable(&mesh, side, edge(&mesh, 1, 0), false, true));
        assert!(!state.is_removable(&mesh, side, edge(&mesh, 1, 0), true, true));
        assert!(!state.is_removable(&mesh, side, edge(&mesh, 1, 0), false, false));

        let pinned: HashSet<VertexId> = [center].into_iter().collect();
        let state = ConstraintState::new(&mesh, &faces, None, Some(&pinned), None);
        assert!(!state.is_removable(&mesh, center, edge(&mesh, 4, 1), false, true));
        assert_eq!(state.vertex_role(&mesh, center), VertexRole::Fixed);
    }

    #[test]
    fn test_split_and_collapse_bookkeeping() {
        let mut mesh = grid();
        let faces: Vec<FaceId> = mesh.face_ids().collect();
        let mut marked: HashSet<EdgeId> = HashSet::new();
        let border = edge(&mesh, 0, 1);
        marked.insert(border);
        let mut state = ConstraintState::new(&mesh, &faces, Some(&marked), None, None);

        let h = border.halfedge();
        let split = mesh.split_edge(h, mesh.edge_midpoint(h));
        state.on_split(&mesh, &split);
        assert!(state.is_marked_edge(split.head.edge()));
        assert!(state.is_marked_edge(split.tail.edge()));
        for fs in split.faces.iter().flatten() {
            assert!(state.is_in_patch(fs.child));
            assert!(!state.is_marked_edge(fs.diagonal.edge()));
        }

        state.write_back(&mesh, Some(&mut marked), None);
        assert!(marked.contains(&split.head.edge()));
        assert_eq!(marked.len(), 2);

        // Collapse the new vertex back along the marked border
        let back = split.head.opposite();
        assert!(mesh.is_collapse_ok(back));
        let collapse = mesh.collapse_edge(back);
        state.on_collapse(&collapse);
        state.write_back(&mesh, Some(&mut marked), None);
        assert_eq!(marked.len(), 1);
        assert!(mesh.is_valid());
    }
}
