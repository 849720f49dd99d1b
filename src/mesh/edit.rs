//! Local topological edits on a half-edge mesh.
//!
//! These are the only operations that change connectivity after a mesh has
//! been built. Each one leaves a valid manifold triangle mesh behind as long
//! as its guard ([`HalfEdgeMesh::is_collapse_ok`], [`HalfEdgeMesh::is_flip_ok`])
//! accepted the input. None of them look at geometry; deciding whether an edit
//! is geometrically sensible is the caller's job.
//!
//! Naming used throughout: the edited half-edge `h` goes from `a` to `b`. The
//! face on its left is `(a, b, c)` and the face on the twin's left is
//! `(b, a, d)`.

use nalgebra::Point3;

use super::halfedge::HalfEdgeMesh;
use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// One face divided in two by [`HalfEdgeMesh::split_face`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceSplit<I: MeshIndex = u32> {
    /// The face that was divided; it keeps the half containing the first half-edge.
    pub parent: FaceId<I>,
    /// The newly created face.
    pub child: FaceId<I>,
    /// The inserted diagonal, as the half-edge lying in `parent`.
    pub diagonal: HalfEdgeId<I>,
}

/// Result of [`HalfEdgeMesh::split_edge`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdgeSplit<I: MeshIndex = u32> {
    /// The inserted vertex.
    pub vertex: VertexId<I>,
    /// New half-edge from the old origin to the new vertex.
    pub head: HalfEdgeId<I>,
    /// The original half-edge, now running from the new vertex to the old destination.
    pub tail: HalfEdgeId<I>,
    /// Faces divided on either side of the edge (`None` on the boundary).
    pub faces: [Option<FaceSplit<I>>; 2],
}

/// Result of [`HalfEdgeMesh::collapse_edge`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeCollapse<I: MeshIndex = u32> {
    /// The surviving vertex.
    pub kept: VertexId<I>,
    /// The vertex that was merged into `kept` and removed.
    pub removed_vertex: VertexId<I>,
    /// The collapsed edge, now removed.
    pub removed_edge: EdgeId<I>,
    /// Faces that degenerated and were removed.
    pub removed_faces: Vec<FaceId<I>>,
    /// For each removed face, `(kept edge, removed edge)`: the two side edges
    /// that became one. The first survives, the second is gone.
    pub merged_edges: Vec<(EdgeId<I>, EdgeId<I>)>,
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Insert a new vertex at `point` on the edge of `h` and re-triangulate.
    ///
    /// Every face incident to the edge is divided in two by a diagonal from the
    /// new vertex to its opposite corner. The original edge ID survives as the
    /// half from the new vertex to `dest(h)`.
    pub fn split_edge(&mut self, h: HalfEdgeId<I>, point: Point3<f64>) -> EdgeSplit<I> {
        let t = h.opposite();
        let a = self.origin(h);
        let f1 = self.face_of(h);
        let f2 = self.face_of(t);
        let p1 = self.prev(h);
        let q2 = self.next(t);

        let m = self.add_vertex(point);
        let n = self.new_edge(a, m);
        let n1 = n.opposite();

        // h: m -> b, t: b -> m
        self.halfedge_mut(h).origin = m;

        // p1 -> n -> h on the left of h
        self.halfedge_mut(n).face = f1;
        self.halfedge_mut(n).prev = p1;
        self.halfedge_mut(n).next = h;
        self.halfedge_mut(p1).next = n;
        self.halfedge_mut(h).prev = n;

        // t -> n1 -> q2 on the left of t
        self.halfedge_mut(n1).face = f2;
        self.halfedge_mut(n1).prev = t;
        self.halfedge_mut(n1).next = q2;
        self.halfedge_mut(t).next = n1;
        self.halfedge_mut(q2).prev = n1;

        if self.vertex(a).halfedge == h {
            self.vertex_mut(a).halfedge = n;
        }
        self.vertex_mut(m).halfedge = if !f1.is_valid() {
            h
        } else if !f2.is_valid() {
            n1
        } else {
            h
        };

        let left = f1.is_valid().then(|| self.split_face(n, self.next(h)));
        let right = f2.is_valid().then(|| self.split_face(t, self.next(n1)));

        EdgeSplit {
            vertex: m,
            head: n,
            tail: h,
            faces: [left, right],
        }
    }

    /// Divide the face of `h1` and `h2` by a new edge from `dest(h1)` to `dest(h2)`.
    ///
    /// Both half-edges must lie in the same face and must not be consecutive.
    /// The original face keeps the part containing `h1`.
    pub fn split_face(&mut self, h1: HalfEdgeId<I>, h2: HalfEdgeId<I>) -> FaceSplit<I> {
        let f = self.face_of(h1);
        let from = self.dest(h1);
        let to = self.dest(h2);
        let after1 = self.next(h1);
        let after2 = self.next(h2);

        let d = self.new_edge(from, to);
        let d1 = d.opposite();
        let g = self.new_face(d1);

        // f: h1 -> d -> after2 ...
        self.halfedge_mut(h1).next = d;
        self.halfedge_mut(d).prev = h1;
        self.halfedge_mut(d).next = after2;
        self.halfedge_mut(after2).prev = d;
        self.halfedge_mut(d).face = f;
        self.face_mut(f).halfedge = h1;

        // g: after1 ... h2 -> d1
        self.halfedge_mut(h2).next = d1;
        self.halfedge_mut(d1).prev = h2;
        self.halfedge_mut(d1).next = after1;
        self.halfedge_mut(after1).prev = d1;

        let mut he = d1;
        loop {
            self.halfedge_mut(he).face = g;
            he = self.next(he);
            if he == d1 {
                break;
            }
        }

        FaceSplit {
            parent: f,
            child: g,
            diagonal: d,
        }
    }

    /// Whether collapsing `h` (merging its origin into its destination) keeps
    /// the mesh a manifold triangle mesh.
    ///
    /// Checks the link condition (the only common neighbours of the endpoints
    /// are the corners opposite the edge), refuses to pinch the boundary by
    /// collapsing an interior edge between two boundary vertices, refuses to
    /// leave a dangling edge by collapsing a triangle with two boundary sides,
    /// and keeps every opposite corner at a valence of at least three
    /// (two on the boundary).
    pub fn is_collapse_ok(&self, h: HalfEdgeId<I>) -> bool {
        if !self.contains_halfedge(h) {
            return false;
        }
        let t = h.opposite();
        let a = self.origin(h);
        let b = self.dest(h);
        let h_boundary = self.is_boundary_halfedge(h);
        let t_boundary = self.is_boundary_halfedge(t);

        if !h_boundary && !t_boundary && self.is_boundary_vertex(a) && self.is_boundary_vertex(b) {
            return false;
        }

        let mut opposite = [VertexId::<I>::invalid(); 2];
        for (slot, side) in [h, t].into_iter().enumerate() {
            if self.is_boundary_halfedge(side) {
                continue;
            }
            let next = self.next(side);
            let prev = self.prev(side);
            let c = self.dest(next);
            if self.is_boundary_halfedge(next.opposite()) && self.is_boundary_halfedge(prev.opposite())
            {
                return false;
            }
            let min_valence = if self.is_boundary_vertex(c) { 3 } else { 4 };
            if self.valence(c) < min_valence {
                return false;
            }
            opposite[slot] = c;
        }
        if opposite[0] == opposite[1] {
            return false;
        }

        // Link condition
        let b_neighbors: Vec<VertexId<I>> = self.vertex_neighbors(b).collect();
        for x in self.vertex_neighbors(a) {
            if x != b && b_neighbors.contains(&x) && !opposite.contains(&x) {
                return false;
            }
        }

        // Valence of the merged vertex: interior edges share two neighbours, border edges one
        let merged_valence = self.valence(a) + self.valence(b);
        if h_boundary || t_boundary {
            merged_valence >= 3 + 2
        } else {
            merged_valence >= 4 + 3
        }
    }

    /// Merge `origin(h)` into `dest(h)`.
    ///
    /// The kept vertex keeps its position. Requires [`is_collapse_ok`](Self::is_collapse_ok).
    pub fn collapse_edge(&mut self, h: HalfEdgeId<I>) -> EdgeCollapse<I> {
        let t = h.opposite();
        let a = self.origin(h);
        let b = self.dest(h);

        let a_out: Vec<HalfEdgeId<I>> = self.vertex_halfedges(a).collect();

        let mut removed_faces = Vec::with_capacity(2);
        let mut merged_edges = Vec::with_capacity(2);
        let mut touched: Vec<(VertexId<I>, HalfEdgeId<I>)> = Vec::with_capacity(3);
        let mut b_out = HalfEdgeId::invalid();

        // Left of h: (a, b, c). Keep edge b-c, drop edge c-a.
        if self.is_boundary_halfedge(h) {
            let (prev, next) = (self.prev(h), self.next(h));
            self.halfedge_mut(prev).next = next;
            self.halfedge_mut(next).prev = prev;
        } else {
            let f = self.face_of(h);
            let keep = self.next(h);
            let drop = self.prev(h);
            let c = self.origin(drop);
            self.absorb(keep, drop.opposite());
            touched.push((c, keep.opposite()));
            b_out = keep;
            removed_faces.push(f);
            merged_edges.push((keep.edge(), drop.edge()));
            self.remove_edge(drop.edge());
            self.remove_face(f);
        }

        // Left of t: (b, a, d). Keep edge d-b, drop edge a-d.
        if self.is_boundary_halfedge(t) {
            let (prev, next) = (self.prev(t), self.next(t));
            self.halfedge_mut(prev).next = next;
            self.halfedge_mut(next).prev = prev;
        } else {
            let f = self.face_of(t);
            let keep = self.prev(t);
            let drop = self.next(t);
            let d = self.origin(keep);
            self.absorb(keep, drop.opposite());
            touched.push((d, keep));
            if !b_out.is_valid() {
                b_out = keep.opposite();
            }
            removed_faces.push(f);
            merged_edges.push((keep.edge(), drop.edge()));
            self.remove_edge(drop.edge());
            self.remove_face(f);
        }

        if !b_out.is_valid() {
            // Both sides boundary cannot happen in a valid mesh; keep b's current pointer.
            b_out = self.vertex(b).halfedge;
        }

        for he in a_out {
            if self.contains_halfedge(he) && he != h {
                self.halfedge_mut(he).origin = b;
            }
        }

        self.remove_edge(h.edge());
        self.remove_vertex(a);

        touched.push((b, b_out));
        for (v, start) in touched {
            self.adjust_outgoing_halfedge(v, start);
        }

        EdgeCollapse {
            kept: b,
            removed_vertex: a,
            removed_edge: h.edge(),
            removed_faces,
            merged_edges,
        }
    }

    /// Make `keep` take over the position of `old` in its face cycle.
    fn absorb(&mut self, keep: HalfEdgeId<I>, old: HalfEdgeId<I>) {
        let face = self.face_of(old);
        let next = self.next(old);
        let prev = self.prev(old);

        let he = self.halfedge_mut(keep);
        he.face = face;
        he.next = next;
        he.prev = prev;
        self.halfedge_mut(prev).next = keep;
        self.halfedge_mut(next).prev = keep;
        if face.is_valid() && self.face(face).halfedge == old {
            self.face_mut(face).halfedge = keep;
        }
    }

    /// Whether the edge of `h` can be flipped without breaking the mesh.
    ///
    /// The edge must be interior, the new diagonal must not already exist, and
    /// both current endpoints must keep a valence of at least three
    /// (two on the boundary) afterwards.
    pub fn is_flip_ok(&self, h: HalfEdgeId<I>) -> bool {
        if !self.contains_halfedge(h) || self.is_boundary_edge(h) {
            return false;
        }
        let t = h.opposite();
        let a = self.origin(h);
        let b = self.dest(h);
        let c = self.dest(self.next(h));
        let d = self.dest(self.next(t));
        if c == d || self.find_halfedge(c, d).is_some() {
            return false;
        }
        [a, b].iter().all(|&v| {
            let min = if self.is_boundary_vertex(v) { 3 } else { 4 };
            self.valence(v) >= min
        })
    }

    /// Replace the edge `a-b` of `h` by the other diagonal `c-d`.
    ///
    /// The edge ID is preserved; afterwards `h` runs from `d` to `c`.
    /// Requires [`is_flip_ok`](Self::is_flip_ok).
    pub fn flip_edge(&mut self, h: HalfEdgeId<I>) {
        let t = h.opposite();
        let a = self.origin(h);
        let b = self.dest(h);
        let f1 = self.face_of(h);
        let f2 = self.face_of(t);
        let h_next = self.next(h);
        let h_prev = self.prev(h);
        let t_next = self.next(t);
        let t_prev = self.prev(t);
        let c = self.origin(h_prev);
        let d = self.origin(t_prev);

        self.halfedge_mut(h).origin = d;
        self.halfedge_mut(t).origin = c;

        // f1: (a, d, c)
        self.link_triangle(f1, [t_next, h, h_prev]);
        // f2: (b, c, d)
        self.link_triangle(f2, [h_next, t, t_prev]);

        if self.vertex(a).halfedge == h {
            self.vertex_mut(a).halfedge = t_next;
        }
        if self.vertex(b).halfedge == t {
            self.vertex_mut(b).halfedge = h_next;
        }
    }

    fn link_triangle(&mut self, f: FaceId<I>, ring: [HalfEdgeId<I>; 3]) {
        for i in 0..3 {
            let he = self.halfedge_mut(ring[i]);
            he.face = f;
            he.next = ring[(i + 1) % 3];
            he.prev = ring[(i + 2) % 3];
        }
        self.face_mut(f).halfedge = ring[1];
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::build_from_triangles;

    fn create_tetrahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.5, 1.0, 0.0),
            Point3::new(0.5, 0.5, 1.0),
        ];
        let faces = vec![[0, 2, 1], [0, 1, 3], [1, 2, 3], [2, 0, 3]];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn create_octahedron() -> HalfEdgeMesh {
        let vertices = vec![
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(-1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, -1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(0.0, 0.0, -1.0),
        ];
        let faces = vec![
            [0, 2, 4],
            [2, 1, 4],
            [1, 3, 4],
            [3, 0, 4],
            [2, 0, 5],
            [1, 2, 5],
            [3, 1, 5],
            [0, 3, 5],
        ];
        build_from_triangles(&vertices, &faces).unwrap()
    }

    pub(crate) fn create_grid_mesh(n: usize) -> HalfEdgeMesh {
        let mut vertices = Vec::new();
        let mut faces = Vec::new();
        for j in 0..=n {
            for i in 0..=n {
                vertices.push(Point3::new(i as f64, j as f64, 0.0));
            }
        }
        for j in 0..n {
            for i in 0..n {
                let v00 = j * (n + 1) + i;
                let v10 = v00 + 1;
                let v01 = v00 + (n + 1);
                let v11 = v01 + 1;
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    fn he(mesh: &HalfEdgeMesh, a: usize, b: usize) -> HalfEdgeId {
        mesh.find_halfedge(VertexId::new(a), VertexId::new(b)).unwrap()
    }

    #[test]
    fn test_split_interior_edge() {
        let mut mesh = create_tetrahedron();
        let euler = mesh.euler_characteristic();
        let h = he(&mesh, 0, 1);
        let mid = mesh.edge_midpoint(h);
        let edge = h.edge();

        let split = mesh.split_edge(h, mid);

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.euler_characteristic(), euler);
        assert_eq!(split.tail.edge(), edge);
        assert_eq!(mesh.origin(split.head), VertexId::new(0));
        assert_eq!(mesh.dest(split.head), split.vertex);
        assert_eq!(mesh.dest(split.tail), VertexId::new(1));
        assert!(split.faces.iter().all(|s| s.is_some()));
        assert_eq!(mesh.valence(split.vertex), 4);
        assert_eq!(*mesh.position(split.vertex), mid);
    }

    #[test]
    fn test_split_boundary_edge() {
        let mut mesh = create_grid_mesh(1);
        let h = he(&mesh, 0, 1);
        let split = mesh.split_edge(h, mesh.edge_midpoint(h));

        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 3);
        assert!(mesh.is_boundary_vertex(split.vertex));
        assert_eq!(mesh.valence(split.vertex), 3);
        assert_eq!(split.faces.iter().filter(|s| s.is_some()).count(), 1);

        // Splitting from the boundary side gives the same topology
        let mut other = create_grid_mesh(1);
        let t = he(&other, 1, 0);
        other.split_edge(t, other.edge_midpoint(t));
        assert!(other.is_valid());
        assert_eq!(other.num_faces(), 3);
    }

    #[test]
    fn test_repeated_splits_stay_valid() {
        let mut mesh = create_grid_mesh(2);
        for _ in 0..20 {
            let longest = mesh
                .halfedge_ids()
                .max_by(|&x, &y| mesh.edge_length(x).total_cmp(&mesh.edge_length(y)))
                .unwrap();
            mesh.split_edge(longest, mesh.edge_midpoint(longest));
            assert!(mesh.is_valid());
        }
        assert_eq!(mesh.euler_characteristic(), 1);
        assert!((mesh.surface_area() - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_collapse_interior_edge() {
        let mut mesh = create_octahedron();
        let h = he(&mesh, 4, 0);
        assert!(mesh.is_collapse_ok(h));

        let result = mesh.collapse_edge(h);

        assert!(mesh.is_valid());
        assert_eq!(result.kept, VertexId::new(0));
        assert_eq!(result.removed_vertex, VertexId::new(4));
        assert_eq!(result.removed_faces.len(), 2);
        assert_eq!(result.merged_edges.len(), 2);
        assert_eq!(mesh.num_vertices(), 5);
        assert_eq!(mesh.num_faces(), 6);
        assert_eq!(mesh.euler_characteristic(), 2);
        for (kept, removed) in result.merged_edges {
            assert!(mesh.contains_edge(kept));
            assert!(!mesh.contains_edge(removed));
        }
    }

    #[test]
    fn test_collapse_boundary_edge() {
        let mut mesh = create_grid_mesh(2);
        // Boundary edge (0,0)-(1,0), interior vertex 4 is (1,1)
        let h = he(&mesh, 1, 0);
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse_edge(h);
        assert!(mesh.is_valid());
        assert_eq!(mesh.num_faces(), 7);
        assert_eq!(mesh.euler_characteristic(), 1);
    }

    #[test]
    fn test_collapse_interior_vertex_into_boundary() {
        let mut mesh = create_grid_mesh(2);
        let h = he(&mesh, 4, 1);
        assert!(mesh.is_collapse_ok(h));
        mesh.collapse_edge(h);
        assert!(mesh.is_valid());
        assert!(mesh.is_boundary_vertex(VertexId::new(1)));
    }

    #[test]
    fn test_collapse_rejected_cases() {
        // Tetrahedron: opposite corners would drop to valence two
        let mesh = create_tetrahedron();
        assert!(!mesh.is_collapse_ok(he(&mesh, 0, 1)));

        // Interior edge joining two boundary vertices pinches the border
        let grid = create_grid_mesh(1);
        assert!(!grid.is_collapse_ok(he(&grid, 0, 3)));

        // Lone triangle: every side has two boundary neighbours
        let tri: HalfEdgeMesh = build_from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        )
        .unwrap();
        assert!(!tri.is_collapse_ok(he(&tri, 0, 1)));

        // Border edge 0-1 whose endpoints also meet at apex 2 across the mesh
        let tent: HalfEdgeMesh = build_from_triangles(
            &[
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(4.0, 0.0, 0.0),
                Point3::new(2.0, 3.5, 0.0),
                Point3::new(2.0, 0.8, 0.0),
                Point3::new(1.5, 1.8, 0.0),
                Point3::new(2.5, 1.8, 0.0),
            ],
            &[[0, 1, 3], [1, 5, 3], [3, 5, 4], [0, 3, 4], [1, 2, 5], [5, 2, 4], [2, 0, 4]],
        )
        .unwrap();
        assert!(!tent.is_collapse_ok(he(&tent, 0, 1)));
        assert!(tent.is_collapse_ok(he(&tent, 4, 3)));
    }

    #[test]
    fn test_flip_edge() {
        let mut mesh = create_grid_mesh(1);
        // Diagonal 0-3 of the unit square; flipped it becomes 1-2
        let h = he(&mesh, 0, 3);
        let edge = h.edge();
        assert!(mesh.is_flip_ok(h));
        mesh.flip_edge(h);
        assert!(mesh.is_valid());
        assert!(mesh.contains_edge(edge));
        let [p, q] = mesh.edge_vertices(edge);
        let mut ends = [p.index(), q.index()];
        ends.sort();
        assert_eq!(ends, [1, 2]);
        assert_eq!(mesh.valence(VertexId::new(0)), 2);

        let mut big = create_grid_mesh(2);
        let h = he(&big, 0, 4);
        assert!(big.is_flip_ok(h));
        big.flip_edge(h);
        assert!(big.is_valid());
        assert!(big.find_halfedge(VertexId::new(0), VertexId::new(4)).is_none());
        assert!(big.find_halfedge(VertexId::new(1), VertexId::new(3)).is_some());
        assert_eq!(big.euler_characteristic(), 1);
        assert!(big.face_ids().all(|f| big.face_normal(f).z > 0.0));
    }

    #[test]
    fn test_flip_rejects_boundary_and_existing_diagonal() {
        let grid = create_grid_mesh(2);
        assert!(!grid.is_flip_ok(he(&grid, 0, 1)));

        let tet = create_tetrahedron();
        // In a tetrahedron the other diagonal of every edge already exists
        assert!(!tet.is_flip_ok(he(&tet, 0, 1)));
    }
}
