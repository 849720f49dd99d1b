//! Half-edge mesh data structure.
//!
//! This module provides a half-edge (doubly-connected edge list) representation
//! for triangle meshes that supports in-place local edits.
//!
//! # Structure
//!
//! - Each edge is split into two **half-edges** pointing in opposite directions.
//!   The two are always allocated together, so the twin of half-edge `2k` is
//!   `2k + 1` and both belong to edge `k`.
//! - Each half-edge knows its **next** and **prev** half-edge around its face,
//!   its **origin vertex**, and its **incident face**.
//! - Each vertex stores one outgoing half-edge.
//! - Each face stores one half-edge on its boundary.
//!
//! # Boundary Handling
//!
//! Boundary half-edges have an invalid face ID. Boundary loops can be traversed
//! using the `next` pointer on boundary half-edges, and a boundary vertex always
//! stores an outgoing boundary half-edge.
//!
//! # Removal
//!
//! Elements removed by an edit are tombstoned: their slots stay allocated and
//! their IDs are never reused, so IDs held by the caller stay stable across
//! edits. Iterators skip removed elements and the `num_*` counters report live
//! elements only. [`to_face_vertex`](super::to_face_vertex) compacts the mesh.

use std::collections::HashSet;

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, HalfEdgeId, MeshIndex, VertexId};

/// A vertex in the half-edge mesh.
#[derive(Debug, Clone)]
pub struct Vertex<I: MeshIndex = u32> {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// One outgoing half-edge from this vertex.
    /// For boundary vertices, this is guaranteed to be a boundary half-edge.
    pub halfedge: HalfEdgeId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> Vertex<I> {
    /// Create a new isolated vertex at the given position.
    pub fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            halfedge: HalfEdgeId::invalid(),
            removed: false,
        }
    }

    /// Whether this vertex has been removed by an edit.
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A half-edge in the mesh.
///
/// There is no twin field: the twin is [`HalfEdgeId::opposite`].
#[derive(Debug, Clone, Copy)]
pub struct HalfEdge<I: MeshIndex = u32> {
    /// The vertex this half-edge originates from.
    pub origin: VertexId<I>,

    /// The next half-edge around the face (counter-clockwise).
    pub next: HalfEdgeId<I>,

    /// The previous half-edge around the face (clockwise).
    pub prev: HalfEdgeId<I>,

    /// The face this half-edge belongs to.
    /// Invalid for boundary half-edges.
    pub face: FaceId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> HalfEdge<I> {
    /// Create a new unlinked half-edge leaving `origin`.
    pub fn new(origin: VertexId<I>) -> Self {
        Self {
            origin,
            next: HalfEdgeId::invalid(),
            prev: HalfEdgeId::invalid(),
            face: FaceId::invalid(),
            removed: false,
        }
    }

    /// Check if this half-edge is on the boundary.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.face.is_valid()
    }
}

/// A face in the half-edge mesh.
#[derive(Debug, Clone, Copy)]
pub struct Face<I: MeshIndex = u32> {
    /// One half-edge on the boundary of this face.
    pub halfedge: HalfEdgeId<I>,

    pub(crate) removed: bool,
}

impl<I: MeshIndex> Face<I> {
    /// Create a new face with the given half-edge.
    pub fn new(halfedge: HalfEdgeId<I>) -> Self {
        Self {
            halfedge,
            removed: false,
        }
    }

    /// Whether this face has been removed by an edit.
    #[inline]
    pub fn is_removed(&self) -> bool {
        self.removed
    }
}

/// A half-edge mesh data structure for triangle meshes.
#[derive(Debug, Clone)]
pub struct HalfEdgeMesh<I: MeshIndex = u32> {
    pub(crate) vertices: Vec<Vertex<I>>,
    pub(crate) halfedges: Vec<HalfEdge<I>>,
    pub(crate) faces: Vec<Face<I>>,

    live_vertices: usize,
    live_edges: usize,
    live_faces: usize,
}

impl<I: MeshIndex> Default for HalfEdgeMesh<I> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: MeshIndex> HalfEdgeMesh<I> {
    /// Create a new empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            halfedges: Vec::new(),
            faces: Vec::new(),
            live_vertices: 0,
            live_edges: 0,
            live_faces: 0,
        }
    }

    /// Create a mesh with pre-allocated capacity.
    pub fn with_capacity(num_vertices: usize, num_faces: usize) -> Self {
        // E ~ 3F/2 for a closed mesh, slightly more with boundary
        let num_halfedges = num_faces * 3 + num_faces / 2;

        Self {
            vertices: Vec::with_capacity(num_vertices),
            halfedges: Vec::with_capacity(num_halfedges),
            faces: Vec::with_capacity(num_faces),
            live_vertices: 0,
            live_edges: 0,
            live_faces: 0,
        }
    }

    // ==================== Counts ====================

    /// Number of live vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.live_vertices
    }

    /// Number of live half-edges.
    #[inline]
    pub fn num_halfedges(&self) -> usize {
        self.live_edges * 2
    }

    /// Number of live edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.live_edges
    }

    /// Number of live faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.live_faces
    }

    /// Number of vertex slots, including removed vertices.
    #[inline]
    pub fn vertex_capacity(&self) -> usize {
        self.vertices.len()
    }

    /// Number of edge slots, including removed edges.
    #[inline]
    pub fn edge_capacity(&self) -> usize {
        self.halfedges.len() / 2
    }

    /// Number of face slots, including removed faces.
    #[inline]
    pub fn face_capacity(&self) -> usize {
        self.faces.len()
    }

    /// Euler characteristic `V - E + F` of the live mesh.
    pub fn euler_characteristic(&self) -> i64 {
        self.live_vertices as i64 - self.live_edges as i64 + self.live_faces as i64
    }

    // ==================== Element access ====================

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId<I>) -> &Vertex<I> {
        &self.vertices[id.index()]
    }

    #[inline]
    pub(crate) fn vertex_mut(&mut self, id: VertexId<I>) -> &mut Vertex<I> {
        &mut self.vertices[id.index()]
    }

    /// Get a half-edge by ID.
    #[inline]
    pub fn halfedge(&self, id: HalfEdgeId<I>) -> &HalfEdge<I> {
        &self.halfedges[id.index()]
    }

    #[inline]
    pub(crate) fn halfedge_mut(&mut self, id: HalfEdgeId<I>) -> &mut HalfEdge<I> {
        &mut self.halfedges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId<I>) -> &Face<I> {
        &self.faces[id.index()]
    }

    #[inline]
    pub(crate) fn face_mut(&mut self, id: FaceId<I>) -> &mut Face<I> {
        &mut self.faces[id.index()]
    }

    /// Whether `v` names a live vertex of this mesh.
    #[inline]
    pub fn contains_vertex(&self, v: VertexId<I>) -> bool {
        v.is_valid() && v.index() < self.vertices.len() && !self.vertices[v.index()].removed
    }

    /// Whether `e` names a live edge of this mesh.
    #[inline]
    pub fn contains_edge(&self, e: EdgeId<I>) -> bool {
        e.is_valid()
            && e.index() < self.edge_capacity()
            && !self.halfedges[e.halfedge().index()].removed
    }

    /// Whether `he` names a live half-edge of this mesh.
    #[inline]
    pub fn contains_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        he.is_valid() && he.index() < self.halfedges.len() && !self.halfedges[he.index()].removed
    }

    /// Whether `f` names a live face of this mesh.
    #[inline]
    pub fn contains_face(&self, f: FaceId<I>) -> bool {
        f.is_valid() && f.index() < self.faces.len() && !self.faces[f.index()].removed
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId<I>) -> &Point3<f64> {
        &self.vertex(v).position
    }

    /// Set the position of a vertex.
    #[inline]
    pub fn set_position(&mut self, v: VertexId<I>, pos: Point3<f64>) {
        self.vertex_mut(v).position = pos;
    }

    // ==================== Topology Queries ====================

    /// Get the twin (opposite) half-edge.
    #[inline]
    pub fn twin(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        he.opposite()
    }

    /// Get the next half-edge around the face.
    #[inline]
    pub fn next(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).next
    }

    /// Get the previous half-edge around the face.
    #[inline]
    pub fn prev(&self, he: HalfEdgeId<I>) -> HalfEdgeId<I> {
        self.halfedge(he).prev
    }

    /// Get the origin vertex of a half-edge.
    #[inline]
    pub fn origin(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.halfedge(he).origin
    }

    /// Get the destination vertex of a half-edge.
    #[inline]
    pub fn dest(&self, he: HalfEdgeId<I>) -> VertexId<I> {
        self.origin(he.opposite())
    }

    /// Get the face of a half-edge.
    #[inline]
    pub fn face_of(&self, he: HalfEdgeId<I>) -> FaceId<I> {
        self.halfedge(he).face
    }

    /// The two end vertices of an edge.
    #[inline]
    pub fn edge_vertices(&self, e: EdgeId<I>) -> [VertexId<I>; 2] {
        let he = e.halfedge();
        [self.origin(he), self.dest(he)]
    }

    /// The faces on both sides of an edge (either may be invalid on the boundary).
    #[inline]
    pub fn edge_faces(&self, e: EdgeId<I>) -> [FaceId<I>; 2] {
        let he = e.halfedge();
        [self.face_of(he), self.face_of(he.opposite())]
    }

    /// Check if a half-edge is on the boundary.
    #[inline]
    pub fn is_boundary_halfedge(&self, he: HalfEdgeId<I>) -> bool {
        self.halfedge(he).is_boundary()
    }

    /// Check if a vertex is on the boundary.
    ///
    /// Boundary vertices always store an outgoing boundary half-edge, so this is O(1).
    pub fn is_boundary_vertex(&self, v: VertexId<I>) -> bool {
        let he = self.vertex(v).halfedge;
        !he.is_valid() || self.is_boundary_halfedge(he)
    }

    /// Check if an edge (represented by one of its half-edges) is on the boundary.
    #[inline]
    pub fn is_boundary_edge(&self, he: HalfEdgeId<I>) -> bool {
        self.is_boundary_halfedge(he) || self.is_boundary_halfedge(he.opposite())
    }

    /// Find the half-edge going from `from` to `to`, if the two vertices are adjacent.
    pub fn find_halfedge(&self, from: VertexId<I>, to: VertexId<I>) -> Option<HalfEdgeId<I>> {
        self.vertex_halfedges(from).find(|&he| self.dest(he) == to)
    }

    // ==================== Iteration ====================

    /// Iterate over all live vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertices
            .iter()
            .enumerate()
            .filter(|(_, v)| !v.removed)
            .map(|(i, _)| VertexId::new(i))
    }

    /// Iterate over all live half-edge IDs.
    pub fn halfedge_ids(&self) -> impl Iterator<Item = HalfEdgeId<I>> + '_ {
        self.halfedges
            .iter()
            .enumerate()
            .filter(|(_, he)| !he.removed)
            .map(|(i, _)| HalfEdgeId::new(i))
    }

    /// Iterate over all live edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId<I>> + '_ {
        (0..self.edge_capacity())
            .map(EdgeId::new)
            .filter(|e: &EdgeId<I>| !self.halfedges[e.halfedge().index()].removed)
    }

    /// Iterate over all live face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.faces
            .iter()
            .enumerate()
            .filter(|(_, f)| !f.removed)
            .map(|(i, _)| FaceId::new(i))
    }

    /// Iterate over half-edges around a vertex (outgoing half-edges).
    pub fn vertex_halfedges(&self, v: VertexId<I>) -> VertexHalfEdgeIter<'_, I> {
        VertexHalfEdgeIter::new(self, v)
    }

    /// Iterate over vertices adjacent to a vertex.
    pub fn vertex_neighbors(&self, v: VertexId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.vertex_halfedges(v).map(|he| self.dest(he))
    }

    /// Iterate over faces adjacent to a vertex.
    pub fn vertex_faces(&self, v: VertexId<I>) -> impl Iterator<Item = FaceId<I>> + '_ {
        self.vertex_halfedges(v)
            .map(|he| self.face_of(he))
            .filter(|f| f.is_valid())
    }

    /// Iterate over half-edges around a face.
    pub fn face_halfedges(&self, f: FaceId<I>) -> FaceHalfEdgeIter<'_, I> {
        FaceHalfEdgeIter::new(self, f)
    }

    /// Iterate over vertices of a face.
    pub fn face_vertices(&self, f: FaceId<I>) -> impl Iterator<Item = VertexId<I>> + '_ {
        self.face_halfedges(f).map(|he| self.origin(he))
    }

    /// Get the three vertices of a triangular face.
    pub fn face_triangle(&self, f: FaceId<I>) -> [VertexId<I>; 3] {
        let he0 = self.face(f).halfedge;
        let he1 = self.next(he0);
        let he2 = self.next(he1);
        [self.origin(he0), self.origin(he1), self.origin(he2)]
    }

    /// Get the positions of the three vertices of a triangular face.
    pub fn face_positions(&self, f: FaceId<I>) -> [Point3<f64>; 3] {
        let [v0, v1, v2] = self.face_triangle(f);
        [*self.position(v0), *self.position(v1), *self.position(v2)]
    }

    // ==================== Geometry ====================

    /// Compute the unit normal of a face, or zero for a degenerate face.
    pub fn face_normal(&self, f: FaceId<I>) -> Vector3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        (p1 - p0)
            .cross(&(p2 - p0))
            .try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the area of a face.
    pub fn face_area(&self, f: FaceId<I>) -> f64 {
        let [p0, p1, p2] = self.face_positions(f);
        0.5 * (p1 - p0).cross(&(p2 - p0)).norm()
    }

    /// Compute the area-weighted unit normal at a vertex, or zero if undefined.
    pub fn vertex_normal(&self, v: VertexId<I>) -> Vector3<f64> {
        let mut normal = Vector3::zeros();
        for f in self.vertex_faces(v) {
            let [p0, p1, p2] = self.face_positions(f);
            normal += (p1 - p0).cross(&(p2 - p0));
        }
        normal
            .try_normalize(f64::MIN_POSITIVE)
            .unwrap_or_else(Vector3::zeros)
    }

    /// Compute the length of an edge.
    pub fn edge_length(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm()
    }

    /// Compute the squared length of an edge.
    pub fn edge_length_squared(&self, he: HalfEdgeId<I>) -> f64 {
        self.edge_vector(he).norm_squared()
    }

    /// Compute the edge vector (from origin to destination).
    pub fn edge_vector(&self, he: HalfEdgeId<I>) -> Vector3<f64> {
        self.position(self.dest(he)) - self.position(self.origin(he))
    }

    /// Compute the midpoint of an edge.
    pub fn edge_midpoint(&self, he: HalfEdgeId<I>) -> Point3<f64> {
        let p0 = self.position(self.origin(he));
        let p1 = self.position(self.dest(he));
        Point3::from((p0.coords + p1.coords) * 0.5)
    }

    /// Compute the valence (degree) of a vertex.
    pub fn valence(&self, v: VertexId<I>) -> usize {
        self.vertex_halfedges(v).count()
    }

    /// Compute the centroid of a face.
    pub fn face_centroid(&self, f: FaceId<I>) -> Point3<f64> {
        let [p0, p1, p2] = self.face_positions(f);
        Point3::from((p0.coords + p1.coords + p2.coords) / 3.0)
    }

    /// Compute the bounding box of the live vertices.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let mut live = self.vertices.iter().filter(|v| !v.removed);
        let first = live.next()?.position;
        let (mut min, mut max) = (first, first);

        for v in live {
            for i in 0..3 {
                min[i] = min[i].min(v.position[i]);
                max[i] = max[i].max(v.position[i]);
            }
        }

        Some((min, max))
    }

    /// Compute the total surface area of the mesh.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    // ==================== Construction ====================

    /// Add a new isolated vertex and return its ID.
    pub fn add_vertex(&mut self, position: Point3<f64>) -> VertexId<I> {
        let id = VertexId::new(self.vertices.len());
        self.vertices.push(Vertex::new(position));
        self.live_vertices += 1;
        id
    }

    /// Allocate an unlinked edge from `from` to `to`; returns the half-edge `from -> to`.
    pub(crate) fn new_edge(&mut self, from: VertexId<I>, to: VertexId<I>) -> HalfEdgeId<I> {
        let he = HalfEdgeId::new(self.halfedges.len());
        self.halfedges.push(HalfEdge::new(from));
        self.halfedges.push(HalfEdge::new(to));
        self.live_edges += 1;
        he
    }

    /// Allocate a face record pointing at `he` (the caller links the cycle).
    pub(crate) fn new_face(&mut self, he: HalfEdgeId<I>) -> FaceId<I> {
        let id = FaceId::new(self.faces.len());
        self.faces.push(Face::new(he));
        self.live_faces += 1;
        id
    }

    pub(crate) fn remove_vertex(&mut self, v: VertexId<I>) {
        let vertex = self.vertex_mut(v);
        if !vertex.removed {
            vertex.removed = true;
            vertex.halfedge = HalfEdgeId::invalid();
            self.live_vertices -= 1;
        }
    }

    pub(crate) fn remove_edge(&mut self, e: EdgeId<I>) {
        let he = e.halfedge();
        if !self.halfedges[he.index()].removed {
            self.halfedges[he.index()].removed = true;
            self.halfedges[he.opposite().index()].removed = true;
            self.live_edges -= 1;
        }
    }

    pub(crate) fn remove_face(&mut self, f: FaceId<I>) {
        let face = self.face_mut(f);
        if !face.removed {
            face.removed = true;
            self.live_faces -= 1;
        }
    }

    /// Point the vertex at an outgoing boundary half-edge if it has one.
    ///
    /// `start` must be a live outgoing half-edge of `v`.
    pub(crate) fn adjust_outgoing_halfedge(&mut self, v: VertexId<I>, start: HalfEdgeId<I>) {
        self.vertex_mut(v).halfedge = start;
        let boundary = self
            .vertex_halfedges(v)
            .find(|&he| self.is_boundary_halfedge(he));
        if let Some(he) = boundary {
            self.vertex_mut(v).halfedge = he;
        }
    }

    // ==================== Validation ====================

    /// Check that the mesh is a consistent manifold triangle mesh.
    ///
    /// Verifies pointer consistency of every live element, that every face is a
    /// non-degenerate triangle, that no two edges join the same vertex pair, that
    /// every vertex ring is a single fan, and that boundary vertices point at a
    /// boundary half-edge.
    pub fn is_valid(&self) -> bool {
        let live_v = self.vertices.iter().filter(|v| !v.removed).count();
        let live_f = self.faces.iter().filter(|f| !f.removed).count();
        let live_h = self.halfedges.iter().filter(|h| !h.removed).count();
        if live_v != self.live_vertices || live_f != self.live_faces || live_h != self.live_edges * 2 {
            return false;
        }

        // Half-edges
        let mut out_degree = vec![0usize; self.vertices.len()];
        for heid in self.halfedge_ids() {
            let he = self.halfedge(heid);
            if self.halfedge(heid.opposite()).removed {
                return false;
            }
            if !self.contains_vertex(he.origin)
                || !self.contains_halfedge(he.next)
                || !self.contains_halfedge(he.prev)
            {
                return false;
            }
            if self.prev(he.next) != heid || self.next(he.prev) != heid {
                return false;
            }
            if self.origin(he.next) != self.dest(heid) || he.origin == self.dest(heid) {
                return false;
            }
            if self.face_of(he.next) != he.face {
                return false;
            }
            if he.face.is_valid() && !self.contains_face(he.face) {
                return false;
            }
            out_degree[he.origin.index()] += 1;
        }

        // Edges: at least one incident face, no duplicates
        let mut seen: HashSet<(usize, usize)> = HashSet::new();
        for e in self.edge_ids() {
            let he = e.halfedge();
            if self.is_boundary_halfedge(he) && self.is_boundary_halfedge(he.opposite()) {
                return false;
            }
            let [a, b] = self.edge_vertices(e);
            let key = if a < b { (a.index(), b.index()) } else { (b.index(), a.index()) };
            if !seen.insert(key) {
                return false;
            }
        }

        // Faces: triangles with distinct corners
        for f in self.face_ids() {
            let start = self.face(f).halfedge;
            if !self.contains_halfedge(start) || self.face_of(start) != f {
                return false;
            }
            if self.next(self.next(self.next(start))) != start {
                return false;
            }
            let [v0, v1, v2] = self.face_triangle(f);
            if v0 == v1 || v1 == v2 || v0 == v2 {
                return false;
            }
        }

        // Vertices: one fan per vertex, boundary half-edge stored when on the boundary
        for v in self.vertex_ids() {
            let start = self.vertex(v).halfedge;
            if !start.is_valid() {
                if out_degree[v.index()] != 0 {
                    return false;
                }
                continue;
            }
            if !self.contains_halfedge(start) || self.origin(start) != v {
                return false;
            }
            let mut ring = 0;
            let mut has_boundary = false;
            let mut he = start;
            loop {
                ring += 1;
                if ring > out_degree[v.index()] {
                    return false;
                }
                has_boundary |= self.is_boundary_halfedge(he);
                he = self.next(he.opposite());
                if he == start {
                    break;
                }
            }
            if ring != out_degree[v.index()] {
                return false;
            }
            if has_boundary && !self.is_boundary_halfedge(start) {
                return false;
            }
        }

        true
    }
}

/// Iterator over outgoing half-edges around a vertex.
pub struct VertexHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> VertexHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, v: VertexId<I>) -> Self {
        let start = mesh.vertex(v).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for VertexHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;

        // he goes v -> w, its twin w -> v, and the half-edge after the twin leaves v again
        self.current = self.mesh.next(self.current.opposite());

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}

/// Iterator over half-edges around a face.
pub struct FaceHalfEdgeIter<'a, I: MeshIndex = u32> {
    mesh: &'a HalfEdgeMesh<I>,
    start: HalfEdgeId<I>,
    current: HalfEdgeId<I>,
    done: bool,
}

impl<'a, I: MeshIndex> FaceHalfEdgeIter<'a, I> {
    fn new(mesh: &'a HalfEdgeMesh<I>, f: FaceId<I>) -> Self {
        let start = mesh.face(f).halfedge;
        Self {
            mesh,
            start,
            current: start,
            done: !start.is_valid(),
        }
    }
}

impl<'a, I: MeshIndex> Iterator for FaceHalfEdgeIter<'a, I> {
    type Item = HalfEdgeId<I>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let result = self.current;
        self.current = self.mesh.next(self.current);

        if self.current == self.start {
            self.done = true;
        }

        Some(result)
    }
}
