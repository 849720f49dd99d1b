//! Bounding volume hierarchy over a triangle soup.
//!
//! The tree is built once by median splits along the longest axis of each
//! node's bounds and answers nearest-point queries by branch and bound: a
//! subtree is skipped as soon as its box is farther away than the best
//! candidate found so far.

use nalgebra::Point3;

use super::query::closest_point_on_triangle;

/// Maximum number of triangles stored in a leaf.
const MAX_LEAF_SIZE: usize = 8;

/// Axis-aligned bounding box.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner.
    pub min: Point3<f64>,
    /// Maximum corner.
    pub max: Point3<f64>,
}

impl Default for Aabb {
    fn default() -> Self {
        Self::empty()
    }
}

impl Aabb {
    /// An empty (inverted) box that any point expands.
    pub fn empty() -> Self {
        Self {
            min: Point3::new(f64::MAX, f64::MAX, f64::MAX),
            max: Point3::new(f64::MIN, f64::MIN, f64::MIN),
        }
    }

    /// The bounds of a triangle.
    pub fn from_triangle(triangle: &[Point3<f64>; 3]) -> Self {
        let mut bbox = Self::empty();
        for p in triangle {
            bbox.expand_point(p);
        }
        bbox
    }

    /// Grow to include a point.
    pub fn expand_point(&mut self, p: &Point3<f64>) {
        for i in 0..3 {
            self.min[i] = self.min[i].min(p[i]);
            self.max[i] = self.max[i].max(p[i]);
        }
    }

    /// Grow to include another box.
    pub fn expand(&mut self, other: &Self) {
        self.expand_point(&other.min);
        self.expand_point(&other.max);
    }

    /// Center of the box.
    pub fn center(&self) -> Point3<f64> {
        Point3::from((self.min.coords + self.max.coords) * 0.5)
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z).
    pub fn longest_axis(&self) -> usize {
        let d = self.max - self.min;
        if d.x >= d.y && d.x >= d.z {
            0
        } else if d.y >= d.z {
            1
        } else {
            2
        }
    }

    /// Whether the box contains at least one point.
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Squared distance from `p` to the box (zero inside).
    pub fn distance_squared(&self, p: &Point3<f64>) -> f64 {
        let mut d = 0.0;
        for i in 0..3 {
            let excess = (self.min[i] - p[i]).max(p[i] - self.max[i]).max(0.0);
            d += excess * excess;
        }
        d
    }
}

/// Result of [`TriangleBvh::nearest_point`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestPoint {
    /// Closest point on the surface.
    pub point: Point3<f64>,
    /// Index of the triangle containing `point`, in build order.
    pub triangle: usize,
    /// Squared distance from the query to `point`.
    pub distance_squared: f64,
}

#[derive(Debug)]
enum BvhNode {
    Leaf {
        bbox: Aabb,
        triangles: Vec<usize>,
    },
    Internal {
        bbox: Aabb,
        left: Box<BvhNode>,
        right: Box<BvhNode>,
    },
}

impl BvhNode {
    fn bbox(&self) -> &Aabb {
        match self {
            Self::Leaf { bbox, .. } | Self::Internal { bbox, .. } => bbox,
        }
    }
}

/// Nearest-point acceleration structure over a fixed set of triangles.
///
/// The triangles are copied at build time, so the tree keeps answering
/// queries against the original geometry while the mesh it came from is
/// edited.
///
/// # Example
/// ```
/// use isomesh::spatial::TriangleBvh;
/// use nalgebra::Point3;
///
/// let bvh = TriangleBvh::build(vec![[
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ]]);
/// let hit = bvh.nearest_point(&Point3::new(0.1, 0.1, 1.0)).unwrap();
/// assert_eq!(hit.triangle, 0);
/// assert!((hit.distance_squared - 1.0).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct TriangleBvh {
    triangles: Vec<[Point3<f64>; 3]>,
    root: Option<BvhNode>,
}

impl TriangleBvh {
    /// Build a tree over `triangles`.
    pub fn build(triangles: Vec<[Point3<f64>; 3]>) -> Self {
        if triangles.is_empty() {
            return Self {
                triangles,
                root: None,
            };
        }

        let boxes: Vec<(Aabb, Point3<f64>)> = triangles
            .iter()
            .map(|t| {
                let bbox = Aabb::from_triangle(t);
                (bbox, bbox.center())
            })
            .collect();
        let indices: Vec<usize> = (0..triangles.len()).collect();
        let root = Self::build_recursive(&boxes, indices);

        Self {
            triangles,
            root: Some(root),
        }
    }

    fn build_recursive(boxes: &[(Aabb, Point3<f64>)], mut indices: Vec<usize>) -> BvhNode {
        let mut bbox = Aabb::empty();
        for &i in &indices {
            bbox.expand(&boxes[i].0);
        }

        if indices.len() <= MAX_LEAF_SIZE {
            return BvhNode::Leaf {
                bbox,
                triangles: indices,
            };
        }

        // Split by centroid bounds so coincident boxes still separate
        let mut centroid_bounds = Aabb::empty();
        for &i in &indices {
            centroid_bounds.expand_point(&boxes[i].1);
        }
        let axis = centroid_bounds.longest_axis();

        let mid = indices.len() / 2;
        indices.select_nth_unstable_by(mid, |&a, &b| {
            boxes[a].1[axis].total_cmp(&boxes[b].1[axis])
        });
        let right_indices = indices.split_off(mid);

        let left = Self::build_recursive(boxes, indices);
        let right = Self::build_recursive(boxes, right_indices);

        BvhNode::Internal {
            bbox,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Number of triangles in the tree.
    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    /// Whether the tree holds no triangles.
    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// The triangle stored at `index`.
    pub fn triangle(&self, index: usize) -> &[Point3<f64>; 3] {
        &self.triangles[index]
    }

    /// Bounds of all triangles, if any.
    pub fn bounds(&self) -> Option<Aabb> {
        self.root.as_ref().map(|n| *n.bbox())
    }

    /// Find the point on the stored triangles closest to `p`.
    ///
    /// Returns `None` for an empty tree.
    pub fn nearest_point(&self, p: &Point3<f64>) -> Option<NearestPoint> {
        let root = self.root.as_ref()?;
        let mut best: Option<NearestPoint> = None;
        self.nearest_recursive(root, p, &mut best);
        best
    }

    fn nearest_recursive(&self, node: &BvhNode, p: &Point3<f64>, best: &mut Option<NearestPoint>) {
        let bound = best.map_or(f64::INFINITY, |b| b.distance_squared);
        if node.bbox().distance_squared(p) > bound {
            return;
        }

        match node {
            BvhNode::Leaf { triangles, .. } => {
                for &t in triangles {
                    let q = closest_point_on_triangle(p, &self.triangles[t]);
                    let d = (q - p).norm_squared();
                    if best.map_or(true, |b| d < b.distance_squared) {
                        *best = Some(NearestPoint {
                            point: q,
                            triangle: t,
                            distance_squared: d,
                        });
                    }
                }
            }
            BvhNode::Internal { left, right, .. } => {
                let dl = left.bbox().distance_squared(p);
                let dr = right.bbox().distance_squared(p);
                let (near, far) = if dl <= dr { (left, right) } else { (right, left) };
                self.nearest_recursive(near, p, best);
                self.nearest_recursive(far, p, best);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn grid_triangles(n: usize) -> Vec<[Point3<f64>; 3]> {
        let mut tris = Vec::new();
        for j in 0..n {
            for i in 0..n {
                let (x, y) = (i as f64, j as f64);
                let p00 = Point3::new(x, y, 0.0);
                let p10 = Point3::new(x + 1.0, y, 0.0);
                let p01 = Point3::new(x, y + 1.0, 0.0);
                let p11 = Point3::new(x + 1.0, y + 1.0, 0.0);
                tris.push([p00, p10, p11]);
                tris.push([p00, p11, p01]);
            }
        }
        tris
    }

    fn brute_force(tris: &[[Point3<f64>; 3]], p: &Point3<f64>) -> f64 {
        tris.iter()
            .map(|t| (closest_point_on_triangle(p, t) - p).norm_squared())
            .fold(f64::INFINITY, f64::min)
    }

    #[test]
    fn test_aabb() {
        let mut bbox = Aabb::empty();
        assert!(!bbox.is_valid());
        bbox.expand_point(&Point3::new(0.0, 0.0, 0.0));
        bbox.expand_point(&Point3::new(2.0, 1.0, 0.5));
        assert!(bbox.is_valid());
        assert_eq!(bbox.longest_axis(), 0);
        assert_relative_eq!(bbox.center(), Point3::new(1.0, 0.5, 0.25));
        assert_eq!(bbox.distance_squared(&Point3::new(1.0, 0.5, 0.25)), 0.0);
        assert_relative_eq!(bbox.distance_squared(&Point3::new(3.0, 0.5, 0.25)), 1.0);
    }

    #[test]
    fn test_empty_tree() {
        let bvh = TriangleBvh::build(Vec::new());
        assert!(bvh.is_empty());
        assert!(bvh.bounds().is_none());
        assert!(bvh.nearest_point(&Point3::origin()).is_none());
    }

    #[test]
    fn test_matches_brute_force() {
        let tris = grid_triangles(12);
        let bvh = TriangleBvh::build(tris.clone());
        assert_eq!(bvh.len(), tris.len());

        let queries = [
            Point3::new(0.3, 0.7, 1.0),
            Point3::new(5.5, 5.5, -2.0),
            Point3::new(-3.0, 4.0, 0.0),
            Point3::new(11.9, 13.0, 0.5),
            Point3::new(6.25, 0.1, 0.0),
        ];
        for q in &queries {
            let hit = bvh.nearest_point(q).unwrap();
            assert_relative_eq!(hit.distance_squared, brute_force(&tris, q), epsilon = 1e-12);
            let on_tri = closest_point_on_triangle(q, bvh.triangle(hit.triangle));
            assert_relative_eq!(on_tri, hit.point, epsilon = 1e-12);
        }
    }

    #[test]
    fn test_hit_reports_build_order_index() {
        let tris: Vec<[Point3<f64>; 3]> = (0..5000)
            .map(|k| {
                let x = 2.0 * k as f64;
                [
                    Point3::new(x, 0.0, 0.0),
                    Point3::new(x + 1.0, 0.0, 0.0),
                    Point3::new(x, 1.0, 0.0),
                ]
            })
            .collect();
        let bvh = TriangleBvh::build(tris.clone());

        for k in [0, 1, 777, 2500, 4999] {
            let [a, b, c] = tris[k];
            let centroid = Point3::from((a.coords + b.coords + c.coords) / 3.0);
            let hit = bvh.nearest_point(&centroid).unwrap();
            assert_eq!(hit.triangle, k);
            assert!(hit.distance_squared < 1e-20);
        }
    }
}
