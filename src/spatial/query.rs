//! Closest-point queries on triangles and segments.

use nalgebra::Point3;

/// Compute the closest point on a triangle to a query point.
///
/// Classifies the query point against the Voronoi regions of the triangle's
/// vertices, edges and face ("Real-Time Collision Detection", Ericson).
/// Degenerate triangles fall back to the nearest point on their edges.
///
/// # Example
/// ```
/// use isomesh::spatial::closest_point_on_triangle;
/// use nalgebra::Point3;
///
/// let tri = [
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let q = closest_point_on_triangle(&Point3::new(0.2, 0.2, 5.0), &tri);
/// assert!((q - Point3::new(0.2, 0.2, 0.0)).norm() < 1e-12);
/// ```
pub fn closest_point_on_triangle(point: &Point3<f64>, triangle: &[Point3<f64>; 3]) -> Point3<f64> {
    let [a, b, c] = triangle;
    let ab = b - a;
    let ac = c - a;
    let ap = point - a;

    let d1 = ab.dot(&ap);
    let d2 = ac.dot(&ap);
    if d1 <= 0.0 && d2 <= 0.0 {
        return *a;
    }

    let bp = point - b;
    let d3 = ab.dot(&bp);
    let d4 = ac.dot(&bp);
    if d3 >= 0.0 && d4 <= d3 {
        return *b;
    }

    let vc = d1 * d4 - d3 * d2;
    if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
        let v = d1 / (d1 - d3);
        return a + ab * v;
    }

    let cp = point - c;
    let d5 = ab.dot(&cp);
    let d6 = ac.dot(&cp);
    if d6 >= 0.0 && d5 <= d6 {
        return *c;
    }

    let vb = d5 * d2 - d1 * d6;
    if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
        let w = d2 / (d2 - d6);
        return a + ac * w;
    }

    let va = d3 * d6 - d5 * d4;
    if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
        let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
        return b + (c - b) * w;
    }

    let sum = va + vb + vc;
    if sum.abs() <= f64::MIN_POSITIVE {
        // Zero-area triangle: nearest point on its three sides
        return [(a, b), (b, c), (c, a)]
            .into_iter()
            .map(|(p, q)| closest_point_on_segment(point, p, q))
            .min_by(|x, y| {
                (x - point)
                    .norm_squared()
                    .total_cmp(&(y - point).norm_squared())
            })
            .unwrap_or(*a);
    }

    let denom = 1.0 / sum;
    let v = vb * denom;
    let w = vc * denom;
    a + ab * v + ac * w
}

/// Compute the closest point on the segment `[a, b]` to a query point.
///
/// A zero-length segment returns `a`.
pub fn closest_point_on_segment(point: &Point3<f64>, a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    let ab = b - a;
    let len_sq = ab.norm_squared();
    if len_sq <= f64::MIN_POSITIVE {
        return *a;
    }
    let t = ((point - a).dot(&ab) / len_sq).clamp(0.0, 1.0);
    a + ab * t
}
