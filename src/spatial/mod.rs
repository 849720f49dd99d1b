//! Spatial queries against a reference surface.
//!
//! [`TriangleBvh`] answers "nearest point on surface" queries over a fixed
//! triangle soup. The remesher builds one per patch from the geometry before
//! any edit and projects moved vertices back onto it.

mod bvh;
mod query;

pub use bvh::{Aabb, NearestPoint, TriangleBvh};
pub use query::{closest_point_on_segment, closest_point_on_triangle};
