//! Summaries of a remeshing run.

use std::collections::HashMap;
use std::fmt;

use crate::mesh::{EdgeId, FaceId, HalfEdgeMesh, MeshIndex};

/// Statistics about edge lengths.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct EdgeStatistics {
    /// Minimum edge length.
    pub min_length: f64,
    /// Maximum edge length.
    pub max_length: f64,
    /// Average edge length.
    pub avg_length: f64,
    /// Standard deviation of edge lengths.
    pub std_dev: f64,
    /// Number of edges measured.
    pub edge_count: usize,
}

impl EdgeStatistics {
    /// Summarize a set of lengths. Empty input gives all zeros.
    pub fn from_lengths<It: IntoIterator<Item = f64>>(lengths: It) -> Self {
        let mut count = 0usize;
        let mut sum = 0.0;
        let mut sum_sq = 0.0;
        let mut min_length = f64::INFINITY;
        let mut max_length = 0.0f64;

        for length in lengths {
            count += 1;
            sum += length;
            sum_sq += length * length;
            min_length = min_length.min(length);
            max_length = max_length.max(length);
        }

        if count == 0 {
            return Self::default();
        }

        let n = count as f64;
        let avg_length = sum / n;
        let variance = (sum_sq / n - avg_length * avg_length).max(0.0);
        Self {
            min_length,
            max_length,
            avg_length,
            std_dev: variance.sqrt(),
            edge_count: count,
        }
    }

    /// Fraction of the spread relative to the mean (0 for perfectly uniform).
    pub fn coefficient_of_variation(&self) -> f64 {
        if self.avg_length > 0.0 {
            self.std_dev / self.avg_length
        } else {
            0.0
        }
    }
}

impl fmt::Display for EdgeStatistics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} edges, length {:.4} .. {:.4} (mean {:.4}, std {:.4})",
            self.edge_count, self.min_length, self.max_length, self.avg_length, self.std_dev
        )
    }
}

/// Edge length statistics over the whole mesh.
pub fn edge_statistics<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> EdgeStatistics {
    EdgeStatistics::from_lengths(mesh.edge_ids().map(|e| mesh.edge_length(e.halfedge())))
}

/// Edge length statistics over the edges selected by `filter`.
pub(crate) fn edge_statistics_where<I: MeshIndex>(
    mesh: &HalfEdgeMesh<I>,
    filter: impl Fn(EdgeId<I>) -> bool,
) -> EdgeStatistics {
    EdgeStatistics::from_lengths(
        mesh.edge_ids()
            .filter(|&e| filter(e))
            .map(|e| mesh.edge_length(e.halfedge())),
    )
}

/// Compute the average edge length of a mesh.
///
/// This is useful for determining an appropriate target edge length
/// for remeshing.
pub fn average_edge_length<I: MeshIndex>(mesh: &HalfEdgeMesh<I>) -> f64 {
    edge_statistics(mesh).avg_length
}

/// Result of [`isotropic_remesh`](super::isotropic_remesh).
#[derive(Debug, Clone)]
pub struct RemeshReport<I: MeshIndex = u32> {
    /// Outer iterations performed.
    pub iterations: usize,
    /// Number of edge splits performed.
    pub splits: usize,
    /// Number of edge collapses performed.
    pub collapses: usize,
    /// Number of edge flips performed.
    pub flips: usize,
    /// Vertex moves applied by relaxation, summed over all steps.
    pub relaxed: usize,
    /// Vertex moves applied by projection.
    pub projected: usize,
    /// Number of patch faces before remeshing.
    pub initial_faces: usize,
    /// Statistics of the patch edges before remeshing.
    pub initial_stats: EdgeStatistics,
    /// Statistics of the patch edges after remeshing.
    pub final_stats: EdgeStatistics,
    /// The faces of the patch after remeshing.
    pub faces: Vec<FaceId<I>>,
    /// Patch id of every face in [`faces`](Self::faces).
    pub patches: HashMap<FaceId<I>, usize>,
}

impl<I: MeshIndex> RemeshReport<I> {
    pub(crate) fn empty() -> Self {
        Self {
            iterations: 0,
            splits: 0,
            collapses: 0,
            flips: 0,
            relaxed: 0,
            projected: 0,
            initial_faces: 0,
            initial_stats: EdgeStatistics::default(),
            final_stats: EdgeStatistics::default(),
            faces: Vec::new(),
            patches: HashMap::new(),
        }
    }

    /// Number of patch faces after remeshing.
    pub fn final_faces(&self) -> usize {
        self.faces.len()
    }

    /// Get the face count change ratio.
    pub fn face_ratio(&self) -> f64 {
        if self.initial_faces == 0 {
            1.0
        } else {
            self.faces.len() as f64 / self.initial_faces as f64
        }
    }

    /// Whether any topological edit was made.
    pub fn was_remeshed(&self) -> bool {
        self.total_operations() > 0
    }

    /// Splits, collapses and flips combined.
    pub fn total_operations(&self) -> usize {
        self.splits + self.collapses + self.flips
    }

    /// Patch id of a face of the remeshed patch.
    pub fn patch_of(&self, f: FaceId<I>) -> Option<usize> {
        self.patches.get(&f).copied()
    }
}

impl<I: MeshIndex> fmt::Display for RemeshReport<I> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Remesh: {} -> {} faces ({:.1}x), {} splits, {} collapses, {} flips",
            self.initial_faces,
            self.faces.len(),
            self.face_ratio(),
            self.splits,
            self.collapses,
            self.flips
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_statistics_of_lengths() {
        let stats = EdgeStatistics::from_lengths([1.0, 2.0, 3.0]);
        assert_eq!(stats.edge_count, 3);
        assert_relative_eq!(stats.min_length, 1.0);
        assert_relative_eq!(stats.max_length, 3.0);
        assert_relative_eq!(stats.avg_length, 2.0);
        assert_relative_eq!(stats.std_dev, (2.0f64 / 3.0).sqrt(), epsilon = 1e-12);
    }

    #[test]
    fn test_statistics_empty() {
        assert_eq!(EdgeStatistics::from_lengths(std::iter::empty()), EdgeStatistics::default());
        assert_eq!(EdgeStatistics::default().coefficient_of_variation(), 0.0);
    }

    #[test]
    fn test_report_counters() {
        let mut report = RemeshReport::<u32>::empty();
        assert!(!report.was_remeshed());
        assert_eq!(report.face_ratio(), 1.0);

        report.initial_faces = 2;
        report.splits = 3;
        report.flips = 1;
        report.faces = vec![FaceId::new(0), FaceId::new(1), FaceId::new(4), FaceId::new(5)];
        assert!(report.was_remeshed());
        assert_eq!(report.total_operations(), 4);
        assert_relative_eq!(report.face_ratio(), 2.0);
        assert!(report.to_string().contains("2 -> 4 faces"));
    }
}
