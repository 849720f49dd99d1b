//! Progress reporting for long-running algorithms.
//!
//! Remeshing runs through a fixed sequence of phases per iteration. A
//! [`Progress`] observer is told about every phase boundary; it has no effect
//! on the result.
//!
//! # Example
//!
//! ```
//! use isomesh::algo::{Phase, Progress};
//!
//! let progress = Progress::new(|event| {
//!     if event.phase == Phase::Split {
//!         println!("[{}/{}] splitting", event.iteration + 1, event.total_iterations);
//!     }
//! });
//! # let _ = progress;
//! ```

/// A stage of the remeshing state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    /// Nothing has been validated yet.
    Uninitialized,
    /// Inputs validated, constraint state and projector prepared.
    Initialized,
    /// Splitting long edges.
    Split,
    /// Collapsing short edges.
    Collapse,
    /// Flipping edges to equalize valences.
    EqualizeValences,
    /// Tangential relaxation.
    Relax,
    /// Projection onto the reference surface.
    Project,
    /// All iterations finished.
    Done,
}

impl Phase {
    /// A short human-readable label.
    pub fn label(self) -> &'static str {
        match self {
            Phase::Uninitialized => "uninitialized",
            Phase::Initialized => "initialized",
            Phase::Split => "splitting edges",
            Phase::Collapse => "collapsing edges",
            Phase::EqualizeValences => "equalizing valences",
            Phase::Relax => "relaxing",
            Phase::Project => "projecting",
            Phase::Done => "done",
        }
    }
}

/// A phase boundary reported to a [`Progress`] observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProgressEvent {
    /// Zero-based outer iteration (equal to `total_iterations` once done).
    pub iteration: usize,
    /// Number of outer iterations requested.
    pub total_iterations: usize,
    /// The phase about to start.
    pub phase: Phase,
}

/// A progress callback that receives updates during long-running operations.
pub struct Progress {
    callback: Box<dyn Fn(&ProgressEvent) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&ProgressEvent) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report a phase boundary.
    #[inline]
    pub fn report(&self, iteration: usize, total_iterations: usize, phase: Phase) {
        (self.callback)(&ProgressEvent {
            iteration,
            total_iterations,
            phase,
        });
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}
