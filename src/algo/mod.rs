//! Mesh processing algorithms.
//!
//! - **Remeshing**: isotropic remeshing of surface patches and standalone
//!   splitting of long edges ([`remesh`])
//! - **Features**: detection of sharp edges to use as constraints ([`features`])
//!
//! Long-running operations accept a [`Progress`] observer.

pub mod features;
mod progress;
pub mod remesh;

pub use progress::{Phase, Progress, ProgressEvent};
