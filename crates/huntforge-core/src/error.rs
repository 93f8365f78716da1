//! Failure taxonomy for a hunt run.
//!
//! Two kinds of trouble exist and they never mix: recoverable response
//! outcomes (blocked probes, empty answers) are resolved entirely inside the
//! collector and never become errors, while everything in [`HuntError`] is
//! fatal to the run and terminates the process after a best-effort save.

use huntforge_atlas::snapshot::SnapshotError;
use huntforge_atlas::BoundsError;
use huntforge_driver::DriverError;
use std::path::PathBuf;

/// Configuration problems; the run aborts before any work starts.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Sweep bounds rejected.
    #[error("invalid map bounds: {0}")]
    Bounds(#[from] BoundsError),

    /// At least one page session is needed.
    #[error("instance count must be at least 1")]
    InvalidInstanceCount,

    /// Refusing to clobber an existing save that was not the input.
    #[error(
        "output save {} already holds data; pass --overwrite-save to replace it",
        path.display()
    )]
    OutputWouldOverwrite { path: PathBuf },
}

/// Top-level fatal failures.
#[derive(Debug, thiserror::Error)]
pub enum HuntError {
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Session setup failed, including a page that no longer looks like the
    /// hunt tool.
    #[error(transparent)]
    Driver(#[from] DriverError),

    /// A UI action sequence failed irrecoverably on one worker. One dead
    /// session brings the whole run down; the partial atlas is saved first.
    #[error("worker {worker} failed during a page action: {source}")]
    WorkerAction {
        worker: usize,
        #[source]
        source: DriverError,
    },

    #[error(transparent)]
    Snapshot(#[from] SnapshotError),

    /// Every worker stopped while work was still pending.
    #[error("all workers stopped unexpectedly")]
    WorkersStopped,

    /// A background task died underneath the run.
    #[error("internal failure: {0}")]
    Internal(String),
}

impl HuntError {
    /// True when the failure means the page itself cannot be trusted.
    #[inline]
    #[must_use]
    pub fn is_structural(&self) -> bool {
        matches!(self, Self::Driver(e) if e.is_structural())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn structural_mismatch_is_detected_through_the_wrapper() {
        let err = HuntError::Driver(DriverError::StructuralMismatch {
            fields: 3,
            directions: 0,
        });
        assert!(err.is_structural());

        let err = HuntError::WorkersStopped;
        assert!(!err.is_structural());
    }

    #[test]
    fn config_errors_read_well() {
        let err = HuntError::Config(ConfigError::InvalidInstanceCount);
        assert!(err.to_string().contains("instance count"));
    }
}
