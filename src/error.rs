use std::io;

use thiserror::Error as ThisError;

/// Errors raised while setting up or running a benchmark.
///
/// Map operations themselves never fail; everything here is about the
/// harness around them.
#[derive(ThisError, Debug)]
pub enum BenchError {
    /// The benchmark parameters cannot describe a runnable trial.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The OS refused to start a worker thread.
    #[error("failed to spawn worker {worker}: {source}")]
    Spawn {
        worker: usize,
        #[source]
        source: io::Error,
    },

    /// A worker panicked while running its block.
    #[error("worker {worker} panicked: {message}")]
    WorkerPanicked { worker: usize, message: String },
}

/// Result alias used across the crate, defaulting to `BenchError`.
pub type Result<T> = std::result::Result<T, BenchError>;
