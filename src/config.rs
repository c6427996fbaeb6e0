use crate::{BenchError, Result, Workload};

/// Parameters of a benchmark run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    /// Total operations per trial, split across the workers.
    pub operations: usize,
    /// Concurrent workers per trial.
    pub workers: usize,
    /// How many times the driver runs every variant.
    pub trials: usize,
    pub workload: Workload,
}

impl Default for BenchConfig {
    /// One million operations over 100 workers, five trials.
    fn default() -> Self {
        Self {
            operations: 1_000_000,
            workers: 100,
            trials: 5,
            workload: Workload::default(),
        }
    }
}

impl BenchConfig {
    /// Creates a config with the given size and the default trial count and workload.
    ///
    /// # Arguments
    ///
    /// * `operations` - The number of operations per trial.
    /// * `workers` - The number of concurrent workers per trial.
    pub fn new(operations: usize, workers: usize) -> Self {
        Self {
            operations,
            workers,
            ..Self::default()
        }
    }

    pub fn with_trials(mut self, trials: usize) -> Self {
        self.trials = trials;
        self
    }

    pub fn with_workload(mut self, workload: Workload) -> Self {
        self.workload = workload;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BenchError::InvalidConfig(
                "worker count must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }
}
