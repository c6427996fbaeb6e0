use std::any::Any;
use std::fmt;
use std::ops::Range;
use std::thread;
use std::time::{Duration, Instant};

use log::debug;

use crate::{BenchConfig, BenchError, ConcurrentMap, Result, Variant};

/// Splits `[0, operations)` into contiguous, disjoint blocks, one per worker.
///
/// At most `operations` blocks are produced, so no worker gets an empty
/// block. Every block holds `operations / blocks` indices except the last,
/// which also absorbs the remainder and always ends at `operations`.
///
/// # Examples
/// ```
/// use mapbench::partition;
///
/// assert_eq!(partition(10, 3), vec![0..3, 3..6, 6..10]);
/// assert_eq!(partition(2, 4), vec![0..1, 1..2]);
/// assert!(partition(0, 4).is_empty());
/// ```
pub fn partition(operations: usize, workers: usize) -> Vec<Range<usize>> {
    let blocks = workers.min(operations);
    if blocks == 0 {
        return Vec::new();
    }
    let block = operations / blocks;
    (0..blocks)
        .map(|k| {
            let from = k * block;
            let to = if k + 1 == blocks { operations } else { from + block };
            from..to
        })
        .collect()
}

/// What one trial measured.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TrialReport {
    /// Wall-clock time from dispatch until every worker finished.
    pub duration: Duration,
    /// The map's entry count once all workers finished.
    pub len: usize,
}

impl fmt::Display for TrialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "test compleat. duration:{:?}; len:{}", self.duration, self.len)
    }
}

/// Runs one trial at a time against a map.
///
/// A trial fans the operation index space out over the configured number of
/// worker threads, waits for all of them, then reports the elapsed time and
/// the map's final size. The map does all of the synchronization; the
/// harness only joins its workers.
pub struct Harness {
    config: BenchConfig,
}

impl Harness {
    pub fn new(config: BenchConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    pub fn config(&self) -> &BenchConfig {
        &self.config
    }

    /// Runs one trial against a fresh map of the given variant.
    ///
    /// The map is dropped once the measurement is taken.
    pub fn run_variant(&self, variant: Variant) -> Result<TrialReport> {
        let map = variant.build();
        self.run(map.as_ref())
    }

    /// Runs one trial against `map`.
    ///
    /// Every worker is joined even when another one failed. The first worker
    /// panic, or a failure to spawn a worker, is returned as the error.
    pub fn run<M>(&self, map: &M) -> Result<TrialReport>
    where
        M: ConcurrentMap + ?Sized,
    {
        let blocks = partition(self.config.operations, self.config.workers);
        let workload = self.config.workload;

        debug!(
            "dispatching {} workers over {} operations",
            blocks.len(),
            self.config.operations
        );
        let start = Instant::now();

        thread::scope(|scope| {
            let mut failure = None;
            let mut handles = Vec::with_capacity(blocks.len());
            for (worker, block) in blocks.into_iter().enumerate() {
                let spawned = thread::Builder::new()
                    .name(format!("bench-worker-{worker}"))
                    .spawn_scoped(scope, move || {
                        workload.run(map, block, &mut rand::thread_rng());
                    });
                match spawned {
                    Ok(handle) => handles.push((worker, handle)),
                    Err(source) => {
                        failure = Some(BenchError::Spawn { worker, source });
                        break;
                    }
                }
            }

            debug!("draining {} workers", handles.len());
            for (worker, handle) in handles {
                if let Err(payload) = handle.join() {
                    failure.get_or_insert_with(|| BenchError::WorkerPanicked {
                        worker,
                        message: panic_message(payload.as_ref()),
                    });
                }
            }
            failure.map_or(Ok(()), Err)
        })?;

        let duration = start.elapsed();
        let len = map.len();
        debug!("measured {:?} with {} entries", duration, len);
        Ok(TrialReport { duration, len })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_owned()
    }
}
