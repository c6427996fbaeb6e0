use log::info;

use crate::{BenchConfig, Harness, Result, TrialReport, Variant};

/// One variant's result within one trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Measurement {
    /// 1-based trial number.
    pub trial: usize,
    pub variant: Variant,
    pub report: TrialReport,
}

/// Runs every variant once per trial, strictly one after another.
pub struct Driver {
    harness: Harness,
    variants: Vec<Variant>,
}

impl Driver {
    /// Creates a driver over all registered variants.
    pub fn new(config: BenchConfig) -> Result<Self> {
        Ok(Self {
            harness: Harness::new(config)?,
            variants: Variant::ALL.to_vec(),
        })
    }

    /// Replaces the list of variants run in each trial.
    pub fn with_variants(mut self, variants: Vec<Variant>) -> Self {
        self.variants = variants;
        self
    }

    /// Runs all trials and returns every measurement in run order.
    ///
    /// Stops at the first failing trial.
    pub fn run(&self) -> Result<Vec<Measurement>> {
        let trials = self.harness.config().trials;
        let mut measurements = Vec::with_capacity(trials * self.variants.len());
        for trial in 1..=trials {
            for &variant in &self.variants {
                info!("testing {variant}");
                let report = self.harness.run_variant(variant)?;
                info!("{report}");
                measurements.push(Measurement {
                    trial,
                    variant,
                    report,
                });
            }
        }
        Ok(measurements)
    }
}
