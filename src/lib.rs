//! A throughput benchmark for concurrent string-keyed maps.
//!
//! # Overview
//! `mapbench` runs the same mixed read/write workload against three map
//! strategies and reports how long each took:
//!
//! - a sharded map, with keys spread over independently locked shards
//! - a synchronized map, a single lock-free map with internal synchronization
//! - a plain map behind one reader/writer lock
//!
//! # Workload
//! - One write per ten operations, storing a synthetic hostname
//! - Reads of uniformly random earlier hostnames, so the working set grows
//! - The index space is split into contiguous blocks, one per worker thread
//!
//! # Examples
//! ```
//! use mapbench::{BenchConfig, Harness, Variant};
//!
//! let harness = Harness::new(BenchConfig::new(1_000, 4)).unwrap();
//! for variant in Variant::ALL {
//!     let report = harness.run_variant(variant).unwrap();
//!     // Indices 0, 10, ..., 990 each stored one key.
//!     assert_eq!(report.len, 100);
//! }
//! ```
mod config;
mod driver;
mod error;
mod harness;
mod maps;
mod rwlock;
mod shards_map;
mod workload;

pub use config::*;
pub use driver::*;
pub use error::*;
pub use harness::*;
pub use maps::*;
pub use rwlock::*;
pub use shards_map::*;
pub use workload::*;
