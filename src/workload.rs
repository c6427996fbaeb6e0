use std::ops::Range;

use rand::Rng;

use crate::{BenchError, ConcurrentMap, Marker, Result};

/// Formats the synthetic hostname used as the key for `index`.
pub fn hostname(index: usize) -> String {
    format!("www.site{index}.example.com.ua")
}

/// A single map operation produced by the workload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operation {
    Store(String),
    Load(String),
}

/// The mixed read/write workload.
///
/// Every `write_every`-th index stores its own hostname. All other indices
/// load the hostname of a uniformly random earlier index, so the set of keys
/// being read grows as the index advances, like a warming cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Workload {
    write_every: usize,
}

impl Default for Workload {
    /// One write per ten operations.
    fn default() -> Self {
        Self { write_every: 10 }
    }
}

impl Workload {
    /// Creates a workload that writes on every index divisible by `write_every`.
    ///
    /// Index 0 is divisible by any period, so the first operation of the
    /// index space is always a write and a read never draws from `[0, 0)`.
    pub fn new(write_every: usize) -> Result<Self> {
        if write_every == 0 {
            return Err(BenchError::InvalidConfig(
                "write period must be at least 1".to_owned(),
            ));
        }
        Ok(Self { write_every })
    }

    /// A workload that only writes, each index storing a distinct key.
    pub fn write_only() -> Self {
        Self { write_every: 1 }
    }

    pub fn write_every(&self) -> usize {
        self.write_every
    }

    pub fn is_write(&self, index: usize) -> bool {
        index % self.write_every == 0
    }

    /// Produces the operation for `index`.
    pub fn operation<R: Rng + ?Sized>(&self, index: usize, rng: &mut R) -> Operation {
        if self.is_write(index) {
            Operation::Store(hostname(index))
        } else {
            debug_assert!(index > 0);
            Operation::Load(hostname(rng.gen_range(0..index)))
        }
    }

    /// Applies every operation of `block` to `map`. Load results are discarded.
    pub fn run<M, R>(&self, map: &M, block: Range<usize>, rng: &mut R)
    where
        M: ConcurrentMap + ?Sized,
        R: Rng + ?Sized,
    {
        for index in block {
            match self.operation(index, rng) {
                Operation::Store(key) => map.store(key, Marker),
                Operation::Load(key) => {
                    let _ = map.load(&key);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ShardedMap, Variant};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_hostname() {
        assert_eq!(hostname(0), "www.site0.example.com.ua");
        assert_eq!(hostname(123456), "www.site123456.example.com.ua");
    }

    #[test]
    fn test_write_every_tenth() {
        let workload = Workload::default();
        let mut rng = StdRng::seed_from_u64(7);
        let mut stores = 0;
        for i in 0..1000 {
            match workload.operation(i, &mut rng) {
                Operation::Store(key) => {
                    assert_eq!(i % 10, 0);
                    assert_eq!(key, hostname(i));
                    stores += 1;
                }
                Operation::Load(_) => assert_ne!(i % 10, 0),
            }
        }
        assert_eq!(stores, 100);
    }

    #[test]
    fn test_reads_target_earlier_indices() {
        let workload = Workload::default();
        let mut rng = StdRng::seed_from_u64(42);
        for i in 1..5000 {
            if let Operation::Load(key) = workload.operation(i, &mut rng) {
                let r: usize = key
                    .strip_prefix("www.site")
                    .and_then(|rest| rest.strip_suffix(".example.com.ua"))
                    .and_then(|n| n.parse().ok())
                    .unwrap();
                assert!(r < i, "read {r} at index {i}");
            }
        }
        // At index 1 the only candidate is 0.
        assert_eq!(
            workload.operation(1, &mut rng),
            Operation::Load(hostname(0))
        );
    }

    #[test]
    fn test_index_zero_is_always_a_write() {
        let mut rng = StdRng::seed_from_u64(0);
        for period in [1, 2, 3, 10, 1000] {
            let workload = Workload::new(period).unwrap();
            assert_eq!(workload.operation(0, &mut rng), Operation::Store(hostname(0)));
        }
    }

    #[test]
    fn test_invalid_period() {
        assert!(matches!(
            Workload::new(0),
            Err(BenchError::InvalidConfig(_))
        ));
        assert_eq!(Workload::write_only().write_every(), 1);
    }

    #[test]
    fn test_run_block() {
        let map = ShardedMap::new();
        let mut rng = StdRng::seed_from_u64(1);
        Workload::default().run(&map, 0..100, &mut rng);
        assert_eq!(map.len(), 10);
        for i in (0..100).step_by(10) {
            assert_eq!(map.load(&hostname(i)), Some(Marker));
        }
        assert_eq!(map.load(&hostname(5)), None);

        let map = Variant::RwLocked.build();
        Workload::write_only().run(map.as_ref(), 40..60, &mut rng);
        assert_eq!(map.len(), 20);
    }
}
