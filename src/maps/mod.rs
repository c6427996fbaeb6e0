//! The capability every benchmarked map provides, and the registry of
//! map strategies the driver iterates over.
mod rw_locked;
mod sharded;
mod synchronized;

pub use rw_locked::RwLockedMap;
pub use sharded::ShardedMap;
pub use synchronized::SynchronizedMap;

use std::fmt;

/// The value stored under every key. Only its presence carries information.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Marker;

/// A string-keyed map that any number of threads may use at once.
///
/// Every method takes `&self`; each implementation brings its own
/// synchronization. None of the operations can fail.
pub trait ConcurrentMap: Send + Sync {
    /// Inserts or overwrites the entry for `key`.
    fn store(&self, key: String, marker: Marker);

    /// Returns the marker stored for `key`, or `None` if the key is absent.
    ///
    /// Racing with a `store` of the same key yields either outcome.
    fn load(&self, key: &str) -> Option<Marker>;

    /// Returns the number of entries.
    ///
    /// Under concurrent mutation this is a best-effort count.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// One of the map strategies under comparison.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Keys partitioned over independently locked shards.
    Sharded,
    /// A single lock-free map with internal synchronization.
    Synchronized,
    /// A single plain map behind one reader/writer lock.
    RwLocked,
}

impl Variant {
    /// Every variant, in the order the driver runs them.
    pub const ALL: [Variant; 3] = [Variant::Sharded, Variant::Synchronized, Variant::RwLocked];

    /// A short identifier, suitable for benchmark ids.
    pub fn name(&self) -> &'static str {
        match self {
            Variant::Sharded => "sharded",
            Variant::Synchronized => "synchronized",
            Variant::RwLocked => "rw_locked",
        }
    }

    /// Builds a fresh, empty map of this kind.
    pub fn build(&self) -> Box<dyn ConcurrentMap> {
        match self {
            Variant::Sharded => Box::new(ShardedMap::new()),
            Variant::Synchronized => Box::new(SynchronizedMap::new()),
            Variant::RwLocked => Box::new(RwLockedMap::new()),
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Variant::Sharded => "sharded map",
            Variant::Synchronized => "synchronized map",
            Variant::RwLocked => "map with rwlock",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_variant_order_and_names() {
        assert_eq!(
            Variant::ALL,
            [Variant::Sharded, Variant::Synchronized, Variant::RwLocked]
        );
        assert_eq!(Variant::Sharded.name(), "sharded");
        assert_eq!(Variant::RwLocked.to_string(), "map with rwlock");
    }

    #[test]
    fn test_store_load_len() {
        for variant in Variant::ALL {
            let map = variant.build();
            assert!(map.is_empty(), "{variant}");
            assert_eq!(map.load("www.site0.example.com.ua"), None);

            map.store("www.site0.example.com.ua".to_string(), Marker);
            map.store("www.site10.example.com.ua".to_string(), Marker);
            // Overwrite does not add an entry.
            map.store("www.site0.example.com.ua".to_string(), Marker);

            assert_eq!(map.load("www.site0.example.com.ua"), Some(Marker), "{variant}");
            assert_eq!(map.load("www.site1.example.com.ua"), None, "{variant}");
            assert_eq!(map.len(), 2, "{variant}");
            assert!(!map.is_empty());
        }
    }

    #[test]
    fn test_build_is_fresh() {
        for variant in Variant::ALL {
            let first = variant.build();
            first.store("key".to_string(), Marker);
            let second = variant.build();
            assert!(second.is_empty(), "{variant}");
            assert_eq!(second.load("key"), None);
        }
    }

    #[test]
    fn test_concurrent_store_load() {
        const THREADS: usize = 8;
        const KEYS: usize = 1 << 11;

        for variant in Variant::ALL {
            let map: Arc<dyn ConcurrentMap> = Arc::from(variant.build());
            let threads = (0..THREADS)
                .map(|t| {
                    let map = map.clone();
                    std::thread::spawn(move || {
                        for i in 0..KEYS {
                            let key = format!("{t}-{i}");
                            map.store(key.clone(), Marker);
                            assert_eq!(map.load(&key), Some(Marker));
                            let _ = map.load(&format!("{}-{i}", (t + 1) % THREADS));
                            let _ = map.len();
                        }
                    })
                })
                .collect::<Vec<_>>();
            threads.into_iter().for_each(|t| t.join().unwrap());

            assert_eq!(map.len(), THREADS * KEYS, "{variant}");
        }
    }
}
