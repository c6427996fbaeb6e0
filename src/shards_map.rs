use crate::RwLock;
use foldhash::fast::{FixedState, RandomState};
use std::borrow::Borrow;
use std::collections::HashMap;
use std::hash::{BuildHasher, Hash};
use std::sync::OnceLock;

/// Returns the default number of shards to use for a `ShardsMap`.
pub fn default_shard_amount() -> usize {
    static DEFAULT_SHARD_AMOUNT: OnceLock<usize> = OnceLock::new();
    *DEFAULT_SHARD_AMOUNT.get_or_init(|| {
        (std::thread::available_parallelism().map_or(1, usize::from) * 4).next_power_of_two()
    })
}

/// A thread-safe hashmap shard.
///
/// This struct wraps a `HashMap` protected by a `RwLock`, so lookups in the
/// same shard proceed in parallel while inserts take the shard exclusively.
pub struct ShardMap<K, V> {
    /// The underlying hashmap protected by a `RwLock`.
    map: RwLock<HashMap<K, V, RandomState>>,
}

impl<K, V> ShardMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new `ShardMap` with the specified initial capacity.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The initial capacity of the hashmap.
    ///
    /// # Returns
    ///
    /// A new `ShardMap` instance.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            map: RwLock::new(HashMap::with_capacity_and_hasher(
                capacity,
                RandomState::default(),
            )),
        }
    }

    pub fn len(&self) -> usize {
        self.map.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.read().is_empty()
    }

    /// Inserts a value, returning the previous one if the key was present.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.map.write().insert(key, value)
    }

    /// Returns a clone of the value stored for `key`.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        self.map.read().get(key).cloned()
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.map.read().contains_key(key)
    }
}

/// A collection of `ShardMap` instances, providing sharded access to a hashmap.
pub struct ShardsMap<K, V> {
    /// The vector of `ShardMap` instances.
    shards: Vec<ShardMap<K, V>>,
}

impl<K, V> Default for ShardsMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::with_capacity_and_shard_amount(0, default_shard_amount())
    }
}

impl<K, V> ShardsMap<K, V>
where
    K: Eq + Hash,
{
    /// Creates a new `ShardsMap` with the specified capacity and number of shards.
    ///
    /// # Arguments
    ///
    /// * `capacity` - The total initial capacity of the hashmap.
    /// * `shard_amount` - The number of shards to create, at least one.
    ///
    /// # Returns
    ///
    /// A new `ShardsMap` instance.
    pub fn with_capacity_and_shard_amount(capacity: usize, shard_amount: usize) -> Self {
        let shard_amount = shard_amount.max(1);
        let shard_capacity = capacity / shard_amount;
        Self {
            shards: (0..shard_amount)
                .map(|_| ShardMap::with_capacity(shard_capacity))
                .collect::<Vec<_>>(),
        }
    }

    pub fn shard_amount(&self) -> usize {
        self.shards.len()
    }

    /// Sums the per-shard lengths.
    ///
    /// Shards are visited one at a time, so under concurrent inserts the total
    /// is a best-effort count rather than a snapshot of a single instant.
    pub fn len(&self) -> usize {
        self.shards.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.shards.iter().all(|s| s.is_empty())
    }

    /// Inserts a value into the shard owning `key`.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to insert.
    /// * `value` - The value to store.
    ///
    /// # Returns
    ///
    /// The previous value, if the key was present.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.shard(&key).insert(key, value)
    }

    /// Looks up `key` in the shard owning it.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up.
    ///
    /// # Returns
    ///
    /// A clone of the stored value, or `None` if the key is absent.
    pub fn get<Q>(&self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
        V: Clone,
    {
        self.shard(key).get(key)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.shard(key).contains_key(key)
    }

    #[inline(always)]
    fn shard<Q>(&self, key: &Q) -> &ShardMap<K, V>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        let idx = FixedState::default().hash_one(key) as usize % self.shards.len();
        &self.shards[idx]
    }
}
