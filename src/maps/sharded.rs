use super::{ConcurrentMap, Marker};
use crate::ShardsMap;

/// Keys spread over independently locked shards; `len` sums the shards.
#[derive(Default)]
pub struct ShardedMap {
    map: ShardsMap<String, Marker>,
}

impl ShardedMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a map with exactly `shard_amount` shards.
    pub fn with_shard_amount(shard_amount: usize) -> Self {
        Self {
            map: ShardsMap::with_capacity_and_shard_amount(0, shard_amount),
        }
    }
}

impl ConcurrentMap for ShardedMap {
    fn store(&self, key: String, marker: Marker) {
        self.map.insert(key, marker);
    }

    fn load(&self, key: &str) -> Option<Marker> {
        self.map.get(key)
    }

    fn len(&self) -> usize {
        self.map.len()
    }

    fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}
