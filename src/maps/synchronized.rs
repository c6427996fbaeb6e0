use super::{ConcurrentMap, Marker};

/// A single lock-free map that synchronizes every operation internally.
///
/// `len` walks every entry, so it costs O(entries) and may observe a torn
/// view while stores are in flight.
#[derive(Default)]
pub struct SynchronizedMap {
    map: papaya::HashMap<String, Marker>,
}

impl SynchronizedMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConcurrentMap for SynchronizedMap {
    fn store(&self, key: String, marker: Marker) {
        self.map.pin().insert(key, marker);
    }

    fn load(&self, key: &str) -> Option<Marker> {
        self.map.pin().get(key).copied()
    }

    fn len(&self) -> usize {
        self.map.pin().iter().count()
    }
}
