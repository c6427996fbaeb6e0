use std::collections::HashMap;

use foldhash::fast::RandomState;

use super::{ConcurrentMap, Marker};
use crate::RwLock;

/// One plain `HashMap` behind one reader/writer lock.
///
/// `store` takes the lock exclusively; `load` and `len` share it.
#[derive(Default)]
pub struct RwLockedMap {
    map: RwLock<HashMap<String, Marker, RandomState>>,
}

impl RwLockedMap {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ConcurrentMap for RwLockedMap {
    fn store(&self, key: String, marker: Marker) {
        self.map.write().insert(key, marker);
    }

    fn load(&self, key: &str) -> Option<Marker> {
        self.map.read().get(key).copied()
    }

    fn len(&self) -> usize {
        self.map.read().len()
    }
}
