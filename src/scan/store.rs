use parking_lot::RwLock;
use std::sync::Arc;

use super::state::{ScanId, ScanState};

/// Keyed storage for scan records. Readers always get a whole-record copy.
pub trait ScanStore: Send + Sync {
    fn get(&self, id: &ScanId) -> Option<ScanState>;

    fn put(&self, state: ScanState);

    /// Drop a record, returning it if it was present.
    fn remove(&self, id: &ScanId) -> Option<ScanState>;

    /// Read-modify-write of one record. Returns false if `id` is unknown.
    ///
    /// The default goes through `get`/`put`; backends that can lock should
    /// override it so concurrent updates cannot interleave.
    fn update(&self, id: &ScanId, f: &mut dyn FnMut(&mut ScanState)) -> bool {
        match self.get(id) {
            Some(mut state) => {
                f(&mut state);
                self.put(state);
                true
            }
            None => false,
        }
    }
}

/// In-process store using parking_lot RwLock over an ahash map.
#[derive(Clone, Default)]
pub struct MemoryScanStore {
    scans: Arc<RwLock<ahash::AHashMap<ScanId, ScanState>>>,
}

impl MemoryScanStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.scans.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.scans.read().is_empty()
    }

    /// Evict finished scans that completed more than `max_age` ago.
    /// Returns how many were removed.
    pub fn prune_finished(&self, max_age: chrono::Duration) -> usize {
        let cutoff = chrono::Utc::now() - max_age;
        let mut scans = self.scans.write();
        let before = scans.len();
        scans.retain(|_, state| !matches!(state.completed_at, Some(done) if done <= cutoff));
        before - scans.len()
    }
}

impl ScanStore for MemoryScanStore {
    fn get(&self, id: &ScanId) -> Option<ScanState> {
        self.scans.read().get(id).cloned()
    }

    fn put(&self, state: ScanState) {
        self.scans.write().insert(state.id.clone(), state);
    }

    fn remove(&self, id: &ScanId) -> Option<ScanState> {
        self.scans.write().remove(id)
    }

    fn update(&self, id: &ScanId, f: &mut dyn FnMut(&mut ScanState)) -> bool {
        match self.scans.write().get_mut(id) {
            Some(state) => {
                f(state);
                true
            }
            None => false,
        }
    }
}
