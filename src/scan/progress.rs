use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use super::state::{percent, ScanId};
use super::store::ScanStore;

/// Shared completed-unit counter for one scan.
///
/// Strategies advance it from any task; every advance is published to the
/// scan store so pollers see it. Published progress never goes backwards.
pub struct ProgressTracker {
    id: ScanId,
    store: Option<Arc<dyn ScanStore>>,
    total: usize,
    completed: AtomicUsize,
    publish: Mutex<()>,
}

impl ProgressTracker {
    pub fn new(id: ScanId, store: Arc<dyn ScanStore>, total: usize) -> Arc<Self> {
        Arc::new(Self { id, store: Some(store), total, completed: AtomicUsize::new(0), publish: Mutex::new(()) })
    }

    /// A tracker that only counts, for running a strategy outside a scan.
    pub fn detached(total: usize) -> Arc<Self> {
        Arc::new(Self {
            id: ScanId::from("detached"),
            store: None,
            total,
            completed: AtomicUsize::new(0),
            publish: Mutex::new(()),
        })
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn completed(&self) -> usize {
        self.completed.load(Ordering::SeqCst)
    }

    pub fn percent(&self) -> u8 {
        percent(self.completed(), self.total)
    }

    pub fn advance(&self, units: usize) {
        if units == 0 {
            return;
        }
        self.completed.fetch_add(units, Ordering::SeqCst);
        if let Some(store) = &self.store {
            let _guard = self.publish.lock();
            let now = self.completed();
            store.update(&self.id, &mut |state| state.advance(now));
        }
    }

    /// Hand out a budgeted slice of the counter to one strategy.
    pub fn slice(self: &Arc<Self>, budget: usize) -> StrategyProgress {
        StrategyProgress { tracker: Arc::clone(self), budget, spent: AtomicUsize::new(0) }
    }
}

/// One strategy's share of the scan's work units. Advances past the budget
/// are dropped; `finish` credits whatever the strategy did not report.
pub struct StrategyProgress {
    tracker: Arc<ProgressTracker>,
    budget: usize,
    spent: AtomicUsize,
}

impl StrategyProgress {
    pub fn advance(&self, units: usize) {
        let budget = self.budget;
        let prev = self
            .spent
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |cur| {
                let next = (cur + units).min(budget);
                (next != cur).then_some(next)
            });
        if let Ok(prev) = prev {
            let granted = (prev + units).min(budget) - prev;
            self.tracker.advance(granted);
        }
    }

    pub fn tick(&self) {
        self.advance(1);
    }

    pub fn spent(&self) -> usize {
        self.spent.load(Ordering::SeqCst)
    }

    pub fn remaining(&self) -> usize {
        self.budget - self.spent()
    }

    pub fn finish(&self) {
        self.advance(self.remaining());
    }
}
