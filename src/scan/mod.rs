pub mod coordinator;
pub mod progress;
pub mod state;
pub mod store;

pub use coordinator::{merge_candidates, CoordinatorBuilder, ScanCoordinator};
pub use progress::{ProgressTracker, StrategyProgress};
pub use state::{
    Method, NotificationOutcome, NotifyTarget, ScanId, ScanRequest, ScanState, ScanStatus, StrategyKind, WorkPlan,
};
pub use store::{MemoryScanStore, ScanStore};
