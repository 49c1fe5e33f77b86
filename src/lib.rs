pub mod config;
pub mod discover;
pub mod errors;
pub mod http_client;
pub mod notify;
pub mod output;
pub mod probe;
pub mod scan;
pub mod utils;

pub use crate::config::Config;
pub use crate::errors::{ScanError, StrategyError};
pub use crate::scan::{Method, NotifyTarget, ScanCoordinator, ScanId, ScanRequest, ScanState, ScanStatus};
