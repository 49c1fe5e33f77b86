use thiserror::Error;

/// Errors that cross the scan-management boundary and reach the caller.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ScanError {
    #[error("Domain is required")]
    DomainRequired,

    #[error("Scan not found: {0}")]
    NotFound(String),

    #[error("Bot Token and Chat ID are required")]
    MissingNotifyCredentials,
}

/// Failure inside a single discovery strategy.
///
/// These never fail a scan: the coordinator logs them and the strategy
/// contributes whatever it collected before the failure.
#[derive(Error, Debug)]
pub enum StrategyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected HTTP status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Parse(String),

    #[error("DNS lookup failed: {0}")]
    Dns(String),

    #[error("operation timed out")]
    Timeout,

    #[error("network capability unavailable")]
    Unavailable,

    #[error("cancelled")]
    Cancelled,
}

impl From<serde_json::Error> for StrategyError {
    fn from(e: serde_json::Error) -> Self {
        StrategyError::Parse(e.to_string())
    }
}

impl From<tokio::time::error::Elapsed> for StrategyError {
    fn from(_: tokio::time::error::Elapsed) -> Self {
        StrategyError::Timeout
    }
}

pub type StrategyResult<T> = Result<T, StrategyError>;
