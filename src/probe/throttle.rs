use std::sync::Arc;
use dashmap::DashMap;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::errors::{StrategyError, StrategyResult};

/// Service key used for all resolver traffic.
pub const DNS_SERVICE: &str = "dns";

/// A permit that holds both global and per-service semaphore permits.
pub struct ThrottlePermit {
    _global: OwnedSemaphorePermit,
    _service: OwnedSemaphorePermit,
}

/// Caps simultaneous outbound requests, overall and per external service
/// (the resolver, crt.sh, each search engine).
pub struct Throttle {
    global: Arc<Semaphore>,
    per_service: DashMap<String, Arc<Semaphore>>,
    default_per_service: usize,
}

impl Throttle {
    pub fn new(global_limit: usize, default_per_service: usize) -> Self {
        Self {
            global: Arc::new(Semaphore::new(global_limit.max(1))),
            per_service: DashMap::new(),
            default_per_service: default_per_service.max(1),
        }
    }

    pub fn set_limit(&self, service: &str, limit: usize) {
        self.per_service.insert(service.to_string(), Arc::new(Semaphore::new(limit.max(1))));
    }

    pub fn available(&self, service: &str) -> usize {
        self.per_service
            .get(service)
            .map(|s| s.available_permits())
            .unwrap_or(self.default_per_service)
    }

    fn service_semaphore(&self, service: &str) -> Arc<Semaphore> {
        self.per_service
            .entry(service.to_string())
            .or_insert_with(|| Arc::new(Semaphore::new(self.default_per_service)))
            .value()
            .clone()
    }

    pub async fn acquire(&self, service: &str) -> StrategyResult<ThrottlePermit> {
        let service_sem = self.service_semaphore(service);
        // Acquire global then service
        let gperm = self.global.clone().acquire_owned().await.map_err(|_| StrategyError::Unavailable)?;
        let sperm = service_sem.acquire_owned().await.map_err(|_| StrategyError::Unavailable)?;
        Ok(ThrottlePermit { _global: gperm, _service: sperm })
    }
}
