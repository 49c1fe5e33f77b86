pub mod report;
pub mod telegram;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;

use crate::errors::ScanError;
use crate::probe::{DnsResolver, Throttle, DNS_SERVICE};
use crate::scan::state::{NotificationOutcome, NotifyTarget};

pub use report::{render_report, MAX_LISTED, TEST_MESSAGE};
pub use telegram::TelegramNotifier;

/// Outbound delivery of a rendered message. Failures are reported in the
/// outcome, never raised.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, target: &NotifyTarget, message: &str) -> NotificationOutcome;
}

/// Renders scan summaries and hands them to a [`Notifier`].
pub struct NotificationDispatcher {
    notifier: Arc<dyn Notifier>,
    resolver: Arc<dyn DnsResolver>,
    throttle: Arc<Throttle>,
}

impl NotificationDispatcher {
    pub fn new(notifier: Arc<dyn Notifier>, resolver: Arc<dyn DnsResolver>, throttle: Arc<Throttle>) -> Self {
        Self { notifier, resolver, throttle }
    }

    /// Count results that currently resolve.
    pub async fn count_active(&self, results: &[String]) -> usize {
        let limit = self.throttle.available(DNS_SERVICE).max(1);
        stream::iter(results.iter().cloned())
            .map(|host| async move {
                match self.throttle.acquire(DNS_SERVICE).await {
                    Ok(_permit) => self.resolver.resolves(&host).await,
                    Err(_) => false,
                }
            })
            .buffer_unordered(limit)
            .filter(|active| futures::future::ready(*active))
            .count()
            .await
    }

    pub async fn dispatch(
        &self,
        target: &NotifyTarget,
        domain: &str,
        results: &[String],
        scan_secs: i64,
    ) -> NotificationOutcome {
        let active = self.count_active(results).await;
        let message = render_report(domain, results, scan_secs, active);
        let outcome = self.notifier.send(target, &message).await;
        if outcome.success {
            tracing::info!(domain, "report notification sent");
        } else {
            tracing::warn!(domain, message = %outcome.message, "report notification failed");
        }
        outcome
    }

    /// Send the fixed test message. Both credentials are required.
    pub async fn test(&self, target: &NotifyTarget) -> Result<NotificationOutcome, ScanError> {
        if !target.has_credentials() {
            return Err(ScanError::MissingNotifyCredentials);
        }
        Ok(self.notifier.send(target, TEST_MESSAGE).await)
    }
}
