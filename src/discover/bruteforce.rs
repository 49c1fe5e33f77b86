use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::Duration;

use super::{Strategy, StrategyContext};
use crate::errors::StrategyResult;
use crate::probe::{DnsResolver, Throttle, DNS_SERVICE};
use crate::scan::state::StrategyKind;

/// Resolves `<word>.<domain>` for every wordlist entry.
///
/// Entries are processed in input order, `batch_size` at a time with at most
/// `concurrency` lookups in flight. After every batch the forcer sleeps for
/// `batch_pause`, so consecutive batches are always at least that far apart.
pub struct BruteForcer {
    resolver: Arc<dyn DnsResolver>,
    throttle: Arc<Throttle>,
    batch_size: usize,
    batch_pause: Duration,
    concurrency: usize,
}

impl BruteForcer {
    pub fn new(
        resolver: Arc<dyn DnsResolver>,
        throttle: Arc<Throttle>,
        batch_size: usize,
        batch_pause: Duration,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            throttle,
            batch_size: batch_size.max(1),
            batch_pause,
            concurrency: concurrency.max(1),
        }
    }

    async fn probe(&self, word: &str, ctx: &StrategyContext<'_>) -> Option<String> {
        let word = word.trim();
        if word.is_empty() {
            ctx.progress.tick();
            return None;
        }
        let host = format!("{}.{}", word, ctx.domain);
        let found = match self.throttle.acquire(DNS_SERVICE).await {
            Ok(_permit) => self.resolver.resolves(&host).await,
            Err(_) => false,
        };
        ctx.progress.tick();
        if found {
            tracing::debug!(host = %host, "resolved");
            Some(host)
        } else {
            None
        }
    }
}

#[async_trait]
impl Strategy for BruteForcer {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Brute
    }

    fn units(&self, wordlist_len: usize) -> usize {
        wordlist_len
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> StrategyResult<Vec<String>> {
        tracing::debug!("Starting DNS bruteforce for {} words", ctx.wordlist.len());
        let mut found = Vec::new();

        for (batch_no, batch) in ctx.wordlist.chunks(self.batch_size).enumerate() {
            if ctx.cancel.is_cancelled() {
                tracing::info!(batch = batch_no, "bruteforce cancelled");
                break;
            }

            let hits: Vec<Option<String>> = stream::iter(batch.iter().cloned())
                .map(|word| async move { self.probe(&word, ctx).await })
                .buffered(self.concurrency)
                .collect()
                .await;
            found.extend(hits.into_iter().flatten());

            tokio::select! {
                _ = ctx.cancel.cancelled() => {}
                _ = tokio::time::sleep(self.batch_pause) => {}
            }
        }

        tracing::info!("DNS bruteforce found {} subdomains", found.len());
        Ok(found)
    }
}
