pub mod bruteforce;
pub mod crtsh;
pub mod dns;
pub mod search;
pub mod wordlist;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::errors::StrategyResult;
use crate::scan::progress::StrategyProgress;
use crate::scan::state::StrategyKind;

pub use bruteforce::BruteForcer;
pub use crtsh::CertTransparency;
pub use dns::DnsEnumerator;
pub use search::{Extractor, HostPatternExtractor, SearchEngine, SearchScraper};
pub use wordlist::WordlistProvider;

/// Everything a strategy needs for one run.
pub struct StrategyContext<'a> {
    /// Normalized root domain.
    pub domain: &'a str,
    /// Effective brute-force wordlist; empty unless brute force is selected.
    pub wordlist: &'a [String],
    pub progress: &'a StrategyProgress,
    pub cancel: &'a CancellationToken,
}

/// One discovery technique.
///
/// Implementations report one progress unit per unit of work and emit
/// candidates without deduplicating them.
#[async_trait]
pub trait Strategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Progress units this strategy will report for `wordlist_len` words.
    fn units(&self, wordlist_len: usize) -> usize;

    async fn run(&self, ctx: &StrategyContext<'_>) -> StrategyResult<Vec<String>>;
}
