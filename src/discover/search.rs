use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;
use url::Url;

use super::{Strategy, StrategyContext};
use crate::config::{Config, SearchEngineConfig};
use crate::errors::StrategyResult;
use crate::http_client::fetch_text;
use crate::probe::Throttle;
use crate::scan::state::StrategyKind;

/// Pulls candidate host names for `domain` out of a raw result page.
pub trait Extractor: Send + Sync {
    fn extract(&self, body: &str, domain: &str) -> Vec<String>;
}

/// Matches `[A-Za-z0-9.-]+.<domain>` anywhere in the page, case-insensitively,
/// and keeps matches that form a valid `http://` URL host.
#[derive(Debug, Default, Clone, Copy)]
pub struct HostPatternExtractor;

impl Extractor for HostPatternExtractor {
    fn extract(&self, body: &str, domain: &str) -> Vec<String> {
        let pattern = format!(r"(?i)([a-z0-9\-.]+\.{})", regex::escape(domain));
        let re = match Regex::new(&pattern) {
            Ok(re) => re,
            Err(e) => {
                tracing::warn!(error = %e, "invalid host pattern");
                return Vec::new();
            }
        };
        re.captures_iter(body)
            .filter_map(|cap| cap.get(1).map(|m| m.as_str()))
            .filter(|m| is_valid_host(m))
            .map(str::to_string)
            .collect()
    }
}

fn is_valid_host(candidate: &str) -> bool {
    let Ok(url) = Url::parse(&format!("http://{}", candidate)) else {
        return false;
    };
    match url.host_str() {
        Some(host) if !host.is_empty() => host.split('.').all(is_valid_label),
        _ => false,
    }
}

/// RFC 1123 label: 1-63 alphanumerics or hyphens, no hyphen at either end.
fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= 63
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-')
}

pub struct SearchEngine {
    pub config: SearchEngineConfig,
    pub extractor: Box<dyn Extractor>,
}

impl SearchEngine {
    pub fn new(config: SearchEngineConfig) -> Self {
        Self { config, extractor: Box::new(HostPatternExtractor) }
    }

    pub fn with_extractor(config: SearchEngineConfig, extractor: Box<dyn Extractor>) -> Self {
        Self { config, extractor }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }
}

/// Runs a `site:*.<domain>` query on each configured engine in order,
/// pausing `engine_pause` after every query.
pub struct SearchScraper {
    client: Client,
    throttle: Arc<Throttle>,
    engines: Vec<SearchEngine>,
    config: Config,
}

impl SearchScraper {
    pub fn new(client: Client, throttle: Arc<Throttle>, config: Config) -> Self {
        let engines = config.search_engines.iter().cloned().map(SearchEngine::new).collect();
        Self { client, throttle, engines, config }
    }

    pub fn with_engines(mut self, engines: Vec<SearchEngine>) -> Self {
        self.engines = engines;
        self
    }

    pub fn engine_count(&self) -> usize {
        self.engines.len()
    }

    async fn query(&self, engine: &SearchEngine, domain: &str) -> StrategyResult<Vec<String>> {
        let url = engine.config.url_for(domain);
        let _permit = self.throttle.acquire(engine.name()).await?;
        // single attempt per engine; retries would break the pause between queries
        let body = fetch_text(&self.client, &url, self.config.http_timeout(), 0, self.config.retry_backoff_ms).await?;
        Ok(engine.extractor.extract(&body, domain))
    }
}

#[async_trait]
impl Strategy for SearchScraper {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Search
    }

    fn units(&self, _wordlist_len: usize) -> usize {
        self.engines.len()
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> StrategyResult<Vec<String>> {
        if self.config.offline {
            tracing::debug!("offline mode, skipping search engines");
            ctx.progress.advance(self.engines.len());
            return Ok(Vec::new());
        }

        let mut found = Vec::new();
        for engine in &self.engines {
            if ctx.cancel.is_cancelled() {
                break;
            }
            match self.query(engine, ctx.domain).await {
                Ok(hosts) => {
                    tracing::debug!(engine = engine.name(), hosts = hosts.len(), "search engine scraped");
                    found.extend(hosts);
                }
                Err(e) => tracing::warn!(engine = engine.name(), error = %e, "search engine query failed"),
            }
            ctx.progress.tick();

            tokio::select! {
                _ = ctx.cancel.cancelled() => {}
                _ = tokio::time::sleep(self.config.engine_pause()) => {}
            }
        }
        tracing::info!("Search scraping: {} candidates", found.len());
        Ok(found)
    }
}
