use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::sync::Arc;

use super::{Strategy, StrategyContext};
use crate::config::Config;
use crate::errors::{StrategyError, StrategyResult};
use crate::http_client::fetch_text;
use crate::probe::Throttle;
use crate::scan::state::StrategyKind;

const SERVICE: &str = "crt.sh";

#[derive(Debug, Deserialize)]
struct CrtShEntry {
    name_value: Option<String>,
}

/// Parse a crt.sh JSON response into candidate names for `domain`.
///
/// `name_value` can contain multiple names separated by newlines. A name is
/// kept when it contains `domain` and is not the domain itself.
pub fn parse_crtsh(body: &str, domain: &str) -> StrategyResult<Vec<String>> {
    let entries: Vec<CrtShEntry> = serde_json::from_str(body)?;
    let mut out = Vec::new();
    for entry in entries {
        let Some(nv) = entry.name_value else { continue };
        for name in nv.split('\n') {
            let name = name.trim();
            if name.contains(domain) && name != domain {
                out.push(name.to_string());
            }
        }
    }
    Ok(out)
}

/// Looks the domain up in certificate-transparency logs: one query, one unit.
pub struct CertTransparency {
    client: Client,
    throttle: Arc<Throttle>,
    config: Config,
}

impl CertTransparency {
    pub fn new(client: Client, throttle: Arc<Throttle>, config: Config) -> Self {
        Self { client, throttle, config }
    }

    pub fn query_url(&self, domain: &str) -> String {
        let q = format!("%.{}", domain);
        format!("{}?q={}&output=json", self.config.crtsh_url, urlencoding::encode(&q))
    }

    async fn query(&self, domain: &str) -> StrategyResult<Vec<String>> {
        if self.config.offline {
            return Err(StrategyError::Unavailable);
        }
        let url = self.query_url(domain);
        tracing::debug!("Querying crt.sh for domain: {}", domain);
        let _permit = self.throttle.acquire(SERVICE).await?;
        let body = fetch_text(
            &self.client,
            &url,
            self.config.http_timeout(),
            self.config.http_retries,
            self.config.retry_backoff_ms,
        )
        .await?;
        parse_crtsh(&body, domain)
    }
}

#[async_trait]
impl Strategy for CertTransparency {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Cert
    }

    fn units(&self, _wordlist_len: usize) -> usize {
        1
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> StrategyResult<Vec<String>> {
        let result = tokio::select! {
            _ = ctx.cancel.cancelled() => Err(StrategyError::Cancelled),
            r = self.query(ctx.domain) => r,
        };
        ctx.progress.tick();
        let found = result?;
        tracing::info!("crt.sh found {} names", found.len());
        Ok(found)
    }
}
