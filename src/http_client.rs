use reqwest::{Client, ClientBuilder};
use std::time::Duration;

use crate::config::Config;
use crate::errors::{StrategyError, StrategyResult};

/// Build the shared HTTP client used by every fetch in a scan.
pub fn build_client(config: &Config) -> Client {
    ClientBuilder::new()
        .pool_max_idle_per_host(10)
        .pool_idle_timeout(Some(Duration::from_secs(90)))
        .tcp_nodelay(true)
        .timeout(config.http_timeout())
        .connect_timeout(Duration::from_secs(5))
        .gzip(true)
        .brotli(true)
        .use_rustls_tls()
        .redirect(reqwest::redirect::Policy::limited(5))
        .user_agent(config.user_agent.clone())
        // Third-party endpoints (crt.sh mirrors, raw wordlist hosts) are fetched without peer verification.
        .danger_accept_invalid_certs(true)
        .build()
        .unwrap_or_else(|e| {
            tracing::warn!(error = %e, "falling back to default HTTP client");
            Client::new()
        })
}

/// GET `url` and return the body, retrying transport errors and 5xx up to
/// `retries` times with exponential backoff. Any other non-2xx status is
/// returned immediately.
pub async fn fetch_text(
    client: &Client,
    url: &str,
    timeout: Duration,
    retries: usize,
    backoff_initial_ms: u64,
) -> StrategyResult<String> {
    let max_attempts = retries.min(9) + 1;
    let mut backoff = backoff_initial_ms.max(1);
    let mut attempt = 1;
    loop {
        match fetch_once(client, url, timeout).await {
            Ok(body) => return Ok(body),
            Err(e) if attempt < max_attempts && is_transient(&e) => {
                tracing::debug!(url, attempt, error = %e, "retrying fetch");
                tokio::time::sleep(Duration::from_millis(backoff)).await;
                backoff = backoff.saturating_mul(2).min(5000);
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

async fn fetch_once(client: &Client, url: &str, timeout: Duration) -> StrategyResult<String> {
    let resp = tokio::time::timeout(timeout, client.get(url).send()).await??;
    let status = resp.status();
    if !status.is_success() {
        return Err(StrategyError::Status(status.as_u16()));
    }
    let body = tokio::time::timeout(timeout, resp.text()).await??;
    Ok(body)
}

fn is_transient(e: &StrategyError) -> bool {
    match e {
        StrategyError::Http(_) | StrategyError::Timeout => true,
        StrategyError::Status(code) => *code >= 500,
        _ => false,
    }
}
