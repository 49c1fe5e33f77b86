use reqwest::Client;

use crate::config::Config;
use crate::http_client::fetch_text;

/// Built-in candidates used when the remote list cannot be fetched.
pub const DEFAULT_WORDLIST: &[&str] = &[
    // Mail / hosting panels
    "www", "mail", "ftp", "localhost", "webmail", "smtp", "pop", "ns1", "ns2", "webdisk",
    "ns", "ns3", "ns4", "cpanel", "whm", "autodiscover", "autoconfig", "m", "imap",
    // Apps / development
    "api", "blog", "forum", "dev", "test", "staging", "admin", "mysql", "mssql",
    "backup", "cp", "email", "secure", "vpn", "portal", "intranet", "git", "svn",
    "shop", "store", "cart", "app", "apps", "mobile", "cdn", "media", "images",
    "files", "download", "uploads", "docs", "help", "support", "kb", "knowledgebase",
    // Monitoring / business
    "status", "health", "monitor", "stats", "analytics", "reports", "dashboard",
    "crm", "erp", "hr", "payroll", "accounting", "finance", "billing", "payment",
    // Versions / environments
    "api-dev", "api-staging", "api-test", "api-prod", "v1", "v2", "v3", "beta",
    "alpha", "demo", "sandbox", "preview", "staging-api", "dev-api", "test-api",
];

pub fn default_wordlist() -> Vec<String> {
    DEFAULT_WORDLIST.iter().map(|s| s.to_string()).collect()
}

/// Keep non-blank, non-comment lines, trimmed.
pub fn parse_wordlist(body: &str) -> Vec<String> {
    body.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Append `custom` to `base` and drop exact duplicates, keeping first occurrence order.
pub fn merge_wordlists(base: Vec<String>, custom: &[String]) -> Vec<String> {
    let mut seen = ahash::AHashSet::with_capacity(base.len() + custom.len());
    base.into_iter()
        .chain(custom.iter().map(|w| w.trim().to_string()))
        .filter(|w| !w.is_empty())
        .filter(|w| seen.insert(w.clone()))
        .collect()
}

pub struct WordlistProvider {
    client: Client,
    config: Config,
}

impl WordlistProvider {
    pub fn new(client: Client, config: Config) -> Self {
        Self { client, config }
    }

    /// Remote list (or the built-in fallback) plus any custom words.
    pub async fn fetch(&self, custom: Option<&[String]>) -> Vec<String> {
        let base = self.fetch_base().await;
        match custom {
            Some(words) if !words.is_empty() => merge_wordlists(base, words),
            _ => merge_wordlists(base, &[]),
        }
    }

    async fn fetch_base(&self) -> Vec<String> {
        if self.config.offline {
            tracing::debug!("offline mode, using built-in wordlist");
            return default_wordlist();
        }

        tracing::debug!(url = %self.config.wordlist_url, "Fetching remote wordlist");
        match fetch_text(
            &self.client,
            &self.config.wordlist_url,
            self.config.http_timeout(),
            self.config.http_retries,
            self.config.retry_backoff_ms,
        )
        .await
        {
            Ok(body) => {
                let words = parse_wordlist(&body);
                if words.is_empty() {
                    tracing::warn!("remote wordlist was empty, using built-in list");
                    default_wordlist()
                } else {
                    tracing::info!("Remote wordlist: {} entries", words.len());
                    words
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "wordlist fetch failed, using built-in list");
                default_wordlist()
            }
        }
    }
}
