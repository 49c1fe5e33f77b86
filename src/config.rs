use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

pub const DEFAULT_WORDLIST_URL: &str =
    "https://raw.githubusercontent.com/danielmiessler/SecLists/master/Discovery/DNS/subdomains-top1million-5000.txt";

/// A search engine queried by the scraper. `url_template` contains a
/// `{domain}` placeholder which is replaced by the url-encoded root domain.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct SearchEngineConfig {
    pub name: String,
    pub url_template: String,
}

impl SearchEngineConfig {
    pub fn new(name: &str, url_template: &str) -> Self {
        Self { name: name.to_string(), url_template: url_template.to_string() }
    }

    pub fn url_for(&self, domain: &str) -> String {
        self.url_template.replace("{domain}", &urlencoding::encode(domain))
    }
}

fn default_engines() -> Vec<SearchEngineConfig> {
    vec![
        SearchEngineConfig::new("google", "https://www.google.com/search?q=site:*.{domain}&num=100"),
        SearchEngineConfig::new("bing", "https://www.bing.com/search?q=site:*.{domain}&count=50"),
        SearchEngineConfig::new("yahoo", "https://search.yahoo.com/search?p=site:*.{domain}"),
    ]
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    pub http_timeout_secs: u64,
    pub notify_timeout_secs: u64,
    pub dns_timeout_secs: u64,
    pub user_agent: String,
    pub wordlist_url: String,
    pub crtsh_url: String,
    pub telegram_api_url: String,
    pub search_engines: Vec<SearchEngineConfig>,
    pub brute_batch_size: usize,
    pub brute_batch_pause_ms: u64,
    pub brute_concurrency: usize,
    pub engine_pause_ms: u64,
    pub global_concurrency: usize,
    /// Extra attempts after a transient HTTP failure.
    pub http_retries: usize,
    pub retry_backoff_ms: u64,
    /// When set, no outbound HTTP is attempted at all.
    pub offline: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_timeout_secs: 15,
            notify_timeout_secs: 10,
            dns_timeout_secs: 5,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            wordlist_url: DEFAULT_WORDLIST_URL.to_string(),
            crtsh_url: "https://crt.sh/".to_string(),
            telegram_api_url: "https://api.telegram.org".to_string(),
            search_engines: default_engines(),
            brute_batch_size: 100,
            brute_batch_pause_ms: 50,
            brute_concurrency: 20,
            engine_pause_ms: 2000,
            global_concurrency: 50,
            http_retries: 2,
            retry_backoff_ms: 500,
            offline: false,
        }
    }
}

impl Config {
    /// Load a JSON config file. Missing keys fall back to defaults.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let data = std::fs::read_to_string(path)?;
        let cfg: Config = serde_json::from_str(&data)?;
        Ok(cfg)
    }

    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    pub fn dns_timeout(&self) -> Duration {
        Duration::from_secs(self.dns_timeout_secs)
    }

    pub fn notify_timeout(&self) -> Duration {
        Duration::from_secs(self.notify_timeout_secs)
    }

    pub fn batch_pause(&self) -> Duration {
        Duration::from_millis(self.brute_batch_pause_ms)
    }

    pub fn engine_pause(&self) -> Duration {
        Duration::from_millis(self.engine_pause_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_keeps_defaults() {
        let cfg: Config = serde_json::from_str(r#"{"brute_concurrency": 5, "offline": true}"#).unwrap();
        assert_eq!(cfg.brute_concurrency, 5);
        assert!(cfg.offline);
        assert_eq!(cfg.brute_batch_size, 100);
        assert_eq!(cfg.search_engines.len(), 3);
    }

    #[test]
    fn engine_url_encodes_domain() {
        let e = SearchEngineConfig::new("x", "https://s.test/?q=site:*.{domain}");
        assert_eq!(e.url_for("example.com"), "https://s.test/?q=site:*.example.com");
    }
}
