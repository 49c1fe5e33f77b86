#![allow(dead_code)]

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use sub_hunter::errors::{StrategyError, StrategyResult};
use sub_hunter::notify::Notifier;
use sub_hunter::probe::{DnsRecord, DnsResolver, RecordKind};
use sub_hunter::scan::{NotificationOutcome, NotifyTarget};
use sub_hunter::Config;

/// Resolver answering from fixed tables.
#[derive(Default)]
pub struct FakeResolver {
    pub hosts: HashMap<String, Vec<IpAddr>>,
    pub records: HashMap<RecordKind, Vec<DnsRecord>>,
    pub failing: Vec<RecordKind>,
    pub delay: Option<Duration>,
    pub record_queries: AtomicUsize,
    pub address_queries: AtomicUsize,
    pub in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
}

impl FakeResolver {
    pub fn with_hosts(hosts: &[&str]) -> Self {
        let mut r = FakeResolver::default();
        for (i, h) in hosts.iter().enumerate() {
            r.hosts.insert(h.to_string(), vec![IpAddr::from([192, 0, 2, (i + 1) as u8])]);
        }
        r
    }
}

#[async_trait]
impl DnsResolver for FakeResolver {
    async fn records(&self, _name: &str, kind: RecordKind) -> StrategyResult<Vec<DnsRecord>> {
        self.record_queries.fetch_add(1, Ordering::SeqCst);
        if self.failing.contains(&kind) {
            return Err(StrategyError::Dns("SERVFAIL".into()));
        }
        Ok(self.records.get(&kind).cloned().unwrap_or_default())
    }

    async fn addresses(&self, host: &str) -> StrategyResult<Vec<IpAddr>> {
        self.address_queries.fetch_add(1, Ordering::SeqCst);
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        if let Some(d) = self.delay {
            tokio::time::sleep(d).await;
        }
        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        Ok(self.hosts.get(host).cloned().unwrap_or_default())
    }
}

pub fn record(owner: &str, target: Option<&str>) -> DnsRecord {
    DnsRecord { owner: owner.to_string(), target: target.map(str::to_string) }
}

/// Notifier that keeps every message it is asked to send.
#[derive(Default)]
pub struct RecordingNotifier {
    pub sent: Mutex<Vec<(NotifyTarget, String)>>,
    pub fail: bool,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn send(&self, target: &NotifyTarget, message: &str) -> NotificationOutcome {
        self.sent.lock().push((target.clone(), message.to_string()));
        if self.fail {
            NotificationOutcome::failure("Failed to send notification: chat not found")
        } else {
            NotificationOutcome::success("Notification sent successfully")
        }
    }
}

/// Config with no outbound HTTP and minimal pauses.
pub fn fast_offline_config() -> Config {
    Config {
        offline: true,
        brute_batch_pause_ms: 1,
        engine_pause_ms: 1,
        http_timeout_secs: 2,
        http_retries: 1,
        ..Config::default()
    }
}

/// Serve `body` with `status` to every connection until the test ends.
pub async fn serve_canned(status: u16, content_type: &'static str, body: &'static str) -> SocketAddr {
    serve_counted(status, content_type, body).await.0
}

/// Like [`serve_canned`], also counting the requests answered.
pub async fn serve_counted(
    status: u16,
    content_type: &'static str,
    body: &'static str,
) -> (SocketAddr, Arc<AtomicUsize>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let counter = hits.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut stream, _)) = listener.accept().await else { break };
            counter.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut buf = vec![0u8; 16384];
                let mut read = 0;
                let mut expected = None;
                while read < buf.len() {
                    let n = match stream.read(&mut buf[read..]).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => n,
                    };
                    read += n;
                    if expected.is_none() {
                        expected = header_end(&buf[..read]).map(|end| end + content_length(&buf[..end]));
                    }
                    if matches!(expected, Some(total) if read >= total) {
                        break;
                    }
                }
                let response = format!(
                    "HTTP/1.1 {} X\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    content_type,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes()).await;
                let _ = stream.shutdown().await;
            });
        }
    });
    (addr, hits)
}

fn header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|w| w == b"\r\n\r\n").map(|i| i + 4)
}

fn content_length(head: &[u8]) -> usize {
    String::from_utf8_lossy(head)
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse().ok())
        .unwrap_or(0)
}
