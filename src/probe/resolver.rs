use async_trait::async_trait;
use hickory_resolver::config::{ResolverConfig, ResolverOpts};
use hickory_resolver::error::ResolveErrorKind;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::TokioAsyncResolver;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;
use std::time::Duration;

use crate::errors::{StrategyError, StrategyResult};

/// Record types queried during DNS enumeration, in query order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RecordKind {
    A,
    Aaaa,
    Cname,
    Mx,
    Ns,
    Txt,
}

impl RecordKind {
    pub const ALL: [RecordKind; 6] = [
        RecordKind::A,
        RecordKind::Aaaa,
        RecordKind::Cname,
        RecordKind::Mx,
        RecordKind::Ns,
        RecordKind::Txt,
    ];

    fn record_type(self) -> RecordType {
        match self {
            RecordKind::A => RecordType::A,
            RecordKind::Aaaa => RecordType::AAAA,
            RecordKind::Cname => RecordType::CNAME,
            RecordKind::Mx => RecordType::MX,
            RecordKind::Ns => RecordType::NS,
            RecordKind::Txt => RecordType::TXT,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RecordKind::A => "A",
            RecordKind::Aaaa => "AAAA",
            RecordKind::Cname => "CNAME",
            RecordKind::Mx => "MX",
            RecordKind::Ns => "NS",
            RecordKind::Txt => "TXT",
        };
        f.write_str(s)
    }
}

/// One answer record, reduced to the host names it mentions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRecord {
    /// Owner name of the record.
    pub owner: String,
    /// Host the record points at (CNAME, MX and NS only).
    pub target: Option<String>,
}

#[async_trait]
pub trait DnsResolver: Send + Sync {
    /// Query `name` for one record type. "No records" is an empty vector.
    async fn records(&self, name: &str, kind: RecordKind) -> StrategyResult<Vec<DnsRecord>>;

    /// Addresses `host` resolves to; empty when it does not resolve.
    async fn addresses(&self, host: &str) -> StrategyResult<Vec<IpAddr>>;

    /// Best-effort "does this name exist" check.
    async fn resolves(&self, host: &str) -> bool {
        matches!(self.addresses(host).await, Ok(addrs) if !addrs.is_empty())
    }
}

/// System-configured hickory resolver with a hard per-query deadline.
pub struct HickoryResolver {
    inner: TokioAsyncResolver,
    timeout: Duration,
}

impl HickoryResolver {
    pub fn new(timeout: Duration) -> Self {
        let mut opts = ResolverOpts::default();
        opts.timeout = timeout;
        opts.attempts = 1;
        let inner = match hickory_resolver::system_conf::read_system_conf() {
            Ok((config, _)) => TokioAsyncResolver::tokio(config, opts),
            Err(e) => {
                tracing::debug!(error = %e, "no system resolver config, using defaults");
                TokioAsyncResolver::tokio(ResolverConfig::default(), opts)
            }
        };
        Self { inner, timeout }
    }
}

fn host_name(name: &hickory_resolver::proto::rr::Name) -> String {
    name.to_utf8().trim_end_matches('.').to_string()
}

fn is_no_records(kind: &ResolveErrorKind) -> bool {
    matches!(kind, ResolveErrorKind::NoRecordsFound { .. })
}

#[async_trait]
impl DnsResolver for HickoryResolver {
    async fn records(&self, name: &str, kind: RecordKind) -> StrategyResult<Vec<DnsRecord>> {
        let lookup = match tokio::time::timeout(self.timeout, self.inner.lookup(name, kind.record_type())).await? {
            Ok(lookup) => lookup,
            Err(e) if is_no_records(e.kind()) => return Ok(Vec::new()),
            Err(e) => return Err(StrategyError::Dns(e.to_string())),
        };

        let records = lookup
            .record_iter()
            .map(|record| {
                let target = match record.data() {
                    Some(RData::CNAME(cname)) => Some(host_name(&cname.0)),
                    Some(RData::MX(mx)) => Some(host_name(mx.exchange())),
                    Some(RData::NS(ns)) => Some(host_name(&ns.0)),
                    _ => None,
                };
                DnsRecord { owner: host_name(record.name()), target }
            })
            .collect();
        Ok(records)
    }

    async fn addresses(&self, host: &str) -> StrategyResult<Vec<IpAddr>> {
        match tokio::time::timeout(self.timeout, self.inner.lookup_ip(host)).await? {
            Ok(lookup) => Ok(lookup.iter().collect()),
            Err(e) if is_no_records(e.kind()) => Ok(Vec::new()),
            Err(e) => Err(StrategyError::Dns(e.to_string())),
        }
    }
}
