use async_trait::async_trait;
use std::sync::Arc;

use super::{Strategy, StrategyContext};
use crate::errors::StrategyResult;
use crate::probe::{DnsRecord, DnsResolver, RecordKind, Throttle, DNS_SERVICE};
use crate::scan::state::StrategyKind;

/// Queries the root domain for A, AAAA, CNAME, MX, NS and TXT records and
/// collects the host names the answers mention.
pub struct DnsEnumerator {
    resolver: Arc<dyn DnsResolver>,
    throttle: Arc<Throttle>,
}

impl DnsEnumerator {
    pub fn new(resolver: Arc<dyn DnsResolver>, throttle: Arc<Throttle>) -> Self {
        Self { resolver, throttle }
    }
}

/// Host names from one record set worth reporting for `domain`.
///
/// Owner names are kept when they differ from the apex; CNAME/MX/NS targets
/// only when they sit below the domain.
fn hosts_from_records(domain: &str, records: &[DnsRecord]) -> Vec<String> {
    let suffix = format!(".{}", domain);
    let mut out = Vec::new();
    for record in records {
        if !record.owner.eq_ignore_ascii_case(domain) {
            out.push(record.owner.clone());
        }
        if let Some(target) = &record.target {
            if target.to_lowercase().ends_with(&suffix) {
                out.push(target.clone());
            }
        }
    }
    out
}

#[async_trait]
impl Strategy for DnsEnumerator {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Dns
    }

    fn units(&self, _wordlist_len: usize) -> usize {
        RecordKind::ALL.len()
    }

    async fn run(&self, ctx: &StrategyContext<'_>) -> StrategyResult<Vec<String>> {
        let mut found = Vec::new();
        for kind in RecordKind::ALL {
            if ctx.cancel.is_cancelled() {
                break;
            }
            let records = {
                let _permit = self.throttle.acquire(DNS_SERVICE).await?;
                self.resolver.records(ctx.domain, kind).await
            };
            match records {
                Ok(records) => {
                    let hosts = hosts_from_records(ctx.domain, &records);
                    tracing::debug!(record = %kind, answers = records.len(), hosts = hosts.len(), "DNS query done");
                    found.extend(hosts);
                }
                Err(e) => {
                    tracing::debug!(record = %kind, error = %e, "DNS query failed");
                }
            }
            ctx.progress.tick();
        }
        tracing::info!("DNS enumeration: {} candidates", found.len());
        Ok(found)
    }
}
