use chrono::{DateTime, Local};
use csv::Writer;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::config::VERSION;
use crate::probe::DnsResolver;

const RESOLVE_CONCURRENCY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Txt,
    Csv,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "txt",
            ExportFormat::Csv => "csv",
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            ExportFormat::Txt => "text/plain",
            ExportFormat::Csv => "text/csv",
        }
    }
}

impl FromStr for ExportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "txt" => Ok(ExportFormat::Txt),
            "csv" => Ok(ExportFormat::Csv),
            other => Err(format!("unknown export format '{}' (expected txt or csv)", other)),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// A rendered download: body plus the headers a transport needs.
#[derive(Debug, Clone)]
pub struct Export {
    pub content_type: &'static str,
    pub filename: String,
    pub body: Vec<u8>,
}

impl Export {
    pub fn content_disposition(&self) -> String {
        format!("attachment; filename=\"{}\"", self.filename)
    }

    pub fn write_to(&self, dir: &Path) -> anyhow::Result<PathBuf> {
        crate::utils::ensure_dir(dir)?;
        let path = dir.join(&self.filename);
        std::fs::write(&path, &self.body)?;
        Ok(path)
    }
}

pub fn export_filename(format: ExportFormat, at: DateTime<Local>) -> String {
    format!("subdomains_{}.{}", at.format("%Y-%m-%d_%H-%M-%S"), format.extension())
}

pub fn render_txt(results: &[String], at: DateTime<Local>) -> Vec<u8> {
    let mut out = String::new();
    out.push_str("# Subdomain Finder Results\n");
    out.push_str(&format!("# Generated: {}\n", at.format("%Y-%m-%d %H:%M:%S")));
    out.push_str(&format!("# Total Subdomains: {}\n", results.len()));
    out.push_str(&format!("# Version: {}\n\n", VERSION));
    for sub in results {
        out.push_str(sub);
        out.push('\n');
    }
    out.into_bytes()
}

/// Resolution result for one CSV row. Unresolved hosts echo their own name
/// in the IP column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub subdomain: String,
    pub ip: String,
    pub active: bool,
}

pub fn render_csv(rows: &[ResolvedRow]) -> anyhow::Result<Vec<u8>> {
    let mut w = Writer::from_writer(Vec::new());
    w.write_record(["Subdomain", "IP Address", "Status", "Discovery Method"])?;
    for row in rows {
        let status = if row.active { "Active" } else { "Inactive" };
        w.write_record([row.subdomain.as_str(), row.ip.as_str(), status, "Mixed"])?;
    }
    w.flush()?;
    w.into_inner().map_err(|e| anyhow::anyhow!("csv writer failed: {}", e.error()))
}

pub async fn resolve_rows(results: &[String], resolver: &dyn DnsResolver) -> Vec<ResolvedRow> {
    stream::iter(results.iter().cloned())
        .map(|subdomain| async move {
            match resolver.addresses(&subdomain).await {
                Ok(addrs) if !addrs.is_empty() => ResolvedRow { ip: addrs[0].to_string(), subdomain, active: true },
                _ => ResolvedRow { ip: subdomain.clone(), subdomain, active: false },
            }
        })
        .buffered(RESOLVE_CONCURRENCY)
        .collect()
        .await
}

/// Render `results` for download. CSV rows are resolved at export time.
pub async fn export(results: &[String], format: ExportFormat, resolver: &dyn DnsResolver) -> anyhow::Result<Export> {
    let now = Local::now();
    let body = match format {
        ExportFormat::Txt => render_txt(results, now),
        ExportFormat::Csv => render_csv(&resolve_rows(results, resolver).await)?,
    };
    Ok(Export { content_type: format.content_type(), filename: export_filename(format, now), body })
}
