use std::fs;
use std::path::Path;

pub fn ensure_dir(path: &Path) -> anyhow::Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)?;
    }
    Ok(())
}

/// Reduce user input like `HTTPS://Example.com/path` to a bare root domain.
///
/// Lowercases, strips an `http(s)://` scheme, drops everything from the first
/// `/`, and removes trailing dots. Applying it twice yields the same result.
pub fn normalize_domain(input: &str) -> String {
    let lower = input.trim().to_lowercase();
    let without_scheme = lower
        .strip_prefix("https://")
        .or_else(|| lower.strip_prefix("http://"))
        .unwrap_or(&lower);
    let host = without_scheme.split('/').next().unwrap_or_default();
    host.trim_start()
        .trim_end_matches(|c: char| c == '.' || c.is_whitespace())
        .to_string()
}

/// Canonical form of a discovered host name used when merging results.
pub fn normalize_candidate(candidate: &str) -> String {
    candidate.trim().trim_end_matches('.').to_lowercase()
}
