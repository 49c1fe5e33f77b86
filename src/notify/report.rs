use html_escape::encode_text;

use crate::config::VERSION;

/// Entries listed in the report before the overflow note.
pub const MAX_LISTED: usize = 20;

pub const TEST_MESSAGE: &str = "🔔 Test Notification\n\nThis is a test message from Subdomain Finder";

/// Render the end-of-scan summary as Telegram HTML.
pub fn render_report(domain: &str, results: &[String], scan_secs: i64, active: usize) -> String {
    let mut message = String::new();
    message.push_str("🔍 <b>Subdomain Finder Report</b>\n\n");
    message.push_str(&format!("📌 <b>Domain:</b> <code>{}</code>\n", encode_text(domain)));
    message.push_str(&format!("⏱️ <b>Scan Time:</b> {}s\n", scan_secs));
    message.push_str(&format!("📊 <b>Total Subdomains:</b> {}\n", results.len()));
    message.push_str(&format!("✅ <b>Active Subdomains:</b> {}\n\n", active));

    if !results.is_empty() {
        message.push_str("📋 <b>Found Subdomains:</b>\n<pre>");
        for sub in results.iter().take(MAX_LISTED) {
            message.push_str(&format!("• {}\n", encode_text(sub)));
        }
        if results.len() > MAX_LISTED {
            message.push_str(&format!("\n... and {} more", results.len() - MAX_LISTED));
        }
        message.push_str("</pre>");
    }

    message.push_str(&format!("\n🔧 Generated by Subdomain Finder v{}", VERSION));
    message
}
