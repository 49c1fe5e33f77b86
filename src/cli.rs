use clap::Parser;
use std::path::PathBuf;

use sub_hunter::output::ExportFormat;
use sub_hunter::Method;

#[derive(clap::Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable detailed debug logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub debug: bool,

    /// Enable verbose logging (global)
    #[arg(long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// JSON config file (missing keys use defaults)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Never touch the network for HTTP sources (built-in wordlist, no crt.sh, no search engines)
    #[arg(long, global = true, default_value_t = false)]
    pub offline: bool,
}

#[derive(clap::Subcommand, Debug)]
pub enum Commands {
    /// Discover subdomains of a domain
    Scan {
        /// Target domain (e.g. example.com or https://example.com/)
        domain: String,

        /// Discovery method: all, dns, brute, cert or search
        #[arg(short = 'm', long, default_value = "all")]
        method: Method,

        /// Extra brute-force words, one per line
        #[arg(short = 'w', long, value_name = "FILE")]
        wordlist: Option<PathBuf>,

        /// Telegram bot token for the end-of-scan report
        #[arg(long, requires = "telegram_chat")]
        telegram_token: Option<String>,

        /// Telegram chat id for the end-of-scan report
        #[arg(long, requires = "telegram_token")]
        telegram_chat: Option<String>,

        /// Write results to a file in this format (txt or csv)
        #[arg(short = 'e', long)]
        export: Option<ExportFormat>,

        /// Output directory for exports
        #[arg(short = 'o', long, default_value = "./results")]
        out: PathBuf,

        /// Simultaneous DNS lookups during brute force
        #[arg(short = 'c', long)]
        concurrency: Option<usize>,

        /// HTTP request timeout in seconds
        #[arg(long)]
        timeout: Option<u64>,
    },

    /// Send a test message to a Telegram chat
    TestNotify {
        #[arg(long)]
        token: String,

        #[arg(long)]
        chat: String,
    },

    /// Print the brute-force wordlist that a scan would use
    Wordlist,
}

pub fn parse_cli() -> Cli {
    Cli::parse()
}
