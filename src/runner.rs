use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::time::Duration;

use crate::cli::{Cli, Commands};
use sub_hunter::output::ExportFormat;
use sub_hunter::{Config, Method, NotifyTarget, ScanCoordinator, ScanRequest, ScanStatus};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

fn init_logging(cli: &Cli) {
    // Keep external crates at INFO/WARN so the progress bar stays readable.
    use tracing_subscriber::EnvFilter;
    let crate_level = if cli.debug { "debug" } else if cli.verbose { "info" } else { "warn" };
    let filter_str = format!(
        "sub_hunter={crate},reqwest=info,hyper=info,h2=info,hickory_resolver=warn,hickory_proto=warn",
        crate = crate_level
    );
    let env_filter = EnvFilter::try_new(&filter_str).unwrap_or_else(|_| EnvFilter::new(crate_level));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_ansi(true)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if cli.offline {
        config.offline = true;
    }
    Ok(config)
}

pub async fn run_from_cli(cli: Cli) -> anyhow::Result<()> {
    init_logging(&cli);
    let mut config = load_config(&cli)?;

    match cli.command {
        Commands::TestNotify { token, chat } => {
            let coordinator = ScanCoordinator::new(config);
            let outcome = coordinator.test_notification(&NotifyTarget::new(token, chat)).await?;
            if outcome.success {
                println!("[+] {}", outcome.message);
            } else {
                println!("[-] {}", outcome.message);
            }
        }
        Commands::Wordlist => {
            let coordinator = ScanCoordinator::new(config);
            for word in coordinator.wordlist().await {
                println!("{}", word);
            }
        }
        Commands::Scan { domain, method, wordlist, telegram_token, telegram_chat, export, out, concurrency, timeout } => {
            if let Some(c) = concurrency {
                config.brute_concurrency = c;
            }
            if let Some(t) = timeout {
                config.http_timeout_secs = t;
            }

            let mut request = ScanRequest::new(domain, method);
            if let Some(path) = wordlist {
                let text = std::fs::read_to_string(&path)?;
                request = request.with_custom_wordlist_text(&text);
            }
            if let (Some(token), Some(chat)) = (telegram_token, telegram_chat) {
                request = request.with_notify(NotifyTarget::new(token, chat));
            }

            run_scan(ScanCoordinator::new(config), request, export, out).await?;
        }
    }
    Ok(())
}

async fn run_scan(coordinator: ScanCoordinator, request: ScanRequest, export: Option<ExportFormat>, out: PathBuf) -> anyhow::Result<()> {
    let method: Method = request.method;
    let id = coordinator.start_scan(request)?;
    let initial = coordinator.get_progress(&id)?;
    println!("[>] Target: {}", initial.request.domain);
    println!("[~] Method: {} (scan {})", method, id);

    let bar = ProgressBar::new(100);
    bar.set_style(
        ProgressStyle::with_template("{spinner} [{elapsed_precise}] [{bar:40}] {pos:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=> "),
    );

    let state = loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                bar.set_message("cancelling...");
                coordinator.cancel(&id)?;
            }
            _ = tokio::time::sleep(POLL_INTERVAL) => {}
        }
        let state = coordinator.get_progress(&id)?;
        bar.set_position(state.progress as u64);
        bar.set_message(format!("{}/{} units", state.completed_units, state.total_units));
        if state.is_finished() {
            break state;
        }
    };
    bar.finish_and_clear();

    if state.status == ScanStatus::Failed {
        anyhow::bail!("scan {} failed", id);
    }

    println!("[+] Found {} subdomains in {}s", state.results.len(), state.duration_secs());
    for sub in &state.results {
        println!("    {}", sub);
    }

    if let Some(outcome) = &state.notification {
        let mark = if outcome.success { "+" } else { "-" };
        println!("[{}] Telegram: {}", mark, outcome.message);
    }

    if let Some(format) = export {
        let file = coordinator.export(&state.results, format).await?;
        let path = file.write_to(&out)?;
        println!("[+] Exported {} ({}) to {}", format, file.content_type, path.display());
    }
    Ok(())
}
