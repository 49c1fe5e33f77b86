use dashmap::DashMap;
use reqwest::Client;
use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use super::progress::ProgressTracker;
use super::state::{NotificationOutcome, NotifyTarget, ScanId, ScanRequest, ScanState, StrategyKind, WorkPlan};
use super::store::{MemoryScanStore, ScanStore};
use crate::config::Config;
use crate::discover::{
    BruteForcer, CertTransparency, DnsEnumerator, SearchScraper, Strategy, StrategyContext, WordlistProvider,
};
use crate::errors::ScanError;
use crate::http_client::build_client;
use crate::notify::{NotificationDispatcher, Notifier, TelegramNotifier};
use crate::output::{self, Export, ExportFormat};
use crate::probe::{DnsResolver, HickoryResolver, Throttle, DNS_SERVICE};
use crate::utils::{normalize_candidate, normalize_domain};

/// Merge strategy outputs: normalize each name, drop blanks and duplicates,
/// sort ascending.
pub fn merge_candidates(candidates: impl IntoIterator<Item = String>) -> Vec<String> {
    candidates
        .into_iter()
        .map(|c| normalize_candidate(&c))
        .filter(|c| !c.is_empty())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

struct Inner {
    config: Config,
    store: Arc<dyn ScanStore>,
    resolver: Arc<dyn DnsResolver>,
    wordlists: WordlistProvider,
    strategies: Vec<Arc<dyn Strategy>>,
    dispatcher: NotificationDispatcher,
    running: DashMap<ScanId, CancellationToken>,
}

/// Owns scan lifecycles: validates requests, runs the selected strategies in
/// the background, and publishes progress and results through the store.
#[derive(Clone)]
pub struct ScanCoordinator {
    inner: Arc<Inner>,
}

/// Assembles a [`ScanCoordinator`], letting callers swap any collaborator.
pub struct CoordinatorBuilder {
    config: Config,
    client: Option<Client>,
    store: Option<Arc<dyn ScanStore>>,
    resolver: Option<Arc<dyn DnsResolver>>,
    notifier: Option<Arc<dyn Notifier>>,
    overrides: Vec<Arc<dyn Strategy>>,
}

impl CoordinatorBuilder {
    pub fn new(config: Config) -> Self {
        Self { config, client: None, store: None, resolver: None, notifier: None, overrides: Vec::new() }
    }

    pub fn client(mut self, client: Client) -> Self {
        self.client = Some(client);
        self
    }

    pub fn store(mut self, store: Arc<dyn ScanStore>) -> Self {
        self.store = Some(store);
        self
    }

    pub fn resolver(mut self, resolver: Arc<dyn DnsResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// Replace the built-in strategy of the same kind.
    pub fn strategy(mut self, strategy: Arc<dyn Strategy>) -> Self {
        self.overrides.retain(|s| s.kind() != strategy.kind());
        self.overrides.push(strategy);
        self
    }

    pub fn build(self) -> ScanCoordinator {
        let config = self.config;
        let client = self.client.unwrap_or_else(|| build_client(&config));
        let store = self.store.unwrap_or_else(|| Arc::new(MemoryScanStore::new()));
        let resolver = self.resolver.unwrap_or_else(|| Arc::new(HickoryResolver::new(config.dns_timeout())));
        let notifier = self.notifier.unwrap_or_else(|| {
            Arc::new(TelegramNotifier::new(client.clone(), config.telegram_api_url.clone(), config.notify_timeout()))
        });

        let throttle = Arc::new(Throttle::new(config.global_concurrency, 1));
        throttle.set_limit(DNS_SERVICE, config.brute_concurrency);

        let mut overrides = self.overrides;
        let mut strategies: Vec<Arc<dyn Strategy>> = Vec::with_capacity(StrategyKind::ORDERED.len());
        for kind in StrategyKind::ORDERED {
            let strategy: Arc<dyn Strategy> = match overrides.iter().position(|s| s.kind() == kind) {
                Some(i) => overrides.swap_remove(i),
                None => match kind {
                    StrategyKind::Dns => Arc::new(DnsEnumerator::new(resolver.clone(), throttle.clone())),
                    StrategyKind::Brute => Arc::new(BruteForcer::new(
                        resolver.clone(),
                        throttle.clone(),
                        config.brute_batch_size,
                        config.batch_pause(),
                        config.brute_concurrency,
                    )),
                    StrategyKind::Cert => {
                        Arc::new(CertTransparency::new(client.clone(), throttle.clone(), config.clone()))
                    }
                    StrategyKind::Search => {
                        Arc::new(SearchScraper::new(client.clone(), throttle.clone(), config.clone()))
                    }
                },
            };
            strategies.push(strategy);
        }

        let inner = Inner {
            wordlists: WordlistProvider::new(client, config.clone()),
            dispatcher: NotificationDispatcher::new(notifier, resolver.clone(), throttle),
            config,
            store,
            resolver,
            strategies,
            running: DashMap::new(),
        };
        ScanCoordinator { inner: Arc::new(inner) }
    }
}

impl ScanCoordinator {
    pub fn new(config: Config) -> Self {
        CoordinatorBuilder::new(config).build()
    }

    pub fn builder(config: Config) -> CoordinatorBuilder {
        CoordinatorBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Validate `request`, persist a running scan and start it in the
    /// background. Returns as soon as the scan is registered.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start_scan(&self, request: ScanRequest) -> Result<ScanId, ScanError> {
        let domain = normalize_domain(&request.domain);
        if domain.is_empty() {
            return Err(ScanError::DomainRequired);
        }
        let request = ScanRequest { domain, ..request };

        let id = ScanId::generate();
        let cancel = CancellationToken::new();
        self.inner.store.put(ScanState::new(id.clone(), request.clone()));
        self.inner.running.insert(id.clone(), cancel.clone());
        tracing::info!(scan = %id, domain = %request.domain, method = %request.method, "Starting scan");

        let inner = Arc::clone(&self.inner);
        let task_id = id.clone();
        tokio::spawn(async move {
            let worker = tokio::spawn(run_scan(Arc::clone(&inner), task_id.clone(), request, cancel));
            if let Err(e) = worker.await {
                tracing::error!(scan = %task_id, error = %e, "scan task died");
                inner.store.update(&task_id, &mut |state| {
                    state.fail();
                });
            }
            inner.running.remove(&task_id);
        });

        Ok(id)
    }

    pub fn get_progress(&self, id: &ScanId) -> Result<ScanState, ScanError> {
        self.inner.store.get(id).ok_or_else(|| ScanError::NotFound(id.to_string()))
    }

    pub fn get_results(&self, id: &ScanId) -> Result<Vec<String>, ScanError> {
        self.get_progress(id).map(|state| state.results)
    }

    /// Ask a running scan to stop at its next checkpoint. Returns false when
    /// the scan has already finished.
    pub fn cancel(&self, id: &ScanId) -> Result<bool, ScanError> {
        self.get_progress(id)?;
        match self.inner.running.get(id) {
            Some(token) => {
                token.cancel();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Forget a finished scan. Running scans are kept; cancel them first.
    pub fn remove(&self, id: &ScanId) -> Result<bool, ScanError> {
        let state = self.get_progress(id)?;
        if !state.is_finished() {
            return Ok(false);
        }
        Ok(self.inner.store.remove(id).is_some())
    }

    /// Poll until the scan leaves the running state.
    pub async fn wait(&self, id: &ScanId, poll: Duration) -> Result<ScanState, ScanError> {
        loop {
            let state = self.get_progress(id)?;
            if state.is_finished() {
                return Ok(state);
            }
            tokio::time::sleep(poll).await;
        }
    }

    pub async fn test_notification(&self, target: &NotifyTarget) -> Result<NotificationOutcome, ScanError> {
        self.inner.dispatcher.test(target).await
    }

    pub async fn export(&self, results: &[String], format: ExportFormat) -> anyhow::Result<Export> {
        output::export(results, format, self.inner.resolver.as_ref()).await
    }

    /// The wordlist a brute-force scan would use, without custom additions.
    pub async fn wordlist(&self) -> Vec<String> {
        self.inner.wordlists.fetch(None).await
    }
}

async fn run_scan(inner: Arc<Inner>, id: ScanId, request: ScanRequest, cancel: CancellationToken) {
    let selected: Vec<Arc<dyn Strategy>> =
        inner.strategies.iter().filter(|s| request.method.includes(s.kind())).cloned().collect();

    let wordlist = if request.method.includes(StrategyKind::Brute) {
        inner.wordlists.fetch(Some(&request.custom_wordlist)).await
    } else {
        Vec::new()
    };

    let plan = WorkPlan::from_units(selected.iter().map(|s| (s.kind(), s.units(wordlist.len()))));
    inner.store.update(&id, &mut |state| state.set_plan(&plan));
    tracing::debug!(scan = %id, total_units = plan.total_units, "work plan computed");

    let tracker = ProgressTracker::new(id.clone(), Arc::clone(&inner.store), plan.total_units);
    let mut candidates = Vec::new();

    for strategy in &selected {
        let kind = strategy.kind();
        let slice = tracker.slice(plan.units_for(kind));
        let ctx = StrategyContext { domain: &request.domain, wordlist: &wordlist, progress: &slice, cancel: &cancel };
        match strategy.run(&ctx).await {
            Ok(found) => {
                tracing::debug!(scan = %id, strategy = kind.name(), found = found.len(), "strategy finished");
                candidates.extend(found);
            }
            Err(e) => tracing::warn!(scan = %id, strategy = kind.name(), error = %e, "strategy failed"),
        }
        // keep the denominator honest when a strategy stops early
        slice.finish();
    }

    let results = merge_candidates(candidates);
    tracing::info!(scan = %id, domain = %request.domain, found = results.len(), "Scan finished");

    let notification = match request.notify.as_ref().filter(|t| t.is_active()) {
        Some(target) => {
            let secs = inner.store.get(&id).map(|s| s.duration_secs()).unwrap_or(0);
            Some(inner.dispatcher.dispatch(target, &request.domain, &results, secs).await)
        }
        None => None,
    };

    let mut payload = Some((results, notification));
    inner.store.update(&id, &mut |state| {
        if let Some((results, notification)) = payload.take() {
            state.complete(results, notification);
        }
    });
}
