use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Which discovery techniques a scan runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    #[default]
    All,
    Dns,
    Brute,
    Cert,
    Search,
}

/// A single discovery technique. Declaration order is execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    Dns,
    Brute,
    Cert,
    Search,
}

impl StrategyKind {
    pub const ORDERED: [StrategyKind; 4] =
        [StrategyKind::Dns, StrategyKind::Brute, StrategyKind::Cert, StrategyKind::Search];

    pub fn name(&self) -> &'static str {
        match self {
            StrategyKind::Dns => "dns",
            StrategyKind::Brute => "brute",
            StrategyKind::Cert => "cert",
            StrategyKind::Search => "search",
        }
    }
}

impl Method {
    pub fn includes(&self, kind: StrategyKind) -> bool {
        match self {
            Method::All => true,
            Method::Dns => kind == StrategyKind::Dns,
            Method::Brute => kind == StrategyKind::Brute,
            Method::Cert => kind == StrategyKind::Cert,
            Method::Search => kind == StrategyKind::Search,
        }
    }
}

impl FromStr for Method {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "all" | "" => Ok(Method::All),
            "dns" => Ok(Method::Dns),
            "brute" => Ok(Method::Brute),
            "cert" => Ok(Method::Cert),
            "search" => Ok(Method::Search),
            other => Err(format!("unknown method '{}' (expected all, dns, brute, cert or search)", other)),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Method::All => "all",
            Method::Dns => "dns",
            Method::Brute => "brute",
            Method::Cert => "cert",
            Method::Search => "search",
        };
        f.write_str(s)
    }
}

/// Where to send the end-of-scan report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotifyTarget {
    #[serde(skip_serializing, default)]
    pub bot_token: String,
    pub chat_id: String,
    pub enabled: bool,
}

impl NotifyTarget {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self { bot_token: bot_token.into(), chat_id: chat_id.into(), enabled: true }
    }

    pub fn has_credentials(&self) -> bool {
        !self.bot_token.trim().is_empty() && !self.chat_id.trim().is_empty()
    }

    /// Enabled and fully configured.
    pub fn is_active(&self) -> bool {
        self.enabled && self.has_credentials()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    pub domain: String,
    pub method: Method,
    pub custom_wordlist: Vec<String>,
    pub notify: Option<NotifyTarget>,
}

impl ScanRequest {
    pub fn new(domain: impl Into<String>, method: Method) -> Self {
        Self { domain: domain.into(), method, custom_wordlist: Vec::new(), notify: None }
    }

    /// Custom words as submitted in a free-text field, one per line.
    pub fn with_custom_wordlist_text(mut self, text: &str) -> Self {
        self.custom_wordlist = text.trim().lines().map(|l| l.trim().to_string()).filter(|l| !l.is_empty()).collect();
        self
    }

    pub fn with_custom_wordlist(mut self, words: Vec<String>) -> Self {
        self.custom_wordlist = words;
        self
    }

    pub fn with_notify(mut self, target: NotifyTarget) -> Self {
        self.notify = Some(target);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScanStatus {
    Running,
    Completed,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationOutcome {
    pub success: bool,
    pub message: String,
}

impl NotificationOutcome {
    pub fn success(message: impl Into<String>) -> Self {
        Self { success: true, message: message.into() }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self { success: false, message: message.into() }
    }
}

/// Opaque scan identifier, `scan_` followed by random hex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScanId(String);

impl ScanId {
    pub fn generate() -> Self {
        let token: u64 = rand::thread_rng().gen();
        ScanId(format!("scan_{:016x}", token))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ScanId {
    fn from(s: &str) -> Self {
        ScanId(s.to_string())
    }
}

impl From<String> for ScanId {
    fn from(s: String) -> Self {
        ScanId(s)
    }
}

impl fmt::Display for ScanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Progress units for one scan, fixed at start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkPlan {
    pub total_units: usize,
    pub units: Vec<(StrategyKind, usize)>,
}

impl WorkPlan {
    pub fn from_units(units: impl IntoIterator<Item = (StrategyKind, usize)>) -> Self {
        let units: Vec<(StrategyKind, usize)> = units.into_iter().collect();
        let total_units = units.iter().map(|(_, n)| n).sum();
        Self { total_units, units }
    }

    pub fn units_for(&self, kind: StrategyKind) -> usize {
        self.units.iter().find(|(k, _)| *k == kind).map(|(_, n)| *n).unwrap_or(0)
    }
}

/// Rounded percentage of `completed` over `total`, clamped to 100.
pub fn percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = ((completed as f64 / total as f64) * 100.0).round();
    pct.clamp(0.0, 100.0) as u8
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanState {
    pub id: ScanId,
    pub request: ScanRequest,
    pub status: ScanStatus,
    pub progress: u8,
    pub completed_units: usize,
    pub total_units: usize,
    pub results: Vec<String>,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub notification: Option<NotificationOutcome>,
}

impl ScanState {
    /// A freshly started scan. `total_units` stays 0 until the plan is set.
    pub fn new(id: ScanId, request: ScanRequest) -> Self {
        Self {
            id,
            request,
            status: ScanStatus::Running,
            progress: 0,
            completed_units: 0,
            total_units: 0,
            results: Vec::new(),
            started_at: Utc::now(),
            completed_at: None,
            notification: None,
        }
    }

    pub fn set_plan(&mut self, plan: &WorkPlan) {
        self.total_units = plan.total_units;
    }

    pub fn is_finished(&self) -> bool {
        self.status != ScanStatus::Running
    }

    /// Record progress. Values lower than what is already stored are ignored.
    pub fn advance(&mut self, completed_units: usize) {
        if self.is_finished() || completed_units <= self.completed_units {
            return;
        }
        self.completed_units = completed_units.min(self.total_units);
        self.progress = self.progress.max(percent(self.completed_units, self.total_units));
    }

    /// Running -> Completed. Returns false if the scan was already finished.
    pub fn complete(&mut self, results: Vec<String>, notification: Option<NotificationOutcome>) -> bool {
        if self.is_finished() {
            return false;
        }
        self.results = results;
        self.notification = notification;
        self.completed_units = self.total_units;
        self.progress = 100;
        self.status = ScanStatus::Completed;
        self.completed_at = Some(Utc::now());
        true
    }

    /// Running -> Failed, for a scan task that died before completing.
    pub fn fail(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }
        self.status = ScanStatus::Failed;
        self.completed_at = Some(Utc::now());
        true
    }

    /// Whole seconds between start and completion (or now, while running).
    pub fn duration_secs(&self) -> i64 {
        let end = self.completed_at.unwrap_or_else(Utc::now);
        (end - self.started_at).num_seconds().max(0)
    }
}
