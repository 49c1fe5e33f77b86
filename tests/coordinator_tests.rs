mod common;

use common::{fast_offline_config, record, serve_canned, FakeResolver, RecordingNotifier};
use std::sync::Arc;
use std::time::Duration;

use sub_hunter::discover::wordlist::DEFAULT_WORDLIST;
use sub_hunter::probe::RecordKind;
use sub_hunter::scan::{MemoryScanStore, ScanStore};
use sub_hunter::{Method, NotifyTarget, ScanCoordinator, ScanError, ScanId, ScanRequest, ScanStatus};

const POLL: Duration = Duration::from_millis(5);

fn coordinator_with(resolver: FakeResolver) -> ScanCoordinator {
    ScanCoordinator::builder(fast_offline_config()).resolver(Arc::new(resolver)).build()
}

#[tokio::test]
async fn dns_scan_completes_with_six_units() {
    let mut resolver = FakeResolver::default();
    resolver.records.insert(RecordKind::Mx, vec![record("example.com", Some("mail.example.com"))]);
    resolver.records.insert(RecordKind::Ns, vec![record("example.com", Some("ns1.provider.net"))]);
    resolver.records.insert(RecordKind::Cname, vec![record("www.example.com", Some("lb.example.com"))]);
    let coordinator = coordinator_with(resolver);

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Dns)).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.status, ScanStatus::Completed);
    assert_eq!(state.total_units, 6);
    assert_eq!(state.completed_units, 6);
    assert_eq!(state.progress, 100);
    assert_eq!(state.results, vec!["lb.example.com", "mail.example.com", "www.example.com"]);
    assert!(state.completed_at.is_some());
    assert!(state.notification.is_none());
}

#[tokio::test]
async fn failing_record_types_still_count_as_work() {
    let mut resolver = FakeResolver::default();
    resolver.failing = vec![RecordKind::Txt, RecordKind::Aaaa];
    let coordinator = coordinator_with(resolver);

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Dns)).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.status, ScanStatus::Completed);
    assert_eq!(state.completed_units, 6);
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn brute_force_reports_only_resolving_names() {
    let coordinator = coordinator_with(FakeResolver::with_hosts(&["www.example.com"]));

    let request = ScanRequest::new("Example.COM", Method::Brute).with_custom_wordlist_text("zzz-custom\n");
    let id = coordinator.start_scan(request).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.request.domain, "example.com");
    assert_eq!(state.results, vec!["www.example.com"]);
    assert_eq!(state.total_units, DEFAULT_WORDLIST.len() + 1);
    assert_eq!(state.completed_units, state.total_units);
}

#[tokio::test]
async fn all_methods_offline_still_reach_completion() {
    let resolver = FakeResolver::with_hosts(&["api.example.com", "www.example.com"]);
    let coordinator = coordinator_with(resolver);

    let id = coordinator.start_scan(ScanRequest::new("https://example.com/", Method::All)).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    // dns + words + cert + three engines
    assert_eq!(state.total_units, 6 + DEFAULT_WORDLIST.len() + 1 + 3);
    assert_eq!(state.progress, 100);
    assert_eq!(state.status, ScanStatus::Completed);
    assert_eq!(state.results, vec!["api.example.com", "www.example.com"]);
}

#[tokio::test]
async fn cert_scan_with_garbage_body_finishes_empty() {
    let addr = serve_canned(200, "text/html", "<html>rate limited</html>").await;
    let mut config = fast_offline_config();
    config.offline = false;
    config.crtsh_url = format!("http://{}/", addr);
    let coordinator = ScanCoordinator::builder(config).resolver(Arc::new(FakeResolver::default())).build();

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Cert)).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.status, ScanStatus::Completed);
    assert_eq!(state.total_units, 1);
    assert_eq!(state.progress, 100);
    assert!(state.results.is_empty());
}

#[tokio::test]
async fn cert_scan_collects_names_from_crtsh() {
    let body = r#"[{"name_value":"www.example.com\napi.example.com"},{"name_value":"WWW.example.com"},{"name_value":"example.com"}]"#;
    let addr = serve_canned(200, "application/json", body).await;
    let mut config = fast_offline_config();
    config.offline = false;
    config.crtsh_url = format!("http://{}/", addr);
    let coordinator = ScanCoordinator::builder(config).resolver(Arc::new(FakeResolver::default())).build();

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Cert)).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.results, vec!["api.example.com", "www.example.com"]);
}

#[tokio::test]
async fn empty_domain_is_rejected_without_creating_state() {
    let store = Arc::new(MemoryScanStore::new());
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(FakeResolver::default()))
        .store(store.clone())
        .build();

    for domain in ["", "   ", "https://"] {
        let err = coordinator.start_scan(ScanRequest::new(domain, Method::All)).unwrap_err();
        assert_eq!(err, ScanError::DomainRequired);
    }
    assert!(store.is_empty());
}

#[tokio::test]
async fn unknown_scan_id_is_not_found() {
    let coordinator = coordinator_with(FakeResolver::default());
    let id = ScanId::from("scan_does_not_exist");

    assert!(matches!(coordinator.get_progress(&id), Err(ScanError::NotFound(_))));
    assert!(matches!(coordinator.get_results(&id), Err(ScanError::NotFound(_))));
    assert!(matches!(coordinator.cancel(&id), Err(ScanError::NotFound(_))));
}

#[tokio::test]
async fn start_returns_before_work_is_done() {
    let mut resolver = FakeResolver::with_hosts(&["www.example.com"]);
    resolver.delay = Some(Duration::from_millis(20));
    let coordinator = coordinator_with(resolver);

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Brute)).unwrap();
    let state = coordinator.get_progress(&id).unwrap();

    assert_eq!(state.status, ScanStatus::Running);
    assert!(state.progress < 100);
    assert!(state.results.is_empty());
    coordinator.cancel(&id).unwrap();
    coordinator.wait(&id, POLL).await.unwrap();
}

#[tokio::test]
async fn progress_never_decreases() {
    let mut resolver = FakeResolver::with_hosts(&["www.example.com"]);
    resolver.delay = Some(Duration::from_millis(1));
    let coordinator = coordinator_with(resolver);

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::All)).unwrap();
    let mut seen = Vec::new();
    loop {
        let state = coordinator.get_progress(&id).unwrap();
        seen.push(state.progress);
        if state.is_finished() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(2)).await;
    }

    assert!(seen.windows(2).all(|w| w[0] <= w[1]), "progress went backwards: {:?}", seen);
    assert_eq!(seen.last(), Some(&100));
}

#[tokio::test]
async fn cancelled_scan_completes_with_partial_results() {
    let mut resolver = FakeResolver::with_hosts(&["www.example.com"]);
    resolver.delay = Some(Duration::from_millis(40));
    let coordinator = coordinator_with(resolver);

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Brute)).unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(coordinator.cancel(&id).unwrap());

    let state = tokio::time::timeout(Duration::from_secs(5), coordinator.wait(&id, POLL)).await.unwrap().unwrap();
    assert_eq!(state.status, ScanStatus::Completed);
    assert_eq!(state.progress, 100);

    // finished scans can no longer be cancelled
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(!coordinator.cancel(&id).unwrap());
}

#[tokio::test]
async fn active_notify_target_receives_report() {
    let hosts: Vec<String> = DEFAULT_WORDLIST.iter().take(25).map(|w| format!("{}.example.com", w)).collect();
    let host_refs: Vec<&str> = hosts.iter().map(String::as_str).collect();
    let notifier = Arc::new(RecordingNotifier::default());
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(FakeResolver::with_hosts(&host_refs)))
        .notifier(notifier.clone())
        .build();

    let request = ScanRequest::new("example.com", Method::Brute).with_notify(NotifyTarget::new("123:abc", "42"));
    let id = coordinator.start_scan(request).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.results.len(), 25);
    let outcome = state.notification.expect("notification outcome recorded");
    assert!(outcome.success);

    let sent = notifier.sent.lock();
    assert_eq!(sent.len(), 1);
    let (target, message) = &sent[0];
    assert_eq!(target.chat_id, "42");
    assert!(message.contains("example.com"));
    assert!(message.contains("25"));
    assert!(message.contains("... and 5 more"));
}

#[tokio::test]
async fn notification_failure_does_not_fail_scan() {
    let notifier = Arc::new(RecordingNotifier { fail: true, ..Default::default() });
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(FakeResolver::default()))
        .notifier(notifier.clone())
        .build();

    let request = ScanRequest::new("example.com", Method::Dns).with_notify(NotifyTarget::new("t", "c"));
    let id = coordinator.start_scan(request).unwrap();
    let state = coordinator.wait(&id, POLL).await.unwrap();

    assert_eq!(state.status, ScanStatus::Completed);
    let outcome = state.notification.unwrap();
    assert!(!outcome.success);
    assert!(outcome.message.starts_with("Failed to send notification"));
}

#[tokio::test]
async fn disabled_or_incomplete_notify_target_is_skipped() {
    let notifier = Arc::new(RecordingNotifier::default());
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(FakeResolver::default()))
        .notifier(notifier.clone())
        .build();

    let mut disabled = NotifyTarget::new("t", "c");
    disabled.enabled = false;
    for target in [disabled, NotifyTarget::new("", "c")] {
        let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Dns).with_notify(target)).unwrap();
        let state = coordinator.wait(&id, POLL).await.unwrap();
        assert!(state.notification.is_none());
    }
    assert!(notifier.sent.lock().is_empty());
}

#[tokio::test]
async fn test_notification_requires_credentials() {
    let notifier = Arc::new(RecordingNotifier::default());
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(FakeResolver::default()))
        .notifier(notifier.clone())
        .build();

    let err = coordinator.test_notification(&NotifyTarget::new("", "42")).await.unwrap_err();
    assert_eq!(err, ScanError::MissingNotifyCredentials);

    let outcome = coordinator.test_notification(&NotifyTarget::new("123:abc", "42")).await.unwrap();
    assert!(outcome.success);
    assert!(notifier.sent.lock()[0].1.contains("Test Notification"));
}

#[tokio::test]
async fn shared_store_sees_scan_states() {
    let store = Arc::new(MemoryScanStore::new());
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(FakeResolver::default()))
        .store(store.clone())
        .build();

    let a = coordinator.start_scan(ScanRequest::new("a.test", Method::Dns)).unwrap();
    let b = coordinator.start_scan(ScanRequest::new("b.test", Method::Dns)).unwrap();
    assert_ne!(a, b);
    coordinator.wait(&a, POLL).await.unwrap();
    coordinator.wait(&b, POLL).await.unwrap();

    assert_eq!(store.len(), 2);
    assert_eq!(store.get(&a).unwrap().request.domain, "a.test");
}

#[tokio::test]
async fn finished_scans_can_be_removed() {
    let store = Arc::new(MemoryScanStore::new());
    let mut resolver = FakeResolver::with_hosts(&["www.example.com"]);
    resolver.delay = Some(Duration::from_millis(20));
    let coordinator = ScanCoordinator::builder(fast_offline_config())
        .resolver(Arc::new(resolver))
        .store(store.clone())
        .build();

    let id = coordinator.start_scan(ScanRequest::new("example.com", Method::Brute)).unwrap();
    assert!(!coordinator.remove(&id).unwrap());
    assert_eq!(store.len(), 1);

    coordinator.cancel(&id).unwrap();
    coordinator.wait(&id, POLL).await.unwrap();
    assert!(coordinator.remove(&id).unwrap());
    assert!(store.is_empty());
    assert!(matches!(coordinator.get_progress(&id), Err(ScanError::NotFound(_))));
    assert!(matches!(coordinator.remove(&id), Err(ScanError::NotFound(_))));
}
