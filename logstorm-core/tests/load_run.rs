use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use logstorm_core::runner::{
    LoadConfig, LoadController, OutcomeFn, ProgressUpdate, Report, RunStats, ThinkTime,
};
use logstorm_core::{ErrorKind, RequestOutcome, Scenario, ScenarioCatalog, UrlTemplate};
use logstorm_testserver::{TestServer, TestServerOptions};

fn catalog(scenarios: Vec<Scenario>) -> Arc<ScenarioCatalog> {
    Arc::new(
        ScenarioCatalog::new(scenarios).unwrap_or_else(|e| panic!("catalog should be valid: {e}")),
    )
}

fn config(server: &TestServer, users: u64, duration: Option<Duration>) -> LoadConfig {
    LoadConfig {
        base_url: server.base_url().to_string(),
        users,
        duration,
        think_time: ThinkTime::none(),
        request_timeout: Duration::from_secs(2),
        probe_timeout: Duration::from_secs(1),
        seed: Some(42),
        ..LoadConfig::default()
    }
}

async fn run(cfg: LoadConfig, catalog: Arc<ScenarioCatalog>) -> RunStats {
    LoadController::new(cfg, catalog)
        .unwrap_or_else(|e| panic!("controller should accept config: {e}"))
        .run()
        .await
        .unwrap_or_else(|e| panic!("run should succeed: {e}"))
}

fn assert_consistent(stats: &RunStats) {
    assert_eq!(stats.total_requests, stats.success_count + stats.error_count);
    assert_eq!(stats.response_times.len() as u64, stats.success_count);
    assert_eq!(stats.status_code_counts.values().sum::<u64>(), stats.success_count);
    assert_eq!(stats.error_kind_counts.values().sum::<u64>(), stats.error_count);
    assert_eq!(stats.scenario_counts.values().sum::<u64>(), stats.total_requests);
}

#[tokio::test]
async fn http_error_statuses_count_as_success() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));

    let scenarios = catalog(vec![
        Scenario::get("server_error", UrlTemplate::fixed("/error/500"), 1.0),
        Scenario::get("not_found", UrlTemplate::fixed("/error/404"), 1.0),
    ]);
    let stats = run(
        config(&server, 2, Some(Duration::from_millis(500))),
        scenarios,
    )
    .await;

    assert!(stats.total_requests > 0);
    assert_eq!(stats.error_count, 0);
    assert_eq!(stats.success_count, stats.total_requests);
    assert!(
        stats
            .status_code_counts
            .keys()
            .all(|code| matches!(*code, 404 | 500))
    );
    assert_consistent(&stats);

    server.shutdown().await;
}

#[tokio::test]
async fn server_errors_only_are_all_successes() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));

    let scenarios = catalog(vec![Scenario::get(
        "server_error",
        UrlTemplate::fixed("/error/500"),
        1.0,
    )]);
    let stats = run(
        config(&server, 2, Some(Duration::from_millis(500))),
        scenarios,
    )
    .await;

    let n = stats.total_requests;
    assert!(n > 0);
    assert_eq!(stats.status_code_counts.get(&500).copied(), Some(n));
    assert_eq!(stats.status_code_counts.len(), 1);
    assert_eq!(stats.success_count, n);
    assert_eq!(stats.error_count, 0);
    assert!(stats.error_kind_counts.is_empty());
    assert_consistent(&stats);

    server.shutdown().await;
}

#[tokio::test]
async fn panicking_user_does_not_stop_siblings() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));

    let seen = Arc::new(AtomicU64::new(0));
    let counter = seen.clone();
    let on_outcome: OutcomeFn = Arc::new(move |_: &RequestOutcome| {
        if counter.fetch_add(1, Ordering::SeqCst) == 0 {
            panic!("outcome callback failure");
        }
    });

    let stats = LoadController::new(
        config(&server, 3, Some(Duration::from_millis(500))),
        catalog(vec![Scenario::get("home", UrlTemplate::fixed("/"), 1.0)]),
    )
    .unwrap_or_else(|e| panic!("controller should accept config: {e}"))
    .with_outcome_fn(on_outcome)
    .run()
    .await
    .unwrap_or_else(|e| panic!("a panicking user should not fail the run: {e}"));

    // The panicking user's single outcome is lost; every other one is recorded.
    let callbacks = seen.load(Ordering::SeqCst);
    assert!(callbacks > 3, "siblings should keep running, saw {callbacks}");
    assert_eq!(stats.total_requests, callbacks - 1);
    assert_consistent(&stats);

    server.shutdown().await;
}

#[tokio::test]
async fn timeouts_are_errors_without_latency() {
    let server = TestServer::start_with(TestServerOptions {
        slow_delay: Duration::from_secs(1),
    })
    .await
    .unwrap_or_else(|e| panic!("start test server: {e}"));

    let mut cfg = config(&server, 2, Some(Duration::from_millis(300)));
    cfg.request_timeout = Duration::from_millis(100);

    let stats = run(
        cfg,
        catalog(vec![Scenario::get(
            "slow",
            UrlTemplate::fixed("/error/timeout"),
            1.0,
        )]),
    )
    .await;

    assert!(stats.total_requests > 0);
    assert_eq!(stats.error_count, stats.total_requests);
    assert!(stats.response_times.is_empty());
    assert!(stats.status_code_counts.is_empty());
    assert_eq!(
        stats.error_kind_counts.get(&ErrorKind::Timeout).copied(),
        Some(stats.total_requests)
    );
    assert_consistent(&stats);

    let report = Report::from_stats(&stats);
    assert!(report.latency.is_none());
    assert_eq!(report.error_pct, 100.0);

    server.shutdown().await;
}

#[tokio::test]
async fn unreachable_target_is_reported() {
    let cfg = LoadConfig {
        base_url: "http://127.0.0.1:9".to_string(),
        users: 2,
        probe_timeout: Duration::from_millis(500),
        ..LoadConfig::default()
    };
    let res = LoadController::new(cfg, Arc::new(ScenarioCatalog::demo()))
        .unwrap_or_else(|e| panic!("controller should accept config: {e}"))
        .run()
        .await;

    match res {
        Err(err) => assert!(err.is_unreachable(), "unexpected error: {err}"),
        Ok(_) => panic!("expected an unreachable target error"),
    }
}

#[tokio::test]
async fn stop_signal_quiesces_all_users() {
    let server = TestServer::start_with(TestServerOptions {
        slow_delay: Duration::from_millis(200),
    })
    .await
    .unwrap_or_else(|e| panic!("start test server: {e}"));

    let mut cfg = config(&server, 5, None);
    cfg.think_time = ThinkTime::new(Duration::from_millis(100), Duration::from_millis(100))
        .unwrap_or_else(|e| panic!("think time: {e}"));
    cfg.request_timeout = Duration::from_secs(1);

    let controller = Arc::new(
        LoadController::new(cfg, Arc::new(ScenarioCatalog::demo()))
            .unwrap_or_else(|e| panic!("controller should accept config: {e}")),
    );
    let signal = controller.signal();

    let runner = controller.clone();
    let handle = tokio::spawn(async move { runner.run().await });

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(signal.stop());
    assert!(!controller.stop());

    let stats = tokio::time::timeout(Duration::from_secs(3), handle)
        .await
        .unwrap_or_else(|_| panic!("users did not stop within one request timeout"))
        .unwrap_or_else(|e| panic!("run task failed: {e}"))
        .unwrap_or_else(|e| panic!("run should succeed: {e}"));

    assert!(stats.total_requests >= 5);
    assert_consistent(&stats);
    assert!(server.stats().requests_total() >= stats.total_requests);

    // No user outlives the run, so the server sees nothing new afterwards.
    let seen = server.stats().requests_total();
    tokio::time::sleep(Duration::from_millis(300)).await;
    assert_eq!(server.stats().requests_total(), seen);

    server.shutdown().await;
}

#[tokio::test]
async fn requests_carry_client_headers() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));

    let stats = run(
        config(&server, 1, Some(Duration::from_millis(300))),
        catalog(vec![Scenario::post(
            "create_order",
            UrlTemplate::fixed("/api/order"),
            1.0,
        )]),
    )
    .await;

    assert!(stats.total_requests > 0);
    assert_eq!(stats.status_code_counts.get(&201).copied(), Some(stats.total_requests));

    let seen = server.stats();
    assert_eq!(seen.saw_json_content_type(), stats.total_requests);
    assert!(seen.saw_user_agent() >= stats.total_requests);
    assert!(seen.saw_accept_language() >= stats.total_requests);

    server.shutdown().await;
}

#[tokio::test]
async fn progress_ticks_while_running() {
    let server = TestServer::start()
        .await
        .unwrap_or_else(|e| panic!("start test server: {e}"));

    let mut cfg = config(&server, 2, Some(Duration::from_millis(1200)));
    cfg.progress_interval = Duration::from_millis(200);

    let ticks = Arc::new(AtomicU64::new(0));
    let last_total = Arc::new(AtomicU64::new(0));
    let outcomes = Arc::new(AtomicU64::new(0));

    let stats = {
        let ticks = ticks.clone();
        let last_total = last_total.clone();
        let outcomes = outcomes.clone();
        LoadController::new(
            cfg,
            catalog(vec![Scenario::get("home", UrlTemplate::fixed("/"), 1.0)]),
        )
        .unwrap_or_else(|e| panic!("controller should accept config: {e}"))
        .with_progress(Arc::new(move |update: ProgressUpdate| {
            ticks.fetch_add(1, Ordering::Relaxed);
            last_total.store(update.requests_total, Ordering::Relaxed);
            assert_eq!(
                update.requests_total,
                update.success_total + update.errors_total
            );
        }))
        .with_outcome_fn(Arc::new(move |_: &RequestOutcome| {
            outcomes.fetch_add(1, Ordering::Relaxed);
        }))
        .run()
        .await
        .unwrap_or_else(|e| panic!("run should succeed: {e}"))
    };

    assert!(ticks.load(Ordering::Relaxed) >= 3);
    assert!(last_total.load(Ordering::Relaxed) <= stats.total_requests);
    assert_eq!(outcomes.load(Ordering::Relaxed), stats.total_requests);

    server.shutdown().await;
}
