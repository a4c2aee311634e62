//! Console views over HTTP against the stub backend.

mod common;

use common::{closed_address, spawn_stub};
use serde_json::json;
use tc_client::{ApiClient, Console, ConsoleError, ViewScope, DEFAULT_TIMEOUT};
use tc_core::{AlertPayload, CaseFilter, Decision, EntityKind, ReplayRequest};

fn console(base_url: &str) -> Console<ApiClient> {
    Console::new(ApiClient::new(base_url, DEFAULT_TIMEOUT).unwrap())
}

#[tokio::test]
async fn test_ready() {
    let stub = spawn_stub().await;
    assert!(console(&stub.base_url).ready().await.unwrap());
}

#[tokio::test]
async fn test_ready_when_backend_is_down() {
    let err = console(&closed_address().await).ready().await.unwrap_err();
    assert!(matches!(err, ConsoleError::Gateway(_)));
}

#[tokio::test]
async fn test_overview_combines_rollup_and_cases() {
    let stub = spawn_stub().await;
    let overview = console(&stub.base_url).overview().await.unwrap();

    assert_eq!(overview.stats.ingested, 40);
    assert_eq!(overview.stats.deduped, 12);
    // The rollup omits `cases`, so the list length is used.
    assert_eq!(overview.stats.cases, 4);
    assert_eq!(overview.stats.errors, 0);
    assert_eq!(overview.stats.escalations, 2);

    let keys: Vec<&str> = overview.series.iter().map(|p| p.t.as_str()).collect();
    assert_eq!(keys, vec!["2024-05-01 10:00", "2024-05-01 12:00"]);
    assert_eq!(overview.series[0].v, 2);
}

#[tokio::test]
async fn test_decision_filter_returns_only_matching_rows() {
    let stub = spawn_stub().await;
    let view = console(&stub.base_url)
        .cases(&CaseFilter::with_decision(Decision::Escalate))
        .await;

    assert!(view.error.is_none());
    assert_eq!(view.count(), 2);
    assert!(view.rows.iter().all(|r| r.decision == Decision::Escalate));

    let recorded = stub.recorded.lock().unwrap();
    let query = recorded.case_queries.last().unwrap();
    assert_eq!(query.get("time_range").map(String::as_str), Some("24h"));
    assert_eq!(query.get("decision").map(String::as_str), Some("ESCALATE"));
    assert!(!query.contains_key("q"));
    assert!(!query.contains_key("severity_min"));
}

#[tokio::test]
async fn test_lenient_severity_in_rows() {
    let stub = spawn_stub().await;
    let view = console(&stub.base_url)
        .cases(&CaseFilter {
            query: "brute".to_string(),
            ..Default::default()
        })
        .await;
    assert_eq!(view.count(), 1);
    assert_eq!(view.rows[0].severity, 55);
}

#[tokio::test]
async fn test_case_list_failure_is_empty_with_message() {
    let view = console(&closed_address().await)
        .cases(&CaseFilter::default())
        .await;
    assert_eq!(view.count(), 0);
    assert!(view.error.unwrap().starts_with("Connection failed"));
}

#[tokio::test]
async fn test_case_detail() {
    let stub = spawn_stub().await;
    let view = console(&stub.base_url).case_detail("c-1").await.unwrap();

    assert_eq!(view.decision_label(), "ESCALATE");
    assert_eq!(view.scoring.confidence_display(), "0.83");
    assert_eq!(view.scoring.contributions[0].points_display(), "30.0");
    assert_eq!(view.graph.nodes.len(), 2);
    assert_eq!(view.graph.merged_duplicates, 1);
    assert_eq!(view.graph.edges.len(), 2);
    assert_eq!(view.graph.dangling_edges().count(), 1);
    assert_eq!(view.graph.nodes[1].kind, EntityKind::Ip);
    assert_eq!(view.timeline[0].stage, "ingested");
    assert_eq!(
        view.recommended_actions[0].playbook_action(),
        Some("isolate_host")
    );
}

#[tokio::test]
async fn test_unknown_case_fails_with_message() {
    let stub = spawn_stub().await;
    let err = console(&stub.base_url)
        .case_detail("no-such-case")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert_eq!(err.to_string(), "case no-such-case not found");
}

#[tokio::test]
async fn test_case_id_is_percent_encoded() {
    let stub = spawn_stub().await;
    // A slash would route elsewhere if it were not encoded.
    let err = console(&stub.base_url)
        .case_detail("a/b")
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "case a/b not found");
}

#[tokio::test]
async fn test_experiments_and_comparison() {
    let stub = spawn_stub().await;
    let console = console(&stub.base_url);

    let list = console.experiments().await.unwrap();
    assert_eq!(list[0].short_id(), "exp-2222");

    let comparison = console.experiment("exp-1111-aaaa").await.unwrap();
    assert_eq!(comparison.tickets.reduction_pct, 50);
    assert_eq!(comparison.auto_close_rate.reduction_pct, 0);

    let err = console.experiment("exp-gone").await.unwrap_err();
    assert_eq!(err.to_string(), "experiment exp-gone not found");
}

#[tokio::test]
async fn test_replay_sends_window_and_overrides() {
    let stub = spawn_stub().await;
    let overrides = json!({"scoring": {"weights": {"signal.ip_rep.bad": 35}}});
    let request = ReplayRequest::last_minutes(chrono::Utc::now(), 60, overrides.clone());

    let started = console(&stub.base_url).start_replay(&request).await.unwrap();
    assert_eq!(started.experiment_id, "exp-new");

    let recorded = stub.recorded.lock().unwrap();
    let body = &recorded.replays[0];
    assert_eq!(body["config_overrides"], overrides);
    assert!(body["since"].as_str().is_some());
    assert!(body["until"].as_str().is_some());
}

#[tokio::test]
async fn test_playbook_text() {
    let stub = spawn_stub().await;
    let text = console(&stub.base_url)
        .playbook("isolate_host")
        .await
        .unwrap();
    assert!(text.contains("Isolate Host"));
}

#[tokio::test]
async fn test_submit_alert_sends_idempotency_key() {
    let stub = spawn_stub().await;
    let alert = AlertPayload {
        vendor: Some("generic".to_string()),
        rule: Some("impossible_travel".to_string()),
        src_ip: Some("203.0.113.7".to_string()),
        ..Default::default()
    };

    let accepted = console(&stub.base_url)
        .submit_alert(&alert, Some("key-123"))
        .await
        .unwrap();
    assert_eq!(accepted.status, "accepted");

    let recorded = stub.recorded.lock().unwrap();
    let (key, body) = &recorded.alerts[0];
    assert_eq!(key.as_deref(), Some("key-123"));
    assert_eq!(body["rule"], "impossible_travel");
    assert!(body.get("user").is_none());
}

#[tokio::test]
async fn test_scoped_view_discards_superseded_refresh() {
    let stub = spawn_stub().await;
    let console = console(&stub.base_url);
    let scope = ViewScope::new("cases");

    let everything = CaseFilter::default();
    let escalated = CaseFilter::with_decision(Decision::Escalate);
    let first = scope.guard(console.cases(&everything));
    let second = scope.guard(console.cases(&escalated));

    let (first, second) = tokio::join!(first, second);
    assert!(first.is_none());
    assert_eq!(second.unwrap().count(), 2);
}
