//! Contract tests against a real backend.
//!
//! Run with `TRIAGE_CONSOLE_API_URL=http://localhost:8000 cargo test -- --ignored`.

use std::time::Duration;
use tc_client::{ApiClient, Console};
use tc_core::{AlertPayload, CaseFilter, Decision};

fn backend() -> Console<ApiClient> {
    let url = std::env::var("TRIAGE_CONSOLE_API_URL")
        .unwrap_or_else(|_| "http://localhost:8000".to_string());
    Console::new(ApiClient::new(&url, Duration::from_secs(10)).expect("Failed to build client"))
}

#[tokio::test]
#[ignore = "requires a running backend"]
async fn test_backend_is_ready() {
    assert!(backend().ready().await.expect("readiness probe failed"));
}

#[tokio::test]
#[ignore = "requires a running backend"]
async fn test_duplicate_alerts_yield_one_case() {
    let console = backend();
    let marker = unique_marker();
    let alert: AlertPayload = serde_json::from_value(serde_json::json!({
        "vendor": "generic",
        "time": chrono::Utc::now().to_rfc3339(),
        "rule": "contract_duplicate",
        "severity": "high",
        "src_ip": "203.0.113.77",
        "user": marker,
        "host": "contract-host",
        "title": "Contract duplicate check"
    }))
    .expect("valid alert");

    console
        .submit_alert(&alert, Some(&format!("{}-1", marker)))
        .await
        .expect("first submission");
    console
        .submit_alert(&alert, Some(&format!("{}-2", marker)))
        .await
        .expect("second submission");

    // The worker processes asynchronously; poll for the case.
    let filter = CaseFilter {
        query: marker.clone(),
        ..Default::default()
    };
    let mut rows = 0;
    for _ in 0..30 {
        rows = console.cases(&filter).await.count();
        if rows > 0 {
            tokio::time::sleep(Duration::from_secs(1)).await;
            rows = console.cases(&filter).await.count();
            break;
        }
        tokio::time::sleep(Duration::from_millis(500)).await;
    }
    assert_eq!(rows, 1);
}

#[tokio::test]
#[ignore = "requires a running backend"]
async fn test_decision_filter_on_backend() {
    let view = backend()
        .cases(&CaseFilter::with_decision(Decision::Escalate))
        .await;
    assert!(view.error.is_none(), "{:?}", view.error);
    assert!(view.rows.iter().all(|r| r.decision == Decision::Escalate));
}

#[tokio::test]
#[ignore = "requires a running backend"]
async fn test_unknown_case_on_backend() {
    let err = backend()
        .case_detail("00000000-0000-0000-0000-000000000000")
        .await
        .unwrap_err();
    assert!(err.is_not_found());
    assert!(!err.to_string().is_empty());
}

#[tokio::test]
#[ignore = "requires a running backend"]
async fn test_isolate_host_playbook_on_backend() {
    let text = backend().playbook("isolate_host").await.expect("playbook");
    assert!(text.contains("Isolate Host"));
}

fn unique_marker() -> String {
    format!(
        "contract-{}",
        chrono::Utc::now().timestamp_nanos_opt().unwrap_or_default()
    )
}
