//! In-process stub backend for client integration tests.

#![allow(dead_code)]

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;

/// Requests the stub recorded, for assertions.
#[derive(Debug, Default)]
pub struct Recorded {
    /// Query strings received by `GET /api/cases`.
    pub case_queries: Vec<HashMap<String, String>>,
    /// `(Idempotency-Key, body)` per alert submission.
    pub alerts: Vec<(Option<String>, Value)>,
    /// Bodies received by `POST /api/replay`.
    pub replays: Vec<Value>,
}

pub type Shared = Arc<Mutex<Recorded>>;

/// A running stub backend.
pub struct StubBackend {
    pub base_url: String,
    pub recorded: Shared,
}

fn cases() -> Vec<Value> {
    vec![
        json!({"case_id": "c-1", "created_at": "2024-05-01T10:15:00+00:00", "severity": 91,
               "decision": "ESCALATE", "queue": "tier2", "summary": "Impossible travel for alice"}),
        json!({"case_id": "c-2", "created_at": "2024-05-01T10:40:00+00:00", "severity": "55",
               "decision": "CREATE_TICKET", "queue": "soc", "summary": "Brute force on web-01"}),
        json!({"case_id": "c-3", "created_at": "2024-05-01T12:01:00+00:00", "severity": 12,
               "decision": "AUTO_CLOSE", "queue": "soc", "summary": "Known scanner 198.51.100.4"}),
        json!({"case_id": "c-4", "created_at": "2024-05-01T12:30:00+00:00", "severity": 80,
               "decision": "ESCALATE", "queue": "tier2", "summary": "Beacon to evil.test"}),
    ]
}

async fn readyz() -> Json<Value> {
    Json(json!({"status": "ok", "db": "ok"}))
}

async fn overview() -> Json<Value> {
    Json(json!({
        "window": "24h",
        "stats": {"ingested": 40, "deduped": "12", "auto_closed": 1, "tickets": 3, "errors": null}
    }))
}

async fn list_cases(
    State(recorded): State<Shared>,
    Query(params): Query<HashMap<String, String>>,
) -> Json<Value> {
    let decision = params.get("decision").cloned();
    let q = params.get("q").map(|q| q.to_lowercase());
    if let Ok(mut r) = recorded.lock() {
        r.case_queries.push(params);
    }

    let items: Vec<Value> = cases()
        .into_iter()
        .filter(|c| decision.as_deref().map_or(true, |d| c["decision"] == d))
        .filter(|c| {
            q.as_deref().map_or(true, |q| {
                c["summary"].as_str().unwrap_or_default().to_lowercase().contains(q)
            })
        })
        .collect();
    Json(json!({ "items": items }))
}

async fn case_detail(Path(case_id): Path<String>) -> Json<Value> {
    if case_id != "c-1" {
        // The route rebuilds the body from an empty detail for unknown ids.
        return Json(json!({
            "case": {}, "timeline": [], "graph": null, "ticket": null,
            "enrichments": {}, "scoring": {}, "routing": {}, "recommended_actions": []
        }));
    }
    Json(json!({
        "case": {"case_id": "c-1", "created_at": "2024-05-01T10:15:00+00:00",
                 "decision": "ESCALATE", "queue": "tier2", "severity": 91,
                 "summary": "Impossible travel for alice"},
        "graph": {
            "nodes": [
                {"entity_type": "user", "entity_value": "alice"},
                {"entity_type": "src_ip", "entity_value": "203.0.113.7"},
                {"entity_type": "user", "entity_value": "alice"}
            ],
            "edges": [
                {"src_type": "user", "src_value": "alice", "dst_type": "src_ip",
                 "dst_value": "203.0.113.7", "edge_type": "seen_from"},
                {"src_type": "user", "src_value": "alice", "dst_type": "host",
                 "dst_value": "laptop-9", "edge_type": "logged_into"}
            ]
        },
        "enrichments": {"ip_reputation": {"203.0.113.7": {"verdict": "bad"}}},
        "scoring": {"severity": 91, "confidence": "0.83", "contributions": [
            {"name": "signal.ip_rep.bad", "weight": 30, "value": 1, "points": 30, "reason": "bad ip"}
        ]},
        "recommended_actions": [
            {"title": "Isolate host", "playbook": "/playbooks/actions/isolate_host.md", "params": {}}
        ],
        "timeline": [
            {"event_id": "e-1", "created_at": "2024-05-01T10:15:00+00:00", "stage": "ingested", "payload": {}},
            {"event_id": "e-2", "created_at": "2024-05-01T10:15:01+00:00", "stage": "decided", "payload": {}}
        ]
    }))
}

async fn list_experiments() -> Json<Value> {
    Json(json!({"items": [
        {"experiment_id": "exp-2222-bbbb", "created_at": "2024-05-02T09:00:00+00:00",
         "since": "2024-05-02T08:00:00+00:00", "until": "2024-05-02T09:00:00+00:00"},
        {"experiment_id": "exp-1111-aaaa", "created_at": "2024-05-01T09:00:00+00:00",
         "since": "2024-05-01T08:00:00+00:00", "until": "2024-05-01T09:00:00+00:00"}
    ]}))
}

async fn experiment(Path(id): Path<String>) -> Json<Value> {
    if id != "exp-1111-aaaa" {
        return Json(json!({"experiment_id": id, "missing": true}));
    }
    Json(json!({
        "experiment": {"experiment_id": id, "created_at": "2024-05-01T09:00:00+00:00",
                       "since": "2024-05-01T08:00:00+00:00", "until": "2024-05-01T09:00:00+00:00"},
        "before": {"total_cases": 10, "tickets": 6, "auto_close": 4, "auto_close_rate_pct": 40.0},
        "after": {"total_cases": 10, "tickets": 3, "auto_close": 7, "auto_close_rate_pct": 70.0},
        "details": {}
    }))
}

async fn replay(State(recorded): State<Shared>, Json(body): Json<Value>) -> impl IntoResponse {
    if let Ok(mut r) = recorded.lock() {
        r.replays.push(body);
    }
    Json(json!({"experiment_id": "exp-new"}))
}

async fn config() -> Json<Value> {
    Json(json!({"version": "1", "dedup_window_seconds": 600, "enabled_enrichers": ["ip_reputation"]}))
}

async fn playbook(Path(file): Path<String>) -> impl IntoResponse {
    match file.as_str() {
        "isolate_host.md" => (
            StatusCode::OK,
            "# Isolate Host\n\nCut the host off from the network.\n".to_string(),
        ),
        _ => (
            StatusCode::NOT_FOUND,
            json!({"detail": "Not Found"}).to_string(),
        ),
    }
}

async fn ingest(
    State(recorded): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> impl IntoResponse {
    if !body.is_object() {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"detail": "alert payload must be an object"})),
        );
    }
    let key = headers
        .get("idempotency-key")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    let count = match recorded.lock() {
        Ok(mut r) => {
            r.alerts.push((key, body));
            r.alerts.len()
        }
        Err(_) => 0,
    };
    (
        StatusCode::ACCEPTED,
        Json(json!({"ingest_id": format!("ing-{}", count), "status": "accepted"})),
    )
}

async fn html() -> &'static str {
    "<html>upstream error</html>"
}

async fn empty() -> StatusCode {
    StatusCode::OK
}

async fn teapot() -> impl IntoResponse {
    (StatusCode::IM_A_TEAPOT, Json(json!({"detail": {"code": "teapot"}})))
}

async fn bare_error() -> StatusCode {
    StatusCode::SERVICE_UNAVAILABLE
}

async fn slow() -> Json<Value> {
    tokio::time::sleep(Duration::from_secs(2)).await;
    Json(json!({}))
}

/// Starts the stub on an ephemeral port.
pub async fn spawn_stub() -> StubBackend {
    let recorded: Shared = Arc::new(Mutex::new(Recorded::default()));

    let app = Router::new()
        .route("/readyz", get(readyz))
        .route("/api/overview", get(overview))
        .route("/api/cases", get(list_cases))
        .route("/api/cases/:case_id", get(case_detail))
        .route("/api/experiments", get(list_experiments))
        .route("/api/experiments/:id", get(experiment))
        .route("/api/replay", post(replay))
        .route("/api/config", get(config))
        .route("/playbooks/actions/:file", get(playbook))
        .route("/webhook/alerts", post(ingest))
        .route("/test/html", get(html))
        .route("/test/empty", get(empty))
        .route("/test/teapot", get(teapot))
        .route("/test/unavailable", get(bare_error))
        .route("/test/slow", get(slow))
        .with_state(recorded.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind stub backend");
    let addr = listener.local_addr().expect("Stub backend has no address");

    tokio::spawn(async move {
        axum::serve(listener, app).await.ok();
    });

    StubBackend {
        base_url: format!("http://{}", addr),
        recorded,
    }
}

/// An address nothing listens on.
pub async fn closed_address() -> String {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind probe listener");
    let addr = listener.local_addr().expect("Probe listener has no address");
    drop(listener);
    format!("http://{}", addr)
}
