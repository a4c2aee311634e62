//! In-memory backend for tests and offline demos.

use crate::client::{validate_playbook_name, ConsoleApi};
use crate::gateway::{GatewayError, GatewayResult};
use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tc_core::{
    AlertPayload, CaseDetailPayload, CaseFilter, CaseListResponse, CaseRecord, CaseSummary,
    Decision, ExperimentDetail, ExperimentListResponse, ExperimentSummary, IngestAccepted,
    OverviewResponse, OverviewStats, ReplayRequest, ReplayStarted, ScoringBlock,
};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct MockState {
    ready: bool,
    stats: Option<OverviewStats>,
    cases: Vec<CaseSummary>,
    details: HashMap<String, CaseDetailPayload>,
    experiments: Vec<ExperimentSummary>,
    experiment_details: HashMap<String, ExperimentDetail>,
    playbooks: HashMap<String, String>,
    alerts: Vec<(String, AlertPayload)>,
    /// Calls made per endpoint name.
    calls: HashMap<&'static str, u64>,
    /// Endpoint name -> error returned instead of a payload.
    failures: HashMap<&'static str, GatewayError>,
}

/// Mock implementation of [`ConsoleApi`].
///
/// Cases are filtered the way the backend filters them. Unknown case ids
/// answer with an empty `case` block and unknown experiment ids with a
/// `missing` payload, as the backend does.
#[derive(Debug, Clone)]
pub struct MockConsoleApi {
    state: Arc<RwLock<MockState>>,
    counter: Arc<AtomicU64>,
}

impl Default for MockConsoleApi {
    fn default() -> Self {
        Self::new()
    }
}

impl MockConsoleApi {
    /// Creates a ready, empty backend.
    pub fn new() -> Self {
        Self {
            state: Arc::new(RwLock::new(MockState {
                ready: true,
                ..Default::default()
            })),
            counter: Arc::new(AtomicU64::new(1)),
        }
    }

    fn next_id(&self) -> u64 {
        self.counter.fetch_add(1, Ordering::SeqCst)
    }

    pub async fn set_ready(&self, ready: bool) {
        self.state.write().await.ready = ready;
    }

    pub async fn set_stats(&self, stats: Option<OverviewStats>) {
        self.state.write().await.stats = stats;
    }

    /// Adds a case to the list, with an optional detail payload.
    ///
    /// Without one, the detail carries only the case block from `summary`.
    pub async fn add_case(&self, summary: CaseSummary, detail: Option<CaseDetailPayload>) {
        let detail = detail.unwrap_or_else(|| CaseDetailPayload {
            case: Some(CaseRecord {
                case_id: summary.case_id.clone(),
                created_at: summary.created_at.clone(),
                decision: Some(summary.decision),
                queue: summary.queue.clone(),
                severity: summary.severity,
                summary: summary.summary.clone(),
            }),
            ..Default::default()
        });
        let mut state = self.state.write().await;
        state.details.insert(summary.case_id.clone(), detail);
        state.cases.push(summary);
    }

    pub async fn add_experiment(&self, summary: ExperimentSummary, detail: ExperimentDetail) {
        let mut state = self.state.write().await;
        state
            .experiment_details
            .insert(summary.experiment_id.clone(), detail);
        // Newest first, as the backend lists them.
        state.experiments.insert(0, summary);
    }

    pub async fn add_playbook(&self, name: &str, markdown: &str) {
        self.state
            .write()
            .await
            .playbooks
            .insert(name.to_string(), markdown.to_string());
    }

    /// Makes every call to `endpoint` fail with `error`.
    pub async fn fail(&self, endpoint: &'static str, error: GatewayError) {
        self.state.write().await.failures.insert(endpoint, error);
    }

    /// Number of calls made to `endpoint`.
    pub async fn calls(&self, endpoint: &str) -> u64 {
        self.state
            .read()
            .await
            .calls
            .get(endpoint)
            .copied()
            .unwrap_or(0)
    }

    /// Alerts received so far, with the idempotency key used for each.
    pub async fn alerts(&self) -> Vec<(String, AlertPayload)> {
        self.state.read().await.alerts.clone()
    }

    async fn enter(&self, endpoint: &'static str) -> GatewayResult<()> {
        let mut state = self.state.write().await;
        *state.calls.entry(endpoint).or_default() += 1;
        match state.failures.get(endpoint) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

fn matches_filter(case: &CaseSummary, filter: &CaseFilter) -> bool {
    if let Some(decision) = filter.decision.filter(|d| *d != Decision::Unknown) {
        if case.decision != decision {
            return false;
        }
    }
    if case.severity < filter.severity_min {
        return false;
    }
    if let Some(queue) = filter.queue.as_deref().filter(|q| !q.trim().is_empty()) {
        if case.queue != queue.trim() {
            return false;
        }
    }
    let query = filter.query.trim().to_lowercase();
    query.is_empty()
        || case.case_id.to_lowercase().contains(&query)
        || case.summary.to_lowercase().contains(&query)
}

/// The cases route's body for an id it does not know.
fn unknown_case_detail() -> CaseDetailPayload {
    CaseDetailPayload {
        case: Some(CaseRecord::default()),
        graph: None,
        enrichments: Some(json!({})),
        scoring: Some(ScoringBlock::default()),
        routing: Some(json!({})),
        ticket: None,
        recommended_actions: Some(Vec::new()),
        timeline: Some(Vec::new()),
        missing: false,
    }
}

#[async_trait]
impl ConsoleApi for MockConsoleApi {
    async fn ready(&self) -> GatewayResult<bool> {
        self.enter("ready").await?;
        Ok(self.state.read().await.ready)
    }

    async fn overview(&self) -> GatewayResult<OverviewResponse> {
        self.enter("overview").await?;
        Ok(OverviewResponse {
            window: Some("24h".to_string()),
            stats: self.state.read().await.stats.clone(),
        })
    }

    async fn list_cases(&self, filter: &CaseFilter) -> GatewayResult<CaseListResponse> {
        self.enter("list_cases").await?;
        let state = self.state.read().await;
        Ok(CaseListResponse {
            items: state
                .cases
                .iter()
                .filter(|c| matches_filter(c, filter))
                .cloned()
                .collect(),
        })
    }

    async fn case_detail(&self, case_id: &str) -> GatewayResult<CaseDetailPayload> {
        self.enter("case_detail").await?;
        let state = self.state.read().await;
        Ok(state
            .details
            .get(case_id)
            .cloned()
            .unwrap_or_else(unknown_case_detail))
    }

    async fn list_experiments(&self) -> GatewayResult<ExperimentListResponse> {
        self.enter("list_experiments").await?;
        Ok(ExperimentListResponse {
            items: self.state.read().await.experiments.clone(),
        })
    }

    async fn experiment(&self, experiment_id: &str) -> GatewayResult<ExperimentDetail> {
        self.enter("experiment").await?;
        let state = self.state.read().await;
        Ok(state
            .experiment_details
            .get(experiment_id)
            .cloned()
            .unwrap_or_else(|| ExperimentDetail {
                experiment_id: Some(experiment_id.to_string()),
                missing: true,
                ..Default::default()
            }))
    }

    async fn start_replay(&self, request: &ReplayRequest) -> GatewayResult<ReplayStarted> {
        self.enter("start_replay").await?;
        let experiment_id = format!("mock-exp-{}", self.next_id());
        let summary = ExperimentSummary {
            experiment_id: experiment_id.clone(),
            created_at: request.until.to_rfc3339(),
            since: request.since.to_rfc3339(),
            until: request.until.to_rfc3339(),
        };
        let detail = ExperimentDetail {
            experiment: Some(summary.clone()),
            ..Default::default()
        };
        self.add_experiment(summary, detail).await;
        Ok(ReplayStarted { experiment_id })
    }

    async fn config(&self) -> GatewayResult<Value> {
        self.enter("config").await?;
        Ok(json!({
            "version": "mock",
            "dedup_window_seconds": 600,
            "correlation_window_seconds": 1800,
            "enabled_enrichers": ["ip_reputation", "geo_asn", "whois"]
        }))
    }

    async fn playbook(&self, name: &str) -> GatewayResult<String> {
        validate_playbook_name(name)?;
        self.enter("playbook").await?;
        self.state
            .read()
            .await
            .playbooks
            .get(name)
            .cloned()
            .ok_or_else(|| GatewayError::Status {
                status: 404,
                detail: "Not Found".to_string(),
            })
    }

    async fn submit_alert(
        &self,
        alert: &AlertPayload,
        idempotency_key: Option<&str>,
    ) -> GatewayResult<IngestAccepted> {
        self.enter("submit_alert").await?;
        let id = self.next_id();
        let key = idempotency_key
            .map(str::to_string)
            .unwrap_or_else(|| format!("auto-{}", id));
        self.state.write().await.alerts.push((key, alert.clone()));
        Ok(IngestAccepted {
            ingest_id: format!("mock-ingest-{}", id),
            status: "accepted".to_string(),
        })
    }
}
