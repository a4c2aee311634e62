//! Backend API surface consumed by the console.

use crate::gateway::{Gateway, GatewayError, GatewayResult, IDEMPOTENCY_KEY_HEADER};
use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;
use tc_core::{
    AlertPayload, CaseDetailPayload, CaseFilter, CaseListResponse, ExperimentDetail,
    ExperimentListResponse, IngestAccepted, OverviewResponse, ReplayRequest, ReplayStarted,
};

/// Every backend call the console makes.
///
/// Implemented over HTTP by [`ApiClient`] and in memory by
/// [`crate::mock::MockConsoleApi`].
#[async_trait]
pub trait ConsoleApi: Send + Sync {
    /// `GET /readyz`; true on a 2xx answer.
    async fn ready(&self) -> GatewayResult<bool>;

    /// `GET /api/overview`.
    async fn overview(&self) -> GatewayResult<OverviewResponse>;

    /// `GET /api/cases` with the filter's query parameters.
    async fn list_cases(&self, filter: &CaseFilter) -> GatewayResult<CaseListResponse>;

    /// `GET /api/cases/{case_id}`.
    async fn case_detail(&self, case_id: &str) -> GatewayResult<CaseDetailPayload>;

    /// `GET /api/experiments`.
    async fn list_experiments(&self) -> GatewayResult<ExperimentListResponse>;

    /// `GET /api/experiments/{experiment_id}`.
    async fn experiment(&self, experiment_id: &str) -> GatewayResult<ExperimentDetail>;

    /// `POST /api/replay`.
    async fn start_replay(&self, request: &ReplayRequest) -> GatewayResult<ReplayStarted>;

    /// `GET /api/config`.
    async fn config(&self) -> GatewayResult<Value>;

    /// `GET /playbooks/actions/{name}.md`.
    async fn playbook(&self, name: &str) -> GatewayResult<String>;

    /// `POST /webhook/alerts`.
    async fn submit_alert(
        &self,
        alert: &AlertPayload,
        idempotency_key: Option<&str>,
    ) -> GatewayResult<IngestAccepted>;
}

/// Rejects playbook names outside `[A-Za-z0-9_-]+`.
pub fn validate_playbook_name(name: &str) -> GatewayResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(GatewayError::InvalidRequest(format!(
            "invalid playbook name: {:?}",
            name
        )))
    }
}

/// HTTP implementation of [`ConsoleApi`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    gateway: Gateway,
}

impl ApiClient {
    /// Creates a client for the backend at `base_url`.
    pub fn new(base_url: &str, timeout: Duration) -> GatewayResult<Self> {
        Ok(Self {
            gateway: Gateway::new(base_url, timeout)?,
        })
    }

    /// Creates a client pointing to localhost.
    pub fn localhost(port: u16) -> GatewayResult<Self> {
        Self::new(
            &format!("http://localhost:{}", port),
            crate::gateway::DEFAULT_TIMEOUT,
        )
    }

    /// Gets the base URL.
    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }
}

#[async_trait]
impl ConsoleApi for ApiClient {
    async fn ready(&self) -> GatewayResult<bool> {
        Ok(self.gateway.probe("/readyz").await?.is_success())
    }

    async fn overview(&self) -> GatewayResult<OverviewResponse> {
        self.gateway.get_json("/api/overview", &[]).await
    }

    async fn list_cases(&self, filter: &CaseFilter) -> GatewayResult<CaseListResponse> {
        self.gateway
            .get_json("/api/cases", &filter.query_params())
            .await
    }

    async fn case_detail(&self, case_id: &str) -> GatewayResult<CaseDetailPayload> {
        let path = format!("/api/cases/{}", urlencoding::encode(case_id));
        self.gateway.get_json(&path, &[]).await
    }

    async fn list_experiments(&self) -> GatewayResult<ExperimentListResponse> {
        self.gateway.get_json("/api/experiments", &[]).await
    }

    async fn experiment(&self, experiment_id: &str) -> GatewayResult<ExperimentDetail> {
        let path = format!("/api/experiments/{}", urlencoding::encode(experiment_id));
        self.gateway.get_json(&path, &[]).await
    }

    async fn start_replay(&self, request: &ReplayRequest) -> GatewayResult<ReplayStarted> {
        self.gateway.post_json("/api/replay", request, &[]).await
    }

    async fn config(&self) -> GatewayResult<Value> {
        self.gateway.get_json("/api/config", &[]).await
    }

    async fn playbook(&self, name: &str) -> GatewayResult<String> {
        validate_playbook_name(name)?;
        self.gateway
            .get_text(&format!("/playbooks/actions/{}.md", name))
            .await
    }

    async fn submit_alert(
        &self,
        alert: &AlertPayload,
        idempotency_key: Option<&str>,
    ) -> GatewayResult<IngestAccepted> {
        let headers: Vec<(&str, &str)> = idempotency_key
            .map(|key| vec![(IDEMPOTENCY_KEY_HEADER, key)])
            .unwrap_or_default();
        self.gateway
            .post_json("/webhook/alerts", alert, &headers)
            .await
    }
}
