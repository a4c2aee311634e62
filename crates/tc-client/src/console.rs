//! View services: one method per console view.
//!
//! Each method performs the backend calls a view needs and runs the
//! matching assembler from `tc-core`. Failures come back as a
//! [`ConsoleError`] whose message is ready to show.

use crate::client::{validate_playbook_name, ConsoleApi};
use crate::error::ConsoleResult;
use serde_json::Value;
use tc_core::{
    aggregate, AlertPayload, CaseDetailView, CaseFilter, CaseListView, ExperimentComparison,
    ExperimentSummary, IngestAccepted, Overview, ReplayRequest, ReplayStarted,
};
use tracing::{info, instrument, warn};

/// Console view service over a backend.
#[derive(Debug, Clone)]
pub struct Console<A> {
    api: A,
}

impl<A: ConsoleApi> Console<A> {
    pub fn new(api: A) -> Self {
        Self { api }
    }

    /// The underlying backend API.
    pub fn api(&self) -> &A {
        &self.api
    }

    /// Backend readiness.
    pub async fn ready(&self) -> ConsoleResult<bool> {
        Ok(self.api.ready().await?)
    }

    /// Dashboard counters and the hourly series for the last 24 hours.
    ///
    /// The case list and the rollup are fetched concurrently. A failed case
    /// list fails the view; a failed rollup only drops the backend counters.
    #[instrument(skip(self))]
    pub async fn overview(&self) -> ConsoleResult<Overview> {
        let filter = CaseFilter::default();
        let (cases, rollup) = tokio::join!(self.api.list_cases(&filter), self.api.overview());

        let cases = cases?;
        let stats = match rollup {
            Ok(response) => response.stats,
            Err(e) => {
                warn!(error = %e, "Overview rollup unavailable, deriving counters from cases");
                None
            }
        };

        Ok(aggregate(&cases.items, stats.as_ref()))
    }

    /// Case table rows for `filter`.
    ///
    /// A failed fetch yields an empty table that carries the error message.
    #[instrument(skip(self))]
    pub async fn cases(&self, filter: &CaseFilter) -> CaseListView {
        match self.api.list_cases(filter).await {
            Ok(response) => CaseListView::from_response(response),
            Err(e) => {
                warn!(error = %e, "Case list fetch failed");
                CaseListView::failed(e.to_string())
            }
        }
    }

    /// Full detail view for one case.
    #[instrument(skip(self))]
    pub async fn case_detail(&self, case_id: &str) -> ConsoleResult<CaseDetailView> {
        let payload = self.api.case_detail(case_id).await?;
        Ok(CaseDetailView::assemble(case_id, payload)?)
    }

    /// Replay experiments, newest first as the backend returns them.
    pub async fn experiments(&self) -> ConsoleResult<Vec<ExperimentSummary>> {
        Ok(self.api.list_experiments().await?.items)
    }

    /// Before/after reduction metrics for one experiment.
    #[instrument(skip(self))]
    pub async fn experiment(&self, experiment_id: &str) -> ConsoleResult<ExperimentComparison> {
        let mut detail = self.api.experiment(experiment_id).await?;
        if detail.id().is_empty() {
            detail.experiment_id = Some(experiment_id.to_string());
        }
        Ok(ExperimentComparison::from_detail(&detail)?)
    }

    /// Launches a replay after checking the window and overrides.
    #[instrument(skip(self, request), fields(since = %request.since, until = %request.until))]
    pub async fn start_replay(&self, request: &ReplayRequest) -> ConsoleResult<ReplayStarted> {
        request.validate()?;
        let started = self.api.start_replay(request).await?;
        info!(experiment_id = %started.experiment_id, "Replay started");
        Ok(started)
    }

    /// Effective backend configuration.
    pub async fn config(&self) -> ConsoleResult<Value> {
        Ok(self.api.config().await?)
    }

    /// Markdown for a playbook action. A trailing `.md` is accepted.
    pub async fn playbook(&self, name: &str) -> ConsoleResult<String> {
        let name = name.strip_suffix(".md").unwrap_or(name);
        validate_playbook_name(name)?;
        Ok(self.api.playbook(name).await?)
    }

    /// Submits a raw alert to the ingest webhook.
    #[instrument(skip(self, alert))]
    pub async fn submit_alert(
        &self,
        alert: &AlertPayload,
        idempotency_key: Option<&str>,
    ) -> ConsoleResult<IngestAccepted> {
        let accepted = self.api.submit_alert(alert, idempotency_key).await?;
        info!(ingest_id = %accepted.ingest_id, status = %accepted.status, "Alert accepted");
        Ok(accepted)
    }
}
