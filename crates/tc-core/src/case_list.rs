//! Case list filters and their query-string projection.

use crate::models::{CaseListResponse, CaseSummary, Decision};
use serde::{Deserialize, Serialize};

/// The case list always covers the last 24 hours.
pub const TIME_RANGE: &str = "24h";

/// Operator-supplied filter state for the case table.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaseFilter {
    /// Free-text search over entities, case ids and summaries.
    pub query: String,
    /// Decision to match; `None` means any.
    pub decision: Option<Decision>,
    /// Minimum severity, 0 disables the filter.
    pub severity_min: u8,
    /// Routing queue to match.
    pub queue: Option<String>,
}

impl CaseFilter {
    /// Filter matching only the given decision.
    pub fn with_decision(decision: Decision) -> Self {
        Self {
            decision: Some(decision),
            ..Default::default()
        }
    }

    /// Query parameters for `GET /api/cases`.
    ///
    /// `time_range` is always present; every other parameter only appears
    /// when it differs from its default.
    pub fn query_params(&self) -> Vec<(&'static str, String)> {
        let mut params = vec![("time_range", TIME_RANGE.to_string())];

        let query = self.query.trim();
        if !query.is_empty() {
            params.push(("q", query.to_string()));
        }
        if let Some(decision) = self.decision.filter(|d| *d != Decision::Unknown) {
            params.push(("decision", decision.as_str().to_string()));
        }
        if self.severity_min > 0 {
            params.push(("severity_min", self.severity_min.min(100).to_string()));
        }
        if let Some(queue) = self.queue.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            params.push(("queue", queue.to_string()));
        }

        params
    }
}

/// Rows for the case table plus the fetch error, if any.
///
/// A failed fetch leaves `rows` empty. The error is kept so callers can
/// choose to show it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseListView {
    pub rows: Vec<CaseSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaseListView {
    /// Passes the response items through unchanged.
    pub fn from_response(response: CaseListResponse) -> Self {
        Self {
            rows: response.items,
            error: None,
        }
    }

    /// Empty view carrying the failure message.
    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            rows: Vec::new(),
            error: Some(message.into()),
        }
    }

    /// Number of rows shown.
    pub fn count(&self) -> usize {
        self.rows.len()
    }
}
