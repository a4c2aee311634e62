//! Replay experiment payloads.

use crate::coerce;
use crate::error::{CoreError, CoreResult};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// One replay run in the experiment list.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExperimentSummary {
    #[serde(default, deserialize_with = "coerce::text")]
    pub experiment_id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub created_at: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub since: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub until: String,
}

impl ExperimentSummary {
    /// Short identifier for list display.
    pub fn short_id(&self) -> &str {
        let end = self
            .experiment_id
            .char_indices()
            .nth(8)
            .map(|(i, _)| i)
            .unwrap_or(self.experiment_id.len());
        &self.experiment_id[..end]
    }
}

/// Body of `GET /api/experiments`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentListResponse {
    #[serde(default)]
    pub items: Vec<ExperimentSummary>,
}

/// Outcome counters on one side of a replay.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetricBlock {
    #[serde(default, deserialize_with = "coerce::count")]
    pub total_cases: u64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub tickets: f64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub auto_close: u64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub auto_close_rate_pct: f64,
}

/// Body of `GET /api/experiments/{id}`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExperimentDetail {
    #[serde(default)]
    pub experiment: Option<ExperimentSummary>,
    #[serde(default)]
    pub experiment_id: Option<String>,
    #[serde(default)]
    pub before: MetricBlock,
    #[serde(default)]
    pub after: MetricBlock,
    #[serde(default)]
    pub details: BTreeMap<String, Value>,
    #[serde(default)]
    pub missing: bool,
}

impl ExperimentDetail {
    /// Identifier from the experiment row, falling back to the top-level id.
    pub fn id(&self) -> &str {
        self.experiment
            .as_ref()
            .map(|e| e.experiment_id.as_str())
            .filter(|id| !id.is_empty())
            .or(self.experiment_id.as_deref())
            .unwrap_or_default()
    }
}

/// Body of `POST /api/replay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRequest {
    pub since: DateTime<Utc>,
    pub until: DateTime<Utc>,
    #[serde(default)]
    pub config_overrides: Value,
}

impl ReplayRequest {
    /// Builds a request covering the `minutes` leading up to `now`.
    pub fn last_minutes(now: DateTime<Utc>, minutes: i64, config_overrides: Value) -> Self {
        Self {
            since: now - Duration::minutes(minutes),
            until: now,
            config_overrides,
        }
    }

    /// Rejects inverted windows and non-object overrides.
    pub fn validate(&self) -> CoreResult<()> {
        if self.since > self.until {
            return Err(CoreError::InvalidInput(format!(
                "replay window starts after it ends ({} > {})",
                self.since.to_rfc3339(),
                self.until.to_rfc3339()
            )));
        }
        if !(self.config_overrides.is_object() || self.config_overrides.is_null()) {
            return Err(CoreError::InvalidInput(
                "config_overrides must be a JSON object".to_string(),
            ));
        }
        Ok(())
    }
}

/// Response of `POST /api/replay`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayStarted {
    pub experiment_id: String,
}
