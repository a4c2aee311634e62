//! Case detail view model.

use crate::error::{CoreError, CoreResult};
use crate::graph::EntityGraph;
use crate::models::{
    CaseDetailPayload, CaseRecord, RecommendedAction, ScoringContribution, TimelineEvent,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Score explainability section.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringView {
    /// Confidence in [0, 1].
    pub confidence: f64,
    pub contributions: Vec<ContributionRow>,
}

impl ScoringView {
    /// Confidence with two decimals.
    pub fn confidence_display(&self) -> String {
        format!("{:.2}", self.confidence)
    }

    /// Sum of all contribution points.
    pub fn total_points(&self) -> f64 {
        self.contributions.iter().map(|c| c.points).sum()
    }
}

/// One row of the explainability table.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionRow {
    pub name: String,
    pub weight: f64,
    pub value: f64,
    pub points: f64,
    pub reason: String,
}

impl ContributionRow {
    /// Points with one decimal.
    pub fn points_display(&self) -> String {
        format!("{:.1}", self.points)
    }
}

impl From<ScoringContribution> for ContributionRow {
    fn from(c: ScoringContribution) -> Self {
        Self {
            name: c.name,
            weight: c.weight,
            value: c.value,
            points: c.points,
            reason: c.reason,
        }
    }
}

/// Everything the case detail view renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseDetailView {
    pub case: CaseRecord,
    pub scoring: ScoringView,
    pub graph: EntityGraph,
    /// Enrichment results, opaque to the console.
    pub enrichments: Map<String, Value>,
    /// Routing explanation, opaque to the console.
    pub routing: Map<String, Value>,
    pub ticket: Option<Value>,
    pub recommended_actions: Vec<RecommendedAction>,
    /// Stage transitions in backend order.
    pub timeline: Vec<TimelineEvent>,
}

impl CaseDetailView {
    /// Assembles the view for `case_id` from a decoded detail payload.
    ///
    /// Absent blocks become empty values, except the `case` block: the
    /// backend answers an unknown id with a 200 whose `case` is `{}`, so a
    /// case block without a `case_id` is [`CoreError::NotFound`], as is a
    /// payload flagged `missing`.
    pub fn assemble(case_id: &str, payload: CaseDetailPayload) -> CoreResult<Self> {
        let case = match payload.case {
            Some(case) if !payload.missing && !case.case_id.trim().is_empty() => case,
            _ => return Err(CoreError::not_found("case", case_id)),
        };

        let scoring = payload.scoring.unwrap_or_default();
        let scoring = ScoringView {
            confidence: clamp_unit(scoring.confidence),
            contributions: scoring.contributions.into_iter().map(Into::into).collect(),
        };

        let graph = EntityGraph::build(&payload.graph.unwrap_or_default());

        Ok(Self {
            case,
            scoring,
            graph,
            enrichments: into_object(payload.enrichments),
            routing: into_object(payload.routing),
            ticket: payload.ticket.filter(|t| !t.is_null()),
            recommended_actions: payload.recommended_actions.unwrap_or_default(),
            timeline: payload.timeline.unwrap_or_default(),
        })
    }

    /// Enrichments as indented JSON.
    pub fn enrichments_pretty(&self) -> String {
        serde_json::to_string_pretty(&self.enrichments).unwrap_or_else(|_| "{}".to_string())
    }

    /// Decision label, or `-` when the case block carried none.
    pub fn decision_label(&self) -> &str {
        self.case.decision.map(|d| d.as_str()).unwrap_or("-")
    }
}

fn clamp_unit(n: f64) -> f64 {
    if n.is_finite() {
        n.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn into_object(value: Option<Value>) -> Map<String, Value> {
    match value {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}
