//! Case payloads returned by `/api/cases` and `/api/cases/{id}`.

use crate::coerce;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Backend disposition for a case.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Decision {
    /// Closed automatically without analyst involvement.
    #[serde(rename = "AUTO_CLOSE")]
    AutoClose,
    /// Routed to the ticketing system.
    #[serde(rename = "CREATE_TICKET")]
    CreateTicket,
    /// Escalated to an on-call queue.
    #[serde(rename = "ESCALATE")]
    Escalate,
    /// Any decision label this console does not know.
    #[serde(rename = "UNKNOWN", other)]
    #[default]
    Unknown,
}

impl Decision {
    /// The three decisions an operator can filter by.
    pub const FILTERABLE: [Decision; 3] =
        [Decision::AutoClose, Decision::CreateTicket, Decision::Escalate];

    /// Returns the wire representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Decision::AutoClose => "AUTO_CLOSE",
            Decision::CreateTicket => "CREATE_TICKET",
            Decision::Escalate => "ESCALATE",
            Decision::Unknown => "UNKNOWN",
        }
    }

    /// Returns true if this decision produced a ticket.
    pub fn is_ticketed(&self) -> bool {
        matches!(self, Decision::CreateTicket | Decision::Escalate)
    }
}

impl std::fmt::Display for Decision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for Decision {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "AUTO_CLOSE" => Ok(Decision::AutoClose),
            "CREATE_TICKET" => Ok(Decision::CreateTicket),
            "ESCALATE" => Ok(Decision::Escalate),
            _ => Err(format!(
                "Invalid decision: {} (expected AUTO_CLOSE, CREATE_TICKET or ESCALATE)",
                s
            )),
        }
    }
}

/// One row of the case list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaseSummary {
    #[serde(default, deserialize_with = "coerce::text")]
    pub case_id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub created_at: String,
    #[serde(default, deserialize_with = "coerce::severity")]
    pub severity: u8,
    #[serde(default, deserialize_with = "coerce::decision")]
    pub decision: Decision,
    #[serde(default, deserialize_with = "coerce::text")]
    pub queue: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub summary: String,
}

/// Body of `GET /api/cases`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseListResponse {
    #[serde(default)]
    pub items: Vec<CaseSummary>,
}

/// The `case` block of a case detail payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CaseRecord {
    #[serde(default, deserialize_with = "coerce::text")]
    pub case_id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub created_at: String,
    #[serde(default)]
    pub decision: Option<Decision>,
    #[serde(default, deserialize_with = "coerce::text")]
    pub queue: String,
    #[serde(default, deserialize_with = "coerce::severity")]
    pub severity: u8,
    #[serde(default, deserialize_with = "coerce::text")]
    pub summary: String,
}

/// One signal's effect on the case score.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringContribution {
    #[serde(default, deserialize_with = "coerce::text")]
    pub name: String,
    #[serde(default, deserialize_with = "coerce::number")]
    pub weight: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub value: f64,
    #[serde(default, deserialize_with = "coerce::number")]
    pub points: f64,
    #[serde(default, deserialize_with = "coerce::text")]
    pub reason: String,
}

/// Score explanation attached to a case.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ScoringBlock {
    #[serde(default, deserialize_with = "coerce::number")]
    pub confidence: f64,
    #[serde(default, deserialize_with = "coerce::severity")]
    pub severity: u8,
    #[serde(default)]
    pub contributions: Vec<ScoringContribution>,
}

/// A graph participant as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityRecord {
    #[serde(default, deserialize_with = "coerce::text")]
    pub entity_type: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub entity_value: String,
}

impl EntityRecord {
    pub fn new(entity_type: impl Into<String>, entity_value: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            entity_value: entity_value.into(),
        }
    }
}

/// A relationship between two entities as stored by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityEdgeRecord {
    #[serde(default, deserialize_with = "coerce::text")]
    pub src_type: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub src_value: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub dst_type: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub dst_value: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub edge_type: String,
}

impl EntityEdgeRecord {
    pub fn new(src: &EntityRecord, dst: &EntityRecord, edge_type: impl Into<String>) -> Self {
        Self {
            src_type: src.entity_type.clone(),
            src_value: src.entity_value.clone(),
            dst_type: dst.entity_type.clone(),
            dst_value: dst.entity_value.clone(),
            edge_type: edge_type.into(),
        }
    }
}

/// The `graph` block of a case detail payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphBlock {
    #[serde(default)]
    pub nodes: Vec<EntityRecord>,
    #[serde(default)]
    pub edges: Vec<EntityEdgeRecord>,
}

/// A stage transition in case processing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimelineEvent {
    #[serde(default, deserialize_with = "coerce::text")]
    pub event_id: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub created_at: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub stage: String,
    #[serde(default)]
    pub payload: Value,
}

/// A suggested response step linked to a playbook document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendedAction {
    #[serde(default, deserialize_with = "coerce::text")]
    pub title: String,
    #[serde(default, deserialize_with = "coerce::text")]
    pub playbook: String,
    #[serde(default)]
    pub params: BTreeMap<String, Value>,
}

impl RecommendedAction {
    /// Returns the playbook action name for `/playbooks/actions/{name}.md` links.
    pub fn playbook_action(&self) -> Option<&str> {
        self.playbook
            .strip_prefix("/playbooks/actions/")
            .and_then(|rest| rest.strip_suffix(".md"))
    }
}

/// Body of `GET /api/cases/{id}`.
///
/// Every block is optional on the wire. Unknown ids come back as
/// `{"case_id": ..., "missing": true}` with a 200 status.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CaseDetailPayload {
    #[serde(default)]
    pub case: Option<CaseRecord>,
    #[serde(default)]
    pub graph: Option<GraphBlock>,
    #[serde(default)]
    pub enrichments: Option<Value>,
    #[serde(default)]
    pub scoring: Option<ScoringBlock>,
    #[serde(default)]
    pub routing: Option<Value>,
    #[serde(default)]
    pub ticket: Option<Value>,
    #[serde(default)]
    pub recommended_actions: Option<Vec<RecommendedAction>>,
    #[serde(default)]
    pub timeline: Option<Vec<TimelineEvent>>,
    #[serde(default)]
    pub missing: bool,
}
