//! Boundary types for the backend HTTP surface.
//!
//! One type per endpoint body. Fields are decoded leniently (see
//! [`crate::coerce`]) so a malformed counter degrades to zero instead of
//! rejecting the payload.

pub mod alert;
pub mod case;
pub mod experiment;
pub mod overview;

pub use alert::{AlertPayload, IngestAccepted};
pub use case::{
    CaseDetailPayload, CaseListResponse, CaseRecord, CaseSummary, Decision, EntityEdgeRecord,
    EntityRecord, GraphBlock, RecommendedAction, ScoringBlock, ScoringContribution,
    TimelineEvent,
};
pub use experiment::{
    ExperimentDetail, ExperimentListResponse, ExperimentSummary, MetricBlock, ReplayRequest,
    ReplayStarted,
};
pub use overview::{OverviewResponse, OverviewStats};
