//! # tc-core
//!
//! View models for the Triage Console.
//!
//! This crate turns loosely-typed backend payloads into render-ready views:
//! dashboard counters and the hourly case series, case list filters, the
//! case detail view with its entity graph, and experiment reduction metrics.
//! Nothing here performs I/O.

pub mod case_detail;
pub mod case_list;
pub mod coerce;
pub mod error;
pub mod experiment;
pub mod graph;
pub mod models;
pub mod overview;

pub use case_detail::{CaseDetailView, ContributionRow, ScoringView};
pub use case_list::{CaseFilter, CaseListView, TIME_RANGE};
pub use error::{CoreError, CoreResult};
pub use experiment::{reduction_pct, ExperimentComparison, MetricComparison};
pub use graph::{
    node_identity, EntityGraph, EntityKind, GraphSurface, LayoutOptions, NodeColor, VisualEdge,
    VisualNode,
};
pub use models::{
    AlertPayload, CaseDetailPayload, CaseListResponse, CaseRecord, CaseSummary, Decision,
    EntityEdgeRecord, EntityRecord, ExperimentDetail, ExperimentListResponse, ExperimentSummary,
    GraphBlock, IngestAccepted, MetricBlock, OverviewResponse, OverviewStats, RecommendedAction,
    ReplayRequest, ReplayStarted, ScoringBlock, ScoringContribution, TimelineEvent,
};
pub use overview::{aggregate, hour_bucket, hourly_series, DashboardStats, Overview, SeriesPoint};
