//! Dashboard counters and the hourly case series.

use crate::models::{CaseSummary, Decision, OverviewStats};
use chrono::{DateTime, NaiveDateTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Counters shown on the overview cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub ingested: u64,
    pub deduped: u64,
    pub cases: u64,
    pub auto_closed: u64,
    pub tickets: u64,
    pub errors: u64,
    /// ESCALATE cases in the fetched list.
    pub escalations: u64,
}

/// One point of the cases-over-time series.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Hour bucket key, `YYYY-MM-DD HH:00` in UTC.
    pub t: String,
    /// Number of cases created in that hour.
    pub v: u64,
}

/// Everything the overview view renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Overview {
    pub stats: DashboardStats,
    pub series: Vec<SeriesPoint>,
}

/// Builds the overview from the 24h case list and the backend rollup.
///
/// Rollup fields win over values derived from the list. `cases` falls back
/// to the list length when the rollup omits it. Without a rollup,
/// auto-closed and ticket counts are derived from case decisions.
pub fn aggregate(cases: &[CaseSummary], stats: Option<&OverviewStats>) -> Overview {
    let mut by_decision: BTreeMap<&'static str, u64> = BTreeMap::new();
    for case in cases {
        *by_decision.entry(case.decision.as_str()).or_default() += 1;
    }
    let decided = |d: Decision| by_decision.get(d.as_str()).copied().unwrap_or(0);
    let listed = cases.len() as u64;

    let dashboard = match stats {
        Some(s) => DashboardStats {
            ingested: s.ingested,
            deduped: s.deduped,
            cases: s.cases.unwrap_or(listed),
            auto_closed: s.auto_closed,
            tickets: s.tickets,
            errors: s.errors,
            escalations: decided(Decision::Escalate),
        },
        None => DashboardStats {
            cases: listed,
            auto_closed: decided(Decision::AutoClose),
            tickets: decided(Decision::CreateTicket) + decided(Decision::Escalate),
            escalations: decided(Decision::Escalate),
            ..Default::default()
        },
    };

    Overview {
        stats: dashboard,
        series: hourly_series(cases),
    }
}

/// Groups cases into UTC hour buckets, ascending, without backfilling gaps.
pub fn hourly_series(cases: &[CaseSummary]) -> Vec<SeriesPoint> {
    let mut buckets: BTreeMap<String, u64> = BTreeMap::new();
    for case in cases {
        match parse_timestamp(&case.created_at) {
            Some(ts) => *buckets.entry(hour_bucket(ts)).or_default() += 1,
            None => debug!(
                case_id = %case.case_id,
                created_at = %case.created_at,
                "Skipping case with unparseable timestamp"
            ),
        }
    }
    buckets
        .into_iter()
        .map(|(t, v)| SeriesPoint { t, v })
        .collect()
}

/// Zero-padded hour key so string order matches time order.
pub fn hour_bucket(ts: DateTime<Utc>) -> String {
    ts.with_minute(0)
        .and_then(|t| t.with_second(0))
        .unwrap_or(ts)
        .format("%Y-%m-%d %H:00")
        .to_string()
}

/// Parses backend timestamps.
///
/// Offsets are honored; naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f%:z"]
        .iter()
        .find_map(|fmt| {
            DateTime::parse_from_str(raw, fmt)
                .map(|ts| ts.with_timezone(&Utc))
                .ok()
                .or_else(|| NaiveDateTime::parse_from_str(raw, fmt).ok().map(|n| n.and_utc()))
        })
}
