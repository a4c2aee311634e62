//! Overview rollup returned by `/api/overview`.

use crate::coerce;
use serde::{Deserialize, Serialize};

/// 24h rollup counters computed by the backend.
///
/// `cases` stays optional so the aggregator can fall back to the length of
/// the case list when the backend omits it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OverviewStats {
    #[serde(default, deserialize_with = "coerce::count")]
    pub ingested: u64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub deduped: u64,
    #[serde(default, deserialize_with = "coerce::optional_count")]
    pub cases: Option<u64>,
    #[serde(default, deserialize_with = "coerce::count")]
    pub auto_closed: u64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub tickets: u64,
    #[serde(default, deserialize_with = "coerce::count")]
    pub errors: u64,
}

/// Body of `GET /api/overview`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OverviewResponse {
    #[serde(default)]
    pub window: Option<String>,
    #[serde(default)]
    pub stats: Option<OverviewStats>,
}
