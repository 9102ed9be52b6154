use serde::Serialize;
use sqlx::FromRow;

/// One bar of a chart: how many rows share `label`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct CountBucket {
    pub label: String,
    pub count: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct IncidentSummary {
    pub total: i64,
    pub critical: i64,
    pub high: i64,
    pub resolved: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct TicketSummary {
    pub total: i64,
    pub open: i64,
    pub in_progress: i64,
    pub closed: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DatasetSummary {
    pub total: i64,
    pub total_mb: f64,
    pub total_rows: i64,
    pub avg_rows: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, FromRow)]
pub struct PlatformCounts {
    pub incidents: i64,
    pub tickets: i64,
    pub datasets: i64,
}
