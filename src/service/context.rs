//! Live data summaries handed to the domain assistants as part of their system prompt.

use crate::db::PlatformStorage;
use crate::error::PlatformError;
use crate::types::{Channel, CountBucket, DatasetSummary, IncidentSummary, TicketSummary};

pub const NO_DATA: &str = "No data loaded yet.";

const TOP_N: usize = 3;

/// Context text for `channel`; the general channel has none.
pub async fn context_for(
    storage: &PlatformStorage,
    channel: Channel,
) -> Result<Option<String>, PlatformError> {
    let text = match channel {
        Channel::General => return Ok(None),
        Channel::Cybersecurity => {
            let summary = storage.incident_summary().await?;
            let breakdown = storage.incident_breakdown().await?;
            incident_context(&summary, &breakdown.by_type)
        }
        Channel::ItOperations => {
            let summary = storage.ticket_summary(&Default::default()).await?;
            let breakdown = storage.ticket_breakdown().await?;
            ticket_context(&summary, &breakdown.by_priority)
        }
        Channel::DataScience => {
            let summary = storage.dataset_summary().await?;
            let breakdown = storage.dataset_breakdown().await?;
            dataset_context(&summary, &breakdown.by_source)
        }
    };
    Ok(Some(text))
}

pub fn incident_context(summary: &IncidentSummary, by_type: &[CountBucket]) -> String {
    if summary.total == 0 {
        return format!("Current Security Data: {NO_DATA}");
    }
    format!(
        "Current Security Data:\n\
         - Total Incidents: {}\n\
         - Critical: {}\n\
         - High: {}\n\
         - Resolved: {}\n\
         - Top Threat Types: {}",
        summary.total,
        summary.critical,
        summary.high,
        summary.resolved,
        top_labels(by_type),
    )
}

pub fn ticket_context(summary: &TicketSummary, by_priority: &[CountBucket]) -> String {
    if summary.total == 0 {
        return format!("Current IT Operations Data: {NO_DATA}");
    }
    let priorities = by_priority
        .iter()
        .map(|b| format!("{}: {}", b.label, b.count))
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "Current IT Operations Data:\n\
         - Total Tickets: {}\n\
         - Open: {}\n\
         - In Progress: {}\n\
         - Closed: {}\n\
         - Priority Breakdown: {priorities}",
        summary.total, summary.open, summary.in_progress, summary.closed,
    )
}

pub fn dataset_context(summary: &DatasetSummary, by_source: &[CountBucket]) -> String {
    if summary.total == 0 {
        return format!("Current Data Science Metrics: {NO_DATA}");
    }
    format!(
        "Current Data Science Metrics:\n\
         - Total Datasets: {}\n\
         - Total Size: {:.2} MB\n\
         - Total Rows: {}\n\
         - Sources: {}\n\
         - Top Sources: {}",
        summary.total,
        summary.total_mb,
        summary.total_rows,
        by_source.len(),
        top_labels(by_source),
    )
}

fn top_labels(buckets: &[CountBucket]) -> String {
    if buckets.is_empty() {
        return "N/A".to_string();
    }
    buckets
        .iter()
        .take(TOP_N)
        .map(|b| b.label.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}
