use crate::db::sqlite::PlatformStorage;
use crate::error::PlatformError;
use crate::service::hasher::PasswordHasher;
use crate::types::dataset::mb_to_bytes;
use crate::types::{IncidentStatus, Role, Severity, TicketStatus};
use tracing::info;

pub const DEMO_PASSWORD: &str = "password123";

const DEMO_USERS: [(&str, Role); 2] = [("alice", Role::Admin), ("bob", Role::Analyst)];

const DEMO_INCIDENTS: [(&str, Severity, IncidentStatus, &str); 3] = [
    (
        "Malware Detection",
        Severity::High,
        IncidentStatus::Open,
        "Suspicious malware detected on server-05",
    ),
    (
        "SQL Injection",
        Severity::Critical,
        IncidentStatus::InProgress,
        "SQL injection vulnerability found in login page",
    ),
    (
        "DDoS Attack",
        Severity::High,
        IncidentStatus::Resolved,
        "DDoS attack mitigated, traffic normalized",
    ),
];

const DEMO_DATASETS: [(&str, f64, i64, &str); 3] = [
    ("Customer Data 2023", 5.0 * 1024.0, 1_000_000, "MySQL Database"),
    ("Transaction Logs", 2.0 * 1024.0, 500_000, "Kafka Stream"),
    ("Audit Trails", 1024.0, 250_000, "CSV Files"),
];

const DEMO_TICKETS: [(&str, Severity, TicketStatus, &str); 3] = [
    (
        "Reset Password - John Doe",
        Severity::Low,
        TicketStatus::Open,
        "Support Team A",
    ),
    (
        "Server Outage - Critical",
        Severity::Critical,
        TicketStatus::InProgress,
        "Infrastructure Team",
    ),
    (
        "Email Configuration",
        Severity::Medium,
        TicketStatus::Closed,
        "Support Team B",
    ),
];

/// Populate an empty database with the demo accounts and records.
/// Does nothing once any user exists. Returns whether data was written.
pub async fn seed_demo_data(
    storage: &PlatformStorage,
    hasher: PasswordHasher,
) -> Result<bool, PlatformError> {
    if storage.count_users().await? > 0 {
        return Ok(false);
    }

    let password_hash =
        tokio::task::spawn_blocking(move || hasher.hash(DEMO_PASSWORD)).await??;

    let mut tx = storage.pool().begin().await?;
    for (username, role) in DEMO_USERS {
        sqlx::query("INSERT OR IGNORE INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(&password_hash)
            .bind(role.as_str())
            .execute(&mut *tx)
            .await?;
    }
    for (kind, severity, status, description) in DEMO_INCIDENTS {
        sqlx::query(
            "INSERT INTO security_incidents (incident_type, severity, status, description) VALUES (?, ?, ?, ?)",
        )
        .bind(kind)
        .bind(severity.as_str())
        .bind(status.as_str())
        .bind(description)
        .execute(&mut *tx)
        .await?;
    }
    for (name, size_mb, rows, source) in DEMO_DATASETS {
        sqlx::query("INSERT INTO datasets (name, size_bytes, rows, source) VALUES (?, ?, ?, ?)")
            .bind(name)
            .bind(mb_to_bytes(size_mb))
            .bind(rows)
            .bind(source)
            .execute(&mut *tx)
            .await?;
    }
    for (title, priority, status, assignee) in DEMO_TICKETS {
        sqlx::query(
            "INSERT INTO it_tickets (title, priority, status, assigned_to) VALUES (?, ?, ?, ?)",
        )
        .bind(title)
        .bind(priority.as_str())
        .bind(status.as_str())
        .bind(assignee)
        .execute(&mut *tx)
        .await?;
    }
    tx.commit().await?;

    info!(
        users = DEMO_USERS.len(),
        incidents = DEMO_INCIDENTS.len(),
        datasets = DEMO_DATASETS.len(),
        tickets = DEMO_TICKETS.len(),
        "demo data seeded"
    );
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::memory_storage;
    use crate::service::hasher::MIN_COST;

    #[tokio::test]
    async fn seeds_once() {
        let storage = memory_storage().await;
        let hasher = PasswordHasher::new(MIN_COST);
        assert!(seed_demo_data(&storage, hasher).await.unwrap());
        assert!(!seed_demo_data(&storage, hasher).await.unwrap());

        let counts = storage.platform_counts().await.unwrap();
        assert_eq!((counts.incidents, counts.tickets, counts.datasets), (3, 3, 3));

        let alice = storage.find_user("alice").await.unwrap().unwrap();
        assert_eq!(alice.role(), "admin");
        assert!(alice.verify_password(DEMO_PASSWORD, &hasher));

        let audit = storage.get_dataset(3).await.unwrap();
        assert_eq!(audit.size_gb(), 1.0);
    }
}
