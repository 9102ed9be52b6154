use crate::db::sqlite::{PlatformStorage, expect_affected};
use crate::error::PlatformError;
use crate::types::{CountBucket, IncidentStatus, IncidentSummary, SecurityIncident, Severity};
use serde::Deserialize;
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

const ENTITY: &str = "Incident";
const COLUMNS: &str = "id, incident_type, severity, status, description, created_at";

#[derive(Debug, Clone, Deserialize)]
pub struct NewIncident {
    pub incident_type: String,
    pub severity: Severity,
    pub description: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct IncidentPatch {
    pub severity: Option<Severity>,
    pub status: Option<IncidentStatus>,
}

impl IncidentPatch {
    pub fn is_empty(&self) -> bool {
        self.severity.is_none() && self.status.is_none()
    }
}

/// Chart series for the incident analysis view.
#[derive(Debug, Clone, serde::Serialize)]
pub struct IncidentBreakdown {
    pub by_severity: Vec<CountBucket>,
    pub by_status: Vec<CountBucket>,
    pub by_type: Vec<CountBucket>,
}

impl PlatformStorage {
    /// All incidents, newest first.
    pub async fn list_incidents(&self) -> Result<Vec<SecurityIncident>, PlatformError> {
        let sql = format!("SELECT {COLUMNS} FROM security_incidents ORDER BY id DESC");
        let rows = sqlx::query_as::<_, SecurityIncident>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn get_incident(&self, id: i64) -> Result<SecurityIncident, PlatformError> {
        let sql = format!("SELECT {COLUMNS} FROM security_incidents WHERE id = ?");
        sqlx::query_as::<_, SecurityIncident>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(PlatformError::NotFound { entity: ENTITY, id })
    }

    /// New incidents always start `Open`.
    pub async fn insert_incident(&self, new: &NewIncident) -> Result<i64, PlatformError> {
        let result = sqlx::query(
            "INSERT INTO security_incidents (incident_type, severity, status, description) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.incident_type)
        .bind(new.severity.as_str())
        .bind(IncidentStatus::Open.as_str())
        .bind(&new.description)
        .execute(self.pool())
        .await?;
        let id = result.last_insert_rowid();
        info!(id, incident_type = %new.incident_type, severity = %new.severity, "incident reported");
        Ok(id)
    }

    /// Only the fields present in `patch` are written.
    pub async fn update_incident(&self, id: i64, patch: &IncidentPatch) -> Result<(), PlatformError> {
        if patch.is_empty() {
            return Err(PlatformError::NoFieldsToUpdate);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE security_incidents SET ");
        let mut set = qb.separated(", ");
        if let Some(severity) = patch.severity {
            set.push("severity = ").push_bind_unseparated(severity.as_str());
        }
        if let Some(status) = patch.status {
            set.push("status = ").push_bind_unseparated(status.as_str());
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(self.pool()).await?;
        expect_affected(result, ENTITY, id)?;
        info!(id, ?patch, "incident updated");
        Ok(())
    }

    pub async fn set_incident_status(
        &self,
        id: i64,
        status: IncidentStatus,
    ) -> Result<(), PlatformError> {
        self.update_incident(
            id,
            &IncidentPatch {
                status: Some(status),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn delete_incident(&self, id: i64) -> Result<(), PlatformError> {
        let result = sqlx::query("DELETE FROM security_incidents WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        expect_affected(result, ENTITY, id)?;
        info!(id, "incident deleted");
        Ok(())
    }

    pub async fn incident_summary(&self) -> Result<IncidentSummary, PlatformError> {
        let summary = sqlx::query_as::<_, IncidentSummary>(
            r#"SELECT
                COUNT(*) AS total,
                COALESCE(SUM(LOWER(severity) = 'critical'), 0) AS critical,
                COALESCE(SUM(LOWER(severity) = 'high'), 0) AS high,
                COALESCE(SUM(LOWER(status) = 'resolved'), 0) AS resolved
               FROM security_incidents"#,
        )
        .fetch_one(self.pool())
        .await?;
        Ok(summary)
    }

    pub async fn incident_breakdown(&self) -> Result<IncidentBreakdown, PlatformError> {
        Ok(IncidentBreakdown {
            by_severity: self.count_by("security_incidents", "severity").await?,
            by_status: self.count_by("security_incidents", "status").await?,
            by_type: self.count_by("security_incidents", "incident_type").await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::memory_storage;

    fn new_incident(kind: &str, severity: Severity) -> NewIncident {
        NewIncident {
            incident_type: kind.to_string(),
            severity,
            description: format!("{kind} seen on server-05"),
        }
    }

    #[tokio::test]
    async fn insert_list_newest_first() {
        let storage = memory_storage().await;
        let first = storage
            .insert_incident(&new_incident("Malware Detection", Severity::High))
            .await
            .unwrap();
        let second = storage
            .insert_incident(&new_incident("DDoS Attack", Severity::Critical))
            .await
            .unwrap();

        let rows = storage.list_incidents().await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].id(), second);
        assert_eq!(rows[1].id(), first);
        assert_eq!(rows[1].status(), "Open");
        assert_eq!(rows[0].severity_level(), 4);
    }

    #[tokio::test]
    async fn partial_update_touches_only_given_fields() {
        let storage = memory_storage().await;
        let id = storage
            .insert_incident(&new_incident("SQL Injection", Severity::Medium))
            .await
            .unwrap();

        storage
            .set_incident_status(id, IncidentStatus::Resolved)
            .await
            .unwrap();
        let row = storage.get_incident(id).await.unwrap();
        assert_eq!(row.status(), "Resolved");
        assert_eq!(row.severity(), "medium");

        let err = storage
            .update_incident(id, &IncidentPatch::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PlatformError::NoFieldsToUpdate));
    }

    #[tokio::test]
    async fn missing_rows_are_not_found() {
        let storage = memory_storage().await;
        assert!(matches!(
            storage.delete_incident(42).await,
            Err(PlatformError::NotFound { id: 42, .. })
        ));
        assert!(matches!(
            storage.set_incident_status(42, IncidentStatus::Open).await,
            Err(PlatformError::NotFound { .. })
        ));
        assert!(storage.get_incident(42).await.is_err());
    }

    #[tokio::test]
    async fn summary_and_breakdown() {
        let storage = memory_storage().await;
        for (kind, sev) in [
            ("Phishing", Severity::High),
            ("Phishing", Severity::Critical),
            ("Malware", Severity::Low),
        ] {
            storage.insert_incident(&new_incident(kind, sev)).await.unwrap();
        }
        storage
            .set_incident_status(1, IncidentStatus::Resolved)
            .await
            .unwrap();

        let summary = storage.incident_summary().await.unwrap();
        assert_eq!(
            summary,
            IncidentSummary {
                total: 3,
                critical: 1,
                high: 1,
                resolved: 1
            }
        );

        let breakdown = storage.incident_breakdown().await.unwrap();
        assert_eq!(breakdown.by_type[0].label, "Phishing");
        assert_eq!(breakdown.by_type[0].count, 2);
        assert_eq!(breakdown.by_status.len(), 2);
    }

    #[tokio::test]
    async fn empty_table_summary_is_zero() {
        let storage = memory_storage().await;
        assert_eq!(
            storage.incident_summary().await.unwrap(),
            IncidentSummary::default()
        );
    }
}
