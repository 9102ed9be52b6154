use crate::db::sqlite::{PlatformStorage, expect_affected};
use crate::error::PlatformError;
use crate::types::dataset::{BYTES_PER_MB, mb_to_bytes};
use crate::types::{CountBucket, Dataset, DatasetSummary};
use serde::{Deserialize, Serialize};
use sqlx::{QueryBuilder, Sqlite};
use tracing::info;

const ENTITY: &str = "Dataset";
const COLUMNS: &str = "id, name, size_bytes, rows, source, created_at";

/// Registration form: the size is entered in megabytes.
#[derive(Debug, Clone, Deserialize)]
pub struct NewDataset {
    pub name: String,
    pub source: String,
    pub size_mb: f64,
    pub rows: i64,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DatasetPatch {
    pub name: Option<String>,
    pub source: Option<String>,
    pub rows: Option<i64>,
}

impl DatasetPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.source.is_none() && self.rows.is_none()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct DatasetBreakdown {
    pub by_source: Vec<CountBucket>,
}

impl PlatformStorage {
    pub async fn list_datasets(&self) -> Result<Vec<Dataset>, PlatformError> {
        let sql = format!("SELECT {COLUMNS} FROM datasets ORDER BY id DESC");
        let rows = sqlx::query_as::<_, Dataset>(&sql)
            .fetch_all(self.pool())
            .await?;
        Ok(rows)
    }

    pub async fn get_dataset(&self, id: i64) -> Result<Dataset, PlatformError> {
        let sql = format!("SELECT {COLUMNS} FROM datasets WHERE id = ?");
        sqlx::query_as::<_, Dataset>(&sql)
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or(PlatformError::NotFound { entity: ENTITY, id })
    }

    pub async fn insert_dataset(&self, new: &NewDataset) -> Result<i64, PlatformError> {
        let size_bytes = mb_to_bytes(new.size_mb);
        let result = sqlx::query(
            "INSERT INTO datasets (name, size_bytes, rows, source) VALUES (?, ?, ?, ?)",
        )
        .bind(&new.name)
        .bind(size_bytes)
        .bind(new.rows)
        .bind(&new.source)
        .execute(self.pool())
        .await?;
        let id = result.last_insert_rowid();
        info!(id, name = %new.name, size_bytes, rows = new.rows, "dataset registered");
        Ok(id)
    }

    pub async fn update_dataset(&self, id: i64, patch: &DatasetPatch) -> Result<(), PlatformError> {
        if patch.is_empty() {
            return Err(PlatformError::NoFieldsToUpdate);
        }
        let mut qb = QueryBuilder::<Sqlite>::new("UPDATE datasets SET ");
        let mut set = qb.separated(", ");
        if let Some(name) = patch.name.as_deref() {
            set.push("name = ").push_bind_unseparated(name.to_string());
        }
        if let Some(source) = patch.source.as_deref() {
            set.push("source = ").push_bind_unseparated(source.to_string());
        }
        if let Some(rows) = patch.rows {
            set.push("rows = ").push_bind_unseparated(rows);
        }
        qb.push(" WHERE id = ").push_bind(id);

        let result = qb.build().execute(self.pool()).await?;
        expect_affected(result, ENTITY, id)?;
        info!(id, ?patch, "dataset updated");
        Ok(())
    }

    pub async fn delete_dataset(&self, id: i64) -> Result<(), PlatformError> {
        let result = sqlx::query("DELETE FROM datasets WHERE id = ?")
            .bind(id)
            .execute(self.pool())
            .await?;
        expect_affected(result, ENTITY, id)?;
        info!(id, "dataset deleted");
        Ok(())
    }

    /// Totals over every dataset; the average is integer division like the metric tiles.
    /// `TOTAL()` sums in floating point so large registrations cannot overflow.
    pub async fn dataset_summary(&self) -> Result<DatasetSummary, PlatformError> {
        let (total, total_bytes, total_rows): (i64, f64, f64) = sqlx::query_as(
            "SELECT COUNT(*), TOTAL(size_bytes), TOTAL(rows) FROM datasets",
        )
        .fetch_one(self.pool())
        .await?;
        let avg_rows = if total > 0 {
            (total_rows / total as f64) as i64
        } else {
            0
        };
        Ok(DatasetSummary {
            total,
            total_mb: total_bytes / BYTES_PER_MB,
            total_rows: total_rows as i64,
            avg_rows,
        })
    }

    pub async fn dataset_breakdown(&self) -> Result<DatasetBreakdown, PlatformError> {
        Ok(DatasetBreakdown {
            by_source: self.count_by("datasets", "source").await?,
        })
    }
}
