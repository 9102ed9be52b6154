use crate::db::{DatasetBreakdown, DatasetPatch, NewDataset};
use crate::middleware::{ApiJson, ApiPath, CurrentUser};
use crate::types::{Dataset, DatasetSummary};
use crate::{PlatformError, server::router::PlatformState};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;

const MIN_SIZE_MB: f64 = 0.1;
/// One pebibyte.
const MAX_SIZE_MB: f64 = 1024.0 * 1024.0 * 1024.0;
const MAX_ROWS: i64 = 1_000_000_000_000;

fn validate_rows(rows: i64) -> Result<(), PlatformError> {
    if !(1..=MAX_ROWS).contains(&rows) {
        return Err(PlatformError::validation(format!(
            "Rows must be between 1 and {MAX_ROWS}."
        )));
    }
    Ok(())
}

fn validate_text(value: &str, field: &str) -> Result<(), PlatformError> {
    if value.trim().is_empty() {
        return Err(PlatformError::validation(format!("Dataset {field} is required.")));
    }
    Ok(())
}

#[derive(Debug, Serialize)]
pub struct DatasetListing {
    pub summary: DatasetSummary,
    pub datasets: Vec<Dataset>,
}

fn validate_new(form: &NewDataset) -> Result<(), PlatformError> {
    validate_text(&form.name, "name")?;
    validate_text(&form.source, "source")?;
    if !(MIN_SIZE_MB..=MAX_SIZE_MB).contains(&form.size_mb) {
        return Err(PlatformError::validation(format!(
            "Size must be between {MIN_SIZE_MB} and {MAX_SIZE_MB} MB."
        )));
    }
    validate_rows(form.rows)
}

fn validate_patch(patch: &DatasetPatch) -> Result<(), PlatformError> {
    if let Some(name) = patch.name.as_deref() {
        validate_text(name, "name")?;
    }
    if let Some(source) = patch.source.as_deref() {
        validate_text(source, "source")?;
    }
    patch.rows.map_or(Ok(()), validate_rows)
}

/// GET /datasets
pub async fn list_datasets(
    State(state): State<PlatformState>,
    _user: CurrentUser,
) -> Result<Json<DatasetListing>, PlatformError> {
    let summary = state.storage.dataset_summary().await?;
    let datasets = state.storage.list_datasets().await?;
    Ok(Json(DatasetListing { summary, datasets }))
}

/// POST /datasets
pub async fn create_dataset(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<NewDataset>,
) -> Result<impl IntoResponse, PlatformError> {
    validate_new(&form)?;
    let id = state.storage.insert_dataset(&form).await?;
    let dataset = state.storage.get_dataset(id).await?;
    info!(id, owner = %user.username, "dataset registered by user");
    Ok((StatusCode::CREATED, Json(dataset)))
}

/// GET /datasets/{id}
pub async fn get_dataset(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<Dataset>, PlatformError> {
    Ok(Json(state.storage.get_dataset(id).await?))
}

/// PATCH /datasets/{id}
pub async fn update_dataset(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<DatasetPatch>,
) -> Result<Json<Dataset>, PlatformError> {
    validate_patch(&patch)?;
    state.storage.update_dataset(id, &patch).await?;
    Ok(Json(state.storage.get_dataset(id).await?))
}

/// DELETE /datasets/{id}
pub async fn delete_dataset(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, PlatformError> {
    state.storage.delete_dataset(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /datasets/analysis
pub async fn dataset_analysis(
    State(state): State<PlatformState>,
    _user: CurrentUser,
) -> Result<Json<DatasetBreakdown>, PlatformError> {
    Ok(Json(state.storage.dataset_breakdown().await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(size_mb: f64, rows: i64) -> NewDataset {
        NewDataset {
            name: "Audit Trails".to_string(),
            source: "CSV Files".to_string(),
            size_mb,
            rows,
        }
    }

    #[test]
    fn registration_bounds() {
        assert!(validate_new(&form(0.1, 1)).is_ok());
        assert!(validate_new(&form(0.05, 1)).is_err());
        assert!(validate_new(&form(1.0, 0)).is_err());
        assert!(validate_new(&form(f64::NAN, 10)).is_err());
    }

    #[test]
    fn registration_rejects_sizes_that_would_overflow_totals() {
        assert!(validate_new(&form(MAX_SIZE_MB, MAX_ROWS)).is_ok());
        assert!(validate_new(&form(8.0e12, 10)).is_err());
        assert!(validate_new(&form(f64::INFINITY, 10)).is_err());
        assert!(validate_new(&form(1.0, i64::MAX)).is_err());
    }

    #[test]
    fn patch_rejects_blank_text_and_bad_rows() {
        let blank_name = DatasetPatch {
            name: Some("   ".to_string()),
            ..Default::default()
        };
        assert!(validate_patch(&blank_name).is_err());
        let blank_source = DatasetPatch {
            source: Some(String::new()),
            ..Default::default()
        };
        assert!(validate_patch(&blank_source).is_err());
        let huge_rows = DatasetPatch {
            rows: Some(i64::MAX),
            ..Default::default()
        };
        assert!(validate_patch(&huge_rows).is_err());
        let ok = DatasetPatch {
            name: Some("clean".to_string()),
            rows: Some(5),
            ..Default::default()
        };
        assert!(validate_patch(&ok).is_ok());
    }
}
