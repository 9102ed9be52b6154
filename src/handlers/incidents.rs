use crate::db::{IncidentBreakdown, IncidentPatch, NewIncident};
use crate::middleware::{ApiJson, ApiPath, CurrentUser};
use crate::types::{IncidentSummary, SecurityIncident};
use crate::{PlatformError, server::router::PlatformState};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use serde::Serialize;
use tracing::info;

#[derive(Debug, Serialize)]
pub struct IncidentListing {
    pub summary: IncidentSummary,
    pub incidents: Vec<SecurityIncident>,
}

/// GET /incidents
pub async fn list_incidents(
    State(state): State<PlatformState>,
    _user: CurrentUser,
) -> Result<Json<IncidentListing>, PlatformError> {
    let summary = state.storage.incident_summary().await?;
    let incidents = state.storage.list_incidents().await?;
    Ok(Json(IncidentListing { summary, incidents }))
}

/// POST /incidents
pub async fn create_incident(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiJson(mut form): ApiJson<NewIncident>,
) -> Result<impl IntoResponse, PlatformError> {
    form.incident_type = form.incident_type.trim().to_string();
    form.description = form.description.trim().to_string();
    if form.incident_type.is_empty() {
        return Err(PlatformError::validation("Incident type is required."));
    }
    if form.description.is_empty() {
        return Err(PlatformError::validation("Please provide a description."));
    }

    let id = state.storage.insert_incident(&form).await?;
    let incident = state.storage.get_incident(id).await?;
    info!(id, reporter = %user.username, "incident reported");
    Ok((StatusCode::CREATED, Json(incident)))
}

/// GET /incidents/{id}
pub async fn get_incident(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<Json<SecurityIncident>, PlatformError> {
    Ok(Json(state.storage.get_incident(id).await?))
}

/// PATCH /incidents/{id}
pub async fn update_incident(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
    ApiJson(patch): ApiJson<IncidentPatch>,
) -> Result<Json<SecurityIncident>, PlatformError> {
    state.storage.update_incident(id, &patch).await?;
    Ok(Json(state.storage.get_incident(id).await?))
}

/// DELETE /incidents/{id}
pub async fn delete_incident(
    State(state): State<PlatformState>,
    _user: CurrentUser,
    ApiPath(id): ApiPath<i64>,
) -> Result<StatusCode, PlatformError> {
    state.storage.delete_incident(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /incidents/analysis
pub async fn incident_analysis(
    State(state): State<PlatformState>,
    _user: CurrentUser,
) -> Result<Json<IncidentBreakdown>, PlatformError> {
    Ok(Json(state.storage.incident_breakdown().await?))
}
