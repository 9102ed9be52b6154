use crate::middleware::CurrentUser;
use crate::types::{PlatformCounts, UserView};
use crate::{PlatformError, server::router::PlatformState};
use axum::{Json, extract::State};
use serde::Serialize;
use serde_json::{Value, json};

#[derive(Debug, Serialize)]
pub struct DashboardView {
    pub user: UserView,
    pub counts: PlatformCounts,
    pub assistant_online: bool,
}

/// GET /health
pub async fn health() -> Json<Value> {
    Json(json!({"status": "ok"}))
}

/// GET /dashboard
pub async fn dashboard(
    State(state): State<PlatformState>,
    user: CurrentUser,
) -> Result<Json<DashboardView>, PlatformError> {
    let counts = state.storage.platform_counts().await?;
    Ok(Json(DashboardView {
        user: user.view(),
        counts,
        assistant_online: state.assistant.is_online(),
    }))
}
