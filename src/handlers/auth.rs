use crate::middleware::{ApiJson, CurrentUser};
use crate::middleware::session::{end_session, start_session};
use crate::types::{Role, UserView};
use crate::{PlatformError, server::router::PlatformState};
use axum::{
    Json,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use axum_extra::extract::cookie::PrivateCookieJar;
use serde::Deserialize;
use tracing::info;

#[derive(Debug, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    pub password: String,
    pub confirm_password: String,
    #[serde(default)]
    pub role: Role,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

/// POST /auth/register
pub async fn register(
    State(state): State<PlatformState>,
    ApiJson(form): ApiJson<RegisterForm>,
) -> Result<impl IntoResponse, PlatformError> {
    if form.password != form.confirm_password {
        return Err(PlatformError::validation("Passwords do not match."));
    }
    let user = state
        .auth
        .register_user(&form.username, &form.password, form.role)
        .await?;
    Ok((StatusCode::CREATED, Json(user.view())))
}

/// POST /auth/login -> sets the session cookie.
pub async fn login(
    State(state): State<PlatformState>,
    jar: PrivateCookieJar,
    ApiJson(form): ApiJson<LoginForm>,
) -> Result<impl IntoResponse, PlatformError> {
    let Some(user) = state.auth.login_user(&form.username, &form.password).await? else {
        return Err(PlatformError::InvalidCredentials);
    };
    let view = user.view();
    let jar = start_session(jar, &view, state.insecure_cookie)?;
    Ok((jar, Json(view)))
}

/// POST /auth/logout
pub async fn logout(jar: PrivateCookieJar) -> impl IntoResponse {
    info!("session ended");
    (end_session(jar), StatusCode::NO_CONTENT)
}

/// GET /auth/me
pub async fn me(user: CurrentUser) -> Json<UserView> {
    Json(user.view())
}
