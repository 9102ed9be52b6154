use crate::error::PlatformError;
use crate::types::UserView;
use axum::extract::{FromRef, FromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::cookie::{Cookie, Key, PrivateCookieJar, SameSite};
use time::Duration;
use tracing::debug;

pub const SESSION_COOKIE: &str = "platform_session";

const SESSION_HOURS: i64 = 12;

/// The logged-in user, read from the encrypted session cookie.
///
/// Rejects with 401 when the cookie is missing or cannot be decrypted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    pub username: String,
    pub role: String,
}

impl From<UserView> for CurrentUser {
    fn from(view: UserView) -> Self {
        Self {
            username: view.username,
            role: view.role,
        }
    }
}

impl CurrentUser {
    pub fn view(&self) -> UserView {
        UserView {
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    Key: FromRef<S>,
{
    type Rejection = PlatformError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let jar = PrivateCookieJar::<Key>::from_request_parts(parts, state)
            .await
            .map_err(|_| PlatformError::Unauthorized)?;
        let Some(cookie) = jar.get(SESSION_COOKIE) else {
            return Err(PlatformError::Unauthorized);
        };
        match serde_json::from_str::<UserView>(cookie.value()) {
            Ok(view) => Ok(view.into()),
            Err(e) => {
                debug!(error = %e, "discarding malformed session cookie");
                Err(PlatformError::Unauthorized)
            }
        }
    }
}

/// Add the session cookie for `user` to `jar`.
pub fn start_session(
    jar: PrivateCookieJar,
    user: &UserView,
    insecure: bool,
) -> Result<PrivateCookieJar, PlatformError> {
    let value = serde_json::to_string(user)?;
    Ok(jar.add(session_cookie(value, insecure)))
}

pub fn end_session(jar: PrivateCookieJar) -> PrivateCookieJar {
    jar.remove(clear_cookie())
}

fn session_cookie(value: String, insecure: bool) -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(!insecure)
        .same_site(SameSite::Lax)
        .max_age(Duration::hours(SESSION_HOURS))
        .build()
}

fn clear_cookie() -> Cookie<'static> {
    Cookie::build(Cookie::new(SESSION_COOKIE, ""))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .build()
}
