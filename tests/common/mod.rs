#![allow(dead_code)]

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, Response, StatusCode, header},
};
use intel_platform::config::Config;
use intel_platform::db::PlatformStorage;
use intel_platform::server::{PlatformState, platform_router};
use serde_json::Value;
use std::{
    fs,
    path::PathBuf,
    time::{SystemTime, UNIX_EPOCH},
};
use tower::ServiceExt;

pub struct TestApp {
    pub app: Router,
    pub storage: PlatformStorage,
    db_path: PathBuf,
}

impl TestApp {
    pub async fn spawn(label: &str) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system time before UNIX_EPOCH")
            .as_nanos();

        let mut db_path = std::env::temp_dir();
        db_path.push(format!(
            "intel-platform-{label}-{}-{}.sqlite",
            std::process::id(),
            nanos
        ));

        let database_url = format!("sqlite:{}", db_path.display());
        let storage = PlatformStorage::connect(&database_url)
            .await
            .expect("failed to open test database");

        // Keep test behavior stable regardless of the repo's runtime `config.toml`.
        let mut cfg = Config::default();
        cfg.basic.insecure_cookie = true;
        cfg.auth.bcrypt_cost = 4;
        cfg.assistant.api_key = None;

        let state = PlatformState::new(storage.clone(), &cfg).expect("failed to build state");
        Self {
            app: platform_router(state),
            storage,
            db_path,
        }
    }

    pub async fn send(
        &self,
        method: &str,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> Response<Body> {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        let body = match body {
            Some(json) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };
        self.app
            .clone()
            .oneshot(builder.body(body).expect("failed to build request"))
            .await
            .expect("request failed")
    }

    /// Register `username` and log in, returning the session cookie pair.
    pub async fn login_as(&self, username: &str) -> String {
        let resp = self
            .send(
                "POST",
                "/auth/register",
                None,
                Some(serde_json::json!({
                    "username": username,
                    "password": "password123",
                    "confirm_password": "password123",
                    "role": "analyst"
                })),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let resp = self
            .send(
                "POST",
                "/auth/login",
                None,
                Some(serde_json::json!({"username": username, "password": "password123"})),
            )
            .await;
        assert_eq!(resp.status(), StatusCode::OK);
        session_cookie(&resp).expect("login did not set a session cookie")
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.db_path);
    }
}

pub fn session_cookie(resp: &Response<Body>) -> Option<String> {
    resp.headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .find(|v| v.starts_with("platform_session="))
        .and_then(|v| v.split(';').next())
        .map(str::to_string)
}

pub async fn body_json(resp: Response<Body>) -> Value {
    let body = to_bytes(resp.into_body(), usize::MAX)
        .await
        .expect("failed to read response body");
    serde_json::from_slice(&body).expect("response body was not json")
}
