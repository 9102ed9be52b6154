//! A local stand-in for a `chat/completions` endpoint that answers every call
//! with one fixed status and body, counting how often it was hit.

use crate::config::AssistantConfig;
use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use serde_json::Value;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::net::TcpListener;
use url::Url;

#[derive(Clone)]
struct Reply {
    status: StatusCode,
    body: Value,
    hits: Arc<AtomicUsize>,
}

async fn completions(State(reply): State<Reply>) -> (StatusCode, Json<Value>) {
    reply.hits.fetch_add(1, Ordering::SeqCst);
    (reply.status, Json(reply.body))
}

pub(crate) struct FakeUpstream {
    pub base_url: Url,
    hits: Arc<AtomicUsize>,
}

impl FakeUpstream {
    pub async fn spawn(status: StatusCode, body: Value) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(Reply {
                status,
                body,
                hits: hits.clone(),
            });
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        Self {
            base_url: Url::parse(&format!("http://{addr}/v1")).unwrap(),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// An online config pointed at this server.
    pub fn config(&self) -> AssistantConfig {
        AssistantConfig {
            api_key: Some("sk-test".to_string()),
            base_url: self.base_url.clone(),
            requests_per_minute: 600,
            timeout_secs: 5,
            ..AssistantConfig::default()
        }
    }
}
