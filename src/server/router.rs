use crate::api::ChatCompletionApi;
use crate::config::Config;
use crate::db::PlatformStorage;
use crate::error::PlatformError;
use crate::handlers::{assistant, auth, dashboard, datasets, incidents, tickets};
use crate::service::{Assistant, AuthManager};
use axum::{
    Router,
    extract::{DefaultBodyLimit, FromRef},
    routing::{get, post, put},
};
use axum_extra::extract::cookie::Key;
use tracing::warn;

/// JSON request bodies larger than this are rejected with 413.
pub const BODY_LIMIT: usize = 64 * 1024;

#[derive(Clone)]
pub struct PlatformState {
    pub storage: PlatformStorage,
    pub auth: AuthManager,
    pub assistant: Assistant,
    pub insecure_cookie: bool,
    key: Key,
}

impl PlatformState {
    pub fn new(storage: PlatformStorage, cfg: &Config) -> Result<Self, PlatformError> {
        let auth = AuthManager::new(storage.clone(), cfg.auth.clone());
        let api = ChatCompletionApi::new(cfg.assistant.clone())?;
        let assistant = Assistant::new(
            storage.clone(),
            api,
            cfg.assistant.system_prompt.clone(),
        );
        Ok(Self {
            storage,
            auth,
            assistant,
            insecure_cookie: cfg.basic.insecure_cookie,
            key: session_key(cfg.basic.cookie_secret.as_deref()),
        })
    }
}

/// Sessions only survive restarts when a secret of at least 64 bytes is configured.
fn session_key(secret: Option<&str>) -> Key {
    match secret.map(|s| Key::try_from(s.as_bytes())) {
        Some(Ok(key)) => key,
        Some(Err(_)) => {
            warn!("cookie_secret shorter than 64 bytes, using a random session key");
            Key::generate()
        }
        None => {
            warn!("no cookie_secret configured, sessions end on restart");
            Key::generate()
        }
    }
}

impl FromRef<PlatformState> for Key {
    fn from_ref(state: &PlatformState) -> Self {
        state.key.clone()
    }
}

pub fn platform_router(state: PlatformState) -> Router {
    Router::new()
        .route("/health", get(dashboard::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/me", get(auth::me))
        .route("/dashboard", get(dashboard::dashboard))
        .route(
            "/incidents",
            get(incidents::list_incidents).post(incidents::create_incident),
        )
        .route("/incidents/analysis", get(incidents::incident_analysis))
        .route(
            "/incidents/{id}",
            get(incidents::get_incident)
                .patch(incidents::update_incident)
                .delete(incidents::delete_incident),
        )
        .route(
            "/tickets",
            get(tickets::list_tickets).post(tickets::create_ticket),
        )
        .route("/tickets/analysis", get(tickets::ticket_analysis))
        .route(
            "/tickets/{id}",
            get(tickets::get_ticket)
                .patch(tickets::update_ticket)
                .delete(tickets::delete_ticket),
        )
        .route("/tickets/{id}/close", post(tickets::close_ticket))
        .route("/tickets/{id}/reopen", post(tickets::reopen_ticket))
        .route("/tickets/{id}/assign", post(tickets::assign_ticket))
        .route(
            "/tickets/{id}/updates",
            get(tickets::list_ticket_updates).post(tickets::add_ticket_update),
        )
        .route(
            "/datasets",
            get(datasets::list_datasets).post(datasets::create_dataset),
        )
        .route("/datasets/analysis", get(datasets::dataset_analysis))
        .route(
            "/datasets/{id}",
            get(datasets::get_dataset)
                .patch(datasets::update_dataset)
                .delete(datasets::delete_dataset),
        )
        .route("/assistant", get(assistant::general_view))
        .route("/assistant/prompt", put(assistant::set_prompt))
        .route(
            "/assistant/history",
            axum::routing::delete(assistant::clear_general),
        )
        .route("/assistant/chat", post(assistant::general_chat))
        .route(
            "/assistant/{channel}",
            get(assistant::channel_view)
                .post(assistant::channel_chat)
                .delete(assistant::channel_clear),
        )
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
        .with_state(state)
}
