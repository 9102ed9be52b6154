use crate::middleware::{ApiJson, ApiPath, CurrentUser};
use crate::service::assistant::Conversation;
use crate::types::{Channel, ConversationStats};
use crate::{PlatformError, server::router::PlatformState};
use axum::{
    Json,
    extract::State,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

#[derive(Debug, Deserialize)]
pub struct PromptForm {
    pub prompt: String,
}

#[derive(Debug, Deserialize)]
pub struct ChatForm {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ChatReply {
    pub channel: Channel,
    pub reply: String,
    pub stats: ConversationStats,
}

#[derive(Debug, Serialize)]
pub struct AssistantView {
    pub online: bool,
    #[serde(flatten)]
    pub conversation: Conversation,
}

async fn view(
    state: &PlatformState,
    user: &CurrentUser,
    channel: Channel,
) -> Result<Json<AssistantView>, PlatformError> {
    let conversation = state.assistant.conversation(&user.username, channel).await?;
    Ok(Json(AssistantView {
        online: state.assistant.is_online(),
        conversation,
    }))
}

async fn chat(
    state: &PlatformState,
    user: &CurrentUser,
    channel: Channel,
    message: &str,
) -> Result<Json<ChatReply>, PlatformError> {
    let reply = state
        .assistant
        .send_message(&user.username, channel, message)
        .await?;
    let stats = state.assistant.stats(&user.username, channel).await?;
    Ok(Json(ChatReply {
        channel,
        reply,
        stats,
    }))
}

async fn clear(
    state: &PlatformState,
    user: &CurrentUser,
    channel: Channel,
) -> Result<Json<Value>, PlatformError> {
    let removed = state.assistant.clear_history(&user.username, channel).await?;
    Ok(Json(json!({"channel": channel, "removed": removed})))
}

/// GET /assistant
pub async fn general_view(
    State(state): State<PlatformState>,
    user: CurrentUser,
) -> Result<Json<AssistantView>, PlatformError> {
    view(&state, &user, Channel::General).await
}

/// PUT /assistant/prompt
pub async fn set_prompt(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<PromptForm>,
) -> Result<Json<Value>, PlatformError> {
    state
        .assistant
        .set_system_prompt(&user.username, &form.prompt)
        .await?;
    let prompt = state.assistant.system_prompt(&user.username).await?;
    Ok(Json(json!({"system_prompt": prompt})))
}

/// DELETE /assistant/history
pub async fn clear_general(
    State(state): State<PlatformState>,
    user: CurrentUser,
) -> Result<Json<Value>, PlatformError> {
    clear(&state, &user, Channel::General).await
}

/// POST /assistant/chat
pub async fn general_chat(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiJson(form): ApiJson<ChatForm>,
) -> Result<Json<ChatReply>, PlatformError> {
    chat(&state, &user, Channel::General, &form.message).await
}

/// GET /assistant/{channel}
pub async fn channel_view(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiPath(channel): ApiPath<Channel>,
) -> Result<Json<AssistantView>, PlatformError> {
    view(&state, &user, channel).await
}

/// POST /assistant/{channel}
pub async fn channel_chat(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiPath(channel): ApiPath<Channel>,
    ApiJson(form): ApiJson<ChatForm>,
) -> Result<Json<ChatReply>, PlatformError> {
    chat(&state, &user, channel, &form.message).await
}

/// DELETE /assistant/{channel}
pub async fn channel_clear(
    State(state): State<PlatformState>,
    user: CurrentUser,
    ApiPath(channel): ApiPath<Channel>,
) -> Result<Json<Value>, PlatformError> {
    clear(&state, &user, channel).await
}
