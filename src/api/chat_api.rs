use crate::config::AssistantConfig;
use crate::error::PlatformError;
use crate::types::{ChatMessage, ChatRole};
use backon::{ExponentialBuilder, Retryable};
use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use serde::{Deserialize, Serialize};
use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

const OFFLINE_PREVIEW_CHARS: usize = 50;

/// At most three attempts: the first call plus two retries.
fn default_retry_policy() -> ExponentialBuilder {
    ExponentialBuilder::default()
        .with_min_delay(Duration::from_secs(1))
        .with_max_delay(Duration::from_secs(3))
        .with_max_times(2)
        .with_jitter()
}

#[derive(Debug, Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    #[serde(default)]
    choices: Vec<CompletionChoice>,
}

#[derive(Debug, Deserialize)]
struct CompletionChoice {
    message: CompletionMessage,
}

#[derive(Debug, Deserialize)]
struct CompletionMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Client for an OpenAI-compatible `chat/completions` endpoint.
///
/// Without an API key the client stays offline and echoes a canned reply.
#[derive(Clone)]
pub struct ChatCompletionApi {
    client: reqwest::Client,
    limiter: Arc<DefaultDirectRateLimiter>,
    retry_policy: ExponentialBuilder,
    config: AssistantConfig,
}

impl ChatCompletionApi {
    pub fn new(config: AssistantConfig) -> Result<Self, PlatformError> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("intel-platform/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let limiter = Arc::new(RateLimiter::direct(Quota::per_minute(per_minute)));
        Ok(Self {
            client,
            limiter,
            retry_policy: default_retry_policy(),
            config,
        })
    }

    pub fn with_retry_policy(mut self, retry_policy: ExponentialBuilder) -> Self {
        self.retry_policy = retry_policy;
        self
    }

    pub fn is_online(&self) -> bool {
        self.config.is_online()
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Complete a conversation and return the assistant's text.
    pub async fn complete(&self, messages: &[ChatMessage]) -> Result<String, PlatformError> {
        let Some(api_key) = self.config.api_key.as_deref().filter(|k| !k.trim().is_empty()) else {
            let last = messages
                .iter()
                .rev()
                .find(|m| m.role == ChatRole::User)
                .map(|m| m.content.as_str())
                .unwrap_or_default();
            return Ok(offline_reply(last));
        };

        let url = completions_url(&self.config.base_url)?;
        let body = CompletionRequest {
            model: &self.config.model,
            messages,
            temperature: self.config.temperature,
            max_tokens: self.config.max_tokens,
        };

        let resp = (|| async {
            self.limiter.until_ready().await;
            let resp = self
                .client
                .post(url.clone())
                .bearer_auth(api_key)
                .json(&body)
                .send()
                .await?;
            let status = resp.status();
            if !status.is_success() {
                return Err(PlatformError::UpstreamStatus(status));
            }
            Ok(resp.json::<CompletionResponse>().await?)
        })
        .retry(self.retry_policy)
        .when(|e: &PlatformError| e.is_retryable())
        .notify(|err, dur: Duration| {
            warn!("chat completion retrying after error {}, sleeping {:?}", err, dur);
        })
        .await?;

        let content = resp
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .filter(|c| !c.trim().is_empty())
            .ok_or(PlatformError::EmptyCompletion)?;
        debug!(model = %self.config.model, chars = content.len(), "chat completion received");
        Ok(content)
    }
}

fn completions_url(base: &Url) -> Result<Url, PlatformError> {
    Ok(Url::parse(&format!(
        "{}/chat/completions",
        base.as_str().trim_end_matches('/')
    ))?)
}

/// Canned reply used when no API key is configured.
pub fn offline_reply(message: &str) -> String {
    let preview: String = message.chars().take(OFFLINE_PREVIEW_CHARS).collect();
    format!("[AI Assistant] Processing: {preview}...")
}

#[cfg(test)]
pub(crate) fn fast_retry_policy() -> ExponentialBuilder {
    default_retry_policy()
        .with_min_delay(Duration::from_millis(1))
        .with_max_delay(Duration::from_millis(5))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_upstream::FakeUpstream;
    use axum::http::StatusCode;
    use serde_json::json;

    async fn online_api(upstream: &FakeUpstream) -> ChatCompletionApi {
        ChatCompletionApi::new(upstream.config())
            .unwrap()
            .with_retry_policy(fast_retry_policy())
    }

    #[test]
    fn offline_reply_truncates_on_char_boundary() {
        assert_eq!(offline_reply("hello"), "[AI Assistant] Processing: hello...");
        let long = "é".repeat(80);
        let reply = offline_reply(&long);
        assert_eq!(reply.matches('é').count(), 50);
    }

    #[test]
    fn completions_url_keeps_version_segment() {
        let base = Url::parse("https://api.openai.com/v1/").unwrap();
        assert_eq!(
            completions_url(&base).unwrap().as_str(),
            "https://api.openai.com/v1/chat/completions"
        );
    }

    #[tokio::test]
    async fn offline_complete_skips_network() {
        let api = ChatCompletionApi::new(AssistantConfig::default()).unwrap();
        assert!(!api.is_online());
        let reply = api
            .complete(&[ChatMessage::system("sys"), ChatMessage::user("What is phishing?")])
            .await
            .unwrap();
        assert_eq!(reply, "[AI Assistant] Processing: What is phishing?...");
    }

    #[test]
    fn request_serializes_openai_shape() {
        let messages = [ChatMessage::user("hi")];
        let body = CompletionRequest {
            model: "gpt-4o-mini",
            messages: &messages,
            temperature: 0.5,
            max_tokens: 500,
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["messages"][0]["role"], "user");
        assert_eq!(json["max_tokens"], 500);
    }

    #[tokio::test]
    async fn online_complete_returns_first_choice() {
        let upstream = FakeUpstream::spawn(
            StatusCode::OK,
            json!({"choices": [{"message": {"role": "assistant", "content": "hello"}}]}),
        )
        .await;
        let api = online_api(&upstream).await;
        assert!(api.is_online());
        let reply = api.complete(&[ChatMessage::user("hi")]).await.unwrap();
        assert_eq!(reply, "hello");
        assert_eq!(upstream.hits(), 1);
    }

    #[tokio::test]
    async fn server_errors_stop_after_three_attempts() {
        let upstream = FakeUpstream::spawn(StatusCode::SERVICE_UNAVAILABLE, json!({})).await;
        let api = online_api(&upstream).await;
        let err = api.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(
            err,
            PlatformError::UpstreamStatus(StatusCode::SERVICE_UNAVAILABLE)
        ));
        assert_eq!(upstream.hits(), 3);
    }

    #[tokio::test]
    async fn client_errors_are_not_retried() {
        for status in [StatusCode::TOO_MANY_REQUESTS, StatusCode::UNAUTHORIZED] {
            let upstream = FakeUpstream::spawn(status, json!({})).await;
            let api = online_api(&upstream).await;
            let err = api.complete(&[ChatMessage::user("hi")]).await.unwrap_err();
            assert!(matches!(err, PlatformError::UpstreamStatus(code) if code == status));
            assert_eq!(upstream.hits(), 1);
        }
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let upstream = FakeUpstream::spawn(StatusCode::OK, json!({"choices": []})).await;
        let api = online_api(&upstream).await;
        assert!(matches!(
            api.complete(&[ChatMessage::user("hi")]).await,
            Err(PlatformError::EmptyCompletion)
        ));
    }
}
