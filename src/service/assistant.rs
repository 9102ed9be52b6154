use crate::api::ChatCompletionApi;
use crate::db::PlatformStorage;
use crate::error::PlatformError;
use crate::service::context::context_for;
use crate::types::{Channel, ChatMessage, ConversationStats};
use serde::Serialize;
use tracing::info;

fn domain_prompt(channel: Channel) -> Option<&'static str> {
    match channel {
        Channel::General => None,
        Channel::Cybersecurity => Some(
            "You are a Cybersecurity AI Assistant. Help analyze security incidents and provide threat intelligence.",
        ),
        Channel::DataScience => Some(
            "You are a Data Science AI Assistant. Help analyze datasets and provide data insights.",
        ),
        Channel::ItOperations => Some(
            "You are an IT Operations AI Assistant. Help analyze ticket data and provide insights.",
        ),
    }
}

/// Snapshot of one conversation thread.
#[derive(Debug, Clone, Serialize)]
pub struct Conversation {
    pub channel: Channel,
    pub system_prompt: String,
    pub history: Vec<ChatMessage>,
    pub stats: ConversationStats,
}

/// Chat front end: builds prompts, calls the completion API and keeps the
/// per-user, per-channel history in storage.
#[derive(Clone)]
pub struct Assistant {
    storage: PlatformStorage,
    api: ChatCompletionApi,
    default_prompt: String,
}

impl Assistant {
    pub fn new(storage: PlatformStorage, api: ChatCompletionApi, default_prompt: String) -> Self {
        Self {
            storage,
            api,
            default_prompt,
        }
    }

    pub fn is_online(&self) -> bool {
        self.api.is_online()
    }

    /// The user's stored prompt for the general channel, or the configured default.
    pub async fn system_prompt(&self, username: &str) -> Result<String, PlatformError> {
        Ok(self
            .storage
            .system_prompt_for(username)
            .await?
            .unwrap_or_else(|| self.default_prompt.clone()))
    }

    pub async fn set_system_prompt(&self, username: &str, prompt: &str) -> Result<(), PlatformError> {
        let prompt = prompt.trim();
        if prompt.is_empty() {
            return Err(PlatformError::validation("System prompt cannot be empty."));
        }
        self.storage.set_system_prompt(username, prompt).await?;
        info!(username, "assistant system prompt updated");
        Ok(())
    }

    pub async fn history(
        &self,
        username: &str,
        channel: Channel,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        self.storage.chat_history(username, channel).await
    }

    pub async fn clear_history(&self, username: &str, channel: Channel) -> Result<u64, PlatformError> {
        let removed = self.storage.clear_chat_history(username, channel).await?;
        info!(username, %channel, removed, "chat history cleared");
        Ok(removed)
    }

    pub async fn stats(
        &self,
        username: &str,
        channel: Channel,
    ) -> Result<ConversationStats, PlatformError> {
        Ok(ConversationStats::of(&self.history(username, channel).await?))
    }

    pub async fn conversation(
        &self,
        username: &str,
        channel: Channel,
    ) -> Result<Conversation, PlatformError> {
        let system_prompt = match domain_prompt(channel) {
            Some(prompt) => prompt.to_string(),
            None => self.system_prompt(username).await?,
        };
        let history = self.history(username, channel).await?;
        let stats = ConversationStats::of(&history);
        Ok(Conversation {
            channel,
            system_prompt,
            history,
            stats,
        })
    }

    /// Send `text` on `channel` and return the reply.
    ///
    /// The exchange is stored only after the completion succeeds.
    pub async fn send_message(
        &self,
        username: &str,
        channel: Channel,
        text: &str,
    ) -> Result<String, PlatformError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PlatformError::validation("Message cannot be empty."));
        }

        let messages = self.build_messages(username, channel, text).await?;
        let reply = self.api.complete(&messages).await?;

        self.storage
            .append_exchange(
                username,
                channel,
                &[ChatMessage::user(text), ChatMessage::assistant(reply.as_str())],
            )
            .await?;
        info!(username, %channel, online = self.is_online(), "assistant replied");
        Ok(reply)
    }

    async fn build_messages(
        &self,
        username: &str,
        channel: Channel,
        text: &str,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        if let Some(prompt) = domain_prompt(channel) {
            let context = context_for(&self.storage, channel)
                .await?
                .unwrap_or_default();
            return Ok(vec![
                ChatMessage::system(format!("{prompt} {context}")),
                ChatMessage::user(text),
            ]);
        }

        let mut messages = vec![ChatMessage::system(self.system_prompt(username).await?)];
        messages.extend(self.history(username, channel).await?);
        messages.push(ChatMessage::user(text));
        Ok(messages)
    }
}
