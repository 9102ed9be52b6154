use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    System,
    User,
    Assistant,
}

impl ChatRole {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "system" => Some(Self::System),
            "user" => Some(Self::User),
            "assistant" => Some(Self::Assistant),
            _ => None,
        }
    }
}

/// One turn of a conversation, in the shape chat-completion APIs expect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(ChatRole::System, content)
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(ChatRole::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(ChatRole::Assistant, content)
    }
}

/// Separate conversation threads: the free-form assistant and one per domain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Channel {
    General,
    Cybersecurity,
    DataScience,
    ItOperations,
}

impl Channel {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Cybersecurity => "cybersecurity",
            Self::DataScience => "data_science",
            Self::ItOperations => "it_operations",
        }
    }

    pub fn is_domain(self) -> bool {
        !matches!(self, Self::General)
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ConversationStats {
    pub messages: usize,
    pub user_messages: usize,
    pub assistant_messages: usize,
}

impl ConversationStats {
    pub fn of(history: &[ChatMessage]) -> Self {
        history.iter().fold(Self::default(), |mut acc, m| {
            acc.messages += 1;
            match m.role {
                ChatRole::User => acc.user_messages += 1,
                ChatRole::Assistant => acc.assistant_messages += 1,
                ChatRole::System => {}
            }
            acc
        })
    }
}
