use crate::db::sqlite::PlatformStorage;
use crate::error::PlatformError;
use crate::types::{Channel, ChatMessage, ChatRole};
use tracing::warn;

impl PlatformStorage {
    /// Append a finished exchange in one transaction so history never holds
    /// a question without its answer.
    pub async fn append_exchange(
        &self,
        username: &str,
        channel: Channel,
        messages: &[ChatMessage],
    ) -> Result<(), PlatformError> {
        let mut tx = self.pool().begin().await?;
        for message in messages {
            sqlx::query(
                "INSERT INTO chat_messages (username, channel, role, content) VALUES (?, ?, ?, ?)",
            )
            .bind(username)
            .bind(channel.as_str())
            .bind(message.role.as_str())
            .bind(&message.content)
            .execute(&mut *tx)
            .await?;
        }
        tx.commit().await?;
        Ok(())
    }

    /// Conversation in the order it happened.
    pub async fn chat_history(
        &self,
        username: &str,
        channel: Channel,
    ) -> Result<Vec<ChatMessage>, PlatformError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            "SELECT role, content FROM chat_messages WHERE username = ? AND channel = ? ORDER BY id",
        )
        .bind(username)
        .bind(channel.as_str())
        .fetch_all(self.pool())
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|(role, content)| match ChatRole::parse(&role) {
                Some(role) => Some(ChatMessage::new(role, content)),
                None => {
                    warn!(username, role = %role, "skipping chat message with unknown role");
                    None
                }
            })
            .collect())
    }

    /// Returns how many messages were removed.
    pub async fn clear_chat_history(
        &self,
        username: &str,
        channel: Channel,
    ) -> Result<u64, PlatformError> {
        let result = sqlx::query("DELETE FROM chat_messages WHERE username = ? AND channel = ?")
            .bind(username)
            .bind(channel.as_str())
            .execute(self.pool())
            .await?;
        Ok(result.rows_affected())
    }

    pub async fn system_prompt_for(&self, username: &str) -> Result<Option<String>, PlatformError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT system_prompt FROM assistant_settings WHERE username = ?")
                .bind(username)
                .fetch_optional(self.pool())
                .await?;
        Ok(row.map(|(prompt,)| prompt))
    }

    pub async fn set_system_prompt(&self, username: &str, prompt: &str) -> Result<(), PlatformError> {
        sqlx::query(
            r#"INSERT INTO assistant_settings (username, system_prompt) VALUES (?, ?)
               ON CONFLICT(username) DO UPDATE SET system_prompt = excluded.system_prompt"#,
        )
        .bind(username)
        .bind(prompt)
        .execute(self.pool())
        .await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::sqlite::memory_storage;

    #[tokio::test]
    async fn history_is_per_user_and_channel() {
        let storage = memory_storage().await;
        storage
            .append_exchange(
                "alice",
                Channel::General,
                &[ChatMessage::user("hi"), ChatMessage::assistant("hello")],
            )
            .await
            .unwrap();
        storage
            .append_exchange("alice", Channel::Cybersecurity, &[ChatMessage::user("threats?")])
            .await
            .unwrap();

        let general = storage.chat_history("alice", Channel::General).await.unwrap();
        assert_eq!(general, vec![ChatMessage::user("hi"), ChatMessage::assistant("hello")]);
        assert!(storage.chat_history("bob", Channel::General).await.unwrap().is_empty());

        assert_eq!(storage.clear_chat_history("alice", Channel::General).await.unwrap(), 2);
        assert_eq!(
            storage.chat_history("alice", Channel::Cybersecurity).await.unwrap().len(),
            1
        );
    }

    #[tokio::test]
    async fn system_prompt_upsert() {
        let storage = memory_storage().await;
        assert_eq!(storage.system_prompt_for("alice").await.unwrap(), None);
        storage.set_system_prompt("alice", "be brief").await.unwrap();
        storage.set_system_prompt("alice", "be thorough").await.unwrap();
        assert_eq!(
            storage.system_prompt_for("alice").await.unwrap().as_deref(),
            Some("be thorough")
        );
    }
}
