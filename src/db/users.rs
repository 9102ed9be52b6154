use crate::db::sqlite::PlatformStorage;
use crate::error::PlatformError;
use crate::types::User;

impl PlatformStorage {
    /// Insert a new account. A duplicate username surfaces as a UNIQUE violation.
    pub async fn insert_user(
        &self,
        username: &str,
        password_hash: &str,
        role: &str,
    ) -> Result<i64, PlatformError> {
        let result = sqlx::query("INSERT INTO users (username, password_hash, role) VALUES (?, ?, ?)")
            .bind(username)
            .bind(password_hash)
            .bind(role)
            .execute(self.pool())
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_user(&self, username: &str) -> Result<Option<User>, PlatformError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT username, password_hash, role FROM users WHERE username = ?",
        )
        .bind(username)
        .fetch_optional(self.pool())
        .await?;
        Ok(user)
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, PlatformError> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT 1 FROM users WHERE username = ?")
            .bind(username)
            .fetch_optional(self.pool())
            .await?;
        Ok(row.is_some())
    }

    pub async fn count_users(&self) -> Result<i64, PlatformError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM users")
            .fetch_one(self.pool())
            .await?;
        Ok(count)
    }

    pub async fn update_password_hash(
        &self,
        username: &str,
        password_hash: &str,
    ) -> Result<(), PlatformError> {
        sqlx::query("UPDATE users SET password_hash = ? WHERE username = ?")
            .bind(password_hash)
            .bind(username)
            .execute(self.pool())
            .await?;
        Ok(())
    }
}
