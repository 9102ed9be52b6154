use crate::config::AuthConfig;
use crate::db::PlatformStorage;
use crate::error::PlatformError;
use crate::service::hasher::PasswordHasher;
use crate::types::{Role, User};
use tracing::{info, warn};

/// Registration and login against the `users` table.
#[derive(Clone)]
pub struct AuthManager {
    storage: PlatformStorage,
    hasher: PasswordHasher,
    rules: AuthConfig,
}

impl AuthManager {
    pub fn new(storage: PlatformStorage, rules: AuthConfig) -> Self {
        let hasher = PasswordHasher::new(rules.bcrypt_cost);
        Self {
            storage,
            hasher,
            rules,
        }
    }

    pub fn hasher(&self) -> PasswordHasher {
        self.hasher
    }

    /// Create an account. The username is trimmed before any check.
    pub async fn register_user(
        &self,
        username: &str,
        password: &str,
        role: Role,
    ) -> Result<User, PlatformError> {
        let username = username.trim();
        self.validate(username, password)?;

        if self.storage.user_exists(username).await? {
            return Err(PlatformError::UsernameTaken);
        }

        let hasher = self.hasher;
        let plain = password.to_string();
        let password_hash = tokio::task::spawn_blocking(move || hasher.hash(&plain)).await??;

        // a concurrent registration can still win the race to the UNIQUE index
        match self
            .storage
            .insert_user(username, &password_hash, role.as_str())
            .await
        {
            Ok(_) => {}
            Err(e) if e.is_unique_violation() => return Err(PlatformError::UsernameTaken),
            Err(e) => return Err(e),
        }

        info!(username, role = role.as_str(), "user registered");
        Ok(User::new(username, password_hash, role.as_str()))
    }

    /// `None` when the user is unknown or the password is wrong.
    pub async fn login_user(
        &self,
        username: &str,
        password: &str,
    ) -> Result<Option<User>, PlatformError> {
        let Some(user) = self.storage.find_user(username.trim()).await? else {
            return Ok(None);
        };

        let hasher = self.hasher;
        let plain = password.to_string();
        let stored = user.password_hash().to_string();
        let verified =
            tokio::task::spawn_blocking(move || hasher.verify(&plain, &stored)).await?;
        if !verified {
            warn!(username = user.username(), "login rejected");
            return Ok(None);
        }

        if !hasher.needs_rehash(user.password_hash()) {
            info!(username = user.username(), "user logged in");
            return Ok(Some(user));
        }

        let plain = password.to_string();
        let upgraded = tokio::task::spawn_blocking(move || hasher.hash(&plain)).await??;
        self.storage
            .update_password_hash(user.username(), &upgraded)
            .await?;
        info!(username = user.username(), "legacy password hash upgraded");
        Ok(Some(User::new(user.username(), upgraded, user.role())))
    }

    pub async fn get_user_by_username(&self, username: &str) -> Result<Option<User>, PlatformError> {
        self.storage.find_user(username).await
    }

    pub async fn user_exists(&self, username: &str) -> Result<bool, PlatformError> {
        self.storage.user_exists(username).await
    }

    fn validate(&self, username: &str, password: &str) -> Result<(), PlatformError> {
        let len = username.chars().count();
        if len < self.rules.username_min_len || len > self.rules.username_max_len {
            return Err(PlatformError::validation(format!(
                "Username must be between {} and {} characters.",
                self.rules.username_min_len, self.rules.username_max_len
            )));
        }
        if password.chars().count() < self.rules.min_password_len {
            return Err(PlatformError::validation(format!(
                "Password must be at least {} characters.",
                self.rules.min_password_len
            )));
        }
        Ok(())
    }
}
