use crate::service::hasher::PasswordHasher;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

/// A platform account as stored in `users`.
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct User {
    username: String,
    password_hash: String,
    role: String,
}

impl User {
    pub fn new(
        username: impl Into<String>,
        password_hash: impl Into<String>,
        role: impl Into<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password_hash: password_hash.into(),
            role: role.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn password_hash(&self) -> &str {
        &self.password_hash
    }

    pub fn verify_password(&self, plain: &str, hasher: &PasswordHasher) -> bool {
        hasher.verify(plain, &self.password_hash)
    }

    pub fn view(&self) -> UserView {
        UserView {
            username: self.username.clone(),
            role: self.role.clone(),
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "User({}, role={})", self.username, self.role)
    }
}

/// What a client may see of a user; the hash never leaves the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserView {
    pub username: String,
    pub role: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Analyst,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Analyst => "analyst",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_hides_hash() {
        let user = User::new("alice", "$2b$04$secret", "admin");
        let shown = user.to_string();
        assert_eq!(shown, "User(alice, role=admin)");
        assert!(!shown.contains("secret"));
    }

    #[test]
    fn verify_password_delegates_to_hasher() {
        let hasher = PasswordHasher::new(bcrypt::DEFAULT_COST);
        // sha256("password123")
        let user = User::new(
            "bob",
            "ef92b778bafe771e89245b89ecbc08a44a4e166c06659911881f383d4473e94f",
            "analyst",
        );
        assert!(user.verify_password("password123", &hasher));
        assert!(!user.verify_password("password124", &hasher));
    }
}
