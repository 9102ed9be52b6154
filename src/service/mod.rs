pub mod assistant;
pub mod auth;
pub mod context;
pub mod hasher;

pub use assistant::Assistant;
pub use auth::AuthManager;
pub use hasher::PasswordHasher;
