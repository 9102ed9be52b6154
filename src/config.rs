use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use crate::error::PlatformError;
use serde::{Deserialize, Serialize};
use url::Url;

pub const ENV_PREFIX: &str = "PLATFORM_";
pub const CONFIG_FILE: &str = "config.toml";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful cybersecurity and data analysis expert assistant for the Multi-Domain Intelligence Platform.";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub basic: BasicConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub assistant: AssistantConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BasicConfig {
    pub listen_addr: String,
    pub database_url: String,
    pub loglevel: String,
    /// Master key for the private session cookie; must be at least 64 bytes.
    pub cookie_secret: Option<String>,
    pub insecure_cookie: bool,
    pub seed_demo_data: bool,
}

impl Default for BasicConfig {
    fn default() -> Self {
        Self {
            listen_addr: "0.0.0.0:8000".to_string(),
            database_url: "sqlite:data/platform.db".to_string(),
            loglevel: "info".to_string(),
            cookie_secret: None,
            insecure_cookie: false,
            seed_demo_data: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    pub bcrypt_cost: u32,
    pub min_password_len: usize,
    pub username_min_len: usize,
    pub username_max_len: usize,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: bcrypt::DEFAULT_COST,
            min_password_len: 6,
            username_min_len: 3,
            username_max_len: 20,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssistantConfig {
    /// Without a key the assistant answers locally and never touches the network.
    pub api_key: Option<String>,
    pub base_url: Url,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub system_prompt: String,
    pub requests_per_minute: u32,
    pub timeout_secs: u64,
}

impl Default for AssistantConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Url::parse("https://api.openai.com/v1").expect("static url is valid"),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.7,
            max_tokens: 500,
            system_prompt: DEFAULT_SYSTEM_PROMPT.to_string(),
            requests_per_minute: 20,
            timeout_secs: 30,
        }
    }
}

impl AssistantConfig {
    pub fn is_online(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.trim().is_empty())
    }
}

impl Config {
    /// Defaults, then `config.toml`, then `PLATFORM_*` environment variables.
    /// A source that fails to parse is an error, never a silent fallback.
    pub fn load() -> Result<Self, PlatformError> {
        Ok(Self::figment().extract()?)
    }

    pub fn figment() -> Figment {
        Figment::from(Serialized::defaults(Self::default()))
            .merge(Toml::file(CONFIG_FILE))
            .merge(Env::prefixed(ENV_PREFIX).split("__"))
    }
}
