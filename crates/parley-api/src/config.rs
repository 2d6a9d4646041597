use config::{Config as ConfigLoader, ConfigError, Environment, File};
use parley_types::WaiterConfig;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub cors: CorsConfig,
    pub mongodb: MongoDbConfig,
    pub llm: LlmConfig,
    #[serde(default)]
    pub waiter: WaiterSettings,
    pub policy: PolicyConfig,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default)]
    pub mail: MailConfig,
    pub logging: LoggingConfig,

    // Secrets (from ENV only)
    #[serde(default)]
    pub openai_api_key: String,
    #[serde(default)]
    pub assistant_id: String,
    #[serde(default)]
    pub jwt_key: String,
    #[serde(default)]
    pub mongodb_uri: Option<String>,
    #[serde(default)]
    pub email_user: Option<String>,
    #[serde(default)]
    pub email_pass: Option<String>,
    #[serde(default)]
    pub consultancy_email: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Upper bound for a whole request, including the run wait
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default = "default_upload_limit_bytes")]
    pub upload_limit_bytes: usize,
}

fn default_request_timeout_secs() -> u64 {
    60
}

fn default_upload_limit_bytes() -> usize {
    10 * 1024 * 1024
}

#[derive(Debug, Clone, Deserialize)]
pub struct CorsConfig {
    pub enabled: bool,
    pub origins: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MongoDbConfig {
    pub database: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LlmConfig {
    /// Chat model behind intent classification, policy matching and upload checks
    pub classifier_model: String,
    #[serde(default)]
    pub base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct WaiterSettings {
    pub poll_interval_ms: u64,
    pub max_attempts: u32,
    pub max_consecutive_errors: u32,
    pub late_completion_attempts: u32,
}

impl Default for WaiterSettings {
    fn default() -> Self {
        let defaults = WaiterConfig::default();
        Self {
            poll_interval_ms: defaults.poll_interval.as_millis() as u64,
            max_attempts: defaults.max_attempts,
            max_consecutive_errors: defaults.max_consecutive_errors,
            late_completion_attempts: defaults.late_completion_attempts,
        }
    }
}

impl From<&WaiterSettings> for WaiterConfig {
    fn from(settings: &WaiterSettings) -> Self {
        WaiterConfig::new()
            .with_poll_interval(Duration::from_millis(settings.poll_interval_ms))
            .with_max_attempts(settings.max_attempts)
            .with_max_consecutive_errors(settings.max_consecutive_errors)
            .with_late_completion_attempts(settings.late_completion_attempts)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PolicyConfig {
    pub catalog_path: String,
    /// Prefix of every policy link, the record id is appended
    pub public_base_url: String,
    /// Page listing the whole catalog, offered when nothing matches
    pub index_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AuthConfig {
    pub token_ttl_secs: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            token_ttl_secs: 3600,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_team_name")]
    pub team_name: String,
}

fn default_team_name() -> String {
    "Healthematics".to_string()
}

impl Default for MailConfig {
    fn default() -> Self {
        Self {
            smtp_host: None,
            team_name: default_team_name(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String,
}

impl Config {
    /// Load configuration from TOML files and environment variables
    ///
    /// Hierarchy (weakest to strongest):
    /// 1. config/default.toml
    /// 2. config/{ENV}.toml (if ENV is set)
    /// 3. Environment variables (with SERVER_, MONGODB_, LLM_, etc. prefixes)
    pub fn load() -> Result<Self, ConfigError> {
        let env = std::env::var("ENV").unwrap_or_else(|_| "dev".to_string());

        let mut builder = ConfigLoader::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false));

        for prefix in ["SERVER", "MONGODB", "LLM", "LOG", "WAITER", "POLICY", "MAIL"] {
            builder = builder.add_source(
                Environment::default()
                    .prefix(prefix)
                    .separator("_")
                    .try_parsing(true),
            );
        }

        let mut cfg: Config = builder.build()?.try_deserialize()?;

        // Secrets never live in TOML
        cfg.openai_api_key = required_env("OPENAI_API_KEY")?;
        cfg.assistant_id = required_env("ASSISTANT_ID")?;
        cfg.jwt_key = required_env("JWT_KEY")?;
        cfg.mongodb_uri = optional_env("MONGODB_URI");
        cfg.email_user = optional_env("EMAIL_USER");
        cfg.email_pass = optional_env("EMAIL_PASS");
        cfg.consultancy_email = optional_env("CONSULTANCY_EMAIL");

        Ok(cfg)
    }

    /// Load config from a specific path (useful for testing)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let builder = ConfigLoader::builder().add_source(File::from(path.as_ref()));

        let config = builder.build()?;
        config.try_deserialize()
    }

    pub fn waiter_config(&self) -> WaiterConfig {
        WaiterConfig::from(&self.waiter)
    }
}

fn required_env(name: &str) -> Result<String, ConfigError> {
    optional_env(name)
        .ok_or_else(|| ConfigError::Message(format!("{} environment variable is required", name)))
}

fn optional_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}
