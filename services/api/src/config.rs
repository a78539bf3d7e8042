use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;
use tracing::Level;
use tutor_core::{
    TutorConfig,
    llm_client::{DEFAULT_GEMINI_MODEL, GEMINI_OPENAI_API_BASE},
};

const MIN_JWT_SECRET_LEN: usize = 32;
const DEFAULT_PASSWORD_HASH_COST: u32 = 10;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub gemini_api_key: String,
    pub gemini_model: String,
    pub gemini_api_base: String,
    pub jwt_secret: String,
    pub secure_cookies: bool,
    pub chat_timeout: Duration,
    pub password_hash_cost: u32,
    pub log_level: Level,
    pub prompts_path: Option<PathBuf>,
}

impl Config {
    /// Loads configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string()))?;

        let database_url = required("DATABASE_URL")?;
        let gemini_api_key = required("GEMINI_API_KEY")?;
        let gemini_model =
            std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_GEMINI_MODEL.to_string());
        let gemini_api_base =
            std::env::var("GEMINI_API_BASE").unwrap_or_else(|_| GEMINI_OPENAI_API_BASE.to_string());

        let jwt_secret = required("JWT_SECRET")?;
        if jwt_secret.len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::InvalidValue(
                "JWT_SECRET".to_string(),
                format!("must be at least {} bytes long", MIN_JWT_SECRET_LEN),
            ));
        }

        let secure_cookies = std::env::var("APP_ENV")
            .map(|env| env.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        let chat_timeout_secs = parse_or("CHAT_TIMEOUT_SECS", 60u64)?;
        if chat_timeout_secs == 0 {
            return Err(ConfigError::InvalidValue(
                "CHAT_TIMEOUT_SECS".to_string(),
                "must be greater than zero".to_string(),
            ));
        }

        let password_hash_cost = parse_or("PASSWORD_HASH_COST", DEFAULT_PASSWORD_HASH_COST)?;
        if !(4..=31).contains(&password_hash_cost) {
            return Err(ConfigError::InvalidValue(
                "PASSWORD_HASH_COST".to_string(),
                format!("{} is outside the bcrypt range 4..=31", password_hash_cost),
            ));
        }

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let prompts_path = std::env::var("PROMPTS_PATH").ok().map(PathBuf::from);

        Ok(Self {
            bind_address,
            database_url,
            gemini_api_key,
            gemini_model,
            gemini_api_base,
            jwt_secret,
            secure_cookies,
            chat_timeout: Duration::from_secs(chat_timeout_secs),
            password_hash_cost,
            log_level,
            prompts_path,
        })
    }

    /// Settings handed to the tutoring orchestrator.
    pub fn tutor_config(&self) -> TutorConfig {
        TutorConfig::new(self.gemini_api_key.clone())
            .with_model(self.gemini_model.clone())
            .with_api_base(self.gemini_api_base.clone())
    }
}

fn required(name: &str) -> Result<String, ConfigError> {
    std::env::var(name)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .ok_or_else(|| ConfigError::MissingVar(name.to_string()))
}

fn parse_or<T>(name: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(name.to_string(), e.to_string())),
        Err(_) => Ok(default),
    }
}
