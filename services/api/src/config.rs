//! services/api/src/config.rs
//!
//! Defines the application's configuration structure and loading logic.
//!
//! All configuration is loaded from environment variables at startup. The `.env`
//! file is used for local development.

use bizchinese_core::billing::ProductCatalog;
use std::net::SocketAddr;
use tracing::Level;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Holds all configuration loaded from the environment at startup.
#[derive(Clone, Debug)]
pub struct Config {
    pub bind_address: SocketAddr,
    pub database_url: String,
    pub database_max_connections: u32,
    pub log_level: Level,
    pub app_url: String,
    pub cors_origin: String,
    /// Production turns unsigned payment webhooks into hard failures.
    pub production: bool,
    pub llm_api_key: Option<String>,
    pub llm_api_base: String,
    pub llm_model: String,
    pub creem_api_key: Option<String>,
    pub creem_api_base: String,
    pub creem_webhook_secret: Option<String>,
    pub products: ProductCatalog,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// It will look for a `.env` file in the current directory for development,
    /// but this is skipped in test environments to ensure tests are hermetic.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Only load from .env in non-test mode to avoid contamination.
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        // --- Load Server and Database Settings ---
        let bind_address_str =
            std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:3000".to_string());
        let bind_address = bind_address_str.parse::<SocketAddr>().map_err(|e| {
            ConfigError::InvalidValue("BIND_ADDRESS".to_string(), e.to_string())
        })?;

        let database_url = std::env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingVar("DATABASE_URL".to_string()))?;

        let database_max_connections = match std::env::var("DATABASE_MAX_CONNECTIONS") {
            Ok(raw) => raw.parse::<u32>().ok().filter(|n| *n > 0).ok_or_else(|| {
                ConfigError::InvalidValue(
                    "DATABASE_MAX_CONNECTIONS".to_string(),
                    format!("'{}' is not a positive integer", raw),
                )
            })?,
            Err(_) => 5,
        };

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let app_url =
            std::env::var("APP_URL").unwrap_or_else(|_| "http://localhost:3000".to_string());
        let cors_origin = std::env::var("CORS_ORIGIN").unwrap_or_else(|_| app_url.clone());
        let production = std::env::var("APP_ENV")
            .map(|v| v.eq_ignore_ascii_case("production"))
            .unwrap_or(false);

        // --- Load API Keys (as optional) ---
        let llm_api_key = std::env::var("LLM_API_KEY")
            .or_else(|_| std::env::var("DASHSCOPE_API_KEY"))
            .ok();
        let creem_api_key = std::env::var("CREEM_API_KEY").ok();
        let creem_webhook_secret = std::env::var("CREEM_WEBHOOK_SECRET").ok();

        // --- Load Adapter-specific Settings ---
        let llm_api_base = std::env::var("LLM_API_BASE").unwrap_or_else(|_| {
            "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string()
        });
        let llm_model = std::env::var("LLM_MODEL").unwrap_or_else(|_| "qwen-turbo".to_string());
        let creem_api_base =
            std::env::var("CREEM_API_BASE").unwrap_or_else(|_| "https://api.creem.io".to_string());

        let products = ProductCatalog {
            pro_monthly: std::env::var("CREEM_PRO_MONTHLY_PRODUCT_ID").ok(),
            pro_yearly: std::env::var("CREEM_PRO_YEARLY_PRODUCT_ID").ok(),
            max_monthly: std::env::var("CREEM_MAX_MONTHLY_PRODUCT_ID").ok(),
            max_yearly: std::env::var("CREEM_MAX_YEARLY_PRODUCT_ID").ok(),
        };

        Ok(Self {
            bind_address,
            database_url,
            database_max_connections,
            log_level,
            app_url,
            cors_origin,
            production,
            llm_api_key,
            llm_api_base,
            llm_model,
            creem_api_key,
            creem_api_base,
            creem_webhook_secret,
            products,
        })
    }

    /// A configuration for tests and tools that never touch the environment.
    pub fn for_database(database_url: &str) -> Self {
        Self {
            bind_address: SocketAddr::from(([127, 0, 0, 1], 3000)),
            database_url: database_url.to_string(),
            database_max_connections: 5,
            log_level: Level::INFO,
            app_url: "http://localhost:3000".to_string(),
            cors_origin: "http://localhost:3000".to_string(),
            production: false,
            llm_api_key: None,
            llm_api_base: "https://dashscope.aliyuncs.com/compatible-mode/v1".to_string(),
            llm_model: "qwen-turbo".to_string(),
            creem_api_key: None,
            creem_api_base: "https://api.creem.io".to_string(),
            creem_webhook_secret: None,
            products: ProductCatalog::default(),
        }
    }
}
