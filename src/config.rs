//! Configuration module
//!
//! Loads configuration from environment variables.

use std::env;

/// Origins allowed when `CORS_ALLOWED_ORIGINS` is not set
const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
    "https://moneyflow-frontend-five.vercel.app",
    "https://moneyflow-frontend.vercel.app",
    "https://moneyflow-frontend-git-develop.vercel.app",
];

/// Preview deployments of the frontend
const DEFAULT_ORIGIN_PATTERN: &str = r"^https://moneyflow-frontend-.*\.vercel\.app$";

const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Database connection URL
    pub database_url: String,

    /// Maximum database connections in pool
    pub database_max_connections: u32,

    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    /// Environment (development, production)
    pub environment: String,

    /// Base URL of the identity provider project
    pub supabase_url: String,

    /// Service key sent as `apikey` to the identity provider
    pub supabase_service_key: String,

    /// Text generation API key. Without it tips always use the fallback rules.
    pub gemini_api_key: Option<String>,

    pub gemini_model: String,

    pub gemini_base_url: String,

    /// Exact origins allowed to receive CORS headers
    pub cors_allowed_origins: Vec<String>,

    /// Regex for preview-deployment origins
    pub cors_origin_pattern: String,

    pub log_format: LogFormat,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url = env::var("DATABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("DATABASE_URL"))?;

        let database_max_connections = env::var("DATABASE_MAX_CONNECTIONS")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("DATABASE_MAX_CONNECTIONS"))?;

        let host = env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .map_err(|_| ConfigError::InvalidValue("PORT"))?;

        let environment = env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string());

        let supabase_url = env::var("SUPABASE_URL")
            .map_err(|_| ConfigError::MissingEnv("SUPABASE_URL"))?
            .trim_end_matches('/')
            .to_string();

        let supabase_service_key = env::var("SUPABASE_SERVICE_ROLE_KEY")
            .map_err(|_| ConfigError::MissingEnv("SUPABASE_SERVICE_ROLE_KEY"))?;

        let gemini_api_key = env::var("GEMINI_API_KEY").ok().filter(|key| !key.is_empty());

        let gemini_model = env::var("GEMINI_MODEL").unwrap_or_else(|_| "gemini-pro".to_string());

        let gemini_base_url = env::var("GEMINI_BASE_URL")
            .unwrap_or_else(|_| DEFAULT_GEMINI_BASE_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        let cors_allowed_origins = match env::var("CORS_ALLOWED_ORIGINS") {
            Ok(list) => parse_origin_list(&list),
            Err(_) => DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect(),
        };

        let cors_origin_pattern =
            env::var("CORS_ORIGIN_PATTERN").unwrap_or_else(|_| DEFAULT_ORIGIN_PATTERN.to_string());

        let log_format = match env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            Ok("pretty") | Err(_) => LogFormat::Pretty,
            Ok(_) => return Err(ConfigError::InvalidValue("LOG_FORMAT")),
        };

        Ok(Self {
            database_url,
            database_max_connections,
            host,
            port,
            environment,
            supabase_url,
            supabase_service_key,
            gemini_api_key,
            gemini_model,
            gemini_base_url,
            cors_allowed_origins,
            cors_origin_pattern,
            log_format,
        })
    }

    /// Check if running in production
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}

/// Split a comma separated origin list, dropping blanks
fn parse_origin_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

/// Default literal origin list
pub fn default_allowed_origins() -> Vec<String> {
    DEFAULT_ALLOWED_ORIGINS.iter().map(|o| o.to_string()).collect()
}

/// Default preview-deployment pattern
pub fn default_origin_pattern() -> &'static str {
    DEFAULT_ORIGIN_PATTERN
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnv(&'static str),

    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(&'static str),

    #[error("Invalid CORS origin pattern: {0}")]
    InvalidOriginPattern(#[from] regex::Error),
}
