//! Configuration module for the ImpactMakers backend.
//!
//! All configuration is loaded from environment variables with sensible defaults.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::errors::AppError;

/// Deployment environment; controls the session cookie flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Production,
}

impl Environment {
    fn parse(s: &str) -> Self {
        if s.eq_ignore_ascii_case("production") {
            Environment::Production
        } else {
            Environment::Development
        }
    }

    pub fn is_production(self) -> bool {
        self == Environment::Production
    }
}

/// SMTP relay credentials.
#[derive(Debug, Clone)]
pub struct SmtpConfig {
    pub host: String,
    pub username: String,
    pub password: String,
}

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Address to bind the server to
    pub bind_addr: SocketAddr,
    /// Path to SQLite database file
    pub db_path: PathBuf,
    /// HS256 secret for session tokens; generated per process when unset
    pub token_secret: Option<String>,
    /// Session token lifetime in minutes
    pub token_ttl_minutes: i64,
    /// Deployment environment
    pub environment: Environment,
    /// Origins allowed to make credentialed cross-origin requests
    pub allowed_origins: Vec<String>,
    /// Maximum number of posts in the home highlight listing
    pub home_post_limit: i64,
    /// Mail relay, if configured
    pub smtp: Option<SmtpConfig>,
    /// Sender mailbox for notification emails
    pub mail_from: String,
    /// Optional JSON file used to seed empty collections
    pub seed_path: Option<PathBuf>,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
    /// Emit JSON log lines instead of human-readable ones
    pub log_json: bool,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, AppError> {
        dotenvy::dotenv().ok();

        let bind_addr = match env::var("IMPACT_BIND_ADDR") {
            Ok(addr) => addr,
            Err(_) => match env::var("PORT") {
                Ok(port) => format!("0.0.0.0:{}", port),
                Err(_) => "127.0.0.1:5000".to_string(),
            },
        };
        let bind_addr = bind_addr
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid bind address {}: {}", bind_addr, e)))?;

        let db_path = env::var("IMPACT_DB_PATH")
            .unwrap_or_else(|_| "./data/impact.sqlite".to_string())
            .into();

        let token_secret = env::var("IMPACT_TOKEN_SECRET")
            .ok()
            .filter(|s| !s.trim().is_empty());

        let token_ttl_minutes = parse_positive("IMPACT_TOKEN_TTL_MINUTES", 20)?;

        let environment =
            Environment::parse(&env::var("IMPACT_ENV").unwrap_or_else(|_| "development".to_string()));

        let allowed_origins = env::var("IMPACT_ALLOWED_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173,http://localhost:5174".to_string())
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();

        let home_post_limit = parse_positive("IMPACT_HOME_POST_LIMIT", 6)?;

        let smtp = match (
            env::var("IMPACT_SMTP_HOST"),
            env::var("IMPACT_SMTP_USERNAME"),
            env::var("IMPACT_SMTP_PASSWORD"),
        ) {
            (Ok(host), Ok(username), Ok(password)) => Some(SmtpConfig {
                host,
                username,
                password,
            }),
            _ => None,
        };

        let mail_from = env::var("IMPACT_MAIL_FROM")
            .unwrap_or_else(|_| "ImpactMakers <no-reply@impactmakers.org>".to_string());

        let seed_path = env::var("IMPACT_SEED_PATH").ok().map(PathBuf::from);

        let log_level = env::var("IMPACT_LOG_LEVEL").unwrap_or_else(|_| "info".to_string());

        let log_json = env::var("IMPACT_LOG_JSON")
            .map(|v| matches!(v.as_str(), "1" | "true" | "yes"))
            .unwrap_or(false);

        Ok(Self {
            bind_addr,
            db_path,
            token_secret,
            token_ttl_minutes,
            environment,
            allowed_origins,
            home_post_limit,
            smtp,
            mail_from,
            seed_path,
            log_level,
            log_json,
        })
    }
}

fn parse_positive(var: &str, default: i64) -> Result<i64, AppError> {
    let value = match env::var(var) {
        Ok(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("Invalid {} value {:?}: {}", var, raw, e)))?,
        Err(_) => default,
    };

    if value <= 0 {
        return Err(AppError::Config(format!(
            "{} must be greater than zero, got {}",
            var, value
        )));
    }
    Ok(value)
}
