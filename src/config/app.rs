use anyhow::Result;
use chrono::Duration;
use std::env;
use std::path::PathBuf;

use super::StorageConfig;
use crate::auth::RateLimitConfig;
use crate::services::SmtpConfig;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub log_level: String,
    pub jwt_secret: String,
    pub jwt_expires_in: Duration,
    pub bcrypt_cost: u32,
    pub auth_rate_limit: RateLimitConfig,
    pub frontend_url: String,
    pub static_dir: Option<PathBuf>,
    pub seed_catalog: bool,
    pub smtp: Option<SmtpConfig>,
    pub storage: StorageConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3000,
            environment: "development".to_string(),
            log_level: "info".to_string(),
            jwt_secret: "your-secret-key-change-in-production".to_string(),
            jwt_expires_in: Duration::hours(24),
            bcrypt_cost: 10,
            auth_rate_limit: RateLimitConfig::default(),
            frontend_url: "http://localhost:3000".to_string(),
            static_dir: None,
            seed_catalog: true,
            smtp: None,
            storage: StorageConfig::default(),
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        let defaults = Self::default();

        let host = env::var("HOST").unwrap_or(defaults.host);
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .unwrap_or(3000);
        let environment = env::var("ENVIRONMENT").unwrap_or(defaults.environment);
        let log_level = env::var("LOG_LEVEL").unwrap_or(defaults.log_level);
        let jwt_secret = env::var("JWT_SECRET").unwrap_or(defaults.jwt_secret);
        let jwt_expires_in_hours: i64 = env::var("JWT_EXPIRES_IN_HOURS")
            .unwrap_or_else(|_| "24".to_string())
            .parse()
            .unwrap_or(24);
        let bcrypt_cost = env::var("BCRYPT_COST")
            .unwrap_or_else(|_| "10".to_string())
            .parse()
            .unwrap_or(10);

        let auth_rate_limit = RateLimitConfig {
            max_requests: env::var("AUTH_RATE_LIMIT_MAX")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auth_rate_limit.max_requests),
            window_seconds: env::var("AUTH_RATE_LIMIT_WINDOW_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.auth_rate_limit.window_seconds),
            trust_proxy_headers: env::var("TRUST_PROXY_HEADERS")
                .map(|v| matches!(v.to_lowercase().as_str(), "1" | "true" | "yes"))
                .unwrap_or(defaults.auth_rate_limit.trust_proxy_headers),
        };

        let frontend_url = env::var("FRONTEND_URL").unwrap_or(defaults.frontend_url);
        let static_dir = env::var("STATIC_DIR").ok().map(PathBuf::from);
        let seed_catalog = env::var("SEED_CATALOG")
            .map(|v| !matches!(v.to_lowercase().as_str(), "0" | "false" | "no"))
            .unwrap_or(true);

        Ok(AppConfig {
            host,
            port,
            environment,
            log_level,
            jwt_secret,
            jwt_expires_in: Duration::hours(jwt_expires_in_hours),
            bcrypt_cost,
            auth_rate_limit,
            frontend_url,
            static_dir,
            seed_catalog,
            smtp: SmtpConfig::from_env(),
            storage: StorageConfig::from_env()?,
        })
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
