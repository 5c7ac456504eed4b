//! Auth service configuration.

use std::env;

use chrono::Utc;

use crate::security::token_lifetimes;
use common::{AppError, AppResult, DatabaseConfig, JwtConfig};
use domain::{DEFAULT_ACCESS_TOKEN_TTL_MINUTES, DEFAULT_REFRESH_TOKEN_TTL_DAYS, MIN_JWT_SECRET_LENGTH};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8080;

/// Auth service configuration.
#[derive(Debug, Clone)]
pub struct AuthServiceConfig {
    /// Token signing settings (secret is redacted in Debug)
    pub jwt: JwtConfig,
    /// Database connection settings
    pub database: DatabaseConfig,
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
}

impl AuthServiceConfig {
    /// Load configuration from environment variables.
    ///
    /// `JWT_SECRET` is required and must be at least 32 characters.
    pub fn from_env() -> AppResult<Self> {
        let secret = env::var("JWT_SECRET")
            .or_else(|_| env::var("AUTH_SERVICE_JWT_SECRET"))
            .map_err(|_| AppError::validation("JWT_SECRET must be set"))?;

        let config = Self {
            jwt: JwtConfig {
                secret,
                access_token_ttl_minutes: parse_var("ACCESS_TOKEN_TTL_MINUTES")
                    .unwrap_or(DEFAULT_ACCESS_TOKEN_TTL_MINUTES),
                refresh_token_ttl_days: parse_var("REFRESH_TOKEN_TTL_DAYS")
                    .unwrap_or(DEFAULT_REFRESH_TOKEN_TTL_DAYS),
            },
            database: Self::database_from_env(),
            host: env::var("AUTH_SERVICE_HOST").unwrap_or_else(|_| DEFAULT_HOST.to_string()),
            port: parse_var("AUTH_SERVICE_PORT").unwrap_or(DEFAULT_PORT),
        };

        config.validate()?;
        Ok(config)
    }

    /// Database settings alone; migrations do not need a signing secret.
    pub fn database_from_env() -> DatabaseConfig {
        let defaults = DatabaseConfig::default();
        DatabaseConfig {
            url: env::var("AUTH_SERVICE_DATABASE_URL")
                .or_else(|_| env::var("DATABASE_URL"))
                .unwrap_or(defaults.url),
            max_connections: parse_var("DATABASE_MAX_CONNECTIONS").unwrap_or(defaults.max_connections),
            min_connections: parse_var("DATABASE_MIN_CONNECTIONS").unwrap_or(defaults.min_connections),
        }
    }

    /// Reject settings the service cannot run with.
    pub fn validate(&self) -> AppResult<()> {
        if self.jwt.secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(AppError::validation(format!(
                "JWT_SECRET must be at least {} characters long",
                MIN_JWT_SECRET_LENGTH
            )));
        }
        token_lifetimes(&self.jwt, Utc::now())?;
        Ok(())
    }

    /// Override the listen address (CLI flags win over the environment).
    pub fn with_address(mut self, host: impl Into<String>, port: u16) -> Self {
        self.host = host.into();
        self.port = port;
        self
    }

    /// Get the full server address.
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &str) -> Option<T> {
    env::var(name).ok().and_then(|v| v.parse().ok())
}

impl Default for AuthServiceConfig {
    fn default() -> Self {
        Self {
            jwt: JwtConfig::default(),
            database: DatabaseConfig::default(),
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}
