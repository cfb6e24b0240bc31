use std::env;
use std::fmt;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(&'static str),

    #[error("Invalid value for {key}: {value}")]
    Invalid { key: &'static str, value: String },
}

/// Process configuration, built once at startup and handed to the components
/// that need it.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub environment: Environment,
    pub database: DatabaseConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    /// Log filter used when `RUST_LOG` is not set
    pub fn default_log_filter(&self) -> &'static str {
        match self {
            Environment::Development => "pattern_api=debug,tower_http=debug,sqlx=warn",
            Environment::Staging => "pattern_api=info,tower_http=info,sqlx=warn",
            Environment::Production => "pattern_api=info,tower_http=warn,sqlx=error",
        }
    }
}

#[derive(Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub pool_size: u32,
    pub max_overflow: u32,
    pub pool_timeout_secs: u64,
    pub pool_recycle_secs: u64,
    pub idle_timeout_secs: u64,
    pub pre_ping: bool,
    pub query_timeout_secs: u64,
}

impl DatabaseConfig {
    pub fn max_connections(&self) -> u32 {
        self.pool_size + self.max_overflow
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_secs(self.pool_timeout_secs)
    }

    pub fn max_lifetime(&self) -> Duration {
        Duration::from_secs(self.pool_recycle_secs)
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }

    /// Connection string with the password masked, for logs
    pub fn redacted_url(&self) -> String {
        match url::Url::parse(&self.url) {
            Ok(mut url) => {
                if url.password().is_some() {
                    let _ = url.set_password(Some("****"));
                }
                url.into()
            }
            Err(_) => "<unparsable>".to_string(),
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.redacted_url())
            .field("pool_size", &self.pool_size)
            .field("max_overflow", &self.max_overflow)
            .field("pool_timeout_secs", &self.pool_timeout_secs)
            .field("pool_recycle_secs", &self.pool_recycle_secs)
            .field("idle_timeout_secs", &self.idle_timeout_secs)
            .field("pre_ping", &self.pre_ping)
            .field("query_timeout_secs", &self.query_timeout_secs)
            .finish()
    }
}

#[derive(Clone)]
pub struct SecurityConfig {
    pub api_key: String,
    pub api_key_header: String,
    /// Empty means any origin
    pub cors_origins: Vec<String>,
}

impl fmt::Debug for SecurityConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SecurityConfig")
            .field("api_key", &"****")
            .field("api_key_header", &self.api_key_header)
            .field("cors_origins", &self.cors_origins)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV").as_deref() {
            Some("production") | Some("prod") => Environment::Production,
            Some("staging") | Some("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        let url = lookup("DATABASE_URL")
            .filter(|v| !v.trim().is_empty())
            .ok_or(ConfigError::Missing("DATABASE_URL"))?;
        match url::Url::parse(&url) {
            Ok(parsed) if matches!(parsed.scheme(), "postgres" | "postgresql") => {}
            _ => {
                return Err(ConfigError::Invalid {
                    key: "DATABASE_URL",
                    value: "<redacted>".to_string(),
                })
            }
        }

        let api_key = lookup("API_KEY")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::Missing("API_KEY"))?;

        let mut config = Self {
            environment,
            database: DatabaseConfig {
                url,
                pool_size: 20,
                max_overflow: 5,
                pool_timeout_secs: 30,
                pool_recycle_secs: 1800,
                idle_timeout_secs: 600,
                pre_ping: true,
                query_timeout_secs: 30,
            },
            security: SecurityConfig {
                api_key,
                api_key_header: "x-api-key".to_string(),
                cors_origins: vec![],
            },
        };
        config.apply_overrides(&lookup)?;
        Ok(config)
    }

    fn apply_overrides<F>(&mut self, lookup: &F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Database pool overrides
        let db = &mut self.database;
        override_parsed(lookup, "DATABASE_POOL_SIZE", &mut db.pool_size)?;
        override_parsed(lookup, "DATABASE_MAX_OVERFLOW", &mut db.max_overflow)?;
        override_parsed(lookup, "DATABASE_POOL_TIMEOUT_SECS", &mut db.pool_timeout_secs)?;
        override_parsed(lookup, "DATABASE_POOL_RECYCLE_SECS", &mut db.pool_recycle_secs)?;
        override_parsed(lookup, "DATABASE_IDLE_TIMEOUT_SECS", &mut db.idle_timeout_secs)?;
        override_parsed(lookup, "DATABASE_POOL_PRE_PING", &mut db.pre_ping)?;
        override_parsed(lookup, "DATABASE_QUERY_TIMEOUT_SECS", &mut db.query_timeout_secs)?;

        if self.database.max_connections() == 0 {
            return Err(ConfigError::Invalid {
                key: "DATABASE_POOL_SIZE",
                value: "pool size plus overflow must be at least 1".to_string(),
            });
        }

        // Security overrides
        if let Some(v) = lookup("API_KEY_HEADER") {
            let header = v.trim().to_ascii_lowercase();
            if axum::http::HeaderName::from_bytes(header.as_bytes()).is_err() {
                return Err(ConfigError::Invalid { key: "API_KEY_HEADER", value: v });
            }
            self.security.api_key_header = header;
        }
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        Ok(())
    }
}

fn override_parsed<F, T>(lookup: &F, key: &'static str, slot: &mut T) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    if let Some(v) = lookup(key) {
        *slot = v.trim().parse().map_err(|_| ConfigError::Invalid { key, value: v })?;
    }
    Ok(())
}
