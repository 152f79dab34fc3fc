use serde::{Deserialize, Serialize};
use std::env;

use crate::pagination::StaleCursorPolicy;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub environment: Environment,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub pagination: PaginationConfig,
    pub api: ApiConfig,
    pub rate_limit: RateLimitConfig,
    pub security: SecurityConfig,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Development,
    Staging,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Staging => "staging",
            Environment::Production => "production",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub port: u16,
    pub app_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Unset until `DATABASE_URL` is provided; only the Postgres store needs it.
    pub url: Option<String>,
    pub max_connections: u32,
    pub connection_timeout: u64,
    pub slow_query_threshold_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaginationConfig {
    pub default_limit: i64,
    /// Upper bound for offset pagination. The load-more endpoint is uncapped.
    pub max_limit: i64,
    pub stale_cursor: StaleCursorPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub max_request_size_bytes: usize,
    pub log_format: LogFormat,
}

/// Fixed-window request budget per client address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RateLimitConfig {
    pub enabled: bool,
    pub max_requests: u32,
    pub window_secs: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Empty means any origin is allowed.
    pub cors_origins: Vec<String>,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let environment = match env::var("APP_ENV").or_else(|_| env::var("NODE_ENV")).as_deref() {
            Ok("production") | Ok("prod") => Environment::Production,
            Ok("staging") | Ok("stage") => Environment::Staging,
            _ => Environment::Development,
        };

        // Set defaults based on environment, then override with specific env vars
        match environment {
            Environment::Production => Self::production(),
            Environment::Staging => Self::staging(),
            Environment::Development => Self::development(),
        }
        .with_overrides(|key| env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        // Server overrides
        if let Some(v) = lookup("PORT") {
            self.server.port = v.parse().unwrap_or(self.server.port);
        }
        if let Some(v) = lookup("APP_URL") {
            self.server.app_url = v;
        }

        // Database overrides
        if let Some(v) = lookup("DATABASE_URL") {
            self.database.url = Some(v).filter(|s| !s.trim().is_empty());
        }
        if let Some(v) = lookup("DATABASE_MAX_CONNECTIONS") {
            self.database.max_connections = v.parse().unwrap_or(self.database.max_connections);
        }
        if let Some(v) = lookup("DATABASE_CONNECTION_TIMEOUT") {
            self.database.connection_timeout = v.parse().unwrap_or(self.database.connection_timeout);
        }
        if let Some(v) = lookup("DATABASE_SLOW_QUERY_THRESHOLD_MS") {
            self.database.slow_query_threshold_ms = v.parse().unwrap_or(self.database.slow_query_threshold_ms);
        }

        // Pagination overrides
        if let Some(v) = lookup("PAGINATION_DEFAULT_LIMIT") {
            self.pagination.default_limit = v.parse().ok().filter(|l: &i64| *l >= 1).unwrap_or(self.pagination.default_limit);
        }
        if let Some(v) = lookup("PAGINATION_MAX_LIMIT") {
            self.pagination.max_limit = v.parse().ok().filter(|l: &i64| *l >= 1).unwrap_or(self.pagination.max_limit);
        }
        if let Some(v) = lookup("PAGINATION_STALE_CURSOR") {
            self.pagination.stale_cursor = v.parse().unwrap_or(self.pagination.stale_cursor);
        }

        // API overrides
        if let Some(v) = lookup("API_MAX_REQUEST_SIZE_BYTES") {
            self.api.max_request_size_bytes = v.parse().unwrap_or(self.api.max_request_size_bytes);
        }
        if let Some(v) = lookup("LOG_FORMAT") {
            self.api.log_format = match v.to_ascii_lowercase().as_str() {
                "json" => LogFormat::Json,
                "text" => LogFormat::Text,
                _ => self.api.log_format,
            };
        }

        // Rate limit overrides
        if let Some(v) = lookup("RATE_LIMIT_ENABLED") {
            self.rate_limit.enabled = v.parse().unwrap_or(self.rate_limit.enabled);
        }
        if let Some(v) = lookup("RATE_LIMIT_MAX_REQUESTS") {
            self.rate_limit.max_requests = v
                .parse()
                .ok()
                .filter(|n: &u32| *n >= 1)
                .unwrap_or(self.rate_limit.max_requests);
        }
        if let Some(v) = lookup("RATE_LIMIT_WINDOW_SECS") {
            self.rate_limit.window_secs = v
                .parse()
                .ok()
                .filter(|n: &u64| *n >= 1)
                .unwrap_or(self.rate_limit.window_secs);
        }

        // Security overrides
        if let Some(v) = lookup("SECURITY_CORS_ORIGINS") {
            self.security.cors_origins = v
                .split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect();
        }

        self
    }

    pub fn development() -> Self {
        Self {
            environment: Environment::Development,
            server: ServerConfig {
                port: 3200,
                app_url: "http://localhost:3200".to_string(),
            },
            database: DatabaseConfig {
                url: None,
                max_connections: 10,
                connection_timeout: 30,
                slow_query_threshold_ms: 100,
            },
            pagination: PaginationConfig {
                default_limit: 10,
                max_limit: 100,
                stale_cursor: StaleCursorPolicy::EndOfList,
            },
            api: ApiConfig {
                max_request_size_bytes: 10 * 1024 * 1024, // 10MB
                log_format: LogFormat::Text,
            },
            rate_limit: RateLimitConfig {
                enabled: true,
                max_requests: 60,
                window_secs: 60,
            },
            security: SecurityConfig {
                cors_origins: vec![],
            },
        }
    }

    fn staging() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Staging;
        config.database.max_connections = 20;
        config.database.connection_timeout = 10;
        config.database.slow_query_threshold_ms = 500;
        config.api.max_request_size_bytes = 5 * 1024 * 1024; // 5MB
        config.api.log_format = LogFormat::Json;
        config
    }

    fn production() -> Self {
        let mut config = Self::development();
        config.environment = Environment::Production;
        config.database.max_connections = 50;
        config.database.connection_timeout = 5;
        config.database.slow_query_threshold_ms = 1000;
        config.api.max_request_size_bytes = 2 * 1024 * 1024; // 2MB
        config.api.log_format = LogFormat::Json;
        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_development_config() {
        let config = AppConfig::development();
        assert_eq!(config.server.port, 3200);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.max_limit, 100);
        assert_eq!(config.pagination.stale_cursor, StaleCursorPolicy::EndOfList);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn test_default_production_config() {
        let config = AppConfig::production();
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.api.log_format, LogFormat::Json);
        assert_eq!(config.api.max_request_size_bytes, 2 * 1024 * 1024);
    }

    #[test]
    fn env_overrides_apply() {
        let config = AppConfig::development().with_overrides(lookup(&[
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://u:p@localhost/bmup"),
            ("PAGINATION_STALE_CURSOR", "restart"),
            ("SECURITY_CORS_ORIGINS", "https://a.example, https://b.example,"),
            ("LOG_FORMAT", "JSON"),
        ]));
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url.as_deref(), Some("postgres://u:p@localhost/bmup"));
        assert_eq!(config.pagination.stale_cursor, StaleCursorPolicy::Restart);
        assert_eq!(config.security.cors_origins, vec!["https://a.example", "https://b.example"]);
        assert_eq!(config.api.log_format, LogFormat::Json);
    }

    #[test]
    fn invalid_overrides_keep_defaults() {
        let config = AppConfig::development().with_overrides(lookup(&[
            ("PORT", "not-a-port"),
            ("PAGINATION_DEFAULT_LIMIT", "0"),
            ("PAGINATION_STALE_CURSOR", "explode"),
            ("DATABASE_URL", "  "),
        ]));
        assert_eq!(config.server.port, 3200);
        assert_eq!(config.pagination.default_limit, 10);
        assert_eq!(config.pagination.stale_cursor, StaleCursorPolicy::EndOfList);
        assert!(config.database.url.is_none());
    }

    #[test]
    fn rate_limit_defaults_and_overrides() {
        let config = AppConfig::development();
        assert!(config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 60);
        assert_eq!(config.rate_limit.window_secs, 60);

        let config = AppConfig::development().with_overrides(lookup(&[
            ("RATE_LIMIT_ENABLED", "false"),
            ("RATE_LIMIT_MAX_REQUESTS", "200"),
            ("RATE_LIMIT_WINDOW_SECS", "0"),
        ]));
        assert!(!config.rate_limit.enabled);
        assert_eq!(config.rate_limit.max_requests, 200);
        assert_eq!(config.rate_limit.window_secs, 60);
    }
}
