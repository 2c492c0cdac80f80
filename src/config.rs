use std::time::Duration;

use anyhow::Context;
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Postgres URL; `None` runs the service on the in-memory store.
    pub database_url: Option<String>,
    pub host: String,
    pub port: u16,
    pub max_connections: u32,
    pub request_timeout: Duration,
    /// Log the full error chain of unhandled failures.
    pub enable_global_error_logging: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            host: "0.0.0.0".into(),
            port: 5000,
            max_connections: 10,
            request_timeout: Duration::from_secs(30),
            enable_global_error_logging: false,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from `lookup`, falling back to defaults for unset
    /// keys. A set but unparsable numeric value is an error.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|v| !v.trim().is_empty());
        let host = lookup("APP_HOST").unwrap_or(defaults.host);
        let port = match lookup("APP_PORT").or_else(|| lookup("PORT")) {
            Some(v) => v
                .parse::<u16>()
                .with_context(|| format!("APP_PORT/PORT must be a port number, got {v:?}"))?,
            None => defaults.port,
        };
        let max_connections = match lookup("DB_MAX_CONNECTIONS") {
            Some(v) => v
                .parse::<u32>()
                .context("DB_MAX_CONNECTIONS must be a positive integer")?,
            None => defaults.max_connections,
        };
        let request_timeout = match lookup("REQUEST_TIMEOUT_SECS") {
            Some(v) => Duration::from_secs(
                v.parse::<u64>()
                    .context("REQUEST_TIMEOUT_SECS must be a number of seconds")?,
            ),
            None => defaults.request_timeout,
        };
        let enable_global_error_logging =
            lookup("ENABLE_GLOBAL_ERROR_LOGGING").is_some_and(|v| v == "true");

        Ok(Self {
            database_url,
            host,
            port,
            max_connections,
            request_timeout,
            enable_global_error_logging,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let cfg = AppConfig::default();
        assert!(cfg.database_url.is_none());
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.request_timeout, Duration::from_secs(30));
        assert!(!cfg.enable_global_error_logging);
    }

    fn from_pairs(pairs: &[(&str, &str)]) -> anyhow::Result<AppConfig> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let cfg = from_pairs(&[]).unwrap();
        assert_eq!(cfg.bind_addr(), "0.0.0.0:5000");
        assert_eq!(cfg.max_connections, 10);
    }

    #[test]
    fn port_falls_back_to_port_then_prefers_app_port() {
        assert_eq!(from_pairs(&[("PORT", "8080")]).unwrap().port, 8080);
        assert_eq!(
            from_pairs(&[("PORT", "8080"), ("APP_PORT", "9090")]).unwrap().port,
            9090
        );
    }

    #[test]
    fn unparsable_numbers_fail_startup() {
        assert!(from_pairs(&[("APP_PORT", "http")]).is_err());
        assert!(from_pairs(&[("PORT", "70000")]).is_err());
        assert!(from_pairs(&[("DB_MAX_CONNECTIONS", "-1")]).is_err());
        assert!(from_pairs(&[("REQUEST_TIMEOUT_SECS", "soon")]).is_err());
    }

    #[test]
    fn global_error_logging_needs_literal_true() {
        let on = |v: &str| {
            from_pairs(&[("ENABLE_GLOBAL_ERROR_LOGGING", v)])
                .unwrap()
                .enable_global_error_logging
        };
        assert!(on("true"));
        assert!(!on("TRUE"));
        assert!(!on("1"));
        assert!(!on(""));
    }

    #[test]
    fn blank_database_url_means_in_memory() {
        assert!(from_pairs(&[("DATABASE_URL", "  ")]).unwrap().database_url.is_none());
        let cfg = from_pairs(&[
            ("DATABASE_URL", "postgres://localhost/courses"),
            ("REQUEST_TIMEOUT_SECS", "5"),
        ])
        .unwrap();
        assert_eq!(cfg.database_url.as_deref(), Some("postgres://localhost/courses"));
        assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    }
}
