use std::env;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use crate::repositories::handler_repository::DEFAULT_STORE_TIMEOUT;
use crate::services::reachability_checker::DEFAULT_PROBE_TIMEOUT;
use crate::services::registry_service::DEFAULT_PROXY_TIMEOUT;

pub const DEFAULT_MAX_REQUEST_BYTES: usize = 10 * 1024 * 1024;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),
    #[error("{name} has invalid value '{value}'")]
    Invalid { name: &'static str, value: String },
}

/// Process settings, read from the environment (and `.env` via dotenvy).
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: String,
    pub store_timeout: Duration,
    pub probe_timeout: Duration,
    pub proxy_timeout: Duration,
    pub max_request_bytes: usize,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let database_url =
            env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        Ok(AppConfig {
            host: parse_var("HOST", IpAddr::from([127, 0, 0, 1]))?,
            port: parse_var("SERVICE_PORT", 8080)?,
            database_url,
            store_timeout: millis_var("STORE_TIMEOUT_MS", DEFAULT_STORE_TIMEOUT)?,
            probe_timeout: millis_var("PROBE_TIMEOUT_MS", DEFAULT_PROBE_TIMEOUT)?,
            proxy_timeout: millis_var("PROXY_TIMEOUT_MS", DEFAULT_PROXY_TIMEOUT)?,
            max_request_bytes: parse_var("MAX_REQUEST_BYTES", DEFAULT_MAX_REQUEST_BYTES)?,
        })
    }

    pub fn listen_addr(&self) -> SocketAddr {
        SocketAddr::from((self.host, self.port))
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, ConfigError> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { name, value }),
        _ => Ok(default),
    }
}

fn millis_var(name: &'static str, default: Duration) -> Result<Duration, ConfigError> {
    let millis = parse_var(name, default.as_millis() as u64)?;
    if millis == 0 {
        return Err(ConfigError::Invalid {
            name,
            value: millis.to_string(),
        });
    }
    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "DATABASE_URL",
        "HOST",
        "SERVICE_PORT",
        "STORE_TIMEOUT_MS",
        "PROBE_TIMEOUT_MS",
        "PROXY_TIMEOUT_MS",
        "MAX_REQUEST_BYTES",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        env::set_var("DATABASE_URL", "sqlite::memory:");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.listen_addr().to_string(), "127.0.0.1:8080");
        assert_eq!(config.store_timeout, Duration::from_secs(1));
        assert_eq!(config.probe_timeout, Duration::from_secs(5));
        assert_eq!(config.proxy_timeout, Duration::from_secs(5));
        assert_eq!(config.max_request_bytes, DEFAULT_MAX_REQUEST_BYTES);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_overrides() {
        clear_env();
        env::set_var("DATABASE_URL", "sqlite://data/handlers.db");
        env::set_var("HOST", "0.0.0.0");
        env::set_var("SERVICE_PORT", "9000");
        env::set_var("PROXY_TIMEOUT_MS", "250");

        let config = AppConfig::from_env().unwrap();
        assert_eq!(config.listen_addr().to_string(), "0.0.0.0:9000");
        assert_eq!(config.proxy_timeout, Duration::from_millis(250));
        assert_eq!(config.database_url, "sqlite://data/handlers.db");

        clear_env();
    }

    #[test]
    #[serial]
    fn test_missing_database_url() {
        clear_env();
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Missing("DATABASE_URL"))
        ));
    }

    #[test]
    #[serial]
    fn test_invalid_values_are_rejected() {
        clear_env();
        env::set_var("DATABASE_URL", "sqlite::memory:");
        env::set_var("SERVICE_PORT", "not-a-port");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Invalid { name: "SERVICE_PORT", .. })
        ));

        env::set_var("SERVICE_PORT", "8080");
        env::set_var("STORE_TIMEOUT_MS", "0");
        assert!(matches!(
            AppConfig::from_env(),
            Err(ConfigError::Invalid { name: "STORE_TIMEOUT_MS", .. })
        ));

        clear_env();
    }
}
