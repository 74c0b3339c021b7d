//! Server configuration from environment variables.

use thiserror::Error;

use geofind_core::defaults;
use geofind_db::PoolConfig;
use geofind_geocode::GeocoderConfig;

#[derive(Debug, Error)]
pub enum AppConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },

    #[error(transparent)]
    Geocoder(#[from] geofind_geocode::ConfigError),
}

/// Which repository backend the server uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreBackend {
    Postgres { url: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub store: StoreBackend,
    pub pool: PoolConfig,
    pub geocoder: GeocoderConfig,
    pub history_retention: i64,
}

impl AppConfig {
    /// Read configuration from the process environment.
    ///
    /// `DATABASE_URL` selects PostgreSQL; without it, or with
    /// `STORE_BACKEND=memory`, the in-memory store is used.
    pub fn from_env() -> Result<Self, AppConfigError> {
        let host = std::env::var("HOST").unwrap_or_else(|_| defaults::SERVER_HOST.to_string());
        let port = parse_var("PORT", defaults::SERVER_PORT)?;
        let history_retention = parse_var("HISTORY_RETENTION", defaults::HISTORY_RETENTION)?;
        if history_retention <= 0 {
            return Err(AppConfigError::InvalidValue {
                name: "HISTORY_RETENTION",
                value: history_retention.to_string(),
            });
        }

        let force_memory = std::env::var("STORE_BACKEND")
            .map(|v| v.eq_ignore_ascii_case("memory"))
            .unwrap_or(false);
        let store = match std::env::var("DATABASE_URL") {
            Ok(url) if !force_memory && !url.trim().is_empty() => StoreBackend::Postgres { url },
            _ => StoreBackend::Memory,
        };

        Ok(Self {
            host,
            port,
            store,
            pool: PoolConfig::from_env(),
            geocoder: GeocoderConfig::load()?,
            history_retention,
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn parse_var<T: std::str::FromStr>(name: &'static str, default: T) -> Result<T, AppConfigError> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map_err(|_| AppConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_var_default_and_invalid() {
        assert_eq!(parse_var("GEOFIND_TEST_UNSET_PORT", 3000u16).unwrap(), 3000);

        std::env::set_var("GEOFIND_TEST_BAD_PORT", "eighty");
        let err = parse_var("GEOFIND_TEST_BAD_PORT", 3000u16).unwrap_err();
        std::env::remove_var("GEOFIND_TEST_BAD_PORT");
        assert!(err.to_string().contains("GEOFIND_TEST_BAD_PORT"));
    }

    #[test]
    fn test_parse_var_reads_value() {
        std::env::set_var("GEOFIND_TEST_RETENTION", " 42 ");
        let value: i64 = parse_var("GEOFIND_TEST_RETENTION", 100).unwrap();
        std::env::remove_var("GEOFIND_TEST_RETENTION");
        assert_eq!(value, 42);
    }
}
