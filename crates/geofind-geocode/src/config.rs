//! Geocoder configuration.
//!
//! Configuration can be loaded from:
//! - A TOML file named by `GEOCODER_CONFIG`
//! - Environment variables (`GEOCODER_*`)
//!
//! # Example
//!
//! ```rust,no_run
//! use geofind_geocode::config::GeocoderConfig;
//!
//! let config = GeocoderConfig::load().expect("Failed to load config");
//! println!("{}", config.base_url);
//! ```
//!
//! A config file looks like:
//!
//! ```toml
//! [geocoder]
//! base_url = "https://nominatim.openstreetmap.org"
//! user_agent = "LocationFinder/1.0 (${CONTACT_EMAIL})"
//! timeout_secs = 30
//! ```

use std::env;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use geofind_core::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for geofind_core::Error {
    fn from(e: ConfigError) -> Self {
        geofind_core::Error::Config(e.to_string())
    }
}

/// Settings for an HTTP geocoding provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocoderConfig {
    /// Base URL of the provider; `/search` is appended.
    pub base_url: String,
    /// Identifying `User-Agent` header value.
    pub user_agent: String,
    /// Whole-request timeout.
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            base_url: defaults::GEOCODER_URL.to_string(),
            user_agent: defaults::GEOCODER_USER_AGENT.to_string(),
            timeout_secs: defaults::GEOCODER_TIMEOUT_SECS,
        }
    }
}

impl GeocoderConfig {
    /// Load from the file named by `GEOCODER_CONFIG`, falling back to
    /// environment variables when it is unset.
    pub fn load() -> ConfigResult<Self> {
        match env::var("GEOCODER_CONFIG") {
            Ok(path) if !path.trim().is_empty() => {
                let path = PathBuf::from(path);
                info!(
                    subsystem = "geocode",
                    component = "config",
                    path = %path.display(),
                    "Loading geocoder config"
                );
                Self::from_file(&path)
            }
            _ => {
                debug!(
                    subsystem = "geocode",
                    component = "config",
                    "GEOCODER_CONFIG not set, using environment variables"
                );
                let config = Self::from_env();
                config.validate()?;
                Ok(config)
            }
        }
    }

    /// Load configuration from a TOML file with a `[geocoder]` table.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let content = substitute_env_vars(&content)?;

        #[derive(Deserialize)]
        struct TomlRoot {
            #[serde(default)]
            geocoder: GeocoderConfig,
        }

        let root: TomlRoot = toml::from_str(&content)?;
        root.geocoder.validate()?;
        Ok(root.geocoder)
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        let base = Self::default();
        Self {
            base_url: env::var("GEOCODER_URL").unwrap_or(base.base_url),
            user_agent: env::var("GEOCODER_USER_AGENT").unwrap_or(base.user_agent),
            timeout_secs: env::var("GEOCODER_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(base.timeout_secs),
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(ConfigError::Validation(format!(
                "Geocoder base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.user_agent.trim().is_empty() {
            return Err(ConfigError::Validation(
                "Geocoder user_agent cannot be empty".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Validation(
                "Geocoder timeout_secs must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Search endpoint URL.
    pub fn search_url(&self) -> String {
        format!("{}/search", self.base_url.trim_end_matches('/'))
    }
}

/// Substitute environment variables in the format `${VAR_NAME}`.
///
/// Unset variables are left in place.
fn substitute_env_vars(content: &str) -> ConfigResult<String> {
    let re = regex::Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}")
        .map_err(|e| ConfigError::Validation(e.to_string()))?;
    Ok(re
        .replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        })
        .to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_defaults_are_valid() {
        let config = GeocoderConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.user_agent, "LocationFinder/1.0");
        assert_eq!(
            config.search_url(),
            "https://nominatim.openstreetmap.org/search"
        );
    }

    #[test]
    fn test_search_url_trims_trailing_slash() {
        let config = GeocoderConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        };
        assert_eq!(config.search_url(), "http://localhost:8080/search");
    }

    #[test]
    fn test_validate_rejects_bad_scheme() {
        let config = GeocoderConfig {
            base_url: "ftp://example.com".to_string(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validate_rejects_empty_user_agent() {
        let config = GeocoderConfig {
            user_agent: "  ".to_string(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_zero_timeout() {
        let config = GeocoderConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_env_var_substitution() {
        env::set_var("GEOFIND_TEST_SUBST_AGENT", "geofind-test");
        let result = substitute_env_vars("ua = \"${GEOFIND_TEST_SUBST_AGENT}\"").unwrap();
        env::remove_var("GEOFIND_TEST_SUBST_AGENT");
        assert_eq!(result, "ua = \"geofind-test\"");
    }

    #[test]
    fn test_env_var_substitution_missing() {
        let content = "ua = \"${GEOFIND_NONEXISTENT_VAR_12345}\"";
        assert_eq!(substitute_env_vars(content).unwrap(), content);
    }

    #[test]
    fn test_from_file() {
        let path = env::temp_dir().join(format!("geofind-geocoder-{}.toml", std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(
            file,
            "[geocoder]\nbase_url = \"http://localhost:7070\"\nuser_agent = \"Test/2.0\""
        )
        .unwrap();

        let config = GeocoderConfig::from_file(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(config.base_url, "http://localhost:7070");
        assert_eq!(config.user_agent, "Test/2.0");
        assert_eq!(config.timeout_secs, defaults::GEOCODER_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_file_invalid_toml() {
        let path = env::temp_dir().join(format!("geofind-bad-{}.toml", std::process::id()));
        std::fs::write(&path, "[geocoder\nbase_url = ").unwrap();
        let result = GeocoderConfig::from_file(&path);
        std::fs::remove_file(&path).ok();
        assert!(matches!(result, Err(ConfigError::TomlParse(_))));
    }
}
