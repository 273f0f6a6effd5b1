//! Application configuration management.
//!
//! Configuration is read once at startup from environment variables (after
//! loading `.env` if present). Every variable is optional; omitting
//! `DATABASE_URL` runs the service on the in-memory store.
//!
//! # Example
//!
//! ```rust,ignore
//! use guest_merge::infrastructure::AppConfig;
//!
//! let config = AppConfig::from_env()?;
//! println!("Listening on {}", config.bind_address());
//! ```

use std::env;
use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

/// Default session cookie names issued by the sign-in provider.
pub const DEFAULT_SESSION_COOKIE_NAMES: [&str; 2] =
    ["authjs.session-token", "__Secure-authjs.session-token"];

/// Configuration error types.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable has an invalid value.
    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// Deployment environment. Production turns the cookie `Secure` flag on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppEnvironment {
    #[default]
    Development,
    Production,
}

impl AppEnvironment {
    #[must_use]
    pub const fn is_production(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl FromStr for AppEnvironment {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "development" | "dev" | "test" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("expected development or production, got {other:?}")),
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "pretty" | "text" => Ok(Self::Pretty),
            "json" => Ok(Self::Json),
            other => Err(format!("expected pretty or json, got {other:?}")),
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    /// PostgreSQL connection URL. `None` selects the in-memory store.
    pub database_url: Option<String>,
    pub database_max_connections: u32,
    /// Apply `migrations/` before serving.
    pub run_migrations: bool,
    pub app_host: String,
    pub app_port: u16,
    pub app_env: AppEnvironment,
    /// Cookies whose presence marks an authenticated request.
    pub session_cookie_names: Vec<String>,
    pub guest_cookie_max_age_days: u32,
    pub log_format: LogFormat,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            database_max_connections: 10,
            run_migrations: true,
            app_host: "0.0.0.0".to_string(),
            app_port: 3000,
            app_env: AppEnvironment::Development,
            session_cookie_names: DEFAULT_SESSION_COOKIE_NAMES
                .iter()
                .map(ToString::to_string)
                .collect(),
            guest_cookie_max_age_days: 30,
            log_format: LogFormat::Pretty,
        }
    }
}

impl AppConfig {
    /// Loads configuration from environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `DATABASE_URL`: PostgreSQL connection string (optional)
    /// - `DATABASE_MAX_CONNECTIONS`: pool size (default: 10)
    /// - `RUN_MIGRATIONS`: apply migrations at startup (default: true)
    /// - `APP_HOST`: server host (default: "0.0.0.0")
    /// - `APP_PORT`: server port (default: 3000)
    /// - `APP_ENV`: `development` or `production` (default: development)
    /// - `SESSION_COOKIE_NAMES`: comma separated session cookie names
    /// - `GUEST_COOKIE_MAX_AGE_DAYS`: guest cookie lifetime (default: 30)
    /// - `LOG_FORMAT`: `pretty` or `json` (default: pretty)
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable has an invalid value.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignores errors if file doesn't exist)
        dotenvy::dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Loads configuration through an arbitrary variable lookup.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidValue` if a variable has an invalid value.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let database_url = lookup("DATABASE_URL").filter(|value| !value.trim().is_empty());
        let database_max_connections = get_optional_parsed(
            &lookup,
            "DATABASE_MAX_CONNECTIONS",
            defaults.database_max_connections,
        )?;
        if database_max_connections == 0 {
            return Err(ConfigError::InvalidValue {
                key: "DATABASE_MAX_CONNECTIONS".to_string(),
                message: "must be at least 1".to_string(),
            });
        }
        let run_migrations = get_optional_parsed(&lookup, "RUN_MIGRATIONS", defaults.run_migrations)?;
        let app_host = lookup("APP_HOST").unwrap_or(defaults.app_host);
        let app_port = get_optional_parsed(&lookup, "APP_PORT", defaults.app_port)?;
        let app_env = get_optional_parsed(&lookup, "APP_ENV", defaults.app_env)?;
        let session_cookie_names = match lookup("SESSION_COOKIE_NAMES") {
            Some(value) => parse_cookie_names(&value)?,
            None => defaults.session_cookie_names,
        };
        let guest_cookie_max_age_days = get_optional_parsed(
            &lookup,
            "GUEST_COOKIE_MAX_AGE_DAYS",
            defaults.guest_cookie_max_age_days,
        )?;
        let log_format = get_optional_parsed(&lookup, "LOG_FORMAT", defaults.log_format)?;

        Ok(Self {
            database_url,
            database_max_connections,
            run_migrations,
            app_host,
            app_port,
            app_env,
            session_cookie_names,
            guest_cookie_max_age_days,
            log_format,
        })
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }
}

fn parse_cookie_names(value: &str) -> Result<Vec<String>, ConfigError> {
    let names: Vec<String> = value
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(ToString::to_string)
        .collect();

    if names.is_empty() {
        return Err(ConfigError::InvalidValue {
            key: "SESSION_COOKIE_NAMES".to_string(),
            message: "at least one cookie name is required".to_string(),
        });
    }
    Ok(names)
}

/// Gets an optional variable and parses it, with a default value.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` if the variable is set but cannot be parsed.
fn get_optional_parsed<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: Display,
{
    lookup(key).map_or_else(
        || Ok(default),
        |value| {
            value
                .trim()
                .parse()
                .map_err(|error: T::Err| ConfigError::InvalidValue {
                    key: key.to_string(),
                    message: error.to_string(),
                })
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let values: HashMap<String, String> = pairs
            .iter()
            .map(|(key, value)| ((*key).to_string(), (*value).to_string()))
            .collect();
        move |key| values.get(key).cloned()
    }

    // =========================================================================
    // ConfigError Tests
    // =========================================================================

    #[rstest]
    fn config_error_invalid_value_display() {
        let error = ConfigError::InvalidValue {
            key: "APP_PORT".to_string(),
            message: "must be a number".to_string(),
        };
        assert_eq!(
            format!("{error}"),
            "Invalid value for APP_PORT: must be a number"
        );
    }

    // =========================================================================
    // AppConfig Tests
    // =========================================================================

    #[rstest]
    fn empty_environment_yields_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[])).unwrap();

        assert_eq!(config, AppConfig::default());
        assert_eq!(config.database_url, None);
        assert_eq!(config.bind_address(), "0.0.0.0:3000");
        assert_eq!(
            config.session_cookie_names,
            vec!["authjs.session-token", "__Secure-authjs.session-token"]
        );
    }

    #[rstest]
    fn reads_every_variable() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/guest_merge"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("RUN_MIGRATIONS", "false"),
            ("APP_HOST", "127.0.0.1"),
            ("APP_PORT", "8080"),
            ("APP_ENV", "production"),
            ("SESSION_COOKIE_NAMES", "sid, other_sid"),
            ("GUEST_COOKIE_MAX_AGE_DAYS", "7"),
            ("LOG_FORMAT", "json"),
        ]))
        .unwrap();

        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/guest_merge")
        );
        assert_eq!(config.database_max_connections, 4);
        assert!(!config.run_migrations);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
        assert!(config.app_env.is_production());
        assert_eq!(config.session_cookie_names, vec!["sid", "other_sid"]);
        assert_eq!(config.guest_cookie_max_age_days, 7);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[rstest]
    #[case("APP_PORT", "not-a-port")]
    #[case("APP_PORT", "70000")]
    #[case("APP_ENV", "staging")]
    #[case("LOG_FORMAT", "xml")]
    #[case("RUN_MIGRATIONS", "maybe")]
    #[case("DATABASE_MAX_CONNECTIONS", "0")]
    #[case("SESSION_COOKIE_NAMES", " , ")]
    fn invalid_values_name_the_variable(#[case] key: &str, #[case] value: &str) {
        let error = AppConfig::from_lookup(lookup_from(&[(key, value)])).unwrap_err();

        assert!(matches!(error, ConfigError::InvalidValue { key: ref found, .. } if found == key));
    }

    #[rstest]
    fn blank_database_url_means_in_memory() {
        let config = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "  ")])).unwrap();

        assert_eq!(config.database_url, None);
    }
}
