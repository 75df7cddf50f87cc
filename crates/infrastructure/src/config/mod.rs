//! Application configuration
//!
//! Split into focused sub-modules:
//! - `ability`: role policies and ability cache
//! - `audit`: audit sink backend
//!
//! Telemetry settings live next to the subscriber in [`crate::telemetry`].

mod ability;
mod audit;

use std::{fmt, path::Path};

use serde::{Deserialize, Serialize};
use tracing::warn;

pub use ability::AbilityAppConfig;
pub use audit::{AuditAppConfig, AuditBackend};

use crate::telemetry::TelemetryConfig;

/// Prefix of configuration environment variables
pub const ENV_PREFIX: &str = "TENANTRY";

/// Application environment (development or production)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Development environment - relaxed validation
    #[default]
    Development,
    /// Production environment - strict validation
    Production,
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Development => write!(f, "development"),
            Self::Production => write!(f, "production"),
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            _ => Err(format!(
                "Invalid environment: {s}. Use 'development' or 'production'"
            )),
        }
    }
}

/// Main application configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub environment: Environment,

    /// Logging configuration
    #[serde(default)]
    pub telemetry: TelemetryConfig,

    /// Authorization configuration
    #[serde(default)]
    pub ability: AbilityAppConfig,

    /// Audit sink configuration
    #[serde(default)]
    pub audit: AuditAppConfig,
}

impl AppConfig {
    /// Load configuration from `config.toml` (optional) and the environment
    ///
    /// Environment variables use the `TENANTRY_` prefix and `__` between
    /// nested keys, e.g. `TENANTRY_AUDIT__BACKEND=sqlite`.
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::build(config::File::with_name("config").required(false))
    }

    /// Load configuration from an explicit file, still honoring the environment
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, config::ConfigError> {
        Self::build(config::File::from(path.as_ref()).required(true))
    }

    fn build<S>(file: S) -> Result<Self, config::ConfigError>
    where
        S: config::Source + Send + Sync + 'static,
    {
        let config = config::Config::builder()
            .set_default("environment", "development")?
            .set_default("audit.backend", "memory")?
            .add_source(file)
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?;

        let loaded: Self = config.try_deserialize()?;
        loaded.validate()?;
        Ok(loaded)
    }

    /// Reject settings the adapters cannot run with
    pub fn validate(&self) -> Result<(), config::ConfigError> {
        if self.ability.max_cached_actors == 0 {
            return Err(config::ConfigError::Message(
                "ability.max_cached_actors must be greater than zero".to_string(),
            ));
        }
        if self.audit.backend == AuditBackend::Sqlite && self.audit.database_url.trim().is_empty() {
            return Err(config::ConfigError::Message(
                "audit.database_url is required for the sqlite backend".to_string(),
            ));
        }
        if self.environment == Environment::Production {
            if self.audit.backend == AuditBackend::Memory {
                warn!("In-memory audit sink in production; records are lost on restart");
            }
            if self.ability.roles.is_empty() {
                warn!("No role policies configured; every operation will be forbidden");
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn environment_default_is_development() {
        assert_eq!(Environment::default(), Environment::Development);
    }

    #[test]
    fn environment_from_str() {
        assert_eq!("dev".parse::<Environment>().unwrap(), Environment::Development);
        assert_eq!("PRODUCTION".parse::<Environment>().unwrap(), Environment::Production);
        assert_eq!("prod".parse::<Environment>().unwrap(), Environment::Production);

        let err = "staging".parse::<Environment>().unwrap_err();
        assert!(err.contains("Invalid environment"));
    }

    #[test]
    fn environment_serde_is_lowercase() {
        assert_eq!(serde_json::to_string(&Environment::Production).unwrap(), "\"production\"");
        let env: Environment = serde_json::from_str("\"development\"").unwrap();
        assert_eq!(env, Environment::Development);
    }

    #[test]
    fn app_config_default() {
        let config = AppConfig::default();
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.audit.backend, AuditBackend::Memory);
        assert_eq!(config.ability.cache_ttl_secs, 300);
        assert!(config.ability.roles.is_empty());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn load_from_file_reads_every_section() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        write!(
            file,
            r#"
environment = "production"

[telemetry]
log_filter = "debug"
json = true

[ability]
cache_ttl_secs = 30

[[ability.roles.viewer]]
action = "read"
subject = "User"

[[ability.roles.admin]]
action = "manage"
subject = "all"

[audit]
backend = "sqlite"
database_url = "sqlite::memory:"
"#
        )
        .unwrap();

        let config = AppConfig::load_from(file.path()).unwrap();

        assert_eq!(config.environment, Environment::Production);
        assert!(config.telemetry.json);
        assert_eq!(config.telemetry.log_filter, "debug");
        assert_eq!(config.ability.cache_ttl_secs, 30);
        assert_eq!(config.ability.roles["viewer"][0].action, "read");
        assert_eq!(config.ability.roles["admin"][0].subject, "all");
        assert_eq!(config.audit.backend, AuditBackend::Sqlite);
    }

    #[test]
    fn validate_rejects_sqlite_without_url() {
        let mut config = AppConfig::default();
        config.audit.backend = AuditBackend::Sqlite;
        config.audit.database_url = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_rejects_zero_cache_capacity() {
        let mut config = AppConfig::default();
        config.ability.max_cached_actors = 0;
        assert!(config.validate().is_err());
    }
}
