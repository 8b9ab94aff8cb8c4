//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `SITE_INSIGHT` prefix and nested values use double underscores as separators.
//! Every value has a default except the OpenAI API key.
//!
//! # Example
//!
//! ```no_run
//! use site_insight::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Reporting on site {}", config.session.site_id);
//! ```

mod ai;
mod data;
mod error;
mod logging;
mod session;

pub use ai::AiConfig;
pub use data::DataConfig;
pub use error::{ConfigError, ValidationError};
pub use logging::{LogFormat, LoggingConfig};
pub use session::{SessionConfig, MAX_ATTEMPTS_LIMIT};

use secrecy::Secret;
use serde::Deserialize;

/// Conventional variable consulted when `SITE_INSIGHT__AI__OPENAI_API_KEY` is unset.
pub const OPENAI_API_KEY_FALLBACK: &str = "OPENAI_API_KEY";

/// Root application configuration
///
/// Load using [`AppConfig::load()`] which reads from environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Oracle provider (OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// CSV export locations
    #[serde(default)]
    pub data: DataConfig,

    /// Site and elicitation budget
    #[serde(default)]
    pub session: SessionConfig,

    /// Log filter and format
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `SITE_INSIGHT` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    /// 5. Falls back to `OPENAI_API_KEY` for the API key
    ///
    /// # Environment Variable Format
    ///
    /// - `SITE_INSIGHT__AI__MODEL=gpt-4o` -> `ai.model = gpt-4o`
    /// - `SITE_INSIGHT__SESSION__MAX_ATTEMPTS=3` -> `session.max_attempts = 3`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let mut config: AppConfig = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("SITE_INSIGHT")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        if !config.ai.has_openai() {
            if let Ok(key) = std::env::var(OPENAI_API_KEY_FALLBACK) {
                config.ai.openai_api_key = Some(Secret::new(key));
            }
        }

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.ai.validate()?;
        self.data.validate()?;
        self.session.validate()?;
        self.logging.validate()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use std::env;
    use std::path::PathBuf;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "SITE_INSIGHT__AI__OPENAI_API_KEY",
        "SITE_INSIGHT__AI__MODEL",
        "SITE_INSIGHT__SESSION__SITE_ID",
        "SITE_INSIGHT__SESSION__MAX_ATTEMPTS",
        "SITE_INSIGHT__DATA__SITE_CSV",
        "SITE_INSIGHT__LOGGING__FORMAT",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_load_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let result = AppConfig::load();

        assert!(result.is_ok(), "Failed to load config: {:?}", result.err());
        let config = result.unwrap();
        assert_eq!(config.ai.model, "gpt-4o-mini");
        assert_eq!(config.session.site_id, "111");
        assert_eq!(config.session.max_attempts, 5);
        assert_eq!(config.data.landing_page_csv, PathBuf::from("landingpage_data.csv"));
        assert_eq!(config.logging.format, LogFormat::Pretty);
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("SITE_INSIGHT__AI__OPENAI_API_KEY", "sk-test");
        env::set_var("SITE_INSIGHT__AI__MODEL", "gpt-4o");
        env::set_var("SITE_INSIGHT__SESSION__SITE_ID", "222");
        env::set_var("SITE_INSIGHT__SESSION__MAX_ATTEMPTS", "3");
        env::set_var("SITE_INSIGHT__DATA__SITE_CSV", "/data/sites.csv");
        env::set_var("SITE_INSIGHT__LOGGING__FORMAT", "json");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(
            config.ai.openai_api_key.as_ref().map(|k| k.expose_secret().as_str()),
            Some("sk-test")
        );
        assert_eq!(config.ai.model, "gpt-4o");
        assert_eq!(config.session.site_id, "222");
        assert_eq!(config.session.max_attempts, 3);
        assert_eq!(config.data.site_csv, PathBuf::from("/data/sites.csv"));
        assert_eq!(config.logging.format, LogFormat::Json);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_catches_section_errors() {
        let mut config = AppConfig::default();
        config.ai.openai_api_key = Some(Secret::new("sk-test".to_string()));
        assert!(config.validate().is_ok());

        config.session.max_attempts = 0;
        assert!(matches!(
            config.validate(),
            Err(ValidationError::InvalidMaxAttempts(0))
        ));
    }
}
