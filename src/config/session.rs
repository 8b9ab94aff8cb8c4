//! Session configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Upper bound accepted for `max_attempts`.
pub const MAX_ATTEMPTS_LIMIT: u32 = 20;

/// Per-session settings
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    /// Site whose data is reported on
    #[serde(default = "default_site_id")]
    pub site_id: String,

    /// Oracle rounds allowed per elicited field
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
}

impl SessionConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.site_id.trim().is_empty() {
            return Err(ValidationError::MissingRequired("session.site_id"));
        }
        if !(1..=MAX_ATTEMPTS_LIMIT).contains(&self.max_attempts) {
            return Err(ValidationError::InvalidMaxAttempts(self.max_attempts));
        }
        Ok(())
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            site_id: default_site_id(),
            max_attempts: default_max_attempts(),
        }
    }
}

fn default_site_id() -> String {
    "111".to_string()
}

fn default_max_attempts() -> u32 {
    5
}
