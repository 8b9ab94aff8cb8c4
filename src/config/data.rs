//! Data file configuration

use serde::Deserialize;
use std::path::PathBuf;

use super::error::ValidationError;

/// Locations of the CSV exports
#[derive(Debug, Clone, Deserialize)]
pub struct DataConfig {
    /// Page-analytics export
    #[serde(default = "default_landing_page_csv")]
    pub landing_page_csv: PathBuf,

    /// Site/service descriptor export
    #[serde(default = "default_site_csv")]
    pub site_csv: PathBuf,
}

impl DataConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.landing_page_csv.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("data.landing_page_csv"));
        }
        if self.site_csv.as_os_str().is_empty() {
            return Err(ValidationError::MissingRequired("data.site_csv"));
        }
        Ok(())
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            landing_page_csv: default_landing_page_csv(),
            site_csv: default_site_csv(),
        }
    }
}

fn default_landing_page_csv() -> PathBuf {
    PathBuf::from("landingpage_data.csv")
}

fn default_site_csv() -> PathBuf {
    PathBuf::from("site_data.csv")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_data_defaults() {
        let config = DataConfig::default();
        assert_eq!(config.landing_page_csv, PathBuf::from("landingpage_data.csv"));
        assert_eq!(config.site_csv, PathBuf::from("site_data.csv"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_empty_path_rejected() {
        let config = DataConfig {
            site_csv: PathBuf::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }
}
