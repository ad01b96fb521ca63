//! Configuration management for the exporter.
//!
//! Handles loading configuration from TOML files and environment variables.
//! Credentials are deliberately excluded from the file format: they are only
//! accepted per invocation (CLI flags or ODPS_* environment variables) and are
//! never written anywhere.

use crate::error::{ExportError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use url::Url;

/// Default warehouse project when none is configured.
pub const DEFAULT_PROJECT: &str = "HSAY_ETL";

/// Default warehouse endpoint when none is configured.
pub const DEFAULT_ENDPOINT: &str = "http://service.cn-shanghai.maxcompute.aliyun.com/api";

/// Access credentials for a single export session.
///
/// Held by value for the duration of one request and dropped afterwards.
/// `Debug` redacts the secret so credentials can never leak through logs.
#[derive(Clone)]
pub struct Credentials {
    /// Access key id.
    pub access_id: String,

    /// Access key secret.
    pub access_secret: String,
}

impl Credentials {
    /// Creates credentials from the given id and secret.
    pub fn new(access_id: impl Into<String>, access_secret: impl Into<String>) -> Self {
        Self {
            access_id: access_id.into(),
            access_secret: access_secret.into(),
        }
    }

    /// Validates that both fields are non-empty.
    ///
    /// This runs before any network activity is attempted.
    pub fn validate(&self) -> Result<()> {
        if self.access_id.trim().is_empty() {
            return Err(ExportError::invalid_credentials(
                "access id must not be empty",
            ));
        }
        if self.access_secret.trim().is_empty() {
            return Err(ExportError::invalid_credentials(
                "access secret must not be empty",
            ));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_id", &self.access_id)
            .field("access_secret", &"<redacted>")
            .finish()
    }
}

/// Export pipeline configuration (no secrets).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExportConfig {
    /// Warehouse project name.
    pub project: Option<String>,

    /// Warehouse service endpoint URL.
    pub endpoint: Option<String>,

    /// Hard ceiling applied to every requested row limit.
    #[serde(default = "default_row_limit_ceiling")]
    pub row_limit_ceiling: usize,

    /// Rows per sheet in the output workbook.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
}

fn default_row_limit_ceiling() -> usize {
    crate::query::DEFAULT_ROW_LIMIT_CEILING
}

fn default_chunk_size() -> usize {
    crate::export::DEFAULT_CHUNK_SIZE
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            project: None,
            endpoint: None,
            row_limit_ceiling: default_row_limit_ceiling(),
            chunk_size: default_chunk_size(),
        }
    }
}

impl ExportConfig {
    /// Applies environment variables (ODPS_PROJECT, ODPS_ENDPOINT) as defaults.
    pub fn apply_env_defaults(&mut self) {
        if self.project.is_none() {
            self.project = std::env::var("ODPS_PROJECT").ok();
        }
        if self.endpoint.is_none() {
            self.endpoint = std::env::var("ODPS_ENDPOINT").ok();
        }
    }

    /// Returns the effective project name.
    pub fn project(&self) -> &str {
        self.project.as_deref().unwrap_or(DEFAULT_PROJECT)
    }

    /// Parses the effective endpoint as a URL.
    pub fn endpoint_url(&self) -> Result<Url> {
        let raw = self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT);
        Url::parse(raw).map_err(|e| ExportError::config(format!("Invalid endpoint '{raw}': {e}")))
    }

    /// Validates the configuration, failing fast on unusable values.
    pub fn validate(&self) -> Result<()> {
        self.endpoint_url()?;
        if self.project().trim().is_empty() {
            return Err(ExportError::config("project must not be empty"));
        }
        if self.row_limit_ceiling == 0 {
            return Err(ExportError::config("row_limit_ceiling must be positive"));
        }
        if self.chunk_size == 0 {
            return Err(ExportError::config("chunk_size must be positive"));
        }
        Ok(())
    }

    /// Returns a display-safe string for log output.
    pub fn display_string(&self) -> String {
        format!(
            "{} @ {}",
            self.project(),
            self.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
        )
    }
}

/// Top-level configuration file structure.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Export pipeline settings.
    #[serde(default)]
    pub export: ExportConfig,
}

impl Config {
    /// Returns the default config file path for the current platform.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("odps-export")
            .join("config.toml")
    }

    /// Loads configuration from a TOML file.
    ///
    /// A missing file yields the default configuration.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .map_err(|e| ExportError::config(format!("Failed to read config file: {e}")))?;

        Self::parse_toml(&content, path)
    }

    /// Parses configuration from a TOML string.
    fn parse_toml(content: &str, path: &Path) -> Result<Self> {
        toml::from_str(content).map_err(|e| {
            ExportError::config(format!(
                "Configuration error in {}:\n  {}",
                path.display(),
                e
            ))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_config() {
        let toml = r#"
[export]
project = "hsay_etl_dev"
endpoint = "http://warehouse.example.com/api"
row_limit_ceiling = 1000000
chunk_size = 400000
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.export.project, Some("hsay_etl_dev".to_string()));
        assert_eq!(
            config.export.endpoint,
            Some("http://warehouse.example.com/api".to_string())
        );
        assert_eq!(config.export.row_limit_ceiling, 1_000_000);
        assert_eq!(config.export.chunk_size, 400_000);
    }

    #[test]
    fn test_missing_optional_fields() {
        let toml = r#"
[export]
project = "hsay_etl_dev"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.export.project, Some("hsay_etl_dev".to_string()));
        assert_eq!(config.export.endpoint, None);
        assert_eq!(config.export.row_limit_ceiling, 500_000);
        assert_eq!(config.export.chunk_size, 800_000);
    }

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.export.project(), DEFAULT_PROJECT);
        assert_eq!(config.export.row_limit_ceiling, 500_000);
        assert_eq!(config.export.chunk_size, 800_000);
        assert!(config.export.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ceiling() {
        let config = ExportConfig {
            row_limit_ceiling: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("row_limit_ceiling"));
    }

    #[test]
    fn test_validate_rejects_zero_chunk_size() {
        let config = ExportConfig {
            chunk_size: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("chunk_size"));
    }

    #[test]
    fn test_validate_rejects_bad_endpoint() {
        let config = ExportConfig {
            endpoint: Some("not a url".to_string()),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("Invalid endpoint"));
    }

    #[test]
    fn test_credentials_validate_empty_id() {
        let creds = Credentials::new("", "secret");
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("access id"));
    }

    #[test]
    fn test_credentials_validate_empty_secret() {
        let creds = Credentials::new("AKID123", "  ");
        let err = creds.validate().unwrap_err();
        assert!(err.to_string().contains("access secret"));
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let creds = Credentials::new("AKID123", "super-secret");
        let debug = format!("{creds:?}");
        assert!(debug.contains("AKID123"));
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_display_string_has_no_secret() {
        let config = ExportConfig {
            project: Some("proj".to_string()),
            endpoint: Some("http://warehouse.example.com/api".to_string()),
            ..Default::default()
        };
        assert_eq!(
            config.display_string(),
            "proj @ http://warehouse.example.com/api"
        );
    }
}
