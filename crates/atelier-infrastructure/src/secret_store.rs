//! Secret storage.
//!
//! API keys are read from `secret.json` in the config directory, with
//! environment variables as the fallback. Configuration priority:
//! secret.json > environment variables.

use atelier_core::error::{AtelierError, Result};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};

const API_KEY_ENV: &str = "ATELIER_API_KEY";
const CLASSIFIER_API_KEY_ENV: &str = "ATELIER_CLASSIFIER_API_KEY";

/// API keys for the external services.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretConfig {
    /// Key for the generation and rewriting services.
    #[serde(default)]
    pub api_key: Option<String>,
    /// Key for the classification gateway; falls back to `api_key` when
    /// unset.
    #[serde(default)]
    pub classifier_api_key: Option<String>,
}

impl SecretConfig {
    /// The key the classification gateway should use.
    pub fn classifier_key(&self) -> Option<&str> {
        self.classifier_api_key
            .as_deref()
            .or(self.api_key.as_deref())
    }
}

/// Reads secrets from a JSON file with environment-variable fallback.
pub struct SecretStore {
    path: PathBuf,
}

impl SecretStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Creates a store at the default location
    /// (`<config_dir>/atelier/secret.json`).
    pub fn default_location() -> Result<Self> {
        let path = crate::paths::AtelierPaths::secret_file()
            .map_err(|e| AtelierError::config(e.to_string()))?;
        Ok(Self::new(path))
    }

    /// Loads the secret configuration.
    ///
    /// A missing file is not an error: each unset field falls back to its
    /// environment variable.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load(&self) -> Result<SecretConfig> {
        let mut config = if self.path.exists() {
            let json = std::fs::read_to_string(&self.path)?;
            serde_json::from_str(&json)?
        } else {
            SecretConfig::default()
        };

        if config.api_key.is_none() {
            config.api_key = env::var(API_KEY_ENV).ok();
        }
        if config.classifier_api_key.is_none() {
            config.classifier_api_key = env::var(CLASSIFIER_API_KEY_ENV).ok();
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_load_from_file() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, r#"{"api_key": "sk-test-123"}"#).unwrap();

        let config = SecretStore::new(&path).load().unwrap();
        assert_eq!(config.api_key.as_deref(), Some("sk-test-123"));
    }

    #[test]
    fn test_classifier_key_falls_back_to_api_key() {
        let config = SecretConfig {
            api_key: Some("sk-shared".to_string()),
            classifier_api_key: None,
        };
        assert_eq!(config.classifier_key(), Some("sk-shared"));

        let config = SecretConfig {
            api_key: Some("sk-shared".to_string()),
            classifier_api_key: Some("sk-classify".to_string()),
        };
        assert_eq!(config.classifier_key(), Some("sk-classify"));
    }

    #[test]
    fn test_malformed_file_is_an_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("secret.json");
        std::fs::write(&path, "not json").unwrap();

        assert!(SecretStore::new(&path).load().is_err());
    }
}
