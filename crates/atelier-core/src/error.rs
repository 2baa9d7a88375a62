//! Error types for the Atelier engine.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A shared error type for the entire Atelier engine.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AtelierError {
    /// Invalid caller input (empty identifiers, blank utterances)
    #[error("Validation error: {0}")]
    Validation(String),

    /// A detector reported an error while classifying the utterance
    #[error("Detector '{detector}' failed: {message}")]
    Classification { detector: String, message: String },

    /// Detector output did not match the expected typed shape
    #[error("Could not decode output of detector '{detector}': {message}")]
    Decode { detector: String, message: String },

    /// The rewriting service returned an empty or unusable prompt
    #[error("Prompt rewrite failed: {0}")]
    Rewrite(String),

    /// The generation service stayed overloaded past the retry budget
    #[error("Generation service overloaded after {attempts} attempts")]
    Overloaded { attempts: u32 },

    /// The generation service failed with a non-retryable status
    #[error("Generation request to {endpoint} failed: {status_code} {status_text}")]
    Generation {
        status_code: u16,
        status_text: String,
        endpoint: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AtelierError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a Validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Creates a Classification error
    pub fn classification(detector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Classification {
            detector: detector.into(),
            message: message.into(),
        }
    }

    /// Creates a Decode error
    pub fn decode(detector: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Decode {
            detector: detector.into(),
            message: message.into(),
        }
    }

    /// Creates a Rewrite error
    pub fn rewrite(message: impl Into<String>) -> Self {
        Self::Rewrite(message.into())
    }

    /// Creates a Generation error carrying the failing status and endpoint
    pub fn generation(
        status_code: u16,
        status_text: impl Into<String>,
        endpoint: impl Into<String>,
    ) -> Self {
        Self::Generation {
            status_code,
            status_text: status_text.into(),
            endpoint: endpoint.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Config error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a Validation error
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Check if this is a Classification or Decode error
    pub fn is_classification(&self) -> bool {
        matches!(self, Self::Classification { .. } | Self::Decode { .. })
    }

    /// Check if this is an exhausted-retry overload error
    pub fn is_overloaded(&self) -> bool {
        matches!(self, Self::Overloaded { .. })
    }

    /// Check if this is a fatal generation error
    pub fn is_generation(&self) -> bool {
        matches!(self, Self::Generation { .. })
    }

    /// Check if this is an IO error
    pub fn is_io(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for AtelierError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for AtelierError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for AtelierError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for AtelierError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from anyhow::Error (transitional, should be removed eventually)
impl From<anyhow::Error> for AtelierError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A type alias for `Result<T, AtelierError>`.
pub type Result<T> = std::result::Result<T, AtelierError>;
