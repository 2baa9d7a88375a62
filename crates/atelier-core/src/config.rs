//! Engine configuration.
//!
//! All tunable values live in one `AtelierConfig` tree that is loaded from
//! `config.toml` once at startup and passed down by reference. Nothing in the
//! engine mutates configuration after construction.

use crate::error::Result;
use crate::rules::AdjustmentLimits;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Model used when a session starts and no prior state exists.
pub const DEFAULT_MODEL_ID: &str = "luma-diffusion-v2";

/// Model variant that renders legible text inside the image.
pub const TEXT_CAPABLE_MODEL_ID: &str = "luma-typeset-v1";

/// Root configuration for the engine.
#[derive(Deserialize, Serialize, Debug, Clone, Default, PartialEq)]
pub struct AtelierConfig {
    #[serde(default)]
    pub models: ModelSettings,
    #[serde(default)]
    pub defaults: DefaultsSettings,
    #[serde(default)]
    pub generation: GenerationSettings,
    #[serde(default)]
    pub services: ServiceSettings,
    #[serde(default)]
    pub adjustments: AdjustmentLimits,
}

/// Model identifiers known to the generation service.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ModelSettings {
    /// Model every new session starts on.
    pub default_model_id: String,
    /// Variant the rules engine switches to when text on the image is wanted.
    pub text_model_id: String,
    /// Optional LoRA applied on top of the base model.
    #[serde(default)]
    pub lora_model_id: Option<String>,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            default_model_id: DEFAULT_MODEL_ID.to_string(),
            text_model_id: TEXT_CAPABLE_MODEL_ID.to_string(),
            lora_model_id: None,
        }
    }
}

/// Starting parameter values for a fresh session.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct DefaultsSettings {
    pub guidance_scale: f32,
    pub steps: u32,
}

impl Default for DefaultsSettings {
    fn default() -> Self {
        Self {
            guidance_scale: 7.5,
            steps: 30,
        }
    }
}

/// Per-request knobs for the generation service.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct GenerationSettings {
    pub width: u32,
    pub height: u32,
    pub image_count: u32,
    /// Retry budget for transient overload responses.
    pub max_retries: u32,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            width: 1024,
            height: 1024,
            image_count: 4,
            max_retries: 3,
        }
    }
}

/// Endpoints of the external collaborators.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct ServiceSettings {
    pub generation_url: String,
    pub classifier_url: String,
    pub rewriter_url: String,
}

impl Default for ServiceSettings {
    fn default() -> Self {
        Self {
            generation_url: "https://api.luma-render.dev/v1/generations".to_string(),
            classifier_url: "https://api.luma-render.dev/v1/classify".to_string(),
            rewriter_url: "https://api.luma-render.dev/v1/rewrite".to_string(),
        }
    }
}

impl AtelierConfig {
    /// Parses a configuration from TOML text.
    ///
    /// Missing sections fall back to their defaults, so a partial file is
    /// valid.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }

    /// Loads the configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Loads the configuration from a file, falling back to defaults when the
    /// file does not exist.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }
}
