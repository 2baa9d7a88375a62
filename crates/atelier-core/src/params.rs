//! Generation parameter state.
//!
//! One `ParameterState` snapshot exists per turn. It starts as a copy of the
//! previous turn's end state, is adjusted by the rules engine, and is then
//! frozen into the persisted volley.

use crate::config::AtelierConfig;
use serde::{Deserialize, Serialize};

/// The adjustable knobs sent with every generation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterState {
    /// Identifier of the generation model.
    pub model_id: String,
    /// Optional LoRA layered on top of the base model.
    pub lora_model_id: Option<String>,
    /// How strictly generation follows the prompt versus introducing
    /// variation.
    pub guidance_scale: f32,
    /// Refinement iterations the generation service performs.
    pub steps: u32,
}

impl ParameterState {
    /// Builds the state a brand-new session starts from.
    pub fn initial(config: &AtelierConfig) -> Self {
        Self {
            model_id: config.models.default_model_id.clone(),
            lora_model_id: config.models.lora_model_id.clone(),
            guidance_scale: config.defaults.guidance_scale,
            steps: config.defaults.steps,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEFAULT_MODEL_ID;

    #[test]
    fn test_initial_state_follows_config() {
        let config = AtelierConfig::default();
        let state = ParameterState::initial(&config);

        assert_eq!(state.model_id, DEFAULT_MODEL_ID);
        assert_eq!(state.steps, config.defaults.steps);
        assert_eq!(state.guidance_scale, config.defaults.guidance_scale);
        assert_eq!(state.lora_model_id, None);
    }
}
