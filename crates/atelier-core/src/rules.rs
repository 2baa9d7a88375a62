//! Parameter adjustment rules engine.
//!
//! A pure mapping from one turn's detections onto the parameter state. Rules
//! run in a fixed order with fixed tie-breaks; every adjustment is a single
//! delta per turn, so duplicate signals of the same kind collapse to one
//! occurrence.

use crate::config::ModelSettings;
use crate::detection::{Detection, Signal};
use crate::params::ParameterState;
use serde::{Deserialize, Serialize};

/// Adjustment step sizes and clamps.
///
/// Both knobs are clamped on both ends so that repeated same-direction
/// complaints across many turns cannot grow them without bound.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
pub struct AdjustmentLimits {
    /// How much one quality/speed complaint moves `steps`.
    pub step_unit: u32,
    /// How much one content/variety complaint moves `guidance_scale`.
    pub guidance_unit: f32,
    pub min_steps: u32,
    pub max_steps: u32,
    pub min_guidance: f32,
    pub max_guidance: f32,
}

impl Default for AdjustmentLimits {
    fn default() -> Self {
        Self {
            step_unit: 10,
            guidance_unit: 1.0,
            min_steps: 10,
            max_steps: 150,
            min_guidance: 1.0,
            max_guidance: 20.0,
        }
    }
}

/// Applies the turn's detections to `state`, producing the adjusted state and
/// human-readable descriptions of every change made.
///
/// Rule order and tie-breaks:
/// 1. Text wanted on the image switches `model_id` to the text-capable
///    variant. The switch is sticky: a later turn without the signal never
///    switches back.
/// 2. A low-detail complaint raises `steps` by one unit.
/// 3. A too-slow complaint lowers `steps` by one unit, never below
///    `min_steps`.
/// 4. Wrong-content and too-similar complaints are weighed together: wrong
///    content always tightens `guidance_scale`; only when it is absent does a
///    too-similar complaint loosen it.
pub fn adjust(
    state: &ParameterState,
    detections: &[Detection],
    models: &ModelSettings,
    limits: &AdjustmentLimits,
) -> (ParameterState, Vec<String>) {
    let mut next = state.clone();
    let mut changes = Vec::new();

    if signal_set(detections, |s| matches!(s, Signal::TextWantedOnImage(_)))
        && next.model_id != models.text_model_id
    {
        next.model_id = models.text_model_id.clone();
        changes.push(format!(
            "Switched to the text-capable model '{}' so lettering renders cleanly.",
            next.model_id
        ));
    }

    if signal_set(detections, |s| matches!(s, Signal::LowDetail(_))) {
        next.steps = (next.steps + limits.step_unit).min(limits.max_steps);
        changes.push(format!(
            "Raised refinement steps to {} for more detail.",
            next.steps
        ));
    }

    if signal_set(detections, |s| matches!(s, Signal::TooSlow(_))) {
        next.steps = next
            .steps
            .saturating_sub(limits.step_unit)
            .max(limits.min_steps);
        changes.push(format!(
            "Lowered refinement steps to {} for a faster turnaround.",
            next.steps
        ));
    }

    let wrong_content = signal_set(detections, |s| matches!(s, Signal::WrongContent(_)));
    let too_similar = signal_set(detections, |s| matches!(s, Signal::TooSimilar(_)));

    if wrong_content {
        next.guidance_scale = (next.guidance_scale + limits.guidance_unit).min(limits.max_guidance);
        if too_similar {
            changes.push(format!(
                "Tightened prompt guidance to {:.1}; getting the content right takes priority over extra variety.",
                next.guidance_scale
            ));
        } else {
            changes.push(format!(
                "Tightened prompt guidance to {:.1} to stay on subject.",
                next.guidance_scale
            ));
        }
    } else if too_similar {
        next.guidance_scale = (next.guidance_scale - limits.guidance_unit).max(limits.min_guidance);
        changes.push(format!(
            "Loosened prompt guidance to {:.1} to allow more variety.",
            next.guidance_scale
        ));
    }

    (next, changes)
}

/// True when any detection carries a matching signal that asserts itself.
fn signal_set(detections: &[Detection], matcher: impl Fn(&Signal) -> bool) -> bool {
    detections
        .iter()
        .flat_map(|d| d.signals.iter())
        .any(|s| matcher(s) && s.is_set())
}
