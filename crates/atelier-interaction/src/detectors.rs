//! Built-in detector presets.
//!
//! Each detector carries the instruction the classification gateway runs it
//! with. Instructions are Jinja2 templates rendered once at registry
//! construction; the registry is built per process and threaded through the
//! orchestrator rather than living in a global.

use atelier_core::detection::DetectorKind;
use atelier_core::error::{AtelierError, Result};
use atelier_core::gateway::DetectorSpec;
use minijinja::{Environment, context};

const TEXT_OVERLAY_INSTRUCTION: &str = r#"You inspect one chat message from a user who is iterating on AI-generated images.
Decide whether the user wants words, labels or lettering rendered inside the image itself.
Mentions of captions outside the image do not count.

Report a boolean record for each of these keys:
{% for key in keys -%}
- {{ key }}
{% endfor %}"#;

const QUALITY_INSTRUCTION: &str = r#"You inspect one chat message from a user who is iterating on AI-generated images.
Decide whether the message complains about output quality or about turnaround time.
"Blurry", "muddy", "lacking detail" are quality complaints; "taking forever", "too slow" are speed complaints.

Report a boolean record for each of these keys:
{% for key in keys -%}
- {{ key }}
{% endfor %}"#;

const CONTENT_INSTRUCTION: &str = r#"You inspect one chat message from a user who is iterating on AI-generated images.
Decide whether the message complains that the image shows the wrong subject or content,
or that the results are boring and too similar to earlier images.

Report a boolean record for each of these keys:
{% for key in keys -%}
- {{ key }}
{% endfor %}"#;

/// Builds the full set of detectors every turn runs.
///
/// # Errors
///
/// Returns an error if an instruction template fails to render.
pub fn builtin_detectors() -> Result<Vec<DetectorSpec>> {
    Ok(vec![
        spec(
            DetectorKind::TextOverlay,
            TEXT_OVERLAY_INSTRUCTION,
            &["text_wanted_on_image"],
        )?,
        spec(
            DetectorKind::Quality,
            QUALITY_INSTRUCTION,
            &["low_detail", "too_slow"],
        )?,
        spec(
            DetectorKind::Content,
            CONTENT_INSTRUCTION,
            &["wrong_content", "too_similar"],
        )?,
    ])
}

fn spec(kind: DetectorKind, template: &str, keys: &[&str]) -> Result<DetectorSpec> {
    let env = Environment::new();
    let instruction = env
        .render_str(template, context! { keys => keys })
        .map_err(|e| {
            AtelierError::internal(format!("detector template for '{kind}' failed: {e}"))
        })?;

    Ok(DetectorSpec { kind, instruction })
}
