//! Typed detection results.
//!
//! The classification gateway returns loosely typed key/value records. This
//! module decodes them into strongly typed signals exactly once, at the
//! boundary: an unexpected key or a value of the wrong type is a decode error
//! rather than a silently ignored record.

use crate::error::{AtelierError, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use strum::Display;

/// The independent classifiers that run against every utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DetectorKind {
    /// Does the user want words or lettering rendered on the image?
    TextOverlay,
    /// Quality complaints: blurry output, slow turnaround.
    Quality,
    /// Content complaints: wrong subject, too repetitive.
    Content,
}

/// One key/value record as produced by the classification gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChildRecord {
    pub key: String,
    pub value: Value,
}

/// A decoded, strongly typed detection signal.
///
/// Signals carry their boolean verdict so a definitive "no" can be told apart
/// from a detector that never mentioned the topic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Signal {
    /// The user wants text rendered on the image.
    TextWantedOnImage(bool),
    /// The output was called blurry or lacking detail.
    LowDetail(bool),
    /// The user complained that generation takes too long.
    TooSlow(bool),
    /// The output showed the wrong subject or content.
    WrongContent(bool),
    /// The output was called boring or too similar to earlier images.
    TooSimilar(bool),
}

impl Signal {
    /// Whether this signal asserts its condition.
    pub fn is_set(&self) -> bool {
        match self {
            Signal::TextWantedOnImage(v)
            | Signal::LowDetail(v)
            | Signal::TooSlow(v)
            | Signal::WrongContent(v)
            | Signal::TooSimilar(v) => *v,
        }
    }
}

/// The decoded result of one detector for one turn.
///
/// Ephemeral during the turn; a copy is frozen into the persisted volley for
/// audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Detection {
    pub detector: DetectorKind,
    pub signals: Vec<Signal>,
}

impl Detection {
    pub fn new(detector: DetectorKind, signals: Vec<Signal>) -> Self {
        Self { detector, signals }
    }
}

/// Decodes the gateway's child records for one detector into typed signals.
///
/// Record order is preserved. Every record must carry a key the detector is
/// allowed to emit and a boolean value.
///
/// # Errors
///
/// Returns a `Decode` error on an unknown key, a key belonging to a different
/// detector, or a non-boolean value.
pub fn decode_signals(detector: DetectorKind, records: &[ChildRecord]) -> Result<Vec<Signal>> {
    records
        .iter()
        .map(|record| decode_record(detector, record))
        .collect()
}

fn decode_record(detector: DetectorKind, record: &ChildRecord) -> Result<Signal> {
    let flag = record.value.as_bool().ok_or_else(|| {
        AtelierError::decode(
            detector.to_string(),
            format!(
                "expected boolean for key '{}', got {}",
                record.key, record.value
            ),
        )
    })?;

    match (detector, record.key.as_str()) {
        (DetectorKind::TextOverlay, "text_wanted_on_image") => Ok(Signal::TextWantedOnImage(flag)),
        (DetectorKind::Quality, "low_detail") => Ok(Signal::LowDetail(flag)),
        (DetectorKind::Quality, "too_slow") => Ok(Signal::TooSlow(flag)),
        (DetectorKind::Content, "wrong_content") => Ok(Signal::WrongContent(flag)),
        (DetectorKind::Content, "too_similar") => Ok(Signal::TooSimilar(flag)),
        (_, key) => Err(AtelierError::decode(
            detector.to_string(),
            format!("unexpected key '{key}'"),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(key: &str, value: Value) -> ChildRecord {
        ChildRecord {
            key: key.to_string(),
            value,
        }
    }

    #[test]
    fn test_decode_text_overlay() {
        let signals = decode_signals(
            DetectorKind::TextOverlay,
            &[record("text_wanted_on_image", json!(true))],
        )
        .unwrap();

        assert_eq!(signals, vec![Signal::TextWantedOnImage(true)]);
    }

    #[test]
    fn test_decode_preserves_record_order() {
        let signals = decode_signals(
            DetectorKind::Quality,
            &[
                record("too_slow", json!(false)),
                record("low_detail", json!(true)),
            ],
        )
        .unwrap();

        assert_eq!(
            signals,
            vec![Signal::TooSlow(false), Signal::LowDetail(true)]
        );
    }

    #[test]
    fn test_decode_rejects_unknown_key() {
        let err = decode_signals(
            DetectorKind::Content,
            &[record("sentiment", json!(true))],
        )
        .unwrap_err();

        assert!(err.is_classification());
        assert!(err.to_string().contains("sentiment"));
    }

    #[test]
    fn test_decode_rejects_key_from_other_detector() {
        // A valid key on the wrong detector must not decode
        let err = decode_signals(
            DetectorKind::Quality,
            &[record("wrong_content", json!(true))],
        )
        .unwrap_err();

        assert!(err.is_classification());
    }

    #[test]
    fn test_decode_rejects_non_boolean_value() {
        let err = decode_signals(
            DetectorKind::TextOverlay,
            &[record("text_wanted_on_image", json!("yes"))],
        )
        .unwrap_err();

        assert!(err.to_string().contains("expected boolean"));
    }

    #[test]
    fn test_detector_kind_display() {
        assert_eq!(DetectorKind::TextOverlay.to_string(), "text_overlay");
        assert_eq!(DetectorKind::Quality.to_string(), "quality");
    }
}
