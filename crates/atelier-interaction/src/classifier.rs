//! HTTP client for the intent classification gateway.
//!
//! Posts one detector instruction plus the user's utterance per call and
//! decodes the gateway's loosely typed child records into typed signals at
//! this boundary.

use async_trait::async_trait;
use atelier_core::detection::{ChildRecord, Detection, decode_signals};
use atelier_core::error::{AtelierError, Result};
use atelier_core::gateway::{DetectorSpec, IntentClassifier};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Classification gateway client.
#[derive(Clone)]
pub struct HttpIntentClassifier {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpIntentClassifier {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
        }
    }

    /// Adds a bearer token sent with every request.
    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyRequest<'a> {
    detector_id: String,
    instruction_template: &'a str,
    user_text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ClassifyReply {
    #[serde(default)]
    is_error: bool,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    structured_child_results: Vec<ChildRecord>,
}

/// Turns one gateway reply into a typed detection.
fn detection_from_reply(detector: &DetectorSpec, reply: ClassifyReply) -> Result<Detection> {
    if reply.is_error {
        return Err(AtelierError::classification(
            detector.kind.to_string(),
            reply
                .error_message
                .unwrap_or_else(|| "gateway reported an error without a message".to_string()),
        ));
    }

    let signals = decode_signals(detector.kind, &reply.structured_child_results)?;
    Ok(Detection::new(detector.kind, signals))
}

#[async_trait]
impl IntentClassifier for HttpIntentClassifier {
    async fn classify(&self, detector: &DetectorSpec, user_text: &str) -> Result<Detection> {
        let body = ClassifyRequest {
            detector_id: detector.kind.to_string(),
            instruction_template: &detector.instruction,
            user_text,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            AtelierError::classification(
                detector.kind.to_string(),
                format!("gateway request failed: {err}"),
            )
        })?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AtelierError::classification(
                detector.kind.to_string(),
                format!(
                    "gateway returned {} {}",
                    status.as_u16(),
                    status.canonical_reason().unwrap_or("unknown")
                ),
            ));
        }

        let reply: ClassifyReply = response.json().await.map_err(|err| {
            AtelierError::classification(
                detector.kind.to_string(),
                format!("unreadable gateway reply: {err}"),
            )
        })?;

        let detection = detection_from_reply(detector, reply)?;
        tracing::debug!(
            target: "atelier::classify",
            detector = %detector.kind,
            signals = detection.signals.len(),
            "detector finished"
        );
        Ok(detection)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::detection::{DetectorKind, Signal};

    fn text_overlay_spec() -> DetectorSpec {
        DetectorSpec {
            kind: DetectorKind::TextOverlay,
            instruction: "instruction".to_string(),
        }
    }

    #[test]
    fn test_reply_parses_camel_case_wire_format() {
        let reply: ClassifyReply = serde_json::from_str(
            r#"{
                "detectorId": "text_overlay",
                "isError": false,
                "structuredChildResults": [
                    {"key": "text_wanted_on_image", "value": true}
                ]
            }"#,
        )
        .unwrap();

        let detection = detection_from_reply(&text_overlay_spec(), reply).unwrap();
        assert_eq!(detection.signals, vec![Signal::TextWantedOnImage(true)]);
    }

    #[test]
    fn test_gateway_error_flag_becomes_classification_error() {
        let reply: ClassifyReply = serde_json::from_str(
            r#"{"isError": true, "errorMessage": "model unavailable"}"#,
        )
        .unwrap();

        let err = detection_from_reply(&text_overlay_spec(), reply).unwrap_err();
        assert!(err.is_classification());
        assert!(err.to_string().contains("model unavailable"));
    }

    #[test]
    fn test_undecodable_child_record_is_fatal() {
        let reply: ClassifyReply = serde_json::from_str(
            r#"{"structuredChildResults": [{"key": "mood", "value": "happy"}]}"#,
        )
        .unwrap();

        let err = detection_from_reply(&text_overlay_spec(), reply).unwrap_err();
        assert!(err.is_classification());
    }
}
