//! HTTP client for the text rewriting service.
//!
//! Sends the running conversation context plus the latest utterance and
//! expects a JSON object back. Malformed replies go through
//! [`crate::repair::repair_json`] before parsing; a reply that still does not
//! parse, or parses to an empty prompt, is fatal.

use crate::repair::repair_json;
use async_trait::async_trait;
use atelier_core::error::{AtelierError, Result};
use atelier_core::gateway::{ContextMessage, PromptRewriter, RewrittenPrompt};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Rewriting service client.
#[derive(Clone)]
pub struct HttpPromptRewriter {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
}

impl HttpPromptRewriter {
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
struct RewriteRequest<'a> {
    context: &'a [ContextMessage],
    user_text: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RewriteReply {
    #[serde(default)]
    prompt: String,
    #[serde(default)]
    negative_prompt: Option<String>,
    #[serde(default)]
    has_complaints: bool,
}

/// Parses the service's reply text, repairing almost-JSON first.
fn parse_reply(raw: &str) -> Result<RewrittenPrompt> {
    let reply: RewriteReply = match serde_json::from_str(raw) {
        Ok(reply) => reply,
        Err(_) => {
            let repaired = repair_json(raw);
            serde_json::from_str(&repaired).map_err(|err| {
                AtelierError::rewrite(format!("unparseable rewriter reply: {err}"))
            })?
        }
    };

    let prompt = reply.prompt.trim().to_string();
    if prompt.is_empty() {
        return Err(AtelierError::rewrite(
            "rewriter returned an empty refined prompt",
        ));
    }

    Ok(RewrittenPrompt {
        prompt,
        negative_prompt: reply
            .negative_prompt
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty()),
        has_complaints: reply.has_complaints,
    })
}

#[async_trait]
impl PromptRewriter for HttpPromptRewriter {
    async fn rewrite(
        &self,
        context: &[ContextMessage],
        user_text: &str,
    ) -> Result<RewrittenPrompt> {
        let body = RewriteRequest { context, user_text };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|err| AtelierError::rewrite(format!("rewriter request failed: {err}")))?;

        if !response.status().is_success() {
            let status = response.status();
            return Err(AtelierError::rewrite(format!(
                "rewriter returned {} {}",
                status.as_u16(),
                status.canonical_reason().unwrap_or("unknown")
            )));
        }

        let raw = response
            .text()
            .await
            .map_err(|err| AtelierError::rewrite(format!("unreadable rewriter reply: {err}")))?;

        let rewritten = parse_reply(&raw)?;
        tracing::debug!(
            target: "atelier::rewrite",
            has_complaints = rewritten.has_complaints,
            "prompt refined"
        );
        Ok(rewritten)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_clean_reply() {
        let rewritten = parse_reply(
            r#"{"prompt": "a red fox, studio light", "negativePrompt": "blur", "hasComplaints": true}"#,
        )
        .unwrap();

        assert_eq!(rewritten.prompt, "a red fox, studio light");
        assert_eq!(rewritten.negative_prompt.as_deref(), Some("blur"));
        assert!(rewritten.has_complaints);
    }

    #[test]
    fn test_repairs_fenced_reply_with_unquoted_keys() {
        let rewritten = parse_reply(
            "```json\n{prompt: \"a red fox\", hasComplaints: false,}\n```",
        )
        .unwrap();

        assert_eq!(rewritten.prompt, "a red fox");
        assert!(!rewritten.has_complaints);
    }

    #[test]
    fn test_empty_prompt_is_fatal() {
        let err = parse_reply(r#"{"prompt": "   "}"#).unwrap_err();
        assert!(err.to_string().contains("empty refined prompt"));
    }

    #[test]
    fn test_unrepairable_reply_is_fatal() {
        let err = parse_reply("I would rather not").unwrap_err();
        assert!(err.to_string().contains("unparseable"));
    }

    #[test]
    fn test_blank_negative_prompt_becomes_none() {
        let rewritten = parse_reply(r#"{"prompt": "a fox", "negativePrompt": "  "}"#).unwrap();
        assert_eq!(rewritten.negative_prompt, None);
    }
}
