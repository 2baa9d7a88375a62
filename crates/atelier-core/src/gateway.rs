//! Contracts for the external collaborators.
//!
//! The turn pipeline only ever talks to the classification gateway, the
//! rewriting service, and the generation service through these traits, so
//! tests can substitute scripted implementations.

use crate::detection::{Detection, DetectorKind};
use crate::error::Result;
use crate::params::ParameterState;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A registered detector: its kind plus the instruction the gateway runs it
/// with.
#[derive(Debug, Clone, PartialEq)]
pub struct DetectorSpec {
    pub kind: DetectorKind,
    pub instruction: String,
}

/// Classifies one utterance with one detector.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Runs `detector` against `user_text` and returns the typed detection.
    ///
    /// # Errors
    ///
    /// A detector-reported error or an undecodable result fails the call;
    /// the caller treats any failure as fatal for the whole turn.
    async fn classify(&self, detector: &DetectorSpec, user_text: &str) -> Result<Detection>;
}

/// Who said a context message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextRole {
    User,
    Assistant,
}

/// One entry of the running conversation context sent to the rewriter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContextMessage {
    pub role: ContextRole,
    pub content: String,
}

impl ContextMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ContextRole::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: ContextRole::Assistant,
            content: content.into(),
        }
    }
}

/// The rewriting service's refined generation prompt.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RewrittenPrompt {
    pub prompt: String,
    #[serde(default)]
    pub negative_prompt: Option<String>,
    #[serde(default)]
    pub has_complaints: bool,
}

/// Turns the conversation so far plus the latest utterance into a refined
/// generation prompt.
#[async_trait]
pub trait PromptRewriter: Send + Sync {
    /// # Errors
    ///
    /// An empty refined prompt or an unrepairable response is fatal.
    async fn rewrite(&self, context: &[ContextMessage], user_text: &str)
    -> Result<RewrittenPrompt>;
}

/// Everything one generation request needs.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationJob {
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub state: ParameterState,
}

/// One generated image as returned by the generation service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageArtifact {
    pub url: String,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default)]
    pub nsfw: bool,
}

/// How one generation attempt ended.
///
/// Transport-level failures (unreachable host, malformed body) are `Err`s on
/// [`GenerationTransport::submit`] instead; only statuses the service
/// actually returned are classified here.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    /// Definitive success; the artifact list may still be empty.
    Ok(Vec<ImageArtifact>),
    /// The service signalled it is busy; the attempt may be retried.
    Overloaded,
    /// Any other non-success status. Never retried.
    Failed { status_code: u16, status_text: String },
}

/// One shot at the generation service, no retry logic.
#[async_trait]
pub trait GenerationTransport: Send + Sync {
    /// Issues a single generation request and classifies the response.
    async fn submit(&self, job: &GenerationJob) -> Result<GenerationOutcome>;

    /// The endpoint this transport talks to, for error detail.
    fn endpoint(&self) -> &str;
}
