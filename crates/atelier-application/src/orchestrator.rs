//! The per-turn pipeline.
//!
//! `VolleyOrchestrator` sequences one turn: load prior state, fan the
//! utterance out to every detector, fold the detections into the parameter
//! state, refine the prompt, generate with retry, persist the volley, and
//! answer with the artifact URLs plus a summary of what changed.

use atelier_core::assembler::assemble_reply;
use atelier_core::config::AtelierConfig;
use atelier_core::detection::Detection;
use atelier_core::error::{AtelierError, Result};
use atelier_core::gateway::{
    ContextMessage, DetectorSpec, GenerationJob, IntentClassifier, PromptRewriter,
};
use atelier_core::notify::ProgressNotifier;
use atelier_core::params::ParameterState;
use atelier_core::rules::adjust;
use atelier_core::session::{HistoryRepository, SessionHistory, Volley};
use atelier_interaction::ResilientGenerationClient;
use futures::future::join_all;
use std::sync::Arc;
use uuid::Uuid;

/// What one completed turn hands back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct TurnOutcome {
    /// URLs of the generated artifacts, in service order.
    pub image_urls: Vec<String>,
    /// Human-readable summary of the refined request and the changes made.
    pub summary: String,
}

/// Sequences the stages of one conversational turn.
///
/// Holds no per-user state: the session history is read once at the start of
/// a turn and appended once at the end. Concurrent turns for the same user
/// race that window; callers serialize turns per user.
pub struct VolleyOrchestrator {
    config: AtelierConfig,
    detectors: Vec<DetectorSpec>,
    history: Arc<dyn HistoryRepository>,
    classifier: Arc<dyn IntentClassifier>,
    rewriter: Arc<dyn PromptRewriter>,
    generation: ResilientGenerationClient,
}

impl VolleyOrchestrator {
    pub fn new(
        config: AtelierConfig,
        detectors: Vec<DetectorSpec>,
        history: Arc<dyn HistoryRepository>,
        classifier: Arc<dyn IntentClassifier>,
        rewriter: Arc<dyn PromptRewriter>,
        generation: ResilientGenerationClient,
    ) -> Self {
        Self {
            config,
            detectors,
            history,
            classifier,
            rewriter,
            generation,
        }
    }

    /// Processes one turn for one user.
    ///
    /// # Arguments
    ///
    /// * `user_id` - Stable identifier of the user whose session this is
    /// * `user_input` - The user's utterance for this turn
    /// * `notifier` - Receives backoff progress and the final summary
    ///
    /// # Errors
    ///
    /// Fails fatally on empty inputs, any detector error, an empty refined
    /// prompt, an exhausted or failed generation, or a persistence failure.
    /// No volley is appended unless generation succeeded.
    pub async fn process_turn(
        &self,
        user_id: &str,
        user_input: &str,
        notifier: &dyn ProgressNotifier,
    ) -> Result<TurnOutcome> {
        let user_id = user_id.trim();
        let user_input = user_input.trim();
        if user_id.is_empty() {
            return Err(AtelierError::validation("user id must not be empty"));
        }
        if user_input.is_empty() {
            return Err(AtelierError::validation("user input must not be empty"));
        }

        let turn_id = Uuid::new_v4();
        tracing::info!(target: "atelier::turn", %turn_id, user_id, "turn started");

        // Stage 1: load
        let history = self.history.load(user_id).await?;
        let is_new_session = history.is_empty();
        let start_state = history
            .last_state()
            .cloned()
            .unwrap_or_else(|| ParameterState::initial(&self.config));

        // Stage 2: classify, all detectors against the same utterance
        let detections = self.classify_all(user_input).await?;

        // Stage 3: adjust
        let (current_state, changes) = adjust(
            &start_state,
            &detections,
            &self.config.models,
            &self.config.adjustments,
        );
        tracing::debug!(
            target: "atelier::turn",
            %turn_id,
            changes = changes.len(),
            steps = current_state.steps,
            guidance = current_state.guidance_scale,
            "state adjusted"
        );

        // Stage 4: rewrite
        let context = conversation_context(&history);
        let rewritten = self.rewriter.rewrite(&context, user_input).await?;

        // Stage 5: generate
        let job = GenerationJob {
            prompt: rewritten.prompt.clone(),
            negative_prompt: rewritten.negative_prompt.clone(),
            state: current_state.clone(),
        };
        let images = self
            .generation
            .generate(&job, self.config.generation.max_retries, notifier)
            .await?;

        // The summary reaches the live channel before the append; a failed
        // append must not retract what the user already saw.
        let summary = assemble_reply(&rewritten.prompt, &changes);
        notifier.notify(&summary);

        // Stage 6: persist, strictly after generation succeeded
        let volley = Volley {
            is_new_session,
            timestamp: chrono::Utc::now().to_rfc3339(),
            user_input: user_input.to_string(),
            system_response: rewritten.prompt,
            start_state,
            end_state: current_state,
            detections,
        };
        self.history.append(user_id, &volley).await?;

        tracing::info!(
            target: "atelier::turn",
            %turn_id,
            images = images.len(),
            "turn complete"
        );

        Ok(TurnOutcome {
            image_urls: images.into_iter().map(|i| i.url).collect(),
            summary,
        })
    }

    /// Runs every registered detector concurrently and joins the results.
    ///
    /// Classification is all-or-nothing: one failing detector fails the
    /// whole turn before any state is touched.
    async fn classify_all(&self, user_input: &str) -> Result<Vec<Detection>> {
        let futures = self
            .detectors
            .iter()
            .map(|detector| self.classifier.classify(detector, user_input));

        join_all(futures).await.into_iter().collect()
    }
}

/// Flattens the stored history into the rewriter's conversation context.
fn conversation_context(history: &SessionHistory) -> Vec<ContextMessage> {
    let mut context = Vec::with_capacity(history.len() * 2);
    for volley in &history.volleys {
        context.push(ContextMessage::user(volley.user_input.clone()));
        context.push(ContextMessage::assistant(volley.system_response.clone()));
    }
    context
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
