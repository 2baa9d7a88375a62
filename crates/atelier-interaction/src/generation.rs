//! Generation service client.
//!
//! [`HttpGenerationTransport`] issues one request and classifies the
//! response; [`ResilientGenerationClient`] adds bounded exponential-backoff
//! retry on top for transient overload, and nothing else. Waits are timed
//! suspensions via `tokio::time::sleep`, so other sessions keep running.

use async_trait::async_trait;
use atelier_core::error::{AtelierError, Result};
use atelier_core::gateway::{GenerationJob, GenerationOutcome, GenerationTransport, ImageArtifact};
use atelier_core::notify::ProgressNotifier;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// HTTP transport for the generation service.
pub struct HttpGenerationTransport {
    client: Client,
    endpoint: String,
    api_key: Option<String>,
    width: u32,
    height: u32,
    image_count: u32,
}

impl HttpGenerationTransport {
    pub fn new(endpoint: impl Into<String>, width: u32, height: u32, image_count: u32) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            api_key: None,
            width,
            height,
            image_count,
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
struct GenerationRequestBody<'a> {
    prompt: &'a str,
    model_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    lora_model_id: Option<&'a str>,
    guidance_scale: f32,
    steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    negative_prompt: Option<&'a str>,
    width: u32,
    height: u32,
    image_count: u32,
}

#[derive(Deserialize)]
struct GenerationResponseBody {
    #[serde(default)]
    images: Vec<ImageArtifact>,
}

#[async_trait]
impl GenerationTransport for HttpGenerationTransport {
    async fn submit(&self, job: &GenerationJob) -> Result<GenerationOutcome> {
        let body = GenerationRequestBody {
            prompt: &job.prompt,
            model_id: &job.state.model_id,
            lora_model_id: job.state.lora_model_id.as_deref(),
            guidance_scale: job.state.guidance_scale,
            steps: job.state.steps,
            negative_prompt: job.negative_prompt.as_deref(),
            width: self.width,
            height: self.height,
            image_count: self.image_count,
        };

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|err| {
            AtelierError::generation(0, format!("request failed: {err}"), &self.endpoint)
        })?;

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS || status == StatusCode::SERVICE_UNAVAILABLE {
            return Ok(GenerationOutcome::Overloaded);
        }
        if !status.is_success() {
            return Ok(GenerationOutcome::Failed {
                status_code: status.as_u16(),
                status_text: status.canonical_reason().unwrap_or("unknown").to_string(),
            });
        }

        let parsed: GenerationResponseBody = response.json().await.map_err(|err| {
            AtelierError::generation(
                status.as_u16(),
                format!("unreadable generation reply: {err}"),
                &self.endpoint,
            )
        })?;

        Ok(GenerationOutcome::Ok(parsed.images))
    }

    fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Retrying wrapper around a [`GenerationTransport`].
#[derive(Clone)]
pub struct ResilientGenerationClient {
    transport: Arc<dyn GenerationTransport>,
}

impl ResilientGenerationClient {
    pub fn new(transport: Arc<dyn GenerationTransport>) -> Self {
        Self { transport }
    }

    /// Runs one generation request with bounded retry.
    ///
    /// Overload responses are retried after `2^attempt` seconds (attempt
    /// starting at 1) until the budget is spent; every retry reports the
    /// computed wait through `notifier`. All other failures, including a
    /// success carrying no artifacts, are fatal on the first occurrence.
    ///
    /// # Errors
    ///
    /// - `Overloaded` once `max_retries + 1` attempts all hit overload
    /// - `Generation` for any other failing status or an empty success
    pub async fn generate(
        &self,
        job: &GenerationJob,
        max_retries: u32,
        notifier: &dyn ProgressNotifier,
    ) -> Result<Vec<ImageArtifact>> {
        let mut attempt: u32 = 1;

        loop {
            match self.transport.submit(job).await? {
                GenerationOutcome::Ok(images) if images.is_empty() => {
                    return Err(AtelierError::generation(
                        200,
                        "generation succeeded but returned no artifacts",
                        self.transport.endpoint(),
                    ));
                }
                GenerationOutcome::Ok(images) => {
                    tracing::info!(
                        target: "atelier::generate",
                        attempt,
                        images = images.len(),
                        "generation complete"
                    );
                    return Ok(images);
                }
                GenerationOutcome::Overloaded => {
                    if attempt > max_retries {
                        return Err(AtelierError::Overloaded { attempts: attempt });
                    }
                    let wait_secs = 2u64.pow(attempt);
                    tracing::warn!(
                        target: "atelier::generate",
                        attempt,
                        wait_secs,
                        "generation service busy, backing off"
                    );
                    notifier.notify(&format!(
                        "Generation service is busy; retrying in {wait_secs}s..."
                    ));
                    tokio::time::sleep(Duration::from_secs(wait_secs)).await;
                    attempt += 1;
                }
                GenerationOutcome::Failed {
                    status_code,
                    status_text,
                } => {
                    return Err(AtelierError::generation(
                        status_code,
                        status_text,
                        self.transport.endpoint(),
                    ));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use atelier_core::config::AtelierConfig;
    use atelier_core::notify::NullNotifier;
    use atelier_core::params::ParameterState;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};
    use tokio::time::Instant;

    struct ScriptedTransport {
        outcomes: Mutex<VecDeque<GenerationOutcome>>,
        submits: AtomicU32,
    }

    impl ScriptedTransport {
        fn new(outcomes: Vec<GenerationOutcome>) -> Arc<Self> {
            Arc::new(Self {
                outcomes: Mutex::new(outcomes.into()),
                submits: AtomicU32::new(0),
            })
        }

        fn submit_count(&self) -> u32 {
            self.submits.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl GenerationTransport for ScriptedTransport {
        async fn submit(&self, _job: &GenerationJob) -> Result<GenerationOutcome> {
            self.submits.fetch_add(1, Ordering::SeqCst);
            Ok(self
                .outcomes
                .lock()
                .unwrap()
                .pop_front()
                .expect("script exhausted"))
        }

        fn endpoint(&self) -> &str {
            "https://generation.test/v1"
        }
    }

    fn test_job() -> GenerationJob {
        GenerationJob {
            prompt: "a red fox".to_string(),
            negative_prompt: None,
            state: ParameterState::initial(&AtelierConfig::default()),
        }
    }

    fn artifact(url: &str) -> ImageArtifact {
        ImageArtifact {
            url: url.to_string(),
            seed: Some(7),
            nsfw: false,
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_two_overloads_then_success_waits_2s_then_4s() {
        let transport = ScriptedTransport::new(vec![
            GenerationOutcome::Overloaded,
            GenerationOutcome::Overloaded,
            GenerationOutcome::Ok(vec![artifact("https://img.test/1.png")]),
        ]);
        let client = ResilientGenerationClient::new(transport.clone());

        let started = Instant::now();
        let images = client.generate(&test_job(), 3, &NullNotifier).await.unwrap();

        assert_eq!(images[0].url, "https://img.test/1.png");
        assert_eq!(transport.submit_count(), 3);
        assert_eq!(started.elapsed(), Duration::from_secs(2 + 4));
    }

    #[tokio::test(start_paused = true)]
    async fn test_budget_of_one_fails_after_two_attempts() {
        let transport = ScriptedTransport::new(vec![
            GenerationOutcome::Overloaded,
            GenerationOutcome::Overloaded,
        ]);
        let client = ResilientGenerationClient::new(transport.clone());

        let err = client
            .generate(&test_job(), 1, &NullNotifier)
            .await
            .unwrap_err();

        assert!(matches!(err, AtelierError::Overloaded { attempts: 2 }));
        assert_eq!(transport.submit_count(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_zero_budget_fails_on_first_overload() {
        let transport = ScriptedTransport::new(vec![GenerationOutcome::Overloaded]);
        let client = ResilientGenerationClient::new(transport.clone());

        let err = client
            .generate(&test_job(), 0, &NullNotifier)
            .await
            .unwrap_err();

        assert!(err.is_overloaded());
        assert_eq!(transport.submit_count(), 1);
    }

    #[tokio::test]
    async fn test_empty_success_is_fatal_and_never_retried() {
        let transport = ScriptedTransport::new(vec![GenerationOutcome::Ok(vec![])]);
        let client = ResilientGenerationClient::new(transport.clone());

        let err = client
            .generate(&test_job(), 3, &NullNotifier)
            .await
            .unwrap_err();

        assert!(err.is_generation());
        assert_eq!(transport.submit_count(), 1);
    }

    #[tokio::test]
    async fn test_hard_failure_carries_status_and_endpoint() {
        let transport = ScriptedTransport::new(vec![GenerationOutcome::Failed {
            status_code: 500,
            status_text: "Internal Server Error".to_string(),
        }]);
        let client = ResilientGenerationClient::new(transport.clone());

        let err = client
            .generate(&test_job(), 3, &NullNotifier)
            .await
            .unwrap_err();

        match err {
            AtelierError::Generation {
                status_code,
                endpoint,
                ..
            } => {
                assert_eq!(status_code, 500);
                assert_eq!(endpoint, "https://generation.test/v1");
            }
            other => panic!("expected Generation error, got {other:?}"),
        }
        assert_eq!(transport.submit_count(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_each_retry_notifies_with_wait_time() {
        let transport = ScriptedTransport::new(vec![
            GenerationOutcome::Overloaded,
            GenerationOutcome::Overloaded,
            GenerationOutcome::Ok(vec![artifact("https://img.test/1.png")]),
        ]);
        let client = ResilientGenerationClient::new(transport);

        let messages: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = messages.clone();
        let notifier = move |message: &str| {
            sink.lock().unwrap().push(message.to_string());
        };

        client.generate(&test_job(), 3, &notifier).await.unwrap();

        let messages = messages.lock().unwrap();
        assert_eq!(messages.len(), 2);
        assert!(messages[0].contains("2s"));
        assert!(messages[1].contains("4s"));
    }
}
