//! Core `TranscriptPurifier` trait and the `Purifier` implementation.
//!
//! `Purifier` wraps any [`StructuredCompletion`] backend: it builds the
//! fixed instruction and schema, retries transient faults according to
//! [`RetryPolicy`], and parses the model's JSON into a
//! [`PurificationResult`].

use async_trait::async_trait;
use thiserror::Error;

use crate::config::AppConfig;
use crate::llm::client::{GeminiClient, RemoteError, StructuredCompletion};
use crate::llm::prompt::PromptBuilder;
use crate::llm::retry::{RetryDecision, RetryPolicy};
use crate::llm::types::PurificationResult;

// ---------------------------------------------------------------------------
// PurifyError
// ---------------------------------------------------------------------------

/// Errors surfaced by a purify request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PurifyError {
    /// No API key configured.
    #[error("no API key found; set the API_KEY environment variable")]
    MissingCredential,

    /// The model returned no text.
    #[error("the model returned an empty response")]
    EmptyResponse,

    /// The model's text is not a valid purification result.
    #[error("the model returned a malformed result: {0}")]
    MalformedResponse(String),

    /// Quota or rate limit hit; the caller imposes a cooldown.
    #[error("API rate limit reached; wait for the cooldown to finish and try again")]
    RateLimitExceeded,

    /// Any other failure, after local retries were exhausted.
    #[error("{0}")]
    RemoteCallFailed(String),
}

impl From<RemoteError> for PurifyError {
    fn from(e: RemoteError) -> Self {
        match e {
            RemoteError::MissingCredential => PurifyError::MissingCredential,
            RemoteError::RateLimited(_) => PurifyError::RateLimitExceeded,
            RemoteError::Malformed(msg) => PurifyError::MalformedResponse(msg),
            other @ (RemoteError::Transient(_) | RemoteError::Rejected(_)) => {
                PurifyError::RemoteCallFailed(other.to_string())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// TranscriptPurifier trait
// ---------------------------------------------------------------------------

/// Async seam between the session and the remote model.
///
/// Implementors must be `Send + Sync` so they can be shared as
/// `Arc<dyn TranscriptPurifier>`.
#[async_trait]
pub trait TranscriptPurifier: Send + Sync {
    /// Purify `raw`, using `hints` as the highest-priority reference for
    /// names and terminology.  Every call is a fresh remote request.
    async fn purify(&self, raw: &str, hints: &str) -> Result<PurificationResult, PurifyError>;
}

// ---------------------------------------------------------------------------
// Purifier
// ---------------------------------------------------------------------------

/// Purifier over a [`StructuredCompletion`] backend.
pub struct Purifier<C: StructuredCompletion> {
    backend: C,
    prompt_builder: PromptBuilder,
    retry: RetryPolicy,
}

impl Purifier<GeminiClient> {
    /// Build a purifier talking to the hosted model described by `config`.
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            GeminiClient::from_config(&config.purifier),
            RetryPolicy::from_config(&config.retry),
        )
    }
}

impl<C: StructuredCompletion> Purifier<C> {
    pub fn new(backend: C, retry: RetryPolicy) -> Self {
        Self {
            backend,
            prompt_builder: PromptBuilder::new(),
            retry,
        }
    }

    /// Return a reference to the wrapped backend.
    pub fn backend(&self) -> &C {
        &self.backend
    }

    /// Call the backend, retrying transient faults.
    async fn generate_with_retry(
        &self,
        system: &str,
        prompt: &str,
        schema: &serde_json::Value,
    ) -> Result<String, RemoteError> {
        let mut retries_done = 0;
        loop {
            match self.backend.generate(system, prompt, schema).await {
                Ok(text) => return Ok(text),
                Err(err) => {
                    let kind = err.kind();
                    log::warn!(
                        "purifier: attempt {} failed ({kind:?}): {err}",
                        retries_done + 1
                    );
                    match self.retry.decide(kind, retries_done) {
                        RetryDecision::RetryAfter(delay) => {
                            log::info!("purifier: retrying in {delay:?}");
                            tokio::time::sleep(delay).await;
                            retries_done += 1;
                        }
                        RetryDecision::GiveUp => return Err(err),
                    }
                }
            }
        }
    }
}

/// Parse the model's JSON text into a [`PurificationResult`].
pub fn parse_result(text: &str) -> Result<PurificationResult, PurifyError> {
    if text.trim().is_empty() {
        return Err(PurifyError::EmptyResponse);
    }
    serde_json::from_str(text).map_err(|e| PurifyError::MalformedResponse(e.to_string()))
}

#[async_trait]
impl<C: StructuredCompletion> TranscriptPurifier for Purifier<C> {
    async fn purify(&self, raw: &str, hints: &str) -> Result<PurificationResult, PurifyError> {
        let (system, prompt) = self.prompt_builder.build(raw, hints);
        let schema = self.prompt_builder.response_schema();

        let text = self.generate_with_retry(&system, &prompt, &schema).await?;
        let result = parse_result(&text)?;

        log::info!(
            "purifier: {} chars -> {} chars, {} corrections, {} uncertain parts",
            raw.chars().count(),
            result.purified_text.chars().count(),
            result.corrections.len(),
            result.uncertain_parts.len()
        );
        Ok(result)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use tokio::time::Instant;

    const VALID: &str = r#"{"purifiedText":"clean","corrections":[],"uncertainParts":[]}"#;

    /// Replays a scripted sequence of outcomes and records when each call
    /// happened.
    struct ScriptedBackend {
        outcomes: Mutex<VecDeque<Result<String, RemoteError>>>,
        calls: Mutex<Vec<Instant>>,
        prompts: Mutex<Vec<String>>,
    }

    impl ScriptedBackend {
        fn new(outcomes: Vec<Result<String, RemoteError>>) -> Self {
            Self {
                outcomes: Mutex::new(outcomes.into()),
                calls: Mutex::new(Vec::new()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn call_count(&self) -> usize {
            self.calls.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl StructuredCompletion for ScriptedBackend {
        async fn generate(
            &self,
            _system: &str,
            prompt: &str,
            _schema: &serde_json::Value,
        ) -> Result<String, RemoteError> {
            self.calls.lock().unwrap().push(Instant::now());
            self.prompts.lock().unwrap().push(prompt.to_string());
            self.outcomes
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(RemoteError::Rejected("script exhausted".into())))
        }
    }

    fn purifier(outcomes: Vec<Result<String, RemoteError>>) -> Purifier<ScriptedBackend> {
        Purifier::new(ScriptedBackend::new(outcomes), RetryPolicy::default())
    }

    fn transient() -> Result<String, RemoteError> {
        Err(RemoteError::Transient("HTTP 500".into()))
    }

    #[tokio::test(start_paused = true)]
    async fn retries_transient_faults_with_linear_backoff() {
        let p = purifier(vec![transient(), transient(), Ok(VALID.into())]);
        let start = Instant::now();

        let result = p.purify("raw", "").await.unwrap();
        assert_eq!(result.purified_text, "clean");

        let calls = p.backend().calls.lock().unwrap().clone();
        assert_eq!(calls.len(), 3);
        assert_eq!(calls[0] - start, Duration::ZERO);
        assert_eq!(calls[1] - calls[0], Duration::from_millis(2000));
        assert_eq!(calls[2] - calls[1], Duration::from_millis(4000));
    }

    #[tokio::test(start_paused = true)]
    async fn gives_up_after_two_retries() {
        let p = purifier(vec![transient(), transient(), transient(), Ok(VALID.into())]);

        let err = p.purify("raw", "").await.unwrap_err();
        assert!(matches!(err, PurifyError::RemoteCallFailed(ref m) if m.contains("HTTP 500")));
        assert_eq!(p.backend().call_count(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn rate_limit_fails_without_retry() {
        let p = purifier(vec![
            Err(RemoteError::RateLimited("HTTP 429".into())),
            Ok(VALID.into()),
        ]);
        let start = Instant::now();

        let err = p.purify("raw", "").await.unwrap_err();
        assert_eq!(err, PurifyError::RateLimitExceeded);
        assert_eq!(p.backend().call_count(), 1);
        assert_eq!(Instant::now() - start, Duration::ZERO);
    }

    #[tokio::test]
    async fn missing_credential_is_not_retried() {
        let p = purifier(vec![Err(RemoteError::MissingCredential)]);
        assert_eq!(
            p.purify("raw", "").await.unwrap_err(),
            PurifyError::MissingCredential
        );
        assert_eq!(p.backend().call_count(), 1);
    }

    #[tokio::test]
    async fn rejected_call_surfaces_original_message() {
        let p = purifier(vec![Err(RemoteError::Rejected(
            "HTTP 400: API key not valid".into(),
        ))]);
        match p.purify("raw", "").await.unwrap_err() {
            PurifyError::RemoteCallFailed(msg) => assert!(msg.contains("API key not valid")),
            other => panic!("expected RemoteCallFailed, got {other:?}"),
        }
        assert_eq!(p.backend().call_count(), 1);
    }

    #[tokio::test]
    async fn empty_text_is_empty_response() {
        let p = purifier(vec![Ok("  ".into())]);
        assert_eq!(
            p.purify("raw", "").await.unwrap_err(),
            PurifyError::EmptyResponse
        );
    }

    #[tokio::test]
    async fn invalid_json_is_malformed_and_not_retried() {
        let p = purifier(vec![Ok("{not json".into()), Ok(VALID.into())]);
        assert!(matches!(
            p.purify("raw", "").await.unwrap_err(),
            PurifyError::MalformedResponse(_)
        ));
        assert_eq!(p.backend().call_count(), 1);
    }

    #[tokio::test]
    async fn wrong_shape_is_malformed() {
        let p = purifier(vec![Ok(r#"{"purifiedText": 3}"#.into())]);
        assert!(matches!(
            p.purify("raw", "").await.unwrap_err(),
            PurifyError::MalformedResponse(_)
        ));
    }

    #[tokio::test]
    async fn prompt_carries_transcript_and_hints() {
        let p = purifier(vec![Ok(VALID.into())]);
        p.purify("uh the the meeting", "Zhang Wei is correct").await.unwrap();

        let prompts = p.backend().prompts.lock().unwrap();
        assert!(prompts[0].contains("uh the the meeting"));
        assert!(prompts[0].contains("Zhang Wei is correct"));
    }

    #[tokio::test]
    async fn each_call_is_fresh() {
        let p = purifier(vec![Ok(VALID.into()), Ok(VALID.into())]);
        p.purify("same", "").await.unwrap();
        p.purify("same", "").await.unwrap();
        assert_eq!(p.backend().call_count(), 2);
    }

    #[test]
    fn purifier_is_object_safe() {
        let p: Box<dyn TranscriptPurifier> = Box::new(purifier(Vec::new()));
        drop(p);
    }
}
