//! Remote-call boundary: the [`StructuredCompletion`] trait and the
//! [`GeminiClient`] implementation.
//!
//! Every failure leaving this module is a typed [`RemoteError`]; callers
//! decide on retries from its [`FaultKind`], never from message text.

use async_trait::async_trait;
use serde_json::{json, Value};
use thiserror::Error;

use crate::config::PurifierConfig;

// ---------------------------------------------------------------------------
// RemoteError / FaultKind
// ---------------------------------------------------------------------------

/// Failure of one remote structured-completion call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RemoteError {
    /// No API key configured; raised before any network attempt.
    #[error("no API key found; set the API_KEY environment variable")]
    MissingCredential,

    /// Server error or transport failure; worth retrying.
    #[error("transient remote failure: {0}")]
    Transient(String),

    /// Quota exhausted or HTTP 429.
    #[error("rate limit exceeded: {0}")]
    RateLimited(String),

    /// The response envelope could not be understood.
    #[error("malformed remote response: {0}")]
    Malformed(String),

    /// Any other rejection (bad request, permission denied, ...).
    #[error("remote call rejected: {0}")]
    Rejected(String),
}

/// Classification of a [`RemoteError`] used by the retry policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultKind {
    Configuration,
    TransientServer,
    RateLimited,
    MalformedResponse,
    Unknown,
}

impl RemoteError {
    pub fn kind(&self) -> FaultKind {
        match self {
            RemoteError::MissingCredential => FaultKind::Configuration,
            RemoteError::Transient(_) => FaultKind::TransientServer,
            RemoteError::RateLimited(_) => FaultKind::RateLimited,
            RemoteError::Malformed(_) => FaultKind::MalformedResponse,
            RemoteError::Rejected(_) => FaultKind::Unknown,
        }
    }
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() || e.is_connect() || e.is_request() || e.is_body() {
            RemoteError::Transient(e.to_string())
        } else if e.is_decode() {
            RemoteError::Malformed(e.to_string())
        } else {
            match e.status() {
                Some(status) => classify_status(status.as_u16(), &e.to_string()),
                None => RemoteError::Rejected(e.to_string()),
            }
        }
    }
}

/// Map an HTTP error status (and the API's error body) to a [`RemoteError`].
///
/// The Generative Language API reports quota exhaustion either as HTTP 429
/// or as `error.status == "RESOURCE_EXHAUSTED"`.
pub fn classify_status(status: u16, body: &str) -> RemoteError {
    let api_status = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["status"].as_str().map(str::to_string));
    let message = format!("HTTP {status}: {}", body.trim());

    if status == 429 || api_status.as_deref() == Some("RESOURCE_EXHAUSTED") {
        RemoteError::RateLimited(message)
    } else if (500..600).contains(&status) {
        RemoteError::Transient(message)
    } else {
        RemoteError::Rejected(message)
    }
}

// ---------------------------------------------------------------------------
// StructuredCompletion trait
// ---------------------------------------------------------------------------

/// The single outbound operation: a completion constrained to a JSON schema.
///
/// Returns the raw JSON text produced by the model; an empty string means
/// the model produced nothing.
#[async_trait]
pub trait StructuredCompletion: Send + Sync {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, RemoteError>;
}

// ---------------------------------------------------------------------------
// GeminiClient
// ---------------------------------------------------------------------------

/// Calls `POST {base_url}/v1beta/models/{model}:generateContent`.
///
/// All connection details come from [`PurifierConfig`].  The API key is
/// resolved per call so a key exported after start-up is picked up.
pub struct GeminiClient {
    client: reqwest::Client,
    config: PurifierConfig,
}

impl GeminiClient {
    /// Build a client with the per-request timeout from `config`.
    pub fn from_config(config: &PurifierConfig) -> Self {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()
            .unwrap_or_else(|_| reqwest::Client::new());

        Self {
            client,
            config: config.clone(),
        }
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn request_body(&self, system_instruction: &str, prompt: &str, schema: &Value) -> Value {
        json!({
            "systemInstruction": { "parts": [{ "text": system_instruction }] },
            "contents": [
                { "role": "user", "parts": [{ "text": prompt }] }
            ],
            "generationConfig": {
                "temperature":      self.config.temperature,
                "responseMimeType": "application/json",
                "responseSchema":   schema
            }
        })
    }
}

/// Concatenate `candidates[0].content.parts[*].text`.
///
/// A response without candidates (e.g. blocked by safety filters) yields an
/// empty string; a body that is not an object at all is malformed.
pub fn response_text(body: &Value) -> Result<String, RemoteError> {
    if !body.is_object() {
        return Err(RemoteError::Malformed(
            "response body is not a JSON object".into(),
        ));
    }

    let text = body["candidates"][0]["content"]["parts"]
        .as_array()
        .map(|parts| {
            parts
                .iter()
                .filter_map(|p| p["text"].as_str())
                .collect::<String>()
        })
        .unwrap_or_default();

    Ok(text)
}

#[async_trait]
impl StructuredCompletion for GeminiClient {
    async fn generate(
        &self,
        system_instruction: &str,
        prompt: &str,
        schema: &Value,
    ) -> Result<String, RemoteError> {
        let key = self
            .config
            .resolve_api_key()
            .ok_or(RemoteError::MissingCredential)?;

        let body = self.request_body(system_instruction, prompt, schema);

        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(classify_status(status.as_u16(), &text));
        }

        let json: Value = response
            .json()
            .await
            .map_err(|e| RemoteError::Malformed(e.to_string()))?;

        response_text(&json)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
