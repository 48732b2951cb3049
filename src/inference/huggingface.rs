//! Hugging Face hosted-inference provider

use super::{InferenceClient, InferenceError};
use crate::config::InferenceConfig;
use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use serde_json::{Map, Value};

/// Client for a single text-generation endpoint
pub struct HuggingFaceService {
    client: Client,
    endpoint: String,
    token: Option<String>,
}

impl HuggingFaceService {
    pub fn new(config: &InferenceConfig) -> Result<Self, InferenceError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| InferenceError::transport(format!("Failed to create HTTP client: {e}")))?;

        if config.token.is_none() {
            tracing::warn!(endpoint = %config.endpoint, "No HF_TOKEN set, sending unauthenticated requests");
        }

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            token: config.token.clone(),
        })
    }
}

#[async_trait]
impl InferenceClient for HuggingFaceService {
    async fn generate_reply(&self, prompt: &str) -> Result<String, InferenceError> {
        let mut request = self
            .client
            .post(&self.endpoint)
            .header("content-type", "application/json")
            .json(&GenerateRequest { inputs: prompt });
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                InferenceError::transport(format!("Request timeout: {e}"))
            } else if e.is_connect() {
                InferenceError::transport(format!("Connection failed: {e}"))
            } else {
                InferenceError::transport(format!("Request failed: {e}"))
            }
        })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| InferenceError::transport(format!("Failed to read response: {e}")))?;

        if body.trim().is_empty() {
            return Err(InferenceError::empty_response(format!(
                "HTTP {status}: empty body"
            )));
        }

        // The body decides the outcome; the status only annotates failures
        if !status.is_success() {
            tracing::warn!(%status, endpoint = %self.endpoint, "Non-success status, parsing body anyway");
        }
        parse_reply(&body).map_err(|mut e| {
            if !status.is_success() {
                e.message = format!("HTTP {status}: {}", e.message);
            }
            e
        })
    }

    fn label(&self) -> &str {
        &self.endpoint
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    inputs: &'a str,
}

/// Extract `generated_text` from the first object of a response body.
pub fn parse_reply(body: &str) -> Result<String, InferenceError> {
    let results: Vec<Map<String, Value>> = serde_json::from_str(body).map_err(|e| {
        InferenceError::malformed(format!("Failed to parse response: {e} - body: {body}"))
    })?;

    let first = results
        .first()
        .ok_or_else(|| InferenceError::malformed("Response contained no results"))?;

    first
        .get("generated_text")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| InferenceError::malformed("First result has no generated_text string"))
}
