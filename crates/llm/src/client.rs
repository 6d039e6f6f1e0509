//! OpenAI-compatible `/chat/completions` backend.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use crate::{CompletionBackend, CompletionRequest, GenerationError};

#[derive(Debug, Clone)]
pub struct ChatCompletionsClient {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl ChatCompletionsClient {
    pub fn new(
        base_url: &str,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key: api_key.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl CompletionBackend for ChatCompletionsClient {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError> {
        let payload = json!({
            "model": request.model,
            "messages": [
                {"role": "system", "content": request.system_instruction},
                {"role": "user", "content": request.user_content}
            ],
            "max_tokens": request.max_output_tokens,
            "temperature": request.temperature,
        });

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;

        let status = response.status().as_u16();
        let body = response
            .text()
            .await
            .map_err(|err| GenerationError::Transport(err.to_string()))?;
        parse_completion(status, &body)
    }
}

/// Map an HTTP status and body to the first choice's message content.
pub(crate) fn parse_completion(status: u16, body: &str) -> Result<String, GenerationError> {
    if status == 429 {
        return Err(GenerationError::RateLimited);
    }
    if !(200..300).contains(&status) {
        return Err(GenerationError::Status { code: status });
    }

    let value: serde_json::Value =
        serde_json::from_str(body).map_err(|err| GenerationError::Malformed(err.to_string()))?;

    value
        .get("choices")
        .and_then(|choices| choices.get(0))
        .and_then(|choice| choice.get("message"))
        .and_then(|message| message.get("content"))
        .and_then(|content| content.as_str())
        .map(ToString::to_string)
        .ok_or_else(|| GenerationError::Malformed("missing choices[0].message.content".into()))
}
