//! Completion Gateway: one call per request against a text-generation backend,
//! with the sampling parameters fixed per call site.

mod client;

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use tutor_config::{CallProfile, GenerationConfig};

pub use client::ChatCompletionsClient;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GenerationError {
    #[error("backend unreachable: {0}")]
    Transport(String),
    #[error("backend rate limit hit")]
    RateLimited,
    #[error("backend returned HTTP {code}")]
    Status { code: u16 },
    #[error("backend response could not be parsed: {0}")]
    Malformed(String),
    #[error("backend returned no usable text")]
    Empty,
}

impl GenerationError {
    /// Short machine-readable tag, suitable for log fields.
    pub fn reason(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport",
            Self::RateLimited => "rate_limited",
            Self::Status { .. } => "status",
            Self::Malformed(_) => "malformed",
            Self::Empty => "empty",
        }
    }
}

// ── Backend seam ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub system_instruction: String,
    pub user_content: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

/// A remote text-completion capability.  Implementations perform exactly one
/// attempt per call; retry policy belongs to the caller.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    async fn complete(&self, request: &CompletionRequest) -> Result<String, GenerationError>;
}

// ── Gateway ──────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallSite {
    Topic,
    Reply,
    Review,
}

impl CallSite {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Topic => "topic",
            Self::Reply => "reply",
            Self::Review => "review",
        }
    }
}

#[derive(Clone)]
pub struct CompletionGateway {
    backend: Arc<dyn CompletionBackend>,
    model: String,
    profiles: GenerationConfig,
}

impl CompletionGateway {
    pub fn new(
        backend: Arc<dyn CompletionBackend>,
        model: impl Into<String>,
        profiles: GenerationConfig,
    ) -> Self {
        Self {
            backend,
            model: model.into(),
            profiles,
        }
    }

    pub fn profile(&self, site: CallSite) -> CallProfile {
        match site {
            CallSite::Topic => self.profiles.topic,
            CallSite::Reply => self.profiles.reply,
            CallSite::Review => self.profiles.review,
        }
    }

    /// One backend call with the profile for `site`.  Whitespace-only output
    /// counts as [`GenerationError::Empty`].
    pub async fn complete(
        &self,
        site: CallSite,
        system_instruction: &str,
        user_content: &str,
    ) -> Result<String, GenerationError> {
        let profile = self.profile(site);
        let request = CompletionRequest {
            model: self.model.clone(),
            system_instruction: system_instruction.to_string(),
            user_content: user_content.to_string(),
            max_output_tokens: profile.max_output_tokens,
            temperature: profile.temperature,
        };

        let started = Instant::now();
        let result = self
            .backend
            .complete(&request)
            .await
            .and_then(|text| {
                let text = text.trim();
                if text.is_empty() {
                    Err(GenerationError::Empty)
                } else {
                    Ok(text.to_string())
                }
            });
        let elapsed_ms = started.elapsed().as_millis() as u64;

        match &result {
            Ok(text) => debug!(site = site.as_str(), elapsed_ms, len = text.len(), "completion ok"),
            Err(err) => warn!(
                site = site.as_str(),
                elapsed_ms,
                reason = err.reason(),
                error = %err,
                "completion failed"
            ),
        }
        result
    }
}

impl std::fmt::Debug for CompletionGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompletionGateway")
            .field("model", &self.model)
            .field("profiles", &self.profiles)
            .finish_non_exhaustive()
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────
