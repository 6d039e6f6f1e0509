use std::env;
use std::fs;
use std::path::Path;

use anyhow::Result;
use serde::{Deserialize, Serialize};
use thiserror::Error;

// ── Errors ───────────────────────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    /// A required secret is absent or blank.  The process must not start
    /// half-configured, so callers treat this as fatal.
    #[error("missing credential: set {0}")]
    MissingCredential(&'static str),
}

// ── Tutor persona ────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TutorConfig {
    pub name: String,
    /// Topic injected into reply instructions before the first topic of the
    /// day has been generated.
    pub fallback_topic: String,
    /// Substrings that mark a message as "I don't understand this".  A
    /// question mark always counts, independent of this list.
    pub unsure_markers: Vec<String>,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            name: "한국어 친구".to_string(),
            fallback_topic: "일상 대화 (everyday conversation)".to_string(),
            unsure_markers: [
                "모르",
                "몰라",
                "무슨 뜻",
                "뜻이 뭐",
                "뭐예요",
                "뭐에요",
                "이해가 안",
                "이해 안",
                "헷갈",
            ]
            .iter()
            .map(|m| (*m).to_string())
            .collect(),
        }
    }
}

// ── LLM backend ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Base URL of an OpenAI-compatible API.  Overridden at runtime by the
    /// `OPENAI_BASE_URL` environment variable when set.
    pub base_url: String,
    pub model: String,
    pub request_timeout_secs: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Sampling parameters for one generation purpose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CallProfile {
    pub temperature: f32,
    pub max_output_tokens: u32,
}

/// One [`CallProfile`] per call site, so each purpose is tuned in one place.
///
/// | Section                | temperature | max tokens | Purpose                    |
/// |------------------------|-------------|------------|----------------------------|
/// | `[generation.topic]`   | 0.9         | 150        | daily conversation starter |
/// | `[generation.reply]`   | 0.7         | 300        | per-turn chat reply        |
/// | `[generation.review]`  | 0.4         | 900        | unsure-queue review + quiz |
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    pub topic: CallProfile,
    pub reply: CallProfile,
    pub review: CallProfile,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            topic: CallProfile {
                temperature: 0.9,
                max_output_tokens: 150,
            },
            reply: CallProfile {
                temperature: 0.7,
                max_output_tokens: 300,
            },
            review: CallProfile {
                temperature: 0.4,
                max_output_tokens: 900,
            },
        }
    }
}

// ── Scheduling ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    pub interval_hours: u64,
    /// Delay between process start and the first scheduled regeneration.
    pub first_run_delay_secs: u64,
    /// IANA timezone name used to decide what "today" is.
    /// Falls back to UTC when the name is unrecognised.
    pub timezone: String,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            interval_hours: 24,
            first_run_delay_secs: 60,
            timezone: "Asia/Seoul".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub path: String,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: ".tutor/session.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LivenessConfig {
    pub host: String,
    pub port: u16,
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelegramConfig {
    pub poll_timeout_secs: u64,
    /// Replies longer than this are split on line boundaries.
    pub max_message_chars: usize,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            poll_timeout_secs: 25,
            max_message_chars: 3500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub log_level: String,
    /// When non-empty, logs are also written to a daily-rolling file here.
    pub log_dir: String,
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_dir: String::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct AppConfig {
    pub tutor: TutorConfig,
    pub llm: LlmConfig,
    pub generation: GenerationConfig,
    pub schedule: ScheduleConfig,
    pub session: SessionConfig,
    pub liveness: LivenessConfig,
    pub telegram: TelegramConfig,
    pub telemetry: TelemetryConfig,
}

impl AppConfig {
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self> {
        let mut config = Self::default();
        if let Ok(raw) = fs::read_to_string(path) {
            config = toml::from_str(&raw)?;
        }

        if let Some(port) = non_empty_env("PORT").and_then(|v| v.parse().ok()) {
            config.liveness.port = port;
        }
        if let Some(path) = non_empty_env("TUTOR_SESSION_PATH") {
            config.session.path = path;
        }
        if let Some(url) = non_empty_env("OPENAI_BASE_URL") {
            config.llm.base_url = url;
        }

        Ok(config)
    }

    pub fn save_to(&self, path: impl AsRef<Path>) -> Result<()> {
        if let Some(parent) = path.as_ref().parent() {
            fs::create_dir_all(parent)?;
        }

        let rendered = toml::to_string_pretty(self)?;
        fs::write(path, rendered)?;
        Ok(())
    }
}

// ── Credentials ──────────────────────────────────────────────────────────────

/// Secrets are read from the environment only and never written to the
/// TOML config.
#[derive(Clone)]
pub struct Credentials {
    pub telegram_token: String,
    pub llm_api_key: String,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("telegram_token", &"<redacted>")
            .field("llm_api_key", &"<redacted>")
            .finish()
    }
}

impl Credentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        let telegram_token = non_empty_env("TELEGRAM_BOT_TOKEN")
            .or_else(|| non_empty_env("TOKEN"))
            .ok_or(ConfigError::MissingCredential("TELEGRAM_BOT_TOKEN"))?;
        let llm_api_key = non_empty_env("OPENAI_API_KEY")
            .or_else(|| non_empty_env("TUTOR_LLM_API_KEY"))
            .ok_or(ConfigError::MissingCredential("OPENAI_API_KEY"))?;
        Ok(Self {
            telegram_token,
            llm_api_key,
        })
    }
}

fn non_empty_env(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ── Tests ────────────────────────────────────────────────────────────────────
