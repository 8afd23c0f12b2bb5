//! Backend configuration resolved from the environment.
//!
//! Nothing here touches the network or the filesystem; credential files
//! are only read when a backend client is first built.

use std::path::PathBuf;
use std::time::Duration;

use secrecy::SecretString;

/// Default chat model for structured data extraction.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";

/// Default Vision API endpoint.
pub const DEFAULT_VISION_ENDPOINT: &str = "https://vision.googleapis.com";

/// Settings for the chat-completion backend.
#[derive(Debug, Clone)]
pub struct ChatConfig {
    /// API key; `None` leaves the backend unconfigured.
    pub api_key: Option<SecretString>,
    /// Model identifier.
    pub model: String,
    /// Alternative API base URL (OpenAI-compatible servers).
    pub base_url: Option<String>,
    /// Return an error instead of the soft JSON failure payload.
    pub strict_json: bool,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: DEFAULT_CHAT_MODEL.to_string(),
            base_url: None,
            strict_json: false,
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl ChatConfig {
    /// Load from `PLATFORM_OPENAI_KEY` (or `OPENAI_API_KEY`), `MODEL_OPENAI`,
    /// `OPENAI_BASE_URL` and `DOCGATE_STRICT_JSON`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        let api_key =
            non_empty_var("PLATFORM_OPENAI_KEY").or_else(|| non_empty_var("OPENAI_API_KEY"));
        if let Some(key) = api_key {
            config.api_key = Some(SecretString::new(key));
        }

        if let Some(model) = non_empty_var("MODEL_OPENAI") {
            config.model = model;
        }

        config.base_url = non_empty_var("OPENAI_BASE_URL");
        config.strict_json = non_empty_var("DOCGATE_STRICT_JSON")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        config
    }
}

/// Settings for the OCR backend.
#[derive(Debug, Clone)]
pub struct VisionConfig {
    /// API key given inline.
    pub api_key: Option<SecretString>,
    /// Service-account credentials file (JSON); loaded once, on first use.
    /// Takes precedence over `api_key`.
    pub key_path: Option<PathBuf>,
    /// Service root, without the `/v1/...` suffix.
    pub endpoint: String,
    /// Per-request HTTP timeout.
    pub request_timeout: Duration,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            key_path: None,
            endpoint: DEFAULT_VISION_ENDPOINT.to_string(),
            request_timeout: Duration::from_secs(60),
        }
    }
}

impl VisionConfig {
    /// Load from `GOOGLE_CLOUD_VISION_KEY_PATH` (falling back to
    /// `GOOGLE_APPLICATION_CREDENTIALS`), `GOOGLE_CLOUD_VISION_API_KEY` and
    /// `GOOGLE_CLOUD_VISION_ENDPOINT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Some(key) = non_empty_var("GOOGLE_CLOUD_VISION_API_KEY") {
            config.api_key = Some(SecretString::new(key));
        }

        config.key_path = non_empty_var("GOOGLE_CLOUD_VISION_KEY_PATH")
            .or_else(|| non_empty_var("GOOGLE_APPLICATION_CREDENTIALS"))
            .map(PathBuf::from);

        if let Some(endpoint) = non_empty_var("GOOGLE_CLOUD_VISION_ENDPOINT") {
            config.endpoint = endpoint.trim_end_matches('/').to_string();
        }

        config
    }

    /// Use a fixed request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// `true`, `1`, `yes` and `on` (any case) enable a flag; anything else
/// leaves it off.
fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "true" | "1" | "yes" | "on"
    )
}

fn non_empty_var(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
