//! Structured data extraction through a chat-completion model.
//!
//! The model is told to answer in JSON. Its reply is parsed leniently:
//! a fenced ```json block wins, then the whole reply, and when neither
//! parses the extractor answers with [`SOFT_FAILURE_MESSAGE`] as a normal
//! result so the caller still gets a 200. Setting `strict_json` turns that
//! case into an upstream error instead.

use std::sync::Arc;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::json;

use crate::error::{ExtractError, ExtractResult};
use crate::types::{BackendKind, ExtractionOutput, ExtractionRequest};
use crate::Extractor;

/// System instruction sent with every message.
pub const JSON_SYSTEM_PROMPT: &str = "Your responses must always be in JSON format";

/// Payload returned when the model reply contains no usable JSON.
pub const SOFT_FAILURE_MESSAGE: &str = "model did not respond in JSON format";

/// A chat-completion model.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send one system + user exchange with deterministic sampling and
    /// return the raw reply text.
    async fn complete(&self, system: &str, user: &str) -> ExtractResult<String>;
}

/// Parse the JSON payload out of a model reply.
///
/// A fenced ```` ```json ```` block wins when present, and its contents
/// must parse; otherwise the whole reply is tried. `Ok(None)` means the
/// reply carried no JSON at all.
pub fn parse_model_reply(reply: &str) -> ExtractResult<Option<serde_json::Value>> {
    static JSON_BLOCK: Lazy<Regex> = Lazy::new(|| {
        Regex::new(r"(?s)```json\s*(.*?)\s*```").expect("JSON block pattern is valid")
    });

    if let Some(block) = JSON_BLOCK.captures(reply).and_then(|caps| caps.get(1)) {
        return serde_json::from_str(block.as_str())
            .map(Some)
            .map_err(|e| ExtractError::upstream(format!("invalid JSON block in model reply: {}", e)));
    }

    Ok(serde_json::from_str(reply.trim()).ok())
}

/// Extractor turning free text into structured JSON.
pub struct StructuredDataExtractor {
    model: Arc<dyn ChatModel>,
    strict_json: bool,
}

impl StructuredDataExtractor {
    pub fn new(model: Arc<dyn ChatModel>) -> Self {
        Self {
            model,
            strict_json: false,
        }
    }

    /// Fail with an upstream error instead of the soft failure payload.
    pub fn with_strict_json(mut self, strict: bool) -> Self {
        self.strict_json = strict;
        self
    }
}

#[async_trait]
impl Extractor for StructuredDataExtractor {
    async fn extract(&self, request: &ExtractionRequest) -> ExtractResult<ExtractionOutput> {
        let ExtractionRequest::StructuredText { message } = request else {
            return Err(ExtractError::invalid_input(format!(
                "{} extractor cannot handle {} requests",
                self.name(),
                request.kind()
            )));
        };
        if message.trim().is_empty() {
            return Err(ExtractError::invalid_input("message is required"));
        }

        let reply = self.model.complete(JSON_SYSTEM_PROMPT, message).await?;

        match parse_model_reply(&reply)? {
            Some(value) => Ok(ExtractionOutput::Structured(value)),
            None if self.strict_json => Err(ExtractError::upstream(SOFT_FAILURE_MESSAGE)),
            None => {
                tracing::warn!(reply_len = reply.len(), "Model reply contained no JSON");
                Ok(ExtractionOutput::Structured(json!({ "error": SOFT_FAILURE_MESSAGE })))
            }
        }
    }

    fn kind(&self) -> BackendKind {
        BackendKind::StructuredText
    }

    fn name(&self) -> &str {
        "structured-data"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockall::predicate::eq;

    fn extractor_replying(reply: &'static str) -> StructuredDataExtractor {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(move |_, _| Ok(reply.to_string()));
        StructuredDataExtractor::new(Arc::new(model))
    }

    #[test]
    fn test_parse_fenced_block() {
        let value = parse_model_reply("Sure!\n```json\n{\"a\": 1}\n```\nAnything else?")
            .unwrap()
            .unwrap();
        assert_eq!(value, json!({"a": 1}));
    }

    #[test]
    fn test_parse_bare_json() {
        let value = parse_model_reply("  {\"total\": 42.5, \"currency\": \"EUR\"}\n")
            .unwrap()
            .unwrap();
        assert_eq!(value, json!({"total": 42.5, "currency": "EUR"}));
    }

    #[test]
    fn test_parse_broken_fence_is_an_error() {
        let err = parse_model_reply("```json\n{\"a\": 1,}\n```").unwrap_err();
        assert!(matches!(err, ExtractError::Upstream(_)));
    }

    #[test]
    fn test_parse_plain_text() {
        assert!(parse_model_reply("not json at all").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_broken_fence_fails_the_request() {
        let extractor = extractor_replying("```json\n{\"a\": 1,}\n```");
        let err = extractor
            .extract(&ExtractionRequest::structured_text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_sends_json_instruction_and_message() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .with(eq(JSON_SYSTEM_PROMPT), eq("invoice 42 due friday"))
            .times(1)
            .returning(|_, _| Ok("{\"invoice\": 42}".to_string()));

        let extractor = StructuredDataExtractor::new(Arc::new(model));
        let output = extractor
            .extract(&ExtractionRequest::structured_text("invoice 42 due friday"))
            .await
            .unwrap();

        assert_eq!(output, ExtractionOutput::Structured(json!({"invoice": 42})));
    }

    #[tokio::test]
    async fn test_fenced_reply_round_trip() {
        let extractor = extractor_replying("```json\n{\"a\":1}\n```");
        let output = extractor
            .extract(&ExtractionRequest::structured_text("give me a"))
            .await
            .unwrap();
        assert_eq!(output.into_value(), json!({"a": 1}));
    }

    #[tokio::test]
    async fn test_soft_failure_payload() {
        let extractor = extractor_replying("not json at all");
        let output = extractor
            .extract(&ExtractionRequest::structured_text("hello"))
            .await
            .unwrap();
        assert_eq!(
            output.into_value(),
            json!({"error": "model did not respond in JSON format"})
        );
    }

    #[tokio::test]
    async fn test_strict_json_turns_soft_failure_into_error() {
        let extractor = extractor_replying("not json at all").with_strict_json(true);
        let err = extractor
            .extract(&ExtractionRequest::structured_text("hello"))
            .await
            .unwrap_err();
        assert!(matches!(err, ExtractError::Upstream(_)));
    }

    #[tokio::test]
    async fn test_model_failure_propagates() {
        let mut model = MockChatModel::new();
        model
            .expect_complete()
            .returning(|_, _| Err(ExtractError::upstream("rate limited")));

        let extractor = StructuredDataExtractor::new(Arc::new(model));
        let err = extractor
            .extract(&ExtractionRequest::structured_text("hello"))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "upstream service error: rate limited");
    }

    #[tokio::test]
    async fn test_blank_message_never_reaches_model() {
        let mut model = MockChatModel::new();
        model.expect_complete().times(0);

        let extractor = StructuredDataExtractor::new(Arc::new(model));
        let err = extractor
            .extract(&ExtractionRequest::structured_text("   "))
            .await
            .unwrap_err();
        assert!(err.is_client_error());
    }
}
