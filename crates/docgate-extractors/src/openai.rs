//! OpenAI chat model used by the structured data extractor.

use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessage,
        ChatCompletionRequestSystemMessageContent, ChatCompletionRequestUserMessage,
        ChatCompletionRequestUserMessageContent, CreateChatCompletionRequest,
    },
    Client,
};
use async_trait::async_trait;
use once_cell::sync::OnceCell;
use secrecy::ExposeSecret;

use crate::config::ChatConfig;
use crate::error::{ExtractError, ExtractResult};
use crate::structured::ChatModel;

/// OpenAI chat-completion model.
///
/// The client is built from [`ChatConfig`] the first time a completion is
/// requested and shared by every later call.
pub struct OpenAiChatModel {
    config: ChatConfig,
    client: OnceCell<Client<OpenAIConfig>>,
}

impl OpenAiChatModel {
    pub fn new(config: ChatConfig) -> Self {
        Self {
            config,
            client: OnceCell::new(),
        }
    }

    pub fn from_env() -> Self {
        Self::new(ChatConfig::from_env())
    }

    pub fn model(&self) -> &str {
        &self.config.model
    }

    fn client(&self) -> ExtractResult<&Client<OpenAIConfig>> {
        self.client.get_or_try_init(|| {
            let api_key = self.config.api_key.as_ref().ok_or_else(|| {
                ExtractError::configuration(
                    "OpenAI API key not found. Set PLATFORM_OPENAI_KEY or OPENAI_API_KEY.",
                )
            })?;

            let mut openai_config = OpenAIConfig::new().with_api_key(api_key.expose_secret().as_str());
            if let Some(ref base_url) = self.config.base_url {
                openai_config = openai_config.with_api_base(base_url);
            }

            let http = reqwest::Client::builder()
                .timeout(self.config.request_timeout)
                .build()
                .map_err(|e| ExtractError::configuration(format!("cannot build HTTP client: {}", e)))?;

            tracing::info!(model = %self.config.model, "OpenAI client initialized");
            Ok(Client::with_config(openai_config).with_http_client(http))
        })
    }

    fn build_request(&self, system: &str, user: &str) -> CreateChatCompletionRequest {
        CreateChatCompletionRequest {
            model: self.config.model.clone(),
            messages: vec![
                ChatCompletionRequestMessage::System(ChatCompletionRequestSystemMessage {
                    content: ChatCompletionRequestSystemMessageContent::Text(system.to_string()),
                    name: None,
                }),
                ChatCompletionRequestMessage::User(ChatCompletionRequestUserMessage {
                    content: ChatCompletionRequestUserMessageContent::Text(user.to_string()),
                    name: None,
                }),
            ],
            temperature: Some(0.0),
            ..Default::default()
        }
    }
}

#[async_trait]
impl ChatModel for OpenAiChatModel {
    async fn complete(&self, system: &str, user: &str) -> ExtractResult<String> {
        let client = self.client()?;
        let request = self.build_request(system, user);

        let response = client
            .chat()
            .create(request)
            .await
            .map_err(|e| ExtractError::upstream(format!("OpenAI API error: {}", e)))?;

        response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ExtractError::upstream("OpenAI returned an empty response"))
    }
}
