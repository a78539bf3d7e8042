use async_openai::{
    Client,
    config::OpenAIConfig,
    error::OpenAIError,
    types::{
        ChatCompletionRequestAssistantMessageArgs, ChatCompletionRequestMessage,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequestArgs,
    },
};
use async_trait::async_trait;
use std::time::Duration;

/// Gemini's OpenAI-compatible chat completions endpoint.
pub const GEMINI_OPENAI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/openai";

/// Model used when the configuration does not name one.
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// The two roles the generation capability distinguishes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    /// Learner-authored turns, including the instruction preamble.
    User,
    /// Turns previously produced by the model.
    Model,
}

/// A single entry of a generation request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromptTurn {
    pub role: PromptRole,
    pub text: String,
}

impl PromptTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::User,
            text: text.into(),
        }
    }

    pub fn model(text: impl Into<String>) -> Self {
        Self {
            role: PromptRole::Model,
            text: text.into(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("Generation request failed: {0}")]
    Api(#[from] OpenAIError),
    #[error("Generation provider unavailable: {0}")]
    Unavailable(String),
}

/// A text generation capability that continues an ordered conversation.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait GenerationClient: Send + Sync {
    /// Returns the model's next turn for `turns`.
    ///
    /// An empty string means the provider answered without any text.
    async fn generate(&self, turns: Vec<PromptTurn>) -> Result<String, GenerationError>;
}

/// Settings for [`GeminiClient`].
#[derive(Debug, Clone)]
pub struct TutorConfig {
    pub generation_api_key: String,
    pub generation_model_id: String,
    pub generation_api_base: String,
}

impl TutorConfig {
    /// Targets the public Gemini endpoint with the default model.
    pub fn new(generation_api_key: impl Into<String>) -> Self {
        Self {
            generation_api_key: generation_api_key.into(),
            generation_model_id: DEFAULT_GEMINI_MODEL.to_string(),
            generation_api_base: GEMINI_OPENAI_API_BASE.to_string(),
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.generation_model_id = model.into();
        self
    }

    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.generation_api_base = api_base.into();
        self
    }
}

/// [`GenerationClient`] backed by Gemini through its OpenAI-compatible API.
pub struct GeminiClient {
    client: Client<OpenAIConfig>,
    model: String,
}

impl GeminiClient {
    /// Creates a client for the configured endpoint and model.
    ///
    /// Only the connection phase is bounded here; callers decide how long a
    /// whole generation may take.
    pub fn new(config: &TutorConfig) -> Self {
        let openai_config = OpenAIConfig::new()
            .with_api_key(&config.generation_api_key)
            .with_api_base(&config.generation_api_base);
        let http_client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_default();
        Self {
            client: Client::with_config(openai_config).with_http_client(http_client),
            model: config.generation_model_id.clone(),
        }
    }

    fn to_request_messages(
        turns: Vec<PromptTurn>,
    ) -> Result<Vec<ChatCompletionRequestMessage>, OpenAIError> {
        turns
            .into_iter()
            .map(|turn| -> Result<ChatCompletionRequestMessage, OpenAIError> {
                Ok(match turn.role {
                    PromptRole::User => ChatCompletionRequestUserMessageArgs::default()
                        .content(turn.text)
                        .build()?
                        .into(),
                    PromptRole::Model => ChatCompletionRequestAssistantMessageArgs::default()
                        .content(turn.text)
                        .build()?
                        .into(),
                })
            })
            .collect()
    }
}

#[async_trait]
impl GenerationClient for GeminiClient {
    async fn generate(&self, turns: Vec<PromptTurn>) -> Result<String, GenerationError> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(Self::to_request_messages(turns)?)
            .build()?;

        let response = self.client.chat().create(request).await?;

        Ok(response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}
