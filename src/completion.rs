use crate::error::CompletionError;
use crate::rate_limiter::RateLimiter;
use crate::settings::Settings;

use async_openai::{
    Client,
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
        ChatCompletionRequestUserMessageArgs, CreateChatCompletionRequest,
        CreateChatCompletionRequestArgs, Stop,
    },
};
use async_trait::async_trait;
use std::sync::Mutex;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// A single system + user prompt exchange with sampling parameters.
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub user_message: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub top_p: Option<f32>,
    pub frequency_penalty: Option<f32>,
    pub presence_penalty: Option<f32>,
    pub stop: Vec<String>,
}

impl CompletionRequest {
    pub fn new(system_prompt: impl Into<String>, user_message: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_message: user_message.into(),
            temperature: 0.8,
            max_tokens: 200,
            top_p: None,
            frequency_penalty: None,
            presence_penalty: None,
            stop: Vec::new(),
        }
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    pub fn top_p(mut self, top_p: f32) -> Self {
        self.top_p = Some(top_p);
        self
    }

    pub fn penalties(mut self, frequency: f32, presence: f32) -> Self {
        self.frequency_penalty = Some(frequency);
        self.presence_penalty = Some(presence);
        self
    }

    pub fn stop<I, S>(mut self, stop: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.stop = stop.into_iter().map(Into::into).collect();
        self
    }
}

/// Text completion boundary. Implementations must honour `cancel`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<String, CompletionError>;
}

// OpenAI-compatible chat completions endpoint (Venice by default).
pub struct OpenAiCompletion {
    client: Client<OpenAIConfig>,
    model: String,
    configured: bool,
    timeout: Duration,
    limiter: Mutex<RateLimiter>,
}

impl OpenAiCompletion {
    pub fn new(api_key: &str, base_url: &str, model: &str, timeout: Duration) -> Self {
        let config = OpenAIConfig::new()
            .with_api_key(api_key)
            .with_api_base(base_url.trim_end_matches('/'));
        if api_key.trim().is_empty() {
            log::warn!("Completion API key missing, neural interface disabled");
        }

        Self {
            client: Client::with_config(config),
            model: model.to_string(),
            configured: !api_key.trim().is_empty(),
            timeout,
            limiter: Mutex::new(RateLimiter::default()),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(
            &settings.venice_api_key,
            &settings.venice_base_url,
            &settings.model,
            settings.request_timeout(),
        )
    }

    pub fn with_rate_limiter(mut self, limiter: RateLimiter) -> Self {
        self.limiter = Mutex::new(limiter);
        self
    }

    fn acquire(&self) -> bool {
        match self.limiter.lock() {
            Ok(mut limiter) => limiter.try_acquire(),
            Err(poisoned) => poisoned.into_inner().try_acquire(),
        }
    }

    #[allow(deprecated)]
    fn build_request(
        &self,
        request: &CompletionRequest,
    ) -> Result<CreateChatCompletionRequest, CompletionError> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(request.system_prompt.as_str())
                .build()?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(request.user_message.as_str())
                .build()?
                .into(),
        ];

        let mut builder = CreateChatCompletionRequestArgs::default();
        builder
            .model(self.model.as_str())
            .messages(messages)
            .temperature(request.temperature)
            .max_tokens(request.max_tokens);

        if let Some(top_p) = request.top_p {
            builder.top_p(top_p);
        }
        if let Some(penalty) = request.frequency_penalty {
            builder.frequency_penalty(penalty);
        }
        if let Some(penalty) = request.presence_penalty {
            builder.presence_penalty(penalty);
        }
        if !request.stop.is_empty() {
            builder.stop(Stop::StringArray(request.stop.clone()));
        }

        Ok(builder.build()?)
    }
}

#[async_trait]
impl CompletionService for OpenAiCompletion {
    async fn complete(
        &self,
        request: CompletionRequest,
        cancel: CancellationToken,
    ) -> Result<String, CompletionError> {
        if !self.configured {
            return Err(CompletionError::NotConfigured);
        }
        if !self.acquire() {
            log::warn!("Completion request rejected by rate limiter");
            return Err(CompletionError::RateLimited);
        }

        let body = self.build_request(&request)?;
        let chat = self.client.chat();
        let call = tokio::time::timeout(self.timeout, chat.create(body));

        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(CompletionError::Cancelled),
            result = call => match result {
                Ok(response) => response.map_err(|e| {
                    log::error!("Completion request failed: {e}");
                    CompletionError::from(e)
                })?,
                Err(_) => {
                    log::error!("Completion request timed out after {:?}", self.timeout);
                    return Err(CompletionError::Timeout(self.timeout));
                }
            },
        };

        let content = response
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|text| text.trim().to_string())
            .unwrap_or_default();

        if content.is_empty() {
            return Err(CompletionError::EmptyResponse);
        }
        Ok(content)
    }
}
