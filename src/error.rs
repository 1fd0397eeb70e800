use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = AppError> = std::result::Result<T, E>;

// Enum for handling application-level errors at the front-end boundary.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Vault error: {0}")]
    Vault(#[from] VaultError),

    #[error("Completion error: {0}")]
    Completion(#[from] CompletionError),

    #[error("Chat error: {0}")]
    Chat(#[from] ChatError),

    #[error("Call error: {0}")]
    Call(#[from] CallError),

    #[error("Storage error: {0}")]
    Store(#[from] StoreError),

    #[error("Conspiracy error: {0}")]
    Conspiracy(#[from] ConspiracyError),

    #[error("RPG error: {0}")]
    Rpg(#[from] RpgError),

    #[error("Agent registry error: {0}")]
    Agents(#[from] AgentError),

    #[error("Logger error: {0}")]
    Logger(#[from] LoggingError),

    #[error("IO error: {0}")]
    IO(#[from] std::io::Error),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage IO failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("stored value could not be (de)serialized: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("could not prepare log directory: {0}")]
    Io(#[from] std::io::Error),

    #[error("logger already set")]
    AlreadySet,

    #[error("could not install logger: {0}")]
    SetLogger(String),
}

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("invalid agent definition in {path}: {source}")]
    InvalidDefinition {
        path: String,
        source: serde_json::Error,
    },

    #[error("duplicate agent id: {0}")]
    DuplicateId(String),

    #[error("no agent definitions found")]
    Empty,
}

// Errors surfaced by the Data Vault query layer. Display strings are shown verbatim.
#[derive(Debug, Error)]
pub enum VaultError {
    #[error("Invalid filename")]
    InvalidFilename(String),

    #[error("Invalid API key")]
    InvalidApiKey,

    #[error("Rate limit exceeded. Try again in {}s", .retry_in.as_secs().max(1))]
    RateLimited { retry_in: Duration },

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Invalid pagination: page and page size start at 1")]
    InvalidPagination,

    #[error("Failed to load file: {0}")]
    FileNotFound(String),

    #[error("Invalid CSV file format: {0}")]
    InvalidFormat(String),

    #[error("Failed to read CSV file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse CSV file: {0}")]
    Csv(#[from] csv::Error),

    #[error("Vault storage failure: {0}")]
    Store(#[from] StoreError),
}

impl VaultError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, VaultError::RateLimited { .. })
    }
}

#[derive(Debug, Error)]
pub enum CompletionError {
    #[error("CRITICAL ERROR: Neural interface offline. Please check API configuration.")]
    NotConfigured,

    #[error("SYSTEM OVERLOAD: Neural network stabilizing. Please wait a moment...")]
    RateLimited,

    #[error("Neural interface timed out after {}s", .0.as_secs())]
    Timeout(Duration),

    #[error("Request cancelled")]
    Cancelled,

    #[error("Neural response corrupted. Please try again.")]
    EmptyResponse,

    #[error("Failed to connect to neural interface: {0}")]
    Upstream(String),
}

impl From<async_openai::error::OpenAIError> for CompletionError {
    fn from(err: async_openai::error::OpenAIError) -> Self {
        CompletionError::Upstream(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum ChatError {
    #[error("Unknown agent: {0}")]
    UnknownAgent(String),

    #[error("No agent selected")]
    NoActiveAgent,

    #[error("Agent {0} is still answering the previous message")]
    Busy(String),

    #[error("Message is empty")]
    EmptyMessage,
}

// Failure reasons for the voice-call flow, each mapped to a distinct user-facing message.
#[derive(Debug, Error)]
pub enum CallError {
    #[error("Invalid quantum frequency pattern (invalid phone number format)")]
    InvalidPhoneNumber,

    #[error("Voice synthesis module not configured. Please check your environment variables.")]
    NotConfigured,

    #[error("Voice pathway not configured for agent {0}.")]
    MissingPathway(String),

    #[error("Authentication failed. Please verify your voice API key and organization ID.")]
    Unauthorized,

    #[error("Invalid pathway ID or resource not found.")]
    PathwayNotFound,

    #[error("Failed to establish quantum connection (status {status}). Please try again.")]
    Upstream { status: u16 },

    #[error("Quantum transmission disrupted: {0}")]
    Transport(String),

    #[error("Unreadable response from voice service: {0}")]
    MalformedResponse(String),

    #[error("Voice service timed out")]
    Timeout,

    #[error("Call request cancelled")]
    Cancelled,
}

impl From<reqwest::Error> for CallError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CallError::Timeout
        } else if err.is_decode() {
            CallError::MalformedResponse(err.to_string())
        } else {
            CallError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, Error)]
pub enum ConspiracyError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("A conspiracy is already being generated")]
    AlreadyGenerating,

    #[error(transparent)]
    Vault(#[from] VaultError),

    #[error(transparent)]
    Completion(#[from] CompletionError),
}

#[derive(Debug, Error)]
pub enum RpgError {
    #[error("Invalid RPG content: {0}")]
    InvalidContent(#[from] serde_json::Error),
}
