pub mod agents;
pub mod app;
pub mod call;
pub mod chat;
pub mod completion;
pub mod conspiracy;
pub mod error;
pub mod logging;
pub mod message;
pub mod prompt;
pub mod rate_limiter;
pub mod rpg;
pub mod settings;
pub mod storage;
pub mod tui;
pub mod ui;
pub mod vault;

// Re-export commonly used items for easier access
pub use agents::{Agent, AgentRegistry};
pub use chat::ChatStore;
pub use completion::{CompletionRequest, CompletionService, OpenAiCompletion};
pub use error::{AppError, Result};
pub use message::{Message, MessageKind};
pub use rate_limiter::RateLimiter;
pub use settings::Settings;
pub use storage::{FileStore, KeyValueStore, KeyValueStoreExt, MemoryStore};
