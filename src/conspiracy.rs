use crate::completion::CompletionService;
use crate::error::ConspiracyError;
use crate::prompt;
use crate::storage::{KeyValueStore, KeyValueStoreExt, PAST_CONSPIRACIES_KEY};
use crate::vault::DataVault;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const CONTEXT_ROW_LIMIT: usize = 200;
pub const TITLE_MAX_CHARS: usize = 50;

pub const GENERATION_FAILED: &str =
    "ERROR: Neural interface disrupted while accessing classified data. Please try again.";

const WELCOME: &str = "QUANTUM NEURAL INTERFACE ACTIVATED
CONSPIRACY ANALYSIS MODULE: ONLINE
REALITY DISTORTION FILTERS: ENABLED

Welcome to the Conspiracy Builder, truth seeker. Name a topic or a keyword and the interface \
will cross-reference the classified data streams for connections THEY would rather you missed.

Try asking about:
- The true purpose of cryptocurrency
- Hidden meanings in social media algorithms
- Ancient technology and quantum computing
- The reality behind 5G networks";

const SECURITY_WARNING: &str = "SECURITY WARNING: This neural interface is being monitored. \
Use quantum encryption protocols when sharing sensitive information.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConspiracyMessageKind {
    User,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConspiracyMessage {
    pub id: Uuid,
    pub content: String,
    pub kind: ConspiracyMessageKind,
    pub timestamp: DateTime<Utc>,
}

impl ConspiracyMessage {
    pub fn new(kind: ConspiracyMessageKind, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            content: content.into(),
            kind,
            timestamp: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConspiracyConversation {
    pub id: Uuid,
    pub title: String,
    pub messages: Vec<ConspiracyMessage>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct GenerateTicket {
    pub prompt: String,
    pub cancel: CancellationToken,
    epoch: u64,
}

pub fn welcome_messages() -> Vec<ConspiracyMessage> {
    vec![
        ConspiracyMessage::new(ConspiracyMessageKind::System, WELCOME),
        ConspiracyMessage::new(ConspiracyMessageKind::System, SECURITY_WARNING),
    ]
}

/// Builds the dataset context and asks the completion service for a write-up.
///
/// When `api_key` is given the vault's rate limit and key check apply first.
pub async fn build_conspiracy(
    prompt_text: &str,
    api_key: Option<&str>,
    vault: &DataVault,
    completion: &dyn CompletionService,
    cancel: CancellationToken,
) -> Result<String, ConspiracyError> {
    if prompt_text.trim().is_empty() {
        return Err(ConspiracyError::EmptyPrompt);
    }
    if let Some(key) = api_key {
        vault.authorize(key)?;
    }

    let context = vault.context_rows(CONTEXT_ROW_LIMIT).await.join("\n");
    let request = prompt::conspiracy_request(&context, prompt_text.trim());
    Ok(completion.complete(request, cancel).await?)
}

/// Key-gated generation that leaves no transcript behind.
pub async fn generate_with_key(
    prompt_text: &str,
    api_key: &str,
    vault: &DataVault,
    completion: &dyn CompletionService,
    cancel: CancellationToken,
) -> Result<String, ConspiracyError> {
    build_conspiracy(prompt_text, Some(api_key), vault, completion, cancel).await
}

pub struct ConspiracyStore {
    store: Arc<dyn KeyValueStore>,
    messages: Vec<ConspiracyMessage>,
    past: Vec<ConspiracyConversation>,
    current_id: Option<Uuid>,
    generating: bool,
    epoch: u64,
}

impl ConspiracyStore {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        let past = match store.load::<Vec<ConspiracyConversation>>(PAST_CONSPIRACIES_KEY) {
            Ok(past) => past.unwrap_or_default(),
            Err(e) => {
                log::warn!("Ignoring unreadable conspiracy archive: {e}");
                Vec::new()
            }
        };

        Self {
            store,
            messages: welcome_messages(),
            past,
            current_id: None,
            generating: false,
            epoch: 0,
        }
    }

    pub fn messages(&self) -> &[ConspiracyMessage] {
        &self.messages
    }

    pub fn past_conversations(&self) -> &[ConspiracyConversation] {
        &self.past
    }

    pub fn is_generating(&self) -> bool {
        self.generating
    }

    pub fn begin_generate(&mut self, prompt_text: &str) -> Result<GenerateTicket, ConspiracyError> {
        let prompt_text = prompt_text.trim();
        if prompt_text.is_empty() {
            return Err(ConspiracyError::EmptyPrompt);
        }
        if self.generating {
            return Err(ConspiracyError::AlreadyGenerating);
        }

        self.messages.push(ConspiracyMessage::new(
            ConspiracyMessageKind::User,
            prompt_text,
        ));
        self.generating = true;
        Ok(GenerateTicket {
            prompt: prompt_text.to_string(),
            cancel: CancellationToken::new(),
            epoch: self.epoch,
        })
    }

    /// Appends the result and archives the conversation. Stale tickets are ignored.
    pub fn finish_generate(
        &mut self,
        ticket: GenerateTicket,
        result: Result<String, ConspiracyError>,
    ) -> bool {
        if ticket.epoch != self.epoch {
            log::debug!("Dropping stale conspiracy result");
            return false;
        }
        self.generating = false;

        let content = match result {
            Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
            Ok(_) => GENERATION_FAILED.to_string(),
            Err(e) => {
                log::error!("Conspiracy generation failed: {e}");
                GENERATION_FAILED.to_string()
            }
        };
        self.messages
            .push(ConspiracyMessage::new(ConspiracyMessageKind::System, content));
        self.save_past_conversation();
        true
    }

    pub async fn generate(
        &mut self,
        prompt_text: &str,
        vault: &DataVault,
        completion: &dyn CompletionService,
    ) -> Result<(), ConspiracyError> {
        let ticket = self.begin_generate(prompt_text)?;
        let result = build_conspiracy(
            &ticket.prompt,
            None,
            vault,
            completion,
            ticket.cancel.clone(),
        )
        .await;
        self.finish_generate(ticket, result);
        Ok(())
    }

    /// Archives the current transcript, newest first. Returns false when there is nothing
    /// beyond the welcome messages.
    pub fn save_past_conversation(&mut self) -> bool {
        let Some(first_user) = self
            .messages
            .iter()
            .position(|m| m.kind == ConspiracyMessageKind::User)
        else {
            return false;
        };
        if self.messages.len() <= 2 {
            return false;
        }

        let title_source = self.messages[first_user + 1..]
            .iter()
            .find(|m| m.kind == ConspiracyMessageKind::System)
            .unwrap_or(&self.messages[first_user]);
        let title = derive_title(&title_source.content);

        let id = *self.current_id.get_or_insert_with(Uuid::new_v4);
        let created_at = self
            .past
            .iter()
            .find(|c| c.id == id)
            .map(|c| c.created_at)
            .unwrap_or_else(Utc::now);
        self.past.retain(|c| c.id != id);
        self.past.insert(
            0,
            ConspiracyConversation {
                id,
                title,
                messages: self.messages.clone(),
                created_at,
            },
        );
        self.persist();
        true
    }

    pub fn load_conversation(&mut self, id: Uuid) -> bool {
        let Some(conversation) = self.past.iter().find(|c| c.id == id) else {
            return false;
        };
        self.messages = conversation.messages.clone();
        self.current_id = Some(id);
        self.epoch += 1;
        self.generating = false;
        true
    }

    pub fn delete_conversation(&mut self, id: Uuid) -> bool {
        let before = self.past.len();
        self.past.retain(|c| c.id != id);
        if self.past.len() == before {
            return false;
        }
        if self.current_id == Some(id) {
            self.current_id = None;
        }
        self.persist();
        true
    }

    pub fn clear_current(&mut self) {
        self.messages = welcome_messages();
        self.current_id = None;
        self.generating = false;
        self.epoch += 1;
    }

    fn persist(&self) {
        if let Err(e) = self.store.save(PAST_CONSPIRACIES_KEY, &self.past) {
            log::warn!("Failed to persist conspiracy archive: {e}");
        }
    }
}

fn derive_title(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or_default().trim();
    let mut title: String = first_line.chars().take(TITLE_MAX_CHARS).collect();
    title.push_str("...");
    title
}
