use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    User,
    Agent,
    System,
}

impl MessageKind {
    // System messages are display-only.
    pub fn is_persisted(self) -> bool {
        !matches!(self, MessageKind::System)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub agent_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(skip)]
    pub pending: bool,
}

impl Message {
    pub fn new(agent_id: impl Into<String>, content: impl Into<String>, kind: MessageKind) -> Self {
        Message {
            id: Uuid::new_v4(),
            agent_id: agent_id.into(),
            content: content.into(),
            timestamp: Utc::now(),
            kind,
            pending: false,
        }
    }

    pub fn user(agent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, content, MessageKind::User)
    }

    pub fn agent(agent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, content, MessageKind::Agent)
    }

    pub fn system(agent_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self::new(agent_id, content, MessageKind::System)
    }
}
