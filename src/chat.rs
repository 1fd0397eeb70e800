use crate::agents::{Agent, AgentRegistry};
use crate::completion::{CompletionRequest, CompletionService};
use crate::error::{ChatError, CompletionError};
use crate::message::{Message, MessageKind};
use crate::prompt;
use crate::storage::{KeyValueStore, KeyValueStoreExt, chat_history_key};

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

pub const CONNECTION_TROUBLE: &str =
    "I apologize, but I'm having trouble connecting. Please try again.";

/// Handle for one in-flight completion, returned by `begin_send` and consumed by `finish_reply`.
#[derive(Debug, Clone)]
pub struct ReplyTicket {
    pub agent_id: String,
    pub request: CompletionRequest,
    pub cancel: CancellationToken,
    epoch: u64,
    message_id: Uuid,
}

struct InFlight {
    epoch: u64,
    cancel: CancellationToken,
}

/// Conversation state for every agent. Each agent moves idle -> awaiting reply -> idle.
pub struct ChatStore {
    registry: Arc<AgentRegistry>,
    store: Arc<dyn KeyValueStore>,
    histories: HashMap<String, Vec<Message>>,
    active: Option<String>,
    epochs: HashMap<String, u64>,
    in_flight: HashMap<String, InFlight>,
    pending_writes: BTreeSet<String>,
}

impl ChatStore {
    pub fn new(registry: Arc<AgentRegistry>, store: Arc<dyn KeyValueStore>) -> Self {
        Self {
            registry,
            store,
            histories: HashMap::new(),
            active: None,
            epochs: HashMap::new(),
            in_flight: HashMap::new(),
            pending_writes: BTreeSet::new(),
        }
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    pub fn active_agent(&self) -> Option<&Agent> {
        self.active.as_deref().and_then(|id| self.registry.get(id))
    }

    pub fn messages(&self, agent_id: &str) -> &[Message] {
        self.histories
            .get(agent_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    pub fn is_awaiting_reply(&self, agent_id: &str) -> bool {
        self.in_flight.contains_key(agent_id)
    }

    pub fn pending_writes(&self) -> Vec<String> {
        self.pending_writes.iter().cloned().collect()
    }

    /// Switches the active agent, hydrating its history from the store on first use.
    pub fn select_agent(&mut self, agent_id: &str) -> Result<&Agent, ChatError> {
        let agent = self
            .registry
            .get(agent_id)
            .cloned()
            .ok_or_else(|| ChatError::UnknownAgent(agent_id.to_string()))?;

        self.hydrate(agent_id);
        let history = self.histories.entry(agent_id.to_string()).or_default();
        if history.is_empty() {
            history.push(Message::system(agent_id, profile_greeting(&agent)));
        }

        log::debug!("Selected agent {}", agent_id);
        self.active = Some(agent_id.to_string());
        self.registry
            .get(agent_id)
            .ok_or_else(|| ChatError::UnknownAgent(agent_id.to_string()))
    }

    pub fn reset_agent(&mut self) {
        self.active = None;
    }

    /// Appends a message. A user message also runs the completion round trip.
    pub async fn add_message(
        &mut self,
        message: Message,
        completion: &dyn CompletionService,
    ) -> Result<(), ChatError> {
        if message.kind != MessageKind::User {
            if self.registry.get(&message.agent_id).is_none() {
                return Err(ChatError::UnknownAgent(message.agent_id));
            }
            self.hydrate(&message.agent_id);
            self.append(message);
            return Ok(());
        }

        let ticket = self.begin_send_to(&message.agent_id, &message.content)?;
        let result = completion
            .complete(ticket.request.clone(), ticket.cancel.clone())
            .await;
        self.finish_reply(ticket, result);
        Ok(())
    }

    pub async fn send(
        &mut self,
        text: &str,
        completion: &dyn CompletionService,
    ) -> Result<(), ChatError> {
        let agent_id = self.active.clone().ok_or(ChatError::NoActiveAgent)?;
        self.add_message(Message::user(agent_id, text), completion)
            .await
    }

    /// Appends the user message for the active agent and hands back the request to run.
    pub fn begin_send(&mut self, text: &str) -> Result<ReplyTicket, ChatError> {
        let agent_id = self.active.clone().ok_or(ChatError::NoActiveAgent)?;
        self.begin_send_to(&agent_id, text)
    }

    pub fn begin_send_to(&mut self, agent_id: &str, text: &str) -> Result<ReplyTicket, ChatError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        let agent = self
            .registry
            .get(agent_id)
            .cloned()
            .ok_or_else(|| ChatError::UnknownAgent(agent_id.to_string()))?;
        if self.in_flight.contains_key(agent_id) {
            return Err(ChatError::Busy(agent.name));
        }

        self.hydrate(agent_id);
        let mut message = Message::user(agent_id, text);
        message.pending = true;
        let message_id = message.id;
        self.append(message);

        let epoch = self.epoch(agent_id);
        let cancel = CancellationToken::new();
        self.in_flight.insert(
            agent_id.to_string(),
            InFlight {
                epoch,
                cancel: cancel.clone(),
            },
        );

        Ok(ReplyTicket {
            agent_id: agent_id.to_string(),
            request: prompt::agent_request(&agent, text),
            cancel,
            epoch,
            message_id,
        })
    }

    /// Applies a completion result. Returns false when the ticket went stale.
    pub fn finish_reply(
        &mut self,
        ticket: ReplyTicket,
        result: Result<String, CompletionError>,
    ) -> bool {
        let agent_id = ticket.agent_id.as_str();
        if self
            .in_flight
            .get(agent_id)
            .is_some_and(|flight| flight.epoch == ticket.epoch)
        {
            self.in_flight.remove(agent_id);
        }

        if self.epoch(agent_id) != ticket.epoch {
            log::debug!("Dropping stale reply for {agent_id}");
            return false;
        }

        if let Some(history) = self.histories.get_mut(agent_id) {
            for message in history.iter_mut().filter(|m| m.id == ticket.message_id) {
                message.pending = false;
            }
        }

        let reply = match result {
            Ok(text) => Message::agent(agent_id, normalize_reply(&text)),
            Err(e) => {
                log::error!("Completion for {agent_id} failed: {e}");
                Message::system(agent_id, failure_text(&e))
            }
        };
        self.append(reply);
        true
    }

    // Cancels anything in flight and wipes the persisted history.
    pub fn clear_history(&mut self, agent_id: &str) {
        *self.epochs.entry(agent_id.to_string()).or_default() += 1;
        if let Some(flight) = self.in_flight.remove(agent_id) {
            flight.cancel.cancel();
        }
        self.histories.insert(agent_id.to_string(), Vec::new());

        if let Err(e) = self.store.remove(&chat_history_key(agent_id)) {
            log::warn!("Failed to clear stored history for {agent_id}: {e}");
            self.pending_writes.insert(agent_id.to_string());
        }
    }

    /// Retries every failed history write. Returns how many agents are still pending.
    pub fn flush_pending_writes(&mut self) -> usize {
        let pending: Vec<String> = self.pending_writes.iter().cloned().collect();
        for agent_id in pending {
            let persisted = self.persisted(&agent_id);
            match self.store.save(&chat_history_key(&agent_id), &persisted) {
                Ok(()) => {
                    self.pending_writes.remove(&agent_id);
                    log::info!("Flushed pending history for {agent_id}");
                }
                Err(e) => log::warn!("History for {agent_id} still not persisted: {e}"),
            }
        }
        self.pending_writes.len()
    }

    fn epoch(&self, agent_id: &str) -> u64 {
        self.epochs.get(agent_id).copied().unwrap_or_default()
    }

    fn hydrate(&mut self, agent_id: &str) {
        if self.histories.contains_key(agent_id) {
            return;
        }
        let history = match self.store.load::<Vec<Message>>(&chat_history_key(agent_id)) {
            Ok(history) => history.unwrap_or_default(),
            Err(e) => {
                log::warn!("Could not load history for {agent_id}: {e}");
                Vec::new()
            }
        };
        self.histories.insert(agent_id.to_string(), history);
    }

    fn persisted(&self, agent_id: &str) -> Vec<Message> {
        self.messages(agent_id)
            .iter()
            .filter(|m| m.kind.is_persisted())
            .cloned()
            .collect()
    }

    // Write-ahead: the store sees the new list before memory does.
    fn append(&mut self, message: Message) {
        let agent_id = message.agent_id.clone();
        if message.kind.is_persisted() {
            let mut persisted = self.persisted(&agent_id);
            persisted.push(message.clone());
            if let Err(e) = self.store.save(&chat_history_key(&agent_id), &persisted) {
                log::warn!("Failed to persist message for {agent_id}: {e}");
                self.pending_writes.insert(agent_id.clone());
            }
        }
        self.histories.entry(agent_id).or_default().push(message);
    }
}

/// Trims the reply and makes sure it ends on terminal punctuation.
pub fn normalize_reply(text: &str) -> String {
    let mut reply = text.trim().to_string();
    if reply.is_empty() {
        return reply;
    }

    if let Some(stripped) = reply.strip_suffix("...") {
        reply = format!("{stripped}.");
    } else if let Some(stripped) = reply.strip_suffix('…') {
        reply = format!("{stripped}.");
    }

    if !reply.ends_with(['.', '!', '?']) {
        reply.push('.');
    }
    reply
}

fn failure_text(error: &CompletionError) -> String {
    match error {
        CompletionError::Upstream(_) | CompletionError::Timeout(_) => CONNECTION_TROUBLE.to_string(),
        other => other.to_string(),
    }
}

pub fn profile_greeting(agent: &Agent) -> String {
    format!(
        "[AGENT PROFILE]\n\nName: {}\nTitle: {}\n\nDescription: {}\n\nPersonality Analysis:\n\
         • Tone: {}\n• Core Traits: {}\n\n[SECURE CHANNEL ESTABLISHED]\n\
         You may now begin your conversation...",
        agent.name,
        agent.title,
        agent.description,
        agent.personality.tone,
        agent.personality.traits.join(", ")
    )
}
