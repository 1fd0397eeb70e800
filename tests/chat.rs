// ../tests/chat.rs
mod common;

use common::{FlakyStore, ScriptedCompletion};
use projectx_ratatui::agents::AgentRegistry;
use projectx_ratatui::chat::{CONNECTION_TROUBLE, ChatStore, normalize_reply};
use projectx_ratatui::error::{AgentError, ChatError, CompletionError};
use projectx_ratatui::message::{Message, MessageKind};
use projectx_ratatui::storage::{KeyValueStore, KeyValueStoreExt, MemoryStore, chat_history_key};
use std::sync::Arc;

fn chat_with(store: Arc<dyn KeyValueStore>) -> ChatStore {
    ChatStore::new(common::registry(), store)
}

#[test]
fn test_embedded_registry_is_sorted_by_name() {
    let registry = AgentRegistry::embedded().unwrap();
    assert_eq!(registry.len(), 7);
    let names: Vec<&str> = registry.all().iter().map(|a| a.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    assert_eq!(names, sorted);

    assert!(!registry.get("elon-musk").unwrap().can_call());
    let trump = registry.get("donald-trump").unwrap();
    assert_eq!(trump.voice(), Some("Donald_Trump_PX"));
    assert_eq!(trump.pathway_id(), None);
}

#[test]
fn test_pathways_are_filled_from_lookup() {
    let registry = AgentRegistry::embedded()
        .unwrap()
        .with_pathways(|var| (var == "BLAND_TRUMP_PATHWAY").then(|| "pw-123".to_string()));
    assert_eq!(
        registry.get("donald-trump").unwrap().pathway_id(),
        Some("pw-123")
    );

    let blank = AgentRegistry::embedded()
        .unwrap()
        .with_pathways(|_| Some("   ".to_string()));
    assert_eq!(blank.get("donald-trump").unwrap().pathway_id(), None);
}

#[test]
fn test_registry_rejects_duplicates_and_empty() {
    let registry = AgentRegistry::embedded().unwrap();
    let agent = registry.get("neo-prime").unwrap().clone();

    let err = AgentRegistry::from_agents(vec![agent.clone(), agent]).unwrap_err();
    assert!(matches!(err, AgentError::DuplicateId(id) if id == "neo-prime"));
    assert!(matches!(
        AgentRegistry::from_agents(Vec::new()),
        Err(AgentError::Empty)
    ));
    assert!(matches!(
        AgentRegistry::from_sources([("broken.json".to_string(), "{")]),
        Err(AgentError::InvalidDefinition { .. })
    ));
}

#[test]
fn test_select_unknown_agent() {
    let mut chat = chat_with(common::memory_store());
    let err = chat.select_agent("nobody").unwrap_err();
    assert!(matches!(err, ChatError::UnknownAgent(id) if id == "nobody"));
    assert!(chat.active_agent().is_none());
}

#[test]
fn test_greeting_is_shown_but_not_persisted() {
    let store = common::memory_store();
    let mut chat = chat_with(store.clone());

    let agent = chat.select_agent("neo-prime").unwrap();
    assert_eq!(agent.name, "Morpheus Zero");

    let messages = chat.messages("neo-prime");
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].kind, MessageKind::System);
    assert!(messages[0].content.starts_with("[AGENT PROFILE]"));
    assert!(messages[0].content.contains("Name: Morpheus Zero"));
    assert!(store.get_raw(&chat_history_key("neo-prime")).unwrap().is_none());
}

#[tokio::test]
async fn test_send_runs_round_trip_and_persists() {
    let store = common::memory_store();
    let mut chat = chat_with(store.clone());
    let completion = ScriptedCompletion::replying("  Wake up, the signal is everywhere...  ");

    chat.select_agent("neo-prime").unwrap();
    chat.send("  Who are you?  ", &completion).await.unwrap();

    let messages = chat.messages("neo-prime");
    assert_eq!(messages.len(), 3);
    assert_eq!(messages[1].kind, MessageKind::User);
    assert_eq!(messages[1].content, "Who are you?");
    assert!(!messages[1].pending);
    assert_eq!(messages[2].kind, MessageKind::Agent);
    assert_eq!(messages[2].content, "Wake up, the signal is everywhere.");
    assert!(!chat.is_awaiting_reply("neo-prime"));

    let stored: Vec<Message> = store
        .load(&chat_history_key("neo-prime"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[0].kind, MessageKind::User);
    assert_eq!(stored[1].kind, MessageKind::Agent);

    let requests = completion.requests();
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.user_message, "Who are you?");
    assert_eq!(request.temperature, 0.8);
    assert_eq!(request.max_tokens, 200);
    assert_eq!(request.top_p, Some(1.0));
    assert_eq!(request.frequency_penalty, Some(0.8));
    assert_eq!(request.presence_penalty, Some(0.85));
    assert_eq!(request.stop, vec!["User:", "Human:", "Assistant:", "System:"]);
    assert!(request.system_prompt.contains("Morpheus Zero"));
}

#[tokio::test]
async fn test_story_requests_get_more_room() {
    let mut chat = chat_with(common::memory_store());
    let completion = ScriptedCompletion::replying("Once upon a time.");

    chat.select_agent("time-keeper").unwrap();
    chat.send("Tell me a STORY about 1999", &completion)
        .await
        .unwrap();

    let request = &completion.requests()[0];
    assert_eq!(request.temperature, 0.85);
    assert_eq!(request.max_tokens, 250);
}

#[tokio::test]
async fn test_send_guards() {
    let mut chat = chat_with(common::memory_store());
    let completion = ScriptedCompletion::default();

    assert!(matches!(
        chat.send("hello", &completion).await,
        Err(ChatError::NoActiveAgent)
    ));

    chat.select_agent("neo-prime").unwrap();
    assert!(matches!(
        chat.send("   ", &completion).await,
        Err(ChatError::EmptyMessage)
    ));

    let _ticket = chat.begin_send("first").unwrap();
    assert!(chat.is_awaiting_reply("neo-prime"));
    assert!(matches!(
        chat.begin_send("second"),
        Err(ChatError::Busy(name)) if name == "Morpheus Zero"
    ));
    assert!(completion.requests().is_empty());
}

#[tokio::test]
async fn test_agents_reply_independently() {
    let mut chat = chat_with(common::memory_store());
    chat.select_agent("neo-prime").unwrap();
    let first = chat.begin_send("ping").unwrap();
    chat.select_agent("time-keeper").unwrap();
    let second = chat.begin_send("pong").unwrap();

    assert!(chat.finish_reply(second, Ok("Tick".to_string())));
    assert!(chat.finish_reply(first, Ok("Tock!".to_string())));

    assert_eq!(chat.messages("neo-prime").last().unwrap().content, "Tock!");
    assert_eq!(chat.messages("time-keeper").last().unwrap().content, "Tick.");
}

#[tokio::test]
async fn test_upstream_failure_shows_connection_trouble() {
    let store = common::memory_store();
    let mut chat = chat_with(store.clone());
    let completion =
        ScriptedCompletion::new([Err(CompletionError::Upstream("boom".to_string()))]);

    chat.select_agent("neo-prime").unwrap();
    chat.send("hello?", &completion).await.unwrap();

    let last = chat.messages("neo-prime").last().unwrap();
    assert_eq!(last.kind, MessageKind::System);
    assert_eq!(last.content, CONNECTION_TROUBLE);
    assert!(!chat.is_awaiting_reply("neo-prime"));

    let stored: Vec<Message> = store
        .load(&chat_history_key("neo-prime"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 1);
}

#[tokio::test]
async fn test_not_configured_is_shown_verbatim() {
    let mut chat = chat_with(common::memory_store());
    let completion = ScriptedCompletion::new([Err(CompletionError::NotConfigured)]);

    chat.select_agent("neo-prime").unwrap();
    chat.send("hello?", &completion).await.unwrap();

    assert_eq!(
        chat.messages("neo-prime").last().unwrap().content,
        "CRITICAL ERROR: Neural interface offline. Please check API configuration."
    );
}

#[test]
fn test_clear_history_cancels_and_drops_late_reply() {
    let store = common::memory_store();
    let mut chat = chat_with(store.clone());
    chat.select_agent("neo-prime").unwrap();

    let ticket = chat.begin_send("are you there").unwrap();
    let cancel = ticket.cancel.clone();
    chat.clear_history("neo-prime");

    assert!(cancel.is_cancelled());
    assert!(!chat.is_awaiting_reply("neo-prime"));
    assert!(!chat.finish_reply(ticket, Ok("Late answer.".to_string())));
    assert!(chat.messages("neo-prime").is_empty());
    assert!(store.get_raw(&chat_history_key("neo-prime")).unwrap().is_none());

    // The agent accepts new messages right away.
    assert!(chat.begin_send("again").is_ok());
}

#[test]
fn test_failed_writes_are_retried() {
    let flaky = Arc::new(FlakyStore::default());
    let mut chat = ChatStore::new(common::registry(), flaky.clone());
    chat.select_agent("neo-prime").unwrap();

    flaky.set_failing(true);
    let ticket = chat.begin_send("hello").unwrap();
    assert!(chat.finish_reply(ticket, Ok("Hi".to_string())));

    // Memory still shows the exchange.
    assert_eq!(chat.messages("neo-prime").len(), 3);
    assert_eq!(chat.pending_writes(), vec!["neo-prime".to_string()]);
    assert_eq!(chat.flush_pending_writes(), 1);

    flaky.set_failing(false);
    assert_eq!(chat.flush_pending_writes(), 0);
    assert!(chat.pending_writes().is_empty());

    let stored: Vec<Message> = flaky
        .load(&chat_history_key("neo-prime"))
        .unwrap()
        .unwrap();
    assert_eq!(stored.len(), 2);
    assert_eq!(stored[1].content, "Hi.");
}

#[tokio::test]
async fn test_history_hydrates_from_store() {
    let store: Arc<dyn KeyValueStore> = Arc::new(MemoryStore::new());
    {
        let mut chat = chat_with(store.clone());
        chat.select_agent("time-keeper").unwrap();
        chat.send("What year is it?", &ScriptedCompletion::replying("All of them"))
            .await
            .unwrap();
    }

    let mut chat = chat_with(store);
    chat.select_agent("time-keeper").unwrap();
    let messages = chat.messages("time-keeper");
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "What year is it?");
    assert_eq!(messages[1].content, "All of them.");
    assert!(messages.iter().all(|m| !m.pending));
}

#[tokio::test]
async fn test_pending_flag_is_not_serialized() {
    let store = common::memory_store();
    let mut chat = chat_with(store.clone());
    chat.select_agent("neo-prime").unwrap();
    let _ticket = chat.begin_send("in flight").unwrap();

    assert!(chat.messages("neo-prime")[1].pending);
    let raw = store
        .get_raw(&chat_history_key("neo-prime"))
        .unwrap()
        .unwrap();
    assert!(!raw.contains("pending"));
    assert!(raw.contains("\"kind\": \"user\""));
}

#[tokio::test]
async fn test_add_message_appends_non_user_messages() {
    let store = common::memory_store();
    let mut chat = chat_with(store.clone());
    let completion = ScriptedCompletion::default();

    chat.add_message(Message::agent("reptilian-prime", "Greetings, mammal."), &completion)
        .await
        .unwrap();
    assert_eq!(chat.messages("reptilian-prime").len(), 1);
    assert!(completion.requests().is_empty());

    assert!(matches!(
        chat.add_message(Message::system("ghost", "boo"), &completion)
            .await,
        Err(ChatError::UnknownAgent(_))
    ));
}

#[test]
fn test_normalize_reply() {
    assert_eq!(normalize_reply("  Hello there  "), "Hello there.");
    assert_eq!(normalize_reply("Trailing off..."), "Trailing off.");
    assert_eq!(normalize_reply("Trailing off…"), "Trailing off.");
    assert_eq!(normalize_reply("Really?"), "Really?");
    assert_eq!(normalize_reply("Wow!"), "Wow!");
    assert_eq!(normalize_reply("   "), "");
}
