// ../tests/conspiracy.rs
mod common;

use common::ScriptedCompletion;
use projectx_ratatui::conspiracy::{
    ConspiracyConversation, ConspiracyMessageKind, ConspiracyStore, GENERATION_FAILED,
    build_conspiracy, generate_with_key, welcome_messages,
};
use projectx_ratatui::error::{CompletionError, ConspiracyError, VaultError};
use projectx_ratatui::rate_limiter::RateLimiter;
use projectx_ratatui::storage::{KeyValueStoreExt, PAST_CONSPIRACIES_KEY};
use projectx_ratatui::vault::{AccessGate, DataVault, DatasetSource, generate_api_key};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

fn vault() -> DataVault {
    DataVault::new(
        DatasetSource::Embedded,
        AccessGate::new(common::memory_store(), "open-sesame"),
    )
}

const THEORY: &str = "  THE GLACIERS ARE SERVERS COOLING THE SIMULATION AND THEY DO NOT WANT YOU TO KNOW\n\
                      Evidence: melt rates line up with data center launches.  ";

#[test]
fn test_starts_with_welcome_messages() {
    let store = ConspiracyStore::new(common::memory_store());
    let messages = store.messages();
    assert_eq!(messages.len(), 2);
    assert!(messages.iter().all(|m| m.kind == ConspiracyMessageKind::System));
    assert!(messages[0].content.starts_with("QUANTUM NEURAL INTERFACE ACTIVATED"));
    assert!(messages[1].content.starts_with("SECURITY WARNING"));
    assert!(store.past_conversations().is_empty());
    assert!(!store.is_generating());
    assert_eq!(welcome_messages().len(), 2);
}

#[tokio::test]
async fn test_generate_appends_reply_and_archives() {
    let backing = common::memory_store();
    let mut store = ConspiracyStore::new(backing.clone());
    let completion = ScriptedCompletion::replying(THEORY);

    store
        .generate("  melting glaciers  ", &vault(), &completion)
        .await
        .unwrap();

    let messages = store.messages();
    assert_eq!(messages.len(), 4);
    assert_eq!(messages[2].kind, ConspiracyMessageKind::User);
    assert_eq!(messages[2].content, "melting glaciers");
    assert_eq!(messages[3].kind, ConspiracyMessageKind::System);
    assert!(messages[3].content.starts_with("THE GLACIERS ARE SERVERS"));
    assert!(!store.is_generating());

    let past = store.past_conversations();
    assert_eq!(past.len(), 1);
    assert_eq!(
        past[0].title,
        "THE GLACIERS ARE SERVERS COOLING THE SIMULATION AN..."
    );

    let saved: Vec<ConspiracyConversation> = backing.load(PAST_CONSPIRACIES_KEY).unwrap().unwrap();
    assert_eq!(saved, past.to_vec());

    let request = &completion.requests()[0];
    assert_eq!(request.user_message, "melting glaciers");
    assert_eq!(request.temperature, 0.9);
    assert_eq!(request.max_tokens, 500);
    assert!(request.system_prompt.contains("DATA CONTEXT:"));
    assert!(request.system_prompt.contains("Glacier melt rate in the Alps"));
}

#[tokio::test]
async fn test_follow_up_replaces_the_archived_entry() {
    let mut store = ConspiracyStore::new(common::memory_store());
    let completion = ScriptedCompletion::new([
        Ok("FIRST HEADLINE".to_string()),
        Ok("SECOND HEADLINE".to_string()),
    ]);
    let vault = vault();

    store.generate("first", &vault, &completion).await.unwrap();
    store.generate("second", &vault, &completion).await.unwrap();

    let past = store.past_conversations();
    assert_eq!(past.len(), 1);
    assert_eq!(past[0].title, "FIRST HEADLINE...");
    assert_eq!(past[0].messages.len(), 6);
}

#[test]
fn test_generation_guards() {
    let mut store = ConspiracyStore::new(common::memory_store());
    assert!(matches!(
        store.begin_generate("   "),
        Err(ConspiracyError::EmptyPrompt)
    ));

    let _ticket = store.begin_generate("chemtrails").unwrap();
    assert!(store.is_generating());
    assert!(matches!(
        store.begin_generate("again"),
        Err(ConspiracyError::AlreadyGenerating)
    ));
}

#[test]
fn test_failure_still_archives_with_error_message() {
    let mut store = ConspiracyStore::new(common::memory_store());
    let ticket = store.begin_generate("moon base").unwrap();
    assert!(store.finish_generate(
        ticket,
        Err(CompletionError::Upstream("down".to_string()).into())
    ));

    assert_eq!(store.messages().last().unwrap().content, GENERATION_FAILED);
    assert!(!store.is_generating());
    assert_eq!(store.past_conversations().len(), 1);
    assert!(store.past_conversations()[0].title.starts_with("ERROR: Neural interface"));
}

#[test]
fn test_blank_reply_counts_as_failure() {
    let mut store = ConspiracyStore::new(common::memory_store());
    let ticket = store.begin_generate("birds").unwrap();
    store.finish_generate(ticket, Ok("   ".to_string()));
    assert_eq!(store.messages().last().unwrap().content, GENERATION_FAILED);
}

#[test]
fn test_clear_current_drops_late_results() {
    let mut store = ConspiracyStore::new(common::memory_store());
    let ticket = store.begin_generate("lizard people").unwrap();
    store.clear_current();

    assert!(!store.is_generating());
    assert!(!store.finish_generate(ticket, Ok("TOO LATE".to_string())));
    assert_eq!(store.messages().len(), 2);
    assert!(store.past_conversations().is_empty());
}

#[test]
fn test_welcome_only_transcript_is_not_archived() {
    let mut store = ConspiracyStore::new(common::memory_store());
    assert!(!store.save_past_conversation());
    assert!(store.past_conversations().is_empty());
}

#[tokio::test]
async fn test_load_and_delete_conversations() {
    let backing = common::memory_store();
    let mut store = ConspiracyStore::new(backing.clone());
    let completion = ScriptedCompletion::new([
        Ok("ALPHA THEORY".to_string()),
        Ok("BETA THEORY".to_string()),
    ]);
    let vault = vault();

    store.generate("alpha", &vault, &completion).await.unwrap();
    store.clear_current();
    store.generate("beta", &vault, &completion).await.unwrap();

    let titles: Vec<&str> = store
        .past_conversations()
        .iter()
        .map(|c| c.title.as_str())
        .collect();
    assert_eq!(titles, vec!["BETA THEORY...", "ALPHA THEORY..."]);

    let alpha_id = store.past_conversations()[1].id;
    assert!(store.load_conversation(alpha_id));
    assert_eq!(store.messages()[2].content, "alpha");
    assert!(!store.load_conversation(uuid::Uuid::new_v4()));

    assert!(store.delete_conversation(alpha_id));
    assert!(!store.delete_conversation(alpha_id));
    assert_eq!(store.past_conversations().len(), 1);

    // A fresh store sees the persisted archive.
    let reopened = ConspiracyStore::new(backing);
    assert_eq!(reopened.past_conversations().len(), 1);
    assert_eq!(reopened.past_conversations()[0].title, "BETA THEORY...");
}

#[tokio::test]
async fn test_keyed_generation_checks_the_key() {
    let vault = vault();
    let completion = ScriptedCompletion::replying("KEYED THEORY");

    let err = generate_with_key(
        "ufo",
        "px_bogus",
        &vault,
        &completion,
        CancellationToken::new(),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ConspiracyError::Vault(VaultError::InvalidApiKey)));
    assert!(completion.requests().is_empty());

    let text = generate_with_key(
        "ufo",
        &generate_api_key(),
        &vault,
        &completion,
        CancellationToken::new(),
    )
    .await
    .unwrap();
    assert_eq!(text, "KEYED THEORY");
}

#[tokio::test]
async fn test_keyed_generation_is_rate_limited() {
    let vault = vault().with_rate_limiter(RateLimiter::new(1, Duration::from_secs(60)));
    let completion = ScriptedCompletion::default();
    let key = generate_api_key();

    build_conspiracy("one", Some(&key), &vault, &completion, CancellationToken::new())
        .await
        .unwrap();
    let err = build_conspiracy("two", Some(&key), &vault, &completion, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ConspiracyError::Vault(VaultError::RateLimited { .. })
    ));
}

#[tokio::test]
async fn test_build_rejects_empty_prompt() {
    let completion = ScriptedCompletion::default();
    let err = build_conspiracy("  ", None, &vault(), &completion, CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ConspiracyError::EmptyPrompt));
}
