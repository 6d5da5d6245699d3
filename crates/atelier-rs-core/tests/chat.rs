//! Chat flow integration tests.

use atelier_rs_config::{AtelierConfig, ConversationsConfig};
use atelier_rs_core::{APOLOGY_PREFIX, CoreError, Studio};
use atelier_rs_generation::GenerationError;
use atelier_rs_store::{ChatRole, MemoryAdapter, StoreError};
use atelier_rs_test_utils::{FailingChat, FixedChat, RecordingChat};
use pretty_assertions::assert_eq;
use std::sync::Arc;

fn studio(config: AtelierConfig) -> Studio<MemoryAdapter> {
    Studio::open(config, &|_: &str| Ok::<_, StoreError>(MemoryAdapter::new())).expect("studio")
}

#[tokio::test]
async fn send_message_appends_prompt_and_reply() {
    let chat = RecordingChat::new(["Hello! How can I help?"]);
    let studio = studio(AtelierConfig::default()).with_chat_client(Arc::new(chat.clone()));

    let turn = studio
        .send_message("  Plan a trip to Kyoto in the spring season  ")
        .await
        .expect("turn");

    assert_eq!(turn.reply.content, "Hello! How can I help?");
    assert_eq!(turn.reply.role, ChatRole::Assistant);
    let user = turn.user.expect("user message");
    assert_eq!(user.content, "Plan a trip to Kyoto in the spring season");
    assert_eq!(
        chat.seen(),
        vec![(
            "gpt-5.1-chat".to_string(),
            "Plan a trip to Kyoto in the spring season".to_string()
        )]
    );

    let book = studio.conversations();
    let active = book.active().expect("active").payload();
    assert_eq!(active.title, "Plan a trip to Kyoto in the sp...");
    assert_eq!(active.message_count(), 2);
}

#[tokio::test]
async fn empty_message_is_rejected_before_the_call() {
    let chat = RecordingChat::new(["unused"]);
    let studio = studio(AtelierConfig::default()).with_chat_client(Arc::new(chat.clone()));

    let err = studio.send_message("   ").await.unwrap_err();
    assert!(matches!(err, CoreError::Store(StoreError::InvalidInput(_))));
    assert!(chat.seen().is_empty());
    assert_eq!(
        studio
            .conversations()
            .active()
            .expect("active")
            .payload()
            .message_count(),
        0
    );
}

#[tokio::test]
async fn failed_call_appends_an_apology() {
    let studio = studio(AtelierConfig::default()).with_chat_client(Arc::new(FailingChat::new(
        GenerationError::Network("connection reset".to_string()),
    )));

    let err = studio.send_message("hi").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::Network(_))
    ));

    let book = studio.conversations();
    let messages = &book.active().expect("active").payload().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(
        messages[1].content,
        format!("{APOLOGY_PREFIX}Network error, please check your connection")
    );
}

#[tokio::test]
async fn blank_reply_takes_the_apology_path() {
    let studio = studio(AtelierConfig::default()).with_chat_client(Arc::new(FixedChat::new("")));

    let err = studio.send_message("hi").await.unwrap_err();
    assert!(matches!(
        err,
        CoreError::Generation(GenerationError::Provider(_))
    ));

    let book = studio.conversations();
    let messages = &book.active().expect("active").payload().messages;
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].content, "hi");
    assert_eq!(messages[1].role, ChatRole::Assistant);
    assert_eq!(
        messages[1].content,
        format!("{APOLOGY_PREFIX}provider error: chat model returned an empty reply")
    );
}

#[tokio::test]
async fn regenerate_replaces_the_reply() {
    let chat = RecordingChat::new(["first answer", "second answer"]);
    let studio = studio(AtelierConfig::default()).with_chat_client(Arc::new(chat.clone()));

    let turn = studio.send_message("draw me a fox").await.expect("turn");
    let regenerated = studio.regenerate(&turn.reply.id).await.expect("regenerate");

    assert_eq!(regenerated.user, None);
    assert_eq!(regenerated.reply.content, "second answer");
    let seen: Vec<String> = chat.seen().into_iter().map(|(_, message)| message).collect();
    assert_eq!(seen, vec!["draw me a fox", "draw me a fox"]);

    let book = studio.conversations();
    let contents: Vec<&str> = book
        .active()
        .expect("active")
        .payload()
        .messages
        .iter()
        .map(|message| message.content.as_str())
        .collect();
    assert_eq!(contents, vec!["draw me a fox", "second answer"]);
}

#[tokio::test]
async fn conversation_model_is_used_for_the_call() {
    let config = AtelierConfig::builder()
        .conversations(ConversationsConfig {
            default_model: "claude-sonnet".to_string(),
            ..ConversationsConfig::default()
        })
        .build();
    let chat = RecordingChat::new(["a", "b"]);
    let studio = studio(config).with_chat_client(Arc::new(chat.clone()));

    studio.send_message("one").await.expect("turn");
    studio
        .conversations()
        .set_model("gpt-4o")
        .expect("set model");
    studio.send_message("two").await.expect("turn");

    let models: Vec<String> = chat.seen().into_iter().map(|(model, _)| model).collect();
    assert_eq!(models, vec!["claude-sonnet", "gpt-4o"]);
}

#[tokio::test]
async fn missing_chat_client_is_an_error() {
    let studio = studio(AtelierConfig::default());
    let err = studio.send_message("hi").await.unwrap_err();
    assert!(matches!(err, CoreError::NoChatClient));

    let studio = studio.with_chat_client(Arc::new(FixedChat::new("ok")));
    let turn = studio.send_message("hi").await.expect("turn");
    assert_eq!(turn.reply.content, "ok");
}
