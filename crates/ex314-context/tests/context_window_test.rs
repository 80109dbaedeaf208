use ex314_context::{ContextStrategy, TrailingWindowStrategy, WindowMode};
use ex314_llm::Message;
use ex314_persist::{ChatMessage, MemoryStore, PersistenceClient};

#[tokio::test]
async fn test_thread_window_uses_last_ten_messages() {
    let store = MemoryStore::new();
    let thread = store.create_thread("demo", None).await.unwrap();
    for i in 0..14 {
        let message = if i % 2 == 0 {
            ChatMessage::user(format!("q{i}"))
        } else {
            ChatMessage::assistant(format!("a{i}"))
        };
        store.save_message(&thread.id, message).await.unwrap();
    }

    let strategy = TrailingWindowStrategy::new(10, 8_000).unwrap();
    let window = strategy
        .get_context_window(&thread.id, &store, "casual")
        .await
        .unwrap();

    assert!(window.system_prompt.contains("casual tone"));
    assert_eq!(window.messages.len(), 10);
    assert_eq!(window.messages[0], Message::human("q4"));
    assert_eq!(window.messages[9], Message::ai("a13"));

    let upstream = window.into_messages();
    assert_eq!(upstream.len(), 11);
    assert_eq!(upstream[0].role(), "system");
}

#[tokio::test]
async fn test_full_mode_sends_whole_thread() {
    let store = MemoryStore::new();
    let thread = store.create_thread("demo", None).await.unwrap();
    for i in 0..12 {
        store
            .save_message(&thread.id, ChatMessage::user(format!("m{i}")))
            .await
            .unwrap();
    }

    let strategy = TrailingWindowStrategy::new(10, 8_000)
        .unwrap()
        .with_mode(WindowMode::Full)
        .with_system_prompt_template("Be <tone>.");
    let window = strategy
        .get_context_window(&thread.id, &store, "")
        .await
        .unwrap();

    assert_eq!(window.system_prompt, "Be formal.");
    assert_eq!(window.messages.len(), 12);
}

#[tokio::test]
async fn test_missing_thread_is_an_error() {
    let store = MemoryStore::new();
    let strategy = TrailingWindowStrategy::new(10, 8_000).unwrap();
    assert!(strategy
        .get_context_window("missing", &store, "formal")
        .await
        .is_err());
}
