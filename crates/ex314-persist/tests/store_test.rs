use std::time::Duration;

use ex314_persist::{
    open_store, ChatMessage, FileStore, MemoryStore, MessageRole, PersistError, PersistenceClient,
    StorageEnvironment, ThreadQuery, ThreadSort, ThreadStatus, ThreadUpdate, UserSettings,
    DEFAULT_THREAD_TITLE,
};

async fn exercise_thread_lifecycle(store: &dyn PersistenceClient) {
    let thread = store.create_thread("demo", None).await.unwrap();
    assert_eq!(thread.title, DEFAULT_THREAD_TITLE);
    assert_eq!(thread.status, ThreadStatus::Active);

    let renamed = store
        .update_thread(
            &thread.id,
            ThreadUpdate {
                title: Some("Rust questions".to_string()),
                status: Some(ThreadStatus::Starred),
            },
        )
        .await
        .unwrap();
    assert_eq!(renamed.title, "Rust questions");
    assert_eq!(renamed.status, ThreadStatus::Starred);

    let fetched = store.get_thread(&thread.id).await.unwrap().unwrap();
    assert_eq!(fetched, renamed);

    store.delete_thread(&thread.id).await.unwrap();
    assert!(store.get_thread(&thread.id).await.unwrap().is_none());
    assert!(matches!(
        store.get_messages(&thread.id).await,
        Err(PersistError::ThreadNotFound(_))
    ));
    assert!(matches!(
        store.delete_thread(&thread.id).await,
        Err(PersistError::ThreadNotFound(_))
    ));
}

async fn exercise_messages(store: &dyn PersistenceClient) {
    let thread = store.create_thread("demo", Some("Chat".to_string())).await.unwrap();
    let question = ChatMessage::user("What is a borrow checker?");
    let answer = ChatMessage::assistant("It enforces ownership rules at compile time.");

    store.save_message(&thread.id, question.clone()).await.unwrap();
    store.save_message(&thread.id, answer.clone()).await.unwrap();

    let err = store.save_message(&thread.id, question.clone()).await.unwrap_err();
    assert!(matches!(err, PersistError::DuplicateMessage { ref message_id, .. } if *message_id == question.id));

    let messages = store.get_messages(&thread.id).await.unwrap();
    assert_eq!(messages, vec![question.clone(), answer.clone()]);

    let dup = vec![answer.clone(), answer.clone()];
    assert!(store.replace_messages(&thread.id, dup).await.is_err());
    assert_eq!(store.get_messages(&thread.id).await.unwrap().len(), 2);

    store.replace_messages(&thread.id, vec![answer.clone()]).await.unwrap();
    assert_eq!(store.get_messages(&thread.id).await.unwrap(), vec![answer]);

    let missing = store.save_message("no-such-thread", ChatMessage::user("x")).await;
    assert!(matches!(missing, Err(PersistError::ThreadNotFound(_))));
}

#[tokio::test]
async fn test_memory_thread_lifecycle() {
    exercise_thread_lifecycle(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_file_thread_lifecycle() {
    let dir = tempfile::tempdir().unwrap();
    exercise_thread_lifecycle(&FileStore::open(dir.path()).await.unwrap()).await;
}

#[tokio::test]
async fn test_memory_messages() {
    exercise_messages(&MemoryStore::new()).await;
}

#[tokio::test]
async fn test_file_messages() {
    let dir = tempfile::tempdir().unwrap();
    exercise_messages(&FileStore::open(dir.path()).await.unwrap()).await;
}

#[tokio::test]
async fn test_file_store_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let (thread_id, message) = {
        let store = FileStore::open(dir.path()).await.unwrap();
        let thread = store.create_thread("demo", Some("Persistent".to_string())).await.unwrap();
        let message = ChatMessage::user("remember me");
        store.save_message(&thread.id, message.clone()).await.unwrap();
        store
            .save_settings(
                "demo",
                UserSettings {
                    name: "Demo".to_string(),
                    ai_tone: "casual".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        (thread.id, message)
    };

    let reopened = FileStore::open(dir.path()).await.unwrap();
    let thread = reopened.get_thread(&thread_id).await.unwrap().unwrap();
    assert_eq!(thread.title, "Persistent");
    assert_eq!(reopened.get_messages(&thread_id).await.unwrap(), vec![message]);

    let settings = reopened.get_settings("demo").await.unwrap();
    assert_eq!(settings.name, "Demo");
    assert_eq!(settings.ai_tone, "casual");
    assert_eq!(settings.theme, "dark");
}

#[tokio::test]
async fn test_file_store_delete_removes_document() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let thread = store.create_thread("demo", None).await.unwrap();
    let doc = dir.path().join("threads").join(format!("{}.json", thread.id));
    assert!(doc.exists());

    store.delete_thread(&thread.id).await.unwrap();
    assert!(!doc.exists());

    let reopened = FileStore::open(dir.path()).await.unwrap();
    assert!(reopened.get_thread(&thread.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_file_store_failed_write_keeps_previous_state() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let thread = store.create_thread("demo", Some("Original".to_string())).await.unwrap();
    store.save_message(&thread.id, ChatMessage::user("first")).await.unwrap();
    let before = store.get_thread(&thread.id).await.unwrap().unwrap();

    // nowhere left to write thread documents
    std::fs::remove_dir_all(dir.path().join("threads")).unwrap();

    assert!(store
        .save_message(&thread.id, ChatMessage::user("second"))
        .await
        .is_err());
    let messages = store.get_messages(&thread.id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert_eq!(messages[0].content, "first");

    assert!(store
        .replace_messages(&thread.id, Vec::new())
        .await
        .is_err());
    assert_eq!(store.get_messages(&thread.id).await.unwrap().len(), 1);

    assert!(store
        .update_thread(
            &thread.id,
            ThreadUpdate {
                title: Some("Renamed".to_string()),
                status: Some(ThreadStatus::Archived),
            },
        )
        .await
        .is_err());
    let unchanged = store.get_thread(&thread.id).await.unwrap().unwrap();
    assert_eq!(unchanged, before);
    assert_eq!(unchanged.title, "Original");
    assert_eq!(unchanged.status, ThreadStatus::Active);
}

#[tokio::test]
async fn test_file_store_failed_unlink_keeps_thread() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let thread = store.create_thread("demo", None).await.unwrap();
    store.save_message(&thread.id, ChatMessage::user("keep me")).await.unwrap();

    // a directory in place of the document cannot be unlinked as a file
    let doc = dir.path().join("threads").join(format!("{}.json", thread.id));
    std::fs::remove_file(&doc).unwrap();
    std::fs::create_dir(&doc).unwrap();
    std::fs::write(doc.join("blocker"), b"x").unwrap();

    assert!(store.delete_thread(&thread.id).await.is_err());
    assert!(store.get_thread(&thread.id).await.unwrap().is_some());
    assert_eq!(store.get_messages(&thread.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_file_store_rejects_unsafe_user_id() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).await.unwrap();
    let err = store
        .save_settings("../escape", UserSettings::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PersistError::InvalidId(_)));
}

#[tokio::test]
async fn test_list_threads_filters_and_sorts() {
    let store = MemoryStore::new();
    let first = store.create_thread("demo", Some("Alpha".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let second = store.create_thread("demo", Some("beta".to_string())).await.unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    let archived = store.create_thread("demo", Some("Gamma".to_string())).await.unwrap();
    store.create_thread("someone-else", Some("Alpha".to_string())).await.unwrap();

    store
        .update_thread(
            &archived.id,
            ThreadUpdate {
                status: Some(ThreadStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(5)).await;
    store.save_message(&first.id, ChatMessage::user("bump")).await.unwrap();

    let recent = store.list_threads("demo", &ThreadQuery::default()).await.unwrap();
    let ids: Vec<&str> = recent.iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![first.id.as_str(), archived.id.as_str(), second.id.as_str()]);

    let oldest = store
        .list_threads(
            "demo",
            &ThreadQuery {
                sort: ThreadSort::Oldest,
                limit: Some(2),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(oldest.len(), 2);
    assert_eq!(oldest[0].id, first.id);

    let only_archived = store
        .list_threads(
            "demo",
            &ThreadQuery {
                status: Some(ThreadStatus::Archived),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(only_archived.len(), 1);
    assert_eq!(only_archived[0].id, archived.id);

    let by_title = store
        .list_threads(
            "demo",
            &ThreadQuery {
                title_contains: Some("ALP".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_title.len(), 1);
}

#[tokio::test]
async fn test_search_messages() {
    let store = MemoryStore::new();
    let thread = store.create_thread("demo", Some("Cooking".to_string())).await.unwrap();
    let other = store.create_thread("intruder", None).await.unwrap();
    let long = format!("Pasta {}", "al dente ".repeat(30));

    store.save_message(&thread.id, ChatMessage::user(long.clone())).await.unwrap();
    store
        .save_message(&thread.id, ChatMessage::assistant("Boil the PASTA for 9 minutes."))
        .await
        .unwrap();
    store.save_message(&other.id, ChatMessage::user("pasta too")).await.unwrap();

    let hits = store.search_messages("demo", "pasta").await.unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits.iter().all(|h| h.thread_id == thread.id && h.thread_title == "Cooking"));
    assert_eq!(hits[0].role, MessageRole::Assistant);
    assert!(hits[1].snippet.ends_with("..."));
    assert_eq!(hits[1].snippet.chars().count(), 123);

    assert!(store.search_messages("demo", "p").await.unwrap().is_empty());
    assert!(store.search_messages("demo", "   ").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_settings_default_until_saved() {
    let store = MemoryStore::new();
    assert_eq!(store.get_settings("demo").await.unwrap(), UserSettings::default());

    let custom = UserSettings {
        font_size: "large".to_string(),
        ..Default::default()
    };
    store.save_settings("demo", custom.clone()).await.unwrap();
    assert_eq!(store.get_settings("demo").await.unwrap(), custom);
}

#[tokio::test]
async fn test_export_and_stats() {
    let store = MemoryStore::new();
    let a = store.create_thread("demo", None).await.unwrap();
    let b = store.create_thread("demo", None).await.unwrap();
    let c = store.create_thread("ada", None).await.unwrap();
    store.create_thread("ada", Some("empty".to_string())).await.unwrap();

    for i in 0..6 {
        store.save_message(&a.id, ChatMessage::user(format!("a{i}"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
    }
    store.save_message(&b.id, ChatMessage::user("b0")).await.unwrap();
    tokio::time::sleep(Duration::from_millis(1)).await;
    for i in 0..5 {
        store.save_message(&c.id, ChatMessage::assistant(format!("c{i}"))).await.unwrap();
        tokio::time::sleep(Duration::from_millis(1)).await;
    }

    let stats = store.stats().await.unwrap();
    assert_eq!(stats.total_messages, 12);
    assert_eq!(stats.distinct_users, 2);
    assert_eq!(stats.distinct_threads, 3);
    assert_eq!(stats.recent_messages.len(), 10);
    assert_eq!(stats.recent_messages[0].content, "c4");
    assert_eq!(stats.recent_messages[0].user_id, "ada");

    let export = store.export_all().await.unwrap();
    assert_eq!(export.threads.len(), 4);
    let json = serde_json::to_value(&export).unwrap();
    assert!(json["threads"][0]["messages"].is_array());
    assert!(json["threads"][0]["title"].is_string());
}

#[tokio::test]
async fn test_open_store_environments() {
    let ephemeral = open_store(&StorageEnvironment::Ephemeral).await.unwrap();
    ephemeral.create_thread("demo", None).await.unwrap();

    let dir = tempfile::tempdir().unwrap();
    let env = StorageEnvironment::Durable {
        path: dir.path().join("store"),
    };
    let durable = open_store(&env).await.unwrap();
    let thread = durable.create_thread("demo", None).await.unwrap();
    drop(durable);

    let reopened = open_store(&env).await.unwrap();
    assert!(reopened.get_thread(&thread.id).await.unwrap().is_some());
}
