//! Integration tests for the JSON memory file
//!
//! Covers first-run creation, corrupt files, foreign keys and the legacy
//! `user_profile` key.

use async_trait::async_trait;
use mentor_engine::agents::prompt::ROUTER_SYSTEM;
use mentor_engine::llm::{self, ChatRequest, LLMProvider};
use mentor_engine::memory::{JsonFileStore, MemoryRecord, MemoryStore};
use mentor_engine::pipeline::{Assistant, Collaborators, WorkflowSettings};
use mentor_engine::state::Turn;
use mentor_engine::tools::Toolbox;
use std::sync::Arc;
use tempfile::TempDir;

/// Routes everything to general and greets back
struct Greeter;

#[async_trait]
impl LLMProvider for Greeter {
    fn name(&self) -> &str {
        "greeter"
    }

    fn is_local(&self) -> bool {
        true
    }

    async fn generate(&self, request: &ChatRequest) -> llm::Result<String> {
        if request.messages[0].content == ROUTER_SYSTEM {
            return Ok("general".to_string());
        }
        Ok("Hi!".to_string())
    }
}

#[tokio::test]
async fn test_missing_file_is_created_with_defaults() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    let store = JsonFileStore::new(&path);

    let record = store.load().await;

    assert_eq!(record, MemoryRecord::default());
    assert!(path.exists());
    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(
        saved,
        serde_json::json!({"profile": {}, "history": [], "notes": []})
    );
}

#[tokio::test]
async fn test_corrupt_file_yields_default_and_is_left_alone() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(&path, "{ not json").unwrap();
    let store = JsonFileStore::new(&path);

    assert_eq!(store.load().await, MemoryRecord::default());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
}

#[tokio::test]
async fn test_load_does_not_rewrite_existing_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    let original = r#"{"profile":{"major":"CS"},"history":[],"notes":["x"]}"#;
    std::fs::write(&path, original).unwrap();
    let store = JsonFileStore::new(&path);

    let record = store.load().await;

    assert_eq!(record.profile["major"], "CS");
    assert_eq!(record.notes, vec!["x"]);
    assert_eq!(std::fs::read_to_string(&path).unwrap(), original);
}

#[tokio::test]
async fn test_legacy_profile_key_and_unknown_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(
        &path,
        r#"{"user_profile":{"courses":["RL","DL"]},"history":[{"role":"user","content":"hi"}],"notes":[],"theme":"dark"}"#,
    )
    .unwrap();
    let store = JsonFileStore::new(&path);

    let mut record = store.load().await;
    assert_eq!(record.profile["courses"][1], "DL");
    assert_eq!(record.history, vec![Turn::user("hi")]);

    record.append_exchange("again", "hello", 50);
    store.save(&record).await.unwrap();

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["theme"], "dark");
    assert_eq!(saved["profile"]["courses"][0], "RL");
    assert_eq!(saved["history"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_partial_file_fills_missing_keys() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(&path, r#"{"notes":["only notes"]}"#).unwrap();

    let record = JsonFileStore::new(&path).load().await;

    assert!(record.profile.is_empty());
    assert!(record.history.is_empty());
    assert_eq!(record.notes, vec!["only notes"]);
}

#[tokio::test]
async fn test_saved_file_is_pretty_printed() {
    let dir = TempDir::new().unwrap();
    let store = JsonFileStore::new(dir.path().join("memory.json"));

    let mut record = MemoryRecord::default();
    record.append_exchange("Hello", "Hi there", 50);
    store.save(&record).await.unwrap();

    let text = std::fs::read_to_string(store.path()).unwrap();
    assert!(text.contains('\n'));
    assert!(text.contains("  \"history\""));
    assert_eq!(store.load().await, record);
}

#[tokio::test]
async fn test_foreign_turn_roles_do_not_wipe_profile_or_notes() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(
        &path,
        r#"{
  "profile": {"major": "CS"},
  "history": [
    {"role": "system", "content": "You are helpful"},
    {"role": "user", "content": "earlier"},
    {"role": "assistant", "content": "reply"}
  ],
  "notes": ["BFS uses a queue", {"text": "not a string"}, "DFS uses a stack"]
}"#,
    )
    .unwrap();
    let store = Arc::new(JsonFileStore::new(&path));

    let record = store.load().await;
    assert_eq!(record.profile["major"], "CS");
    assert_eq!(record.notes, vec!["BFS uses a queue", "DFS uses a stack"]);
    assert_eq!(record.history, vec![Turn::user("earlier"), Turn::assistant("reply")]);

    let collaborators = Collaborators {
        llm: Arc::new(Greeter),
        store: store.clone(),
        toolbox: Toolbox::empty(),
    };
    let assistant = Assistant::new(collaborators, &WorkflowSettings::default()).unwrap();
    let state = assistant.ask("Hello").await.unwrap();
    assert_eq!(state.final_answer.as_deref(), Some("Hi!"));

    let saved: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["profile"]["major"], "CS");
    assert_eq!(
        saved["notes"],
        serde_json::json!(["BFS uses a queue", "DFS uses a stack"])
    );
    let history = saved["history"].as_array().unwrap();
    assert_eq!(history.len(), 4);
    assert_eq!(history[3]["content"], "Hi!");
}

#[tokio::test]
async fn test_both_profile_keys_still_load() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(
        &path,
        r#"{"profile":{"major":"CS"},"user_profile":{"major":"Math"},"notes":["kept"]}"#,
    )
    .unwrap();

    let record = JsonFileStore::new(&path).load().await;

    assert_eq!(record.profile["major"], "CS");
    assert_eq!(record.notes, vec!["kept"]);
}

#[tokio::test]
async fn test_non_object_document_yields_default() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("memory.json");
    std::fs::write(&path, "[1, 2, 3]").unwrap();

    assert_eq!(JsonFileStore::new(&path).load().await, MemoryRecord::default());
    assert_eq!(std::fs::read_to_string(&path).unwrap(), "[1, 2, 3]");
}
