//! Persistent Memory
//!
//! Durable cross-run record of the user profile, bounded conversation history
//! and free-text notes, plus the two workflow stages that move it in and out
//! of the execution context.
//!
//! The record is read at the start of every run and rewritten in full at the
//! end. There is no locking: two runs sharing one store race, and the last
//! writer's rewrite wins. Callers that need concurrent runs must serialize
//! access themselves.

pub mod adapter;
pub mod store;

pub use adapter::{MemoryLoadStage, MemoryUpdateStage};
pub use store::{InMemoryStore, JsonFileStore};

use async_trait::async_trait;
use sdk::errors::EngineError;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::state::{keep_last, Profile, Turn};

/// Persisted memory document
///
/// Layout: `{"profile": {...}, "history": [{"role", "content"}, ...], "notes": [...]}`.
/// Keys this engine does not know about are carried through untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct MemoryRecord {
    pub profile: Profile,
    pub history: Vec<Turn>,
    pub notes: Vec<String>,

    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MemoryRecord {
    /// Build a record from a parsed memory document, salvaging what it can.
    ///
    /// Malformed history turns and non-string notes are dropped one by one
    /// instead of discarding the whole document. `profile` wins over the
    /// legacy `user_profile` key; the unused one stays in `extra`. Returns
    /// `None` when the document is not a JSON object.
    pub fn from_value(value: Value) -> Option<Self> {
        let Value::Object(mut object) = value else {
            return None;
        };

        let key = if matches!(object.get("profile"), Some(Value::Object(_))) {
            "profile"
        } else {
            "user_profile"
        };
        let profile = match object.remove(key) {
            Some(Value::Object(map)) => map.into_iter().collect(),
            Some(other) => {
                warn!(key, kind = json_kind(&other), "Ignoring non-object profile");
                Profile::new()
            }
            None => Profile::new(),
        };
        if key == "user_profile" {
            if let Some(other) = object.remove("profile") {
                warn!(kind = json_kind(&other), "Ignoring non-object profile");
            }
        }

        let mut history = Vec::new();
        let mut skipped = 0;
        for item in array_field(&mut object, "history") {
            match serde_json::from_value::<Turn>(item) {
                Ok(turn) => history.push(turn),
                Err(_) => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Dropped malformed history turns");
        }

        let mut notes = Vec::new();
        let mut skipped = 0;
        for item in array_field(&mut object, "notes") {
            match item {
                Value::String(note) => notes.push(note),
                _ => skipped += 1,
            }
        }
        if skipped > 0 {
            warn!(skipped, "Dropped non-string notes");
        }

        Some(Self {
            profile,
            history,
            notes,
            extra: object,
        })
    }

    /// The most recent `n` turns, oldest first
    pub fn recent(&self, n: usize) -> Vec<Turn> {
        let start = self.history.len().saturating_sub(n);
        self.history[start..].to_vec()
    }

    /// Append one exchange and cap history at `limit` turns
    pub fn append_exchange(&mut self, query: &str, answer: &str, limit: usize) {
        self.history.extend(Turn::exchange(query, answer));
        keep_last(&mut self.history, limit);
    }
}

fn array_field(object: &mut Map<String, Value>, key: &str) -> Vec<Value> {
    match object.remove(key) {
        Some(Value::Array(items)) => items,
        Some(Value::Null) | None => Vec::new(),
        Some(other) => {
            warn!(key, kind = json_kind(&other), "Ignoring non-array field");
            Vec::new()
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Durable home of the [`MemoryRecord`]
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Read the record.
    ///
    /// Never fails: an absent, unreadable or corrupt store yields the default
    /// record.
    async fn load(&self) -> MemoryRecord;

    /// Replace the stored record
    async fn save(&self, record: &MemoryRecord) -> Result<(), EngineError>;

    /// Human-readable location, for diagnostics
    fn describe(&self) -> String;
}
