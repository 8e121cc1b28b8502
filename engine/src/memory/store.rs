//! Memory store backends

use async_trait::async_trait;
use sdk::errors::EngineError;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{MemoryRecord, MemoryStore};

/// Pretty-printed UTF-8 JSON file
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read the record without creating the file when it is absent
    pub async fn peek(&self) -> Option<MemoryRecord> {
        if !tokio::fs::try_exists(&self.path).await.unwrap_or(false) {
            return None;
        }
        Some(self.load().await)
    }

    /// Sibling file the next record is written to before it replaces the target
    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "memory.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl MemoryStore for JsonFileStore {
    async fn load(&self) -> MemoryRecord {
        let text = match tokio::fs::read_to_string(&self.path).await {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "Memory file absent, creating default record");
                let record = MemoryRecord::default();
                if let Err(e) = self.save(&record).await {
                    warn!(path = %self.path.display(), "Could not create memory file: {}", e);
                }
                return record;
            }
            Err(e) => {
                warn!(path = %self.path.display(), "Memory file unreadable, using empty record: {}", e);
                return MemoryRecord::default();
            }
        };

        let value = match serde_json::from_str(&text) {
            Ok(value) => value,
            Err(e) => {
                warn!(path = %self.path.display(), "Memory file corrupt, using empty record: {}", e);
                return MemoryRecord::default();
            }
        };
        MemoryRecord::from_value(value).unwrap_or_else(|| {
            warn!(path = %self.path.display(), "Memory file is not a JSON object, using empty record");
            MemoryRecord::default()
        })
    }

    async fn save(&self, record: &MemoryRecord) -> Result<(), EngineError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await.map_err(|e| {
                EngineError::Storage(format!("Failed to create {}: {}", parent.display(), e))
            })?;
        }

        let json = serde_json::to_string_pretty(record)?;
        let temp = self.temp_path();
        if let Err(e) = tokio::fs::write(&temp, json).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(EngineError::Storage(format!(
                "Failed to write {}: {}",
                temp.display(),
                e
            )));
        }
        if let Err(e) = tokio::fs::rename(&temp, &self.path).await {
            let _ = tokio::fs::remove_file(&temp).await;
            return Err(EngineError::Storage(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            )));
        }

        debug!(path = %self.path.display(), turns = record.history.len(), "Memory saved");
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Process-local store
#[derive(Debug, Default)]
pub struct InMemoryStore {
    record: Mutex<MemoryRecord>,
}

impl InMemoryStore {
    pub fn new(record: MemoryRecord) -> Self {
        Self {
            record: Mutex::new(record),
        }
    }

    /// Copy of the current record
    pub async fn snapshot(&self) -> MemoryRecord {
        self.record.lock().await.clone()
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn load(&self) -> MemoryRecord {
        self.snapshot().await
    }

    async fn save(&self, record: &MemoryRecord) -> Result<(), EngineError> {
        *self.record.lock().await = record.clone();
        Ok(())
    }

    fn describe(&self) -> String {
        "in-memory".to_string()
    }
}
