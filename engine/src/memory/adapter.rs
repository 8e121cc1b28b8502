//! Memory adapter stages
//!
//! `memory_load` seeds the execution context from the store; `memory_update`
//! appends the finished exchange to the store and mirrors it into the
//! context's working history.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::MemoryStore;
use crate::config::MemoryConfig;
use crate::graph::Stage;
use crate::state::{keep_last, AgentState, Turn};

pub const MEMORY_LOAD: &str = "memory_load";
pub const MEMORY_UPDATE: &str = "memory_update";

/// Copies profile, notes and the last few persisted turns into the context
pub struct MemoryLoadStage {
    store: Arc<dyn MemoryStore>,
    load_window: usize,
}

impl MemoryLoadStage {
    pub fn new(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            load_window: config.load_window,
        }
    }
}

#[async_trait]
impl Stage<AgentState> for MemoryLoadStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let record = self.store.load().await;

        state.session_history = record.recent(self.load_window);
        state.profile = record.profile;
        state.notes = record.notes;

        debug!(
            history = state.session_history.len(),
            notes = state.notes.len(),
            profile_keys = state.profile.len(),
            "Memory loaded"
        );

        state.activate(MEMORY_LOAD);
        Ok(state)
    }
}

/// Persists the exchange and keeps the working history bounded
pub struct MemoryUpdateStage {
    store: Arc<dyn MemoryStore>,
    history_limit: usize,
    session_window: usize,
}

impl MemoryUpdateStage {
    pub fn new(store: Arc<dyn MemoryStore>, config: &MemoryConfig) -> Self {
        Self {
            store,
            history_limit: config.history_limit,
            session_window: config.session_window,
        }
    }
}

#[async_trait]
impl Stage<AgentState> for MemoryUpdateStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let answer = state
            .candidate_answer
            .as_deref()
            .or(state.final_answer.as_deref())
            .unwrap_or_default()
            .to_string();

        // Profile and notes are written back as stored, not as loaded into the context
        let mut record = self.store.load().await;
        record.append_exchange(&state.query, &answer, self.history_limit);
        self.store.save(&record).await?;

        state
            .session_history
            .extend(Turn::exchange(&state.query, &answer));
        keep_last(&mut state.session_history, self.session_window);

        debug!(
            persisted = record.history.len(),
            session = state.session_history.len(),
            "Memory updated"
        );

        state.activate(MEMORY_UPDATE);
        Ok(state)
    }
}
