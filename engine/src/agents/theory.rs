use async_trait::async_trait;
use sdk::types::ToolKind;
use std::sync::Arc;
use tracing::{debug, warn};

use super::prompt::{render_history, theory_user, THEORY_SYSTEM};
use super::Specialist;
use crate::graph::Stage;
use crate::state::{AgentState, Route};
use crate::tools::{search_notes, NoteWriter};

const DEFAULT_TITLE: &str = "Theory_Notes";

/// Explains concepts, grounding the answer in matching notes and saving it
/// as a markdown note
pub struct TheoryStage {
    specialist: Specialist,
    temperature: f32,
    max_note_results: usize,
    note_writer: Option<Arc<dyn NoteWriter>>,
}

impl TheoryStage {
    pub fn new(
        specialist: Specialist,
        temperature: f32,
        max_note_results: usize,
        note_writer: Option<Arc<dyn NoteWriter>>,
    ) -> Self {
        Self {
            specialist,
            temperature,
            max_note_results,
            note_writer,
        }
    }
}

#[async_trait]
impl Stage<AgentState> for TheoryStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let query = state.query.trim().to_string();

        let mut notes_text = String::new();
        if !state.notes.is_empty() {
            notes_text = search_notes(&query, &state.notes, self.max_note_results);
            if !notes_text.is_empty() {
                state.record_tool(ToolKind::SearchNotes);
            }
        }

        let history = render_history(&state.session_history, self.specialist.prompt_window(), "");
        let mut answer = self
            .specialist
            .generate(
                Route::Theory.as_str(),
                THEORY_SYSTEM,
                theory_user(&query, &notes_text, &history),
                self.temperature,
            )
            .await?;

        if let Some(writer) = &self.note_writer {
            let title = if query.is_empty() { DEFAULT_TITLE } else { query.as_str() };
            match writer.save(title, &answer).await {
                Ok(path) => {
                    state.record_tool(ToolKind::SaveMarkdownNote);
                    let path = path.display().to_string();
                    debug!(path = %path, "Theory answer saved");
                    answer = format!("{}\n\n_(Saved as markdown note: {})_", answer.trim_end(), path);
                    state.markdown_note_path = Some(path);
                }
                Err(e) => {
                    warn!("Markdown note not saved: {}", e);
                    answer = format!(
                        "{}\n\n[Warning] Failed to save markdown note: {}",
                        answer.trim_end(),
                        e
                    );
                }
            }
        }

        state.candidate_answer = Some(answer);
        state.activate(Route::Theory.as_str());
        Ok(state)
    }
}
