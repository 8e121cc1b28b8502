use async_trait::async_trait;
use sdk::types::ToolKind;
use std::sync::Arc;
use tracing::warn;

use super::prompt::{coding_user, render_history, CODING_SYSTEM};
use super::Specialist;
use crate::graph::Stage;
use crate::state::{AgentState, Route};
use crate::tools::{extract_code_block, CodeAnalyzer};

/// Answers code questions and appends an analysis of the first code block
pub struct CodingStage {
    specialist: Specialist,
    temperature: f32,
    analyzer: Option<Arc<dyn CodeAnalyzer>>,
}

impl CodingStage {
    pub fn new(
        specialist: Specialist,
        temperature: f32,
        analyzer: Option<Arc<dyn CodeAnalyzer>>,
    ) -> Self {
        Self {
            specialist,
            temperature,
            analyzer,
        }
    }
}

#[async_trait]
impl Stage<AgentState> for CodingStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let history = render_history(&state.session_history, self.specialist.prompt_window(), "");
        let mut answer = self
            .specialist
            .generate(
                Route::Coding.as_str(),
                CODING_SYSTEM,
                coding_user(state.query.trim(), &history),
                self.temperature,
            )
            .await?;

        let code = extract_code_block(&answer);
        if let (Some(analyzer), Some(code)) = (&self.analyzer, code) {
            match analyzer.analyze(&code) {
                Ok(summary) => {
                    state.record_tool(ToolKind::AnalyzeCode);
                    answer = format!("{}\n\n---\n{}", answer.trim_end(), summary);
                }
                Err(e) => {
                    warn!("Code analysis failed: {}", e);
                    answer = format!(
                        "{}\n\n[Analysis] Failed to analyze code: {}",
                        answer.trim_end(),
                        e
                    );
                }
            }
        }

        state.candidate_answer = Some(answer);
        state.activate(Route::Coding.as_str());
        Ok(state)
    }
}
