use async_trait::async_trait;

use super::prompt::{general_user, render_history, GENERAL_SYSTEM};
use super::Specialist;
use crate::graph::Stage;
use crate::state::{AgentState, Route};

/// Fallback specialist for requests outside the other three routes
pub struct GeneralStage {
    specialist: Specialist,
    temperature: f32,
}

impl GeneralStage {
    pub fn new(specialist: Specialist, temperature: f32) -> Self {
        Self {
            specialist,
            temperature,
        }
    }
}

#[async_trait]
impl Stage<AgentState> for GeneralStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let history = render_history(&state.session_history, self.specialist.prompt_window(), "");
        let answer = self
            .specialist
            .generate(
                Route::General.as_str(),
                GENERAL_SYSTEM,
                general_user(state.query.trim(), &history),
                self.temperature,
            )
            .await?;

        state.candidate_answer = Some(answer);
        state.activate(Route::General.as_str());
        Ok(state)
    }
}
