use async_trait::async_trait;

use super::prompt::{planning_user, render_history, render_profile, NO_HISTORY, PLANNING_SYSTEM};
use super::Specialist;
use crate::graph::Stage;
use crate::state::{AgentState, Route};

/// Turns goals into a step-by-step plan using the profile and recent history
pub struct PlanningStage {
    specialist: Specialist,
    temperature: f32,
}

impl PlanningStage {
    pub fn new(specialist: Specialist, temperature: f32) -> Self {
        Self {
            specialist,
            temperature,
        }
    }
}

#[async_trait]
impl Stage<AgentState> for PlanningStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let profile = render_profile(&state.profile);
        let history = render_history(
            &state.session_history,
            self.specialist.prompt_window(),
            NO_HISTORY,
        );

        let plan = self
            .specialist
            .generate(
                Route::Planning.as_str(),
                PLANNING_SYSTEM,
                planning_user(state.query.trim(), &profile, &history),
                self.temperature,
            )
            .await?;

        state.plan = Some(plan.clone());
        state.candidate_answer = Some(plan);
        state.activate(Route::Planning.as_str());
        Ok(state)
    }
}
