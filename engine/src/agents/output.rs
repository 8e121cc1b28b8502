use async_trait::async_trait;

use crate::graph::Stage;
use crate::state::AgentState;

pub const OUTPUT: &str = "output";

/// Publishes the specialist's answer as the final answer
pub struct OutputStage;

#[async_trait]
impl Stage<AgentState> for OutputStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let answer = state
            .candidate_answer
            .clone()
            .or_else(|| state.final_answer.take())
            .unwrap_or_default();

        state.final_answer = Some(answer);
        state.activate(OUTPUT);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_candidate_wins() {
        let mut state = AgentState::new("q");
        state.candidate_answer = Some("new".to_string());
        state.final_answer = Some("old".to_string());

        let state = OutputStage.run(state).await.unwrap();
        assert_eq!(state.final_answer.as_deref(), Some("new"));
        assert_eq!(state.activated_stages(), ["output"]);
    }

    #[tokio::test]
    async fn test_falls_back_to_existing_final_answer() {
        let mut state = AgentState::new("q");
        state.final_answer = Some("old".to_string());
        let state = OutputStage.run(state).await.unwrap();
        assert_eq!(state.final_answer.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_always_sets_a_string() {
        let state = OutputStage.run(AgentState::new("q")).await.unwrap();
        assert_eq!(state.final_answer.as_deref(), Some(""));
    }
}
