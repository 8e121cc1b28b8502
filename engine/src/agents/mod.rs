//! Workflow stages
//!
//! The router classifies the request, one of four specialists answers it and
//! the output stage publishes the answer. Memory stages live in
//! [`crate::memory`].
//!
//! Specialists treat a generation failure as fatal for the run; failures of
//! auxiliary tools are turned into inline annotations on the answer.

pub mod coding;
pub mod general;
pub mod output;
pub mod planner;
pub mod prompt;
pub mod router;
pub mod theory;

pub use coding::CodingStage;
pub use general::GeneralStage;
pub use output::{OutputStage, OUTPUT};
pub use planner::PlanningStage;
pub use router::{RouterStage, ROUTER};
pub use theory::TheoryStage;

use anyhow::Context;
use std::sync::Arc;
use tracing::debug;

use crate::llm::{ChatRequest, LLMProvider};

/// Generator plus prompt bounds shared by every specialist
#[derive(Clone)]
pub struct Specialist {
    llm: Arc<dyn LLMProvider>,
    prompt_window: usize,
}

impl Specialist {
    pub fn new(llm: Arc<dyn LLMProvider>, prompt_window: usize) -> Self {
        Self { llm, prompt_window }
    }

    pub fn prompt_window(&self) -> usize {
        self.prompt_window
    }

    async fn generate(
        &self,
        stage: &str,
        system: &str,
        user: String,
        temperature: f32,
    ) -> anyhow::Result<String> {
        let request = ChatRequest::new(system, user, temperature);
        let answer = self
            .llm
            .generate(&request)
            .await
            .with_context(|| format!("{} generation via {} failed", stage, self.llm.name()))?;
        debug!(stage, chars = answer.len(), "Generation complete");
        Ok(answer)
    }
}
