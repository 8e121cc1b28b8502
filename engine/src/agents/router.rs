use anyhow::Context;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, warn};

use super::prompt::ROUTER_SYSTEM;
use crate::graph::Stage;
use crate::llm::{ChatRequest, LLMProvider};
use crate::state::{AgentState, Route};

pub const ROUTER: &str = "router";

/// Classifies the request into a [`Route`].
///
/// Runs before memory is loaded, so classification only ever sees the
/// current query. A blank query is routed to `general` without calling the
/// classifier.
pub struct RouterStage {
    llm: Arc<dyn LLMProvider>,
    temperature: f32,
}

impl RouterStage {
    pub fn new(llm: Arc<dyn LLMProvider>, temperature: f32) -> Self {
        Self { llm, temperature }
    }

    async fn classify(&self, query: &str) -> anyhow::Result<Route> {
        let request = ChatRequest::new(ROUTER_SYSTEM, query, self.temperature);
        let label = self
            .llm
            .generate(&request)
            .await
            .context("routing classification failed")?;

        let route = Route::from_label(&label);
        let normalized = label.trim().to_lowercase();
        if normalized != route.as_str() {
            warn!(label = %label.trim(), "Unrecognized route label, using general");
        }
        Ok(route)
    }
}

#[async_trait]
impl Stage<AgentState> for RouterStage {
    async fn run(&self, mut state: AgentState) -> anyhow::Result<AgentState> {
        let query = state.query.trim();
        let route = if query.is_empty() {
            Route::General
        } else {
            self.classify(query).await?
        };

        debug!(route = %route, "Request routed");
        state.route = Some(route);
        state.activate(ROUTER);
        Ok(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::{self, LLMError};
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Fixed {
        label: &'static str,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl LLMProvider for Fixed {
        fn name(&self) -> &str {
            "fixed"
        }

        fn is_local(&self) -> bool {
            true
        }

        async fn generate(&self, request: &ChatRequest) -> llm::Result<String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            assert_eq!(request.temperature, 0.0);
            if self.label == "!" {
                return Err(LLMError::Timeout);
            }
            Ok(self.label.to_string())
        }
    }

    fn fixed(label: &'static str) -> Arc<Fixed> {
        Arc::new(Fixed {
            label,
            calls: AtomicUsize::new(0),
        })
    }

    #[tokio::test]
    async fn test_label_normalized() {
        let llm = fixed("  Coding\n");
        let stage = RouterStage::new(llm.clone(), 0.0);
        let state = stage.run(AgentState::new("why does this panic?")).await.unwrap();

        assert_eq!(state.route, Some(Route::Coding));
        assert_eq!(state.activated_stages(), ["router"]);
        assert_eq!(llm.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_unknown_label_clamped() {
        let stage = RouterStage::new(fixed("astrology"), 0.0);
        let state = stage.run(AgentState::new("what is my sign")).await.unwrap();
        assert_eq!(state.route, Some(Route::General));
    }

    #[tokio::test]
    async fn test_blank_query_skips_classifier() {
        let llm = fixed("theory");
        let stage = RouterStage::new(llm.clone(), 0.0);
        let state = stage.run(AgentState::new("   ")).await.unwrap();

        assert_eq!(state.route, Some(Route::General));
        assert_eq!(llm.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_classifier_failure_propagates() {
        let stage = RouterStage::new(fixed("!"), 0.0);
        assert!(stage.run(AgentState::new("hi")).await.is_err());
    }
}
