//! Workflow Engine
//!
//! A small, data-model agnostic sequencer. Stages are registered by name,
//! wired together with unconditional edges (`a -> b`) or conditional edges
//! (`a -> selector(state) -> {label: target}`), and compiled into a
//! [`CompiledGraph`] that can be invoked with an initial state.
//!
//! A run is a single linear traversal: start at the entry stage, hand the
//! state to the stage, replace the state with whatever the stage returns,
//! follow the outgoing edge, repeat until [`END`]. Stages are awaited one at a
//! time; nothing is spawned and nothing runs in parallel. A stage error aborts
//! the run as-is (no retry, no rollback).
//!
//! Only a compiled graph can be invoked, so an unvalidated graph never runs.

pub mod error;

pub use error::{GraphDefinitionError, GraphRunError};

use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// Terminal marker. Edges pointing here end the run.
pub const END: &str = "__end__";

/// Default bound on stage executions per run
pub const DEFAULT_MAX_STEPS: usize = 64;

/// A named unit of work: takes the state and returns the next state
#[async_trait]
pub trait Stage<S>: Send + Sync {
    async fn run(&self, state: S) -> anyhow::Result<S>;
}

/// Adapts an async closure into a [`Stage`]
pub struct FnStage<F>(F);

impl<F> FnStage<F> {
    pub fn new(f: F) -> Self {
        Self(f)
    }
}

#[async_trait]
impl<S, F, Fut> Stage<S> for FnStage<F>
where
    S: Send + 'static,
    F: Fn(S) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<S>> + Send,
{
    async fn run(&self, state: S) -> anyhow::Result<S> {
        (self.0)(state).await
    }
}

/// Chooses a label from the current state
pub type Selector<S> = Arc<dyn Fn(&S) -> String + Send + Sync>;

enum Edge<S> {
    Direct(String),
    Conditional {
        selector: Selector<S>,
        targets: HashMap<String, String>,
        default: String,
    },
}

/// Graph under construction
pub struct StateGraph<S> {
    stages: Vec<(String, Arc<dyn Stage<S>>)>,
    entry: Option<String>,
    edges: Vec<(String, Edge<S>)>,
}

impl<S: Send + 'static> StateGraph<S> {
    pub fn new() -> Self {
        Self {
            stages: Vec::new(),
            entry: None,
            edges: Vec::new(),
        }
    }

    /// Register a stage under `name`
    pub fn add_node(&mut self, name: impl Into<String>, stage: Arc<dyn Stage<S>>) -> &mut Self {
        self.stages.push((name.into(), stage));
        self
    }

    /// Designate the stage a run starts at
    pub fn set_entry_point(&mut self, name: impl Into<String>) -> &mut Self {
        self.entry = Some(name.into());
        self
    }

    /// Always continue from `from` to `to` (which may be [`END`])
    pub fn add_edge(&mut self, from: impl Into<String>, to: impl Into<String>) -> &mut Self {
        self.edges.push((from.into(), Edge::Direct(to.into())));
        self
    }

    /// Continue from `from` to the target mapped to `selector(state)`.
    ///
    /// Labels missing from `targets` fall back to `default`, which must itself
    /// be a key of `targets`.
    pub fn add_conditional_edges<F, I, K, V>(
        &mut self,
        from: impl Into<String>,
        selector: F,
        targets: I,
        default: impl Into<String>,
    ) -> &mut Self
    where
        F: Fn(&S) -> String + Send + Sync + 'static,
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let targets = targets
            .into_iter()
            .map(|(label, target)| (label.into(), target.into()))
            .collect();
        self.edges.push((
            from.into(),
            Edge::Conditional {
                selector: Arc::new(selector),
                targets,
                default: default.into(),
            },
        ));
        self
    }

    /// Validate the wiring and freeze the graph
    pub fn compile(self) -> Result<CompiledGraph<S>, GraphDefinitionError> {
        let mut stages: HashMap<String, Arc<dyn Stage<S>>> = HashMap::new();
        let mut order = Vec::with_capacity(self.stages.len());
        for (name, stage) in self.stages {
            if name == END {
                return Err(GraphDefinitionError::ReservedName(name));
            }
            if stages.contains_key(&name) {
                return Err(GraphDefinitionError::DuplicateStage(name));
            }
            order.push(name.clone());
            stages.insert(name, stage);
        }

        let entry = self.entry.ok_or(GraphDefinitionError::MissingEntryPoint)?;
        if !stages.contains_key(&entry) {
            return Err(GraphDefinitionError::UnknownEntryPoint(entry));
        }

        let is_target = |name: &str| name == END || stages.contains_key(name);

        let mut edges: HashMap<String, Edge<S>> = HashMap::new();
        for (from, edge) in self.edges {
            if !stages.contains_key(&from) {
                return Err(GraphDefinitionError::UnknownSource(from));
            }
            match &edge {
                Edge::Direct(to) => {
                    if !is_target(to) {
                        return Err(GraphDefinitionError::UnknownTarget {
                            from,
                            to: to.clone(),
                        });
                    }
                }
                Edge::Conditional {
                    targets, default, ..
                } => {
                    if let Some(to) = targets.values().find(|to| !is_target(to)) {
                        return Err(GraphDefinitionError::UnknownTarget {
                            from,
                            to: to.clone(),
                        });
                    }
                    if !targets.contains_key(default) {
                        return Err(GraphDefinitionError::UnmappedDefault {
                            from,
                            label: default.clone(),
                        });
                    }
                }
            }
            if edges.contains_key(&from) {
                return Err(GraphDefinitionError::ConflictingEdges(from));
            }
            edges.insert(from, edge);
        }

        if let Some(dead_end) = order.iter().find(|name| !edges.contains_key(*name)) {
            return Err(GraphDefinitionError::DeadEnd(dead_end.clone()));
        }

        Ok(CompiledGraph {
            stages,
            order,
            entry,
            edges,
            max_steps: DEFAULT_MAX_STEPS,
        })
    }
}

impl<S: Send + 'static> Default for StateGraph<S> {
    fn default() -> Self {
        Self::new()
    }
}

/// A validated graph, ready to run
pub struct CompiledGraph<S> {
    stages: HashMap<String, Arc<dyn Stage<S>>>,
    order: Vec<String>,
    entry: String,
    edges: HashMap<String, Edge<S>>,
    max_steps: usize,
}

impl<S: Send + 'static> CompiledGraph<S> {
    /// Override the bound on stage executions per run
    pub fn with_max_steps(mut self, max_steps: usize) -> Self {
        self.max_steps = max_steps;
        self
    }

    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Stage names in registration order
    pub fn stage_names(&self) -> &[String] {
        &self.order
    }

    /// Run the graph from the entry stage until [`END`]
    pub async fn invoke(&self, initial: S) -> Result<S, GraphRunError> {
        let mut state = initial;
        let mut current = self.entry.clone();
        let mut steps = 0usize;

        while current != END {
            if steps >= self.max_steps {
                return Err(GraphRunError::StepLimitExceeded {
                    limit: self.max_steps,
                });
            }
            steps += 1;

            let Some(stage) = self.stages.get(&current) else {
                return Err(GraphRunError::StageFailed {
                    source: anyhow::anyhow!("stage is not registered"),
                    stage: current,
                });
            };

            debug!(stage = %current, step = steps, "Entering stage");
            state = match stage.run(state).await {
                Ok(next) => next,
                Err(source) => {
                    return Err(GraphRunError::StageFailed {
                        stage: current,
                        source,
                    })
                }
            };

            current = self.next_stage(&current, &state);
        }

        debug!(steps, "Run reached end");
        Ok(state)
    }

    fn next_stage(&self, current: &str, state: &S) -> String {
        match self.edges.get(current) {
            Some(Edge::Direct(to)) => to.clone(),
            Some(Edge::Conditional {
                selector,
                targets,
                default,
            }) => {
                let label = selector(state);
                match targets.get(&label) {
                    Some(to) => to.clone(),
                    None => {
                        warn!(
                            stage = current,
                            label = %label,
                            "Selector returned unmapped label, using default '{}'",
                            default
                        );
                        targets
                            .get(default)
                            .cloned()
                            .unwrap_or_else(|| END.to_string())
                    }
                }
            }
            None => END.to_string(),
        }
    }

    /// Render the topology, one stage per line
    pub fn describe(&self) -> String {
        let mut lines = vec![format!("entry: {}", self.entry)];
        for name in &self.order {
            match self.edges.get(name) {
                Some(Edge::Direct(to)) => lines.push(format!("{} -> {}", name, display(to))),
                Some(Edge::Conditional {
                    targets, default, ..
                }) => {
                    let mut pairs: Vec<_> = targets.iter().collect();
                    pairs.sort();
                    let rendered: Vec<String> = pairs
                        .into_iter()
                        .map(|(label, to)| format!("{}: {}", label, display(to)))
                        .collect();
                    lines.push(format!(
                        "{} -?-> {{{}}} (default: {})",
                        name,
                        rendered.join(", "),
                        default
                    ));
                }
                None => {}
            }
        }
        lines.join("\n")
    }

    /// Stages reachable from the entry point
    pub fn reachable(&self) -> HashSet<String> {
        let mut seen = HashSet::new();
        let mut stack = vec![self.entry.clone()];
        while let Some(name) = stack.pop() {
            if name == END || !seen.insert(name.clone()) {
                continue;
            }
            match self.edges.get(&name) {
                Some(Edge::Direct(to)) => stack.push(to.clone()),
                Some(Edge::Conditional { targets, .. }) => stack.extend(targets.values().cloned()),
                None => {}
            }
        }
        seen
    }
}

fn display(target: &str) -> &str {
    if target == END {
        "END"
    } else {
        target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    type Trace = Vec<String>;

    fn push(name: &'static str) -> Arc<dyn Stage<Trace>> {
        Arc::new(FnStage::new(move |mut trace: Trace| async move {
            trace.push(name.to_string());
            Ok::<_, anyhow::Error>(trace)
        }))
    }

    fn branching(label: &'static str) -> StateGraph<Trace> {
        let mut graph = StateGraph::new();
        graph
            .add_node("start", push("start"))
            .add_node("left", push("left"))
            .add_node("right", push("right"))
            .set_entry_point("start")
            .add_conditional_edges(
                "start",
                move |_: &Trace| label.to_string(),
                [("left", "left"), ("right", "right")],
                "right",
            )
            .add_edge("left", END)
            .add_edge("right", END);
        graph
    }

    #[tokio::test]
    async fn test_linear_run() {
        let mut graph = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .add_node("b", push("b"))
            .set_entry_point("a")
            .add_edge("a", "b")
            .add_edge("b", END);

        let compiled = graph.compile().unwrap();
        let trace = compiled.invoke(Vec::new()).await.unwrap();
        assert_eq!(trace, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn test_conditional_follows_label() {
        let compiled = branching("left").compile().unwrap();
        let trace = compiled.invoke(Vec::new()).await.unwrap();
        assert_eq!(trace, vec!["start", "left"]);
    }

    #[tokio::test]
    async fn test_conditional_unknown_label_uses_default() {
        let compiled = branching("sideways").compile().unwrap();
        let trace = compiled.invoke(Vec::new()).await.unwrap();
        assert_eq!(trace, vec!["start", "right"]);
    }

    #[tokio::test]
    async fn test_selector_sees_current_state() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("start", push("go-left"))
            .add_node("left", push("left"))
            .add_node("right", push("right"))
            .set_entry_point("start")
            .add_conditional_edges(
                "start",
                |trace: &Trace| {
                    if trace.last().map(String::as_str) == Some("go-left") {
                        "left".to_string()
                    } else {
                        "right".to_string()
                    }
                },
                [("left", "left"), ("right", "right")],
                "right",
            )
            .add_edge("left", END)
            .add_edge("right", END);

        let trace = graph.compile().unwrap().invoke(Vec::new()).await.unwrap();
        assert_eq!(trace, vec!["go-left", "left"]);
    }

    #[tokio::test]
    async fn test_stage_error_aborts_run() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .add_node(
                "boom",
                Arc::new(FnStage::new(|_: Trace| async move {
                    Err::<Trace, _>(anyhow::anyhow!("exploded"))
                })),
            )
            .add_node("never", push("never"))
            .set_entry_point("a")
            .add_edge("a", "boom")
            .add_edge("boom", "never")
            .add_edge("never", END);

        let err = graph.compile().unwrap().invoke(Vec::new()).await.unwrap_err();
        assert_eq!(err.stage(), Some("boom"));
        assert!(err.to_string().contains("exploded"));
    }

    #[tokio::test]
    async fn test_step_limit_stops_cycles() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .add_node("b", push("b"))
            .set_entry_point("a")
            .add_edge("a", "b")
            .add_edge("b", "a");

        let compiled = graph.compile().unwrap().with_max_steps(5);
        let err = compiled.invoke(Vec::new()).await.unwrap_err();
        assert!(matches!(err, GraphRunError::StepLimitExceeded { limit: 5 }));
    }

    #[test]
    fn test_missing_entry_point() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph.add_node("a", push("a")).add_edge("a", END);
        assert_eq!(
            graph.compile().err(),
            Some(GraphDefinitionError::MissingEntryPoint)
        );
    }

    #[test]
    fn test_unknown_edge_target() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .set_entry_point("a")
            .add_edge("a", "ghost");
        assert_eq!(
            graph.compile().err(),
            Some(GraphDefinitionError::UnknownTarget {
                from: "a".to_string(),
                to: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_unknown_conditional_target() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .set_entry_point("a")
            .add_conditional_edges("a", |_: &Trace| "x".to_string(), [("x", "ghost")], "x");
        assert!(matches!(
            graph.compile().err(),
            Some(GraphDefinitionError::UnknownTarget { .. })
        ));
    }

    #[test]
    fn test_default_label_must_be_mapped() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .set_entry_point("a")
            .add_conditional_edges("a", |_: &Trace| "x".to_string(), [("x", END)], "y");
        assert_eq!(
            graph.compile().err(),
            Some(GraphDefinitionError::UnmappedDefault {
                from: "a".to_string(),
                label: "y".to_string()
            })
        );
    }

    #[test]
    fn test_duplicate_and_reserved_names() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .add_node("a", push("a"))
            .set_entry_point("a")
            .add_edge("a", END);
        assert_eq!(
            graph.compile().err(),
            Some(GraphDefinitionError::DuplicateStage("a".to_string()))
        );

        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph.add_node(END, push("end")).set_entry_point(END);
        assert!(matches!(
            graph.compile().err(),
            Some(GraphDefinitionError::ReservedName(_))
        ));
    }

    #[test]
    fn test_conflicting_and_missing_edges() {
        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .set_entry_point("a")
            .add_edge("a", END)
            .add_conditional_edges("a", |_: &Trace| "x".to_string(), [("x", END)], "x");
        assert_eq!(
            graph.compile().err(),
            Some(GraphDefinitionError::ConflictingEdges("a".to_string()))
        );

        let mut graph: StateGraph<Trace> = StateGraph::new();
        graph
            .add_node("a", push("a"))
            .add_node("b", push("b"))
            .set_entry_point("a")
            .add_edge("a", END);
        assert_eq!(
            graph.compile().err(),
            Some(GraphDefinitionError::DeadEnd("b".to_string()))
        );
    }

    #[test]
    fn test_describe_and_reachable() {
        let compiled = branching("left").compile().unwrap();
        let text = compiled.describe();
        assert!(text.starts_with("entry: start"));
        assert!(text.contains("start -?-> {left: left, right: right} (default: right)"));
        assert!(text.contains("left -> END"));

        let reachable = compiled.reachable();
        assert_eq!(reachable.len(), 3);
        assert!(reachable.contains("right"));
    }
}
