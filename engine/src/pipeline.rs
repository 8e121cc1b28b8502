//! Assistant workflow
//!
//! Wires the stages into the fixed topology
//!
//! ```text
//! router -> memory_load -?-> {theory | coding | planning | general} -> memory_update -> output -> END
//! ```
//!
//! and exposes it through [`Assistant`], which owns the compiled graph and the
//! memory store it reads and writes.

use serde::Serialize;
use std::sync::Arc;
use tracing::{info, info_span, Instrument};
use uuid::Uuid;

use crate::agents::{
    CodingStage, GeneralStage, OutputStage, PlanningStage, RouterStage, Specialist, TheoryStage,
    OUTPUT, ROUTER,
};
use crate::config::{Config, MemoryConfig, Temperatures};
use crate::graph::{CompiledGraph, GraphDefinitionError, GraphRunError, StateGraph, END};
use crate::llm::{build_provider, provider_label, LLMProvider};
use crate::memory::adapter::{MEMORY_LOAD, MEMORY_UPDATE};
use crate::memory::{JsonFileStore, MemoryLoadStage, MemoryStore, MemoryUpdateStage};
use crate::state::{AgentState, Route};
use crate::tools::Toolbox;
use sdk::errors::EngineError;

/// Collaborators the workflow depends on
#[derive(Clone)]
pub struct Collaborators {
    pub llm: Arc<dyn LLMProvider>,
    pub store: Arc<dyn MemoryStore>,
    pub toolbox: Toolbox,
}

/// Tunables the workflow reads
#[derive(Debug, Clone, Default)]
pub struct WorkflowSettings {
    pub temperatures: Temperatures,
    pub memory: MemoryConfig,
}

impl From<&Config> for WorkflowSettings {
    fn from(config: &Config) -> Self {
        Self {
            temperatures: config.llm.temperatures,
            memory: config.memory.clone(),
        }
    }
}

/// Selector label for the specialist dispatch
fn route_label(state: &AgentState) -> String {
    state.route_or_default().as_str().to_string()
}

/// Register every stage and edge of the assistant workflow and compile it
pub fn build_assistant_graph(
    collaborators: &Collaborators,
    settings: &WorkflowSettings,
) -> Result<CompiledGraph<AgentState>, GraphDefinitionError> {
    let llm = &collaborators.llm;
    let store = &collaborators.store;
    let toolbox = &collaborators.toolbox;
    let temps = settings.temperatures;
    let specialist = Specialist::new(Arc::clone(llm), settings.memory.prompt_window);

    let mut graph: StateGraph<AgentState> = StateGraph::new();
    graph
        .add_node(ROUTER, Arc::new(RouterStage::new(Arc::clone(llm), temps.router)))
        .add_node(
            MEMORY_LOAD,
            Arc::new(MemoryLoadStage::new(Arc::clone(store), &settings.memory)),
        )
        .add_node(
            Route::Theory.as_str(),
            Arc::new(TheoryStage::new(
                specialist.clone(),
                temps.theory,
                toolbox.max_note_results,
                toolbox.note_writer.clone(),
            )),
        )
        .add_node(
            Route::Coding.as_str(),
            Arc::new(CodingStage::new(
                specialist.clone(),
                temps.coding,
                toolbox.analyzer.clone(),
            )),
        )
        .add_node(
            Route::Planning.as_str(),
            Arc::new(PlanningStage::new(specialist.clone(), temps.planning)),
        )
        .add_node(
            Route::General.as_str(),
            Arc::new(GeneralStage::new(specialist, temps.general)),
        )
        .add_node(
            MEMORY_UPDATE,
            Arc::new(MemoryUpdateStage::new(Arc::clone(store), &settings.memory)),
        )
        .add_node(OUTPUT, Arc::new(OutputStage))
        .set_entry_point(ROUTER)
        .add_edge(ROUTER, MEMORY_LOAD)
        .add_conditional_edges(
            MEMORY_LOAD,
            route_label,
            Route::ALL.map(|route| (route.as_str(), route.as_str())),
            Route::General.as_str(),
        );

    for route in Route::ALL {
        graph.add_edge(route.as_str(), MEMORY_UPDATE);
    }
    graph.add_edge(MEMORY_UPDATE, OUTPUT).add_edge(OUTPUT, END);

    graph.compile()
}

/// The assembled assistant: one compiled workflow plus its memory store
pub struct Assistant {
    graph: CompiledGraph<AgentState>,
    store: Arc<dyn MemoryStore>,
    provider: String,
    label: String,
    tools: Vec<&'static str>,
}

impl Assistant {
    pub fn new(
        collaborators: Collaborators,
        settings: &WorkflowSettings,
    ) -> Result<Self, GraphDefinitionError> {
        let graph = build_assistant_graph(&collaborators, settings)?;
        Ok(Self {
            graph,
            provider: collaborators.llm.name().to_string(),
            label: provider_label(collaborators.llm.as_ref()),
            tools: collaborators.toolbox.available_tool_names(),
            store: collaborators.store,
        })
    }

    /// Build the production assistant from configuration
    pub fn from_config(config: &Config) -> Result<Self, EngineError> {
        let collaborators = Collaborators {
            llm: build_provider(&config.llm)?,
            store: Arc::new(JsonFileStore::new(config.memory_path())),
            toolbox: Toolbox::from_config(config)
                .map_err(|e| EngineError::Config(format!("Failed to build tools: {:#}", e)))?,
        };
        Ok(Self::new(collaborators, &WorkflowSettings::from(config))?)
    }

    /// Run one request through the workflow
    pub async fn ask(&self, query: &str) -> Result<AgentState, GraphRunError> {
        let run_id = Uuid::new_v4();
        let span = info_span!("run", run_id = %run_id, provider = %self.provider);

        async {
            info!("Run started");
            let state = self.graph.invoke(AgentState::new(query)).await?;
            info!(
                route = %state.route_or_default(),
                stages = %state.activated_stages().join(" -> "),
                tools = state.invoked_tools().len(),
                "Run finished"
            );
            Ok::<_, GraphRunError>(state)
        }
        .instrument(span)
        .await
    }

    pub fn graph(&self) -> &CompiledGraph<AgentState> {
        &self.graph
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    /// Provider name, tagged local or remote
    pub fn provider_label(&self) -> &str {
        &self.label
    }

    /// Names of the tools the specialists can call
    pub fn tools(&self) -> &[&'static str] {
        &self.tools
    }
}

/// Memory counters reported per run
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct MemoryUsage {
    pub session_history_used: usize,
    pub notes_loaded: usize,
}

/// One batch result row
#[derive(Debug, Clone, Serialize)]
pub struct RunRecord {
    pub query: String,
    pub activated_stages: Vec<String>,
    pub invoked_tools: Vec<String>,
    pub final_answer: String,
    pub memory_usage: MemoryUsage,
}

impl From<&AgentState> for RunRecord {
    fn from(state: &AgentState) -> Self {
        Self {
            query: state.query.clone(),
            activated_stages: state.activated_stages().to_vec(),
            invoked_tools: state.invoked_tools().to_vec(),
            final_answer: state.final_answer.clone().unwrap_or_default(),
            memory_usage: MemoryUsage {
                session_history_used: state.session_history.len(),
                notes_loaded: state.notes.len(),
            },
        }
    }
}
