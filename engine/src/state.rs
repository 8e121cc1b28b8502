//! Execution Context
//!
//! The record threaded through every stage of the assistant workflow. Stages
//! take ownership of an [`AgentState`], mutate it and hand it back to the
//! engine, so there is never more than one live copy during a run.
//!
//! The trace fields (`activated_stages`, `invoked_tools`) are append-only:
//! they are private and can only grow through [`AgentState::activate`] and
//! [`AgentState::record_tool`].

use sdk::types::ToolKind;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Free-form user profile facts (major, courses, goals, ...)
pub type Profile = BTreeMap<String, serde_json::Value>;

/// Specialist path selected by the router
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Route {
    /// Concepts, definitions, explanations
    Theory,

    /// Code, errors, APIs, implementation details
    Coding,

    /// Schedules, study plans, productivity routines
    Planning,

    /// Everything else
    General,
}

impl Route {
    /// All labels, in dispatch-table order
    pub const ALL: [Route; 4] = [Route::Theory, Route::Coding, Route::Planning, Route::General];

    /// Normalize a raw classifier label.
    ///
    /// Surrounding whitespace and case are ignored; anything outside the
    /// label set (including an empty string) becomes [`Route::General`].
    pub fn from_label(label: &str) -> Self {
        match label.trim().to_lowercase().as_str() {
            "theory" => Route::Theory,
            "coding" => Route::Coding,
            "planning" => Route::Planning,
            "general" => Route::General,
            _ => Route::General,
        }
    }

    /// Stage name and selector label for this route
    pub fn as_str(&self) -> &'static str {
        match self {
            Route::Theory => "theory",
            Route::Coding => "coding",
            Route::Planning => "planning",
            Route::General => "general",
        }
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Speaker of a conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One question or answer in the conversation history
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
}

impl Turn {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
        }
    }

    /// The user/assistant pair for one exchange, skipping empty halves
    pub fn exchange(query: &str, answer: &str) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(2);
        if !query.is_empty() {
            turns.push(Turn::user(query));
        }
        if !answer.is_empty() {
            turns.push(Turn::assistant(answer));
        }
        turns
    }
}

/// Keep only the last `limit` turns
pub fn keep_last(turns: &mut Vec<Turn>, limit: usize) {
    if turns.len() > limit {
        let excess = turns.len() - limit;
        turns.drain(..excess);
    }
}

/// Shared execution context for one run of the workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentState {
    /// The current request
    pub query: String,

    /// Classification result, set by the router
    pub route: Option<Route>,

    /// Answer produced by whichever specialist ran
    pub candidate_answer: Option<String>,

    /// Study or task plan, set only by the planning specialist
    pub plan: Option<String>,

    /// Path of the markdown note written by the theory specialist
    #[serde(skip_serializing_if = "Option::is_none")]
    pub markdown_note_path: Option<String>,

    /// Stage names in execution order
    activated_stages: Vec<String>,

    /// Tool names in invocation order
    invoked_tools: Vec<String>,

    /// Bounded working view of persisted history
    pub session_history: Vec<Turn>,

    /// User-descriptive facts loaded from memory
    pub profile: Profile,

    /// Free-text notes available for retrieval
    pub notes: Vec<String>,

    /// Externally visible answer, set by the finalizer
    pub final_answer: Option<String>,
}

impl AgentState {
    /// Create the initial context for a request
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            query: query.into(),
            ..Default::default()
        }
    }

    /// Append a stage name to the activation trace
    pub fn activate(&mut self, stage: &str) {
        self.activated_stages.push(stage.to_string());
    }

    /// Append a tool name to the tool trace
    pub fn record_tool(&mut self, tool: ToolKind) {
        self.invoked_tools.push(tool.as_str().to_string());
    }

    pub fn activated_stages(&self) -> &[String] {
        &self.activated_stages
    }

    pub fn invoked_tools(&self) -> &[String] {
        &self.invoked_tools
    }

    /// Route chosen by the router, `General` if it has not run
    pub fn route_or_default(&self) -> Route {
        self.route.unwrap_or(Route::General)
    }
}
