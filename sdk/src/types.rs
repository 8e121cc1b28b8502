//! Tool adapter result types
//!
//! Every auxiliary tool returns a [`ToolOutcome`]. Callers pattern-match on it
//! and turn a failure into an inline annotation instead of propagating it.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Result of a single tool adapter call
pub type ToolOutcome<T = String> = Result<T, ToolError>;

/// Failure reported by a tool adapter
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ToolError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO failure: {0}")]
    Io(String),

    #[error("{0}")]
    Failed(String),
}

impl From<std::io::Error> for ToolError {
    fn from(err: std::io::Error) -> Self {
        ToolError::Io(err.to_string())
    }
}

/// Names recorded in the tool invocation trace
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolKind {
    /// Keyword retrieval over stored notes
    SearchNotes,

    /// Static analysis of a generated code block
    AnalyzeCode,

    /// Persisting an answer as a markdown document
    SaveMarkdownNote,
}

impl ToolKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolKind::SearchNotes => "search_notes",
            ToolKind::AnalyzeCode => "analyze_code",
            ToolKind::SaveMarkdownNote => "save_markdown_note",
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
