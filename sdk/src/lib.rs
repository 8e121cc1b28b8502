//! Mentor SDK
//!
//! Shared error taxonomy and tool adapter types used by the engine.

/// Error types and handling
pub mod errors;

/// Tool adapter result types
pub mod types;

// Re-export commonly used types
pub use errors::{EngineError, MentorErrorExt};
pub use types::{ToolError, ToolKind, ToolOutcome};
