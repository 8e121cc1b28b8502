//! Error types and handling
//!
//! This module provides the error types used throughout the Mentor engine.
//! All errors implement the `MentorErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Taxonomy
//!
//! Only some conditions ever reach a caller as an `EngineError`. Storage
//! corruption, tool failures and ambiguous routing labels are recovered where
//! they happen and surface as log lines or inline annotations instead.

use thiserror::Error;

/// Trait for Mentor error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait MentorErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint is safe to display to end users and does not contain
    /// secrets, file paths or internal implementation details.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors can be retried or worked around. Non-recoverable
    /// errors require fixing the configuration or the workflow wiring.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Storage**: Persistent memory could not be written
/// - **LLM Provider**: API failures, authentication errors
/// - **Workflow**: Graph wiring defects and aborted runs
///
/// # Examples
///
/// ```
/// use sdk::errors::{EngineError, MentorErrorExt};
///
/// let error = EngineError::LLMProvider("connection refused".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::GraphDefinition("unknown stage 'x'".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Path canonicalization failed for {0:?}: {1}")]
    PathCanonicalization(std::path::PathBuf, String),

    // Persistent memory errors
    #[error("Storage error: {0}")]
    Storage(String),

    // LLM provider errors
    #[error("LLM provider error: {0}")]
    LLMProvider(String),

    // Workflow errors
    #[error("Graph definition error: {0}")]
    GraphDefinition(String),

    #[error("Run failed in stage '{stage}': {reason}")]
    RunFailed { stage: String, reason: String },

    // Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MentorErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::PathCanonicalization(_, _) => "Invalid path specified",

            Self::Storage(_) => "Memory file could not be written. Check disk space and permissions",

            Self::LLMProvider(_) => "LLM provider unavailable. Check your API key and network",

            Self::GraphDefinition(_) => "Workflow wiring is invalid. This is a build defect",
            Self::RunFailed { .. } => "The request could not be completed. Try again",

            Self::Serialization(_) => "Data could not be encoded or decoded",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        match self {
            // Non-recoverable errors
            Self::Config(_) | Self::PathCanonicalization(_, _) | Self::GraphDefinition(_) => false,

            // All other errors are potentially recoverable
            _ => true,
        }
    }
}
