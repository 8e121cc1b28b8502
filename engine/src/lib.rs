//! Mentor Engine Library
//!
//! This library provides the core functionality of the Mentor assistant.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Execution context threaded through the workflow
pub mod state;

/// Minimal state-graph engine
pub mod graph;

/// LLM provider abstraction layer
pub mod llm;

/// Persistent memory and its workflow stages
pub mod memory;

/// Auxiliary tools used by the specialists
pub mod tools;

/// Router, specialists and finalizer
pub mod agents;

/// Workflow assembly and the `Assistant` facade
pub mod pipeline;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
