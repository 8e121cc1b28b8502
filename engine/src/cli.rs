//! CLI interface for Mentor
//!
//! This module provides the command-line interface using clap's derive API.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Mentor study and productivity assistant
///
/// Routes each question to a theory, coding, planning or general specialist,
/// remembers the conversation between runs and reports which stages ran.
#[derive(Parser, Debug)]
#[command(name = "mentor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Set log level (error, warn, info, debug, trace)
    #[arg(long, global = true, value_name = "LEVEL")]
    pub log: Option<String>,

    /// Specify alternate configuration file
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start an interactive session
    Chat,

    /// Answer a single question
    Ask {
        /// The question to ask
        query: String,
    },

    /// Run a list of questions and write one JSON record per question
    Batch {
        /// File with one question per line (defaults to the built-in list)
        #[arg(long, value_name = "FILE")]
        queries: Option<PathBuf>,

        /// Where to write the results
        #[arg(long, value_name = "FILE", default_value = "experiment_results.json")]
        output: PathBuf,
    },

    /// Print the workflow topology without calling any service
    Graph,

    /// Send one request to the configured LLM provider
    Ping,

    /// Inspect or edit persistent memory
    Memory {
        #[command(subcommand)]
        action: MemoryAction,
    },
}

/// Persistent memory actions
#[derive(Subcommand, Debug)]
pub enum MemoryAction {
    /// Print the stored profile, history and notes
    Show,

    /// Append a note available to theory questions
    AddNote {
        /// Note text
        text: String,
    },

    /// Replace the stored record with an empty one
    Reset,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ask_with_global_flags() {
        let cli = Cli::try_parse_from(["mentor", "ask", "What is RL?", "--json", "--log", "debug"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.log.as_deref(), Some("debug"));
        assert!(matches!(cli.command, Command::Ask { query } if query == "What is RL?"));
    }

    #[test]
    fn test_batch_defaults() {
        let cli = Cli::try_parse_from(["mentor", "batch"]).unwrap();
        match cli.command {
            Command::Batch { queries, output } => {
                assert!(queries.is_none());
                assert_eq!(output, PathBuf::from("experiment_results.json"));
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_memory_subcommands() {
        let cli = Cli::try_parse_from(["mentor", "memory", "add-note", "BFS uses a queue"]).unwrap();
        assert!(matches!(
            cli.command,
            Command::Memory { action: MemoryAction::AddNote { text } } if text == "BFS uses a queue"
        ));

        let cli = Cli::try_parse_from(["mentor", "--config", "/tmp/m.toml", "memory", "reset"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/m.toml")));
    }
}
