//! Command handlers for CLI operations
//!
//! - chat: interactive loop over stdin
//! - ask: one request
//! - batch: a list of requests written to a JSON results file
//! - graph: dry-run topology dump
//! - ping: provider connectivity check
//! - memory show / add-note / reset: direct edits of the persistent record

use anyhow::{Context, Result};
use serde_json::json;
use std::io::Write;
use std::path::{Path, PathBuf};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};

use crate::config::Config;
use crate::llm::{build_provider, provider_label, ChatRequest};
use crate::memory::{JsonFileStore, MemoryRecord, MemoryStore};
use crate::pipeline::{Assistant, RunRecord};
use crate::state::AgentState;
use sdk::errors::{EngineError, MentorErrorExt};

/// Output format for command results
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text output
    Text,
    /// JSON output for machine consumption
    Json,
}

/// Requests used by `batch` when no file is given
pub const DEFAULT_BATCH_QUERIES: [&str; 5] = [
    "What is the difference between a router-specialists multi-agent system and a planner-executor pattern?",
    "How should I design a multi-agent architecture if I want to integrate a vector database for memory?",
    "I am getting a KeyError when my workflow tries to read 'route' from the state. How should I fix it?",
    "Help me create a 7-day deep learning study plan focusing on CNNs.",
    "I only have 2 hours per day this week. Help me schedule my tasks efficiently.",
];

const EXIT_WORDS: [&str; 3] = ["exit", "quit", "q"];

/// True for lines that end an interactive session
pub fn is_exit_command(line: &str) -> bool {
    let line = line.trim();
    EXIT_WORDS.iter().any(|word| line.eq_ignore_ascii_case(word))
}

/// Text block printed after each answer
pub fn render_answer(state: &AgentState) -> String {
    let tools = if state.invoked_tools().is_empty() {
        "none".to_string()
    } else {
        state.invoked_tools().join(", ")
    };
    format!(
        "Assistant>\n{}\n\n[Activated stages]: {}\n[Tools called]: {}",
        state.final_answer.as_deref().unwrap_or_default().trim(),
        state.activated_stages().join(" -> "),
        tools
    )
}

fn emit(state: &AgentState, format: OutputFormat, out: &mut impl Write) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "\n{}\n", render_answer(state))?,
        OutputFormat::Json => writeln!(out, "{}", serde_json::to_string(&RunRecord::from(state))?)?,
    }
    Ok(())
}

/// Drive an interactive session until an exit word or end of input.
///
/// Returns the number of requests answered. A failed run is reported and
/// the session continues.
pub async fn chat_loop<R, W>(
    assistant: &Assistant,
    input: R,
    out: &mut W,
    format: OutputFormat,
) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: Write,
{
    let mut lines = input.lines();
    let mut answered = 0;

    loop {
        write!(out, "User> ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            writeln!(out, "\n[Exiting]")?;
            break;
        };

        let query = line.trim();
        if query.is_empty() {
            continue;
        }
        if is_exit_command(query) {
            writeln!(out, "[Exiting]")?;
            break;
        }

        match assistant.ask(query).await {
            Ok(state) => {
                emit(&state, format, out)?;
                answered += 1;
            }
            Err(e) => {
                tracing::error!("Run failed: {:#}", e);
                writeln!(out, "[Error] {}", e)?;
            }
        }
    }

    Ok(answered)
}

/// Interactive session on stdin/stdout
pub async fn handle_chat(config: &Config, format: OutputFormat) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    if format == OutputFormat::Text {
        println!("Mentor study and productivity assistant");
        println!("Type 'exit' to quit.\n");
    }

    let stdin = BufReader::new(tokio::io::stdin());
    let mut stdout = std::io::stdout();
    let answered = chat_loop(&assistant, stdin, &mut stdout, format).await?;
    tracing::info!("Session ended after {} request(s)", answered);
    Ok(())
}

/// Answer one request
pub async fn handle_ask(query: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    let state = assistant.ask(query).await.map_err(EngineError::from)?;
    emit(&state, format, &mut std::io::stdout())
}

/// Read one request per non-blank line
pub fn read_queries(path: &Path) -> Result<Vec<String>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read queries from {}", path.display()))?;
    Ok(text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(str::to_string)
        .collect())
}

/// Run every request in order and write the results array to `output`
pub async fn run_batch(
    assistant: &Assistant,
    queries: &[String],
    output: &Path,
    format: OutputFormat,
) -> Result<Vec<RunRecord>> {
    let mut records = Vec::with_capacity(queries.len());

    for (index, query) in queries.iter().enumerate() {
        if format == OutputFormat::Text {
            println!("Running query {}: {}", index + 1, query);
        }
        let state = assistant
            .ask(query)
            .await
            .map_err(EngineError::from)
            .with_context(|| format!("Query {} failed", index + 1))?;
        records.push(RunRecord::from(&state));
    }

    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent).await?;
    }
    let json = serde_json::to_string_pretty(&records)?;
    tokio::fs::write(output, json)
        .await
        .with_context(|| format!("Failed to write {}", output.display()))?;

    Ok(records)
}

pub async fn handle_batch(
    queries: Option<PathBuf>,
    output: PathBuf,
    config: &Config,
    format: OutputFormat,
) -> Result<()> {
    let queries = match queries {
        Some(path) => read_queries(&path)?,
        None => DEFAULT_BATCH_QUERIES.iter().map(|q| q.to_string()).collect(),
    };
    if queries.is_empty() {
        anyhow::bail!("No queries to run");
    }

    let assistant = Assistant::from_config(config)?;
    let records = run_batch(&assistant, &queries, &output, format).await?;

    match format {
        OutputFormat::Text => println!(
            "\nSaved {} result(s) to {}",
            records.len(),
            output.display()
        ),
        OutputFormat::Json => println!(
            "{}",
            json!({"results": records.len(), "output": output.display().to_string()})
        ),
    }
    Ok(())
}

/// Print the compiled workflow without running it
pub async fn handle_graph(config: &Config, format: OutputFormat) -> Result<()> {
    let assistant = Assistant::from_config(config)?;
    let graph = assistant.graph();

    match format {
        OutputFormat::Text => {
            println!("{}", graph.describe());
            println!("Provider: {}", assistant.provider_label());
            println!("Tools: {}", assistant.tools().join(", "));
        }
        OutputFormat::Json => println!(
            "{}",
            serde_json::to_string_pretty(&json!({
                "entry": graph.entry(),
                "stages": graph.stage_names(),
                "topology": graph.describe().lines().collect::<Vec<_>>(),
                "provider": assistant.provider_label(),
                "tools": assistant.tools(),
            }))?
        ),
    }
    Ok(())
}

/// Send one greeting through the configured provider
pub async fn handle_ping(config: &Config, format: OutputFormat) -> Result<()> {
    let provider = build_provider(&config.llm)?;
    let request = ChatRequest::new(
        "You are a connectivity check. Answer in one short sentence.",
        "Hello! Please confirm you can read this.",
        0.0,
    );

    let start = std::time::Instant::now();
    let reply = provider.generate(&request).await.map_err(EngineError::from)?;
    let elapsed = start.elapsed().as_secs_f64();

    match format {
        OutputFormat::Text => {
            println!("Provider: {}", provider_label(provider.as_ref()));
            println!("Reply ({:.1}s): {}", elapsed, reply.trim());
        }
        OutputFormat::Json => println!(
            "{}",
            json!({
                "provider": provider.name(),
                "local": provider.is_local(),
                "elapsed_secs": elapsed,
                "reply": reply
            })
        ),
    }
    Ok(())
}

/// Hint line printed to stderr when a command fails with an [`EngineError`]
pub fn failure_hint(err: &anyhow::Error) -> Option<String> {
    let engine_error = err.downcast_ref::<EngineError>()?;
    let advice = if engine_error.is_recoverable() {
        "retrying may succeed"
    } else {
        "fix this before retrying"
    };
    Some(format!("Hint: {} ({})", engine_error.user_hint(), advice))
}

fn memory_store(config: &Config) -> JsonFileStore {
    JsonFileStore::new(config.memory_path())
}

pub async fn handle_memory_show(config: &Config, format: OutputFormat) -> Result<()> {
    let store = memory_store(config);
    let Some(record) = store.peek().await else {
        match format {
            OutputFormat::Text => println!("No memory file yet: {}", store.describe()),
            OutputFormat::Json => println!("{}", json!({"memory": null, "path": store.describe()})),
        }
        return Ok(());
    };

    if format == OutputFormat::Text {
        println!("Memory file: {}", store.describe());
        println!(
            "{} profile key(s), {} turn(s), {} note(s)\n",
            record.profile.len(),
            record.history.len(),
            record.notes.len()
        );
    }
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

/// Append a note and persist the record
pub async fn add_note(store: &dyn MemoryStore, text: &str) -> Result<usize> {
    let text = text.trim();
    if text.is_empty() {
        anyhow::bail!("Note text is empty");
    }
    let mut record = store.load().await;
    record.notes.push(text.to_string());
    store.save(&record).await?;
    Ok(record.notes.len())
}

pub async fn handle_memory_add_note(text: &str, config: &Config, format: OutputFormat) -> Result<()> {
    let store = memory_store(config);
    let count = add_note(&store, text).await?;
    match format {
        OutputFormat::Text => println!("Note saved ({} note(s) stored)", count),
        OutputFormat::Json => println!("{}", json!({"notes": count})),
    }
    Ok(())
}

pub async fn handle_memory_reset(config: &Config, format: OutputFormat) -> Result<()> {
    let store = memory_store(config);
    store.save(&MemoryRecord::default()).await?;
    match format {
        OutputFormat::Text => println!("Memory reset: {}", store.describe()),
        OutputFormat::Json => println!("{}", json!({"reset": store.describe()})),
    }
    Ok(())
}
