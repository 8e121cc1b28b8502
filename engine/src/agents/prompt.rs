//! Prompt text and context rendering for the router and specialists

use crate::state::{Profile, Turn};

pub const ROUTER_SYSTEM: &str = "You are a routing agent.\n\
IMPORTANT RULES:\n\
1. Ignore all history, memory, session context and previous answers.\n\
2. ONLY classify the CURRENT user query.\n\
3. Do NOT make assumptions based on past tasks.\n\
4. Always categorize the query into EXACTLY ONE label:\n\
- theory   : questions about theory, concepts, definitions (multi-agent systems, LLM agents, ML, RL, etc.)\n\
- coding   : questions about code, errors, implementation details, APIs, libraries.\n\
- planning : questions about planning, scheduling, study plans, productivity routines.\n\
- general  : other questions that are still related to study or productivity.\n\n\
Output only the label, in lowercase, with no extra text.";

pub const THEORY_SYSTEM: &str = "You are a theory explainer for:\n\
- multi-agent systems and LLM-based agents\n\
- machine learning and deep learning\n\
- reinforcement learning and related topics\n\n\
Your goals:\n\
1) Explain concepts clearly and concisely.\n\
2) Use step-by-step structure when helpful.\n\
3) If relevant notes are provided, integrate them into your answer.";

pub const CODING_SYSTEM: &str = "You are a coding assistant focused on:\n\
- Python and Rust code\n\
- machine learning / deep learning frameworks\n\
- LLM agent frameworks\n\n\
Your goals:\n\
1) Explain error messages and stack traces.\n\
2) Suggest concrete code fixes or refactors.\n\
3) When relevant, relate to multi-agent / LLM-based systems.\n\
4) Be concise but specific. Use code blocks where needed.";

pub const PLANNING_SYSTEM: &str = "You are a study and productivity planner.\n\
You help the user turn vague goals into concrete step-by-step plans.\n\n\
Guidelines:\n\
- Work out the realistic next steps for this user.\n\
- Use bullet lists or numbered steps.\n\
- When possible, split into days or sessions.\n\
- Keep the plan realistic for a busy graduate student.";

pub const GENERAL_SYSTEM: &str = "You are a helpful general assistant focused on study, coding and productivity.\n\
If the query does not clearly belong to theory, coding or planning, \
you still try to provide a useful, concise answer.\n\
Prioritize clarity and practicality.";

pub const NO_HISTORY: &str = "No recent history.";
pub const NO_PROFILE: &str = "No profile information available.";

/// Last `window` turns as `role: content` lines, or `empty` when there are none
pub fn render_history(history: &[Turn], window: usize, empty: &str) -> String {
    let start = history.len().saturating_sub(window);
    let recent = &history[start..];
    if recent.is_empty() {
        return empty.to_string();
    }
    recent
        .iter()
        .map(|turn| format!("{}: {}", turn.role, turn.content))
        .collect::<Vec<_>>()
        .join("\n")
}

/// One `key: value` line per profile entry, strings unquoted
pub fn render_profile(profile: &Profile) -> String {
    if profile.is_empty() {
        return NO_PROFILE.to_string();
    }
    profile
        .iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => format!("{}: {}", key, s),
            other => format!("{}: {}", key, other),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn theory_user(query: &str, notes: &str, history: &str) -> String {
    format!(
        "User query:\n{}\n\nRelevant notes (may be empty):\n{}\n\nRecent session history (may be empty):\n{}",
        query, notes, history
    )
}

pub fn coding_user(query: &str, history: &str) -> String {
    format!(
        "User query (may include code and error messages):\n{}\n\nRecent session history (may be empty):\n{}",
        query, history
    )
}

pub fn planning_user(query: &str, profile: &str, history: &str) -> String {
    format!(
        "User query:\n{}\n\nUser profile (may be empty):\n{}\n\nRecent session history (may be empty):\n{}",
        query, profile, history
    )
}

pub fn general_user(query: &str, history: &str) -> String {
    format!(
        "User query:\n{}\n\nRecent session history (may be empty):\n{}",
        query, history
    )
}
