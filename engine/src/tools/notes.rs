//! Note retrieval

/// Notes containing `query` (case-insensitive), joined by blank lines.
///
/// Keeps the original order and stops after `max_results` matches. A blank
/// query or no match yields an empty string.
pub fn search_notes(query: &str, notes: &[String], max_results: usize) -> String {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return String::new();
    }

    notes
        .iter()
        .filter(|note| note.to_lowercase().contains(&needle))
        .take(max_results)
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join("\n\n")
}
