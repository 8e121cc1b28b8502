pub mod analysis;
pub mod markdown;
pub mod notes;

pub use analysis::{extract_code_block, BeaconAnalyzer, CodeAnalyzer, DEFAULT_MAX_PER_FUNCTION};
pub use markdown::{MarkdownNoteWriter, NoteWriter};
pub use notes::search_notes;

use sdk::types::ToolKind;
use std::sync::Arc;

use crate::config::Config;

/// Auxiliary collaborators handed to the specialists.
///
/// A `None` slot disables that tool: the specialist skips the call and
/// records nothing.
#[derive(Clone)]
pub struct Toolbox {
    pub analyzer: Option<Arc<dyn CodeAnalyzer>>,
    pub note_writer: Option<Arc<dyn NoteWriter>>,
    pub max_note_results: usize,
}

impl Toolbox {
    /// Create a toolbox with every tool disabled
    pub fn empty() -> Self {
        Self {
            analyzer: None,
            note_writer: None,
            max_note_results: 2,
        }
    }

    /// Build the default tools according to `[tools]`
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let analyzer: Option<Arc<dyn CodeAnalyzer>> = if config.tools.analyze_code {
            Some(Arc::new(BeaconAnalyzer::new(DEFAULT_MAX_PER_FUNCTION)?))
        } else {
            None
        };

        let note_writer: Option<Arc<dyn NoteWriter>> = if config.tools.save_theory_notes {
            Some(Arc::new(MarkdownNoteWriter::new(config.notes_dir())))
        } else {
            None
        };

        Ok(Self {
            analyzer,
            note_writer,
            max_note_results: config.tools.max_note_results,
        })
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn CodeAnalyzer>) -> Self {
        self.analyzer = Some(analyzer);
        self
    }

    pub fn with_note_writer(mut self, writer: Arc<dyn NoteWriter>) -> Self {
        self.note_writer = Some(writer);
        self
    }

    /// Names of the enabled tools
    pub fn available_tool_names(&self) -> Vec<&'static str> {
        let mut names = vec![ToolKind::SearchNotes.as_str()];
        if self.analyzer.is_some() {
            names.push(ToolKind::AnalyzeCode.as_str());
        }
        if self.note_writer.is_some() {
            names.push(ToolKind::SaveMarkdownNote.as_str());
        }
        names
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_respects_switches() {
        let mut config = Config::default_config();
        config.core.data_dir = std::env::temp_dir();

        let toolbox = Toolbox::from_config(&config).unwrap();
        assert_eq!(
            toolbox.available_tool_names(),
            vec!["search_notes", "analyze_code", "save_markdown_note"]
        );

        config.tools.analyze_code = false;
        config.tools.save_theory_notes = false;
        config.tools.max_note_results = 4;
        let toolbox = Toolbox::from_config(&config).unwrap();
        assert_eq!(toolbox.available_tool_names(), vec!["search_notes"]);
        assert_eq!(toolbox.max_note_results, 4);
    }
}
